use axum::response::Html;
use handlebars::Handlebars;
use keycloak_identity::UserSummary;
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::error::{AppError, AppResult};

const TEMPLATES: [(&str, &str); 5] = [
    ("layout", include_str!("../templates/layout.hbs")),
    ("home", include_str!("../templates/home.hbs")),
    ("profile", include_str!("../templates/profile.hbs")),
    ("register", include_str!("../templates/register.hbs")),
    ("login", include_str!("../templates/login.hbs")),
];

/// Page templates compiled into the binary
pub struct Templates {
    registry: Handlebars<'static>,
}

impl Templates {
    pub fn new() -> Result<Self, AppError> {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(false);

        for (name, source) in TEMPLATES {
            registry.register_template_string(name, source)?;
        }

        Ok(Self { registry })
    }

    /// Render `name` with the common page fields merged into `data`.
    pub fn render<T: Serialize>(&self, name: &str, page: Page<'_>, data: T) -> AppResult<Html<String>> {
        let mut context = match serde_json::to_value(data)? {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                return Err(AppError::Internal(format!(
                    "Page data for '{name}' must be an object, got {other}"
                )))
            }
        };
        context.extend(page.into_context());

        Ok(Html(self.registry.render(name, &context)?))
    }
}

/// Fields every page shows: title, current user and pending flash messages
pub struct Page<'a> {
    pub title: &'a str,
    pub current_user: Option<&'a UserSummary>,
    pub flashes: Vec<String>,
}

impl<'a> Page<'a> {
    pub fn new(title: &'a str, current_user: Option<&'a UserSummary>) -> Self {
        Self {
            title,
            current_user,
            flashes: Vec::new(),
        }
    }

    pub fn with_flashes(mut self, flashes: Vec<String>) -> Self {
        self.flashes = flashes;
        self
    }

    fn into_context(self) -> Map<String, Value> {
        let mut context = Map::new();
        context.insert("title".to_string(), json!(self.title));
        context.insert("current_user".to_string(), json!(self.current_user));
        context.insert(
            "display_name".to_string(),
            json!(self.current_user.map(UserSummary::display_name)),
        );
        context.insert("flashes".to_string(), json!(self.flashes));
        context
    }
}
