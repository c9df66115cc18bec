use keycloak_identity::{DomainResult, IdentityProvider, KeycloakUser, TokenSet};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{error, info, warn};

pub const USERNAME_MIN: usize = 4;
pub const USERNAME_MAX: usize = 25;

pub const LENGTH_MESSAGE: &str = "Field must be between 4 and 25 characters long.";
pub const REQUIRED_MESSAGE: &str = "This field is required.";
pub const PASSWORD_MISMATCH_MESSAGE: &str = "Passwords must match";
pub const USERNAME_TAKEN_MESSAGE: &str = "Username already exists. Please choose another one.";
pub const INVALID_LOGIN_MESSAGE: &str = "Invalid username or password.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Validation outcome of a form: empty means valid
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors {
    errors: Vec<FieldError>,
}

impl FormErrors {
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.errors.iter()
    }

    pub fn for_field(&self, field: &str) -> Vec<&str> {
        self.errors
            .iter()
            .filter(|e| e.field == field)
            .map(|e| e.message.as_str())
            .collect()
    }

    /// Messages grouped by field, for templates
    pub fn by_field(&self) -> BTreeMap<&'static str, Vec<String>> {
        let mut grouped: BTreeMap<&'static str, Vec<String>> = BTreeMap::new();
        for error in &self.errors {
            grouped.entry(error.field).or_default().push(error.message.clone());
        }
        grouped
    }

    fn into_result(self) -> Result<(), FormErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

fn check_username(errors: &mut FormErrors, username: &str) {
    let length = username.chars().count();
    if !(USERNAME_MIN..=USERNAME_MAX).contains(&length) {
        errors.add("username", LENGTH_MESSAGE);
    }
}

fn check_required(errors: &mut FormErrors, field: &'static str, value: &str) {
    if value.trim().is_empty() {
        errors.add(field, REQUIRED_MESSAGE);
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrationForm {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing)]
    pub password: String,
    #[serde(skip_serializing)]
    pub confirm: String,
}

impl RegistrationForm {
    /// Trim the text fields; passwords are kept verbatim.
    pub fn normalized(self) -> Self {
        Self {
            username: self.username.trim().to_string(),
            email: self.email.trim().to_string(),
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            ..self
        }
    }

    /// Field-local checks, no remote calls.
    pub fn validate_fields(&self) -> FormErrors {
        let mut errors = FormErrors::default();

        check_username(&mut errors, &self.username);
        check_required(&mut errors, "email", &self.email);
        check_required(&mut errors, "first_name", &self.first_name);
        check_required(&mut errors, "last_name", &self.last_name);

        check_required(&mut errors, "password", &self.password);
        if errors.for_field("password").is_empty() && self.password != self.confirm {
            errors.add("password", PASSWORD_MISMATCH_MESSAGE);
        }

        errors
    }

    /// Field checks, then the username availability lookup.
    pub async fn validate(&self, identity: &IdentityProvider) -> Result<(), FormErrors> {
        let mut errors = self.validate_fields();

        if errors.for_field("username").is_empty() {
            match KeycloakUser::from_username(identity, &self.username).await {
                Err(e) if e.is_not_found() => {}
                Ok(_) => errors.add("username", USERNAME_TAKEN_MESSAGE),
                Err(e) => {
                    error!("Cannot check availability of '{}': {}", self.username, e);
                    errors.add("username", USERNAME_TAKEN_MESSAGE);
                }
            }
        }

        errors.into_result()
    }

    pub async fn save(&self, identity: &IdentityProvider) -> DomainResult<KeycloakUser> {
        let user = KeycloakUser::create_new(
            identity,
            &self.username,
            &self.password,
            &self.email,
            &self.first_name,
            &self.last_name,
        )
        .await?;

        info!("Registered '{}'", user.username());
        Ok(user)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
}

impl LoginForm {
    pub fn normalized(self) -> Self {
        Self {
            username: self.username.trim().to_string(),
            ..self
        }
    }

    pub fn validate_fields(&self) -> FormErrors {
        let mut errors = FormErrors::default();
        check_username(&mut errors, &self.username);
        check_required(&mut errors, "password", &self.password);
        errors
    }

    /// Resolve the user and obtain a token. Every remote failure reports the
    /// same message so unknown usernames cannot be told apart.
    pub async fn validate(&self, identity: &IdentityProvider) -> Result<ValidatedLogin, FormErrors> {
        self.validate_fields().into_result()?;

        let invalid = || {
            let mut errors = FormErrors::default();
            errors.add("username", INVALID_LOGIN_MESSAGE);
            errors
        };

        let user = match KeycloakUser::from_username(identity, &self.username).await {
            Ok(user) => user,
            Err(e) => {
                if !e.is_not_found() {
                    error!("Login lookup for '{}' failed: {}", self.username, e);
                }
                return Err(invalid());
            }
        };

        match user.get_token(Some(&self.password)).await {
            Ok(Some(token)) => Ok(ValidatedLogin { user, token }),
            Ok(None) => Err(invalid()),
            Err(e) => {
                warn!("Token request for '{}' not attempted: {}", self.username, e);
                Err(invalid())
            }
        }
    }
}

/// A login that passed validation, with the user and token it obtained
#[derive(Debug)]
pub struct ValidatedLogin {
    user: KeycloakUser,
    token: TokenSet,
}

impl ValidatedLogin {
    pub fn save(self) -> (KeycloakUser, TokenSet) {
        (self.user, self.token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keycloak_identity::testing::InMemoryIdentityProvider;

    fn registration(username: &str, password: &str, confirm: &str) -> RegistrationForm {
        RegistrationForm {
            username: username.to_string(),
            email: "a@x.com".to_string(),
            first_name: "Alice".to_string(),
            last_name: "A".to_string(),
            password: password.to_string(),
            confirm: confirm.to_string(),
        }
    }

    #[test]
    fn username_length_is_counted_in_characters() {
        assert!(registration("abcd", "p", "p").validate_fields().is_empty());
        assert!(registration(&"a".repeat(25), "p", "p").validate_fields().is_empty());
        assert_eq!(
            registration("ééé", "p", "p").validate_fields().for_field("username"),
            vec![LENGTH_MESSAGE]
        );
        assert!(registration("éééé", "p", "p").validate_fields().is_empty());
        assert_eq!(
            registration(&"a".repeat(26), "p", "p").validate_fields().for_field("username"),
            vec![LENGTH_MESSAGE]
        );
    }

    #[test]
    fn whitespace_only_fields_are_missing() {
        let form = RegistrationForm {
            email: "   ".to_string(),
            first_name: String::new(),
            ..registration("alice123", "p", "p")
        }
        .normalized();

        let errors = form.validate_fields();
        assert_eq!(errors.for_field("email"), vec![REQUIRED_MESSAGE]);
        assert_eq!(errors.for_field("first_name"), vec![REQUIRED_MESSAGE]);
        assert!(errors.for_field("last_name").is_empty());
    }

    #[test]
    fn passwords_must_match() {
        let errors = registration("alice123", "p@ss", "other").validate_fields();
        assert_eq!(errors.for_field("password"), vec![PASSWORD_MISMATCH_MESSAGE]);

        let errors = registration("alice123", "", "").validate_fields();
        assert_eq!(errors.for_field("password"), vec![REQUIRED_MESSAGE]);
    }

    #[test]
    fn blank_passwords_are_missing() {
        let errors = registration("alice123", "   ", "   ").validate_fields();
        assert_eq!(errors.for_field("password"), vec![REQUIRED_MESSAGE]);

        let login = LoginForm {
            username: "alice123".to_string(),
            password: "\t ".to_string(),
        };
        assert_eq!(login.validate_fields().for_field("password"), vec![REQUIRED_MESSAGE]);
    }

    #[test]
    fn surrounding_spaces_are_part_of_the_password() {
        let form = registration("alice123", " p@ss ", " p@ss ").normalized();
        assert!(form.validate_fields().is_empty());
        assert_eq!(form.password, " p@ss ");
    }

    #[test]
    fn normalization_keeps_passwords() {
        let form = registration("  alice123 ", " p ", " p ").normalized();
        assert_eq!(form.username, "alice123");
        assert_eq!(form.password, " p ");
    }

    #[test]
    fn errors_group_by_field() {
        let errors = registration("abc", "x", "y").validate_fields();
        let grouped = errors.by_field();

        assert_eq!(grouped["username"], vec![LENGTH_MESSAGE.to_string()]);
        assert_eq!(grouped["password"], vec![PASSWORD_MISMATCH_MESSAGE.to_string()]);
        assert_eq!(errors.iter().count(), 2);
    }

    #[tokio::test]
    async fn taken_username_blocks_registration() {
        let provider = InMemoryIdentityProvider::new();
        provider.seed_user("alice123", "pw", "a@x.com", "Alice", "A");

        let errors = registration("alice123", "p", "p")
            .validate(&provider.provider())
            .await
            .unwrap_err();

        assert_eq!(errors.for_field("username"), vec![USERNAME_TAKEN_MESSAGE]);
    }

    #[tokio::test]
    async fn lookup_outage_blocks_registration() {
        let provider = InMemoryIdentityProvider::new();
        provider.set_fail_admin(true);

        let errors = registration("alice123", "p", "p")
            .validate(&provider.provider())
            .await
            .unwrap_err();

        assert_eq!(errors.for_field("username"), vec![USERNAME_TAKEN_MESSAGE]);
    }

    #[tokio::test]
    async fn short_username_skips_remote_lookup() {
        let provider = InMemoryIdentityProvider::new();
        provider.set_fail_admin(true);

        let errors = registration("abc", "p", "p")
            .validate(&provider.provider())
            .await
            .unwrap_err();

        assert_eq!(errors.for_field("username"), vec![LENGTH_MESSAGE]);
    }

    #[tokio::test]
    async fn login_failures_share_one_message() {
        let provider = InMemoryIdentityProvider::new();
        provider.seed_user("alice123", "p@ss", "a@x.com", "Alice", "A");
        let identity = provider.provider();

        let wrong_password = LoginForm {
            username: "alice123".to_string(),
            password: "nope".to_string(),
        }
        .validate(&identity)
        .await
        .unwrap_err();
        let unknown_user = LoginForm {
            username: "mallory".to_string(),
            password: "nope".to_string(),
        }
        .validate(&identity)
        .await
        .unwrap_err();

        assert_eq!(wrong_password, unknown_user);
        assert_eq!(wrong_password.for_field("username"), vec![INVALID_LOGIN_MESSAGE]);
    }

    #[tokio::test]
    async fn successful_login_keeps_user_and_token() {
        let provider = InMemoryIdentityProvider::new();
        let id = provider.seed_user("alice123", "p@ss", "a@x.com", "Alice", "A");

        let (user, token) = LoginForm {
            username: "alice123".to_string(),
            password: "p@ss".to_string(),
        }
        .validate(&provider.provider())
        .await
        .unwrap()
        .save();

        assert_eq!(user.user_id(), Some(id.as_str()));
        assert!(!token.access_token.is_empty());
    }
}
