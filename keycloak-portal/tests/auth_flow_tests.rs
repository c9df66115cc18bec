use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use keycloak_identity::{testing::InMemoryIdentityProvider, IdentityAdminPort};
use keycloak_portal::{router, AppState, Config};
use std::collections::BTreeMap;
use std::sync::Arc;
use tower::ServiceExt;

/// Drives the full router over the in-memory identity provider.
struct TestApp {
    provider: Arc<InMemoryIdentityProvider>,
    app: Router,
    cookies: BTreeMap<String, String>,
}

struct Page {
    status: StatusCode,
    location: Option<String>,
    body: String,
}

impl TestApp {
    fn new() -> Self {
        let provider = InMemoryIdentityProvider::new();
        let config = Config::from_lookup(|key| match key {
            "OIDC_CLIENT_SECRET" => Some("s3cret".to_string()),
            "SECRET_KEY" => Some("test-secret".to_string()),
            _ => None,
        })
        .unwrap();
        let state = AppState::with_identity(config, provider.provider()).unwrap();

        Self {
            provider,
            app: router(state),
            cookies: BTreeMap::new(),
        }
    }

    fn cookie_header(&self) -> String {
        self.cookies
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("; ")
    }

    async fn send(&mut self, request: Request<Body>) -> Page {
        let response = self.app.clone().oneshot(request).await.unwrap();
        self.read(response).await
    }

    async fn read(&mut self, response: Response) -> Page {
        for set_cookie in response.headers().get_all(header::SET_COOKIE) {
            let raw = set_cookie.to_str().unwrap();
            let pair = raw.split(';').next().unwrap();
            let (name, value) = pair.split_once('=').unwrap();
            let removed = value.is_empty() || raw.contains("Max-Age=0");
            if removed {
                self.cookies.remove(name);
            } else {
                self.cookies.insert(name.to_string(), value.to_string());
            }
        }

        let status = response.status();
        let location = response
            .headers()
            .get(header::LOCATION)
            .map(|value| value.to_str().unwrap().to_string());
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();

        Page {
            status,
            location,
            body: String::from_utf8(bytes.to_vec()).unwrap(),
        }
    }

    async fn get(&mut self, uri: &str) -> Page {
        let request = Request::builder()
            .uri(uri)
            .header(header::COOKIE, self.cookie_header())
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    async fn post_form(&mut self, uri: &str, form: &str) -> Page {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::COOKIE, self.cookie_header())
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(form.to_string()))
            .unwrap();
        self.send(request).await
    }
}

const ALICE_REGISTRATION: &str =
    "username=alice123&email=a%40x.com&first_name=Alice&last_name=A&password=p%40ss&confirm=p%40ss";

#[tokio::test]
async fn test_health_check() {
    let mut app = TestApp::new();

    let page = app.get("/health").await;

    assert_eq!(page.status, StatusCode::OK);
    assert_eq!(page.body, r#"{"status":"ok"}"#);
}

#[tokio::test]
async fn test_registration_creates_user_and_redirects_to_login() {
    let mut app = TestApp::new();

    let page = app.post_form("/auth/register", ALICE_REGISTRATION).await;

    assert_eq!(page.status, StatusCode::SEE_OTHER);
    assert_eq!(page.location.as_deref(), Some("/auth/login"));
    assert_eq!(app.provider.create_calls(), 1);

    let payload = &app.provider.created_users()[0];
    assert_eq!(payload.username, "alice123");
    assert_eq!(payload.email, "a@x.com");
    assert_eq!(payload.credentials[0].value, "p@ss");
    assert_eq!(payload.credentials[0].type_, "password");
    assert!(payload.enabled);
    assert!(payload.email_verified);
    assert_eq!(payload.realm_roles, vec!["user".to_string()]);

    // Flash shows once on the next page
    let login = app.get("/auth/login").await;
    assert!(login.body.contains("Registration successful! You can now log in."));
    let again = app.get("/auth/login").await;
    assert!(!again.body.contains("Registration successful!"));
}

#[tokio::test]
async fn test_invalid_registration_renders_errors_without_creating() {
    let mut app = TestApp::new();

    let page = app
        .post_form(
            "/auth/register",
            "username=abc&email=&first_name=Alice&last_name=A&password=one&confirm=two",
        )
        .await;

    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("Field must be between 4 and 25 characters long."));
    assert!(page.body.contains("This field is required."));
    assert!(page.body.contains("Passwords must match"));
    assert_eq!(app.provider.create_calls(), 0);
}

#[tokio::test]
async fn test_blank_password_registration_is_rejected() {
    let mut app = TestApp::new();

    let page = app
        .post_form(
            "/auth/register",
            "username=alice123&email=a%40x.com&first_name=Alice&last_name=A&password=+++&confirm=+++",
        )
        .await;

    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("This field is required."));
    assert_eq!(app.provider.create_calls(), 0);
}

#[tokio::test]
async fn test_duplicate_registration_is_a_form_error() {
    let mut app = TestApp::new();
    app.provider
        .seed_user("alice123", "pw", "a@x.com", "Alice", "A");

    let page = app.post_form("/auth/register", ALICE_REGISTRATION).await;

    assert_eq!(page.status, StatusCode::OK);
    assert!(page
        .body
        .contains("Username already exists. Please choose another one."));
    assert_eq!(app.provider.create_calls(), 0);
}

#[tokio::test]
async fn test_login_failures_do_not_reveal_usernames() {
    let mut app = TestApp::new();
    app.provider
        .seed_user("alice123", "p@ss", "a@x.com", "Alice", "A");

    let wrong_password = app
        .post_form("/auth/login", "username=alice123&password=nope")
        .await;
    let unknown_user = app
        .post_form("/auth/login", "username=mallory&password=nope")
        .await;

    for page in [&wrong_password, &unknown_user] {
        assert_eq!(page.status, StatusCode::OK);
        assert!(page.body.contains("Invalid username or password."));
    }
    assert_eq!(
        wrong_password.body.replace("alice123", "mallory"),
        unknown_user.body
    );
    assert!(!app.cookies.contains_key("session"));
}

#[tokio::test]
async fn test_full_session_lifecycle() {
    let mut app = TestApp::new();
    app.post_form("/auth/register", ALICE_REGISTRATION).await;

    let login = app
        .post_form("/auth/login", "username=alice123&password=p%40ss")
        .await;
    assert_eq!(login.status, StatusCode::SEE_OTHER);
    assert_eq!(login.location.as_deref(), Some("/"));
    assert!(app.cookies.contains_key("session"));
    assert!(app.cookies["access_token"].starts_with("token-"));

    let home = app.get("/").await;
    assert!(home.body.contains("Welcome, Alice A!"));

    let profile = app.get("/profile").await;
    assert_eq!(profile.status, StatusCode::OK);
    assert!(profile.body.contains("a@x.com"));
    assert!(profile.body.contains("active"));

    let logout = app.get("/auth/logout").await;
    assert_eq!(logout.status, StatusCode::SEE_OTHER);
    assert_eq!(logout.location.as_deref(), Some("/"));
    assert!(!app.cookies.contains_key("session"));
    assert!(!app.cookies.contains_key("access_token"));

    let home = app.get("/").await;
    assert!(home.body.contains("You are not logged in."));

    let guarded = app.get("/profile").await;
    assert_eq!(guarded.status, StatusCode::SEE_OTHER);
    assert_eq!(guarded.location.as_deref(), Some("/auth/login"));
}

#[tokio::test]
async fn test_profile_requires_login() {
    let mut app = TestApp::new();

    let page = app.get("/profile").await;

    assert_eq!(page.status, StatusCode::SEE_OTHER);
    assert_eq!(page.location.as_deref(), Some("/auth/login"));
}

#[tokio::test]
async fn test_tampered_session_cookie_is_anonymous() {
    let mut app = TestApp::new();
    app.cookies
        .insert("session".to_string(), "forged-value".to_string());

    let home = app.get("/").await;
    assert!(home.body.contains("You are not logged in."));

    let guarded = app.get("/profile").await;
    assert_eq!(guarded.location.as_deref(), Some("/auth/login"));
}

#[tokio::test]
async fn test_profile_shows_expired_token() {
    let mut app = TestApp::new();
    app.provider
        .seed_user("alice123", "p@ss", "a@x.com", "Alice", "A");
    app.post_form("/auth/login", "username=alice123&password=p%40ss")
        .await;

    app.provider.revoke_tokens();
    let profile = app.get("/profile").await;

    assert_eq!(profile.status, StatusCode::OK);
    assert!(profile.body.contains("expired"));
}

#[tokio::test]
async fn test_deleted_user_is_logged_out_on_profile() {
    let mut app = TestApp::new();
    let user_id = app
        .provider
        .seed_user("alice123", "p@ss", "a@x.com", "Alice", "A");
    app.post_form("/auth/login", "username=alice123&password=p%40ss")
        .await;
    assert!(app.cookies.contains_key("session"));

    // Account removed while the session is still live
    app.provider.delete_user(&user_id).await.unwrap();
    assert_eq!(app.provider.user_count(), 0);

    let profile = app.get("/profile").await;
    assert_eq!(profile.location.as_deref(), Some("/auth/login"));
    assert!(!app.cookies.contains_key("session"));
    assert!(!app.cookies.contains_key("access_token"));
}

#[tokio::test]
async fn test_backend_outage_renders_generic_error_page() {
    let mut app = TestApp::new();
    app.provider
        .seed_user("alice123", "p@ss", "a@x.com", "Alice", "A");
    app.post_form("/auth/login", "username=alice123&password=p%40ss")
        .await;

    app.provider.set_fail_admin(true);
    let profile = app.get("/profile").await;

    assert_eq!(profile.status, StatusCode::BAD_GATEWAY);
    assert!(profile.body.contains("Something went wrong"));
    assert!(!profile.body.contains("Mock failure enabled"));
}

#[tokio::test]
async fn test_logout_drops_pending_flash() {
    let mut app = TestApp::new();
    app.post_form("/auth/register", ALICE_REGISTRATION).await;
    assert!(app.cookies.contains_key("flash"));

    app.get("/auth/logout").await;
    assert!(!app.cookies.contains_key("flash"));

    let login = app.get("/auth/login").await;
    assert!(!login.body.contains("Registration successful!"));
}
