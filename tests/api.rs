use std::net::TcpListener;
use std::sync::Arc;

use jid_auth::auth::MIN_BCRYPT_COST;
use jid_auth::configuration::{
    ApplicationSettings, AuthSettings, DatabaseSettings, JwtSettings, LogoutPolicy, Settings,
    StorageBackend, StorageSettings,
};
use jid_auth::startup::{build_flow, run};
use jid_auth::users::InMemoryUserRepository;
use reqwest::header::{AUTHORIZATION, COOKIE, SET_COOKIE};
use serde_json::{json, Value};

pub struct TestApp {
    pub address: String,
    pub client: reqwest::Client,
}

fn test_settings(logout_policy: LogoutPolicy) -> Settings {
    Settings {
        application: ApplicationSettings {
            port: 0,
            host: "127.0.0.1".to_string(),
        },
        database: DatabaseSettings {
            username: "unused".to_string(),
            password: "unused".to_string(),
            port: 5432,
            host: "localhost".to_string(),
            database_name: "unused".to_string(),
        },
        jwt: JwtSettings {
            access_token_secret: "access-secret-key-at-least-32-characters-long".to_string(),
            refresh_token_secret: "refresh-secret-key-at-least-32-characters-long".to_string(),
            access_token_expiry: 900,
            refresh_token_expiry: 604800,
            issuer: "test".to_string(),
        },
        auth: AuthSettings {
            bcrypt_cost: MIN_BCRYPT_COST,
            logout_policy,
            ..AuthSettings::default()
        },
        storage: StorageSettings {
            backend: StorageBackend::Memory,
        },
    }
}

fn spawn_app_with(logout_policy: LogoutPolicy) -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    let settings = test_settings(logout_policy);
    settings.validate().expect("Test settings must be valid");
    let (flow, refresh_cookie) = build_flow(&settings, Arc::new(InMemoryUserRepository::new()))
        .expect("Failed to build auth flow");

    let server = run(listener, flow, refresh_cookie).expect("Failed to bind address");
    let _ = tokio::spawn(server);

    TestApp {
        address: format!("http://127.0.0.1:{}", port),
        client: reqwest::Client::new(),
    }
}

fn spawn_app() -> TestApp {
    spawn_app_with(LogoutPolicy::ClearCookie)
}

/// Value of the `jid` cookie from a response's Set-Cookie headers
fn refresh_cookie(response: &reqwest::Response) -> Option<String> {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .find(|h| h.starts_with("jid="))
        .map(|h| {
            h.trim_start_matches("jid=")
                .split(';')
                .next()
                .unwrap_or_default()
                .to_string()
        })
}

fn set_cookie_header(response: &reqwest::Response) -> String {
    response
        .headers()
        .get(SET_COOKIE)
        .expect("Missing Set-Cookie header")
        .to_str()
        .unwrap()
        .to_string()
}

impl TestApp {
    async fn register(&self, email: &str) -> reqwest::Response {
        self.client
            .post(&format!("{}/auth/register", &self.address))
            .json(&json!({
                "name": "Ada Lovelace",
                "email": email,
                "company": "Analytical",
                "password": "correct horse"
            }))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    async fn login(&self, email: &str, password: &str) -> reqwest::Response {
        self.client
            .post(&format!("{}/auth/login", &self.address))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    /// Register and log in, returning (access token, refresh cookie value)
    async fn signed_in(&self) -> (String, String) {
        assert_eq!(201, self.register("ada@example.com").await.status().as_u16());
        let response = self.login("ada@example.com", "correct horse").await;
        assert_eq!(200, response.status().as_u16());

        let cookie = refresh_cookie(&response).expect("Login must set the refresh cookie");
        let body: Value = response.json().await.unwrap();
        let access = body["accessToken"].as_str().unwrap().to_string();
        (access, cookie)
    }

    async fn refresh(&self, cookie: Option<&str>) -> reqwest::Response {
        let mut request = self
            .client
            .post(&format!("{}/refresh_token", &self.address));
        if let Some(cookie) = cookie {
            request = request.header(COOKIE, format!("jid={}", cookie));
        }
        request.send().await.expect("Failed to execute request.")
    }
}

#[tokio::test]
async fn health_check_works() {
    let app = spawn_app();

    let response = app
        .client
        .get(&format!("{}/health_check", &app.address))
        .send()
        .await
        .expect("Failed to execute request");

    assert!(response.status().is_success());
    assert_eq!(response.text().await.unwrap(), "OK");
}

// --- Registration ---

#[tokio::test]
async fn register_returns_201_with_profile() {
    let app = spawn_app();

    let response = app.register("ada@example.com").await;
    assert_eq!(201, response.status().as_u16());
    assert!(refresh_cookie(&response).is_none(), "register must not log in");

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["user"]["email"], "ada@example.com");
    assert_eq!(body["user"]["company"], "Analytical");
    assert!(body["user"].get("password_hash").is_none());
    assert!(body.get("accessToken").is_none());
}

#[tokio::test]
async fn register_returns_409_for_duplicate_email() {
    let app = spawn_app();

    assert_eq!(201, app.register("ada@example.com").await.status().as_u16());

    let response = app.register("ada@example.com").await;
    assert_eq!(409, response.status().as_u16());

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["errors"][0]["message"], "username already taken");
}

#[tokio::test]
async fn register_returns_400_for_missing_fields() {
    let app = spawn_app();

    let test_cases = vec![
        (json!({"email": "a@example.com", "company": "c", "password": "p"}), "missing name"),
        (json!({"name": "A", "company": "c", "password": "p"}), "missing email"),
        (json!({"name": "A", "email": "a@example.com", "password": "p"}), "missing company"),
        (json!({}), "missing all fields"),
    ];

    for (body, reason) in test_cases {
        let response = app
            .client
            .post(&format!("{}/auth/register", &app.address))
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request.");

        assert_eq!(400, response.status().as_u16(), "Should reject: {}", reason);
    }
}

#[tokio::test]
async fn register_returns_400_for_invalid_email() {
    let app = spawn_app();

    let response = app.register("not-an-email").await;
    assert_eq!(400, response.status().as_u16());

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["errors"][0]["field"], "email");
}

#[tokio::test]
async fn register_and_login_accept_punycode_and_punctuation() {
    let app = spawn_app();

    let response = app
        .client
        .post(&format!("{}/auth/register", &app.address))
        .json(&json!({
            "name": "Ada -- Lovelace",
            "email": "ada@xn--bcher-kva.ch",
            "company": "Smith; Jones LLC",
            "password": "correct horse"
        }))
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(201, response.status().as_u16());

    let response = app.login("ada@xn--bcher-kva.ch", "correct horse").await;
    assert_eq!(200, response.status().as_u16());
    assert!(refresh_cookie(&response).is_some());

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["user"]["company"], "Smith; Jones LLC");
    assert_eq!(body["user"]["name"], "Ada -- Lovelace");
}

// --- Login ---

#[tokio::test]
async fn login_sets_http_only_refresh_cookie() {
    let app = spawn_app();
    app.register("ada@example.com").await;

    let response = app.login("ada@example.com", "correct horse").await;
    assert_eq!(200, response.status().as_u16());

    let header = set_cookie_header(&response);
    assert!(header.starts_with("jid="));
    assert!(header.contains("HttpOnly"));

    let body: Value = response.json().await.unwrap();
    assert!(body["accessToken"].as_str().map_or(false, |t| !t.is_empty()));
    assert_eq!(body["user"]["email"], "ada@example.com");
    assert!(body.get("refreshToken").is_none());
}

#[tokio::test]
async fn login_failures_return_identical_bodies() {
    let app = spawn_app();
    app.register("ada@example.com").await;

    let wrong_password = app.login("ada@example.com", "incorrect").await;
    let unknown_email = app.login("nobody@example.com", "correct horse").await;

    assert_eq!(401, wrong_password.status().as_u16());
    assert_eq!(401, unknown_email.status().as_u16());
    assert!(refresh_cookie(&wrong_password).is_none());

    let first: Value = wrong_password.json().await.unwrap();
    let second: Value = unknown_email.json().await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first["errors"][0]["message"], "Username or password invalid");
}

// --- Current user ---

#[tokio::test]
async fn me_returns_user_for_valid_token() {
    let app = spawn_app();
    let (access, _) = app.signed_in().await;

    let response = app
        .client
        .get(&format!("{}/auth/me", &app.address))
        .header(AUTHORIZATION, format!("Bearer {}", access))
        .send()
        .await
        .unwrap();

    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["user"]["email"], "ada@example.com");
}

#[tokio::test]
async fn me_rejects_missing_and_invalid_tokens_uniformly() {
    let app = spawn_app();

    for header in [None, Some("Bearer invalid.token.here"), Some("Token abc")] {
        let mut request = app.client.get(&format!("{}/auth/me", &app.address));
        if let Some(value) = header {
            request = request.header(AUTHORIZATION, value);
        }
        let response = request.send().await.unwrap();

        assert_eq!(401, response.status().as_u16());
        let body: Value = response.json().await.unwrap();
        assert_eq!(body, json!({"errors": [{"message": "Not Authorized"}]}));
    }
}

// --- Refresh ---

#[tokio::test]
async fn refresh_without_cookie_returns_ok_false() {
    let app = spawn_app();

    let response = app.refresh(None).await;
    assert_eq!(200, response.status().as_u16());
    assert!(refresh_cookie(&response).is_none());

    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({"ok": false, "accessToken": ""}));
}

#[tokio::test]
async fn refresh_with_garbage_cookie_returns_ok_false() {
    let app = spawn_app();

    let body: Value = app.refresh(Some("garbage")).await.json().await.unwrap();
    assert_eq!(body, json!({"ok": false, "accessToken": ""}));
}

#[tokio::test]
async fn refresh_rotates_cookie_and_issues_access_token() {
    let app = spawn_app();
    let (_, cookie) = app.signed_in().await;

    let response = app.refresh(Some(&cookie)).await;
    assert_eq!(200, response.status().as_u16());
    let rotated = refresh_cookie(&response).expect("Refresh must rotate the cookie");

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["ok"], true);
    let access = body["accessToken"].as_str().unwrap().to_string();

    let me = app
        .client
        .get(&format!("{}/auth/me", &app.address))
        .header(AUTHORIZATION, format!("Bearer {}", access))
        .send()
        .await
        .unwrap();
    assert_eq!(200, me.status().as_u16());

    let body: Value = app.refresh(Some(&rotated)).await.json().await.unwrap();
    assert_eq!(body["ok"], true);
}

// --- Logout and revocation ---

#[tokio::test]
async fn logout_clears_refresh_cookie() {
    let app = spawn_app();
    let (_, cookie) = app.signed_in().await;

    let response = app
        .client
        .post(&format!("{}/auth/logout", &app.address))
        .header(COOKIE, format!("jid={}", cookie))
        .send()
        .await
        .unwrap();

    assert_eq!(200, response.status().as_u16());
    assert_eq!(refresh_cookie(&response).as_deref(), Some(""));
    assert!(set_cookie_header(&response).contains("Max-Age=0"));

    // Default policy leaves the old value subject to normal verification.
    let body: Value = app.refresh(Some(&cookie)).await.json().await.unwrap();
    assert_eq!(body["ok"], true);
}

#[tokio::test]
async fn logout_with_revoke_policy_invalidates_old_cookie() {
    let app = spawn_app_with(LogoutPolicy::RevokeAll);
    let (_, cookie) = app.signed_in().await;

    app.client
        .post(&format!("{}/auth/logout", &app.address))
        .header(COOKIE, format!("jid={}", cookie))
        .send()
        .await
        .unwrap();

    let body: Value = app.refresh(Some(&cookie)).await.json().await.unwrap();
    assert_eq!(body, json!({"ok": false, "accessToken": ""}));
}

#[tokio::test]
async fn revoke_invalidates_outstanding_refresh_tokens() {
    let app = spawn_app();
    let (access, cookie) = app.signed_in().await;

    let response = app
        .client
        .post(&format!("{}/auth/revoke", &app.address))
        .header(AUTHORIZATION, format!("Bearer {}", access))
        .send()
        .await
        .unwrap();
    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["tokenVersion"], 1);

    let body: Value = app.refresh(Some(&cookie)).await.json().await.unwrap();
    assert_eq!(body["ok"], false);
}

#[tokio::test]
async fn revoke_requires_access_token() {
    let app = spawn_app();

    let response = app
        .client
        .post(&format!("{}/auth/revoke", &app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(401, response.status().as_u16());
}

// --- Protected listing ---

#[tokio::test]
async fn users_listing_is_protected() {
    let app = spawn_app();
    let (access, _) = app.signed_in().await;

    let anonymous = app
        .client
        .get(&format!("{}/users", &app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(401, anonymous.status().as_u16());
    let body: Value = anonymous.json().await.unwrap();
    assert_eq!(body["errors"][0]["message"], "Not Authorized");

    let response = app
        .client
        .get(&format!("{}/users", &app.address))
        .header(AUTHORIZATION, format!("Bearer {}", access))
        .send()
        .await
        .unwrap();
    assert_eq!(200, response.status().as_u16());
    let users: Value = response.json().await.unwrap();
    assert_eq!(users.as_array().map(Vec::len), Some(1));
    assert_eq!(users[0]["email"], "ada@example.com");
}
