/// Refresh cookie handling
///
/// The auth flow only says what should happen to the refresh cookie; this
/// module turns that into an actual `Set-Cookie`.

use actix_web::cookie::{time::Duration, Cookie, SameSite};

use crate::configuration::AuthSettings;

/// What the HTTP layer must do with the refresh cookie
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CookieInstruction {
    /// Store this refresh token
    Set(String),
    /// Replace the cookie with an empty, already-expired value
    Clear,
}

#[derive(Debug, Clone)]
pub struct RefreshCookie {
    name: String,
    path: String,
    secure: bool,
    max_age_seconds: i64,
}

impl RefreshCookie {
    pub fn new(settings: &AuthSettings, max_age_seconds: i64) -> Self {
        Self {
            name: settings.refresh_cookie_name.clone(),
            path: settings.cookie_path.clone(),
            secure: settings.cookie_secure,
            max_age_seconds,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn build(&self, instruction: &CookieInstruction) -> Cookie<'static> {
        let value = match instruction {
            CookieInstruction::Set(token) => token.clone(),
            CookieInstruction::Clear => String::new(),
        };

        let mut cookie = Cookie::build(self.name.clone(), value)
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .path(self.path.clone())
            .max_age(Duration::seconds(self.max_age_seconds))
            .finish();

        if *instruction == CookieInstruction::Clear {
            cookie.make_removal();
        }

        cookie
    }
}
