use crate::auth::{MAX_BCRYPT_COST, MIN_BCRYPT_COST};
use crate::error::{AppError, ConfigError as SettingsError};

const MIN_SECRET_LENGTH: usize = 32;

#[derive(serde::Deserialize, Clone, Debug)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub database: DatabaseSettings,
    pub jwt: JwtSettings,
    #[serde(default)]
    pub auth: AuthSettings,
    #[serde(default)]
    pub storage: StorageSettings,
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct ApplicationSettings {
    pub port: u16,
    #[serde(default = "default_host")]
    pub host: String,
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct DatabaseSettings {
    pub username: String,
    pub password: String,
    pub port: u16,
    pub host: String,
    pub database_name: String,
}

impl DatabaseSettings {
    pub fn connection_string(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database_name
        )
    }
}

/// JWT signing settings
///
/// Access and refresh tokens are signed with separate secrets so that one
/// kind can never be accepted in place of the other.
#[derive(serde::Deserialize, Clone)]
pub struct JwtSettings {
    pub access_token_secret: String,
    pub refresh_token_secret: String,
    pub access_token_expiry: i64,   // seconds (e.g., 900 for 15 minutes)
    pub refresh_token_expiry: i64,  // seconds (e.g., 604800 for 7 days)
    pub issuer: String,
}

// Secrets stay out of logs.
impl std::fmt::Debug for JwtSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtSettings")
            .field("access_token_secret", &"[redacted]")
            .field("refresh_token_secret", &"[redacted]")
            .field("access_token_expiry", &self.access_token_expiry)
            .field("refresh_token_expiry", &self.refresh_token_expiry)
            .field("issuer", &self.issuer)
            .finish()
    }
}

/// What `logout` does besides clearing the refresh cookie
#[derive(serde::Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogoutPolicy {
    /// Only clear the cookie; previously issued refresh tokens stay valid
    /// until they expire.
    #[default]
    ClearCookie,
    /// Bump the user's token version, invalidating every refresh token
    /// issued before the logout.
    RevokeAll,
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct AuthSettings {
    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,
    #[serde(default = "default_cookie_name")]
    pub refresh_cookie_name: String,
    #[serde(default = "default_cookie_path")]
    pub cookie_path: String,
    #[serde(default)]
    pub cookie_secure: bool,
    #[serde(default)]
    pub logout_policy: LogoutPolicy,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            bcrypt_cost: default_bcrypt_cost(),
            refresh_cookie_name: default_cookie_name(),
            cookie_path: default_cookie_path(),
            cookie_secure: false,
            logout_policy: LogoutPolicy::default(),
        }
    }
}

#[derive(serde::Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    #[default]
    Postgres,
    Memory,
}

#[derive(serde::Deserialize, Clone, Debug, Default)]
pub struct StorageSettings {
    #[serde(default)]
    pub backend: StorageBackend,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_bcrypt_cost() -> u32 {
    12
}

fn default_cookie_name() -> String {
    "jid".to_string()
}

fn default_cookie_path() -> String {
    "/".to_string()
}

impl Settings {
    /// Reject settings the server must not start with
    pub fn validate(&self) -> Result<(), SettingsError> {
        self.jwt.validate()?;

        if !(MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&self.auth.bcrypt_cost) {
            return Err(SettingsError::InvalidValue(format!(
                "auth.bcrypt_cost must be between {} and {}",
                MIN_BCRYPT_COST, MAX_BCRYPT_COST
            )));
        }

        if self.auth.refresh_cookie_name.trim().is_empty() {
            return Err(SettingsError::MissingRequired(
                "auth.refresh_cookie_name".to_string(),
            ));
        }

        Ok(())
    }
}

impl JwtSettings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        for (name, secret) in [
            ("jwt.access_token_secret", &self.access_token_secret),
            ("jwt.refresh_token_secret", &self.refresh_token_secret),
        ] {
            if secret.len() < MIN_SECRET_LENGTH {
                return Err(SettingsError::InvalidValue(format!(
                    "{} must be at least {} bytes",
                    name, MIN_SECRET_LENGTH
                )));
            }
        }

        if self.access_token_secret == self.refresh_token_secret {
            return Err(SettingsError::InvalidValue(
                "jwt.access_token_secret and jwt.refresh_token_secret must differ".to_string(),
            ));
        }

        if self.access_token_expiry <= 0 || self.refresh_token_expiry <= 0 {
            return Err(SettingsError::InvalidValue(
                "token expiry must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

/// Load settings from `configuration.yaml` (optional) and `APP__*`
/// environment variables, e.g. `APP__JWT__ACCESS_TOKEN_SECRET`.
pub fn get_configuration() -> Result<Settings, AppError> {
    let source = config::Config::builder()
        .add_source(config::File::with_name("configuration").required(false))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .map_err(|e| SettingsError::ParseError(e.to_string()))?;

    parse_settings(source)
}

/// Deserialize and validate an already merged configuration
pub fn parse_settings(source: config::Config) -> Result<Settings, AppError> {
    let settings = source
        .try_deserialize::<Settings>()
        .map_err(|e| SettingsError::ParseError(e.to_string()))?;
    settings.validate()?;
    Ok(settings)
}
