/// Response bodies for the auth endpoints
///
/// Expected failures are reported as a list of field errors inside the
/// body, never as a transport-level error.

use serde::Serialize;

use crate::auth::flow::{AuthFailure, LoginPayload};
use crate::users::UserProfile;

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct FieldError {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<&'static str>,
    pub message: String,
}

impl From<&AuthFailure> for FieldError {
    fn from(failure: &AuthFailure) -> Self {
        Self {
            field: failure.field(),
            message: failure.to_string(),
        }
    }
}

#[derive(Debug, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserProfile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
}

impl UserResponse {
    pub fn failure(failure: &AuthFailure) -> Self {
        Self {
            errors: Some(vec![failure.into()]),
            ..Self::default()
        }
    }
}

impl From<UserProfile> for UserResponse {
    fn from(user: UserProfile) -> Self {
        Self {
            user: Some(user),
            ..Self::default()
        }
    }
}

impl From<LoginPayload> for UserResponse {
    fn from(payload: LoginPayload) -> Self {
        Self {
            errors: None,
            user: Some(payload.user),
            access_token: Some(payload.access_token),
        }
    }
}

/// Body of `POST /refresh_token`
#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub ok: bool,
    pub access_token: String,
}

impl RefreshResponse {
    pub fn denied() -> Self {
        Self {
            ok: false,
            access_token: String::new(),
        }
    }
}

impl From<Result<String, AuthFailure>> for RefreshResponse {
    fn from(result: Result<String, AuthFailure>) -> Self {
        match result {
            Ok(access_token) => Self { ok: true, access_token },
            Err(_) => Self::denied(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub ok: bool,
}
