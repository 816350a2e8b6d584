/// Authentication Routes
///
/// Handles registration, login, current user, refresh and logout. Expected
/// failures come back as `UserResponse.errors` (or `ok: false` for the
/// refresh endpoint); only fatal errors go through `AppError`.

use actix_web::{
    http::{header::AUTHORIZATION, StatusCode},
    web, HttpRequest, HttpResponse,
};
use serde::{Deserialize, Serialize};
use tracing::Instrument;

use crate::auth::{
    AccessClaims, AuthFailure, AuthFlow, CookieInstruction, OkResponse, RefreshCookie,
    RefreshResponse, UserResponse,
};
use crate::error::{AppError, AuthError, ErrorContext};

/// User registration request
#[derive(Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub company: String,
    pub password: String,
}

/// User login request
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RevokeResponse {
    ok: bool,
    token_version: i32,
}

fn failure_status(failure: &AuthFailure) -> StatusCode {
    match failure {
        AuthFailure::Invalid(_) => StatusCode::BAD_REQUEST,
        AuthFailure::DuplicateUser => StatusCode::CONFLICT,
        AuthFailure::InvalidCredentials
        | AuthFailure::NotAuthorized
        | AuthFailure::RefreshDenied => StatusCode::UNAUTHORIZED,
    }
}

fn respond<T: Serialize>(
    status: StatusCode,
    cookie: Option<CookieInstruction>,
    refresh_cookie: &RefreshCookie,
    body: &T,
) -> HttpResponse {
    let mut builder = HttpResponse::build(status);
    if let Some(instruction) = cookie {
        builder.cookie(refresh_cookie.build(&instruction));
    }
    builder.json(body)
}

fn read_refresh_cookie(req: &HttpRequest, refresh_cookie: &RefreshCookie) -> Option<String> {
    req.cookie(refresh_cookie.name())
        .map(|cookie| cookie.value().to_string())
}

/// POST /auth/register
///
/// # Errors
/// - 400: Validation errors (body lists the offending field)
/// - 409: Email already registered ("username already taken")
/// - 500: Internal server error
pub async fn register(
    form: web::Json<RegisterRequest>,
    flow: web::Data<AuthFlow>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("user_registration");

    let outcome = flow
        .register(&form.name, &form.email, &form.company, &form.password)
        .instrument(context.span())
        .await?;

    Ok(match outcome.result {
        Ok(user) => HttpResponse::Created().json(UserResponse::from(user)),
        Err(failure) => {
            HttpResponse::build(failure_status(&failure)).json(UserResponse::failure(&failure))
        }
    })
}

/// POST /auth/login
///
/// Returns the user and an access token; the refresh token is set as an
/// http-only cookie.
///
/// # Security Notes
/// - Uses same error message for "not found" and "wrong password"
pub async fn login(
    form: web::Json<LoginRequest>,
    flow: web::Data<AuthFlow>,
    refresh_cookie: web::Data<RefreshCookie>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("user_login");

    let outcome = flow
        .login(&form.email, &form.password)
        .instrument(context.span())
        .await?;

    Ok(match outcome.result {
        Ok(payload) => respond(
            StatusCode::OK,
            outcome.cookie,
            &refresh_cookie,
            &UserResponse::from(payload),
        ),
        Err(failure) => {
            HttpResponse::build(failure_status(&failure)).json(UserResponse::failure(&failure))
        }
    })
}

/// GET /auth/me
///
/// Missing, malformed and expired access tokens all yield the same
/// 401 "Not Authorized" body.
pub async fn current_user(
    req: HttpRequest,
    flow: web::Data<AuthFlow>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("current_user");
    let authorization = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let outcome = flow
        .current_user(authorization)
        .instrument(context.span())
        .await?;

    Ok(match outcome.result {
        Ok(user) => HttpResponse::Ok().json(UserResponse::from(user)),
        Err(failure) => {
            HttpResponse::build(failure_status(&failure)).json(UserResponse::failure(&failure))
        }
    })
}

/// POST /refresh_token
///
/// Reads only the refresh cookie. Always answers 200 with
/// `{ok, accessToken}`; on success the cookie is rotated.
pub async fn refresh_token(
    req: HttpRequest,
    flow: web::Data<AuthFlow>,
    refresh_cookie: web::Data<RefreshCookie>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("token_refresh");
    let token = read_refresh_cookie(&req, &refresh_cookie);

    let outcome = flow
        .refresh(token.as_deref())
        .instrument(context.span())
        .await?;

    Ok(respond(
        StatusCode::OK,
        outcome.cookie,
        &refresh_cookie,
        &RefreshResponse::from(outcome.result),
    ))
}

/// POST /auth/logout
///
/// Clears the refresh cookie. Whether previously issued refresh tokens are
/// also revoked depends on `auth.logout_policy`.
pub async fn logout(
    req: HttpRequest,
    flow: web::Data<AuthFlow>,
    refresh_cookie: web::Data<RefreshCookie>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("user_logout");
    let token = read_refresh_cookie(&req, &refresh_cookie);

    let outcome = flow
        .logout(token.as_deref())
        .instrument(context.span())
        .await?;

    Ok(respond(
        StatusCode::OK,
        outcome.cookie,
        &refresh_cookie,
        &OkResponse { ok: outcome.result.is_ok() },
    ))
}

/// POST /auth/revoke
///
/// Revokes every refresh token of the authenticated user and clears the
/// caller's cookie. **Requires a valid access token**.
pub async fn revoke(
    claims: Option<web::ReqData<AccessClaims>>,
    flow: web::Data<AuthFlow>,
    refresh_cookie: web::Data<RefreshCookie>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("token_revoke");
    let claims = claims.ok_or(AppError::Auth(AuthError::MissingToken))?;

    let token_version = flow
        .revoke(claims.user_id)
        .instrument(context.span())
        .await?;

    Ok(respond(
        StatusCode::OK,
        Some(CookieInstruction::Clear),
        &refresh_cookie,
        &RevokeResponse { ok: true, token_version },
    ))
}
