use actix_web::{web, HttpResponse};
use tracing::Instrument;

use crate::auth::AuthFlow;
use crate::error::{AppError, ErrorContext};

/// GET /users
///
/// Lists all user profiles. Requires a valid access token (enforced by
/// `JwtMiddleware`).
pub async fn list_users(flow: web::Data<AuthFlow>) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("list_users");
    let users = flow.list_users().instrument(context.span()).await?;
    Ok(HttpResponse::Ok().json(users))
}
