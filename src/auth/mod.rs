/// Authentication module
///
/// Token issuance and verification, password hashing, refresh token
/// revocation and the flow that ties them together.

mod claims;
mod cookie;
mod flow;
mod jwt;
mod password;
mod responses;
mod revocation;

pub use claims::{AccessClaims, RefreshClaims};
pub use cookie::{CookieInstruction, RefreshCookie};
pub use flow::{bearer_token, AuthFailure, AuthFlow, AuthOutcome, LoginPayload};
pub use jwt::TokenCodec;
pub use password::{hash_password, validate_password, verify_password};
pub use password::{MAX_BCRYPT_COST, MIN_BCRYPT_COST};
pub use responses::{FieldError, OkResponse, RefreshResponse, UserResponse};
pub use revocation::{bump as bump_token_version, current_version, is_current};
