//! Authenticated caller identity
//!
//! Authentication mechanics (token issuance and verification) live outside
//! this service; the gateway trusts the `X-User-Id` header the outer layer
//! sets after authenticating the request, and only parses it into an
//! account identifier.

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

use crate::error::ApiError;

/// Header carrying the authenticated account ID
pub const USER_ID_HEADER: &str = "x-user-id";

/// The authenticated caller of a request
#[derive(Debug, Clone, Copy)]
pub struct CallerIdentity(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for CallerIdentity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| Uuid::parse_str(value).ok())
            .map(CallerIdentity)
            .ok_or_else(|| {
                ApiError::Unauthorized(format!("Missing or invalid {} header", USER_ID_HEADER))
            })
    }
}
