use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;

use crate::{
    auth::{claims::Claims, jwt::JwtKeys},
    error::ApiError,
    state::AppState,
};

/// Header carrying the secret shared with the service that completes the
/// provider exchange.
pub const OAUTH_BRIDGE_HEADER: &str = "x-oauth-bridge-secret";

/// Extracts and validates the bearer JWT.
pub struct AuthSession(pub Claims);

#[async_trait]
impl<S> FromRequestParts<S> for AuthSession
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or(ApiError::MissingBearer)?;

        // Expect "Bearer <token>"
        let token = auth
            .strip_prefix("Bearer ")
            .or_else(|| auth.strip_prefix("bearer "))
            .ok_or(ApiError::MissingBearer)?;

        let keys = JwtKeys::from_ref(state);
        let claims = keys.verify(token.trim()).map_err(|e| {
            warn!(error = %e, "invalid or expired token");
            ApiError::InvalidToken
        })?;

        Ok(AuthSession(claims))
    }
}

#[derive(Clone)]
pub struct OAuthBridgeSecret(pub Option<String>);

impl FromRef<AppState> for OAuthBridgeSecret {
    fn from_ref(state: &AppState) -> Self {
        OAuthBridgeSecret(state.config.oauth_bridge_secret.clone())
    }
}

/// Proof that the caller is the trusted OAuth bridge. Without it a posted
/// profile is just a claim by an anonymous client.
#[derive(Debug)]
pub struct OAuthBridge;

#[async_trait]
impl<S> FromRequestParts<S> for OAuthBridge
where
    S: Send + Sync,
    OAuthBridgeSecret: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let OAuthBridgeSecret(expected) = OAuthBridgeSecret::from_ref(state);
        let Some(expected) = expected else {
            warn!("oauth sign-in refused: no bridge secret configured");
            return Err(ApiError::NotAuthenticated);
        };

        let presented = parts
            .headers
            .get(OAUTH_BRIDGE_HEADER)
            .and_then(|h| h.to_str().ok())
            .unwrap_or_default();
        if !secrets_match(presented.as_bytes(), expected.as_bytes()) {
            warn!("oauth sign-in refused: bad bridge secret");
            return Err(ApiError::NotAuthenticated);
        }
        Ok(OAuthBridge)
    }
}

// Length leaks; content does not.
fn secrets_match(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
