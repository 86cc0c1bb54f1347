use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::{repo_types::User, session::Session};

/// Raw credentials body. Both fields are optional on the wire so that a
/// missing field is a denial rather than a 422.
#[derive(Debug, Default, Deserialize)]
pub struct CredentialsRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Credentials that passed boundary checks.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Profile asserted by the OAuth provider after its own exchange. Other
/// provider fields are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OAuthProfile {
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct OAuthSignInRequest {
    #[serde(default)]
    pub profile: Option<OAuthProfile>,
}

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub code: i32,
}

/// Returned by every route that issues or re-signs a token.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub token: String,
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
    pub session: Session,
}

/// Public part of the user record.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub email: String,
    pub username: Option<String>,
    pub is_verified: bool,
    pub profile_pic_src: String,
    pub streak_id: Option<Uuid>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            username: user.username,
            is_verified: user.is_verified,
            profile_pic_src: user.profile_pic_src,
            streak_id: user.streak_id,
            created_at: user.created_at,
        }
    }
}
