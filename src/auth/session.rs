//! Identity, token and session shapes, plus the pure projections between them.
//!
//! The token is the authoritative in-flight snapshot of a login. Sessions are
//! rebuilt from it on every request and never stored.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::repo_types::User;

/// Normalized user fields produced by a successful sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Uuid,
    pub email: String,
    pub username: Option<String>,
    pub is_verified: bool,
    pub profile_pic_src: String,
    pub streak_id: Option<Uuid>,
}

impl From<&User> for Identity {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id,
            email: user.email.clone(),
            username: user.username.clone(),
            is_verified: user.is_verified,
            profile_pic_src: user.profile_pic_src.clone(),
            streak_id: user.streak_id,
        }
    }
}

/// Identity snapshot carried inside the signed JWT.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub username: Option<String>,
    pub user_id: Uuid,
    pub email: String,
    pub is_verified: bool,
    pub profile_pic_src: String,
    pub streak_id: Option<Uuid>,
}

impl From<&Identity> for Token {
    fn from(identity: &Identity) -> Self {
        Self {
            username: identity.username.clone(),
            user_id: identity.user_id,
            email: identity.email.clone(),
            is_verified: identity.is_verified,
            profile_pic_src: identity.profile_pic_src.clone(),
            streak_id: identity.streak_id,
        }
    }
}

/// Partial update requested by the client. `None` means "leave as is".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityPatch {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub is_verified: Option<bool>,
}

impl IdentityPatch {
    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.is_verified.is_none()
    }
}

/// What caused a token projection.
#[derive(Debug, Clone, Copy)]
pub enum Trigger<'a> {
    /// Fresh authentication: every field comes from the identity.
    SignIn(&'a Identity),
    /// Client-initiated partial update.
    Update(&'a IdentityPatch),
    /// Ordinary authenticated request.
    Request,
}

pub fn project_token(token: Token, trigger: Trigger<'_>) -> Token {
    match trigger {
        Trigger::SignIn(identity) => Token::from(identity),
        Trigger::Update(patch) => Token {
            username: patch.username.clone().or(token.username),
            is_verified: patch.is_verified.unwrap_or(token.is_verified),
            ..token
        },
        Trigger::Request => token,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub username: Option<String>,
    pub user_id: Uuid,
    pub email: String,
    pub is_verified: bool,
    pub profile_pic_src: String,
    pub streak_id: Option<Uuid>,
}

impl SessionUser {
    fn apply(&mut self, patch: &IdentityPatch) {
        if let Some(username) = &patch.username {
            self.username = Some(username.clone());
        }
        if let Some(is_verified) = patch.is_verified {
            self.is_verified = is_verified;
        }
    }
}

impl From<&Token> for SessionUser {
    fn from(token: &Token) -> Self {
        Self {
            username: token.username.clone(),
            user_id: token.user_id,
            email: token.email.clone(),
            is_verified: token.is_verified,
            profile_pic_src: token.profile_pic_src.clone(),
            streak_id: token.streak_id,
        }
    }
}

/// Client-facing view of the current token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user: SessionUser,
    #[serde(with = "time::serde::rfc3339")]
    pub expires: OffsetDateTime,
}

impl Session {
    pub fn from_token(token: &Token, expires: OffsetDateTime) -> Self {
        Self {
            user: SessionUser::from(token),
            expires,
        }
    }
}

/// Rebuilds the session from `token`. A patch is merged first, then every
/// field is overwritten from the token, so the result never diverges from it.
pub fn project_session(session: Session, token: &Token, patch: Option<&IdentityPatch>) -> Session {
    let mut user = session.user;
    if let Some(patch) = patch {
        user.apply(patch);
    }

    user.username = token.username.clone();
    user.user_id = token.user_id;
    user.email = token.email.clone();
    user.is_verified = token.is_verified;
    user.profile_pic_src = token.profile_pic_src.clone();
    user.streak_id = token.streak_id;

    Session {
        user,
        expires: session.expires,
    }
}
