use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String, // unique, never changed after insert
    pub username: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>, // None for provider-only accounts
    pub is_verified: bool,
    pub profile_pic_src: String,
    #[serde(skip_serializing)]
    pub verification_code: Option<i32>,
    #[serde(skip_serializing)]
    pub verification_attempts: i32, // wrong guesses against the current code
    #[serde(skip_serializing)]
    pub verification_sent_at: Option<OffsetDateTime>,
    pub streak_id: Option<Uuid>,
    pub created_at: OffsetDateTime,
}

/// Insert payload for a new user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: Option<String>,
    pub is_verified: bool,
    pub profile_pic_src: String,
    pub verification_code: Option<i32>,
    pub verification_sent_at: Option<OffsetDateTime>,
}
