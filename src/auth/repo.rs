use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::repo_types::{NewUser, User};

const USER_COLUMNS: &str = "id, email, username, password_hash, is_verified, profile_pic_src, \
                            verification_code, verification_attempts, verification_sent_at, \
                            streak_id, created_at";

/// Persistence for user records.
///
/// `create` must fail when the email is already taken; callers rely on that
/// to settle concurrent first-time sign-ins for the same address.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>>;
    async fn create(&self, new_user: NewUser) -> anyhow::Result<User>;
    /// Returns `Ok(None)` when the username belongs to someone else.
    async fn set_username(&self, id: Uuid, username: &str) -> anyhow::Result<Option<User>>;
    /// Marks the user verified and clears the pending code.
    async fn mark_verified(&self, id: Uuid) -> anyhow::Result<User>;
    /// Counts one wrong guess and returns the new total.
    async fn record_failed_verification(&self, id: Uuid) -> anyhow::Result<i32>;
    /// Issues `code` in place of the current one and zeroes the attempt count.
    async fn replace_verification_code(
        &self,
        id: Uuid,
        code: i32,
        sent_at: OffsetDateTime,
    ) -> anyhow::Result<User>;
}

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .context("find user by email")?;
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find user by id")?;
        Ok(user)
    }

    async fn create(&self, new_user: NewUser) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users
                (email, password_hash, is_verified, profile_pic_src, verification_code,
                 verification_sent_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .bind(new_user.is_verified)
        .bind(&new_user.profile_pic_src)
        .bind(new_user.verification_code)
        .bind(new_user.verification_sent_at)
        .fetch_one(&self.db)
        .await
        .context("insert user")?;
        Ok(user)
    }

    async fn set_username(&self, id: Uuid, username: &str) -> anyhow::Result<Option<User>> {
        let res = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET username = $2 WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(username)
        .fetch_one(&self.db)
        .await;

        match res {
            Ok(user) => Ok(Some(user)),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => Ok(None),
            Err(e) => Err(anyhow::Error::new(e).context("update username")),
        }
    }

    async fn mark_verified(&self, id: Uuid) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
               SET is_verified = TRUE, verification_code = NULL, verification_attempts = 0
             WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .fetch_one(&self.db)
        .await
        .context("mark user verified")?;
        Ok(user)
    }

    async fn record_failed_verification(&self, id: Uuid) -> anyhow::Result<i32> {
        let attempts: i32 = sqlx::query_scalar(
            r#"
            UPDATE users
               SET verification_attempts = verification_attempts + 1
             WHERE id = $1
            RETURNING verification_attempts
            "#,
        )
        .bind(id)
        .fetch_one(&self.db)
        .await
        .context("count failed verification")?;
        Ok(attempts)
    }

    async fn replace_verification_code(
        &self,
        id: Uuid,
        code: i32,
        sent_at: OffsetDateTime,
    ) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
               SET verification_code = $2, verification_attempts = 0, verification_sent_at = $3
             WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(code)
        .bind(sent_at)
        .fetch_one(&self.db)
        .await
        .context("replace verification code")?;
        Ok(user)
    }
}
