use std::sync::Arc;

use sqlx::PgPool;
use tracing::warn;

use crate::{
    auth::{
        repo::{PgUserStore, UserStore},
        verification::{HttpMailer, LogMailer, VerificationMailer},
    },
    config::AppConfig,
    posts::repo::{PgPostStore, PostStore},
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: Arc<dyn UserStore>,
    pub posts: Arc<dyn PostStore>,
    pub mailer: Arc<dyn VerificationMailer>,
}

impl AppState {
    /// Postgres-backed state. Verification mail goes to the mail API when
    /// one is configured, otherwise to the log.
    pub fn from_pool(db: PgPool, config: Arc<AppConfig>) -> anyhow::Result<Self> {
        let mailer: Arc<dyn VerificationMailer> = match &config.mail {
            Some(mail) => Arc::new(HttpMailer::new(mail.clone())?),
            None => {
                warn!("MAIL_API_URL not set; verification codes are only logged");
                Arc::new(LogMailer)
            }
        };
        if config.oauth_bridge_secret.is_none() {
            warn!("OAUTH_BRIDGE_SECRET not set; OAuth sign-in is disabled");
        }
        Ok(Self::from_parts(
            config,
            Arc::new(PgUserStore::new(db.clone())),
            Arc::new(PgPostStore::new(db)),
            mailer,
        ))
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        users: Arc<dyn UserStore>,
        posts: Arc<dyn PostStore>,
        mailer: Arc<dyn VerificationMailer>,
    ) -> Self {
        Self {
            config,
            users,
            posts,
            mailer,
        }
    }

    #[cfg(test)]
    pub fn fake() -> Self {
        crate::testing::Fakes::default().state()
    }
}
