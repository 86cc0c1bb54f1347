use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use rand::Rng;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::MailConfig;

pub const CODE_MIN: i32 = 100_000;
pub const CODE_MAX: i32 = 999_999;
/// Wrong guesses allowed against one code before it stops being accepted.
pub const MAX_ATTEMPTS: i32 = 5;
/// Minimum gap between two codes sent to the same account.
pub const RESEND_COOLDOWN: time::Duration = time::Duration::seconds(60);

/// Six-digit verification code, uniform over `CODE_MIN..=CODE_MAX`.
pub fn generate_code() -> i32 {
    generate_code_with(&mut rand::thread_rng())
}

pub fn generate_code_with<R: Rng + ?Sized>(rng: &mut R) -> i32 {
    rng.gen_range(CODE_MIN..=CODE_MAX)
}

/// Delivers verification codes to new credential accounts.
#[async_trait]
pub trait VerificationMailer: Send + Sync {
    async fn send_verification(&self, email: &str, code: i32) -> anyhow::Result<()>;
}

/// Body accepted by the mail API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationMessage {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub text: String,
}

impl VerificationMessage {
    pub fn new(from: &str, to: &str, code: i32) -> Self {
        Self {
            from: from.to_string(),
            to: vec![to.to_string()],
            subject: "Your streakpost verification code".into(),
            text: format!(
                "Your verification code is {code}.\n\n\
                 Enter it in the app to verify your email. \
                 If you did not sign up, ignore this message."
            ),
        }
    }
}

/// Sends verification codes through an HTTP mail API.
#[derive(Clone)]
pub struct HttpMailer {
    client: reqwest::Client,
    config: MailConfig,
}

impl HttpMailer {
    pub fn new(config: MailConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("build mail client")?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl VerificationMailer for HttpMailer {
    async fn send_verification(&self, email: &str, code: i32) -> anyhow::Result<()> {
        let message = VerificationMessage::new(&self.config.from, email, code);
        let resp = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(&self.config.api_key)
            .json(&message)
            .send()
            .await
            .context("send verification mail")?;
        if !resp.status().is_success() {
            anyhow::bail!("mail api returned HTTP {}", resp.status());
        }
        debug!(%email, "verification mail accepted");
        Ok(())
    }
}

/// Development fallback when no mail API is configured. Writes the dispatch
/// to the log instead of sending mail. The code itself is not logged.
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

#[async_trait]
impl VerificationMailer for LogMailer {
    async fn send_verification(&self, email: &str, _code: i32) -> anyhow::Result<()> {
        info!(%email, "verification mail dispatched");
        Ok(())
    }
}
