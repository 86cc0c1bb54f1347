use serde::Deserialize;

pub const DEFAULT_AVATAR_URL: &str =
    "https://res.cloudinary.com/dc8yqhawq/image/upload/v1726839243/sokwk28elnyvhtwxm4hq.jpg";
pub const DEFAULT_OAUTH_AVATAR_URL: &str =
    "https://res.cloudinary.com/dc8yqhawq/image/upload/v1728393088/pfp_qkukpx.png";

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

/// Profile pictures assigned to freshly provisioned accounts.
#[derive(Debug, Clone, Deserialize)]
pub struct AvatarConfig {
    pub credentials_default: String,
    pub oauth_default: String,
}

impl Default for AvatarConfig {
    fn default() -> Self {
        Self {
            credentials_default: DEFAULT_AVATAR_URL.into(),
            oauth_default: DEFAULT_OAUTH_AVATAR_URL.into(),
        }
    }
}

/// HTTP mail API used for verification codes. The endpoint takes a JSON
/// `{from, to, subject, text}` body with a bearer key.
#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    pub api_url: String,
    pub api_key: String,
    pub from: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub avatars: AvatarConfig,
    /// Unset means codes are only logged.
    pub mail: Option<MailConfig>,
    /// Shared with the service that performs the Google exchange. Unset
    /// means OAuth sign-in is refused.
    pub oauth_bridge_secret: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "streakpost".into()),
            audience: std::env::var("JWT_AUDIENCE")
                .unwrap_or_else(|_| "streakpost-users".into()),
            ttl_minutes: std::env::var("JWT_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .filter(|v| *v > 0)
                .unwrap_or(60 * 24 * 30),
        };
        let avatars = AvatarConfig {
            credentials_default: std::env::var("DEFAULT_AVATAR_URL")
                .unwrap_or_else(|_| DEFAULT_AVATAR_URL.into()),
            oauth_default: std::env::var("OAUTH_DEFAULT_AVATAR_URL")
                .unwrap_or_else(|_| DEFAULT_OAUTH_AVATAR_URL.into()),
        };
        let mail = match std::env::var("MAIL_API_URL") {
            Ok(api_url) => Some(MailConfig {
                api_url,
                api_key: std::env::var("MAIL_API_KEY")?,
                from: std::env::var("MAIL_FROM")?,
            }),
            Err(_) => None,
        };
        let oauth_bridge_secret = std::env::var("OAUTH_BRIDGE_SECRET")
            .ok()
            .filter(|s| !s.trim().is_empty());
        Ok(Self {
            database_url,
            jwt,
            avatars,
            mail,
            oauth_bridge_secret,
        })
    }
}
