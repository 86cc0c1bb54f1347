use std::time::Duration;

use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;

use crate::{
    auth::{claims::Claims, session::Token},
    config::JwtConfig,
    state::AppState,
};

#[derive(Clone)]
pub struct JwtKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub issuer: String,
    pub audience: String,
    pub ttl: Duration,
}

/// A freshly signed token and the instant it stops being accepted.
#[derive(Debug, Clone)]
pub struct SignedToken {
    pub jwt: String,
    pub expires_at: OffsetDateTime,
}

impl From<&JwtConfig> for JwtKeys {
    fn from(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            ttl: Duration::from_secs((cfg.ttl_minutes.max(1) as u64) * 60),
        }
    }
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        JwtKeys::from(&state.config.jwt)
    }
}

impl JwtKeys {
    /// Signs `token` with a full TTL starting now.
    pub fn sign(&self, token: &Token) -> anyhow::Result<SignedToken> {
        let now = OffsetDateTime::now_utc();
        let expires_at = now + TimeDuration::seconds(self.ttl.as_secs() as i64);
        let claims = Claims {
            sub: token.user_id,
            iat: now.unix_timestamp() as usize,
            exp: expires_at.unix_timestamp() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            token: token.clone(),
        };
        let jwt = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(user_id = %token.user_id, "jwt signed");
        Ok(SignedToken { jwt, expires_at })
    }

    pub fn verify(&self, jwt: &str) -> anyhow::Result<Claims> {
        let mut validation = Validation::default();
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let data = decode::<Claims>(jwt, &self.decoding, &validation)?;
        if data.claims.sub != data.claims.token.user_id {
            anyhow::bail!("subject does not match token user");
        }
        debug!(user_id = %data.claims.sub, "jwt verified");
        Ok(data.claims)
    }
}

pub fn expires_at(claims: &Claims) -> OffsetDateTime {
    OffsetDateTime::from_unix_timestamp(claims.exp as i64).unwrap_or(OffsetDateTime::UNIX_EPOCH)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn make_keys(secret: &str, issuer: &str, audience: &str) -> JwtKeys {
        JwtKeys::from(&JwtConfig {
            secret: secret.into(),
            issuer: issuer.into(),
            audience: audience.into(),
            ttl_minutes: 5,
        })
    }

    fn token() -> Token {
        Token {
            username: None,
            user_id: Uuid::new_v4(),
            email: "a@x.com".into(),
            is_verified: false,
            profile_pic_src: "https://img.local/a.png".into(),
            streak_id: None,
        }
    }

    #[test]
    fn sign_and_verify_carries_identity() {
        let keys = make_keys("dev-secret", "test-issuer", "test-aud");
        let token = token();
        let signed = keys.sign(&token).expect("sign");
        let claims = keys.verify(&signed.jwt).expect("verify");
        assert_eq!(claims.sub, token.user_id);
        assert_eq!(claims.iss, "test-issuer");
        assert_eq!(claims.aud, "test-aud");
        assert_eq!(claims.token, token);
        assert_eq!(expires_at(&claims).unix_timestamp(), signed.expires_at.unix_timestamp());
    }

    #[test]
    fn verify_rejects_wrong_issuer_or_audience() {
        let good_keys = make_keys("same-secret", "good-iss", "good-aud");
        let bad_keys = make_keys("same-secret", "bad-iss", "bad-aud");
        let signed = good_keys.sign(&token()).expect("sign");
        assert!(bad_keys.verify(&signed.jwt).is_err());
    }

    #[test]
    fn verify_rejects_foreign_secret() {
        let ours = make_keys("ours", "iss", "aud");
        let theirs = make_keys("theirs", "iss", "aud");
        let signed = theirs.sign(&token()).expect("sign");
        assert!(ours.verify(&signed.jwt).is_err());
    }

    #[test]
    fn verify_rejects_expired_token() {
        let keys = make_keys("dev-secret", "iss", "aud");
        let token = token();
        let issued = OffsetDateTime::now_utc() - TimeDuration::hours(3);
        let claims = Claims {
            sub: token.user_id,
            iat: issued.unix_timestamp() as usize,
            exp: (issued + TimeDuration::hours(1)).unix_timestamp() as usize,
            iss: "iss".into(),
            aud: "aud".into(),
            token,
        };
        let jwt = encode(&Header::default(), &claims, &keys.encoding).unwrap();
        assert!(keys.verify(&jwt).is_err());
    }
}
