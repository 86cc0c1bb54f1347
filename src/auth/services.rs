use lazy_static::lazy_static;
use regex::Regex;
use time::OffsetDateTime;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::{
    auth::{
        dto::{Credentials, CredentialsRequest, OAuthProfile},
        password::{hash_password, verify_password},
        repo::UserStore,
        repo_types::{NewUser, User},
        session::{Identity, IdentityPatch},
        verification::{generate_code, VerificationMailer, MAX_ATTEMPTS, RESEND_COOLDOWN},
    },
    config::AvatarConfig,
    error::ApiError,
};

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    static ref USERNAME_RE: Regex = Regex::new(r"^[A-Za-z0-9_]{3,32}$").unwrap();
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl Credentials {
    /// `None` when either field is missing, blank, or the email is malformed.
    pub fn from_request(req: CredentialsRequest) -> Option<Self> {
        let email = normalize_email(req.email.as_deref()?);
        let password = req.password?;
        if email.is_empty() || password.is_empty() || !is_valid_email(&email) {
            return None;
        }
        Some(Self { email, password })
    }
}

/// Signs in with email and password, provisioning an unverified account
/// when the email is unknown.
///
/// Every failure, including store and hashing errors, comes back as `None`.
pub async fn authorize_credentials(
    users: &dyn UserStore,
    mailer: &dyn VerificationMailer,
    avatars: &AvatarConfig,
    request: CredentialsRequest,
) -> Option<Identity> {
    let Some(creds) = Credentials::from_request(request) else {
        debug!("credentials missing or malformed");
        return None;
    };

    match authorize_inner(users, mailer, avatars, &creds).await {
        Ok(identity) => identity,
        Err(e) => {
            error!(error = ?e, email = %creds.email, "error during credentials authorization");
            None
        }
    }
}

async fn authorize_inner(
    users: &dyn UserStore,
    mailer: &dyn VerificationMailer,
    avatars: &AvatarConfig,
    creds: &Credentials,
) -> anyhow::Result<Option<Identity>> {
    if let Some(user) = users.find_by_email(&creds.email).await? {
        let Some(hash) = user.password_hash.as_deref() else {
            warn!(user_id = %user.id, "password sign-in for provider-only account");
            return Ok(None);
        };
        if !verify_password(&creds.password, hash)? {
            warn!(user_id = %user.id, "invalid password");
            return Ok(None);
        }
        info!(user_id = %user.id, "user signed in with credentials");
        return Ok(Some(Identity::from(&user)));
    }

    let hash = hash_password(&creds.password)?;
    let code = generate_code();
    let user = users
        .create(NewUser {
            email: creds.email.clone(),
            password_hash: Some(hash),
            is_verified: false,
            profile_pic_src: avatars.credentials_default.clone(),
            verification_code: Some(code),
            verification_sent_at: Some(OffsetDateTime::now_utc()),
        })
        .await?;
    info!(user_id = %user.id, "user registered with credentials");

    // The account exists at this point; a lost mail is recoverable.
    if let Err(e) = mailer.send_verification(&user.email, code).await {
        warn!(error = ?e, user_id = %user.id, "verification mail dispatch failed");
    }

    Ok(Some(Identity::from(&user)))
}

/// Maps a provider profile onto a local account, creating a verified one on
/// first sign-in. `None` denies the sign-in.
pub async fn reconcile_oauth_profile(
    users: &dyn UserStore,
    avatars: &AvatarConfig,
    profile: Option<OAuthProfile>,
) -> Option<Identity> {
    let Some(profile) = profile else {
        warn!("oauth sign-in without profile");
        return None;
    };
    let Some(email) = profile
        .email
        .as_deref()
        .map(normalize_email)
        .filter(|e| !e.is_empty())
    else {
        warn!("oauth profile has no email");
        return None;
    };

    match reconcile_inner(users, avatars, &email).await {
        Ok(identity) => Some(identity),
        Err(e) => {
            error!(error = ?e, %email, "error in oauth sign-in");
            None
        }
    }
}

async fn reconcile_inner(
    users: &dyn UserStore,
    avatars: &AvatarConfig,
    email: &str,
) -> anyhow::Result<Identity> {
    if let Some(user) = users.find_by_email(email).await? {
        info!(user_id = %user.id, "user signed in with oauth");
        return Ok(Identity::from(&user));
    }

    let user = users
        .create(NewUser {
            email: email.to_string(),
            password_hash: None,
            is_verified: true,
            profile_pic_src: avatars.oauth_default.clone(),
            verification_code: None,
            verification_sent_at: None,
        })
        .await?;
    info!(user_id = %user.id, "user registered with oauth");
    Ok(Identity::from(&user))
}

fn attempts_exhausted() -> ApiError {
    ApiError::TooManyRequests("Too many attempts. Request a new code.".into())
}

/// Checks `code` against the stored one and marks the account verified.
///
/// After `MAX_ATTEMPTS` wrong guesses the code stops being accepted, even
/// the right one, until `resend_verification_code` issues a new one.
pub async fn verify_email_code(
    users: &dyn UserStore,
    user_id: Uuid,
    code: i32,
) -> Result<User, ApiError> {
    let user = users
        .find_by_id(user_id)
        .await?
        .ok_or(ApiError::InvalidSession)?;

    if user.is_verified {
        return Ok(user);
    }
    if user.verification_attempts >= MAX_ATTEMPTS {
        warn!(%user_id, "verification locked until a new code is issued");
        return Err(attempts_exhausted());
    }
    if user.verification_code != Some(code) {
        let attempts = users.record_failed_verification(user_id).await?;
        warn!(%user_id, attempts, "wrong verification code");
        if attempts >= MAX_ATTEMPTS {
            return Err(attempts_exhausted());
        }
        return Err(ApiError::BadRequest("Invalid verification code".into()));
    }

    let user = users.mark_verified(user_id).await?;
    info!(%user_id, "email verified");
    Ok(user)
}

/// Issues a fresh code and mails it. Resets the attempt counter; at most
/// one code per `RESEND_COOLDOWN`.
pub async fn resend_verification_code(
    users: &dyn UserStore,
    mailer: &dyn VerificationMailer,
    user_id: Uuid,
    now: OffsetDateTime,
) -> Result<(), ApiError> {
    let user = users
        .find_by_id(user_id)
        .await?
        .ok_or(ApiError::InvalidSession)?;

    if user.is_verified {
        return Err(ApiError::BadRequest("Email already verified".into()));
    }
    if let Some(sent_at) = user.verification_sent_at {
        if now < sent_at + RESEND_COOLDOWN {
            return Err(ApiError::TooManyRequests(
                "Wait a minute before requesting another code.".into(),
            ));
        }
    }

    let code = generate_code();
    let user = users.replace_verification_code(user_id, code, now).await?;
    mailer.send_verification(&user.email, code).await?;
    info!(%user_id, "verification code reissued");
    Ok(())
}

pub fn normalize_username(raw: &str) -> Result<String, ApiError> {
    let username = raw.trim();
    if !USERNAME_RE.is_match(username) {
        return Err(ApiError::BadRequest(
            "Username must be 3-32 letters, digits or underscores".into(),
        ));
    }
    Ok(username.to_string())
}

/// Turns a client patch into one that agrees with the stored record.
///
/// A username is validated and persisted first. A verification flag is
/// replaced by the stored value; only the code check can change it.
pub async fn reconcile_patch(
    users: &dyn UserStore,
    user_id: Uuid,
    patch: IdentityPatch,
) -> Result<IdentityPatch, ApiError> {
    let mut user = users
        .find_by_id(user_id)
        .await?
        .ok_or(ApiError::InvalidSession)?;

    let username = match patch.username.as_deref() {
        Some(raw) => {
            let username = normalize_username(raw)?;
            user = users
                .set_username(user_id, &username)
                .await?
                .ok_or_else(|| ApiError::Conflict("Username already taken".into()))?;
            Some(username)
        }
        None => None,
    };

    let is_verified = match patch.is_verified {
        Some(requested) if requested != user.is_verified => {
            warn!(%user_id, requested, stored = user.is_verified, "client verification flag ignored");
            Some(user.is_verified)
        }
        other => other,
    };

    Ok(IdentityPatch {
        username,
        is_verified,
    })
}
