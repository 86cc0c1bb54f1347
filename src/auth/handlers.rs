use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use time::OffsetDateTime;
use tracing::{info, instrument};

use crate::{
    auth::{
        dto::{CredentialsRequest, OAuthSignInRequest, PublicUser, SessionResponse, VerifyRequest},
        extractors::{AuthSession, OAuthBridge},
        jwt::{expires_at, JwtKeys},
        services::{
            authorize_credentials, reconcile_oauth_profile, reconcile_patch,
            resend_verification_code, verify_email_code,
        },
        session::{project_session, project_token, Identity, IdentityPatch, Session, Token, Trigger},
    },
    error::ApiError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/credentials", post(sign_in_credentials))
        .route("/auth/oauth/google", post(sign_in_google))
        .route("/auth/session", get(get_session).patch(update_session))
        .route("/auth/verify", post(verify_email))
        .route("/auth/verify/resend", post(resend_code))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

/// Signs `token` and projects the session the client gets back.
///
/// `seen` is the session the client held before this call; when absent the
/// session starts from the token itself.
fn respond(
    keys: &JwtKeys,
    token: Token,
    seen: Option<Session>,
    patch: Option<&IdentityPatch>,
) -> Result<Json<SessionResponse>, ApiError> {
    let signed = keys.sign(&token)?;
    let base = seen.unwrap_or_else(|| Session::from_token(&token, signed.expires_at));
    let session = project_session(
        Session {
            expires: signed.expires_at,
            ..base
        },
        &token,
        patch,
    );
    Ok(Json(SessionResponse {
        token: signed.jwt,
        expires_at: signed.expires_at,
        session,
    }))
}

fn signed_in_token(previous: Option<AuthSession>, identity: &Identity) -> Token {
    match previous {
        Some(AuthSession(claims)) => project_token(claims.token, Trigger::SignIn(identity)),
        None => Token::from(identity),
    }
}

#[instrument(skip_all)]
pub async fn sign_in_credentials(
    State(state): State<AppState>,
    previous: Option<AuthSession>,
    Json(payload): Json<CredentialsRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    let identity = authorize_credentials(
        state.users.as_ref(),
        state.mailer.as_ref(),
        &state.config.avatars,
        payload,
    )
    .await
    .ok_or(ApiError::NotAuthenticated)?;

    let token = signed_in_token(previous, &identity);
    respond(&JwtKeys::from_ref(&state), token, None, None)
}

/// Only the OAuth bridge may call this; it vouches for the posted profile.
#[instrument(skip_all)]
pub async fn sign_in_google(
    State(state): State<AppState>,
    _bridge: OAuthBridge,
    previous: Option<AuthSession>,
    Json(payload): Json<OAuthSignInRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    let identity =
        reconcile_oauth_profile(state.users.as_ref(), &state.config.avatars, payload.profile)
            .await
            .ok_or(ApiError::NotAuthenticated)?;

    let token = signed_in_token(previous, &identity);
    respond(&JwtKeys::from_ref(&state), token, None, None)
}

/// Re-signs the current token with a fresh expiry.
#[instrument(skip_all, fields(user_id = %claims.sub))]
pub async fn get_session(
    State(state): State<AppState>,
    AuthSession(claims): AuthSession,
) -> Result<Json<SessionResponse>, ApiError> {
    let seen = Session::from_token(&claims.token, expires_at(&claims));
    let token = project_token(claims.token, Trigger::Request);
    respond(&JwtKeys::from_ref(&state), token, Some(seen), None)
}

/// Update trigger: merges a partial identity patch into the token.
#[instrument(skip_all, fields(user_id = %claims.sub))]
pub async fn update_session(
    State(state): State<AppState>,
    AuthSession(claims): AuthSession,
    Json(patch): Json<IdentityPatch>,
) -> Result<Json<SessionResponse>, ApiError> {
    let seen = Session::from_token(&claims.token, expires_at(&claims));
    if patch.is_empty() {
        let token = project_token(claims.token, Trigger::Request);
        return respond(&JwtKeys::from_ref(&state), token, Some(seen), None);
    }

    let patch = reconcile_patch(state.users.as_ref(), claims.sub, patch).await?;
    let token = project_token(claims.token, Trigger::Update(&patch));
    info!(
        username_changed = patch.username.is_some(),
        "session updated"
    );
    respond(&JwtKeys::from_ref(&state), token, Some(seen), Some(&patch))
}

#[instrument(skip_all, fields(user_id = %claims.sub))]
pub async fn verify_email(
    State(state): State<AppState>,
    AuthSession(claims): AuthSession,
    Json(payload): Json<VerifyRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    let user = verify_email_code(state.users.as_ref(), claims.sub, payload.code).await?;

    let patch = IdentityPatch {
        username: None,
        is_verified: Some(user.is_verified),
    };
    let seen = Session::from_token(&claims.token, expires_at(&claims));
    let token = project_token(claims.token, Trigger::Update(&patch));
    respond(&JwtKeys::from_ref(&state), token, Some(seen), Some(&patch))
}

#[instrument(skip_all, fields(user_id = %claims.sub))]
pub async fn resend_code(
    State(state): State<AppState>,
    AuthSession(claims): AuthSession,
) -> Result<StatusCode, ApiError> {
    resend_verification_code(
        state.users.as_ref(),
        state.mailer.as_ref(),
        claims.sub,
        OffsetDateTime::now_utc(),
    )
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip_all, fields(user_id = %claims.sub))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthSession(claims): AuthSession,
) -> Result<Json<PublicUser>, ApiError> {
    let user = state
        .users
        .find_by_id(claims.sub)
        .await?
        .ok_or(ApiError::InvalidSession)?;
    Ok(Json(PublicUser::from(user)))
}
