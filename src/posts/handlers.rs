use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::extractors::AuthSession,
    error::ApiError,
    posts::{
        dto::{CreatePostRequest, Pagination, PostResponse},
        services::{create_post, list_posts},
    },
    state::AppState,
};

pub fn post_routes() -> Router<AppState> {
    Router::new().route("/posts", get(list_my_posts).post(create))
}

#[instrument(skip_all, fields(user_id = %claims.sub))]
pub async fn create(
    State(state): State<AppState>,
    AuthSession(claims): AuthSession,
    Json(payload): Json<CreatePostRequest>,
) -> Result<(StatusCode, Json<PostResponse>), ApiError> {
    // The stored record decides verification; the token may be stale.
    let author = state.users.find_by_id(claims.sub).await?;
    let record = create_post(state.posts.as_ref(), author.as_ref(), payload).await?;
    Ok((StatusCode::CREATED, Json(PostResponse::from(record))))
}

#[instrument(skip_all, fields(user_id = %claims.sub))]
pub async fn list_my_posts(
    State(state): State<AppState>,
    AuthSession(claims): AuthSession,
    Query(p): Query<Pagination>,
) -> Result<Json<Vec<PostResponse>>, ApiError> {
    let records = list_posts(state.posts.as_ref(), claims.sub, p.limit, p.offset).await?;
    Ok(Json(records.into_iter().map(PostResponse::from).collect()))
}
