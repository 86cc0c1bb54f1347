use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::{
    auth::repo_types::User,
    error::ApiError,
    posts::{
        dto::{CreatePostRequest, MediaRef},
        repo::PostStore,
        repo_types::{NewMedia, NewPost, PostRecord},
    },
};

pub const MAX_MEDIA: usize = 10;
pub const MAX_PAGE: i64 = 100;

/// Why a post was refused, in the order the checks run.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PostRejection {
    #[error("Either caption or file needed.")]
    Empty,
    #[error("Invalid session.")]
    InvalidSession,
    #[error("Verify yourself to post.")]
    Unverified,
    #[error("Every file needs a URL.")]
    MissingMediaUrl,
    #[error("Unsupported media type: {0}")]
    UnsupportedMedia(String),
    #[error("At most 10 files per post.")]
    TooManyMedia,
}

impl From<PostRejection> for ApiError {
    fn from(r: PostRejection) -> Self {
        match r {
            PostRejection::InvalidSession => ApiError::InvalidSession,
            PostRejection::Unverified => ApiError::Forbidden(r.to_string()),
            other => ApiError::BadRequest(other.to_string()),
        }
    }
}

fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        _ => None,
    }
}

/// A create request that passed every check.
#[derive(Debug, Clone)]
pub struct PostDraft {
    pub caption: Option<String>,
    pub media: Vec<NewMedia>,
}

/// Runs the pre-post checks against the author's stored record.
pub fn check_post(
    req: &CreatePostRequest,
    author: Option<&User>,
) -> Result<PostDraft, PostRejection> {
    let caption = req
        .caption
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(String::from);

    if caption.is_none() && req.media.is_empty() {
        return Err(PostRejection::Empty);
    }
    let author = author.ok_or(PostRejection::InvalidSession)?;
    if !author.is_verified {
        return Err(PostRejection::Unverified);
    }
    if req.media.len() > MAX_MEDIA {
        return Err(PostRejection::TooManyMedia);
    }

    let media = req
        .media
        .iter()
        .map(|MediaRef { url, content_type }| {
            let url = url.trim();
            if url.is_empty() {
                return Err(PostRejection::MissingMediaUrl);
            }
            let content_type = content_type.trim().to_ascii_lowercase();
            if ext_from_mime(&content_type).is_none() {
                return Err(PostRejection::UnsupportedMedia(content_type));
            }
            Ok(NewMedia {
                url: url.to_string(),
                content_type,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(PostDraft { caption, media })
}

pub async fn create_post(
    posts: &dyn PostStore,
    author: Option<&User>,
    req: CreatePostRequest,
) -> Result<PostRecord, ApiError> {
    let draft = check_post(&req, author)?;
    let user_id = author.map(|a| a.id).ok_or(ApiError::InvalidSession)?;

    let record = posts
        .create(NewPost {
            user_id,
            caption: draft.caption,
            streak_type: req.streak_type,
            post_on_twitter: req.post_on_twitter,
            media: draft.media,
        })
        .await?;
    info!(
        %user_id,
        post_id = %record.post.id,
        media = record.media.len(),
        share = record.post.post_on_twitter,
        "post created"
    );
    Ok(record)
}

pub async fn list_posts(
    posts: &dyn PostStore,
    user_id: Uuid,
    limit: i64,
    offset: i64,
) -> anyhow::Result<Vec<PostRecord>> {
    posts
        .list_by_user(user_id, limit.clamp(1, MAX_PAGE), offset.max(0))
        .await
}
