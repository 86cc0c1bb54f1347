use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::posts::repo_types::{PostRecord, StreakType};

#[derive(Debug, Clone, Deserialize)]
pub struct MediaRef {
    pub url: String,
    pub content_type: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePostRequest {
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub media: Vec<MediaRef>,
    #[serde(default)]
    pub streak_type: Option<StreakType>,
    #[serde(default)]
    pub post_on_twitter: bool,
}

#[derive(Debug, Serialize)]
pub struct MediaItem {
    pub url: String,
    pub content_type: String,
}

#[derive(Debug, Serialize)]
pub struct PostResponse {
    pub id: Uuid,
    pub caption: Option<String>,
    pub streak_type: Option<String>,
    pub streak_days: Option<u32>,
    pub post_on_twitter: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub media: Vec<MediaItem>,
}

impl From<PostRecord> for PostResponse {
    fn from(r: PostRecord) -> Self {
        Self {
            id: r.post.id,
            caption: r.post.caption,
            streak_days: r
                .post
                .streak_type
                .as_deref()
                .and_then(StreakType::parse)
                .map(StreakType::days),
            streak_type: r.post.streak_type,
            post_on_twitter: r.post.post_on_twitter,
            created_at: r.post.created_at,
            media: r
                .media
                .into_iter()
                .map(|m| MediaItem {
                    url: m.url,
                    content_type: m.content_type,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}
fn default_limit() -> i64 {
    20
}
