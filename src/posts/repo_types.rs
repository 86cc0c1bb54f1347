use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Length of the streak a post starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreakType {
    Days10,
    Days30,
    Days60,
    Days100,
}

impl StreakType {
    pub fn as_str(self) -> &'static str {
        match self {
            StreakType::Days10 => "days10",
            StreakType::Days30 => "days30",
            StreakType::Days60 => "days60",
            StreakType::Days100 => "days100",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "days10" => Some(StreakType::Days10),
            "days30" => Some(StreakType::Days30),
            "days60" => Some(StreakType::Days60),
            "days100" => Some(StreakType::Days100),
            _ => None,
        }
    }

    pub fn days(self) -> u32 {
        match self {
            StreakType::Days10 => 10,
            StreakType::Days30 => 30,
            StreakType::Days60 => 60,
            StreakType::Days100 => 100,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Post {
    pub id: Uuid,
    pub user_id: Uuid,
    pub caption: Option<String>,
    pub streak_type: Option<String>,
    pub post_on_twitter: bool, // share requested; delivery happens elsewhere
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PostMedia {
    pub post_id: Uuid,
    pub position: i32,
    pub url: String,
    pub content_type: String,
}

/// A post with its media in display order.
#[derive(Debug, Clone)]
pub struct PostRecord {
    pub post: Post,
    pub media: Vec<PostMedia>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMedia {
    pub url: String,
    pub content_type: String,
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub user_id: Uuid,
    pub caption: Option<String>,
    pub streak_type: Option<StreakType>,
    pub post_on_twitter: bool,
    pub media: Vec<NewMedia>,
}
