use anyhow::Context;
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::posts::repo_types::{NewMedia, NewPost, Post, PostMedia, PostRecord};

#[async_trait]
pub trait PostStore: Send + Sync {
    /// Writes the post and all of its media, or nothing.
    async fn create(&self, new_post: NewPost) -> anyhow::Result<PostRecord>;
    /// Newest first.
    async fn list_by_user(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<PostRecord>>;
}

#[derive(Clone)]
pub struct PgPostStore {
    db: PgPool,
}

impl PgPostStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

async fn insert_media_tx(
    tx: &mut Transaction<'_, Postgres>,
    post_id: Uuid,
    position: i32,
    media: &NewMedia,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO post_media (post_id, position, url, content_type)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(post_id)
    .bind(position)
    .bind(&media.url)
    .bind(&media.content_type)
    .execute(&mut **tx)
    .await
    .context("insert post media")?;

    Ok(())
}

#[async_trait]
impl PostStore for PgPostStore {
    async fn create(&self, new_post: NewPost) -> anyhow::Result<PostRecord> {
        let mut tx = self.db.begin().await.context("begin tx")?;

        let post = sqlx::query_as::<_, Post>(
            r#"
            INSERT INTO posts (user_id, caption, streak_type, post_on_twitter)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, caption, streak_type, post_on_twitter, created_at
            "#,
        )
        .bind(new_post.user_id)
        .bind(&new_post.caption)
        .bind(new_post.streak_type.map(|s| s.as_str()))
        .bind(new_post.post_on_twitter)
        .fetch_one(&mut *tx)
        .await
        .context("insert post")?;

        let mut media = Vec::with_capacity(new_post.media.len());
        for (i, m) in new_post.media.iter().enumerate() {
            let position = i as i32;
            insert_media_tx(&mut tx, post.id, position, m).await?;
            media.push(PostMedia {
                post_id: post.id,
                position,
                url: m.url.clone(),
                content_type: m.content_type.clone(),
            });
        }

        tx.commit().await.context("commit tx")?;
        Ok(PostRecord { post, media })
    }

    async fn list_by_user(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<PostRecord>> {
        let posts = sqlx::query_as::<_, Post>(
            r#"
            SELECT id, user_id, caption, streak_type, post_on_twitter, created_at
              FROM posts
             WHERE user_id = $1
             ORDER BY created_at DESC
             LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await
        .context("list posts by user")?;

        let ids: Vec<Uuid> = posts.iter().map(|p| p.id).collect();
        let media = sqlx::query_as::<_, PostMedia>(
            r#"
            SELECT post_id, position, url, content_type
              FROM post_media
             WHERE post_id = ANY($1)
             ORDER BY post_id, position ASC
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.db)
        .await
        .context("list media for posts")?;

        Ok(posts
            .into_iter()
            .map(|post| {
                let media = media
                    .iter()
                    .filter(|m| m.post_id == post.id)
                    .cloned()
                    .collect();
                PostRecord { post, media }
            })
            .collect())
    }
}
