//! Message repository for database operations

use sqlx::PgPool;
use uuid::Uuid;

use crate::models::MessageWithAuthor;

/// Message repository
#[derive(Clone)]
pub struct MessageRepository {
    pool: PgPool,
}

impl MessageRepository {
    /// Create a new message repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Up to `limit` messages for an event, newest first, optionally only
    /// those older than the `before` cursor (insertion order)
    pub async fn list(
        &self,
        event_id: Uuid,
        limit: i64,
        before: Option<Uuid>,
    ) -> sqlx::Result<Vec<MessageWithAuthor>> {
        sqlx::query_as::<_, MessageWithAuthor>(
            r#"
            SELECT m.id, m.event_id, m.user_id, u.name AS user_name,
                   u.avatar_url AS user_avatar_url, m.content, m.image_url, m.created_at
            FROM messages m JOIN users u ON u.id = m.user_id
            WHERE m.event_id = $1
              AND ($3::uuid IS NULL OR (m.created_at, m.id) <
                   (SELECT created_at, id FROM messages WHERE id = $3))
            ORDER BY m.created_at DESC, m.id DESC
            LIMIT $2
            "#,
        )
        .bind(event_id)
        .bind(limit)
        .bind(before)
        .fetch_all(&self.pool)
        .await
    }

    /// Persist a message and return it joined with its author
    pub async fn create(
        &self,
        user_id: Uuid,
        event_id: Uuid,
        content: &str,
        image_url: Option<&str>,
    ) -> sqlx::Result<MessageWithAuthor> {
        sqlx::query_as::<_, MessageWithAuthor>(
            r#"
            WITH m AS (
                INSERT INTO messages (user_id, event_id, content, image_url)
                VALUES ($1, $2, $3, $4)
                RETURNING *
            )
            SELECT m.id, m.event_id, m.user_id, u.name AS user_name,
                   u.avatar_url AS user_avatar_url, m.content, m.image_url, m.created_at
            FROM m JOIN users u ON u.id = m.user_id
            "#,
        )
        .bind(user_id)
        .bind(event_id)
        .bind(content)
        .bind(image_url)
        .fetch_one(&self.pool)
        .await
    }
}
