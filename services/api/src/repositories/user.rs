//! User repository for database operations

use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{PublicUser, User, UserRole};

/// User repository
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new user with an already-hashed password
    pub async fn create(
        &self,
        email: &str,
        name: &str,
        password_hash: &str,
    ) -> sqlx::Result<User> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password_hash, name)
            VALUES ($1, $2, $3)
            RETURNING id, email, password_hash, name, avatar_url, role, created_at, updated_at
            "#,
        )
        .bind(email)
        .bind(password_hash)
        .bind(name)
        .fetch_one(&self.pool)
        .await
    }

    /// Find a user by email
    pub async fn find_by_email(&self, email: &str) -> sqlx::Result<Option<User>> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, name, avatar_url, role, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
    }

    /// Find a user by ID
    pub async fn find_by_id(&self, id: Uuid) -> sqlx::Result<Option<User>> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, name, avatar_url, role, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Count the events a user has organized and the events they attend
    /// (APPROVED attendances only)
    pub async fn event_counts(&self, user_id: Uuid) -> sqlx::Result<(i64, i64)> {
        sqlx::query_as::<_, (i64, i64)>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM events WHERE organizer_id = $1),
                (SELECT COUNT(*) FROM attendances WHERE user_id = $1 AND status = 'APPROVED')
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
    }

    /// List all users without their password hashes, admin use only
    pub async fn list_all(&self) -> sqlx::Result<Vec<PublicUser>> {
        sqlx::query_as::<_, PublicUser>(
            r#"
            SELECT id, email, name, avatar_url, role
            FROM users
            ORDER BY created_at
            "#,
        )
        .fetch_all(&self.pool)
        .await
    }

    /// Change a user's role
    pub async fn update_role(&self, id: Uuid, role: UserRole) -> sqlx::Result<PublicUser> {
        sqlx::query_as::<_, PublicUser>(
            r#"
            UPDATE users
            SET role = $2, updated_at = now()
            WHERE id = $1
            RETURNING id, email, name, avatar_url, role
            "#,
        )
        .bind(id)
        .bind(role)
        .fetch_one(&self.pool)
        .await
    }
}
