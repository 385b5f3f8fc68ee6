//! Attendance repository for database operations
//!
//! The join path is the one concurrency-sensitive spot in the system: the
//! capacity check and the insert run inside a single transaction that locks
//! the event row, so concurrent joins cannot overshoot the attendee limit.
//! The unique (user_id, event_id) index backstops duplicate joins.

use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Attendance, AttendanceStatus, AttendanceWithUser};

/// Result of a join attempt
#[derive(Debug)]
pub enum JoinOutcome {
    Joined(Box<Attendance>),
    EventNotFound,
    EventFull,
    AlreadyJoined,
}

/// Attendance repository
#[derive(Clone)]
pub struct AttendanceRepository {
    pool: PgPool,
}

impl AttendanceRepository {
    /// Create a new attendance repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Submit a join request for an event
    ///
    /// Locks the event row for the duration of the capacity check, then
    /// inserts the PENDING attendance in the same transaction.
    pub async fn join(
        &self,
        user_id: Uuid,
        event_id: Uuid,
        pudding_photo: &str,
        pudding_name: Option<&str>,
        pudding_desc: Option<&str>,
    ) -> sqlx::Result<JoinOutcome> {
        let mut tx = self.pool.begin().await?;

        let event: Option<(i32,)> =
            sqlx::query_as("SELECT attendee_limit FROM events WHERE id = $1 FOR UPDATE")
                .bind(event_id)
                .fetch_optional(&mut *tx)
                .await?;

        let Some((attendee_limit,)) = event else {
            return Ok(JoinOutcome::EventNotFound);
        };

        let existing: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM attendances WHERE user_id = $1 AND event_id = $2")
                .bind(user_id)
                .bind(event_id)
                .fetch_optional(&mut *tx)
                .await?;

        if existing.is_some() {
            return Ok(JoinOutcome::AlreadyJoined);
        }

        let (seats_taken,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM attendances
            WHERE event_id = $1 AND status IN ('PENDING', 'APPROVED')
            "#,
        )
        .bind(event_id)
        .fetch_one(&mut *tx)
        .await?;

        if seats_taken >= i64::from(attendee_limit) {
            return Ok(JoinOutcome::EventFull);
        }

        let attendance = sqlx::query_as::<_, Attendance>(
            r#"
            INSERT INTO attendances (user_id, event_id, pudding_photo, pudding_name, pudding_desc)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, event_id, status, pudding_photo, pudding_name,
                      pudding_desc, joined_at, approved_at
            "#,
        )
        .bind(user_id)
        .bind(event_id)
        .bind(pudding_photo)
        .bind(pudding_name)
        .bind(pudding_desc)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(JoinOutcome::Joined(Box::new(attendance)))
    }

    /// Find a user's attendance for an event, if any
    pub async fn find_by_user_and_event(
        &self,
        user_id: Uuid,
        event_id: Uuid,
    ) -> sqlx::Result<Option<Attendance>> {
        sqlx::query_as::<_, Attendance>(
            r#"
            SELECT id, user_id, event_id, status, pudding_photo, pudding_name,
                   pudding_desc, joined_at, approved_at
            FROM attendances
            WHERE user_id = $1 AND event_id = $2
            "#,
        )
        .bind(user_id)
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Find an attendance by ID
    pub async fn find_by_id(&self, id: Uuid) -> sqlx::Result<Option<Attendance>> {
        sqlx::query_as::<_, Attendance>(
            r#"
            SELECT id, user_id, event_id, status, pudding_photo, pudding_name,
                   pudding_desc, joined_at, approved_at
            FROM attendances
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    /// All attendances for an event with attendee identity, newest first
    pub async fn list_with_users(&self, event_id: Uuid) -> sqlx::Result<Vec<AttendanceWithUser>> {
        sqlx::query_as::<_, AttendanceWithUser>(
            r#"
            SELECT a.id, a.user_id, u.name AS user_name, u.avatar_url AS user_avatar_url,
                   a.status, a.pudding_photo, a.pudding_name, a.pudding_desc,
                   a.joined_at, a.approved_at
            FROM attendances a JOIN users u ON u.id = a.user_id
            WHERE a.event_id = $1
            ORDER BY a.joined_at DESC
            "#,
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await
    }

    /// APPROVED attendances for an event with attendee identity
    pub async fn list_approved_with_users(
        &self,
        event_id: Uuid,
    ) -> sqlx::Result<Vec<AttendanceWithUser>> {
        sqlx::query_as::<_, AttendanceWithUser>(
            r#"
            SELECT a.id, a.user_id, u.name AS user_name, u.avatar_url AS user_avatar_url,
                   a.status, a.pudding_photo, a.pudding_name, a.pudding_desc,
                   a.joined_at, a.approved_at
            FROM attendances a JOIN users u ON u.id = a.user_id
            WHERE a.event_id = $1 AND a.status = 'APPROVED'
            ORDER BY a.joined_at
            "#,
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await
    }

    /// Record the organizer's decision; approving stamps approved_at
    pub async fn decide(
        &self,
        id: Uuid,
        status: AttendanceStatus,
    ) -> sqlx::Result<Attendance> {
        let approved = status == AttendanceStatus::Approved;

        sqlx::query_as::<_, Attendance>(
            r#"
            UPDATE attendances
            SET status = $2,
                approved_at = CASE WHEN $3 THEN now() ELSE approved_at END
            WHERE id = $1
            RETURNING id, user_id, event_id, status, pudding_photo, pudding_name,
                      pudding_desc, joined_at, approved_at
            "#,
        )
        .bind(id)
        .bind(status)
        .bind(approved)
        .fetch_one(&self.pool)
        .await
    }

    /// Mark the caller's attendance as LEFT
    ///
    /// Only pending or approved attendances can be left; anything else is a
    /// no-op and reported through the returned row count.
    pub async fn mark_left(&self, user_id: Uuid, event_id: Uuid) -> sqlx::Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE attendances SET status = 'LEFT'
            WHERE user_id = $1 AND event_id = $2 AND status IN ('PENDING', 'APPROVED')
            "#,
        )
        .bind(user_id)
        .bind(event_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Whether the user is an APPROVED attendee of the event
    pub async fn is_approved(&self, user_id: Uuid, event_id: Uuid) -> sqlx::Result<bool> {
        let (exists,): (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM attendances
                WHERE user_id = $1 AND event_id = $2 AND status = 'APPROVED'
            )
            "#,
        )
        .bind(user_id)
        .bind(event_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }
}
