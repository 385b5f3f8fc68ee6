//! Event repository for database operations

use std::collections::HashMap;

use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{CreateEventRequest, Event, EventStatus, EventWithOrganizer, UpdateEventRequest};

/// Columns of the event-with-organizer projection
const EVENT_WITH_ORGANIZER_COLUMNS: &str = r#"
    e.id, e.title, e.description, e.latitude, e.longitude, e.city, e.state,
    e.address, e.start_time, e.end_time, e.attendee_limit, e.status,
    e.organizer_id, e.created_at, e.updated_at,
    u.name AS organizer_name, u.avatar_url AS organizer_avatar_url
"#;

/// Event repository
#[derive(Clone)]
pub struct EventRepository {
    pool: PgPool,
}

impl EventRepository {
    /// Create a new event repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new event; the caller becomes its organizer
    pub async fn create(
        &self,
        organizer_id: Uuid,
        req: &CreateEventRequest,
    ) -> sqlx::Result<EventWithOrganizer> {
        let sql = format!(
            r#"
            WITH e AS (
                INSERT INTO events
                    (title, description, latitude, longitude, city, state, address,
                     start_time, end_time, attendee_limit, organizer_id)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
                RETURNING *
            )
            SELECT {EVENT_WITH_ORGANIZER_COLUMNS}
            FROM e JOIN users u ON u.id = e.organizer_id
            "#
        );

        sqlx::query_as::<_, EventWithOrganizer>(&sql)
            .bind(&req.title)
            .bind(&req.description)
            .bind(req.location.lat)
            .bind(req.location.lng)
            .bind(&req.city)
            .bind(&req.state)
            .bind(&req.address)
            .bind(req.start_time)
            .bind(req.end_time)
            .bind(req.attendee_limit)
            .bind(organizer_id)
            .fetch_one(&self.pool)
            .await
    }

    /// Find an event by ID
    pub async fn find_by_id(&self, id: Uuid) -> sqlx::Result<Option<Event>> {
        sqlx::query_as::<_, Event>("SELECT * FROM events WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    /// Find an event by ID, joined with its organizer
    pub async fn find_with_organizer(&self, id: Uuid) -> sqlx::Result<Option<EventWithOrganizer>> {
        let sql = format!(
            r#"
            SELECT {EVENT_WITH_ORGANIZER_COLUMNS}
            FROM events e JOIN users u ON u.id = e.organizer_id
            WHERE e.id = $1
            "#
        );

        sqlx::query_as::<_, EventWithOrganizer>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    /// List events in a status, soonest first
    ///
    /// `limit` is skipped when the caller still has to geo-filter the result.
    pub async fn list_by_status(
        &self,
        status: EventStatus,
        limit: Option<i64>,
    ) -> sqlx::Result<Vec<EventWithOrganizer>> {
        let sql = format!(
            r#"
            SELECT {EVENT_WITH_ORGANIZER_COLUMNS}
            FROM events e JOIN users u ON u.id = e.organizer_id
            WHERE e.status = $1
            ORDER BY e.start_time
            LIMIT $2
            "#
        );

        sqlx::query_as::<_, EventWithOrganizer>(&sql)
            .bind(status)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
    }

    /// Count APPROVED attendances for a batch of events in one query
    pub async fn approved_counts(&self, event_ids: &[Uuid]) -> sqlx::Result<HashMap<Uuid, i64>> {
        let rows = sqlx::query_as::<_, (Uuid, i64)>(
            r#"
            SELECT event_id, COUNT(*)
            FROM attendances
            WHERE event_id = ANY($1) AND status = 'APPROVED'
            GROUP BY event_id
            "#,
        )
        .bind(event_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().collect())
    }

    /// Collect up to `cap` APPROVED pudding photos per event, one query for
    /// the whole batch
    pub async fn approved_photos(
        &self,
        event_ids: &[Uuid],
        cap: usize,
    ) -> sqlx::Result<HashMap<Uuid, Vec<String>>> {
        let rows = sqlx::query_as::<_, (Uuid, String)>(
            r#"
            SELECT event_id, pudding_photo
            FROM attendances
            WHERE event_id = ANY($1) AND status = 'APPROVED'
            ORDER BY joined_at
            "#,
        )
        .bind(event_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut photos: HashMap<Uuid, Vec<String>> = HashMap::new();
        for (event_id, photo) in rows {
            let entry = photos.entry(event_id).or_default();
            if entry.len() < cap {
                entry.push(photo);
            }
        }

        Ok(photos)
    }

    /// Apply a partial update; absent fields keep their current value
    pub async fn update(
        &self,
        id: Uuid,
        req: &UpdateEventRequest,
    ) -> sqlx::Result<EventWithOrganizer> {
        let sql = format!(
            r#"
            WITH e AS (
                UPDATE events SET
                    title = COALESCE($2, title),
                    description = COALESCE($3, description),
                    latitude = COALESCE($4, latitude),
                    longitude = COALESCE($5, longitude),
                    city = COALESCE($6, city),
                    state = COALESCE($7, state),
                    address = COALESCE($8, address),
                    start_time = COALESCE($9, start_time),
                    end_time = COALESCE($10, end_time),
                    attendee_limit = COALESCE($11, attendee_limit),
                    updated_at = now()
                WHERE id = $1
                RETURNING *
            )
            SELECT {EVENT_WITH_ORGANIZER_COLUMNS}
            FROM e JOIN users u ON u.id = e.organizer_id
            "#
        );

        sqlx::query_as::<_, EventWithOrganizer>(&sql)
            .bind(id)
            .bind(&req.title)
            .bind(&req.description)
            .bind(req.location.map(|p| p.lat))
            .bind(req.location.map(|p| p.lng))
            .bind(&req.city)
            .bind(&req.state)
            .bind(&req.address)
            .bind(req.start_time)
            .bind(req.end_time)
            .bind(req.attendee_limit)
            .fetch_one(&self.pool)
            .await
    }

    /// Move an event to a new lifecycle status
    pub async fn set_status(&self, id: Uuid, status: EventStatus) -> sqlx::Result<u64> {
        let result = sqlx::query("UPDATE events SET status = $2, updated_at = now() WHERE id = $1")
            .bind(id)
            .bind(status)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Advance time-driven statuses: UPCOMING events that have started become
    /// ONGOING, ONGOING events past their end become ENDED. Returns the
    /// number of rows each pass touched.
    pub async fn sweep_statuses(&self) -> sqlx::Result<(u64, u64)> {
        let started = sqlx::query(
            r#"
            UPDATE events SET status = 'ONGOING', updated_at = now()
            WHERE status = 'UPCOMING' AND start_time <= now()
            "#,
        )
        .execute(&self.pool)
        .await?
        .rows_affected();

        let ended = sqlx::query(
            r#"
            UPDATE events SET status = 'ENDED', updated_at = now()
            WHERE status = 'ONGOING' AND end_time <= now()
            "#,
        )
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok((started, ended))
    }
}
