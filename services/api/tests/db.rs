//! End-to-end tests against a live PostgreSQL instance
//!
//! These exercise the paths the router tests cannot reach: the unique email
//! and (user, event) constraints, the transactional capacity check, and the
//! authorization gates that need persisted rows. Ignored by default; run
//! them with a database available:
//!
//!   DATABASE_URL=postgresql://... cargo test -p pmg-api -- --ignored

use axum::http::StatusCode;
use axum_test::TestServer;
use axum_test::multipart::{MultipartForm, Part};
use chrono::{Duration, Utc};
use serde_json::{Value, json};
use uuid::Uuid;

use common::database::{DatabaseConfig, init_pool};
use pmg_api::{
    jwt::{JwtConfig, JwtService},
    routes,
    state::AppState,
    uploads::UploadStore,
};

async fn live_state() -> AppState {
    let config = DatabaseConfig::from_env().unwrap();
    let pool = init_pool(&config).await.unwrap();
    sqlx::migrate!().run(&pool).await.unwrap();

    let jwt_service = JwtService::new(JwtConfig {
        secret: "db-test-secret".to_string(),
        expiry_secs: 3600,
    });

    let uploads =
        UploadStore::new(std::env::temp_dir().join(format!("pmg-db-test-{}", Uuid::new_v4())));

    AppState::new(pool, jwt_service, uploads)
}

async fn live_server() -> TestServer {
    TestServer::new(routes::create_router(live_state().await)).unwrap()
}

fn random_email(name: &str) -> String {
    format!("{}-{}@example.de", name.to_lowercase(), Uuid::new_v4())
}

async fn register_with(server: &TestServer, email: &str, name: &str) -> axum_test::TestResponse {
    server
        .post("/api/auth/register")
        .json(&json!({
            "email": email,
            "password": "vanille123",
            "name": name,
        }))
        .await
}

/// Register a fresh user and return their bearer token
async fn register(server: &TestServer, name: &str) -> String {
    let response = register_with(server, &random_email(name), name).await;
    response.assert_status(StatusCode::CREATED);

    let body: Value = response.json();
    body["token"].as_str().unwrap().to_string()
}

/// Create an upcoming event and return its id
async fn create_event(server: &TestServer, token: &str, attendee_limit: i32) -> Uuid {
    let start = Utc::now() + Duration::hours(2);
    let end = start + Duration::hours(3);

    let response = server
        .post("/api/events")
        .authorization_bearer(token)
        .json(&json!({
            "title": "Pudding im Park",
            "location": {"lat": 52.52, "lng": 13.405},
            "city": "Berlin",
            "state": "Berlin",
            "startTime": start,
            "endTime": end,
            "attendeeLimit": attendee_limit,
        }))
        .await;
    response.assert_status(StatusCode::CREATED);

    let body: Value = response.json();
    body["event"]["id"].as_str().unwrap().parse().unwrap()
}

/// Submit a join request with a pudding photo
async fn join(server: &TestServer, token: &str, event_id: Uuid) -> axum_test::TestResponse {
    let photo = Part::bytes(vec![0xff, 0xd8, 0x01, 0x02, 0x03])
        .file_name("pudding.jpg")
        .mime_type("image/jpeg");
    let form = MultipartForm::new()
        .add_part("puddingPhoto", photo)
        .add_text("puddingName", "Flan");

    server
        .post(&format!("/api/events/{event_id}/join"))
        .authorization_bearer(token)
        .multipart(form)
        .await
}

#[tokio::test]
#[ignore]
async fn duplicate_email_registration_conflicts() {
    let server = live_server().await;
    let email = random_email("anna");

    register_with(&server, &email, "Anna")
        .await
        .assert_status(StatusCode::CREATED);

    let response = register_with(&server, &email, "Anna Again").await;
    response.assert_status(StatusCode::CONFLICT);
    let body: Value = response.json();
    assert_eq!(body["error"], "Email already registered");
}

#[tokio::test]
#[ignore]
async fn joining_the_same_event_twice_conflicts() {
    let server = live_server().await;
    let organizer = register(&server, "Orga").await;
    let attendee = register(&server, "Bela").await;
    let event_id = create_event(&server, &organizer, 10).await;

    join(&server, &attendee, event_id)
        .await
        .assert_status(StatusCode::CREATED);

    let response = join(&server, &attendee, event_id).await;
    response.assert_status(StatusCode::CONFLICT);
    let body: Value = response.json();
    assert_eq!(body["error"], "Already joined this event");
}

#[tokio::test]
#[ignore]
async fn full_event_rejects_further_joins() {
    let server = live_server().await;
    let organizer = register(&server, "Orga").await;
    let event_id = create_event(&server, &organizer, 5).await;

    for i in 0..5 {
        let attendee = register(&server, &format!("Gast{i}")).await;
        join(&server, &attendee, event_id)
            .await
            .assert_status(StatusCode::CREATED);
    }

    // pending requests occupy seats too
    let latecomer = register(&server, "Zuspät").await;
    let response = join(&server, &latecomer, event_id).await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], "Event is full");
}

#[tokio::test]
#[ignore]
async fn only_the_organizer_can_cancel() {
    let server = live_server().await;
    let organizer = register(&server, "Orga").await;
    let stranger = register(&server, "Clara").await;
    let event_id = create_event(&server, &organizer, 10).await;

    let response = server
        .delete(&format!("/api/events/{event_id}"))
        .authorization_bearer(&stranger)
        .await;
    response.assert_status(StatusCode::FORBIDDEN);

    let response = server
        .delete(&format!("/api/events/{event_id}"))
        .authorization_bearer(&organizer)
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["message"], "Event cancelled successfully");
}

#[tokio::test]
#[ignore]
async fn chat_is_gated_to_approved_attendees() {
    let server = live_server().await;
    let organizer = register(&server, "Orga").await;
    let attendee = register(&server, "Doro").await;
    let event_id = create_event(&server, &organizer, 10).await;

    let response = join(&server, &attendee, event_id).await;
    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    let attendance_id = body["attendance"]["id"].as_str().unwrap();

    // still PENDING: no chat access
    let response = server
        .get(&format!("/api/events/{event_id}/messages"))
        .authorization_bearer(&attendee)
        .await;
    response.assert_status(StatusCode::FORBIDDEN);

    server
        .patch(&format!(
            "/api/events/{event_id}/attendances/{attendance_id}"
        ))
        .authorization_bearer(&organizer)
        .json(&json!({"status": "APPROVED"}))
        .await
        .assert_status_ok();

    server
        .post(&format!("/api/events/{event_id}/messages"))
        .authorization_bearer(&organizer)
        .json(&json!({"content": "Wer bringt Vanillesauce mit?"}))
        .await
        .assert_status(StatusCode::CREATED);

    let response = server
        .get(&format!("/api/events/{event_id}/messages"))
        .authorization_bearer(&attendee)
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["messages"].as_array().unwrap().len(), 1);
    assert_eq!(body["hasMore"], false);
}

#[tokio::test]
#[ignore]
async fn rejected_join_leaves_no_photo_behind() {
    let state = live_state().await;
    let upload_dir = state.uploads.dir().to_path_buf();
    let server = TestServer::new(routes::create_router(state)).unwrap();

    let attendee = register(&server, "Emil").await;

    // unknown event: the join is rejected after the photo was uploaded
    let response = join(&server, &attendee, Uuid::new_v4()).await;
    response.assert_status(StatusCode::NOT_FOUND);

    let leftovers = std::fs::read_dir(&upload_dir)
        .map(|entries| entries.count())
        .unwrap_or(0);
    assert_eq!(leftovers, 0);
}
