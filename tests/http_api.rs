use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use chrono::{NaiveDate, NaiveTime};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use roombook::booking::RoomBooking;
use roombook::calendar::FixedClock;
use roombook::http::{self, AppState};
use roombook::model::{SlotKey, room_label};
use roombook::store::{SlotStore, slot_grid};

// ── Test infrastructure ──────────────────────────────────────

fn test_wal_path(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join("roombook_http_test");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    let _ = std::fs::remove_file(&path);
    path
}

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

/// Wednesday 2025-01-01.
fn today() -> NaiveDate {
    d(2025, 1, 1)
}

/// Rooms 1 and 2, hourly 08:00–16:00, over the business week from `today()`.
async fn seeded_app(name: &str) -> Router {
    let store = Arc::new(SlotStore::open(test_wal_path(name)).unwrap());
    let dates = [d(2025, 1, 1), d(2025, 1, 2), d(2025, 1, 3), d(2025, 1, 6), d(2025, 1, 7)];
    let times: Vec<_> = (8..17)
        .map(|h| NaiveTime::from_hms_opt(h, 0, 0).unwrap())
        .collect();
    let rooms = vec![room_label(1), room_label(2)];
    store.seed(slot_grid(&rooms, &dates, &times)).await.unwrap();
    app_with(store)
}

fn app_with(store: Arc<SlotStore>) -> Router {
    let booking = RoomBooking::new(store, Arc::new(FixedClock(today())));
    http::router(AppState::new(booking))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

async fn book(app: &Router, body: Value) -> (StatusCode, Value) {
    let request = Request::post("/book-room")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

async fn week(app: &Router) -> (StatusCode, Value) {
    send(app, Request::get("/available-rooms-week").body(Body::empty()).unwrap()).await
}

// ── POST /book-room ──────────────────────────────────────────

#[tokio::test]
async fn book_room_ok() {
    let app = seeded_app("book_ok.wal").await;
    let (status, body) = book(&app, json!({"room_id": 1, "tid": "10:00", "datum": "2025-01-02"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["message"],
        "Rummet Room 1 är nu bokat för 10:00 den 2025-01-02."
    );
}

#[tokio::test]
async fn book_room_twice_is_409() {
    let app = seeded_app("book_twice.wal").await;
    let request = json!({"room_id": 2, "tid": "14:00", "datum": "2025-01-03"});
    assert_eq!(book(&app, request.clone()).await.0, StatusCode::OK);

    let (status, body) = book(&app, request).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "conflict");
    assert_eq!(
        body["detail"],
        "Rummet Room 2 är redan bokat för 14:00 den 2025-01-03. Välj en annan tid."
    );
}

#[tokio::test]
async fn book_unknown_room_is_409() {
    let app = seeded_app("book_unknown.wal").await;
    let (status, _) = book(&app, json!({"room_id": 42, "tid": "10:00", "datum": "2025-01-02"})).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn validation_errors_are_422_with_message() {
    let app = seeded_app("book_invalid.wal").await;
    let cases = [
        ("8:00", "2025-01-02", "time_format", "Ogiltigt tidsformat. Ange tiden i formatet HH:MM mellan 08:00 och 17:00."),
        ("17:01", "2025-01-02", "time_range", "Ogiltigt tidsformat. Ange tiden i formatet HH:MM mellan 08:00 och 17:00."),
        ("10:00", "2025-02-30", "date_format", "Ogiltigt datumformat. Ange datumet i formatet YYYY-MM-DD."),
        ("10:00", "2024-12-31", "past_date", "Datumet ligger i det förflutna. Välj ett framtida datum."),
        ("10:00", "2025-01-04", "weekend", "Endast bokningar mellan måndag och fredag är tillåtna."),
        ("10:00", "2025-01-08", "outside_window", "Datumet ligger för långt i framtiden. Välj ett datum denna vecka."),
    ];
    for (tid, datum, code, detail) in cases {
        let (status, body) = book(&app, json!({"room_id": 1, "tid": tid, "datum": datum})).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{tid} {datum}");
        assert_eq!(body["code"], code, "{tid} {datum}");
        assert_eq!(body["detail"], detail, "{tid} {datum}");
    }
}

#[tokio::test]
async fn unusable_body_is_rejected_in_error_shape() {
    let app = seeded_app("book_bad_body.wal").await;
    for body in [
        json!({"room_id": -1, "tid": "10:00", "datum": "2025-01-02"}),
        json!({"room_id": 0, "tid": "10:00", "datum": "2025-01-02"}),
        json!({"room_id": 1, "tid": "10:00"}),
    ] {
        let (status, response) = book(&app, body.clone()).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{body}");
        assert_eq!(response["code"], "invalid_body", "{body}");
        assert!(response["detail"].is_string(), "{body}");
    }

    let request = Request::post("/book-room")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, response) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["code"], "invalid_body");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_requests_one_winner() {
    let app = seeded_app("book_race.wal").await;
    let mut handles = Vec::new();
    for _ in 0..12 {
        let app = app.clone();
        handles.push(tokio::spawn(async move {
            book(&app, json!({"room_id": 1, "tid": "09:00", "datum": "2025-01-06"})).await.0
        }));
    }
    let mut statuses = Vec::new();
    for h in handles {
        statuses.push(h.await.unwrap());
    }
    assert_eq!(statuses.iter().filter(|s| **s == StatusCode::OK).count(), 1);
    assert_eq!(statuses.iter().filter(|s| **s == StatusCode::CONFLICT).count(), 11);
}

// ── GET /available-rooms-week ────────────────────────────────

#[tokio::test]
async fn week_lists_five_business_days() {
    let app = seeded_app("week_list.wal").await;
    let (status, body) = week(&app).await;
    assert_eq!(status, StatusCode::OK);

    let days: Vec<&String> = body.as_object().unwrap().keys().collect();
    assert_eq!(
        days,
        vec!["2025-01-01", "2025-01-02", "2025-01-03", "2025-01-06", "2025-01-07"]
    );
    let room1 = body["2025-01-06"]["Room 1"].as_array().unwrap();
    assert_eq!(room1.len(), 9);
    assert_eq!(room1[0], "08:00");
    assert_eq!(room1[8], "16:00");
}

#[tokio::test]
async fn booking_removes_time_from_week() {
    let app = seeded_app("week_roundtrip.wal").await;
    assert_eq!(
        book(&app, json!({"room_id": 1, "tid": "12:00", "datum": "2025-01-02"})).await.0,
        StatusCode::OK
    );

    let (_, body) = week(&app).await;
    let room1 = body["2025-01-02"]["Room 1"].as_array().unwrap();
    assert!(!room1.contains(&json!("12:00")));
    let room2 = body["2025-01-02"]["Room 2"].as_array().unwrap();
    assert!(room2.contains(&json!("12:00")));
}

#[tokio::test]
async fn week_rooms_serialize_in_store_order() {
    let store = Arc::new(SlotStore::open(test_wal_path("week_room_order.wal")).unwrap());
    let date = d(2025, 1, 2);
    let nine = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
    store
        .seed([2, 10, 1].map(|room| SlotKey::new(room_label(room), date, nine)))
        .await
        .unwrap();
    let app = app_with(store);

    let response = app
        .oneshot(Request::get("/available-rooms-week").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(
        text.contains(r#""2025-01-02":{"Room 2":["09:00"],"Room 10":["09:00"],"Room 1":["09:00"]}"#),
        "{text}"
    );
}

#[tokio::test]
async fn week_on_empty_store_is_404() {
    let store = Arc::new(SlotStore::open(test_wal_path("week_empty.wal")).unwrap());
    let app = app_with(store);
    let (status, body) = week(&app).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        body["detail"],
        "Inga lediga rum finns för de kommande fem vardagarna."
    );
}

#[tokio::test]
async fn health_is_ok() {
    let app = seeded_app("health.wal").await;
    let (status, body) = send(&app, Request::get("/health").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));
}
