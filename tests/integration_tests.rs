use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use room_rates::{
    build_app,
    config::load_config_from_yaml,
    metrics::Metrics,
    source::{FixedRoomDataSource, RandomRoomDataSource},
    RoomDataSource, RoomRatesError, RoomRatesService, RoomRecord, TokenBucket,
};
use std::{sync::Arc, time::Duration};
use tower::ServiceExt;

struct UnavailableSource;

#[async_trait]
impl RoomDataSource for UnavailableSource {
    async fn fetch_room_data(&self, _room_id: &str) -> room_rates::Result<RoomRecord> {
        Err(RoomRatesError::Upstream("inventory service timed out".to_string()))
    }
}

fn app_with_source(source: Arc<dyn RoomDataSource>) -> Router {
    let limiter = Arc::new(TokenBucket::new(5, Duration::from_secs(12)));
    let metrics = Arc::new(Metrics::new().unwrap());
    let service = RoomRatesService::new(limiter, source, metrics).unwrap();
    build_app(Arc::new(service))
}

fn app() -> Router {
    app_with_source(Arc::new(RandomRoomDataSource::new()))
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Option<String>, String) {
    let response = app
        .clone()
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .map(|v| v.to_str().unwrap().to_string());
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, content_type, String::from_utf8(body.to_vec()).unwrap())
}

#[tokio::test(start_paused = true)]
async fn test_room_lookup_returns_json() {
    let app = app();
    let (status, content_type, body) = get(&app, "/api/room/42").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("application/json"));

    let value: serde_json::Value = serde_json::from_str(&body).unwrap();
    let occupancy = value["occupancy_rate"].as_f64().unwrap();
    assert!((0.0..=100.0).contains(&occupancy));
    for field in ["average_night_rate", "highest_night_rate", "lowest_night_rate"] {
        assert!(value[field].as_f64().unwrap() >= 0.0, "{} missing", field);
    }
}

#[tokio::test(start_paused = true)]
async fn test_burst_of_five_then_rejected() {
    let app = app();

    for _ in 0..5 {
        let (status, _, _) = get(&app, "/api/room/1").await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, content_type, body) = get(&app, "/api/room/1").await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body, "Too Many Requests");
    assert!(content_type.unwrap().starts_with("text/plain"));
}

#[tokio::test(start_paused = true)]
async fn test_single_token_refills_after_interval() {
    let app = app();
    for _ in 0..5 {
        get(&app, "/api/room/1").await;
    }
    assert_eq!(get(&app, "/api/room/1").await.0, StatusCode::TOO_MANY_REQUESTS);

    tokio::time::advance(Duration::from_secs(11)).await;
    assert_eq!(get(&app, "/api/room/1").await.0, StatusCode::TOO_MANY_REQUESTS);

    // The 11s already waited count towards the refill
    tokio::time::advance(Duration::from_secs(12)).await;
    assert_eq!(get(&app, "/api/room/1").await.0, StatusCode::OK);
    assert_eq!(get(&app, "/api/room/1").await.0, StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test(start_paused = true)]
async fn test_idle_bucket_never_exceeds_capacity() {
    let app = app();
    get(&app, "/api/room/1").await;

    tokio::time::advance(Duration::from_secs(24 * 3600)).await;

    for _ in 0..5 {
        assert_eq!(get(&app, "/api/room/1").await.0, StatusCode::OK);
    }
    assert_eq!(get(&app, "/api/room/1").await.0, StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test(start_paused = true)]
async fn test_non_numeric_and_missing_ids_are_not_found() {
    let app = app();

    let (status, _, body) = get(&app, "/api/room/abc").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, "404 page not found");

    assert_eq!(get(&app, "/api/room/").await.0, StatusCode::NOT_FOUND);
    assert_eq!(get(&app, "/api/rooms/1").await.0, StatusCode::NOT_FOUND);
}

#[tokio::test(start_paused = true)]
async fn test_unrouted_requests_spend_tokens() {
    let app = app();
    for _ in 0..5 {
        assert_eq!(get(&app, "/api/room/abc").await.0, StatusCode::NOT_FOUND);
    }

    assert_eq!(get(&app, "/api/room/42").await.0, StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test(start_paused = true)]
async fn test_wrong_method_is_not_allowed() {
    let app = app();
    let response = app
        .clone()
        .oneshot(
            Request::post("/api/room/42")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test(start_paused = true)]
async fn test_upstream_failure_hides_details() {
    let app = app_with_source(Arc::new(UnavailableSource));
    let (status, _, body) = get(&app, "/api/room/42").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, "Error fetching room data");
    assert!(!body.contains("timed out"));
}

#[tokio::test(start_paused = true)]
async fn test_fixed_source_from_yaml_config() {
    let config = load_config_from_yaml(
        r#"
rate_limit:
  capacity: 2
  period_secs: 60
data_source:
  kind: fixed
  record:
    occupancy_rate: 42.0
    average_night_rate: 100.0
    highest_night_rate: 150.0
    lowest_night_rate: 80.0
"#,
    )
    .unwrap();
    let metrics = Arc::new(Metrics::new().unwrap());
    let service = RoomRatesService::from_config(&config, metrics.clone()).unwrap();
    let app = build_app(Arc::new(service));

    let (status, _, body) = get(&app, "/api/room/7").await;
    assert_eq!(status, StatusCode::OK);
    let record: RoomRecord = serde_json::from_str(&body).unwrap();
    assert_eq!(record.occupancy_rate, 42.0);

    assert_eq!(get(&app, "/api/room/7").await.0, StatusCode::OK);
    assert_eq!(get(&app, "/api/room/7").await.0, StatusCode::TOO_MANY_REQUESTS);

    let families = metrics.registry().gather();
    let responses = families
        .iter()
        .find(|f| f.get_name() == "room_rates_responses")
        .unwrap();
    let total: f64 = responses
        .get_metric()
        .iter()
        .map(|m| m.get_counter().get_value())
        .sum();
    assert_eq!(total, 3.0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_requests_admit_exactly_capacity() {
    let app = app_with_source(Arc::new(FixedRoomDataSource::new(RoomRecord {
        occupancy_rate: 10.0,
        average_night_rate: 100.0,
        highest_night_rate: 120.0,
        lowest_night_rate: 90.0,
    })));

    let handles: Vec<_> = (0..100)
        .map(|_| {
            let app = app.clone();
            tokio::spawn(async move {
                app.oneshot(Request::get("/api/room/42").body(Body::empty()).unwrap())
                    .await
                    .unwrap()
                    .status()
            })
        })
        .collect();

    let mut admitted = 0;
    let mut rejected = 0;
    for handle in handles {
        match handle.await.unwrap() {
            StatusCode::OK => admitted += 1,
            StatusCode::TOO_MANY_REQUESTS => rejected += 1,
            other => panic!("Unexpected status {}", other),
        }
    }

    assert_eq!(admitted, 5);
    assert_eq!(rejected, 95);
}
