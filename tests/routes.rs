use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;
use venue_queue::{
    config::{AppConfig, Tuning, VenueConfig},
    dao::models::{MatchResultEntity, MatchType},
    routes,
    state::AppState,
    testing::FakeVenueApi,
};

fn app(venue: &FakeVenueApi) -> Router {
    let config = AppConfig::new(
        VenueConfig::new("http://backend.test", "서경 본관", "https://stats.test/register"),
        Tuning::default(),
    );
    routes::router(AppState::new(config, Arc::new(venue.clone())))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => request.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn admin_app(venue: &FakeVenueApi) -> Router {
    let app = app(venue);
    let (status, _) = send(&app, "PUT", "/admin/mode", Some(json!({ "enabled": true }))).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, "POST", "/queue/refresh", None).await;
    assert_eq!(status, StatusCode::OK);
    app
}

fn names(queue: &Value) -> Vec<&str> {
    queue["players"]
        .as_array()
        .unwrap()
        .iter()
        .map(|player| player["name"].as_str().unwrap())
        .collect()
}

#[tokio::test]
async fn healthcheck_is_degraded_until_first_poll() {
    let app = app(&FakeVenueApi::default());
    let (status, body) = send(&app, "GET", "/healthcheck", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "degraded" }));
}

#[tokio::test]
async fn mutations_are_forbidden_outside_admin_mode() {
    let venue = FakeVenueApi::with_players(&["A", "B"]);
    let app = app(&venue);

    for (method, uri, body) in [
        ("POST", "/queue/players", Some(json!({ "name": "Kim" }))),
        ("POST", "/queue/placeholder", None),
        ("POST", "/match/start", None),
        ("POST", "/match/end", None),
        ("POST", "/match/result", Some(json!({ "score_a": 1, "score_b": 0 }))),
        ("POST", "/match/close", None),
        ("PUT", "/match/type", Some(json!({ "match_type": "special" }))),
    ] {
        let (status, body) = send(&app, method, uri, body).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{method} {uri}");
        assert_eq!(body["message"], "forbidden: admin mode is disabled");
    }
    assert_eq!(venue.keys().len(), 0);

    let (status, _) = send(&app, "GET", "/queue", None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, "DELETE", "/queue/alert", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn admin_mode_toggles() {
    let app = app(&FakeVenueApi::default());
    let (_, body) = send(&app, "GET", "/admin/mode", None).await;
    assert_eq!(body, json!({ "enabled": false }));

    send(&app, "PUT", "/admin/mode", Some(json!({ "enabled": true }))).await;
    let (_, body) = send(&app, "GET", "/view", None).await;
    assert_eq!(body["admin"], true);
    assert_eq!(body["image"], "seokyeong.png");
    assert_eq!(body["venue"], "서경 본관");
}

#[tokio::test]
async fn blank_name_add_is_a_no_op() {
    let venue = FakeVenueApi::with_players(&["A"]);
    let app = admin_app(&venue).await;

    let (status, body) = send(&app, "POST", "/queue/players", Some(json!({ "name": "   " }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    assert_eq!(venue.keys().len(), 0);
}

#[tokio::test]
async fn invalid_name_is_rejected() {
    let venue = FakeVenueApi::default();
    let app = admin_app(&venue).await;

    let (status, _) = send(
        &app,
        "POST",
        "/queue/players",
        Some(json!({ "name": "bad\u{7}name" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(venue.keys().len(), 0);
}

#[tokio::test]
async fn unregistered_player_raises_alert_until_dismissed() {
    let venue = FakeVenueApi::default();
    venue.register_only(&["Kim"]);
    let app = admin_app(&venue).await;

    let (status, body) = send(&app, "POST", "/queue/players", Some(json!({ "name": "Ghost" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["alert"],
        "Please register on the player registration page first."
    );

    let (_, body) = send(&app, "DELETE", "/queue/alert", None).await;
    assert_eq!(body["alert"], Value::Null);
}

#[tokio::test]
async fn players_are_addressed_by_id() {
    let venue = FakeVenueApi::with_players(&["A", "B", "C"]);
    let app = admin_app(&venue).await;
    let (_, queue) = send(&app, "GET", "/queue", None).await;
    let b = queue["players"][1]["id"].as_str().unwrap().to_string();
    let c = queue["players"][2]["id"].as_str().unwrap().to_string();

    let (status, body) = send(&app, "PUT", &format!("/queue/players/{b}"), Some(json!({ "name": "Bea" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&body), vec!["A", "Bea", "C"]);

    let (status, body) = send(&app, "DELETE", &format!("/queue/players/{c}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&body), vec!["A", "Bea"]);
    assert_eq!(venue.players(), vec!["A", "Bea"]);

    let (status, _) = send(&app, "DELETE", &format!("/queue/players/{c}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test(start_paused = true)]
async fn timed_match_posts_result_and_frees_the_table() {
    let venue = FakeVenueApi::with_players(&["A", "B", "C"]);
    let app = admin_app(&venue).await;

    let (status, body) = send(&app, "POST", "/match/start", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["phase"], "running");
    assert_eq!(body["running"], true);

    tokio::time::advance(Duration::from_secs(37)).await;
    let (_, body) = send(&app, "GET", "/match", None).await;
    assert_eq!(body["elapsed_secs"], 37);

    let (status, body) = send(&app, "POST", "/match/end", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["phase"], "recording");
    assert_eq!(body["contestant_a"]["name"], "A");
    assert_eq!(body["contestant_b"]["name"], "B");
    assert_eq!(venue.players(), vec!["A", "B", "C"]);

    let (status, body) = send(
        &app,
        "POST",
        "/match/result",
        Some(json!({ "score_a": 11, "score_b": 7 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["phase"], "idle");
    assert_eq!(body["running"], false);
    assert_eq!(body["elapsed_secs"], 0);

    assert_eq!(
        venue.results(),
        vec![MatchResultEntity {
            player1_name: "A".into(),
            player1_score: 11,
            player2_name: "B".into(),
            player2_score: 7,
            match_time: 37,
            match_type: MatchType::Normal,
        }]
    );
    let (_, queue) = send(&app, "GET", "/queue", None).await;
    assert_eq!(names(&queue), vec!["C"]);
}

#[tokio::test(start_paused = true)]
async fn tie_is_refused_and_result_entry_stays_open() {
    let venue = FakeVenueApi::with_players(&["A", "B"]);
    let app = admin_app(&venue).await;
    send(&app, "POST", "/match/start", None).await;
    tokio::time::advance(Duration::from_secs(3)).await;
    send(&app, "POST", "/match/end", None).await;

    let (status, body) = send(
        &app,
        "POST",
        "/match/result",
        Some(json!({ "score_a": 5, "score_b": 5 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "bad request: tie not allowed");
    assert!(venue.results().is_empty());

    let (_, body) = send(&app, "GET", "/match", None).await;
    assert_eq!(body["phase"], "recording");
}

#[tokio::test]
async fn invalid_transitions_conflict() {
    let venue = FakeVenueApi::with_players(&["A", "B"]);
    let app = admin_app(&venue).await;

    let (status, _) = send(&app, "POST", "/match/end", None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    let (status, _) = send(&app, "POST", "/match/close", None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    send(&app, "POST", "/match/start", None).await;
    let (status, _) = send(&app, "POST", "/match/start", None).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn close_during_outage_keeps_result_entry_open() {
    let venue = FakeVenueApi::with_players(&["A", "B", "C"]);
    let app = admin_app(&venue).await;
    send(&app, "POST", "/match/start", None).await;
    send(&app, "POST", "/match/end", None).await;

    venue.set_offline(true);
    let (status, _) = send(&app, "POST", "/match/close", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    let (_, body) = send(&app, "GET", "/match", None).await;
    assert_eq!(body["phase"], "recording");

    venue.set_offline(false);
    let (status, body) = send(&app, "POST", "/match/close", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["phase"], "idle");
    assert_eq!(venue.players(), vec!["C"]);
}

#[tokio::test]
async fn stats_redirects_to_registration_page() {
    let app = app(&FakeVenueApi::default());
    let request = Request::builder().uri("/stats").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        response.headers()[header::LOCATION],
        "https://stats.test/register"
    );
}

#[tokio::test]
async fn public_stream_opens_with_current_queue() {
    let venue = FakeVenueApi::with_players(&["A", "B"]);
    let app = admin_app(&venue).await;

    let request = Request::builder().uri("/sse/public").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/event-stream");

    let mut body = response.into_body();
    let frame = body.frame().await.unwrap().unwrap();
    let text = String::from_utf8(frame.into_data().unwrap().to_vec()).unwrap();
    assert!(text.contains("event: queue.updated\n"), "{text}");
    assert!(text.contains(r#""count":2"#), "{text}");
}

#[tokio::test]
async fn manual_refresh_survives_backend_outage() {
    let venue = FakeVenueApi::with_players(&["A"]);
    let app = admin_app(&venue).await;
    venue.set_offline(true);

    let (status, body) = send(&app, "POST", "/queue/refresh", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&body), vec!["A"]);
}
