use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use appointment_cell::router::appointment_routes;
use appointment_cell::{AppointmentRepository, AppointmentStatus};
use shared_utils::test_utils::{
    JwtTestUtils, MockSupabaseResponses, RecordingMailTransport, TestConfig, TestUser,
};
use shared_utils::AppState;

fn app(server: &MockServer) -> Router {
    let (state, _) = TestConfig::with_supabase_url(&server.uri()).to_state();
    appointment_routes(state)
}

fn strict_app(server: &MockServer) -> Router {
    let mut config = TestConfig::with_supabase_url(&server.uri()).to_app_config();
    config.strict_status_transitions = true;
    let state = AppState::with_mailer(config, Arc::new(RecordingMailTransport::default()));
    appointment_routes(Arc::new(state))
}

fn request(method: &str, uri: &str, user: &TestUser, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("Authorization", JwtTestUtils::bearer(user))
        .header("Content-Type", "application/json");
    match body {
        Some(body) => builder.body(Body::from(body.to_string())).unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn mount_single(server: &MockServer, id: &str, row: Value) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", id)))
        .and(header("accept", "application/vnd.pgrst.object+json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(row))
        .mount(server)
        .await;
}

#[tokio::test]
async fn missing_token_is_unauthorized() {
    let server = MockServer::start().await;
    let response = app(&server)
        .oneshot(Request::builder().uri("/pending").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await["success"], false);
}

#[tokio::test]
async fn patient_books_for_themselves() {
    let server = MockServer::start().await;
    let patient = TestUser::patient("aline@example.com").with_id("p-1");

    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .and(header("prefer", "return=representation"))
        .and(body_partial_json(json!({"patient_id": "p-1", "doctor_id": "d-1"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockSupabaseResponses::appointment_row("a-1", "p-1", "d-1", "2025-08-01", "in-person")
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let response = app(&server)
        .oneshot(request(
            "POST",
            "/",
            &patient,
            Some(json!({
                "doctor_id": "d-1",
                "appointment_date": "2025-08-01",
                "slot_time": "10-11",
                "problem_description": "Recurring headaches"
            })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["id"], "a-1");
    assert_eq!(body["data"]["patient_id"], "p-1");
}

#[tokio::test]
async fn patient_cannot_book_for_someone_else() {
    let server = MockServer::start().await;
    let patient = TestUser::patient("aline@example.com").with_id("p-1");

    let response = app(&server)
        .oneshot(request(
            "POST",
            "/",
            &patient,
            Some(json!({
                "patient_id": "p-2",
                "doctor_id": "d-1",
                "appointment_date": "2025-08-01"
            })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn incomplete_bodies_get_the_error_envelope() {
    let server = MockServer::start().await;
    let admin = TestUser::admin("admin@example.com");
    let app = app(&server);

    let response = app
        .clone()
        .oneshot(request("POST", "/", &admin, Some(json!({"patient_id": "p-1"}))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("doctor_id"));

    let response = app
        .oneshot(request("PUT", "/a-1/status", &admin, Some(json!({}))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("status"));
}

#[tokio::test]
async fn unknown_appointment_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(406).set_body_json(
            MockSupabaseResponses::error_response("JSON object requested, multiple (or no) rows returned", "PGRST116"),
        ))
        .mount(&server)
        .await;

    let admin = TestUser::admin("admin@example.com");
    let response = app(&server)
        .oneshot(request("GET", "/missing", &admin, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn foreign_patient_is_forbidden() {
    let server = MockServer::start().await;
    mount_single(
        &server,
        "a-1",
        MockSupabaseResponses::appointment_row("a-1", "p-1", "d-1", "2025-08-01", "in-person"),
    )
    .await;

    let stranger = TestUser::patient("other@example.com").with_id("p-2");
    let response = app(&server)
        .oneshot(request("GET", "/a-1", &stranger, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn unpaid_video_link_is_hidden_from_patient() {
    let server = MockServer::start().await;
    let mut row = MockSupabaseResponses::appointment_row("a-1", "p-1", "d-1", "2025-08-01", "video-call");
    row["video_call_url"] = json!("https://meet.jit.si/itabaza-room");
    mount_single(&server, "a-1", row).await;

    let patient = TestUser::patient("aline@example.com").with_id("p-1");
    let body = json_body(
        app(&server)
            .oneshot(request("GET", "/a-1", &patient, None))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(body["data"]["video_call_url"], Value::Null);

    let doctor = TestUser::doctor("doc@example.com").with_id("d-1");
    let body = json_body(
        app(&server)
            .oneshot(request("GET", "/a-1", &doctor, None))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(body["data"]["video_call_url"], "https://meet.jit.si/itabaza-room");
}

#[tokio::test]
async fn doctor_completes_appointment() {
    let server = MockServer::start().await;
    mount_single(
        &server,
        "a-1",
        MockSupabaseResponses::appointment_row("a-1", "p-1", "d-1", "2025-08-01", "in-person"),
    )
    .await;

    let mut completed = MockSupabaseResponses::appointment_row("a-1", "p-1", "d-1", "2025-08-01", "in-person");
    completed["status"] = json!("completed");
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", "eq.a-1"))
        .and(body_partial_json(json!({"status": "completed"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([completed])))
        .expect(1)
        .mount(&server)
        .await;

    let doctor = TestUser::doctor("doc@example.com").with_id("d-1");
    let response = app(&server)
        .oneshot(request("PATCH", "/complete/a-1", &doctor, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["data"]["status"], "completed");
}

#[tokio::test]
async fn strict_mode_rejects_skipping_confirmation() {
    let server = MockServer::start().await;
    mount_single(
        &server,
        "a-1",
        MockSupabaseResponses::appointment_row("a-1", "p-1", "d-1", "2025-08-01", "in-person"),
    )
    .await;
    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let doctor = TestUser::doctor("doc@example.com").with_id("d-1");
    let response = strict_app(&server)
        .oneshot(request("PUT", "/a-1/status", &doctor, Some(json!({"status": "completed"}))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn patient_may_cancel_but_not_confirm() {
    let server = MockServer::start().await;
    mount_single(
        &server,
        "a-1",
        MockSupabaseResponses::appointment_row("a-1", "p-1", "d-1", "2025-08-01", "in-person"),
    )
    .await;
    let mut cancelled = MockSupabaseResponses::appointment_row("a-1", "p-1", "d-1", "2025-08-01", "in-person");
    cancelled["status"] = json!("cancelled");
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([cancelled])))
        .expect(1)
        .mount(&server)
        .await;

    let patient = TestUser::patient("aline@example.com").with_id("p-1");
    let response = app(&server)
        .oneshot(request("PUT", "/a-1/status", &patient, Some(json!({"status": "confirmed"}))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app(&server)
        .oneshot(request("PUT", "/a-1/status", &patient, Some(json!({"status": "cancelled"}))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn stats_are_admin_only() {
    let server = MockServer::start().await;
    let mut paid = MockSupabaseResponses::appointment_row("a-2", "p-1", "d-1", "2025-08-02", "video-call");
    paid["payment_status"] = json!(true);
    paid["payment_amount"] = json!("5000");
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::appointment_row("a-1", "p-1", "d-1", "2025-08-01", "in-person"),
            paid
        ])))
        .mount(&server)
        .await;

    let doctor = TestUser::doctor("doc@example.com");
    let response = app(&server)
        .oneshot(request("GET", "/stats", &doctor, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let admin = TestUser::admin("admin@example.com");
    let body = json_body(
        app(&server)
            .oneshot(request("GET", "/stats", &admin, None))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(body["data"]["total"], 2);
    assert_eq!(body["data"]["paid"], 1);
    assert_eq!(body["data"]["unpaid"], 1);
    assert_eq!(body["data"]["video_calls"], 1);
    assert_eq!(body["data"]["total_revenue"], 5000.0);
}

#[tokio::test]
async fn video_call_listing_is_scoped_and_ordered() {
    let server = MockServer::start().await;
    let mut first = MockSupabaseResponses::appointment_row("a-1", "P1", "d-1", "2025-08-01", "video-call");
    first["video_call_url"] = json!("https://meet.jit.si/one");
    let mut second = MockSupabaseResponses::appointment_row("a-2", "P1", "d-2", "2025-08-05", "video-call");
    second["video_call_url"] = json!("https://meet.jit.si/two");

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("consultation_type", "eq.video-call"))
        .and(query_param("video_call_url", "not.is.null"))
        .and(query_param("patient_id", "eq.P1"))
        .and(query_param("order", "appointment_date.asc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([first, second])))
        .expect(1)
        .mount(&server)
        .await;

    let (state, _) = TestConfig::with_supabase_url(&server.uri()).to_state();
    let rows = AppointmentRepository::new(&state)
        .find_video_call_appointments(Some("P1"), None)
        .await
        .unwrap();

    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|a| a.is_video_call() && a.video_call_url.is_some()));
    assert!(rows.windows(2).all(|w| w[0].appointment_date <= w[1].appointment_date));
    assert!(rows.iter().all(|a| a.status == AppointmentStatus::Pending));
}

#[tokio::test]
async fn identical_updates_are_idempotent() {
    let server = MockServer::start().await;
    let mut confirmed = MockSupabaseResponses::appointment_row("a-1", "p-1", "d-1", "2025-08-01", "in-person");
    confirmed["status"] = json!("confirmed");
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([confirmed])))
        .expect(2)
        .mount(&server)
        .await;

    let (state, _) = TestConfig::with_supabase_url(&server.uri()).to_state();
    let lifecycle = appointment_cell::AppointmentLifecycle::new(&state);
    let first = lifecycle.update_status("a-1", AppointmentStatus::Confirmed).await.unwrap();
    let second = lifecycle.update_status("a-1", AppointmentStatus::Confirmed).await.unwrap();
    assert_eq!(first, second);
}
