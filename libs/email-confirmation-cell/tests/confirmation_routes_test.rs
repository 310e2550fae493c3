use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use email_confirmation_cell::email_confirmation_routes;
use shared_utils::test_utils::{JwtTestUtils, MockSupabaseResponses, TestConfig, TestUser};

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

fn staff() -> TestUser {
    TestUser::admin("admin@example.com")
}

#[tokio::test]
async fn criteria_are_required() {
    let server = MockServer::start().await;
    let (state, mailer) = TestConfig::with_supabase_url(&server.uri()).to_state();

    let response = email_confirmation_routes(state)
        .oneshot(request("POST", "/send-confirmation", &staff(), Some(json!({}))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(response).await["error"],
        "Either appointment ID or patient email is required"
    );
    assert!(mailer.sent().is_empty());
}

#[tokio::test]
async fn unknown_appointment_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(406).set_body_json(
            MockSupabaseResponses::error_response("no rows", "PGRST116"),
        ))
        .mount(&server)
        .await;
    let (state, _) = TestConfig::with_supabase_url(&server.uri()).to_state();

    let response = email_confirmation_routes(state)
        .oneshot(request(
            "POST",
            "/send-confirmation",
            &staff(),
            Some(json!({"appointmentId": "missing"})),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn resend_by_id_mails_the_patient() {
    let server = MockServer::start().await;
    mount_single(
        &server,
        "a-1",
        MockSupabaseResponses::appointment_row("a-1", "p-1", "d-1", "2025-07-27", "in-person"),
    )
    .await;
    let (state, mailer) = TestConfig::with_supabase_url(&server.uri()).to_state();

    let response = email_confirmation_routes(state)
        .oneshot(request(
            "POST",
            "/send-confirmation",
            &staff(),
            Some(json!({"appointmentId": "a-1"})),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["totalAppointments"], 1);
    assert_eq!(body["successCount"], 1);
    assert_eq!(body["message"], "Successfully sent 1 out of 1 confirmation emails");
    assert_eq!(body["results"][0]["sentTo"], "aline@example.com");

    let sent = mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].subject, "iTABAZA In-Person Appointment Confirmation");
    assert!(sent[0].html.as_deref().unwrap().contains("Dr. Mugisha"));
}

#[tokio::test]
async fn one_bounce_does_not_abort_the_batch() {
    let server = MockServer::start().await;
    let mut bounced = MockSupabaseResponses::appointment_row("a-2", "p-1", "d-1", "2025-07-20", "video-call");
    bounced["patient_email"] = json!("old@example.com");

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("patient_email", "eq.aline@example.com"))
        .and(query_param("order", "created_at.desc"))
        .and(query_param("limit", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::appointment_row("a-1", "p-1", "d-1", "2025-07-27", "in-person"),
            bounced
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let (state, mailer) = TestConfig::with_supabase_url(&server.uri()).to_state();
    mailer.fail_for("old@example.com");

    let response = email_confirmation_routes(state)
        .oneshot(request(
            "POST",
            "/send-confirmation",
            &staff(),
            Some(json!({"patientEmail": "aline@example.com"})),
        ))
        .await
        .unwrap();

    let body = json_body(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["totalAppointments"], 2);
    assert_eq!(body["successCount"], 1);
    assert_eq!(body["results"][0]["appointmentId"], "a-1");
    assert_eq!(body["results"][0]["success"], true);
    assert_eq!(body["results"][1]["appointmentId"], "a-2");
    assert_eq!(body["results"][1]["success"], false);
    assert!(body["results"][1]["message"]
        .as_str()
        .unwrap()
        .starts_with("Failed to send email:"));
    assert_eq!(mailer.sent().len(), 1);
}

#[tokio::test]
async fn missing_names_come_from_user_and_doctor_records() {
    let server = MockServer::start().await;
    let mut row = MockSupabaseResponses::appointment_row("a-3", "p-9", "d-9", "2025-07-27", "in-person");
    row["patient_first_name"] = Value::Null;
    row["patient_email"] = Value::Null;
    row["doc_first_name"] = Value::Null;
    mount_single(&server, "a-3", row).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .and(query_param("id", "eq.p-9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::user_row("p-9", "patient9@example.com", "hash")
        ])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .and(query_param("id", "eq.d-9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            MockSupabaseResponses::doctor_row("d-9", "doc@example.com", "Uwimana", true),
        ))
        .expect(1)
        .mount(&server)
        .await;

    let (state, mailer) = TestConfig::with_supabase_url(&server.uri()).to_state();
    let response = email_confirmation_routes(state)
        .oneshot(request(
            "POST",
            "/send-confirmation",
            &staff(),
            Some(json!({"appointmentId": "a-3"})),
        ))
        .await
        .unwrap();

    let body = json_body(response).await;
    assert_eq!(body["results"][0]["sentTo"], "patient9@example.com");
    let html = mailer.sent()[0].html.clone().unwrap();
    assert!(html.contains("Hello, Aline!"));
    assert!(html.contains("Dr. Uwimana"));
}

#[tokio::test]
async fn patients_cannot_resend_someone_elses_confirmation() {
    let server = MockServer::start().await;
    mount_single(
        &server,
        "a-1",
        MockSupabaseResponses::appointment_row("a-1", "p-1", "d-1", "2025-07-27", "in-person"),
    )
    .await;
    let (state, mailer) = TestConfig::with_supabase_url(&server.uri()).to_state();

    let stranger = TestUser::patient("other@example.com").with_id("p-2");
    let response = email_confirmation_routes(state)
        .oneshot(request(
            "POST",
            "/send-confirmation",
            &stranger,
            Some(json!({"appointmentId": "a-1"})),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(mailer.sent().is_empty());
}

#[tokio::test]
async fn details_include_resolved_names() {
    let server = MockServer::start().await;
    mount_single(
        &server,
        "a-1",
        MockSupabaseResponses::appointment_row("a-1", "p-1", "d-1", "2025-07-27", "in-person"),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .and(query_param("id", "eq.d-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            MockSupabaseResponses::doctor_row("d-1", "doc@example.com", "Dr. Mugisha", true),
        ))
        .mount(&server)
        .await;
    let (state, _) = TestConfig::with_supabase_url(&server.uri()).to_state();

    let patient = TestUser::patient("aline@example.com").with_id("p-1");
    let response = email_confirmation_routes(state)
        .oneshot(request("GET", "/appointment/a-1", &patient, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let data = json_body(response).await["data"].clone();
    assert_eq!(data["id"], "a-1");
    assert_eq!(data["patient_name"], "Aline");
    assert_eq!(data["doctor_name"], "Mugisha");
    assert_eq!(data["patient_email"], "aline@example.com");
    assert_eq!(data["doctor_qualifications"], "MBBS, MD");
}
