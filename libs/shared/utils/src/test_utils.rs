use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use serde_json::json;
use sha2::Sha256;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::User;

use crate::mailer::{EmailMessage, MailError, MailReceipt, MailTransport};
use crate::state::AppState;

pub struct TestConfig {
    pub jwt_secret: String,
    pub supabase_url: String,
    pub supabase_service_key: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
            supabase_url: "http://localhost:54321".to_string(),
            supabase_service_key: "test-service-key".to_string(),
        }
    }
}

impl TestConfig {
    pub fn with_supabase_url(url: &str) -> Self {
        Self {
            supabase_url: url.to_string(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_service_key: self.supabase_service_key.clone(),
            jwt_secret: self.jwt_secret.clone(),
            mail_api_url: "http://localhost:9/mail".to_string(),
            mail_user: "clinic@itabaza.test".to_string(),
            mail_password: "mail-password".to_string(),
            port: 8080,
            allowed_origins: vec!["http://localhost:3000".to_string()],
            video_call_base_url: "https://meet.jit.si".to_string(),
            video_portal_url: "https://itabaza-videocall.onrender.com/".to_string(),
            strict_status_transitions: false,
        }
    }

    /// State with a recording mailer; the returned handle inspects sent mail.
    pub fn to_state(&self) -> (Arc<AppState>, Arc<RecordingMailTransport>) {
        let mailer = Arc::new(RecordingMailTransport::default());
        let state = AppState::with_mailer(self.to_app_config(), mailer.clone());
        (Arc::new(state), mailer)
    }
}

/// In-memory transport: records messages and fails for chosen recipients.
#[derive(Default)]
pub struct RecordingMailTransport {
    sent: Mutex<Vec<EmailMessage>>,
    failing_recipients: Mutex<Vec<String>>,
}

impl RecordingMailTransport {
    pub fn fail_for(&self, recipient: &str) {
        if let Ok(mut failing) = self.failing_recipients.lock() {
            failing.push(recipient.to_string());
        }
    }

    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl MailTransport for RecordingMailTransport {
    async fn send(&self, message: &EmailMessage) -> Result<MailReceipt, MailError> {
        let should_fail = self
            .failing_recipients
            .lock()
            .map(|failing| failing.contains(&message.to))
            .unwrap_or(false);

        if should_fail {
            return Err(MailError::Rejected {
                status: 550,
                message: format!("mailbox unavailable: {}", message.to),
            });
        }

        if let Ok(mut sent) = self.sent.lock() {
            sent.push(message.clone());
        }
        Ok(MailReceipt {
            message_id: Some(Uuid::new_v4().to_string()),
        })
    }

    fn sender(&self) -> &str {
        "clinic@itabaza.test"
    }
}

pub struct TestUser {
    pub id: String,
    pub email: String,
    pub role: String,
}

impl Default for TestUser {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: "test@example.com".to_string(),
            role: "patient".to_string(),
        }
    }
}

impl TestUser {
    pub fn new(email: &str, role: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            role: role.to_string(),
        }
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = id.to_string();
        self
    }

    pub fn doctor(email: &str) -> Self {
        Self::new(email, "doctor")
    }

    pub fn patient(email: &str) -> Self {
        Self::new(email, "patient")
    }

    pub fn admin(email: &str) -> Self {
        Self::new(email, "admin")
    }

    pub fn to_user(&self) -> User {
        User {
            id: self.id.clone(),
            email: Some(self.email.clone()),
            role: Some(self.role.clone()),
            name: None,
            created_at: Some(Utc::now()),
        }
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    pub fn create_test_token(user: &TestUser, secret: &str, exp_hours: Option<i64>) -> String {
        let now = Utc::now();
        let exp = now + Duration::hours(exp_hours.unwrap_or(24));

        let header = json!({
            "alg": "HS256",
            "typ": "JWT"
        });

        let payload = json!({
            "sub": user.id,
            "email": user.email,
            "role": user.role,
            "iat": now.timestamp(),
            "exp": exp.timestamp()
        });

        let header_encoded = general_purpose::URL_SAFE_NO_PAD.encode(header.to_string());
        let payload_encoded = general_purpose::URL_SAFE_NO_PAD.encode(payload.to_string());

        let signing_input = format!("{}.{}", header_encoded, payload_encoded);

        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(signing_input.as_bytes());
        let signature = mac.finalize().into_bytes();
        let signature_encoded = general_purpose::URL_SAFE_NO_PAD.encode(signature);

        format!("{}.{}", signing_input, signature_encoded)
    }

    pub fn bearer(user: &TestUser) -> String {
        let token = Self::create_test_token(user, &TestConfig::default().jwt_secret, Some(24));
        format!("Bearer {}", token)
    }

    pub fn create_expired_token(user: &TestUser, secret: &str) -> String {
        Self::create_test_token(user, secret, Some(-1))
    }

    pub fn create_invalid_signature_token(user: &TestUser) -> String {
        Self::create_test_token(user, "wrong-secret", Some(24))
    }

    pub fn create_malformed_token() -> String {
        "invalid.token.format".to_string()
    }
}

pub struct MockSupabaseResponses;

impl MockSupabaseResponses {
    pub fn appointment_row(
        id: &str,
        patient_id: &str,
        doctor_id: &str,
        appointment_date: &str,
        consultation_type: &str,
    ) -> serde_json::Value {
        json!({
            "id": id,
            "patient_id": patient_id,
            "doctor_id": doctor_id,
            "patient_first_name": "Aline",
            "patient_email": "aline@example.com",
            "doc_first_name": "Mugisha",
            "age_of_patient": 34,
            "gender": "female",
            "address": "Rusizi",
            "problem_description": "Recurring headaches",
            "appointment_date": appointment_date,
            "appointment_time": "10:00",
            "consultation_type": consultation_type,
            "status": "pending",
            "payment_status": false,
            "payment_amount": null,
            "video_call_url": null,
            "created_at": "2025-07-01T08:00:00Z",
            "updated_at": "2025-07-01T08:00:00Z"
        })
    }

    pub fn user_row(id: &str, email: &str, password_hash: &str) -> serde_json::Value {
        json!({
            "id": id,
            "first_name": "Aline",
            "last_name": "Uwase",
            "email": email,
            "mobile": "0788000000",
            "password": password_hash,
            "created_at": "2025-07-01T08:00:00Z"
        })
    }

    pub fn doctor_row(id: &str, email: &str, name: &str, approved: bool) -> serde_json::Value {
        json!({
            "id": id,
            "doctor_name": name,
            "email": email,
            "qualifications": "MBBS, MD",
            "experience": "8 years",
            "phone_no": "0788111111",
            "city": "Rusizi",
            "department_id": 1,
            "status": approved,
            "image": null,
            "is_available": true
        })
    }

    pub fn department_row(id: i64, name: &str) -> serde_json::Value {
        json!({
            "id": id,
            "dept_name": name,
            "about": null,
            "image": null
        })
    }

    pub fn error_response(message: &str, code: &str) -> serde_json::Value {
        json!({
            "code": code,
            "message": message,
            "details": null,
            "hint": null
        })
    }
}
