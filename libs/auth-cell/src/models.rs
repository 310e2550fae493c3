// libs/auth-cell/src/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use shared_database::DatabaseError;
use shared_models::auth::Role;
use shared_models::error::AppError;
use shared_utils::mailer::MailError;

// ==============================================================================
// RECORDS
// ==============================================================================

/// Row of the `users` table. The password hash is never serialised back out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientRecord {
    #[serde(deserialize_with = "id_as_string")]
    pub id: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub mobile: Option<String>,
    #[serde(default, skip_serializing)]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl PatientRecord {
    /// Accounts flagged `admin` in the users table get admin tokens.
    pub fn token_role(&self) -> Role {
        match self.role.as_deref() {
            Some("admin") => Role::Admin,
            _ => Role::Patient,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DoctorCredentials {
    #[serde(deserialize_with = "id_as_string")]
    pub id: String,
    #[serde(default)]
    pub doctor_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub department_id: Option<Value>,
    #[serde(default)]
    pub password_hash: Option<String>,
}

fn id_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!("unexpected id: {}", other))),
    }
}

// ==============================================================================
// REQUESTS
// ==============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct SignupRequest {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub mobile: String,
    #[serde(default)]
    pub password: String,
}

/// `payload` is either an email address or a mobile number.
#[derive(Debug, Clone, Deserialize)]
pub struct SigninRequest {
    #[serde(default)]
    pub payload: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DoctorLoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmailVerifyRequest {
    #[serde(default)]
    pub email: String,
}

// ==============================================================================
// RESPONSES
// ==============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct SigninResponse {
    pub token: String,
    pub id: String,
    pub name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub mobile: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DoctorLoginResponse {
    pub token: String,
    pub doctor: DoctorSummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct DoctorSummary {
    pub id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub department_id: Option<Value>,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid credentials or doctor not approved")]
    DoctorNotApproved,

    #[error("User already registered")]
    AlreadyRegistered,

    #[error("{0}")]
    Validation(String),

    #[error("Password hashing failed: {0}")]
    Password(String),

    #[error("Token signing failed: {0}")]
    Token(String),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Mail delivery failed: {0}")]
    Mail(#[from] MailError),
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        let message = err.to_string();
        match err {
            AuthError::InvalidCredentials | AuthError::DoctorNotApproved => AppError::Auth(message),
            AuthError::AlreadyRegistered => AppError::Conflict(message),
            AuthError::Validation(msg) => AppError::ValidationError(msg),
            AuthError::Password(_) | AuthError::Token(_) => AppError::Internal(message),
            AuthError::Database(e) => AppError::Database(e.to_string()),
            AuthError::Mail(e) => AppError::ExternalService(e.to_string()),
        }
    }
}
