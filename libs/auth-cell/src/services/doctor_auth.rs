use chrono::{Duration, Utc};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{info, warn};

use shared_database::supabase::SupabaseClient;
use shared_models::auth::Role;
use shared_utils::jwt::{issue_token, SESSION_TTL_HOURS};
use shared_utils::AppState;

use crate::models::{AuthError, DoctorCredentials, DoctorLoginRequest, DoctorLoginResponse, DoctorSummary};
use crate::services::password::PasswordService;

pub struct DoctorAuthService {
    supabase: SupabaseClient,
    jwt_secret: String,
}

impl DoctorAuthService {
    pub fn new(state: &AppState) -> Self {
        Self {
            supabase: state.supabase.clone(),
            jwt_secret: state.config.jwt_secret.clone(),
        }
    }

    /// Approved doctors only. Doctors without a stored password hash cannot log in.
    pub async fn login(&self, request: DoctorLoginRequest) -> Result<DoctorLoginResponse, AuthError> {
        let email = request.email.trim().to_lowercase();
        if email.is_empty() || request.password.is_empty() {
            return Err(AuthError::Validation("Email and password are required".to_string()));
        }

        let path = format!(
            "/rest/v1/doctors?select=*&email=eq.{}&status=eq.true&limit=1",
            urlencoding::encode(&email)
        );
        let rows: Vec<DoctorCredentials> = self.supabase.request(Method::GET, &path, None).await?;
        let doctor = rows.into_iter().next().ok_or(AuthError::DoctorNotApproved)?;

        let Some(hash) = doctor.password_hash.as_deref() else {
            warn!("Doctor {} has no password set", doctor.id);
            return Err(AuthError::InvalidCredentials);
        };
        if !PasswordService::verify_password(&request.password, hash)? {
            return Err(AuthError::InvalidCredentials);
        }

        let token = issue_token(
            &doctor.id,
            doctor.email.as_deref(),
            doctor.doctor_name.as_deref(),
            Role::Doctor,
            &self.jwt_secret,
        )
        .map_err(AuthError::Token)?;

        self.record_session(&doctor.id, &token).await;
        info!("Doctor {} logged in", doctor.id);

        Ok(DoctorLoginResponse {
            token,
            doctor: DoctorSummary {
                id: doctor.id,
                name: doctor.doctor_name,
                email: doctor.email,
                department_id: doctor.department_id,
            },
        })
    }

    /// Best effort: a failed insert is logged and the login still succeeds.
    async fn record_session(&self, doctor_id: &str, token: &str) {
        let expires_at = Utc::now() + Duration::hours(SESSION_TTL_HOURS);
        let body = json!({
            "doctor_id": doctor_id,
            "session_token": token,
            "expires_at": expires_at.to_rfc3339(),
        });

        if let Err(e) = self
            .supabase
            .request_returning::<Vec<Value>>(Method::POST, "/rest/v1/doctor_sessions", body)
            .await
        {
            warn!("Could not record session for doctor {}: {}", doctor_id, e);
        }
    }
}
