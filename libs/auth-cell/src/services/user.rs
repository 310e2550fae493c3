use std::sync::OnceLock;

use regex::Regex;
use reqwest::Method;
use serde_json::json;
use tracing::{debug, info, warn};

use shared_database::supabase::SupabaseClient;
use shared_utils::jwt::issue_token;
use shared_utils::AppState;

use crate::models::{AuthError, PatientRecord, SigninRequest, SigninResponse, SignupRequest};
use crate::services::password::PasswordService;

const USERS: &str = "/rest/v1/users";

fn email_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").ok())
        .as_ref()
}

pub fn is_valid_email(email: &str) -> bool {
    email.len() <= 254 && email_pattern().is_some_and(|re| re.is_match(email))
}

pub fn validate_signup(request: &SignupRequest) -> Result<(), AuthError> {
    let missing: Vec<&str> = [
        ("first_name", request.first_name.as_str()),
        ("email", request.email.as_str()),
        ("mobile", request.mobile.as_str()),
        ("password", request.password.as_str()),
    ]
    .iter()
    .filter(|(_, value)| value.trim().is_empty())
    .map(|(name, _)| *name)
    .collect();

    if !missing.is_empty() {
        return Err(AuthError::Validation(format!(
            "Missing required fields: {}",
            missing.join(", ")
        )));
    }
    if !is_valid_email(request.email.trim()) {
        return Err(AuthError::Validation("Invalid email address".to_string()));
    }
    Ok(())
}

/// Patient accounts in the `users` table.
pub struct UserService {
    supabase: SupabaseClient,
    jwt_secret: String,
}

impl UserService {
    pub fn new(state: &AppState) -> Self {
        Self {
            supabase: state.supabase.clone(),
            jwt_secret: state.config.jwt_secret.clone(),
        }
    }

    async fn find_one(&self, column: &str, value: &str) -> Result<Option<PatientRecord>, AuthError> {
        let path = format!(
            "{}?select=*&{}=eq.{}&limit=1",
            USERS,
            column,
            urlencoding::encode(value)
        );
        debug!("Looking up user by {}", column);
        let rows: Vec<PatientRecord> = self.supabase.request(Method::GET, &path, None).await?;
        Ok(rows.into_iter().next())
    }

    pub async fn find_by_id(&self, user_id: &str) -> Result<Option<PatientRecord>, AuthError> {
        self.find_one("id", user_id).await
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<PatientRecord>, AuthError> {
        self.find_one("email", email).await
    }

    pub async fn find_by_mobile(&self, mobile: &str) -> Result<Option<PatientRecord>, AuthError> {
        self.find_one("mobile", mobile).await
    }

    pub async fn list_all(&self) -> Result<Vec<PatientRecord>, AuthError> {
        let path = format!(
            "{}?select=id,first_name,last_name,email,mobile,created_at&order=created_at.desc",
            USERS
        );
        Ok(self.supabase.request(Method::GET, &path, None).await?)
    }

    pub async fn signup(&self, request: SignupRequest) -> Result<PatientRecord, AuthError> {
        validate_signup(&request)?;
        let email = request.email.trim().to_lowercase();

        if self.find_by_email(&email).await?.is_some() {
            return Err(AuthError::AlreadyRegistered);
        }

        let password = PasswordService::hash_password(&request.password)?;
        let body = json!({
            "first_name": request.first_name.trim(),
            "last_name": request.last_name.trim(),
            "email": email,
            "mobile": request.mobile.trim(),
            "password": password,
        });

        let rows: Vec<PatientRecord> = self
            .supabase
            .request_returning(Method::POST, USERS, body)
            .await?;
        let user = rows
            .into_iter()
            .next()
            .ok_or_else(|| AuthError::Validation("Signup returned no user".to_string()))?;

        info!("Registered user {}", user.id);
        Ok(user)
    }

    pub async fn signin(&self, request: SigninRequest) -> Result<SigninResponse, AuthError> {
        let payload = request.payload.trim();
        if payload.is_empty() || request.password.is_empty() {
            return Err(AuthError::Validation(
                "Email or mobile and password are required".to_string(),
            ));
        }

        let user = match self.find_by_email(&payload.to_lowercase()).await? {
            Some(user) => user,
            None => self
                .find_by_mobile(payload)
                .await?
                .ok_or(AuthError::InvalidCredentials)?,
        };

        let hash = user.password.as_deref().ok_or(AuthError::InvalidCredentials)?;
        if !PasswordService::verify_password(&request.password, hash)? {
            warn!("Failed sign-in for user {}", user.id);
            return Err(AuthError::InvalidCredentials);
        }

        let token = issue_token(
            &user.id,
            user.email.as_deref(),
            user.first_name.as_deref(),
            user.token_role(),
            &self.jwt_secret,
        )
        .map_err(AuthError::Token)?;

        info!("User {} signed in", user.id);
        Ok(SigninResponse {
            token,
            id: user.id,
            name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            mobile: user.mobile,
        })
    }
}
