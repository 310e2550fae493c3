use std::sync::Arc;

use axum::{
    extract::{Extension, Json, State},
    http::StatusCode,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};
use tracing::{debug, info};

use shared_models::auth::{TokenResponse, User};
use shared_models::error::AppError;
use shared_utils::extractor::{require_admin, AppJson};
use shared_utils::jwt::validate_token as check_token;
use shared_utils::AppState;

use crate::models::{DoctorLoginRequest, EmailVerifyRequest, SigninRequest, SignupRequest};
use crate::services::otp::{generate_otp, otp_email};
use crate::services::user::is_valid_email;
use crate::services::{DoctorAuthService, UserService};

type MaybeBearer = Option<TypedHeader<Authorization<Bearer>>>;

// ==============================================================================
// TOKEN CHECKS
// ==============================================================================

pub async fn validate_token(
    State(state): State<Arc<AppState>>,
    auth: MaybeBearer,
) -> Result<Json<TokenResponse>, AppError> {
    debug!("Validating token");

    let TypedHeader(auth) =
        auth.ok_or_else(|| AppError::Auth("Missing authorization header".to_string()))?;
    let user = check_token(auth.token(), &state.config.jwt_secret).map_err(AppError::Auth)?;

    Ok(Json(TokenResponse {
        valid: true,
        user_id: user.id,
        email: user.email,
        role: user.role,
    }))
}

pub async fn verify_token(
    State(state): State<Arc<AppState>>,
    auth: MaybeBearer,
) -> Json<Value> {
    debug!("Verifying token");

    let valid = auth
        .map(|TypedHeader(auth)| check_token(auth.token(), &state.config.jwt_secret).is_ok())
        .unwrap_or(false);

    Json(json!({ "valid": valid }))
}

pub async fn me(Extension(user): Extension<User>) -> Json<Value> {
    Json(json!({
        "success": true,
        "data": user
    }))
}

// ==============================================================================
// DOCTOR LOGIN
// ==============================================================================

pub async fn doctor_login(
    State(state): State<Arc<AppState>>,
    AppJson(request): AppJson<DoctorLoginRequest>,
) -> Result<Json<Value>, AppError> {
    let login = DoctorAuthService::new(&state).login(request).await?;

    Ok(Json(json!({
        "success": true,
        "token": login.token,
        "doctor": login.doctor
    })))
}

// ==============================================================================
// PATIENT ACCOUNTS
// ==============================================================================

pub async fn signup(
    State(state): State<Arc<AppState>>,
    AppJson(request): AppJson<SignupRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let user = UserService::new(&state).signup(request).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Signup Successful",
            "data": { "id": user.id, "email": user.email }
        })),
    ))
}

pub async fn signin(
    State(state): State<Arc<AppState>>,
    AppJson(request): AppJson<SigninRequest>,
) -> Result<Json<Value>, AppError> {
    let session = UserService::new(&state).signin(request).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Login Successful",
        "token": session.token.clone(),
        "data": session
    })))
}

/// Mails a fresh OTP and hands it back so the client can compare.
pub async fn email_verify(
    State(state): State<Arc<AppState>>,
    AppJson(request): AppJson<EmailVerifyRequest>,
) -> Result<Json<Value>, AppError> {
    let email = request.email.trim();
    if !is_valid_email(email) {
        return Err(AppError::ValidationError("A valid email is required".to_string()));
    }

    let otp = generate_otp();
    let message = otp_email(state.mailer.sender(), email, &otp);
    state
        .mailer
        .send(&message)
        .await
        .map_err(|e| AppError::ExternalService(e.to_string()))?;
    info!("OTP mailed to {}", email);

    Ok(Json(json!({
        "success": true,
        "message": "Mail has been sent",
        "otp": otp,
        "email": email
    })))
}

pub async fn get_all_users(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;

    let users = UserService::new(&state).list_all().await?;

    Ok(Json(json!({
        "success": true,
        "data": users,
        "count": users.len()
    })))
}
