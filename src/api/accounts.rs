use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use super::ApiError;
use crate::accounts::NewAccount;
use crate::models::{LoginRequest, LoginResponse, MessageResponse, SignupRequest};
use crate::state::AppState;

/// POST /signup - Create an account unless the email is taken
pub async fn signup(
    State(state): State<AppState>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    const MISSING: &str = "Missing required fields";

    let Ok(Json(req)) = payload else {
        return Err(ApiError::BadRequest(MISSING));
    };

    let (Some(email), Some(password), Some(username), Some(birthdate)) = (
        non_empty(req.email),
        non_empty(req.password),
        non_empty(req.username),
        non_empty(req.birthdate),
    ) else {
        return Err(ApiError::BadRequest(MISSING));
    };

    let account = NewAccount {
        email,
        password,
        username,
        birthdate,
    };

    // bcrypt is CPU-bound
    let accounts = state.accounts.clone();
    let profile = tokio::task::spawn_blocking(move || accounts.signup(account))
        .await
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("Signup task failed: {e}")))??;

    tracing::info!("New account for {}", profile.email);
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "Signup successful!".to_string(),
        }),
    ))
}

/// POST /login - Check credentials and echo the account profile
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Ok(Json(req)) = payload else {
        return Err(ApiError::BadRequest("Invalid input"));
    };

    let (Some(email), Some(password)) = (non_empty(req.email), non_empty(req.password)) else {
        return Err(ApiError::Unauthorized);
    };

    let accounts = state.accounts.clone();
    let user = tokio::task::spawn_blocking(move || accounts.login(&email, &password))
        .await
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("Login task failed: {e}")))??;

    Ok(Json(LoginResponse {
        message: "Login successful!".to_string(),
        user,
    }))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
