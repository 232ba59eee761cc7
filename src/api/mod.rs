pub mod accounts;
pub mod search;

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;

use crate::accounts::AccountError;
use crate::state::AppState;

/// Build the application router: the three JSON endpoints plus the UI page.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(serve_index))
        .route("/search", post(search::search))
        .route("/signup", post(accounts::signup))
        .route("/login", post(accounts::login))
        .with_state(state)
        .fallback(get(serve_index))
}

async fn serve_index() -> Html<&'static str> {
    Html(include_str!("../../static/index.html"))
}

/// Every way a request can fail, mapped to the status and body clients expect.
#[derive(Debug)]
pub enum ApiError {
    /// `/search` without a usable `query`
    InvalidQuery,
    BadRequest(&'static str),
    Conflict,
    Unauthorized,
    /// Upstream or internal failure; details are logged, not returned.
    Internal(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::InvalidQuery => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "Invalid input" })),
            )
                .into_response(),
            ApiError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "message": message }))).into_response()
            }
            ApiError::Conflict => (
                StatusCode::CONFLICT,
                Json(json!({ "message": "User already exist" })),
            )
                .into_response(),
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "message": "Invalid credentials!" })),
            )
                .into_response(),
            ApiError::Internal(e) => {
                tracing::error!("Request failed: {e:#}");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
            }
        }
    }
}

impl From<AccountError> for ApiError {
    fn from(e: AccountError) -> Self {
        match e {
            AccountError::AlreadyExists => ApiError::Conflict,
            AccountError::InvalidCredentials => ApiError::Unauthorized,
            AccountError::PasswordTooLong => {
                ApiError::BadRequest("Password must be at most 72 bytes")
            }
            AccountError::Hash(e) => ApiError::Internal(e.into()),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        ApiError::Internal(e)
    }
}
