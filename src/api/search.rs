use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;

use super::ApiError;
use crate::models::{QueryRequest, QueryResponse};
use crate::state::AppState;

/// POST /search - Retrieval-augmented answer:
///   1. Embed the query
///   2. Vector search over the hosted index
///   3. Chat completion with the top hit as context
///   4. Run the function the model asked for, if any
pub async fn search(
    State(state): State<AppState>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<QueryResponse>, ApiError> {
    let Ok(Json(req)) = payload else {
        return Err(ApiError::InvalidQuery);
    };

    let query = req.query.as_deref().map(str::trim).unwrap_or_default();
    if query.is_empty() {
        return Err(ApiError::InvalidQuery);
    }

    let response = state.pipeline.answer(query).await?;
    Ok(Json(response))
}
