//! HTTP handlers for bulk ingestion

use axum::{extract::State, Json};
use serde::Deserialize;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::bulk::{BulkInsertOutcome, BulkRecordsInput, BulkService};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct BulkStatementsInput {
    pub statements: Vec<String>,
}

/// Insert a structured batch of records with partial success semantics
pub async fn bulk_insert_records(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<BulkRecordsInput>,
) -> AppResult<Json<BulkInsertOutcome>> {
    let service = BulkService::new(state.db);
    let outcome = service
        .insert_records(current_user.0.user_id, &state.config.catalog, input)
        .await?;
    Ok(Json(outcome))
}

/// Parse and insert raw INSERT statements from the document processor
pub async fn bulk_insert_statements(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<BulkStatementsInput>,
) -> AppResult<Json<BulkInsertOutcome>> {
    let service = BulkService::new(state.db);
    let outcome = service
        .insert_statements(current_user.0.user_id, &state.config.catalog, input.statements)
        .await?;
    Ok(Json(outcome))
}
