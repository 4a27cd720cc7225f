//! HTTP handlers for document processing

use axum::{
    extract::{Multipart, State},
    Json,
};

use crate::error::{AppError, AppResult};
use crate::external::document_processor::DocumentProcessorClient;
use crate::middleware::CurrentUser;
use crate::services::document_processing::{
    DocumentProcessingService, ProcessingHistoryEntry, ProcessingOutcome,
};
use crate::AppState;

/// Send an uploaded document through the external extractor
/// (multipart: function_id, file)
pub async fn process_document(
    State(state): State<AppState>,
    current_user: CurrentUser,
    mut multipart: Multipart,
) -> AppResult<Json<ProcessingOutcome>> {
    let mut function_id = None;
    let mut file_name = None;
    let mut content_type = None;
    let mut file_bytes = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::ValidationError(format!("invalid multipart body: {}", e)))?
    {
        match field.name() {
            Some("function_id") => {
                function_id = Some(field.text().await.map_err(|e| {
                    AppError::ValidationError(format!("invalid function_id field: {}", e))
                })?);
            }
            Some("file") => {
                file_name = field.file_name().map(str::to_string);
                content_type = field.content_type().map(str::to_string);
                file_bytes = Some(
                    field
                        .bytes()
                        .await
                        .map_err(|e| {
                            AppError::ValidationError(format!("failed to read file: {}", e))
                        })?
                        .to_vec(),
                );
            }
            _ => {}
        }
    }

    let function_id = function_id.ok_or_else(|| AppError::Validation {
        field: "function_id".to_string(),
        message: "field is required".to_string(),
    })?;
    let file_bytes = file_bytes.ok_or_else(|| AppError::Validation {
        field: "file".to_string(),
        message: "field is required".to_string(),
    })?;

    let client = DocumentProcessorClient::new(
        state.config.document_processor.endpoint.clone(),
        state.config.document_processor.timeout_secs,
    );
    let service = DocumentProcessingService::new(state.db);
    let outcome = service
        .process_document(
            &client,
            current_user.0.user_id,
            &function_id,
            file_name.as_deref().unwrap_or("document"),
            content_type
                .as_deref()
                .unwrap_or("application/octet-stream"),
            file_bytes,
        )
        .await?;
    Ok(Json(outcome))
}

/// List processing history for the current user
pub async fn get_processing_history(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<ProcessingHistoryEntry>>> {
    let service = DocumentProcessingService::new(state.db);
    let history = service.list_history(current_user.0.user_id).await?;
    Ok(Json(history))
}
