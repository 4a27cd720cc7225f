//! HTTP handlers for landholding and compliance document endpoints

use axum::{
    extract::{Multipart, Path, State},
    http::header,
    response::IntoResponse,
    Json,
};
use chrono::NaiveDate;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::CurrentUser;
use crate::services::landholding::{
    AttachDocumentInput, CreateLandholdingInput, DocumentType, Landholding, LandholdingDocument,
    LandholdingService, UpdateLandholdingInput,
};
use crate::AppState;

/// List all landholdings for the current user
pub async fn list_landholdings(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<Landholding>>> {
    let service = LandholdingService::new(state.db);
    let landholdings = service.list_landholdings(current_user.0.user_id).await?;
    Ok(Json(landholdings))
}

/// Get a landholding by ID
pub async fn get_landholding(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(landholding_id): Path<Uuid>,
) -> AppResult<Json<Landholding>> {
    let service = LandholdingService::new(state.db);
    let landholding = service
        .get_landholding(current_user.0.user_id, landholding_id)
        .await?;
    Ok(Json(landholding))
}

/// Register a new landholding
pub async fn create_landholding(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateLandholdingInput>,
) -> AppResult<Json<Landholding>> {
    let service = LandholdingService::new(state.db);
    let landholding = service
        .create_landholding(current_user.0.user_id, input)
        .await?;
    Ok(Json(landholding))
}

/// Update a landholding
pub async fn update_landholding(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(landholding_id): Path<Uuid>,
    Json(input): Json<UpdateLandholdingInput>,
) -> AppResult<Json<Landholding>> {
    let service = LandholdingService::new(state.db);
    let landholding = service
        .update_landholding(current_user.0.user_id, landholding_id, input)
        .await?;
    Ok(Json(landholding))
}

/// Archive a landholding
pub async fn archive_landholding(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(landholding_id): Path<Uuid>,
) -> AppResult<Json<Landholding>> {
    let service = LandholdingService::new(state.db);
    let landholding = service
        .archive_landholding(current_user.0.user_id, landholding_id)
        .await?;
    Ok(Json(landholding))
}

/// List the registered document types
pub async fn list_document_types(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<Json<Vec<DocumentType>>> {
    let service = LandholdingService::new(state.db);
    let types = service.list_document_types().await?;
    Ok(Json(types))
}

/// Attach a compliance document (multipart: document_type, valid_until?, file)
pub async fn upload_document(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(landholding_id): Path<Uuid>,
    mut multipart: Multipart,
) -> AppResult<Json<LandholdingDocument>> {
    let mut document_type = None;
    let mut valid_until = None;
    let mut file_name = None;
    let mut content_type = None;
    let mut data = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::ValidationError(format!("invalid multipart body: {}", e)))?
    {
        match field.name() {
            Some("document_type") => {
                document_type = Some(field.text().await.map_err(|e| {
                    AppError::ValidationError(format!("invalid document_type field: {}", e))
                })?);
            }
            Some("valid_until") => {
                let text = field.text().await.map_err(|e| {
                    AppError::ValidationError(format!("invalid valid_until field: {}", e))
                })?;
                valid_until = Some(NaiveDate::parse_from_str(&text, "%Y-%m-%d").map_err(|_| {
                    AppError::Validation {
                        field: "valid_until".to_string(),
                        message: format!("invalid date: {text}"),
                    }
                })?);
            }
            Some("file") => {
                file_name = field.file_name().map(str::to_string);
                content_type = field.content_type().map(str::to_string);
                data = Some(
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

    let input = AttachDocumentInput {
        document_type: document_type.ok_or_else(|| AppError::Validation {
            field: "document_type".to_string(),
            message: "field is required".to_string(),
        })?,
        file_name: file_name.unwrap_or_else(|| "document".to_string()),
        content_type: content_type.unwrap_or_else(|| "application/octet-stream".to_string()),
        valid_until,
        data: data.ok_or_else(|| AppError::Validation {
            field: "file".to_string(),
            message: "field is required".to_string(),
        })?,
    };

    let service = LandholdingService::new(state.db);
    let document = service
        .attach_document(current_user.0.user_id, landholding_id, input)
        .await?;
    Ok(Json(document))
}

/// List documents attached to a landholding
pub async fn list_documents(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(landholding_id): Path<Uuid>,
) -> AppResult<Json<Vec<LandholdingDocument>>> {
    let service = LandholdingService::new(state.db);
    let documents = service
        .list_documents(current_user.0.user_id, landholding_id)
        .await?;
    Ok(Json(documents))
}

/// Download a document's file content
pub async fn download_document(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path((landholding_id, document_id)): Path<(Uuid, Uuid)>,
) -> AppResult<impl IntoResponse> {
    let service = LandholdingService::new(state.db);
    let (document, content) = service
        .get_document_content(current_user.0.user_id, landholding_id, document_id)
        .await?;

    let headers = [
        (header::CONTENT_TYPE, document.content_type.clone()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", document.file_name),
        ),
    ];
    Ok((headers, content))
}

/// Remove a document from a landholding
pub async fn delete_document(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path((landholding_id, document_id)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<()>> {
    let service = LandholdingService::new(state.db);
    service
        .delete_document(current_user.0.user_id, landholding_id, document_id)
        .await?;
    Ok(Json(()))
}
