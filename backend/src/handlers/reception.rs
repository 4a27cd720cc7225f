//! HTTP handlers for reception endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::reception::{
    CreateReceptionInput, Reception, ReceptionService, UpdateReceptionInput,
};
use crate::AppState;

/// List all receptions for the current user
pub async fn list_receptions(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<Reception>>> {
    let service = ReceptionService::new(state.db);
    let receptions = service.list_receptions(current_user.0.user_id).await?;
    Ok(Json(receptions))
}

/// Get a reception by ID
pub async fn get_reception(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(reception_id): Path<Uuid>,
) -> AppResult<Json<Reception>> {
    let service = ReceptionService::new(state.db);
    let reception = service
        .get_reception(current_user.0.user_id, reception_id)
        .await?;
    Ok(Json(reception))
}

/// Record a new reception
pub async fn create_reception(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateReceptionInput>,
) -> AppResult<Json<Reception>> {
    let service = ReceptionService::new(state.db);
    let reception = service
        .create_reception(current_user.0.user_id, &state.config.catalog, input)
        .await?;
    Ok(Json(reception))
}

/// Update a reception
pub async fn update_reception(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(reception_id): Path<Uuid>,
    Json(input): Json<UpdateReceptionInput>,
) -> AppResult<Json<Reception>> {
    let service = ReceptionService::new(state.db);
    let reception = service
        .update_reception(
            current_user.0.user_id,
            reception_id,
            &state.config.catalog,
            input,
        )
        .await?;
    Ok(Json(reception))
}

/// Delete a reception
pub async fn delete_reception(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(reception_id): Path<Uuid>,
) -> AppResult<Json<()>> {
    let service = ReceptionService::new(state.db);
    service
        .delete_reception(current_user.0.user_id, reception_id)
        .await?;
    Ok(Json(()))
}
