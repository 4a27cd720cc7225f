//! HTTP handlers for production run endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::production::{
    CreateProductionInput, ProductionRun, ProductionService, UpdateProductionInput,
};
use crate::AppState;

/// List all production runs for the current user
pub async fn list_production_runs(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<ProductionRun>>> {
    let service = ProductionService::new(state.db);
    let runs = service.list_production_runs(current_user.0.user_id).await?;
    Ok(Json(runs))
}

/// Get a production run by ID
pub async fn get_production_run(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(production_id): Path<Uuid>,
) -> AppResult<Json<ProductionRun>> {
    let service = ProductionService::new(state.db);
    let run = service
        .get_production_run(current_user.0.user_id, production_id)
        .await?;
    Ok(Json(run))
}

/// Record a new production run
pub async fn create_production_run(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateProductionInput>,
) -> AppResult<Json<ProductionRun>> {
    let service = ProductionService::new(state.db);
    let run = service
        .create_production_run(current_user.0.user_id, &state.config.catalog, input)
        .await?;
    Ok(Json(run))
}

/// Update a production run
pub async fn update_production_run(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(production_id): Path<Uuid>,
    Json(input): Json<UpdateProductionInput>,
) -> AppResult<Json<ProductionRun>> {
    let service = ProductionService::new(state.db);
    let run = service
        .update_production_run(
            current_user.0.user_id,
            production_id,
            &state.config.catalog,
            input,
        )
        .await?;
    Ok(Json(run))
}

/// Delete a production run
pub async fn delete_production_run(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(production_id): Path<Uuid>,
) -> AppResult<Json<()>> {
    let service = ProductionService::new(state.db);
    service
        .delete_production_run(current_user.0.user_id, production_id)
        .await?;
    Ok(Json(()))
}
