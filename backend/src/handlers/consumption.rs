//! HTTP handlers for consumption endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::consumption::{
    Consumption, ConsumptionService, CreateConsumptionInput, UpdateConsumptionInput,
};
use crate::AppState;

/// List all consumptions for the current user
pub async fn list_consumptions(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<Consumption>>> {
    let service = ConsumptionService::new(state.db);
    let consumptions = service.list_consumptions(current_user.0.user_id).await?;
    Ok(Json(consumptions))
}

/// Get a consumption by ID
pub async fn get_consumption(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(consumption_id): Path<Uuid>,
) -> AppResult<Json<Consumption>> {
    let service = ConsumptionService::new(state.db);
    let consumption = service
        .get_consumption(current_user.0.user_id, consumption_id)
        .await?;
    Ok(Json(consumption))
}

/// Record a new consumption
pub async fn create_consumption(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateConsumptionInput>,
) -> AppResult<Json<Consumption>> {
    let service = ConsumptionService::new(state.db);
    let consumption = service
        .create_consumption(current_user.0.user_id, &state.config.catalog, input)
        .await?;
    Ok(Json(consumption))
}

/// Update a consumption
pub async fn update_consumption(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(consumption_id): Path<Uuid>,
    Json(input): Json<UpdateConsumptionInput>,
) -> AppResult<Json<Consumption>> {
    let service = ConsumptionService::new(state.db);
    let consumption = service
        .update_consumption(
            current_user.0.user_id,
            consumption_id,
            &state.config.catalog,
            input,
        )
        .await?;
    Ok(Json(consumption))
}

/// Delete a consumption
pub async fn delete_consumption(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(consumption_id): Path<Uuid>,
) -> AppResult<Json<()>> {
    let service = ConsumptionService::new(state.db);
    service
        .delete_consumption(current_user.0.user_id, consumption_id)
        .await?;
    Ok(Json(()))
}
