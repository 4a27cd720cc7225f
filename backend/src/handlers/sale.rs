//! HTTP handlers for sale endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::sale::{CreateSaleInput, Sale, SaleService, UpdateSaleInput};
use crate::AppState;

/// List all sales for the current user
pub async fn list_sales(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<Sale>>> {
    let service = SaleService::new(state.db);
    let sales = service.list_sales(current_user.0.user_id).await?;
    Ok(Json(sales))
}

/// Get a sale by ID
pub async fn get_sale(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(sale_id): Path<Uuid>,
) -> AppResult<Json<Sale>> {
    let service = SaleService::new(state.db);
    let sale = service.get_sale(current_user.0.user_id, sale_id).await?;
    Ok(Json(sale))
}

/// Record a new sale
pub async fn create_sale(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateSaleInput>,
) -> AppResult<Json<Sale>> {
    let service = SaleService::new(state.db);
    let sale = service
        .create_sale(current_user.0.user_id, &state.config.catalog, input)
        .await?;
    Ok(Json(sale))
}

/// Update a sale
pub async fn update_sale(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(sale_id): Path<Uuid>,
    Json(input): Json<UpdateSaleInput>,
) -> AppResult<Json<Sale>> {
    let service = SaleService::new(state.db);
    let sale = service
        .update_sale(current_user.0.user_id, sale_id, &state.config.catalog, input)
        .await?;
    Ok(Json(sale))
}

/// Delete a sale
pub async fn delete_sale(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(sale_id): Path<Uuid>,
) -> AppResult<Json<()>> {
    let service = SaleService::new(state.db);
    service.delete_sale(current_user.0.user_id, sale_id).await?;
    Ok(Json(()))
}
