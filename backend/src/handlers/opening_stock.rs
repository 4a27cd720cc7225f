//! HTTP handlers for opening stock endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::opening_stock::{OpeningStock, OpeningStockService, SetOpeningStockInput};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct OpeningStockQuery {
    pub year: i32,
}

/// List opening stocks for a year
pub async fn list_opening_stocks(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<OpeningStockQuery>,
) -> AppResult<Json<Vec<OpeningStock>>> {
    let service = OpeningStockService::new(state.db);
    let stocks = service
        .list_opening_stocks(current_user.0.user_id, query.year)
        .await?;
    Ok(Json(stocks))
}

/// Set an opening stock for a (year, month, product) slot
pub async fn set_opening_stock(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<SetOpeningStockInput>,
) -> AppResult<Json<OpeningStock>> {
    let service = OpeningStockService::new(state.db);
    let stock = service
        .set_opening_stock(current_user.0.user_id, &state.config.catalog, input)
        .await?;
    Ok(Json(stock))
}

/// Delete an opening stock
pub async fn delete_opening_stock(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(stock_id): Path<Uuid>,
) -> AppResult<Json<()>> {
    let service = OpeningStockService::new(state.db);
    service
        .delete_opening_stock(current_user.0.user_id, stock_id)
        .await?;
    Ok(Json(()))
}
