//! HTTP handlers for the annual balance and its export

use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    Json,
};
use shared::balance::AnnualBalance;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::balance::BalanceService;
use crate::AppState;

/// Compute the annual balance for a year
pub async fn get_annual_balance(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(year): Path<i32>,
) -> AppResult<Json<AnnualBalance>> {
    let service = BalanceService::new(state.db);
    let balance = service
        .annual_balance(current_user.0.user_id, year, &state.config.catalog)
        .await?;
    Ok(Json(balance))
}

/// Export the annual balance as a CSV attachment
pub async fn export_annual_balance(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(year): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let service = BalanceService::new(state.db);
    let (filename, content) = service
        .export_csv(
            current_user.0.user_id,
            year,
            &state.config.catalog,
            &state.config.export.system_name,
        )
        .await?;

    let headers = [
        (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        ),
    ];
    Ok((headers, content))
}
