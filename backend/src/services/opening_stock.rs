//! Opening stock management service
//!
//! Opening stocks are month-level overrides: when present, the balance
//! uses them instead of the carried-forward closing stock of the
//! previous month. One row per (year, month, product).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::models::ProductCatalog;
use shared::validation::{validate_month, validate_product_code, validate_volume, validate_year};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Opening stock service
#[derive(Clone)]
pub struct OpeningStockService {
    db: PgPool,
}

/// Opening stock record
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OpeningStock {
    pub id: Uuid,
    pub user_id: Uuid,
    pub year: i32,
    pub month: i32,
    pub product_code: String,
    pub volume_m3: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for setting an opening stock
#[derive(Debug, Deserialize)]
pub struct SetOpeningStockInput {
    pub year: i32,
    pub month: i32,
    pub product_code: String,
    pub volume_m3: Decimal,
}

impl OpeningStockService {
    /// Create a new OpeningStockService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Get all opening stocks for a user and year
    pub async fn list_opening_stocks(&self, user_id: Uuid, year: i32) -> AppResult<Vec<OpeningStock>> {
        let stocks = sqlx::query_as::<_, OpeningStock>(
            r#"
            SELECT id, user_id, year, month, product_code, volume_m3, created_at, updated_at
            FROM opening_stocks
            WHERE user_id = $1 AND year = $2
            ORDER BY month, product_code
            "#,
        )
        .bind(user_id)
        .bind(year)
        .fetch_all(&self.db)
        .await?;

        Ok(stocks)
    }

    /// Set the opening stock for a (year, month, product) slot.
    /// Replaces any existing value for the same slot.
    pub async fn set_opening_stock(
        &self,
        user_id: Uuid,
        catalog: &ProductCatalog,
        input: SetOpeningStockInput,
    ) -> AppResult<OpeningStock> {
        validate_year(input.year).map_err(|msg| AppError::Validation {
            field: "year".to_string(),
            message: msg.to_string(),
        })?;
        let month = u32::try_from(input.month).unwrap_or(0);
        validate_month(month).map_err(|msg| AppError::Validation {
            field: "month".to_string(),
            message: msg.to_string(),
        })?;
        validate_product_code(catalog, &input.product_code).map_err(|msg| {
            AppError::Validation {
                field: "product_code".to_string(),
                message: msg.to_string(),
            }
        })?;
        validate_volume(input.volume_m3).map_err(|msg| AppError::Validation {
            field: "volume_m3".to_string(),
            message: msg.to_string(),
        })?;

        let stock = sqlx::query_as::<_, OpeningStock>(
            r#"
            INSERT INTO opening_stocks (user_id, year, month, product_code, volume_m3)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id, year, month, product_code)
            DO UPDATE SET volume_m3 = EXCLUDED.volume_m3, updated_at = NOW()
            RETURNING id, user_id, year, month, product_code, volume_m3, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(input.year)
        .bind(input.month)
        .bind(&input.product_code)
        .bind(input.volume_m3)
        .fetch_one(&self.db)
        .await?;

        Ok(stock)
    }

    /// Delete an opening stock
    pub async fn delete_opening_stock(&self, user_id: Uuid, stock_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM opening_stocks WHERE id = $1 AND user_id = $2")
            .bind(stock_id)
            .bind(user_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Opening stock".to_string()));
        }
        Ok(())
    }
}
