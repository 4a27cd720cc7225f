//! Consumption management service for raw material fed into the mill

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::models::ProductCatalog;
use shared::validation::{validate_positive_volume, validate_product_code};
use sqlx::PgPool;
use uuid::Uuid;

use super::reception::year_bounds;
use crate::error::{AppError, AppResult};

/// Consumption service
#[derive(Clone)]
pub struct ConsumptionService {
    db: PgPool,
}

/// Consumption record
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Consumption {
    pub id: Uuid,
    pub user_id: Uuid,
    pub consumption_date: NaiveDate,
    pub product_code: String,
    pub volume_m3: Decimal,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for recording a consumption
#[derive(Debug, Deserialize)]
pub struct CreateConsumptionInput {
    pub consumption_date: NaiveDate,
    pub product_code: String,
    pub volume_m3: Decimal,
    pub notes: Option<String>,
}

/// Input for updating a consumption
#[derive(Debug, Deserialize)]
pub struct UpdateConsumptionInput {
    pub consumption_date: Option<NaiveDate>,
    pub product_code: Option<String>,
    pub volume_m3: Option<Decimal>,
    pub notes: Option<String>,
}

impl ConsumptionService {
    /// Create a new ConsumptionService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Get all consumptions for a user, newest first
    pub async fn list_consumptions(&self, user_id: Uuid) -> AppResult<Vec<Consumption>> {
        let consumptions = sqlx::query_as::<_, Consumption>(
            r#"
            SELECT id, user_id, consumption_date, product_code, volume_m3, notes,
                   created_at, updated_at
            FROM consumptions
            WHERE user_id = $1
            ORDER BY consumption_date DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;

        Ok(consumptions)
    }

    /// Get consumptions dated within a calendar year
    pub async fn list_consumptions_for_year(
        &self,
        user_id: Uuid,
        year: i32,
    ) -> AppResult<Vec<Consumption>> {
        let (start, end) = year_bounds(year)?;
        let consumptions = sqlx::query_as::<_, Consumption>(
            r#"
            SELECT id, user_id, consumption_date, product_code, volume_m3, notes,
                   created_at, updated_at
            FROM consumptions
            WHERE user_id = $1 AND consumption_date >= $2 AND consumption_date <= $3
            ORDER BY consumption_date
            "#,
        )
        .bind(user_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.db)
        .await?;

        Ok(consumptions)
    }

    /// Get a consumption by ID
    pub async fn get_consumption(
        &self,
        user_id: Uuid,
        consumption_id: Uuid,
    ) -> AppResult<Consumption> {
        sqlx::query_as::<_, Consumption>(
            r#"
            SELECT id, user_id, consumption_date, product_code, volume_m3, notes,
                   created_at, updated_at
            FROM consumptions
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(consumption_id)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Consumption".to_string()))
    }

    /// Record a new consumption
    pub async fn create_consumption(
        &self,
        user_id: Uuid,
        catalog: &ProductCatalog,
        input: CreateConsumptionInput,
    ) -> AppResult<Consumption> {
        validate_consumption_fields(catalog, &input.product_code, input.volume_m3)?;

        let consumption = sqlx::query_as::<_, Consumption>(
            r#"
            INSERT INTO consumptions (user_id, consumption_date, product_code, volume_m3, notes)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, consumption_date, product_code, volume_m3, notes,
                      created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(input.consumption_date)
        .bind(&input.product_code)
        .bind(input.volume_m3)
        .bind(&input.notes)
        .fetch_one(&self.db)
        .await?;

        Ok(consumption)
    }

    /// Update a consumption
    pub async fn update_consumption(
        &self,
        user_id: Uuid,
        consumption_id: Uuid,
        catalog: &ProductCatalog,
        input: UpdateConsumptionInput,
    ) -> AppResult<Consumption> {
        let existing = self.get_consumption(user_id, consumption_id).await?;

        let consumption_date = input.consumption_date.unwrap_or(existing.consumption_date);
        let product_code = input.product_code.unwrap_or(existing.product_code);
        let volume_m3 = input.volume_m3.unwrap_or(existing.volume_m3);
        let notes = input.notes.or(existing.notes);

        validate_consumption_fields(catalog, &product_code, volume_m3)?;

        let consumption = sqlx::query_as::<_, Consumption>(
            r#"
            UPDATE consumptions
            SET consumption_date = $1, product_code = $2, volume_m3 = $3, notes = $4,
                updated_at = NOW()
            WHERE id = $5 AND user_id = $6
            RETURNING id, user_id, consumption_date, product_code, volume_m3, notes,
                      created_at, updated_at
            "#,
        )
        .bind(consumption_date)
        .bind(&product_code)
        .bind(volume_m3)
        .bind(&notes)
        .bind(consumption_id)
        .bind(user_id)
        .fetch_one(&self.db)
        .await?;

        Ok(consumption)
    }

    /// Delete a consumption
    pub async fn delete_consumption(&self, user_id: Uuid, consumption_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM consumptions WHERE id = $1 AND user_id = $2")
            .bind(consumption_id)
            .bind(user_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Consumption".to_string()));
        }
        Ok(())
    }
}

fn validate_consumption_fields(
    catalog: &ProductCatalog,
    product_code: &str,
    volume_m3: Decimal,
) -> AppResult<()> {
    validate_product_code(catalog, product_code).map_err(|msg| AppError::Validation {
        field: "product_code".to_string(),
        message: msg.to_string(),
    })?;
    validate_positive_volume(volume_m3).map_err(|msg| AppError::Validation {
        field: "volume_m3".to_string(),
        message: msg.to_string(),
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_consumption_fields() {
        let catalog = ProductCatalog::default();
        assert!(validate_consumption_fields(&catalog, "W1.1", Decimal::from(30)).is_ok());
        assert!(validate_consumption_fields(&catalog, "W1.1", Decimal::ZERO).is_err());
        assert!(validate_consumption_fields(&catalog, "nope", Decimal::from(30)).is_err());
    }
}
