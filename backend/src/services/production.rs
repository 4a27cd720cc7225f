//! Production run management service

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::models::ProductCatalog;
use shared::validation::{validate_positive_volume, validate_product_code};
use sqlx::PgPool;
use uuid::Uuid;

use super::reception::year_bounds;
use crate::error::{AppError, AppResult};

/// Production service for managing mill runs
#[derive(Clone)]
pub struct ProductionService {
    db: PgPool,
}

/// Production run record
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ProductionRun {
    pub id: Uuid,
    pub user_id: Uuid,
    pub production_date: NaiveDate,
    pub origin_product_code: String,
    pub origin_volume_m3: Decimal,
    pub destination_product_code: String,
    pub destination_volume_m3: Decimal,
    pub yield_factor: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for recording a production run
#[derive(Debug, Deserialize)]
pub struct CreateProductionInput {
    pub production_date: NaiveDate,
    pub origin_product_code: String,
    pub origin_volume_m3: Decimal,
    pub destination_product_code: String,
    pub destination_volume_m3: Decimal,
    pub yield_factor: Option<Decimal>,
}

/// Input for updating a production run
#[derive(Debug, Deserialize)]
pub struct UpdateProductionInput {
    pub production_date: Option<NaiveDate>,
    pub origin_product_code: Option<String>,
    pub origin_volume_m3: Option<Decimal>,
    pub destination_product_code: Option<String>,
    pub destination_volume_m3: Option<Decimal>,
    pub yield_factor: Option<Decimal>,
}

impl ProductionService {
    /// Create a new ProductionService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Get all production runs for a user, newest first
    pub async fn list_production_runs(&self, user_id: Uuid) -> AppResult<Vec<ProductionRun>> {
        let runs = sqlx::query_as::<_, ProductionRun>(
            r#"
            SELECT id, user_id, production_date, origin_product_code, origin_volume_m3,
                   destination_product_code, destination_volume_m3, yield_factor,
                   created_at, updated_at
            FROM production_runs
            WHERE user_id = $1
            ORDER BY production_date DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;

        Ok(runs)
    }

    /// Get production runs dated within a calendar year
    pub async fn list_production_runs_for_year(
        &self,
        user_id: Uuid,
        year: i32,
    ) -> AppResult<Vec<ProductionRun>> {
        let (start, end) = year_bounds(year)?;
        let runs = sqlx::query_as::<_, ProductionRun>(
            r#"
            SELECT id, user_id, production_date, origin_product_code, origin_volume_m3,
                   destination_product_code, destination_volume_m3, yield_factor,
                   created_at, updated_at
            FROM production_runs
            WHERE user_id = $1 AND production_date >= $2 AND production_date <= $3
            ORDER BY production_date
            "#,
        )
        .bind(user_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.db)
        .await?;

        Ok(runs)
    }

    /// Get a production run by ID
    pub async fn get_production_run(
        &self,
        user_id: Uuid,
        production_id: Uuid,
    ) -> AppResult<ProductionRun> {
        sqlx::query_as::<_, ProductionRun>(
            r#"
            SELECT id, user_id, production_date, origin_product_code, origin_volume_m3,
                   destination_product_code, destination_volume_m3, yield_factor,
                   created_at, updated_at
            FROM production_runs
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(production_id)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Production run".to_string()))
    }

    /// Record a new production run
    pub async fn create_production_run(
        &self,
        user_id: Uuid,
        catalog: &ProductCatalog,
        input: CreateProductionInput,
    ) -> AppResult<ProductionRun> {
        validate_production_fields(
            catalog,
            &input.origin_product_code,
            input.origin_volume_m3,
            &input.destination_product_code,
            input.destination_volume_m3,
            input.yield_factor,
        )?;

        let run = sqlx::query_as::<_, ProductionRun>(
            r#"
            INSERT INTO production_runs (user_id, production_date, origin_product_code,
                                         origin_volume_m3, destination_product_code,
                                         destination_volume_m3, yield_factor)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, user_id, production_date, origin_product_code, origin_volume_m3,
                      destination_product_code, destination_volume_m3, yield_factor,
                      created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(input.production_date)
        .bind(&input.origin_product_code)
        .bind(input.origin_volume_m3)
        .bind(&input.destination_product_code)
        .bind(input.destination_volume_m3)
        .bind(input.yield_factor)
        .fetch_one(&self.db)
        .await?;

        Ok(run)
    }

    /// Update a production run
    pub async fn update_production_run(
        &self,
        user_id: Uuid,
        production_id: Uuid,
        catalog: &ProductCatalog,
        input: UpdateProductionInput,
    ) -> AppResult<ProductionRun> {
        let existing = self.get_production_run(user_id, production_id).await?;

        let production_date = input.production_date.unwrap_or(existing.production_date);
        let origin_product_code = input
            .origin_product_code
            .unwrap_or(existing.origin_product_code);
        let origin_volume_m3 = input.origin_volume_m3.unwrap_or(existing.origin_volume_m3);
        let destination_product_code = input
            .destination_product_code
            .unwrap_or(existing.destination_product_code);
        let destination_volume_m3 = input
            .destination_volume_m3
            .unwrap_or(existing.destination_volume_m3);
        let yield_factor = input.yield_factor.or(existing.yield_factor);

        validate_production_fields(
            catalog,
            &origin_product_code,
            origin_volume_m3,
            &destination_product_code,
            destination_volume_m3,
            yield_factor,
        )?;

        let run = sqlx::query_as::<_, ProductionRun>(
            r#"
            UPDATE production_runs
            SET production_date = $1, origin_product_code = $2, origin_volume_m3 = $3,
                destination_product_code = $4, destination_volume_m3 = $5, yield_factor = $6,
                updated_at = NOW()
            WHERE id = $7 AND user_id = $8
            RETURNING id, user_id, production_date, origin_product_code, origin_volume_m3,
                      destination_product_code, destination_volume_m3, yield_factor,
                      created_at, updated_at
            "#,
        )
        .bind(production_date)
        .bind(&origin_product_code)
        .bind(origin_volume_m3)
        .bind(&destination_product_code)
        .bind(destination_volume_m3)
        .bind(yield_factor)
        .bind(production_id)
        .bind(user_id)
        .fetch_one(&self.db)
        .await?;

        Ok(run)
    }

    /// Delete a production run
    pub async fn delete_production_run(&self, user_id: Uuid, production_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM production_runs WHERE id = $1 AND user_id = $2")
            .bind(production_id)
            .bind(user_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Production run".to_string()));
        }
        Ok(())
    }
}

fn validate_production_fields(
    catalog: &ProductCatalog,
    origin_product_code: &str,
    origin_volume_m3: Decimal,
    destination_product_code: &str,
    destination_volume_m3: Decimal,
    yield_factor: Option<Decimal>,
) -> AppResult<()> {
    validate_product_code(catalog, origin_product_code).map_err(|msg| AppError::Validation {
        field: "origin_product_code".to_string(),
        message: msg.to_string(),
    })?;
    validate_product_code(catalog, destination_product_code).map_err(|msg| {
        AppError::Validation {
            field: "destination_product_code".to_string(),
            message: msg.to_string(),
        }
    })?;
    validate_positive_volume(origin_volume_m3).map_err(|msg| AppError::Validation {
        field: "origin_volume_m3".to_string(),
        message: msg.to_string(),
    })?;
    validate_positive_volume(destination_volume_m3).map_err(|msg| AppError::Validation {
        field: "destination_volume_m3".to_string(),
        message: msg.to_string(),
    })?;
    if let Some(factor) = yield_factor {
        if factor.is_sign_negative() {
            return Err(AppError::Validation {
                field: "yield_factor".to_string(),
                message: "yield factor must not be negative".to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_validate_production_fields_ok() {
        let catalog = ProductCatalog::default();
        assert!(validate_production_fields(
            &catalog,
            "W1.1",
            Decimal::from(50),
            "W5.2",
            Decimal::from(40),
            Some(Decimal::from_str("80").unwrap()),
        )
        .is_ok());
    }

    #[test]
    fn test_validate_production_fields_rejects_negative_yield() {
        let catalog = ProductCatalog::default();
        let err = validate_production_fields(
            &catalog,
            "W1.1",
            Decimal::from(50),
            "W5.2",
            Decimal::from(40),
            Some(Decimal::from_str("-5").unwrap()),
        );
        assert!(matches!(err, Err(AppError::Validation { field, .. }) if field == "yield_factor"));
    }
}
