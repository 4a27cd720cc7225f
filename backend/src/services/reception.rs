//! Reception management service for raw material arrivals

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::models::ProductCatalog;
use shared::validation::{validate_certification, validate_positive_volume, validate_product_code};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Reception service for managing raw material arrivals
#[derive(Clone)]
pub struct ReceptionService {
    db: PgPool,
}

/// Reception record
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Reception {
    pub id: Uuid,
    pub user_id: Uuid,
    pub reception_date: NaiveDate,
    pub product_code: String,
    pub supplier: String,
    pub guide_number: String,
    pub volume_m3: Decimal,
    pub certification: String,
    pub landholding_rol: Option<String>,
    pub origin: Option<String>,
    pub commune: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for recording a reception
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateReceptionInput {
    pub reception_date: NaiveDate,
    pub product_code: String,
    pub supplier: String,
    pub guide_number: String,
    pub volume_m3: Decimal,
    pub certification: String,
    pub landholding_rol: Option<String>,
    pub origin: Option<String>,
    pub commune: Option<String>,
}

/// Input for updating a reception
#[derive(Debug, Deserialize)]
pub struct UpdateReceptionInput {
    pub reception_date: Option<NaiveDate>,
    pub product_code: Option<String>,
    pub supplier: Option<String>,
    pub guide_number: Option<String>,
    pub volume_m3: Option<Decimal>,
    pub certification: Option<String>,
    pub landholding_rol: Option<String>,
    pub origin: Option<String>,
    pub commune: Option<String>,
}

impl ReceptionService {
    /// Create a new ReceptionService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Get all receptions for a user, newest first
    pub async fn list_receptions(&self, user_id: Uuid) -> AppResult<Vec<Reception>> {
        let receptions = sqlx::query_as::<_, Reception>(
            r#"
            SELECT id, user_id, reception_date, product_code, supplier, guide_number,
                   volume_m3, certification, landholding_rol, origin, commune,
                   created_at, updated_at
            FROM receptions
            WHERE user_id = $1
            ORDER BY reception_date DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;

        Ok(receptions)
    }

    /// Get receptions dated within a calendar year
    pub async fn list_receptions_for_year(
        &self,
        user_id: Uuid,
        year: i32,
    ) -> AppResult<Vec<Reception>> {
        let (start, end) = year_bounds(year)?;
        let receptions = sqlx::query_as::<_, Reception>(
            r#"
            SELECT id, user_id, reception_date, product_code, supplier, guide_number,
                   volume_m3, certification, landholding_rol, origin, commune,
                   created_at, updated_at
            FROM receptions
            WHERE user_id = $1 AND reception_date >= $2 AND reception_date <= $3
            ORDER BY reception_date
            "#,
        )
        .bind(user_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.db)
        .await?;

        Ok(receptions)
    }

    /// Get a reception by ID
    pub async fn get_reception(&self, user_id: Uuid, reception_id: Uuid) -> AppResult<Reception> {
        sqlx::query_as::<_, Reception>(
            r#"
            SELECT id, user_id, reception_date, product_code, supplier, guide_number,
                   volume_m3, certification, landholding_rol, origin, commune,
                   created_at, updated_at
            FROM receptions
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(reception_id)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Reception".to_string()))
    }

    /// Record a new reception
    pub async fn create_reception(
        &self,
        user_id: Uuid,
        catalog: &ProductCatalog,
        input: CreateReceptionInput,
    ) -> AppResult<Reception> {
        validate_reception_fields(
            catalog,
            &input.product_code,
            &input.certification,
            input.volume_m3,
        )?;

        let reception = sqlx::query_as::<_, Reception>(
            r#"
            INSERT INTO receptions (user_id, reception_date, product_code, supplier,
                                    guide_number, volume_m3, certification, landholding_rol,
                                    origin, commune)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id, user_id, reception_date, product_code, supplier, guide_number,
                      volume_m3, certification, landholding_rol, origin, commune,
                      created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(input.reception_date)
        .bind(&input.product_code)
        .bind(&input.supplier)
        .bind(&input.guide_number)
        .bind(input.volume_m3)
        .bind(&input.certification)
        .bind(&input.landholding_rol)
        .bind(&input.origin)
        .bind(&input.commune)
        .fetch_one(&self.db)
        .await?;

        Ok(reception)
    }

    /// Update a reception
    pub async fn update_reception(
        &self,
        user_id: Uuid,
        reception_id: Uuid,
        catalog: &ProductCatalog,
        input: UpdateReceptionInput,
    ) -> AppResult<Reception> {
        let existing = self.get_reception(user_id, reception_id).await?;

        let reception_date = input.reception_date.unwrap_or(existing.reception_date);
        let product_code = input.product_code.unwrap_or(existing.product_code);
        let supplier = input.supplier.unwrap_or(existing.supplier);
        let guide_number = input.guide_number.unwrap_or(existing.guide_number);
        let volume_m3 = input.volume_m3.unwrap_or(existing.volume_m3);
        let certification = input.certification.unwrap_or(existing.certification);
        let landholding_rol = input.landholding_rol.or(existing.landholding_rol);
        let origin = input.origin.or(existing.origin);
        let commune = input.commune.or(existing.commune);

        validate_reception_fields(catalog, &product_code, &certification, volume_m3)?;

        let reception = sqlx::query_as::<_, Reception>(
            r#"
            UPDATE receptions
            SET reception_date = $1, product_code = $2, supplier = $3, guide_number = $4,
                volume_m3 = $5, certification = $6, landholding_rol = $7, origin = $8,
                commune = $9, updated_at = NOW()
            WHERE id = $10 AND user_id = $11
            RETURNING id, user_id, reception_date, product_code, supplier, guide_number,
                      volume_m3, certification, landholding_rol, origin, commune,
                      created_at, updated_at
            "#,
        )
        .bind(reception_date)
        .bind(&product_code)
        .bind(&supplier)
        .bind(&guide_number)
        .bind(volume_m3)
        .bind(&certification)
        .bind(&landholding_rol)
        .bind(&origin)
        .bind(&commune)
        .bind(reception_id)
        .bind(user_id)
        .fetch_one(&self.db)
        .await?;

        Ok(reception)
    }

    /// Delete a reception
    pub async fn delete_reception(&self, user_id: Uuid, reception_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM receptions WHERE id = $1 AND user_id = $2")
            .bind(reception_id)
            .bind(user_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Reception".to_string()));
        }
        Ok(())
    }
}

fn validate_reception_fields(
    catalog: &ProductCatalog,
    product_code: &str,
    certification: &str,
    volume_m3: Decimal,
) -> AppResult<()> {
    validate_product_code(catalog, product_code).map_err(|msg| AppError::Validation {
        field: "product_code".to_string(),
        message: msg.to_string(),
    })?;
    validate_certification(catalog, certification).map_err(|msg| AppError::Validation {
        field: "certification".to_string(),
        message: msg.to_string(),
    })?;
    validate_positive_volume(volume_m3).map_err(|msg| AppError::Validation {
        field: "volume_m3".to_string(),
        message: msg.to_string(),
    })?;
    Ok(())
}

/// First and last day of a calendar year
pub(crate) fn year_bounds(year: i32) -> AppResult<(NaiveDate, NaiveDate)> {
    let start = NaiveDate::from_ymd_opt(year, 1, 1);
    let end = NaiveDate::from_ymd_opt(year, 12, 31);
    match (start, end) {
        (Some(start), Some(end)) => Ok((start, end)),
        _ => Err(AppError::ValidationError(format!("invalid year: {year}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_validate_reception_fields_ok() {
        let catalog = ProductCatalog::default();
        assert!(validate_reception_fields(
            &catalog,
            "W1.1",
            "FSC 100%",
            Decimal::from_str("25.5").unwrap()
        )
        .is_ok());
    }

    #[test]
    fn test_validate_reception_fields_rejects_unknown_product() {
        let catalog = ProductCatalog::default();
        let err = validate_reception_fields(&catalog, "Z9.9", "FSC 100%", Decimal::from(10));
        assert!(matches!(err, Err(AppError::Validation { field, .. }) if field == "product_code"));
    }

    #[test]
    fn test_validate_reception_fields_rejects_zero_volume() {
        let catalog = ProductCatalog::default();
        let err = validate_reception_fields(&catalog, "W1.1", "FSC Mixto", Decimal::ZERO);
        assert!(matches!(err, Err(AppError::Validation { field, .. }) if field == "volume_m3"));
    }

    #[test]
    fn test_year_bounds() {
        let (start, end) = year_bounds(2025).unwrap();
        assert_eq!(start, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2025, 12, 31).unwrap());
    }
}
