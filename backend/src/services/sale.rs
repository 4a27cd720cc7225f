//! Sale management service

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::models::ProductCatalog;
use shared::validation::{
    validate_certification, validate_positive_volume, validate_product_code, validate_required,
};
use sqlx::PgPool;
use uuid::Uuid;

use super::reception::year_bounds;
use crate::error::{AppError, AppResult};

/// Sale service for managing outgoing product
#[derive(Clone)]
pub struct SaleService {
    db: PgPool,
}

/// Sale record
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Sale {
    pub id: Uuid,
    pub user_id: Uuid,
    pub sale_date: NaiveDate,
    pub product_code: String,
    pub customer: String,
    pub invoice_number: String,
    pub volume_m3: Decimal,
    pub certification: String,
    pub unit_price: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for recording a sale
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateSaleInput {
    pub sale_date: NaiveDate,
    pub product_code: String,
    pub customer: String,
    pub invoice_number: String,
    pub volume_m3: Decimal,
    pub certification: String,
    pub unit_price: Option<Decimal>,
}

/// Input for updating a sale
#[derive(Debug, Deserialize)]
pub struct UpdateSaleInput {
    pub sale_date: Option<NaiveDate>,
    pub product_code: Option<String>,
    pub customer: Option<String>,
    pub invoice_number: Option<String>,
    pub volume_m3: Option<Decimal>,
    pub certification: Option<String>,
    pub unit_price: Option<Decimal>,
}

impl SaleService {
    /// Create a new SaleService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Get all sales for a user, newest first
    pub async fn list_sales(&self, user_id: Uuid) -> AppResult<Vec<Sale>> {
        let sales = sqlx::query_as::<_, Sale>(
            r#"
            SELECT id, user_id, sale_date, product_code, customer, invoice_number,
                   volume_m3, certification, unit_price, created_at, updated_at
            FROM sales
            WHERE user_id = $1
            ORDER BY sale_date DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;

        Ok(sales)
    }

    /// Get sales dated within a calendar year
    pub async fn list_sales_for_year(&self, user_id: Uuid, year: i32) -> AppResult<Vec<Sale>> {
        let (start, end) = year_bounds(year)?;
        let sales = sqlx::query_as::<_, Sale>(
            r#"
            SELECT id, user_id, sale_date, product_code, customer, invoice_number,
                   volume_m3, certification, unit_price, created_at, updated_at
            FROM sales
            WHERE user_id = $1 AND sale_date >= $2 AND sale_date <= $3
            ORDER BY sale_date
            "#,
        )
        .bind(user_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.db)
        .await?;

        Ok(sales)
    }

    /// Get a sale by ID
    pub async fn get_sale(&self, user_id: Uuid, sale_id: Uuid) -> AppResult<Sale> {
        sqlx::query_as::<_, Sale>(
            r#"
            SELECT id, user_id, sale_date, product_code, customer, invoice_number,
                   volume_m3, certification, unit_price, created_at, updated_at
            FROM sales
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(sale_id)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Sale".to_string()))
    }

    /// Record a new sale
    pub async fn create_sale(
        &self,
        user_id: Uuid,
        catalog: &ProductCatalog,
        input: CreateSaleInput,
    ) -> AppResult<Sale> {
        validate_sale_fields(
            catalog,
            &input.product_code,
            &input.certification,
            &input.invoice_number,
            input.volume_m3,
        )?;

        let sale = sqlx::query_as::<_, Sale>(
            r#"
            INSERT INTO sales (user_id, sale_date, product_code, customer, invoice_number,
                               volume_m3, certification, unit_price)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, user_id, sale_date, product_code, customer, invoice_number,
                      volume_m3, certification, unit_price, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(input.sale_date)
        .bind(&input.product_code)
        .bind(&input.customer)
        .bind(&input.invoice_number)
        .bind(input.volume_m3)
        .bind(&input.certification)
        .bind(input.unit_price)
        .fetch_one(&self.db)
        .await?;

        Ok(sale)
    }

    /// Update a sale
    pub async fn update_sale(
        &self,
        user_id: Uuid,
        sale_id: Uuid,
        catalog: &ProductCatalog,
        input: UpdateSaleInput,
    ) -> AppResult<Sale> {
        let existing = self.get_sale(user_id, sale_id).await?;

        let sale_date = input.sale_date.unwrap_or(existing.sale_date);
        let product_code = input.product_code.unwrap_or(existing.product_code);
        let customer = input.customer.unwrap_or(existing.customer);
        let invoice_number = input.invoice_number.unwrap_or(existing.invoice_number);
        let volume_m3 = input.volume_m3.unwrap_or(existing.volume_m3);
        let certification = input.certification.unwrap_or(existing.certification);
        let unit_price = input.unit_price.or(existing.unit_price);

        validate_sale_fields(
            catalog,
            &product_code,
            &certification,
            &invoice_number,
            volume_m3,
        )?;

        let sale = sqlx::query_as::<_, Sale>(
            r#"
            UPDATE sales
            SET sale_date = $1, product_code = $2, customer = $3, invoice_number = $4,
                volume_m3 = $5, certification = $6, unit_price = $7, updated_at = NOW()
            WHERE id = $8 AND user_id = $9
            RETURNING id, user_id, sale_date, product_code, customer, invoice_number,
                      volume_m3, certification, unit_price, created_at, updated_at
            "#,
        )
        .bind(sale_date)
        .bind(&product_code)
        .bind(&customer)
        .bind(&invoice_number)
        .bind(volume_m3)
        .bind(&certification)
        .bind(unit_price)
        .bind(sale_id)
        .bind(user_id)
        .fetch_one(&self.db)
        .await?;

        Ok(sale)
    }

    /// Delete a sale
    pub async fn delete_sale(&self, user_id: Uuid, sale_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM sales WHERE id = $1 AND user_id = $2")
            .bind(sale_id)
            .bind(user_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Sale".to_string()));
        }
        Ok(())
    }
}

fn validate_sale_fields(
    catalog: &ProductCatalog,
    product_code: &str,
    certification: &str,
    invoice_number: &str,
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
    validate_required(invoice_number).map_err(|msg| AppError::Validation {
        field: "invoice_number".to_string(),
        message: msg.to_string(),
    })?;
    validate_positive_volume(volume_m3).map_err(|msg| AppError::Validation {
        field: "volume_m3".to_string(),
        message: msg.to_string(),
    })?;
    Ok(())
}
