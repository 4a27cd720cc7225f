//! Document processing orchestration
//!
//! Sends uploaded files to the external extraction service, converts
//! what comes back into typed movement records, and keeps a history of
//! every processing attempt. Extraction never writes movement rows; the
//! caller reviews the result and submits it through bulk ingestion.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use super::reception::CreateReceptionInput;
use super::sale::CreateSaleInput;
use crate::error::{AppError, AppResult};
use crate::external::document_processor::{
    DocumentProcessorClient, ExtractedReception, ExtractedSale,
};

/// Document processing service
#[derive(Clone)]
pub struct DocumentProcessingService {
    db: PgPool,
}

/// One processing attempt
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ProcessingHistoryEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub function_id: String,
    pub file_name: String,
    pub status: String,
    pub records_processed: i32,
    pub sheets_processed: i32,
    pub total_sheets: i32,
    pub errors: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Result of a processing run, ready for review and bulk ingestion
#[derive(Debug, Serialize)]
pub struct ProcessingOutcome {
    pub history_id: Uuid,
    pub records_processed: i32,
    pub sheets_processed: i32,
    pub total_sheets: i32,
    pub errors: Vec<String>,
    pub receptions: Vec<CreateReceptionInput>,
    pub sales: Vec<CreateSaleInput>,
    /// Raw statements from legacy extractor versions; submit through
    /// the statement ingestion endpoint
    pub insert_statements: Vec<String>,
}

impl DocumentProcessingService {
    /// Create a new DocumentProcessingService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Process an uploaded document through the external extractor
    pub async fn process_document(
        &self,
        client: &DocumentProcessorClient,
        user_id: Uuid,
        function_id: &str,
        file_name: &str,
        content_type: &str,
        file_bytes: Vec<u8>,
    ) -> AppResult<ProcessingOutcome> {
        if file_bytes.is_empty() {
            return Err(AppError::Validation {
                field: "file".to_string(),
                message: "file must not be empty".to_string(),
            });
        }

        let response = match client
            .process_document(function_id, user_id, file_name, content_type, file_bytes)
            .await
        {
            Ok(response) => response,
            Err(e) => {
                self.record_history(user_id, function_id, file_name, "failed", 0, 0, 0, &[
                    e.to_string(),
                ])
                .await?;
                return Err(e);
            }
        };

        let mut errors = response.errors.clone();

        let mut receptions = Vec::new();
        for record in response.reception_records {
            match convert_reception(record) {
                Ok(input) => receptions.push(input),
                Err(message) => errors.push(message),
            }
        }

        let mut sales = Vec::new();
        for record in response.sale_records {
            match convert_sale(record) {
                Ok(input) => sales.push(input),
                Err(message) => errors.push(message),
            }
        }

        let history_id = self
            .record_history(
                user_id,
                function_id,
                file_name,
                "completed",
                response.records_processed,
                response.sheets_processed,
                response.total_sheets,
                &errors,
            )
            .await?;

        Ok(ProcessingOutcome {
            history_id,
            records_processed: response.records_processed,
            sheets_processed: response.sheets_processed,
            total_sheets: response.total_sheets,
            errors,
            receptions,
            sales,
            insert_statements: response.insert_statements,
        })
    }

    /// List processing history for a user, newest first
    pub async fn list_history(&self, user_id: Uuid) -> AppResult<Vec<ProcessingHistoryEntry>> {
        let entries = sqlx::query_as::<_, ProcessingHistoryEntry>(
            r#"
            SELECT id, user_id, function_id, file_name, status, records_processed,
                   sheets_processed, total_sheets, errors, created_at
            FROM document_processing_history
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;

        Ok(entries)
    }

    #[allow(clippy::too_many_arguments)]
    async fn record_history(
        &self,
        user_id: Uuid,
        function_id: &str,
        file_name: &str,
        status: &str,
        records_processed: i32,
        sheets_processed: i32,
        total_sheets: i32,
        errors: &[String],
    ) -> AppResult<Uuid> {
        let errors_json = serde_json::to_value(errors)
            .map_err(|e| AppError::Internal(format!("History serialization failed: {}", e)))?;

        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO document_processing_history (user_id, function_id, file_name, status,
                                                     records_processed, sheets_processed,
                                                     total_sheets, errors)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(function_id)
        .bind(file_name)
        .bind(status)
        .bind(records_processed)
        .bind(sheets_processed)
        .bind(total_sheets)
        .bind(errors_json)
        .fetch_one(&self.db)
        .await?;

        Ok(id)
    }
}

fn convert_reception(record: ExtractedReception) -> Result<CreateReceptionInput, String> {
    Ok(CreateReceptionInput {
        reception_date: parse_date(&record.reception_date)?,
        product_code: record.product_code,
        supplier: record.supplier,
        guide_number: record.guide_number,
        volume_m3: parse_decimal(&record.volume_m3)?,
        certification: record.certification,
        landholding_rol: record.landholding_rol,
        origin: record.origin,
        commune: record.commune,
    })
}

fn convert_sale(record: ExtractedSale) -> Result<CreateSaleInput, String> {
    let unit_price = match record.unit_price {
        Some(value) => Some(parse_decimal(&value)?),
        None => None,
    };
    Ok(CreateSaleInput {
        sale_date: parse_date(&record.sale_date)?,
        product_code: record.product_code,
        customer: record.customer,
        invoice_number: record.invoice_number,
        volume_m3: parse_decimal(&record.volume_m3)?,
        certification: record.certification,
        unit_price,
    })
}

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| format!("extracted record has invalid date: {value}"))
}

fn parse_decimal(value: &str) -> Result<Decimal, String> {
    value
        .parse::<Decimal>()
        .map_err(|_| format!("extracted record has invalid number: {value}"))
}
