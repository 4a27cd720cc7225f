//! Annual balance service
//!
//! Loads one year of movements, feeds them through the aggregator and
//! serializes the result for the API and the CSV export.

use shared::balance::{compute_balance, AnnualBalance};
use shared::export::balance_to_rows;
use shared::models::{
    BalanceInput, ConsumptionEntry, OpeningStockEntry, ProductCatalog, ProductionEntry,
    ReceptionEntry, SaleEntry,
};
use shared::types::MONTH_LABELS;
use shared::validation::validate_year;
use sqlx::PgPool;
use uuid::Uuid;

use super::consumption::ConsumptionService;
use super::opening_stock::OpeningStockService;
use super::production::ProductionService;
use super::reception::ReceptionService;
use super::sale::SaleService;
use crate::error::{AppError, AppResult};

/// Balance service
#[derive(Clone)]
pub struct BalanceService {
    db: PgPool,
}

impl BalanceService {
    /// Create a new BalanceService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Load all movements for a year and build the aggregator input
    pub async fn load_year(&self, user_id: Uuid, year: i32) -> AppResult<BalanceInput> {
        validate_year(year).map_err(|msg| AppError::Validation {
            field: "year".to_string(),
            message: msg.to_string(),
        })?;

        let opening_stocks = OpeningStockService::new(self.db.clone())
            .list_opening_stocks(user_id, year)
            .await?;
        let receptions = ReceptionService::new(self.db.clone())
            .list_receptions_for_year(user_id, year)
            .await?;
        let consumptions = ConsumptionService::new(self.db.clone())
            .list_consumptions_for_year(user_id, year)
            .await?;
        let production_runs = ProductionService::new(self.db.clone())
            .list_production_runs_for_year(user_id, year)
            .await?;
        let sales = SaleService::new(self.db.clone())
            .list_sales_for_year(user_id, year)
            .await?;

        Ok(BalanceInput {
            opening_stocks: opening_stocks
                .into_iter()
                .map(|row| OpeningStockEntry {
                    month: u32::try_from(row.month).unwrap_or(0),
                    product_code: row.product_code,
                    volume_m3: row.volume_m3,
                })
                .collect(),
            receptions: receptions
                .into_iter()
                .map(|row| ReceptionEntry {
                    date: row.reception_date.to_string(),
                    product_code: row.product_code,
                    supplier: row.supplier,
                    volume_m3: row.volume_m3,
                    certification: row.certification,
                })
                .collect(),
            consumptions: consumptions
                .into_iter()
                .map(|row| ConsumptionEntry {
                    date: row.consumption_date.to_string(),
                    product_code: row.product_code,
                    volume_m3: row.volume_m3,
                })
                .collect(),
            production_runs: production_runs
                .into_iter()
                .map(|row| ProductionEntry {
                    date: row.production_date.to_string(),
                    origin_product_code: row.origin_product_code,
                    origin_volume_m3: row.origin_volume_m3,
                    destination_product_code: row.destination_product_code,
                    destination_volume_m3: row.destination_volume_m3,
                    yield_factor: row.yield_factor,
                })
                .collect(),
            sales: sales
                .into_iter()
                .map(|row| SaleEntry {
                    date: row.sale_date.to_string(),
                    product_code: row.product_code,
                    customer: row.customer,
                    invoice_number: row.invoice_number,
                    volume_m3: row.volume_m3,
                    certification: row.certification,
                    unit_price: row.unit_price,
                })
                .collect(),
        })
    }

    /// Compute the annual balance for a user
    pub async fn annual_balance(
        &self,
        user_id: Uuid,
        year: i32,
        catalog: &ProductCatalog,
    ) -> AppResult<AnnualBalance> {
        let input = self.load_year(user_id, year).await?;
        Ok(compute_balance(year, catalog, &input))
    }

    /// Export the annual balance as CSV, returning (filename, content)
    pub async fn export_csv(
        &self,
        user_id: Uuid,
        year: i32,
        catalog: &ProductCatalog,
        system_name: &str,
    ) -> AppResult<(String, Vec<u8>)> {
        let balance = self.annual_balance(user_id, year, catalog).await?;
        let rows = balance_to_rows(&balance, catalog);

        let mut writer = csv::Writer::from_writer(vec![]);

        let mut header = vec!["Concept", "Product", "Certification"];
        header.extend(MONTH_LABELS);
        writer
            .write_record(&header)
            .map_err(|e| AppError::Internal(format!("CSV write failed: {}", e)))?;

        for row in &rows {
            let mut record = vec![
                row.concept.as_str(),
                row.product.as_str(),
                row.certification.as_str(),
            ];
            record.extend(row.months.iter().map(String::as_str));
            writer
                .write_record(&record)
                .map_err(|e| AppError::Internal(format!("CSV write failed: {}", e)))?;
        }

        let content = writer
            .into_inner()
            .map_err(|e| AppError::Internal(format!("CSV write failed: {}", e)))?;

        let filename = format!("Balance_{}_{}.csv", system_name, year);
        Ok((filename, content))
    }
}
