//! Aggregator input rows
//!
//! These are the flat movement records the balance aggregator consumes.
//! Dates travel as ISO-8601 strings so month bucketing can read the
//! calendar date directly, independent of any timezone the persistence
//! layer or a client may have attached.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Explicit opening stock for a product in a given month (1-12).
/// Overrides the carried-forward closing stock of the previous month.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpeningStockEntry {
    pub month: u32,
    pub product_code: String,
    pub volume_m3: Decimal,
}

/// Raw material received from a supplier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceptionEntry {
    pub date: String,
    pub product_code: String,
    pub supplier: String,
    pub volume_m3: Decimal,
    pub certification: String,
}

/// Raw material fed into the mill
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsumptionEntry {
    pub date: String,
    pub product_code: String,
    pub volume_m3: Decimal,
}

/// A production run converting raw material into a product
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductionEntry {
    pub date: String,
    pub origin_product_code: String,
    pub origin_volume_m3: Decimal,
    pub destination_product_code: String,
    pub destination_volume_m3: Decimal,
    /// Yield declared on the run itself; preferred over the derived one
    pub yield_factor: Option<Decimal>,
}

/// Product sold to a customer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleEntry {
    pub date: String,
    pub product_code: String,
    pub customer: String,
    pub invoice_number: String,
    pub volume_m3: Decimal,
    pub certification: String,
    pub unit_price: Option<Decimal>,
}

/// Everything the aggregator needs for one balance year
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BalanceInput {
    pub opening_stocks: Vec<OpeningStockEntry>,
    pub receptions: Vec<ReceptionEntry>,
    pub consumptions: Vec<ConsumptionEntry>,
    pub production_runs: Vec<ProductionEntry>,
    pub sales: Vec<SaleEntry>,
}
