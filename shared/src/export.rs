//! Flattening of an annual balance into spreadsheet rows
//!
//! Produces the row layout of the yearly balance report: one section per
//! raw material, one per finished good, then the by-products. The backend
//! serializes these rows to CSV; this module stays format-agnostic.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::balance::{AnnualBalance, ProductBalance};
use crate::models::{ProductCatalog, ProductCategory};
use crate::types::{format_volume, MONTHS_PER_YEAR};

/// One report row: a concept, optional product and certification labels,
/// and twelve pre-formatted month cells
#[derive(Debug, Clone, Serialize)]
pub struct BalanceExportRow {
    pub concept: String,
    pub product: String,
    pub certification: String,
    pub months: [String; MONTHS_PER_YEAR],
}

impl BalanceExportRow {
    fn section(concept: String, product: String) -> Self {
        Self {
            concept,
            product,
            certification: String::new(),
            months: blank_months(),
        }
    }

    fn series(concept: &str, certification: &str, values: &[Decimal; MONTHS_PER_YEAR]) -> Self {
        Self {
            concept: concept.to_string(),
            product: String::new(),
            certification: certification.to_string(),
            months: values.map(format_volume),
        }
    }
}

fn blank_months() -> [String; MONTHS_PER_YEAR] {
    std::array::from_fn(|_| String::new())
}

fn yield_cells(factors: &[Option<Decimal>; MONTHS_PER_YEAR]) -> [String; MONTHS_PER_YEAR] {
    std::array::from_fn(|month| match factors[month] {
        Some(factor) => factor
            .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
            .normalize()
            .to_string(),
        None => String::new(),
    })
}

/// Certification labels to report for a product: catalog order first, then
/// any extra labels present in the data (already sorted by the BTreeMap)
fn certification_labels<'a>(
    catalog: &'a ProductCatalog,
    balance: &'a ProductBalance,
    sales: bool,
) -> Vec<&'a str> {
    let recorded = if sales {
        &balance.sales_by_certification
    } else {
        &balance.inflow_by_certification
    };
    let mut labels: Vec<&str> = catalog.certifications.iter().map(String::as_str).collect();
    for label in recorded.keys() {
        if !catalog.is_known_certification(label) {
            labels.push(label);
        }
    }
    labels
}

fn per_certification_rows(
    rows: &mut Vec<BalanceExportRow>,
    concept: &str,
    catalog: &ProductCatalog,
    balance: &ProductBalance,
    sales: bool,
) {
    let zero = [Decimal::ZERO; MONTHS_PER_YEAR];
    for label in certification_labels(catalog, balance, sales) {
        let series = if sales {
            balance.sales_by_certification.get(label)
        } else {
            balance.inflow_by_certification.get(label)
        }
        .unwrap_or(&zero);
        rows.push(BalanceExportRow::series(concept, label, series));
    }
}

/// Flatten a computed balance into report rows, in fixed section order
pub fn balance_to_rows(
    balance: &AnnualBalance,
    catalog: &ProductCatalog,
) -> Vec<BalanceExportRow> {
    let mut rows = Vec::new();

    for product in catalog.products_in(ProductCategory::RawMaterial) {
        let Some(series) = balance.product(&product.code) else {
            continue;
        };
        rows.push(BalanceExportRow::section(
            format!("RAW MATERIAL ({})", product.code),
            product.display_name.clone(),
        ));
        rows.push(BalanceExportRow::series("Opening stock", "", &series.opening));
        per_certification_rows(&mut rows, "Receptions", catalog, series, false);
        rows.push(BalanceExportRow::series("Closing stock", "", &series.closing));
        rows.push(BalanceExportRow::series("Consumption", "", &series.consumption));
    }

    for product in catalog.products_in(ProductCategory::FinishedGood) {
        let Some(series) = balance.product(&product.code) else {
            continue;
        };
        rows.push(BalanceExportRow::section(
            format!("FINISHED PRODUCT ({})", product.code),
            product.display_name.clone(),
        ));
        rows.push(BalanceExportRow::series("Production", "", &series.production));
        rows.push(BalanceExportRow {
            concept: "Yield factor".to_string(),
            product: String::new(),
            certification: "%".to_string(),
            months: yield_cells(&series.yield_factor),
        });
        per_certification_rows(&mut rows, "Sales", catalog, series, true);
        rows.push(BalanceExportRow::series("Opening stock", "", &series.opening));
        rows.push(BalanceExportRow::series("Closing stock", "", &series.closing));
    }

    let by_products: Vec<_> = catalog.products_in(ProductCategory::ByProduct).collect();
    if !by_products.is_empty() {
        rows.push(BalanceExportRow::section(
            "BY-PRODUCTS".to_string(),
            String::new(),
        ));
    }
    for product in by_products {
        let Some(series) = balance.product(&product.code) else {
            continue;
        };
        rows.push(BalanceExportRow::section(
            format!("{} ({})", product.display_name, product.code),
            String::new(),
        ));
        rows.push(BalanceExportRow::series("Production", "", &series.production));
        rows.push(BalanceExportRow {
            concept: "Yield factor".to_string(),
            product: String::new(),
            certification: "%".to_string(),
            months: yield_cells(&series.yield_factor),
        });
        per_certification_rows(&mut rows, "Sales", catalog, series, true);
    }

    rows
}
