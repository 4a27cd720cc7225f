//! Annual report export tests
//!
//! Tests the flattened spreadsheet layout over a full year of activity:
//! section ordering, per-certification rows, cell formatting, and the
//! by-products block.

use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;

use shared::balance::compute_balance;
use shared::export::{balance_to_rows, BalanceExportRow};
use shared::models::{
    BalanceInput, ConsumptionEntry, OpeningStockEntry, ProductCatalog, ProductionEntry,
    ReceptionEntry, SaleEntry,
};
use shared::types::{format_volume, month_label, MONTHS_PER_YEAR};

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

/// A year with activity in several months across all three product kinds
fn full_year_rows() -> Vec<BalanceExportRow> {
    let catalog = ProductCatalog::default();
    let input = BalanceInput {
        opening_stocks: vec![OpeningStockEntry {
            month: 1,
            product_code: "W1.1".to_string(),
            volume_m3: dec("200"),
        }],
        receptions: vec![
            ReceptionEntry {
                date: "2025-01-08".to_string(),
                product_code: "W1.1".to_string(),
                supplier: "Forestal Sur".to_string(),
                volume_m3: dec("120.5"),
                certification: "FSC 100%".to_string(),
            },
            ReceptionEntry {
                date: "2025-04-12".to_string(),
                product_code: "W1.1".to_string(),
                supplier: "Forestal Andes".to_string(),
                volume_m3: dec("80"),
                certification: "Material Controlado".to_string(),
            },
        ],
        consumptions: vec![
            ConsumptionEntry {
                date: "2025-01-15".to_string(),
                product_code: "W1.1".to_string(),
                volume_m3: dec("100"),
            },
            ConsumptionEntry {
                date: "2025-04-18".to_string(),
                product_code: "W1.1".to_string(),
                volume_m3: dec("60"),
            },
        ],
        production_runs: vec![ProductionEntry {
            date: "2025-01-16".to_string(),
            origin_product_code: "W1.1".to_string(),
            origin_volume_m3: dec("100"),
            destination_product_code: "W5.2".to_string(),
            destination_volume_m3: dec("52"),
            yield_factor: None,
        }],
        sales: vec![
            SaleEntry {
                date: "2025-02-03".to_string(),
                product_code: "W5.2".to_string(),
                customer: "Maderas Centro".to_string(),
                invoice_number: "F-2001".to_string(),
                volume_m3: dec("40"),
                certification: "FSC 100%".to_string(),
                unit_price: Some(dec("185.00")),
            },
            SaleEntry {
                date: "2025-01-25".to_string(),
                product_code: "W3.2".to_string(),
                customer: "Tableros BioBio".to_string(),
                invoice_number: "F-2002".to_string(),
                volume_m3: dec("18"),
                certification: "FSC Mixto".to_string(),
                unit_price: None,
            },
        ],
        ..Default::default()
    };
    let balance = compute_balance(2025, &catalog, &input);
    assert!(balance.row_errors.is_empty());
    balance_to_rows(&balance, &catalog)
}

fn find<'a>(
    rows: &'a [BalanceExportRow],
    concept: &str,
    certification: &str,
) -> &'a BalanceExportRow {
    rows.iter()
        .find(|r| r.concept == concept && r.certification == certification)
        .unwrap()
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_every_catalog_product_has_a_section() {
        let rows = full_year_rows();
        let concepts: Vec<&str> = rows.iter().map(|r| r.concept.as_str()).collect();
        assert!(concepts.contains(&"RAW MATERIAL (W1.1)"));
        assert!(concepts.contains(&"FINISHED PRODUCT (W5.2)"));
        assert!(concepts.contains(&"BY-PRODUCTS"));
        assert!(concepts.contains(&"Wood chips (W3.1)"));
        assert!(concepts.contains(&"Sawdust (W3.2)"));
    }

    #[test]
    fn test_raw_material_cells() {
        let rows = full_year_rows();
        let opening = find(&rows, "Opening stock", "");
        assert_eq!(opening.months[0], "200");
        // January closing 220.5 carries into February
        assert_eq!(opening.months[1], "220.5");

        let fsc = find(&rows, "Receptions", "FSC 100%");
        assert_eq!(fsc.months[0], "120.5");
        assert_eq!(fsc.months[3], "");

        let controlado = find(&rows, "Receptions", "Material Controlado");
        assert_eq!(controlado.months[3], "80");
    }

    #[test]
    fn test_finished_product_cells() {
        let rows = full_year_rows();
        let finished_pos = rows
            .iter()
            .position(|r| r.concept == "FINISHED PRODUCT (W5.2)")
            .unwrap();
        let production = &rows[finished_pos + 1];
        assert_eq!(production.concept, "Production");
        assert_eq!(production.months[0], "52");

        let yield_row = &rows[finished_pos + 2];
        assert_eq!(yield_row.concept, "Yield factor");
        assert_eq!(yield_row.certification, "%");
        assert_eq!(yield_row.months[0], "52");
        // No consumption in February, so no factor
        assert_eq!(yield_row.months[1], "");
    }

    #[test]
    fn test_finished_stock_rows_follow_sales() {
        let rows = full_year_rows();
        let finished_pos = rows
            .iter()
            .position(|r| r.concept == "FINISHED PRODUCT (W5.2)")
            .unwrap();
        let section = &rows[finished_pos..];
        let closing = section
            .iter()
            .find(|r| r.concept == "Closing stock")
            .unwrap();
        // 52 produced in January, 40 sold in February
        assert_eq!(closing.months[0], "52");
        assert_eq!(closing.months[1], "12");
    }

    #[test]
    fn test_by_product_production_mirrors_sales() {
        let rows = full_year_rows();
        let sawdust_pos = rows
            .iter()
            .position(|r| r.concept == "Sawdust (W3.2)")
            .unwrap();
        let production = &rows[sawdust_pos + 1];
        assert_eq!(production.concept, "Production");
        assert_eq!(production.months[0], "18");
        // 18 over 100 consumed in January
        assert_eq!(rows[sawdust_pos + 2].months[0], "18");
    }

    #[test]
    fn test_section_rows_have_blank_cells() {
        let rows = full_year_rows();
        let header = rows
            .iter()
            .find(|r| r.concept == "RAW MATERIAL (W1.1)")
            .unwrap();
        assert_eq!(header.product, "Sawlogs");
        assert!(header.months.iter().all(String::is_empty));
    }

    #[test]
    fn test_month_labels_are_english() {
        assert_eq!(month_label(0), Some("January"));
        assert_eq!(month_label(11), Some("December"));
        assert_eq!(month_label(12), None);
    }

    #[test]
    fn test_volume_formatting() {
        assert_eq!(format_volume(dec("0")), "");
        assert_eq!(format_volume(dec("120.50")), "120.5");
        assert_eq!(format_volume(dec("80.00")), "80");
        assert_eq!(format_volume(dec("33.33")), "33.3");
    }
}

// ============================================================================
// Property Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn arb_volume() -> impl Strategy<Value = Decimal> {
        (0u32..1_000_000).prop_map(|thousandths| Decimal::new(thousandths as i64, 3))
    }

    proptest! {
        /// Property: every row carries exactly twelve month cells and each
        /// cell is either blank or a number with at most one decimal
        #[test]
        fn prop_cells_are_blank_or_short_numbers(
            volumes in prop::collection::vec((1u32..=12, arb_volume()), 1..15),
        ) {
            let catalog = ProductCatalog::default();
            let input = BalanceInput {
                receptions: volumes
                    .iter()
                    .map(|(month, volume)| ReceptionEntry {
                        date: format!("2025-{:02}-10", month),
                        product_code: "W1.1".to_string(),
                        supplier: "Forestal Sur".to_string(),
                        volume_m3: *volume,
                        certification: "FSC 100%".to_string(),
                    })
                    .collect(),
                ..Default::default()
            };
            let balance = compute_balance(2025, &catalog, &input);
            let rows = balance_to_rows(&balance, &catalog);

            for row in &rows {
                prop_assert_eq!(row.months.len(), MONTHS_PER_YEAR);
                for cell in &row.months {
                    if cell.is_empty() {
                        continue;
                    }
                    let value = Decimal::from_str(cell).unwrap();
                    prop_assert!(value >= Decimal::ZERO);
                    let decimals = cell.split('.').nth(1).map_or(0, str::len);
                    prop_assert!(decimals <= 1);
                }
            }
        }
    }
}
