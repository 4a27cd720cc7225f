//! Annual balance tests
//!
//! Tests for the monthly material balance including:
//! - Stock carry-forward and explicit opening overrides
//! - Yield factor derivation
//! - By-product handling
//! - Per-row error reporting
//! - Order independence of the aggregation

use proptest::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;

use shared::balance::{compute_balance, EntryKind};
use shared::models::{
    BalanceInput, ConsumptionEntry, OpeningStockEntry, ProductCatalog, ProductionEntry,
    ReceptionEntry, SaleEntry,
};

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn reception(date: &str, volume: &str, certification: &str) -> ReceptionEntry {
    ReceptionEntry {
        date: date.to_string(),
        product_code: "W1.1".to_string(),
        supplier: "Forestal Sur".to_string(),
        volume_m3: dec(volume),
        certification: certification.to_string(),
    }
}

fn consumption(date: &str, volume: &str) -> ConsumptionEntry {
    ConsumptionEntry {
        date: date.to_string(),
        product_code: "W1.1".to_string(),
        volume_m3: dec(volume),
    }
}

fn production(date: &str, origin: &str, destination: &str) -> ProductionEntry {
    ProductionEntry {
        date: date.to_string(),
        origin_product_code: "W1.1".to_string(),
        origin_volume_m3: dec(origin),
        destination_product_code: "W5.2".to_string(),
        destination_volume_m3: dec(destination),
        yield_factor: None,
    }
}

fn sale(date: &str, code: &str, volume: &str, certification: &str) -> SaleEntry {
    SaleEntry {
        date: date.to_string(),
        product_code: code.to_string(),
        customer: "Maderas Centro".to_string(),
        invoice_number: "F-1001".to_string(),
        volume_m3: dec(volume),
        certification: certification.to_string(),
        unit_price: None,
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// Opening 100 + receptions 50 - consumption 30 closes at 120,
    /// and February opens with January's closing
    #[test]
    fn test_raw_material_monthly_equation() {
        let input = BalanceInput {
            opening_stocks: vec![OpeningStockEntry {
                month: 1,
                product_code: "W1.1".to_string(),
                volume_m3: dec("100"),
            }],
            receptions: vec![reception("2025-01-10", "50", "FSC 100%")],
            consumptions: vec![consumption("2025-01-20", "30")],
            ..Default::default()
        };
        let result = compute_balance(2025, &ProductCatalog::default(), &input);
        let raw = result.product("W1.1").unwrap();

        assert_eq!(raw.opening[0], dec("100"));
        assert_eq!(raw.closing[0], dec("120"));
        assert_eq!(raw.opening[1], dec("120"));
        assert!(result.row_errors.is_empty());
    }

    /// A quiet month carries stock through unchanged until December
    #[test]
    fn test_carry_forward_through_quiet_months() {
        let input = BalanceInput {
            opening_stocks: vec![OpeningStockEntry {
                month: 2,
                product_code: "W1.1".to_string(),
                volume_m3: dec("75"),
            }],
            ..Default::default()
        };
        let result = compute_balance(2025, &ProductCatalog::default(), &input);
        let raw = result.product("W1.1").unwrap();

        assert_eq!(raw.opening[0], Decimal::ZERO);
        for month in 1..12 {
            assert_eq!(raw.opening[month], dec("75"));
            assert_eq!(raw.closing[month], dec("75"));
        }
    }

    /// An explicit opening stock beats the carried-forward closing
    #[test]
    fn test_explicit_opening_overrides_carry() {
        let input = BalanceInput {
            opening_stocks: vec![
                OpeningStockEntry {
                    month: 1,
                    product_code: "W1.1".to_string(),
                    volume_m3: dec("100"),
                },
                OpeningStockEntry {
                    month: 4,
                    product_code: "W1.1".to_string(),
                    volume_m3: dec("10"),
                },
            ],
            ..Default::default()
        };
        let result = compute_balance(2025, &ProductCatalog::default(), &input);
        let raw = result.product("W1.1").unwrap();

        assert_eq!(raw.opening[2], dec("100"));
        assert_eq!(raw.opening[3], dec("10"));
        assert_eq!(raw.closing[11], dec("10"));
    }

    /// Production 40 against consumption 50 derives an 80% yield
    #[test]
    fn test_finished_good_yield_derivation() {
        let input = BalanceInput {
            consumptions: vec![consumption("2025-02-05", "50")],
            production_runs: vec![production("2025-02-06", "50", "40")],
            ..Default::default()
        };
        let result = compute_balance(2025, &ProductCatalog::default(), &input);
        let finished = result.product("W5.2").unwrap();

        assert_eq!(finished.production[1], dec("40"));
        assert_eq!(finished.yield_factor[1], Some(dec("80")));
    }

    /// A yield factor declared on the run wins over the derived one
    #[test]
    fn test_declared_yield_factor_preferred() {
        let input = BalanceInput {
            consumptions: vec![consumption("2025-02-05", "50")],
            production_runs: vec![ProductionEntry {
                yield_factor: Some(dec("78.5")),
                ..production("2025-02-06", "50", "40")
            }],
            ..Default::default()
        };
        let result = compute_balance(2025, &ProductCatalog::default(), &input);
        let finished = result.product("W5.2").unwrap();

        assert_eq!(finished.yield_factor[1], Some(dec("78.5")));
    }

    /// Months without consumption carry no yield factor
    #[test]
    fn test_yield_factor_omitted_on_zero_consumption() {
        let input = BalanceInput {
            production_runs: vec![production("2025-03-01", "50", "40")],
            ..Default::default()
        };
        let result = compute_balance(2025, &ProductCatalog::default(), &input);
        let finished = result.product("W5.2").unwrap();

        assert_eq!(finished.yield_factor[2], None);
    }

    /// Chips sold 12 + 8 in March show 20 produced, zero stock carried
    #[test]
    fn test_by_product_mirrors_sales() {
        let input = BalanceInput {
            consumptions: vec![consumption("2025-03-01", "100")],
            sales: vec![
                sale("2025-03-10", "W3.1", "12", "FSC 100%"),
                sale("2025-03-20", "W3.1", "8", "FSC Mixto"),
            ],
            ..Default::default()
        };
        let result = compute_balance(2025, &ProductCatalog::default(), &input);
        let chips = result.product("W3.1").unwrap();

        assert_eq!(chips.production[2], dec("20"));
        assert_eq!(chips.opening[2], Decimal::ZERO);
        assert_eq!(chips.closing[2], Decimal::ZERO);
        // 20 sold over 100 consumed
        assert_eq!(chips.yield_factor[2], Some(dec("20")));
    }

    /// Finished good closing = opening + production - sales
    #[test]
    fn test_finished_good_stock_equation() {
        let input = BalanceInput {
            consumptions: vec![consumption("2025-05-01", "100")],
            production_runs: vec![production("2025-05-02", "100", "80")],
            sales: vec![sale("2025-05-15", "W5.2", "30", "FSC 100%")],
            ..Default::default()
        };
        let result = compute_balance(2025, &ProductCatalog::default(), &input);
        let finished = result.product("W5.2").unwrap();

        assert_eq!(finished.opening[4], Decimal::ZERO);
        assert_eq!(finished.closing[4], dec("50"));
        assert_eq!(finished.opening[5], dec("50"));
    }

    /// A malformed date excludes only its own row
    #[test]
    fn test_malformed_date_reported_per_row() {
        let input = BalanceInput {
            receptions: vec![
                reception("January 2025", "50", "FSC 100%"),
                reception("2025-01-10", "30", "FSC 100%"),
            ],
            ..Default::default()
        };
        let result = compute_balance(2025, &ProductCatalog::default(), &input);

        assert_eq!(result.row_errors.len(), 1);
        assert_eq!(result.row_errors[0].entity, EntryKind::Reception);
        assert_eq!(result.row_errors[0].index, 0);

        let raw = result.product("W1.1").unwrap();
        assert_eq!(raw.inflow_total(0), dec("30"));
    }

    /// A negative volume excludes only its own row
    #[test]
    fn test_negative_volume_reported_per_row() {
        let input = BalanceInput {
            consumptions: vec![
                consumption("2025-01-05", "-10"),
                consumption("2025-01-06", "25"),
            ],
            ..Default::default()
        };
        let result = compute_balance(2025, &ProductCatalog::default(), &input);

        assert_eq!(result.row_errors.len(), 1);
        assert_eq!(result.row_errors[0].entity, EntryKind::Consumption);

        let raw = result.product("W1.1").unwrap();
        assert_eq!(raw.consumption[0], dec("25"));
    }

    /// A timestamp late on the last day of a month stays in that month
    #[test]
    fn test_month_bucketing_is_timezone_proof() {
        let input = BalanceInput {
            receptions: vec![
                reception("2025-01-31T23:59:00Z", "10", "FSC 100%"),
                reception("2025-06-30 23:00:00-04:00", "5", "FSC 100%"),
            ],
            ..Default::default()
        };
        let result = compute_balance(2025, &ProductCatalog::default(), &input);
        let raw = result.product("W1.1").unwrap();

        assert_eq!(raw.inflow_total(0), dec("10"));
        assert_eq!(raw.inflow_total(1), Decimal::ZERO);
        assert_eq!(raw.inflow_total(5), dec("5"));
        assert_eq!(raw.inflow_total(6), Decimal::ZERO);
    }

    /// Receptions are tracked separately per certification label
    #[test]
    fn test_receptions_split_by_certification() {
        let input = BalanceInput {
            receptions: vec![
                reception("2025-01-05", "30", "FSC 100%"),
                reception("2025-01-07", "20", "FSC Mixto"),
                reception("2025-01-09", "15", "FSC 100%"),
            ],
            ..Default::default()
        };
        let result = compute_balance(2025, &ProductCatalog::default(), &input);
        let raw = result.product("W1.1").unwrap();

        assert_eq!(raw.inflow_by_certification["FSC 100%"][0], dec("45"));
        assert_eq!(raw.inflow_by_certification["FSC Mixto"][0], dec("20"));
        assert_eq!(raw.inflow_total(0), dec("65"));
    }
}

// ============================================================================
// Property Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn arb_volume() -> impl Strategy<Value = Decimal> {
        (0u32..100_000).prop_map(|cents| Decimal::new(cents as i64, 2))
    }

    fn arb_month_day() -> impl Strategy<Value = (u32, u32)> {
        (1u32..=12, 1u32..=28)
    }

    fn arb_reception() -> impl Strategy<Value = ReceptionEntry> {
        (arb_month_day(), arb_volume(), 0usize..4).prop_map(|((month, day), volume, cert)| {
            let certs = ["FSC 100%", "FSC Mixto", "FSC Controlled Wood", "Material Controlado"];
            ReceptionEntry {
                date: format!("2025-{:02}-{:02}", month, day),
                product_code: "W1.1".to_string(),
                supplier: "Forestal Sur".to_string(),
                volume_m3: volume,
                certification: certs[cert].to_string(),
            }
        })
    }

    fn arb_consumption() -> impl Strategy<Value = ConsumptionEntry> {
        (arb_month_day(), arb_volume()).prop_map(|((month, day), volume)| ConsumptionEntry {
            date: format!("2025-{:02}-{:02}", month, day),
            product_code: "W1.1".to_string(),
            volume_m3: volume,
        })
    }

    proptest! {
        /// Property: the balance depends on the set of rows, not their order
        #[test]
        fn prop_order_independence(
            mut receptions in prop::collection::vec(arb_reception(), 0..20),
            mut consumptions in prop::collection::vec(arb_consumption(), 0..20),
        ) {
            let catalog = ProductCatalog::default();
            let input = BalanceInput {
                receptions: receptions.clone(),
                consumptions: consumptions.clone(),
                ..Default::default()
            };
            let forward = compute_balance(2025, &catalog, &input);

            receptions.reverse();
            consumptions.reverse();
            let reversed_input = BalanceInput {
                receptions,
                consumptions,
                ..Default::default()
            };
            let reversed = compute_balance(2025, &catalog, &reversed_input);

            let raw_fwd = forward.product("W1.1").unwrap();
            let raw_rev = reversed.product("W1.1").unwrap();
            prop_assert_eq!(&raw_fwd.opening, &raw_rev.opening);
            prop_assert_eq!(&raw_fwd.closing, &raw_rev.closing);
            prop_assert_eq!(&raw_fwd.consumption, &raw_rev.consumption);
            prop_assert_eq!(
                &raw_fwd.inflow_by_certification,
                &raw_rev.inflow_by_certification
            );
        }

        /// Property: December closing equals total receptions minus total
        /// consumption when the year starts empty
        #[test]
        fn prop_year_end_closing_is_net_flow(
            receptions in prop::collection::vec(arb_reception(), 0..20),
            consumptions in prop::collection::vec(arb_consumption(), 0..20),
        ) {
            let catalog = ProductCatalog::default();
            let total_in: Decimal = receptions.iter().map(|r| r.volume_m3).sum();
            let total_out: Decimal = consumptions.iter().map(|c| c.volume_m3).sum();

            let input = BalanceInput {
                receptions,
                consumptions,
                ..Default::default()
            };
            let result = compute_balance(2025, &catalog, &input);
            let raw = result.product("W1.1").unwrap();

            prop_assert_eq!(raw.closing[11], total_in - total_out);
        }

        /// Property: every month's closing feeds the next month's opening
        #[test]
        fn prop_closing_feeds_next_opening(
            receptions in prop::collection::vec(arb_reception(), 0..20),
            consumptions in prop::collection::vec(arb_consumption(), 0..20),
        ) {
            let catalog = ProductCatalog::default();
            let input = BalanceInput {
                receptions,
                consumptions,
                ..Default::default()
            };
            let result = compute_balance(2025, &catalog, &input);
            let raw = result.product("W1.1").unwrap();

            for month in 1..12 {
                prop_assert_eq!(raw.opening[month], raw.closing[month - 1]);
            }
        }
    }
}
