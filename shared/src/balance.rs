//! Monthly material balance aggregator
//!
//! Pure computation: takes one year of movement rows plus the product
//! catalog and produces per-product monthly series. Malformed rows are
//! reported individually and excluded instead of failing the whole
//! computation, and the result depends only on the set of input rows,
//! never on their order.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::{BalanceInput, Product, ProductCatalog, ProductCategory};
use crate::types::MONTHS_PER_YEAR;
use crate::validation::parse_date_parts;

/// Which input collection a rejected row came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    OpeningStock,
    Reception,
    Consumption,
    Production,
    Sale,
}

/// A row the aggregator excluded, with the reason
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowError {
    pub entity: EntryKind,
    pub index: usize,
    pub message: String,
}

/// Monthly series for one product
#[derive(Debug, Clone, Serialize)]
pub struct ProductBalance {
    pub code: String,
    pub display_name: String,
    pub category: ProductCategory,
    pub opening: [Decimal; MONTHS_PER_YEAR],
    pub closing: [Decimal; MONTHS_PER_YEAR],
    /// Reception volumes broken down by certification label
    pub inflow_by_certification: BTreeMap<String, [Decimal; MONTHS_PER_YEAR]>,
    pub production: [Decimal; MONTHS_PER_YEAR],
    pub consumption: [Decimal; MONTHS_PER_YEAR],
    /// Sale volumes broken down by certification label
    pub sales_by_certification: BTreeMap<String, [Decimal; MONTHS_PER_YEAR]>,
    /// Yield in percent; None where no meaningful factor exists
    pub yield_factor: [Option<Decimal>; MONTHS_PER_YEAR],
}

impl ProductBalance {
    fn new(product: &Product) -> Self {
        Self {
            code: product.code.clone(),
            display_name: product.display_name.clone(),
            category: product.category,
            opening: [Decimal::ZERO; MONTHS_PER_YEAR],
            closing: [Decimal::ZERO; MONTHS_PER_YEAR],
            inflow_by_certification: BTreeMap::new(),
            production: [Decimal::ZERO; MONTHS_PER_YEAR],
            consumption: [Decimal::ZERO; MONTHS_PER_YEAR],
            sales_by_certification: BTreeMap::new(),
            yield_factor: [None; MONTHS_PER_YEAR],
        }
    }

    /// Total receptions for a month across all certifications
    pub fn inflow_total(&self, month: usize) -> Decimal {
        self.inflow_by_certification
            .values()
            .map(|series| series[month])
            .sum()
    }

    /// Total sales for a month across all certifications
    pub fn sales_total(&self, month: usize) -> Decimal {
        self.sales_by_certification
            .values()
            .map(|series| series[month])
            .sum()
    }
}

/// The full balance for one calendar year
#[derive(Debug, Clone, Serialize)]
pub struct AnnualBalance {
    pub year: i32,
    /// Keyed by product code
    pub products: BTreeMap<String, ProductBalance>,
    pub row_errors: Vec<RowError>,
}

impl AnnualBalance {
    pub fn product(&self, code: &str) -> Option<&ProductBalance> {
        self.products.get(code)
    }
}

/// Compute the monthly balance for one year of movements.
///
/// The caller is responsible for filtering the input to the requested
/// year; dates here are only used for month bucketing.
pub fn compute_balance(year: i32, catalog: &ProductCatalog, input: &BalanceInput) -> AnnualBalance {
    let mut products: BTreeMap<String, ProductBalance> = catalog
        .products
        .iter()
        .map(|p| (p.code.clone(), ProductBalance::new(p)))
        .collect();
    let mut row_errors = Vec::new();

    // Explicit opening-stock overrides, keyed by (code, zero-based month).
    // Duplicate overrides for the same slot are summed so the result stays
    // independent of row order.
    let mut overrides: BTreeMap<(String, usize), Decimal> = BTreeMap::new();

    // Declared yield factors, accumulated as a volume-weighted mean per
    // (code, month) so multiple runs in one month combine deterministically.
    let mut declared_yield: BTreeMap<(String, usize), YieldAccumulator> = BTreeMap::new();

    for (index, entry) in input.opening_stocks.iter().enumerate() {
        let Some(month) = checked_month_number(EntryKind::OpeningStock, index, entry.month, &mut row_errors)
        else {
            continue;
        };
        if !checked_volume(EntryKind::OpeningStock, index, entry.volume_m3, &mut row_errors) {
            continue;
        }
        let Some(category) =
            checked_product(catalog, EntryKind::OpeningStock, index, &entry.product_code, &mut row_errors)
        else {
            continue;
        };
        // By-products never carry stock, so an override there is meaningless.
        if category != ProductCategory::ByProduct {
            *overrides
                .entry((entry.product_code.clone(), month))
                .or_insert(Decimal::ZERO) += entry.volume_m3;
        }
    }

    for (index, entry) in input.receptions.iter().enumerate() {
        let Some(month) = checked_date(EntryKind::Reception, index, &entry.date, &mut row_errors)
        else {
            continue;
        };
        if !checked_volume(EntryKind::Reception, index, entry.volume_m3, &mut row_errors) {
            continue;
        }
        if checked_product(catalog, EntryKind::Reception, index, &entry.product_code, &mut row_errors)
            .is_none()
        {
            continue;
        }
        let Some(balance) = products.get_mut(&entry.product_code) else {
            continue;
        };
        balance
            .inflow_by_certification
            .entry(entry.certification.clone())
            .or_insert([Decimal::ZERO; MONTHS_PER_YEAR])[month] += entry.volume_m3;
    }

    for (index, entry) in input.consumptions.iter().enumerate() {
        let Some(month) = checked_date(EntryKind::Consumption, index, &entry.date, &mut row_errors)
        else {
            continue;
        };
        if !checked_volume(EntryKind::Consumption, index, entry.volume_m3, &mut row_errors) {
            continue;
        }
        if checked_product(catalog, EntryKind::Consumption, index, &entry.product_code, &mut row_errors)
            .is_none()
        {
            continue;
        }
        let Some(balance) = products.get_mut(&entry.product_code) else {
            continue;
        };
        balance.consumption[month] += entry.volume_m3;
    }

    for (index, entry) in input.production_runs.iter().enumerate() {
        let Some(month) = checked_date(EntryKind::Production, index, &entry.date, &mut row_errors)
        else {
            continue;
        };
        if !checked_volume(EntryKind::Production, index, entry.origin_volume_m3, &mut row_errors)
            || !checked_volume(
                EntryKind::Production,
                index,
                entry.destination_volume_m3,
                &mut row_errors,
            )
        {
            continue;
        }
        if checked_product(
            catalog,
            EntryKind::Production,
            index,
            &entry.destination_product_code,
            &mut row_errors,
        )
        .is_none()
        {
            continue;
        }
        let Some(balance) = products.get_mut(&entry.destination_product_code) else {
            continue;
        };
        balance.production[month] += entry.destination_volume_m3;
        if let Some(factor) = entry.yield_factor {
            if factor.is_sign_negative() {
                row_errors.push(RowError {
                    entity: EntryKind::Production,
                    index,
                    message: "yield factor must not be negative".to_string(),
                });
            } else {
                declared_yield
                    .entry((entry.destination_product_code.clone(), month))
                    .or_default()
                    .add(factor, entry.destination_volume_m3);
            }
        }
    }

    for (index, entry) in input.sales.iter().enumerate() {
        let Some(month) = checked_date(EntryKind::Sale, index, &entry.date, &mut row_errors) else {
            continue;
        };
        if !checked_volume(EntryKind::Sale, index, entry.volume_m3, &mut row_errors) {
            continue;
        }
        if checked_product(catalog, EntryKind::Sale, index, &entry.product_code, &mut row_errors)
            .is_none()
        {
            continue;
        }
        let Some(balance) = products.get_mut(&entry.product_code) else {
            continue;
        };
        balance
            .sales_by_certification
            .entry(entry.certification.clone())
            .or_insert([Decimal::ZERO; MONTHS_PER_YEAR])[month] += entry.volume_m3;
    }

    // Total raw-material consumption per month is the yield denominator.
    let mut raw_consumption = [Decimal::ZERO; MONTHS_PER_YEAR];
    for balance in products.values() {
        if balance.category == ProductCategory::RawMaterial {
            for month in 0..MONTHS_PER_YEAR {
                raw_consumption[month] += balance.consumption[month];
            }
        }
    }

    let hundred = Decimal::from(100);
    for balance in products.values_mut() {
        match balance.category {
            ProductCategory::RawMaterial => {
                for month in 0..MONTHS_PER_YEAR {
                    let carried = if month > 0 {
                        balance.closing[month - 1]
                    } else {
                        Decimal::ZERO
                    };
                    balance.opening[month] = overrides
                        .get(&(balance.code.clone(), month))
                        .copied()
                        .unwrap_or(carried);
                    balance.closing[month] = balance.opening[month]
                        + balance.inflow_total(month)
                        - balance.consumption[month];
                }
            }
            ProductCategory::FinishedGood => {
                for month in 0..MONTHS_PER_YEAR {
                    let carried = if month > 0 {
                        balance.closing[month - 1]
                    } else {
                        Decimal::ZERO
                    };
                    balance.opening[month] = overrides
                        .get(&(balance.code.clone(), month))
                        .copied()
                        .unwrap_or(carried);
                    balance.closing[month] = balance.opening[month] + balance.production[month]
                        - balance.sales_total(month);
                    balance.yield_factor[month] = declared_yield
                        .get(&(balance.code.clone(), month))
                        .map(YieldAccumulator::mean)
                        .or_else(|| {
                            if raw_consumption[month] > Decimal::ZERO {
                                Some(balance.production[month] / raw_consumption[month] * hundred)
                            } else {
                                None
                            }
                        });
                }
            }
            ProductCategory::ByProduct => {
                // Sales-driven products: production mirrors sales and no
                // stock is carried between months.
                for month in 0..MONTHS_PER_YEAR {
                    let sold = balance.sales_total(month);
                    balance.production[month] = sold;
                    balance.opening[month] = Decimal::ZERO;
                    balance.closing[month] = Decimal::ZERO;
                    balance.yield_factor[month] =
                        if raw_consumption[month] > Decimal::ZERO && sold > Decimal::ZERO {
                            Some(sold / raw_consumption[month] * hundred)
                        } else {
                            None
                        };
                }
            }
        }
    }

    AnnualBalance {
        year,
        products,
        row_errors,
    }
}

/// Volume-weighted running mean of declared yield factors
#[derive(Debug, Default, Clone, Copy)]
struct YieldAccumulator {
    weighted_sum: Decimal,
    weight: Decimal,
    plain_sum: Decimal,
    count: u32,
}

impl YieldAccumulator {
    fn add(&mut self, factor: Decimal, weight: Decimal) {
        self.weighted_sum += factor * weight;
        self.weight += weight;
        self.plain_sum += factor;
        self.count += 1;
    }

    fn mean(&self) -> Decimal {
        if self.weight > Decimal::ZERO {
            self.weighted_sum / self.weight
        } else {
            self.plain_sum / Decimal::from(self.count.max(1))
        }
    }
}

fn checked_date(
    entity: EntryKind,
    index: usize,
    date: &str,
    row_errors: &mut Vec<RowError>,
) -> Option<usize> {
    match parse_date_parts(date) {
        Ok((_, month, _)) => Some((month - 1) as usize),
        Err(message) => {
            row_errors.push(RowError {
                entity,
                index,
                message: message.to_string(),
            });
            None
        }
    }
}

fn checked_month_number(
    entity: EntryKind,
    index: usize,
    month: u32,
    row_errors: &mut Vec<RowError>,
) -> Option<usize> {
    if (1..=12).contains(&month) {
        Some((month - 1) as usize)
    } else {
        row_errors.push(RowError {
            entity,
            index,
            message: "month must be between 1 and 12".to_string(),
        });
        None
    }
}

fn checked_volume(
    entity: EntryKind,
    index: usize,
    volume: Decimal,
    row_errors: &mut Vec<RowError>,
) -> bool {
    if volume.is_sign_negative() {
        row_errors.push(RowError {
            entity,
            index,
            message: "volume must not be negative".to_string(),
        });
        false
    } else {
        true
    }
}

fn checked_product(
    catalog: &ProductCatalog,
    entity: EntryKind,
    index: usize,
    code: &str,
    row_errors: &mut Vec<RowError>,
) -> Option<ProductCategory> {
    match catalog.category_of(code) {
        Some(category) => Some(category),
        None => {
            row_errors.push(RowError {
                entity,
                index,
                message: format!("unknown product code: {code}"),
            });
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        ConsumptionEntry, OpeningStockEntry, ProductionEntry, ReceptionEntry, SaleEntry,
    };
    use std::str::FromStr;

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

    fn sale(date: &str, code: &str, volume: &str) -> SaleEntry {
        SaleEntry {
            date: date.to_string(),
            product_code: code.to_string(),
            customer: "Maderas Centro".to_string(),
            invoice_number: "F-1001".to_string(),
            volume_m3: dec(volume),
            certification: "FSC 100%".to_string(),
            unit_price: None,
        }
    }

    #[test]
    fn test_raw_material_closing_and_carry_forward() {
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
        // January closing carries into February
        assert_eq!(raw.opening[1], dec("120"));
        assert_eq!(raw.closing[11], dec("120"));
        assert!(result.row_errors.is_empty());
    }

    #[test]
    fn test_explicit_opening_overrides_carry_forward() {
        let input = BalanceInput {
            opening_stocks: vec![
                OpeningStockEntry {
                    month: 1,
                    product_code: "W1.1".to_string(),
                    volume_m3: dec("100"),
                },
                OpeningStockEntry {
                    month: 3,
                    product_code: "W1.1".to_string(),
                    volume_m3: dec("40"),
                },
            ],
            ..Default::default()
        };
        let result = compute_balance(2025, &ProductCatalog::default(), &input);
        let raw = result.product("W1.1").unwrap();
        assert_eq!(raw.opening[1], dec("100"));
        // March ignores the carried 100 in favor of the recorded 40
        assert_eq!(raw.opening[2], dec("40"));
        assert_eq!(raw.opening[3], dec("40"));
    }

    #[test]
    fn test_finished_good_derived_yield() {
        let input = BalanceInput {
            consumptions: vec![consumption("2025-02-05", "50")],
            production_runs: vec![production("2025-02-06", "50", "40")],
            ..Default::default()
        };
        let result = compute_balance(2025, &ProductCatalog::default(), &input);
        let finished = result.product("W5.2").unwrap();
        assert_eq!(finished.production[1], dec("40"));
        assert_eq!(finished.yield_factor[1], Some(dec("80")));
        // no consumption elsewhere, so no factor
        assert_eq!(finished.yield_factor[0], None);
    }

    #[test]
    fn test_declared_yield_wins_over_derived() {
        let input = BalanceInput {
            consumptions: vec![consumption("2025-02-05", "50")],
            production_runs: vec![ProductionEntry {
                yield_factor: Some(dec("85.5")),
                ..production("2025-02-06", "50", "40")
            }],
            ..Default::default()
        };
        let result = compute_balance(2025, &ProductCatalog::default(), &input);
        let finished = result.product("W5.2").unwrap();
        assert_eq!(finished.yield_factor[1], Some(dec("85.5")));
    }

    #[test]
    fn test_by_product_mirrors_sales_and_carries_no_stock() {
        let input = BalanceInput {
            consumptions: vec![consumption("2025-03-01", "100")],
            sales: vec![sale("2025-03-10", "W3.1", "12"), sale("2025-03-20", "W3.1", "8")],
            ..Default::default()
        };
        let result = compute_balance(2025, &ProductCatalog::default(), &input);
        let chips = result.product("W3.1").unwrap();
        assert_eq!(chips.production[2], dec("20"));
        assert_eq!(chips.opening[2], Decimal::ZERO);
        assert_eq!(chips.closing[2], Decimal::ZERO);
        assert_eq!(chips.yield_factor[2], Some(dec("20")));
        // no sales in April, so production and factor stay empty
        assert_eq!(chips.production[3], Decimal::ZERO);
        assert_eq!(chips.yield_factor[3], None);
    }

    #[test]
    fn test_malformed_date_is_reported_not_fatal() {
        let input = BalanceInput {
            receptions: vec![
                reception("not-a-date", "50", "FSC 100%"),
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

    #[test]
    fn test_negative_volume_is_rejected_per_row() {
        let input = BalanceInput {
            consumptions: vec![consumption("2025-01-05", "-10"), consumption("2025-01-06", "25")],
            ..Default::default()
        };
        let result = compute_balance(2025, &ProductCatalog::default(), &input);
        assert_eq!(result.row_errors.len(), 1);
        assert_eq!(result.row_errors[0].entity, EntryKind::Consumption);
        let raw = result.product("W1.1").unwrap();
        assert_eq!(raw.consumption[0], dec("25"));
    }

    #[test]
    fn test_month_bucketing_ignores_time_suffix() {
        let input = BalanceInput {
            receptions: vec![reception("2025-01-31T23:30:00Z", "10", "FSC Mixto")],
            ..Default::default()
        };
        let result = compute_balance(2025, &ProductCatalog::default(), &input);
        let raw = result.product("W1.1").unwrap();
        assert_eq!(raw.inflow_total(0), dec("10"));
        assert_eq!(raw.inflow_total(1), Decimal::ZERO);
    }

    #[test]
    fn test_unknown_product_code_is_reported() {
        let input = BalanceInput {
            sales: vec![sale("2025-05-01", "Z9.9", "10")],
            ..Default::default()
        };
        let result = compute_balance(2025, &ProductCatalog::default(), &input);
        assert_eq!(result.row_errors.len(), 1);
        assert!(result.row_errors[0].message.contains("Z9.9"));
    }
}
