//! Common types used across the platform

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Number of months in the balance year
pub const MONTHS_PER_YEAR: usize = 12;

/// Fixed calendar-month labels, in balance-table column order
pub const MONTH_LABELS: [&str; MONTHS_PER_YEAR] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Label for a zero-based month index, `None` past December
pub fn month_label(index: usize) -> Option<&'static str> {
    MONTH_LABELS.get(index).copied()
}

/// Render a volume cell: blank when zero, otherwise at most one decimal
/// place. Midpoints round away from zero, as the source spreadsheets do.
pub fn format_volume(value: Decimal) -> String {
    if value.is_zero() {
        String::new()
    } else {
        value
            .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
            .normalize()
            .to_string()
    }
}

/// Date range for queries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DateRange {
    pub start: chrono::NaiveDate,
    pub end: chrono::NaiveDate,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_format_volume_zero_is_blank() {
        assert_eq!(format_volume(Decimal::ZERO), "");
    }

    #[test]
    fn test_format_volume_integer_has_no_decimals() {
        assert_eq!(format_volume(Decimal::from(120)), "120");
        assert_eq!(format_volume(Decimal::from_str("50.0").unwrap()), "50");
    }

    #[test]
    fn test_format_volume_rounds_to_one_decimal() {
        assert_eq!(format_volume(Decimal::from_str("80.25").unwrap()), "80.3");
        assert_eq!(format_volume(Decimal::from_str("33.333").unwrap()), "33.3");
    }

    #[test]
    fn test_format_volume_rounds_midpoints_up() {
        assert_eq!(format_volume(Decimal::from_str("50.25").unwrap()), "50.3");
        assert_eq!(format_volume(Decimal::from_str("0.05").unwrap()), "0.1");
        assert_eq!(format_volume(Decimal::from_str("80.35").unwrap()), "80.4");
    }

    #[test]
    fn test_month_label_bounds() {
        assert_eq!(month_label(0), Some("January"));
        assert_eq!(month_label(11), Some("December"));
        assert_eq!(month_label(12), None);
    }
}
