//! Validation helpers shared by the backend services

use rust_decimal::Decimal;

use crate::models::ProductCatalog;

/// Parse the calendar-date prefix of an ISO-8601 string into (year, month, day).
///
/// Only the part before any 'T' or space is inspected, so "2025-06-30",
/// "2025-06-30T23:00:00Z" and "2025-06-30 23:00:00-04:00" all land on the
/// same calendar date. No timezone conversion is ever applied.
pub fn parse_date_parts(date: &str) -> Result<(i32, u32, u32), &'static str> {
    let calendar = date
        .split(['T', ' '])
        .next()
        .ok_or("date must not be empty")?;
    let mut parts = calendar.splitn(3, '-');
    let year: i32 = parts
        .next()
        .and_then(|s| s.parse().ok())
        .ok_or("date must start with a four-digit year")?;
    let month: u32 = parts
        .next()
        .and_then(|s| s.parse().ok())
        .ok_or("date must contain a numeric month")?;
    let day: u32 = parts
        .next()
        .and_then(|s| s.parse().ok())
        .ok_or("date must contain a numeric day")?;
    if !(1..=12).contains(&month) {
        return Err("month must be between 1 and 12");
    }
    if !(1..=31).contains(&day) {
        return Err("day must be between 1 and 31");
    }
    Ok((year, month, day))
}

/// Volume recorded on a movement must not be negative
pub fn validate_volume(volume: Decimal) -> Result<(), &'static str> {
    if volume.is_sign_negative() {
        return Err("volume must not be negative");
    }
    Ok(())
}

/// Volumes entered through the CRUD API must be strictly positive
pub fn validate_positive_volume(volume: Decimal) -> Result<(), &'static str> {
    if volume <= Decimal::ZERO {
        return Err("volume must be greater than zero");
    }
    Ok(())
}

/// Month number used by opening stocks (1-12)
pub fn validate_month(month: u32) -> Result<(), &'static str> {
    if !(1..=12).contains(&month) {
        return Err("month must be between 1 and 12");
    }
    Ok(())
}

/// Balance years outside this window are almost certainly typos
pub fn validate_year(year: i32) -> Result<(), &'static str> {
    if !(2000..=2100).contains(&year) {
        return Err("year must be between 2000 and 2100");
    }
    Ok(())
}

pub fn validate_product_code(catalog: &ProductCatalog, code: &str) -> Result<(), &'static str> {
    if catalog.product(code).is_none() {
        return Err("unknown product code");
    }
    Ok(())
}

pub fn validate_certification(catalog: &ProductCatalog, label: &str) -> Result<(), &'static str> {
    if !catalog.is_known_certification(label) {
        return Err("unknown certification label");
    }
    Ok(())
}

pub fn validate_required(value: &str) -> Result<(), &'static str> {
    if value.trim().is_empty() {
        return Err("field must not be empty");
    }
    Ok(())
}
