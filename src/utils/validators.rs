use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;

use crate::error::{AppError, AppResult};

static BED_NUM_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9]+$").unwrap());

static CUSTOMER_NUMBER_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{1,11}$").unwrap());

static PHONE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\+?[0-9-]{6,20}$").unwrap());

static WHITESPACE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

pub fn validate_bed_num(bed_num: &str) -> bool {
    BED_NUM_REGEX.is_match(bed_num)
}

pub fn validate_customer_number(number: &str) -> bool {
    CUSTOMER_NUMBER_REGEX.is_match(number)
}

pub fn validate_phone(phone: &str) -> bool {
    PHONE_REGEX.is_match(phone)
}

/// Email must end with the configured domain suffix, compared case-insensitively.
pub fn validate_email_domain(email: &str, domain_suffix: &str) -> bool {
    let email = email.trim().to_lowercase();
    let suffix = domain_suffix.trim().to_lowercase();
    !suffix.is_empty() && email.len() > suffix.len() && email.ends_with(&suffix)
}

/// Key used for the case-and-whitespace-insensitive hostel name uniqueness.
pub fn normalize_name_key(name: &str) -> String {
    WHITESPACE_REGEX.replace_all(name, "").to_lowercase()
}

pub fn sanitize_string(input: &str) -> String {
    input.trim().to_string()
}

/// Years the ledger accepts.
pub const YEARS: std::ops::RangeInclusive<i32> = 2000..=9999;

pub fn validate_year(field: &str, year: i32) -> AppResult<()> {
    if !YEARS.contains(&year) {
        return Err(AppError::validation(field, "year must be between 2000 and 9999"));
    }
    Ok(())
}

pub fn validate_month(field: &str, month: u32) -> AppResult<()> {
    if !(1..=12).contains(&month) {
        return Err(AppError::validation(field, "month must be between 1 and 12"));
    }
    Ok(())
}

/// Exclusive upper bound of a `NUMERIC(12, 2)` column.
pub const MONEY_LIMIT: Decimal = Decimal::from_parts(1_410_065_408, 2, 0, false, 0);

/// Non-negative amount with at most two fractional digits that fits the
/// ledger's money columns.
pub fn validate_money(field: &str, amount: Decimal) -> AppResult<()> {
    if amount < Decimal::ZERO {
        return Err(AppError::validation(field, "must not be negative"));
    }
    if amount >= MONEY_LIMIT {
        return Err(AppError::validation(
            field,
            "must be less than 10,000,000,000",
        ));
    }
    if amount.normalize().scale() > 2 {
        return Err(AppError::validation(
            field,
            "must have at most 2 fractional digits",
        ));
    }
    Ok(())
}

/// Discount percentage in [0, 100] with at most two fractional digits.
pub fn validate_pct(field: &str, pct: Decimal) -> AppResult<()> {
    validate_money(field, pct)?;
    if pct > Decimal::ONE_HUNDRED {
        return Err(AppError::validation(field, "must be between 0 and 100"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_validate_bed_num() {
        assert!(validate_bed_num("A1"));
        assert!(validate_bed_num("12"));
        assert!(!validate_bed_num("A-1"));
        assert!(!validate_bed_num(""));
    }

    #[test]
    fn test_validate_customer_number() {
        assert!(validate_customer_number("09012345678"));
        assert!(!validate_customer_number("090123456789"));
        assert!(!validate_customer_number("090-1234"));
    }

    #[test]
    fn test_validate_email_domain() {
        assert!(validate_email_domain("staff@hostel.local", "@hostel.local"));
        assert!(validate_email_domain("Staff@Hostel.Local", "@hostel.local"));
        assert!(!validate_email_domain("staff@gmail.com", "@hostel.local"));
        assert!(!validate_email_domain("@hostel.local", "@hostel.local"));
    }

    #[test]
    fn test_normalize_name_key() {
        assert_eq!(normalize_name_key("Sakura  House"), "sakurahouse");
        assert_eq!(
            normalize_name_key(" sakura house "),
            normalize_name_key("SAKURA HOUSE")
        );
    }

    #[test]
    fn test_validate_money() {
        assert!(validate_money("rent", dec("50000")).is_ok());
        assert!(validate_money("rent", dec("0.50")).is_ok());
        assert!(validate_money("rent", dec("1.500")).is_ok());
        assert!(validate_money("rent", dec("1.005")).is_err());
        assert!(validate_money("rent", dec("-1")).is_err());
    }

    #[test]
    fn test_validate_money_fits_column() {
        assert_eq!(MONEY_LIMIT, dec("10000000000"));
        assert!(validate_money("rent", dec("9999999999.99")).is_ok());
        assert!(matches!(
            validate_money("rent", dec("10000000000")).unwrap_err(),
            AppError::Validation { field, .. } if field == "rent"
        ));
        assert!(validate_money("rent", dec("100000000000")).is_err());
        assert!(validate_money("rent", Decimal::MAX).is_err());
    }

    #[test]
    fn test_validate_pct() {
        assert!(validate_pct("pct", dec("0")).is_ok());
        assert!(validate_pct("pct", dec("100")).is_ok());
        assert!(validate_pct("pct", dec("12.50")).is_ok());
        assert!(validate_pct("pct", dec("100.01")).is_err());
    }

    #[test]
    fn test_validate_year() {
        assert!(validate_year("year", 2000).is_ok());
        assert!(validate_year("year", 9999).is_ok());
        assert!(validate_year("year", 1999).is_err());
        assert!(validate_year("year", i32::MIN).is_err());
        assert!(validate_year("year", i32::MAX).is_err());
    }

    #[test]
    fn test_validate_month() {
        assert!(validate_month("month", 1).is_ok());
        assert!(validate_month("month", 12).is_ok());
        assert!(validate_month("month", 0).is_err());
        assert!(validate_month("month", 13).is_err());
    }
}
