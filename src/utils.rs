use time::{Date, OffsetDateTime, format_description::BorrowedFormatItem, macros::format_description};

use crate::constants::*;
use crate::error::AppError;

pub const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

pub fn now_timestamp() -> i64 {
    OffsetDateTime::now_utc().unix_timestamp()
}

/// Parses a date in strict `YYYY-MM-DD` form.
pub fn parse_date(value: &str) -> Option<Date> {
    Date::parse(value, DATE_FORMAT).ok()
}

pub fn format_date(date: Date) -> Result<String, AppError> {
    date.format(DATE_FORMAT)
        .map_err(|e| AppError::Database(format!("failed to format date {date}: {e}")))
}

/// Key used for case-insensitive name matching.
pub fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

pub fn validate_string_length(
    value: &str,
    field_name: &str,
    max_length: usize,
) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::BadRequest(format!(
            "{} cannot be empty",
            field_name
        )));
    }
    if value.trim().chars().count() > max_length {
        return Err(AppError::BadRequest(format!(
            "{} must be at most {} characters",
            field_name, max_length
        )));
    }
    Ok(())
}

/// Accepts `#rrggbb` hex colors.
pub fn validate_color(color: &str) -> Result<(), AppError> {
    let valid = color.len() == 7
        && color.starts_with('#')
        && color[1..].chars().all(|c| c.is_ascii_hexdigit());
    if !valid {
        return Err(AppError::BadRequest(format!(
            "Color must be a hex value like {}",
            DEFAULT_COLOR
        )));
    }
    Ok(())
}

pub fn validate_amount(amount: f64) -> Result<(), AppError> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(AppError::BadRequest(
            "Amount must be a positive number".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_limit(limit: Option<u32>, default: u32) -> Result<u32, AppError> {
    match limit {
        Some(l) => {
            if l == 0 {
                Err(AppError::BadRequest(
                    "Limit must be greater than 0".to_string(),
                ))
            } else if l > MAX_LIMIT {
                Err(AppError::BadRequest(format!(
                    "Limit cannot exceed {}",
                    MAX_LIMIT
                )))
            } else {
                Ok(l)
            }
        }
        None => Ok(default),
    }
}

pub fn validate_offset(offset: Option<u32>) -> Result<u32, AppError> {
    match offset {
        Some(o) => {
            if o > MAX_OFFSET {
                Err(AppError::BadRequest(format!(
                    "Offset cannot exceed {}",
                    MAX_OFFSET
                )))
            } else {
                Ok(o)
            }
        }
        None => Ok(0), // Default offset
    }
}
