use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::errors::AppError;
use crate::models::inventory::InventoryItem;

#[derive(Debug, Default, Serialize)]
pub struct ExpiryReport {
    /// Expiring after `now` and no later than `now + window`.
    pub expiring: Vec<InventoryItem>,
    /// Expiry at or before `now`.
    pub expired: Vec<InventoryItem>,
}

/// Splits dated items into expired and expiring within `window_days` of `now`.
/// A window that cannot be represented as a timestamp is a validation error.
pub fn expiry_report(
    items: Vec<InventoryItem>,
    now: DateTime<Utc>,
    window_days: i64,
) -> Result<ExpiryReport, AppError> {
    let horizon = Duration::try_days(window_days.max(0))
        .and_then(|window| now.checked_add_signed(window))
        .ok_or_else(|| {
            AppError::Validation(format!("days={window_days} is out of range"))
        })?;
    let mut report = ExpiryReport::default();

    for item in items {
        match item.expires_at {
            Some(at) if at <= now => report.expired.push(item),
            Some(at) if at <= horizon => report.expiring.push(item),
            _ => {}
        }
    }

    report.expiring.sort_by_key(|i| i.expires_at);
    report.expired.sort_by_key(|i| i.expires_at);
    Ok(report)
}
