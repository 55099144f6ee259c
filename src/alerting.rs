//! Failed settlements that need an operator.
//!
//! Alerts are written after the settlement transaction has rolled back, on a
//! fresh connection, so raising one can never touch ledger rows.

use crate::db::{DbPool, queries};
use crate::models::Alert;

/// Records a failed settlement. Failures to record are logged and dropped.
pub fn raise_alert(
    pool: &DbPool,
    payment_reference: &str,
    event_type: &str,
    error_message: &str,
) -> Option<Alert> {
    let result = pool
        .get()
        .map_err(crate::error::AppError::from)
        .and_then(|conn| queries::create_alert(&conn, payment_reference, event_type, error_message));

    match result {
        Ok(alert) => {
            tracing::error!(
                alert_id = %alert.id,
                reference = %payment_reference,
                "Settlement failed, alert raised: {}",
                error_message
            );
            Some(alert)
        }
        Err(e) => {
            tracing::error!(
                reference = %payment_reference,
                "Settlement failed and alert could not be recorded ({}): {}",
                e,
                error_message
            );
            None
        }
    }
}
