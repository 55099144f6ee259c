use axum::http::HeaderMap;
use rusqlite::Connection;

use crate::db::queries;
use crate::error::Result;
use crate::models::{CreateWebhookLog, Disposition, WebhookLogEntry};

/// Extract client IP and user-agent from request headers.
pub fn extract_request_info(headers: &HeaderMap) -> (Option<String>, Option<String>) {
    let ip = headers
        .get("x-forwarded-for")
        .or_else(|| headers.get("x-real-ip"))
        .and_then(|v| v.to_str().ok())
        .map(|v| v.split(',').next().unwrap_or(v).trim().to_string())
        .filter(|v| !v.is_empty());

    let user_agent = headers
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .map(String::from);

    (ip, user_agent)
}

/// Builder for webhook log entries.
///
/// # Example
/// ```ignore
/// WebhookLogBuilder::new(&audit_conn, state.webhook_log_enabled, &headers, &body)
///     .event_type("charge.success")
///     .reference(Some("ref_123"))
///     .disposition(Disposition::Processed)
///     .record();
/// ```
pub struct WebhookLogBuilder<'a> {
    conn: &'a Connection,
    enabled: bool,
    headers: &'a HeaderMap,
    payload: &'a [u8],
    event_type: &'a str,
    reference: Option<&'a str>,
    disposition: Disposition,
    error_message: Option<&'a str>,
}

impl<'a> WebhookLogBuilder<'a> {
    pub fn new(conn: &'a Connection, enabled: bool, headers: &'a HeaderMap, payload: &'a [u8]) -> Self {
        Self {
            conn,
            enabled,
            headers,
            payload,
            event_type: "unknown",
            reference: None,
            disposition: Disposition::Processed,
            error_message: None,
        }
    }

    pub fn event_type(mut self, event_type: &'a str) -> Self {
        self.event_type = event_type;
        self
    }

    pub fn reference(mut self, reference: Option<&'a str>) -> Self {
        self.reference = reference;
        self
    }

    pub fn disposition(mut self, disposition: Disposition) -> Self {
        self.disposition = disposition;
        self
    }

    pub fn error(mut self, message: &'a str) -> Self {
        self.error_message = Some(message);
        self
    }

    /// Write the entry. Returns `Ok(None)` when webhook logging is disabled.
    pub fn save(self) -> Result<Option<WebhookLogEntry>> {
        if !self.enabled {
            return Ok(None);
        }
        let (ip_address, user_agent) = extract_request_info(self.headers);
        queries::create_webhook_log(
            self.conn,
            &CreateWebhookLog {
                event_type: self.event_type.to_string(),
                payment_reference: self.reference.map(str::to_string),
                payload: String::from_utf8_lossy(self.payload).into_owned(),
                disposition: self.disposition,
                error_message: self.error_message.map(str::to_string),
                ip_address,
                user_agent,
            },
        )
        .map(Some)
    }

    /// Write the entry, logging instead of returning any failure.
    pub fn record(self) {
        let event_type = self.event_type;
        let reference = self.reference.map(str::to_string);
        if let Err(e) = self.save() {
            tracing::warn!(
                event_type,
                reference = ?reference,
                "Failed to write webhook log: {}",
                e
            );
        }
    }
}
