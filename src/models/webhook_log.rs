use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LogStatus {
    Success,
    Failed,
}

/// What actually happened to a delivery, finer grained than `LogStatus`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Disposition {
    /// Ledger writes committed
    Processed,
    /// Reference already settled; nothing written
    Duplicate,
    /// Event type we do not settle
    Ignored,
    /// Payload missing required fields
    Malformed,
    /// Settlement aborted and rolled back
    Error,
}

impl Disposition {
    pub fn status(&self) -> LogStatus {
        match self {
            Self::Processed | Self::Duplicate | Self::Ignored => LogStatus::Success,
            Self::Malformed | Self::Error => LogStatus::Failed,
        }
    }
}

/// One row per signature-valid webhook delivery. Diagnostic only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookLogEntry {
    pub id: String,
    pub event_type: String,
    pub payment_reference: Option<String>,
    pub payload: String,
    pub status: LogStatus,
    pub disposition: Disposition,
    pub error_message: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: i64,
}

#[derive(Debug, Clone)]
pub struct CreateWebhookLog {
    pub event_type: String,
    pub payment_reference: Option<String>,
    pub payload: String,
    pub disposition: Disposition,
    pub error_message: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}
