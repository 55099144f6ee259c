use serde::{Deserialize, Serialize};

/// Settlement failure that needs an operator. Created outside the
/// settlement transaction, after it has rolled back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    pub payment_reference: String,
    pub event_type: String,
    pub error_message: String,
    pub resolved: bool,
    pub created_at: i64,
}
