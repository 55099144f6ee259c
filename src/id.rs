//! Prefixed ID generation for settlement entities.
//!
//! All IDs use an `sm_` brand prefix so they never collide with payment
//! provider references or catalog ids minted by the storefront.
//!
//! Format: `sm_{entity}_{uuid_simple}` (32 hex chars, no hyphens)

use uuid::Uuid;

/// All known entity prefixes for validation.
const ALL_PREFIXES: &[&str] = &["sm_ord_", "sm_oli_", "sm_pay_", "sm_rev_", "sm_whl_", "sm_alr_"];

/// Namespace for order ids derived from payment references.
const ORDER_NAMESPACE: Uuid = Uuid::from_u128(0x6f2c_1d7e_4b8a_5c3f_9e01_a2b3_c4d5_e6f7);

/// Validate that a string is a well-formed prefixed ID.
///
/// Validates format: `sm_{entity}_{32_hex_chars}`
pub fn is_valid_prefixed_id(s: &str) -> bool {
    let Some(prefix) = ALL_PREFIXES.iter().find(|p| s.starts_with(*p)) else {
        return false;
    };

    let hex_part = &s[prefix.len()..];
    hex_part.len() == 32 && hex_part.chars().all(|c| c.is_ascii_hexdigit())
}

/// Entity types that have prefixed IDs.
#[derive(Debug, Clone, Copy)]
pub enum EntityType {
    Order,
    OrderItem,
    Payout,
    RevenueLog,
    WebhookLog,
    Alert,
}

impl EntityType {
    /// Returns the prefix for this entity type.
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Order => "sm_ord",
            Self::OrderItem => "sm_oli",
            Self::Payout => "sm_pay",
            Self::RevenueLog => "sm_rev",
            Self::WebhookLog => "sm_whl",
            Self::Alert => "sm_alr",
        }
    }

    /// Generates a new random prefixed ID for this entity type.
    pub fn gen_id(&self) -> String {
        format!("{}_{}", self.prefix(), Uuid::new_v4().as_simple())
    }
}

/// Derives the order id for a payment reference.
///
/// The same reference always maps to the same id, which is what lets a
/// redelivered webhook find the order created by the first delivery.
pub fn order_id_for_reference(reference: &str) -> String {
    let derived = Uuid::new_v5(&ORDER_NAMESPACE, reference.as_bytes());
    format!("{}_{}", EntityType::Order.prefix(), derived.as_simple())
}
