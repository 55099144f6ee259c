mod paystack;

pub use paystack::*;

use crate::models::BillingInterval;

/// Event type that carries a captured charge.
pub const CHARGE_SUCCESS: &str = "charge.success";

/// One `{id, quantity}` entry from the checkout cart.
#[derive(Debug, Clone, PartialEq)]
pub struct CartLine {
    pub product_id: String,
    pub quantity: i64,
}

/// Captured charge for a storefront checkout.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderCharge {
    pub reference: String,
    /// Currency units (the provider sends minor units)
    pub amount: f64,
    pub currency: String,
    pub customer_email: Option<String>,
    pub store_id: String,
    pub shipping_address: Option<serde_json::Value>,
    pub cart: Vec<CartLine>,
}

impl OrderCharge {
    /// City or state from the shipping address, for payout metadata.
    pub fn shipping_locality(&self) -> Option<&str> {
        let address = self.shipping_address.as_ref()?;
        ["city", "state", "country"]
            .iter()
            .find_map(|key| address.get(*key).and_then(|v| v.as_str()))
    }
}

/// Captured charge for a subscription plan activation.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivationCharge {
    pub reference: String,
    pub amount: f64,
    pub currency: String,
    pub customer_email: Option<String>,
    pub user_id: String,
    pub billing_interval: BillingInterval,
    pub plan_tier: String,
}

/// Inbound webhook, parsed once at the boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum WebhookEvent {
    ChargeSuccessOrder(OrderCharge),
    ChargeSuccessActivation(ActivationCharge),
    /// Any event type we acknowledge without settling
    Other(String),
}

impl WebhookEvent {
    pub fn event_type(&self) -> &str {
        match self {
            Self::ChargeSuccessOrder(_) | Self::ChargeSuccessActivation(_) => CHARGE_SUCCESS,
            Self::Other(event_type) => event_type,
        }
    }

    pub fn reference(&self) -> Option<&str> {
        match self {
            Self::ChargeSuccessOrder(c) => Some(&c.reference),
            Self::ChargeSuccessActivation(c) => Some(&c.reference),
            Self::Other(_) => None,
        }
    }
}
