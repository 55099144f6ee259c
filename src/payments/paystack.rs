use axum::http::HeaderMap;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha512;
use subtle::ConstantTimeEq;

use super::{ActivationCharge, CHARGE_SUCCESS, CartLine, OrderCharge, WebhookEvent};
use crate::error::{AppError, Result, msg};
use crate::models::BillingInterval;

type HmacSha512 = Hmac<Sha512>;

/// Header the provider signs deliveries with.
pub const SIGNATURE_HEADER: &str = "x-paystack-signature";
/// Alternate header accepted when the primary one is absent.
pub const FALLBACK_SIGNATURE_HEADER: &str = "x-webhook-signature";

pub struct PaystackVerifier {
    webhook_secret: String,
}

impl PaystackVerifier {
    pub fn new(webhook_secret: impl Into<String>) -> Self {
        Self {
            webhook_secret: webhook_secret.into(),
        }
    }

    /// Checks `signature` against HMAC-SHA512 of the raw body, hex encoded.
    /// The comparison is case-sensitive.
    pub fn verify(&self, payload: &[u8], signature: &str) -> Result<bool> {
        let mut mac = HmacSha512::new_from_slice(self.webhook_secret.as_bytes())
            .map_err(|_| AppError::Internal(msg::INVALID_WEBHOOK_SECRET.into()))?;
        mac.update(payload);
        let expected = hex::encode(mac.finalize().into_bytes());

        // Length is not secret (always 128 hex chars for SHA-512)
        let expected_bytes = expected.as_bytes();
        let provided_bytes = signature.as_bytes();
        if expected_bytes.len() != provided_bytes.len() {
            return Ok(false);
        }

        Ok(expected_bytes.ct_eq(provided_bytes).into())
    }
}

/// Signature from the primary header, else the fallback. A header that is
/// empty or not valid header text counts as absent.
pub fn extract_signature(headers: &HeaderMap) -> Option<&str> {
    [SIGNATURE_HEADER, FALLBACK_SIGNATURE_HEADER]
        .iter()
        .find_map(|name| {
            headers
                .get(*name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|s| !s.is_empty())
        })
}

#[derive(Debug, Deserialize)]
struct PaystackEnvelope {
    event: String,
    #[serde(default)]
    data: serde_json::Value,
}

#[derive(Debug, Default, Deserialize)]
struct ChargeData {
    reference: Option<String>,
    amount: Option<i64>,
    currency: Option<String>,
    customer: Option<PaystackCustomer>,
}

#[derive(Debug, Default, Deserialize)]
struct PaystackCustomer {
    email: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChargeMetadata {
    cart: Option<Vec<PaystackCartLine>>,
    store_id: Option<String>,
    shipping_address: Option<serde_json::Value>,
    user_id: Option<String>,
    plan: Option<String>,
    plan_tier: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PaystackCartLine {
    id: String,
    #[serde(default)]
    quantity: i64,
}

/// A signed delivery whose body cannot be settled. Logged, never alerted.
#[derive(Debug, Clone, PartialEq)]
pub struct MalformedEvent {
    pub event_type: String,
    pub reference: Option<String>,
    pub reason: String,
}

impl MalformedEvent {
    fn new(event_type: &str, reference: Option<&str>, reason: impl Into<String>) -> Self {
        Self {
            event_type: event_type.to_string(),
            reference: reference.map(str::to_string),
            reason: reason.into(),
        }
    }
}

/// Parses a raw webhook body into a [`WebhookEvent`].
///
/// Event types other than `charge.success` are returned as
/// [`WebhookEvent::Other`] without looking at `data`.
pub fn parse_event(
    body: &[u8],
    default_currency: &str,
) -> std::result::Result<WebhookEvent, MalformedEvent> {
    let envelope: PaystackEnvelope = serde_json::from_slice(body)
        .map_err(|e| MalformedEvent::new("unknown", None, format!("{}: {}", msg::INVALID_PAYLOAD, e)))?;

    if envelope.event != CHARGE_SUCCESS {
        return Ok(WebhookEvent::Other(envelope.event));
    }
    let event_type = envelope.event.as_str();

    let mut data = envelope.data;
    let metadata = data
        .as_object_mut()
        .and_then(|obj| obj.remove("metadata"))
        .filter(|m| m.is_object());
    let charge: ChargeData = serde_json::from_value(data).unwrap_or_default();
    let reference = charge
        .reference
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_string);

    let malformed = |reason: &str| MalformedEvent::new(event_type, reference.as_deref(), reason);

    let Some(reference) = reference.clone() else {
        return Err(malformed(msg::MISSING_REFERENCE));
    };
    let Some(metadata) = metadata else {
        return Err(malformed(msg::MISSING_METADATA));
    };
    let metadata: ChargeMetadata = serde_json::from_value(metadata)
        .map_err(|e| malformed(&format!("{}: {}", msg::UNRECOGNIZED_METADATA, e)))?;

    let minor_units = charge.amount.ok_or_else(|| malformed(msg::MISSING_AMOUNT))?;
    if minor_units < 0 {
        return Err(malformed(msg::NEGATIVE_AMOUNT));
    }
    let amount = minor_units as f64 / 100.0;
    let currency = charge
        .currency
        .filter(|c| !c.trim().is_empty())
        .unwrap_or_else(|| default_currency.to_string());
    let customer_email = charge.customer.and_then(|c| c.email);

    if let Some(cart) = metadata.cart {
        let store_id = metadata
            .store_id
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| malformed(msg::MISSING_STORE_ID))?;
        if cart.is_empty() {
            return Err(malformed(msg::EMPTY_CART));
        }
        if cart.iter().any(|line| line.quantity < 1) {
            return Err(malformed(msg::INVALID_QUANTITY));
        }
        return Ok(WebhookEvent::ChargeSuccessOrder(OrderCharge {
            reference,
            amount,
            currency,
            customer_email,
            store_id,
            shipping_address: metadata.shipping_address.filter(|a| !a.is_null()),
            cart: cart
                .into_iter()
                .map(|line| CartLine {
                    product_id: line.id,
                    quantity: line.quantity,
                })
                .collect(),
        }));
    }

    if let Some(user_id) = metadata.user_id.filter(|u| !u.trim().is_empty()) {
        let plan_tier = metadata
            .plan_tier
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| malformed(msg::MISSING_PLAN_TIER))?;
        let billing_interval = match metadata.plan.as_deref() {
            None => BillingInterval::Monthly,
            Some(plan) => plan
                .parse::<BillingInterval>()
                .map_err(|_| malformed(msg::INVALID_BILLING_INTERVAL))?,
        };
        return Ok(WebhookEvent::ChargeSuccessActivation(ActivationCharge {
            reference,
            amount,
            currency,
            customer_email,
            user_id,
            billing_interval,
            plan_tier,
        }));
    }

    Err(malformed(msg::UNRECOGNIZED_METADATA))
}
