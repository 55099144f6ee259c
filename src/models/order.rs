use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};

/// Order lifecycle. Only `Pending` is produced here; fulfilment and
/// cancellation are driven by the storefront.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Fulfilled,
    Cancelled,
}

/// Order created from a successful charge. One per payment reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Derived from `payment_reference`, see `id::order_id_for_reference`
    pub id: String,
    pub store_id: String,
    pub status: OrderStatus,
    pub customer_email: Option<String>,
    pub shipping_address: Option<serde_json::Value>,
    pub payment_reference: String,
    /// Amount captured by the processor, in currency units
    pub total_amount: f64,
    pub currency: String,
    pub created_at: i64,
}

/// Line item snapshot. Prices are copied from the catalog at settlement time
/// so later catalog edits never rewrite history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: String,
    pub order_id: String,
    pub product_id: String,
    pub product_name: String,
    pub vendor_id: String,
    pub quantity: i64,
    pub retail_price: f64,
    pub wholesale_cost: f64,
}

#[derive(Debug, Clone)]
pub struct CreateOrder {
    pub id: String,
    pub store_id: String,
    pub customer_email: Option<String>,
    pub shipping_address: Option<serde_json::Value>,
    pub payment_reference: String,
    pub total_amount: f64,
    pub currency: String,
}

#[derive(Debug, Clone)]
pub struct CreateOrderItem {
    pub product_id: String,
    pub product_name: String,
    pub vendor_id: String,
    pub quantity: i64,
    pub retail_price: f64,
    pub wholesale_cost: f64,
}
