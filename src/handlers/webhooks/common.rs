//! Settlement dispatch for signed payment webhooks.
//!
//! Everything here runs after the signature has been checked. Money is only
//! written by the ledger; this module decides what the delivery means, raises
//! an alert when settlement fails and picks the customer notification.

use axum::{Json, http::StatusCode, response::IntoResponse, response::Response};
use chrono::Utc;
use serde_json::json;

use crate::alerting::raise_alert;
use crate::db::AppState;
use crate::error::AppError;
use crate::models::Disposition;
use crate::notify::Notification;
use crate::payments::{ActivationCharge, OrderCharge, WebhookEvent};
use crate::settlement::{self, ReferralOutcome, SettleOutcome};

/// 200 `{"status":"success"}`, returned for every delivery that passed the
/// signature check, whatever happened afterwards.
pub fn acknowledged() -> Response {
    (StatusCode::OK, Json(json!({ "status": "success" }))).into_response()
}

pub fn rejected(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "status": "error", "message": message })),
    )
        .into_response()
}

pub fn misconfigured(message: &str) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "status": "error", "message": message })),
    )
        .into_response()
}

/// How a delivery was handled, for the webhook log and notifier.
#[derive(Debug)]
pub struct ProcessOutcome {
    pub disposition: Disposition,
    pub error: Option<String>,
    pub notification: Option<Notification>,
}

impl ProcessOutcome {
    fn new(disposition: Disposition) -> Self {
        Self {
            disposition,
            error: None,
            notification: None,
        }
    }

    pub fn ignored() -> Self {
        Self::new(Disposition::Ignored)
    }

    pub fn malformed(reason: impl Into<String>) -> Self {
        Self {
            error: Some(reason.into()),
            ..Self::new(Disposition::Malformed)
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::new(Disposition::Error)
        }
    }

    fn notify(mut self, notification: Notification) -> Self {
        self.notification = Some(notification);
        self
    }
}

/// Settles a `charge.success` event. Blocking: run it off the async runtime.
///
/// On failure the ledger transaction has already rolled back; an alert is
/// raised and the customer gets a payment-issue notice.
pub fn process_charge(state: &AppState, event: &WebhookEvent) -> ProcessOutcome {
    let now = Utc::now().timestamp();
    let result = match event {
        WebhookEvent::ChargeSuccessOrder(charge) => process_order(state, charge, now),
        WebhookEvent::ChargeSuccessActivation(charge) => process_activation(state, charge, now),
        WebhookEvent::Other(_) => return ProcessOutcome::ignored(),
    };

    match result {
        Ok(outcome) => outcome,
        Err(e) => settlement_failed(state, event, &e.to_string()),
    }
}

/// Failure path for a charge that did not settle: raises an alert and queues
/// a payment-issue notice for the customer.
pub fn settlement_failed(state: &AppState, event: &WebhookEvent, error: &str) -> ProcessOutcome {
    let reference = event.reference().unwrap_or_default();
    raise_alert(&state.db, reference, event.event_type(), error);
    let customer_email = match event {
        WebhookEvent::ChargeSuccessOrder(c) => c.customer_email.clone(),
        WebhookEvent::ChargeSuccessActivation(c) => c.customer_email.clone(),
        WebhookEvent::Other(_) => None,
    };
    ProcessOutcome::failed(error).notify(Notification::PaymentIssue {
        payment_reference: reference.to_string(),
        customer_email,
    })
}

fn process_order(
    state: &AppState,
    charge: &OrderCharge,
    now: i64,
) -> Result<ProcessOutcome, AppError> {
    let mut conn = state.db.get()?;
    match settlement::settle_order(&mut conn, charge, &state.platform_vendor_id, now)? {
        SettleOutcome::AlreadyProcessed => {
            tracing::info!(reference = %charge.reference, "Order already settled, ignoring replay");
            Ok(ProcessOutcome::new(Disposition::Duplicate))
        }
        SettleOutcome::Committed(settled) => {
            tracing::info!(
                reference = %charge.reference,
                order_id = %settled.order.id,
                items = settled.items.len(),
                payouts = settled.payouts.len(),
                platform_fees = settled.revenue.len(),
                store_profit = settled.store_profit,
                "Order settled"
            );
            Ok(ProcessOutcome::new(Disposition::Processed).notify(Notification::OrderConfirmed {
                payment_reference: charge.reference.clone(),
                order_id: settled.order.id,
                customer_email: charge.customer_email.clone(),
                amount: charge.amount,
                currency: charge.currency.clone(),
                item_count: settled.items.len(),
            }))
        }
    }
}

fn process_activation(
    state: &AppState,
    charge: &ActivationCharge,
    now: i64,
) -> Result<ProcessOutcome, AppError> {
    let mut conn = state.db.get()?;
    match settlement::activate_subscription(&mut conn, charge, &state.plan_pricing, now)? {
        SettleOutcome::AlreadyProcessed => {
            tracing::info!(reference = %charge.reference, "Activation already recorded, ignoring replay");
            Ok(ProcessOutcome::new(Disposition::Duplicate))
        }
        SettleOutcome::Committed(record) => {
            match &record.referral {
                ReferralOutcome::Rewarded(payout) => tracing::info!(
                    reference = %charge.reference,
                    user_id = %record.user_id,
                    referrer_id = %payout.recipient_id,
                    reward = payout.amount,
                    matures_at = ?payout.matures_at,
                    "Plan activated, referral reward held"
                ),
                ReferralOutcome::ReferrerInactive(referrer_id) => tracing::info!(
                    reference = %charge.reference,
                    user_id = %record.user_id,
                    referrer_id = %referrer_id,
                    "Plan activated, referrer has no access so no reward"
                ),
                other => tracing::info!(
                    reference = %charge.reference,
                    user_id = %record.user_id,
                    referral = ?other,
                    "Plan activated"
                ),
            }
            Ok(ProcessOutcome::new(Disposition::Processed).notify(Notification::PlanActivated {
                payment_reference: charge.reference.clone(),
                user_id: record.user_id,
                customer_email: charge.customer_email.clone(),
                plan_tier: charge.plan_tier.clone(),
                billing_interval: charge.billing_interval.as_ref().to_string(),
            }))
        }
    }
}
