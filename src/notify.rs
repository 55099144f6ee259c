//! Customer notifications after settlement.
//!
//! When `NOTIFY_WEBHOOK_URL` is set, each settled (or failed) charge is POSTed
//! there as JSON and the mail service behind it takes care of templating and
//! delivery. Sending happens on a spawned task after the ledger transaction
//! has finished; nothing here can affect committed money.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use reqwest::Client;
use serde::Serialize;
use thiserror::Error;

/// Retry delays in milliseconds (0.25s, 1s, 4s).
const NOTIFY_RETRY_DELAYS_MS: &[u64] = &[250, 1000, 4000];

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Notification {
    OrderConfirmed {
        payment_reference: String,
        order_id: String,
        customer_email: Option<String>,
        amount: f64,
        currency: String,
        item_count: usize,
    },
    PlanActivated {
        payment_reference: String,
        user_id: String,
        customer_email: Option<String>,
        plan_tier: String,
        billing_interval: String,
    },
    /// Charge captured but settlement rolled back; support will follow up
    PaymentIssue {
        payment_reference: String,
        customer_email: Option<String>,
    },
}

impl Notification {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::OrderConfirmed { .. } => "order_confirmed",
            Self::PlanActivated { .. } => "plan_activated",
            Self::PaymentIssue { .. } => "payment_issue",
        }
    }

    pub fn payment_reference(&self) -> &str {
        match self {
            Self::OrderConfirmed { payment_reference, .. }
            | Self::PlanActivated { payment_reference, .. }
            | Self::PaymentIssue { payment_reference, .. } => payment_reference,
        }
    }
}

/// What happened to a notification. Callers log it and move on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyOutcome {
    Sent { attempts: usize },
    /// Receiver answered with a 4xx; retrying would not help
    Rejected { status: u16 },
    /// No notification URL configured
    Disabled,
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification not delivered after {attempts} attempts")]
    Exhausted { attempts: usize },
}

pub struct Notifier {
    client: Client,
    url: Option<String>,
}

impl Notifier {
    pub fn new(client: Client, url: Option<String>) -> Self {
        Self { client, url }
    }

    pub fn disabled() -> Self {
        Self::new(Client::new(), None)
    }

    pub fn is_enabled(&self) -> bool {
        self.url.is_some()
    }

    /// POSTs the notification, retrying network errors, 429 and 5xx.
    pub async fn send(&self, notification: &Notification) -> Result<NotifyOutcome, NotifyError> {
        let Some(url) = self.url.as_deref() else {
            return Ok(NotifyOutcome::Disabled);
        };

        for (attempt, delay_ms) in std::iter::once(&0u64)
            .chain(NOTIFY_RETRY_DELAYS_MS.iter())
            .enumerate()
        {
            if *delay_ms > 0 {
                tracing::debug!(attempt, delay_ms, "Retrying notification");
                tokio::time::sleep(Duration::from_millis(*delay_ms)).await;
            }

            match self
                .client
                .post(url)
                .header("X-Soma-Event", notification.kind())
                .json(notification)
                .timeout(REQUEST_TIMEOUT)
                .send()
                .await
            {
                Ok(resp) if resp.status().is_success() => {
                    return Ok(NotifyOutcome::Sent { attempts: attempt + 1 });
                }
                Ok(resp) => {
                    let status = resp.status();
                    if status.as_u16() != 429 && !status.is_server_error() {
                        return Ok(NotifyOutcome::Rejected { status: status.as_u16() });
                    }
                    tracing::debug!(status = %status, "Notification receiver returned transient error");
                }
                Err(e) => {
                    tracing::debug!(error = %e, "Notification request failed");
                }
            }
        }

        Err(NotifyError::Exhausted {
            attempts: NOTIFY_RETRY_DELAYS_MS.len() + 1,
        })
    }
}

/// Sends a notification on a background task.
///
/// The outcome is logged and discarded. Panics in the task are logged rather
/// than lost.
pub fn spawn_notification(notifier: Arc<Notifier>, notification: Notification) {
    if !notifier.is_enabled() {
        return;
    }
    let kind = notification.kind();
    let reference = notification.payment_reference().to_string();
    tokio::spawn(
        AssertUnwindSafe(async move {
            match notifier.send(&notification).await {
                Ok(NotifyOutcome::Sent { attempts }) => tracing::debug!(
                    kind,
                    reference = %notification.payment_reference(),
                    attempts,
                    "Notification sent"
                ),
                Ok(NotifyOutcome::Rejected { status }) => tracing::warn!(
                    kind,
                    reference = %notification.payment_reference(),
                    status,
                    "Notification rejected by receiver"
                ),
                Ok(NotifyOutcome::Disabled) => {}
                Err(e) => tracing::warn!(
                    kind,
                    reference = %notification.payment_reference(),
                    "Notification failed: {}",
                    e
                ),
            }
        })
        .catch_unwind()
        .map(move |result| {
            if let Err(panic) = result {
                let panic_msg = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                tracing::error!(
                    "Notification task panicked for {} '{}': {}",
                    kind,
                    reference,
                    panic_msg
                );
            }
        }),
    );
}
