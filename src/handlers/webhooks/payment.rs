use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    response::Response,
};

use super::common::{
    ProcessOutcome, acknowledged, misconfigured, process_charge, rejected, settlement_failed,
};
use crate::db::AppState;
use crate::error::msg;
use crate::notify::spawn_notification;
use crate::payments::{PaystackVerifier, WebhookEvent, extract_signature, parse_event};
use crate::util::WebhookLogBuilder;

/// Inbound payment webhook.
///
/// Only a missing secret (500) or a bad signature (401) produce a non-200;
/// everything after the signature check is acknowledged so the provider does
/// not retry application errors.
pub async fn handle_payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let Some(secret) = state.webhook_secret.as_deref() else {
        tracing::error!("Payment webhook received but no webhook secret is configured");
        return misconfigured(msg::WEBHOOK_SECRET_NOT_CONFIGURED);
    };

    let Some(signature) = extract_signature(&headers) else {
        tracing::warn!("Payment webhook rejected: no signature header");
        return rejected(msg::INVALID_SIGNATURE);
    };

    match PaystackVerifier::new(secret).verify(&body, signature) {
        Ok(true) => {}
        Ok(false) => {
            tracing::warn!("Payment webhook rejected: signature mismatch");
            return rejected(msg::INVALID_SIGNATURE);
        }
        Err(e) => {
            tracing::error!("Signature verification failed: {}", e);
            return misconfigured(msg::INVALID_WEBHOOK_SECRET);
        }
    }

    let (event_type, reference, outcome) = match parse_event(&body, &state.default_currency) {
        Err(malformed) => {
            tracing::warn!(
                event_type = %malformed.event_type,
                reference = ?malformed.reference,
                "Malformed payment webhook: {}",
                malformed.reason
            );
            (
                malformed.event_type,
                malformed.reference,
                ProcessOutcome::malformed(malformed.reason),
            )
        }
        Ok(WebhookEvent::Other(event_type)) => {
            tracing::debug!(event_type = %event_type, "Ignoring payment webhook event");
            (event_type, None, ProcessOutcome::ignored())
        }
        Ok(event) => {
            let event_type = event.event_type().to_string();
            let reference = event.reference().map(str::to_string);
            let task_state = state.clone();
            let task_event = event.clone();
            let outcome =
                match tokio::task::spawn_blocking(move || process_charge(&task_state, &task_event)).await {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        tracing::error!("Settlement task failed: {}", e);
                        settlement_failed(&state, &event, &format!("Settlement task failed: {}", e))
                    }
                };
            (event_type, reference, outcome)
        }
    };

    match state.audit.get() {
        Ok(audit_conn) => {
            let mut log = WebhookLogBuilder::new(&audit_conn, state.webhook_log_enabled, &headers, &body)
                .event_type(&event_type)
                .reference(reference.as_deref())
                .disposition(outcome.disposition);
            if let Some(error) = outcome.error.as_deref() {
                log = log.error(error);
            }
            log.record();
        }
        Err(e) => tracing::warn!("Webhook log DB unavailable: {}", e),
    }

    if let Some(notification) = outcome.notification {
        spawn_notification(state.notifier.clone(), notification);
    }

    acknowledged()
}
