//! Alert and webhook log tests

#[path = "../common/mod.rs"]
mod common;

use common::*;
use soma_settlement::alerting::raise_alert;

#[test]
fn test_alert_lifecycle() {
    let conn = setup_test_db();
    let first = queries::create_alert(&conn, "ref_1", "charge.success", "Product not found: p9").unwrap();
    queries::create_alert(&conn, "ref_2", "charge.success", "User not found: u9").unwrap();

    let open = queries::list_unresolved_alerts(&conn).unwrap();
    assert_eq!(open.len(), 2);
    assert!(!open[0].resolved);

    queries::resolve_alert(&conn, &first.id).unwrap();
    let open = queries::list_unresolved_alerts(&conn).unwrap();
    assert_eq!(open.len(), 1);
    assert_eq!(open[0].payment_reference, "ref_2");

    assert!(queries::resolve_alert(&conn, "sm_alr_missing").is_err());
}

#[test]
fn test_raise_alert_uses_pool() {
    let app = TestApp::new();
    let alert = raise_alert(&app.state.db, "ref_pool", "charge.success", "boom").unwrap();
    assert_eq!(alert.error_message, "boom");

    let open = queries::list_unresolved_alerts(&app.conn()).unwrap();
    assert_eq!(open.len(), 1);
    assert_eq!(open[0].id, alert.id);
}

#[test]
fn test_webhook_log_status_follows_disposition() {
    let conn = setup_test_audit_db();
    let entry = queries::create_webhook_log(
        &conn,
        &CreateWebhookLog {
            event_type: "charge.success".into(),
            payment_reference: Some("ref_log".into()),
            payload: "{}".into(),
            disposition: Disposition::Malformed,
            error_message: Some("Event has no metadata".into()),
            ip_address: None,
            user_agent: None,
        },
    )
    .unwrap();
    assert_eq!(entry.status, LogStatus::Failed);

    let logs = queries::list_webhook_logs_for_reference(&conn, "ref_log").unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].disposition, Disposition::Malformed);
    assert_eq!(logs[0].status, LogStatus::Failed);
    assert_eq!(queries::count_webhook_logs(&conn).unwrap(), 1);
}
