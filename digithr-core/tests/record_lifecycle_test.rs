//! Resource record lifecycle tests
//!
//! Drives each record type through the path a repository takes:
//! - validate a create body into a draft
//! - materialize it with an id and creation time
//! - validate and merge a partial update
//! - serialize to the wire shape

use chrono::{TimeZone, Utc};
use digithr_core::alert::SecurityAlertInput;
use digithr_core::maintenance::MaintenanceScheduleInput;
use digithr_core::notification::NotificationInput;
use digithr_core::production::ProductionActivityInput;
use digithr_core::{
    MaintenanceSchedule, Notification, ProductionActivity, Record, SecurityAlert,
};
use serde_json::{json, Value};

fn materialize<T: Record>(id: i64, input: T::Input) -> T {
    let draft = T::validate_new(input).expect("valid create body");
    T::from_draft(id, draft, Utc.with_ymd_and_hms(2025, 1, 15, 8, 0, 0).unwrap())
}

fn input<T: Record>(body: Value) -> T::Input {
    serde_json::from_value(body).expect("deserializable body")
}

/// Test: a production activity keeps its display status on the wire
#[test]
fn test_production_activity_wire_shape() {
    let activity: ProductionActivity = materialize(
        1,
        input::<ProductionActivity>(json!({
            "name": "Extraction phosphate Zone A",
            "responsible": "Ahmed Benali",
            "status": "En cours",
            "date": "2025-01-15T08:00:00.000Z"
        })),
    );

    let wire = serde_json::to_value(&activity).unwrap();
    assert_eq!(wire["id"], 1);
    assert_eq!(wire["status"], "En cours");
    assert_eq!(wire["date"], "2025-01-15T08:00:00.000Z");
    assert_eq!(wire["createdAt"], "2025-01-15T08:00:00.000Z");
}

/// Test: a partial update only touches the fields it names
#[test]
fn test_production_partial_update() {
    let mut activity: ProductionActivity = materialize(
        1,
        input::<ProductionActivity>(json!({
            "name": "Transport minerai",
            "responsible": "Fatima Zahra",
            "date": "2025-01-15T10:00:00Z"
        })),
    );
    let before = activity.clone();

    let patch = ProductionActivity::validate_patch(input::<ProductionActivity>(json!({
        "status": "Terminée"
    })))
    .unwrap();
    activity.apply(patch);

    let wire = serde_json::to_value(&activity).unwrap();
    assert_eq!(wire["status"], "Terminée");
    assert_eq!(activity.name, before.name);
    assert_eq!(activity.responsible, before.responsible);
    assert_eq!(activity.date, before.date);
}

/// Test: an invalid enum in an update is rejected, not ignored
#[test]
fn test_patch_with_unknown_status_rejected() {
    let errors = ProductionActivity::validate_patch(input::<ProductionActivity>(json!({
        "status": "Annulée"
    })))
    .unwrap_err();
    assert!(errors.get("status").is_some());
}

/// Test: bare maintenance dates become midnight UTC, full instants pass through
#[test]
fn test_maintenance_date_normalization() {
    let bare: MaintenanceSchedule = materialize(
        1,
        input::<MaintenanceSchedule>(json!({
            "machine": "Convoyeur C-12",
            "type": "Corrective",
            "description": "Remplacement bande transporteuse",
            "scheduledDate": "2025-03-10"
        })),
    );
    let full: MaintenanceSchedule = materialize(
        2,
        input::<MaintenanceSchedule>(json!({
            "machine": "Concasseur primaire",
            "type": "Urgente",
            "description": "Vibrations anormales",
            "scheduledDate": "2025-03-10T14:30:00.000Z"
        })),
    );

    let bare = serde_json::to_value(&bare).unwrap();
    let full = serde_json::to_value(&full).unwrap();
    assert_eq!(bare["scheduledDate"], "2025-03-10T00:00:00.000Z");
    assert_eq!(bare["status"], "Planifiée");
    assert_eq!(bare["type"], "Corrective");
    assert_eq!(full["scheduledDate"], "2025-03-10T14:30:00.000Z");
}

/// Test: resolving an alert is a one-field patch
#[test]
fn test_alert_resolution() {
    let mut alert: SecurityAlert = materialize(
        3,
        input::<SecurityAlert>(json!({
            "type": "Équipement non conforme",
            "zone": "Zone 1 - Extraction",
            "message": "Casque de sécurité manquant",
            "severity": "medium"
        })),
    );
    assert!(!alert.resolved);

    alert.apply(
        SecurityAlert::validate_patch(input::<SecurityAlert>(json!({ "resolved": true }))).unwrap(),
    );
    let wire = serde_json::to_value(&alert).unwrap();
    assert_eq!(wire["resolved"], true);
    assert_eq!(wire["type"], "Équipement non conforme");
    assert_eq!(wire["severity"], "medium");
}

/// Test: a notification create reports every missing field at once
#[test]
fn test_notification_missing_fields() {
    let errors = Notification::validate_new(NotificationInput::default()).unwrap_err();
    assert!(errors.get("title").is_some());
    assert!(errors.get("message").is_some());
    assert!(errors.get("type").is_some());
}

/// Test: unknown JSON fields are tolerated on every input type
#[test]
fn test_unknown_fields_ignored() {
    let body = json!({ "id": 99, "createdAt": "2020-01-01", "extra": true });
    let _: ProductionActivityInput = serde_json::from_value(body.clone()).unwrap();
    let _: MaintenanceScheduleInput = serde_json::from_value(body.clone()).unwrap();
    let _: SecurityAlertInput = serde_json::from_value(body.clone()).unwrap();
    let _: NotificationInput = serde_json::from_value(body).unwrap();
}
