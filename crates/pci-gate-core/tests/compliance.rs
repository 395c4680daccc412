// crates/pci-gate-core/tests/compliance.rs
// ============================================================================
// Module: Compliance Utility Tests
// Description: Quarterly assessment scheduling and breach response plans.
// ============================================================================
//! ## Overview
//! All timestamps are supplied explicitly.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use pci_gate_core::IncidentSeverity;
use pci_gate_core::PciBreachIncidentInput;
use pci_gate_core::PciError;
use pci_gate_core::core::time::add_calendar_months;
use pci_gate_core::core::time::format_rfc3339;
use pci_gate_core::core::time::parse_rfc3339;
use pci_gate_core::create_pci_breach_incident_response;
use pci_gate_core::get_quarterly_assessment_status;
use pci_gate_core::runtime::incident::ESCALATION_ACTION;
use pci_gate_core::runtime::incident::NOTIFICATION_ACTIONS;
use serde_json::json;
use time::Duration;

// ============================================================================
// SECTION: Scheduler
// ============================================================================

#[test]
fn assessment_100_days_ago_is_overdue() {
    let now = parse_rfc3339("2026-06-15T09:00:00Z").unwrap();
    let last = now - Duration::days(100);
    let status =
        get_quarterly_assessment_status(Some(&format_rfc3339(last)), Some(now)).unwrap();
    assert!(status.overdue);
    assert_eq!(status.next_assessment_due_at, add_calendar_months(last, 3).unwrap());
    assert_eq!(status.last_assessment_at, Some(last));
    assert!(status.days_until_due < 0);
}

#[test]
fn no_prior_assessment_is_due_in_three_months() {
    let now = parse_rfc3339("2026-01-10T00:00:00Z").unwrap();
    let status = get_quarterly_assessment_status(None, Some(now)).unwrap();
    assert!(!status.overdue);
    assert_eq!(format_rfc3339(status.next_assessment_due_at), "2026-04-10T00:00:00Z");
    assert_eq!(status.days_until_due, 90);
    assert_eq!(status.last_assessment_at, None);
}

#[test]
fn partial_days_round_up() {
    let now = parse_rfc3339("2026-01-10T12:00:00Z").unwrap();
    let status =
        get_quarterly_assessment_status(Some("2025-10-09T00:00:00Z"), Some(now)).unwrap();
    assert!(status.overdue);
    assert_eq!(status.days_until_due, -1);
    let status =
        get_quarterly_assessment_status(Some("2025-10-11T00:00:00Z"), Some(now)).unwrap();
    assert!(!status.overdue);
    assert_eq!(status.days_until_due, 1);
}

#[test]
fn month_end_dates_clamp() {
    let last = parse_rfc3339("2025-11-30T08:00:00Z").unwrap();
    assert_eq!(format_rfc3339(add_calendar_months(last, 3).unwrap()), "2026-02-28T08:00:00Z");
    let leap = parse_rfc3339("2027-11-30T08:00:00Z").unwrap();
    assert_eq!(format_rfc3339(add_calendar_months(leap, 3).unwrap()), "2028-02-29T08:00:00Z");
}

#[test]
fn unparseable_timestamp_fails() {
    let err = get_quarterly_assessment_status(Some("last tuesday"), None).unwrap_err();
    assert!(matches!(err, PciError::InvalidTimestamp(_)));
}

#[test]
fn status_serializes_camel_case() {
    let now = parse_rfc3339("2026-01-10T00:00:00Z").unwrap();
    let status = get_quarterly_assessment_status(None, Some(now)).unwrap();
    let value = serde_json::to_value(&status).unwrap();
    assert_eq!(value["nextAssessmentDueAt"], json!("2026-04-10T00:00:00Z"));
    assert_eq!(value["lastAssessmentAt"], json!(null));
    assert_eq!(value["daysUntilDue"], json!(90));
}

// ============================================================================
// SECTION: Incident Responder
// ============================================================================

#[test]
fn lists_are_deduplicated_in_order() {
    let incident = create_pci_breach_incident_response(PciBreachIncidentInput {
        severity: IncidentSeverity::Medium,
        suspected_systems: vec![
            "api".to_string(),
            " db ".to_string(),
            "api".to_string(),
            String::new(),
        ],
        suspected_data_types: vec!["email".to_string(), "email".to_string()],
        detected_at: Some(parse_rfc3339("2026-05-01T00:00:00Z").unwrap()),
    });
    assert_eq!(incident.suspected_systems, vec!["api", "db"]);
    assert_eq!(incident.suspected_data_types, vec!["email"]);
    assert_eq!(format_rfc3339(incident.detected_at), "2026-05-01T00:00:00Z");
    assert!(!incident.containment_actions.is_empty());
    assert!(!incident.investigation_actions.is_empty());
    assert_eq!(incident.notification_actions.len(), NOTIFICATION_ACTIONS.len());
}

#[test]
fn high_and_critical_prepend_escalation() {
    for severity in [IncidentSeverity::High, IncidentSeverity::Critical] {
        let incident = create_pci_breach_incident_response(PciBreachIncidentInput {
            severity,
            suspected_systems: Vec::new(),
            suspected_data_types: Vec::new(),
            detected_at: None,
        });
        assert_eq!(incident.notification_actions[0], ESCALATION_ACTION);
        assert_eq!(incident.notification_actions.len(), NOTIFICATION_ACTIONS.len() + 1);
    }
    let low = create_pci_breach_incident_response(PciBreachIncidentInput {
        severity: IncidentSeverity::Low,
        suspected_systems: Vec::new(),
        suspected_data_types: Vec::new(),
        detected_at: None,
    });
    assert!(!low.notification_actions.iter().any(|action| action == ESCALATION_ACTION));
}

#[test]
fn incident_ids_are_unique_and_prefixed() {
    let input: PciBreachIncidentInput =
        serde_json::from_value(json!({ "severity": "critical", "suspectedSystems": ["api"] }))
            .unwrap();
    let first = create_pci_breach_incident_response(input.clone());
    let second = create_pci_breach_incident_response(input);
    assert!(first.incident_id.starts_with("pci-inc-"));
    assert_eq!(first.incident_id.rsplit('-').next().unwrap().len(), 8);
    assert_ne!(first.incident_id, second.incident_id);
}
