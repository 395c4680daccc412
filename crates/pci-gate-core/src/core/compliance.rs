// crates/pci-gate-core/src/core/compliance.rs
// ============================================================================
// Module: Compliance Records
// Description: Self-assessment scheduling state and breach response plans.
// Purpose: Provide serializable results for the standalone compliance tools.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! Both records are computed on demand from caller-supplied timestamps and
//! own no persistent state.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use time::OffsetDateTime;

use crate::core::time::serialize_rfc3339;
use crate::core::time::serialize_rfc3339_opt;

// ============================================================================
// SECTION: Quarterly Assessment
// ============================================================================

/// Scheduling state for the recurring self-assessment.
///
/// # Invariants
/// - `next_assessment_due_at` is the last assessment (or `now` when none)
///   plus three calendar months.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuarterlyAssessmentStatus {
    /// Last completed assessment, when known.
    #[serde(serialize_with = "serialize_rfc3339_opt")]
    pub last_assessment_at: Option<OffsetDateTime>,
    /// Due date of the next assessment.
    #[serde(serialize_with = "serialize_rfc3339")]
    pub next_assessment_due_at: OffsetDateTime,
    /// True when `now` is past the due date.
    pub overdue: bool,
    /// Whole days until due, rounded up; negative when overdue.
    pub days_until_due: i64,
}

// ============================================================================
// SECTION: Breach Incident
// ============================================================================

/// Incident severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncidentSeverity {
    /// Low severity.
    Low,
    /// Medium severity.
    Medium,
    /// High severity.
    High,
    /// Critical severity.
    Critical,
}

impl IncidentSeverity {
    /// Returns the stable wire label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }

    /// Returns true when the severity requires round-the-clock escalation.
    #[must_use]
    pub const fn requires_escalation(self) -> bool {
        matches!(self, Self::High | Self::Critical)
    }
}

impl fmt::Display for IncidentSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inputs for generating a breach response plan.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PciBreachIncidentInput {
    /// Detected severity.
    pub severity: IncidentSeverity,
    /// Systems suspected to be affected.
    #[serde(default)]
    pub suspected_systems: Vec<String>,
    /// Data types suspected to be exposed.
    #[serde(default)]
    pub suspected_data_types: Vec<String>,
    /// Detection time; defaults to now.
    #[serde(default, deserialize_with = "crate::core::time::deserialize_rfc3339_opt")]
    pub detected_at: Option<OffsetDateTime>,
}

/// Generated breach response plan.
///
/// # Invariants
/// - System and data-type lists contain no duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PciBreachIncident {
    /// Unique incident identifier.
    pub incident_id: String,
    /// Detection time.
    #[serde(serialize_with = "serialize_rfc3339")]
    pub detected_at: OffsetDateTime,
    /// Detected severity.
    pub severity: IncidentSeverity,
    /// Deduplicated affected systems.
    pub suspected_systems: Vec<String>,
    /// Deduplicated exposed data types.
    pub suspected_data_types: Vec<String>,
    /// Containment checklist.
    pub containment_actions: Vec<String>,
    /// Notification checklist.
    pub notification_actions: Vec<String>,
    /// Investigation checklist.
    pub investigation_actions: Vec<String>,
}
