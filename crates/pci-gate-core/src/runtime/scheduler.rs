// crates/pci-gate-core/src/runtime/scheduler.rs
// ============================================================================
// Module: Compliance Scheduler
// Description: Quarterly self-assessment due-date computation.
// Purpose: Report when the next assessment is due and whether it is overdue.
// Dependencies: time, crate::core
// ============================================================================

//! ## Overview
//! The next assessment is due three calendar months after the last one (or
//! after `now` when none is recorded). Month addition clamps to the last day
//! of the target month.

use time::OffsetDateTime;

use crate::core::compliance::QuarterlyAssessmentStatus;
use crate::core::error::PciError;
use crate::core::time::add_calendar_months;
use crate::core::time::parse_rfc3339;

/// Months between self-assessments.
pub const ASSESSMENT_INTERVAL_MONTHS: u32 = 3;
/// Milliseconds per day.
const MILLIS_PER_DAY: i128 = 86_400_000;

/// Computes assessment status from an optional RFC 3339 timestamp.
///
/// # Errors
///
/// Returns [`PciError::InvalidTimestamp`] when `last_assessment_at` does not
/// parse or the due date is out of range.
pub fn get_quarterly_assessment_status(
    last_assessment_at: Option<&str>,
    now: Option<OffsetDateTime>,
) -> Result<QuarterlyAssessmentStatus, PciError> {
    let last = last_assessment_at.map(parse_rfc3339).transpose()?;
    assessment_status(last, now.unwrap_or_else(OffsetDateTime::now_utc))
}

/// Computes assessment status from parsed instants.
///
/// # Errors
///
/// Returns [`PciError::InvalidTimestamp`] when the due date is out of range.
pub fn assessment_status(
    last_assessment_at: Option<OffsetDateTime>,
    now: OffsetDateTime,
) -> Result<QuarterlyAssessmentStatus, PciError> {
    let base = last_assessment_at.unwrap_or(now);
    let next_due = add_calendar_months(base, ASSESSMENT_INTERVAL_MONTHS).ok_or_else(|| {
        PciError::InvalidTimestamp("assessment due date out of range".to_string())
    })?;
    Ok(QuarterlyAssessmentStatus {
        last_assessment_at,
        next_assessment_due_at: next_due,
        overdue: now > next_due,
        days_until_due: days_until(now, next_due),
    })
}

/// Whole days from `now` to `due`, rounded toward positive infinity.
fn days_until(now: OffsetDateTime, due: OffsetDateTime) -> i64 {
    let millis = (due - now).whole_milliseconds();
    let days = millis.div_euclid(MILLIS_PER_DAY)
        + i128::from(millis.rem_euclid(MILLIS_PER_DAY) != 0);
    i64::try_from(days).unwrap_or(if days.is_negative() { i64::MIN } else { i64::MAX })
}
