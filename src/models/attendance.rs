//! Attendance ledger records.
//!
//! One [`AttendanceRecord`] exists per employee per calendar day. Rows are
//! written by the attendance-recording subsystem and by leave approval.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::LeavePayStatus;

/// The status of one attendance day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    /// Worked a full day.
    Present,
    /// Did not come in.
    Absent,
    /// Covered by an approved leave request.
    Leave,
    /// Government holiday.
    GovtHoliday,
    /// Weekly day off.
    WeeklyOff,
    /// Organisation-declared off day.
    OffDay,
    /// Arrived after the grace period.
    Late,
    /// Clocked in, not yet clocked out.
    ClockedIn,
    /// Worked half a day.
    HalfDay,
    /// Left before the end of the shift.
    Early,
    /// Unpaid leave day.
    UnpaidLeave,
    /// Half-paid leave day.
    HalfPaidLeave,
}

/// A single (employee, day) attendance row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    /// Document id.
    pub id: Uuid,
    /// Owner of the row.
    pub employee_id: String,
    /// The calendar day.
    pub date: NaiveDate,
    /// Day status.
    pub status: AttendanceStatus,
    /// Clock-in time.
    #[serde(default)]
    pub clock_in: Option<NaiveDateTime>,
    /// Clock-out time.
    #[serde(default)]
    pub clock_out: Option<NaiveDateTime>,
    /// Hours between clock-in and clock-out.
    #[serde(default)]
    pub total_hours: Decimal,
    /// Minutes late.
    #[serde(default)]
    pub late_minutes: u32,
    /// Minutes left early.
    #[serde(default)]
    pub early_minutes: u32,
    /// Whether the day counts as late.
    #[serde(default)]
    pub is_late: bool,
    /// Whether the day counts as an early leave.
    #[serde(default)]
    pub is_early: bool,
    /// The leave request that materialized this row.
    #[serde(default)]
    pub leave_id: Option<Uuid>,
    /// Pay status of the covering leave.
    #[serde(default)]
    pub leave_pay_status: Option<LeavePayStatus>,
    /// Free-form remarks.
    #[serde(default)]
    pub remarks: String,
    /// Who created the row.
    pub created_by: String,
    /// Who last updated the row.
    #[serde(default)]
    pub updated_by: Option<String>,
    /// Set when an administrator corrected the row.
    #[serde(default)]
    pub corrected_by_admin: bool,
    /// Soft-delete flag.
    #[serde(default)]
    pub is_deleted: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl AttendanceRecord {
    /// Creates a fresh row for the given day.
    pub fn new(
        employee_id: impl Into<String>,
        date: NaiveDate,
        status: AttendanceStatus,
        created_by: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            employee_id: employee_id.into(),
            date,
            status,
            clock_in: None,
            clock_out: None,
            total_hours: Decimal::ZERO,
            late_minutes: 0,
            early_minutes: 0,
            is_late: status == AttendanceStatus::Late,
            is_early: status == AttendanceStatus::Early,
            leave_id: None,
            leave_pay_status: None,
            remarks: String::new(),
            created_by: created_by.into(),
            updated_by: None,
            corrected_by_admin: false,
            is_deleted: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Sets the clock times and re-derives `total_hours`.
    pub fn set_clock_times(
        &mut self,
        clock_in: Option<NaiveDateTime>,
        clock_out: Option<NaiveDateTime>,
    ) {
        self.clock_in = clock_in;
        self.clock_out = clock_out;
        self.total_hours = worked_hours(clock_in, clock_out);
    }

    /// Returns true if the day should be counted as late.
    pub fn counts_as_late(&self) -> bool {
        self.is_late || self.status == AttendanceStatus::Late
    }
}

/// Hours between clock-in and clock-out rounded to 2 dp, or zero when either
/// is missing or the clock-out is not after the clock-in.
///
/// # Example
///
/// ```
/// use payroll_engine::models::worked_hours;
/// use chrono::NaiveDateTime;
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// let clock_in = NaiveDateTime::parse_from_str("2026-01-13 09:00:00", "%Y-%m-%d %H:%M:%S").unwrap();
/// let clock_out = NaiveDateTime::parse_from_str("2026-01-13 17:30:00", "%Y-%m-%d %H:%M:%S").unwrap();
/// assert_eq!(worked_hours(Some(clock_in), Some(clock_out)), Decimal::from_str("8.5").unwrap());
/// assert_eq!(worked_hours(Some(clock_in), None), Decimal::ZERO);
/// ```
pub fn worked_hours(clock_in: Option<NaiveDateTime>, clock_out: Option<NaiveDateTime>) -> Decimal {
    match (clock_in, clock_out) {
        (Some(start), Some(end)) if end > start => {
            let minutes = (end - start).num_minutes();
            (Decimal::from(minutes) / Decimal::from(60))
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        }
        _ => Decimal::ZERO,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn make_datetime(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    #[test]
    fn test_worked_hours_requires_both_times() {
        assert_eq!(worked_hours(None, None), Decimal::ZERO);
        assert_eq!(
            worked_hours(None, Some(make_datetime("2026-01-13 17:00:00"))),
            Decimal::ZERO
        );
    }

    #[test]
    fn test_worked_hours_rounds_to_two_places() {
        let hours = worked_hours(
            Some(make_datetime("2026-01-13 09:00:00")),
            Some(make_datetime("2026-01-13 09:20:00")),
        );
        assert_eq!(hours, Decimal::from_str("0.33").unwrap());
    }

    #[test]
    fn test_worked_hours_zero_when_clock_out_before_clock_in() {
        let hours = worked_hours(
            Some(make_datetime("2026-01-13 17:00:00")),
            Some(make_datetime("2026-01-13 09:00:00")),
        );
        assert_eq!(hours, Decimal::ZERO);
    }

    #[test]
    fn test_set_clock_times_derives_total_hours() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 13).unwrap();
        let mut record =
            AttendanceRecord::new("emp_001", date, AttendanceStatus::Present, "system", Utc::now());
        record.set_clock_times(
            Some(make_datetime("2026-01-13 09:00:00")),
            Some(make_datetime("2026-01-13 18:00:00")),
        );
        assert_eq!(record.total_hours, Decimal::from(9));
    }

    #[test]
    fn test_late_status_sets_flag() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 13).unwrap();
        let record =
            AttendanceRecord::new("emp_001", date, AttendanceStatus::Late, "system", Utc::now());
        assert!(record.is_late);
        assert!(record.counts_as_late());
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(
            serde_json::to_string(&AttendanceStatus::GovtHoliday).unwrap(),
            "\"govt_holiday\""
        );
        assert_eq!(
            serde_json::to_string(&AttendanceStatus::HalfPaidLeave).unwrap(),
            "\"half_paid_leave\""
        );
    }
}
