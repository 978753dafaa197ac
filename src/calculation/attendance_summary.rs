//! Attendance and leave day counting.
//!
//! Counts the attendance ledger rows of a period by status and adds up the
//! approved leave days that fall inside the period.

use crate::models::{
    AttendanceRecord, AttendanceStatus, AttendanceSummary, AuditStep, LeaveRequest, LeaveStatus,
    Period,
};

/// The result of counting leave days, including the audit step.
#[derive(Debug, Clone)]
pub struct LeaveDaysResult {
    /// Approved leave days inside the period.
    pub leave_days: u32,
    /// The audit step recording this calculation.
    pub audit_step: AuditStep,
}

/// Counts the attendance rows of one employee inside `period` by status.
///
/// Soft-deleted rows and rows outside the period (bounds included) are
/// ignored. `present_days` counts rows whose status is exactly `present`;
/// late days count either the `late` status or the `isLate` flag.
/// `leave_days`, `total_working_days` and `attendance_percentage` are left
/// for the caller to fill in.
pub fn summarize_attendance(records: &[AttendanceRecord], period: &Period) -> AttendanceSummary {
    let mut summary = AttendanceSummary::default();

    for record in records
        .iter()
        .filter(|r| !r.is_deleted && period.contains_date(r.date))
    {
        match record.status {
            AttendanceStatus::Present => summary.present_days += 1,
            AttendanceStatus::Absent => summary.absent_days += 1,
            AttendanceStatus::HalfDay => summary.half_days += 1,
            AttendanceStatus::GovtHoliday => summary.holidays += 1,
            AttendanceStatus::WeeklyOff => summary.weekly_offs += 1,
            _ => {}
        }
        if record.counts_as_late() {
            summary.late_days += 1;
        }
    }

    summary
}

/// Adds up approved leave days inside `period`.
///
/// Each approved leave overlapping the period is clipped to the period and
/// contributes `(clippedEnd - clippedStart) + 1` days. Leaves are not
/// reconciled against attendance rows, so a day that is both an absence and
/// a leave is counted in both places.
pub fn count_leave_days(leaves: &[LeaveRequest], period: &Period, step_number: u32) -> LeaveDaysResult {
    let mut leave_days: i64 = 0;
    let mut counted = Vec::new();

    for leave in leaves
        .iter()
        .filter(|l| l.status == LeaveStatus::Approved)
    {
        if let Some(clipped) = leave.period().clip_to(period) {
            let days = clipped.days();
            leave_days += days;
            counted.push(serde_json::json!({
                "leave_id": leave.id.to_string(),
                "leave_type": leave.leave_type.as_str(),
                "clipped_start": clipped.start.to_string(),
                "clipped_end": clipped.end.to_string(),
                "days": days
            }));
        }
    }

    let leave_days = u32::try_from(leave_days).unwrap_or(u32::MAX);

    let audit_step = AuditStep {
        step_number,
        rule_id: "leave_days".to_string(),
        rule_name: "Approved Leave Days".to_string(),
        input: serde_json::json!({
            "period_start": period.start.to_string(),
            "period_end": period.end.to_string(),
            "approved_leaves": counted.len()
        }),
        output: serde_json::json!({
            "leave_days": leave_days,
            "leaves": counted
        }),
        reasoning: format!(
            "{} approved leave(s) overlap the period for a total of {} day(s)",
            counted.len(),
            leave_days
        ),
    };

    LeaveDaysResult {
        leave_days,
        audit_step,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EmployeeSnapshot, LeavePayStatus, LeaveType};
    use chrono::{NaiveDate, Utc};
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn january() -> Period {
        Period::new(date(2026, 1, 1), date(2026, 1, 31))
    }

    fn record(day: u32, status: AttendanceStatus) -> AttendanceRecord {
        AttendanceRecord::new("emp_001", date(2026, 1, day), status, "system", Utc::now())
    }

    fn leave(start: NaiveDate, end: NaiveDate, status: LeaveStatus) -> LeaveRequest {
        let now = Utc::now();
        LeaveRequest {
            id: Uuid::new_v4(),
            employee_id: "emp_001".to_string(),
            employee: EmployeeSnapshot::default(),
            leave_type: LeaveType::Annual,
            pay_status: LeavePayStatus::Paid,
            start_date: start,
            end_date: end,
            total_days: (end - start).num_days() + 1,
            reason: String::new(),
            status,
            approved_by: None,
            approved_at: None,
            rejected_by: None,
            rejected_at: None,
            rejection_reason: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_summary_counts_by_status() {
        let records = vec![
            record(2, AttendanceStatus::Present),
            record(5, AttendanceStatus::Present),
            record(6, AttendanceStatus::Late),
            record(7, AttendanceStatus::Absent),
            record(8, AttendanceStatus::HalfDay),
            record(9, AttendanceStatus::WeeklyOff),
            record(10, AttendanceStatus::GovtHoliday),
        ];
        let summary = summarize_attendance(&records, &january());
        assert_eq!(summary.present_days, 2);
        assert_eq!(summary.late_days, 1);
        assert_eq!(summary.absent_days, 1);
        assert_eq!(summary.half_days, 1);
        assert_eq!(summary.weekly_offs, 1);
        assert_eq!(summary.holidays, 1);
    }

    #[test]
    fn test_summary_ignores_rows_outside_period_and_deleted() {
        let mut deleted = record(3, AttendanceStatus::Present);
        deleted.is_deleted = true;
        let outside =
            AttendanceRecord::new("emp_001", date(2026, 2, 1), AttendanceStatus::Present, "system", Utc::now());
        let summary = summarize_attendance(
            &[deleted, outside, record(31, AttendanceStatus::Present)],
            &january(),
        );
        assert_eq!(summary.present_days, 1);
    }

    #[test]
    fn test_leave_days_are_clipped_to_period() {
        let leaves = vec![
            leave(date(2025, 12, 30), date(2026, 1, 2), LeaveStatus::Approved),
            leave(date(2026, 1, 30), date(2026, 2, 4), LeaveStatus::Approved),
        ];
        let result = count_leave_days(&leaves, &january(), 1);
        // Jan 1-2 (2 days) + Jan 30-31 (2 days)
        assert_eq!(result.leave_days, 4);
    }

    #[test]
    fn test_only_approved_leaves_count() {
        let leaves = vec![
            leave(date(2026, 1, 5), date(2026, 1, 6), LeaveStatus::Pending),
            leave(date(2026, 1, 7), date(2026, 1, 8), LeaveStatus::Rejected),
            leave(date(2026, 1, 12), date(2026, 1, 12), LeaveStatus::Approved),
        ];
        let result = count_leave_days(&leaves, &january(), 1);
        assert_eq!(result.leave_days, 1);
    }

    #[test]
    fn test_leave_days_not_deduplicated_against_absence() {
        let leaves = vec![leave(date(2026, 1, 7), date(2026, 1, 7), LeaveStatus::Approved)];
        let records = vec![record(7, AttendanceStatus::Absent)];
        let summary = summarize_attendance(&records, &january());
        let result = count_leave_days(&leaves, &january(), 1);
        assert_eq!(summary.absent_days, 1);
        assert_eq!(result.leave_days, 1);
    }
}
