//! Leave request model.
//!
//! A [`LeaveRequest`] is created pending by its owner and moves exactly once
//! to approved or rejected.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{EmployeeSnapshot, Period};

/// The kind of leave requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaveType {
    /// Sick leave.
    Sick,
    /// Annual leave.
    Annual,
    /// Casual leave.
    Casual,
    /// Emergency leave.
    Emergency,
    /// Maternity leave.
    Maternity,
    /// Paternity leave.
    Paternity,
    /// Anything else.
    Other,
}

impl LeaveType {
    /// Every leave type, in reporting order.
    pub const ALL: [LeaveType; 7] = [
        LeaveType::Sick,
        LeaveType::Annual,
        LeaveType::Casual,
        LeaveType::Emergency,
        LeaveType::Maternity,
        LeaveType::Paternity,
        LeaveType::Other,
    ];

    /// The snake_case name.
    pub fn as_str(self) -> &'static str {
        match self {
            LeaveType::Sick => "sick",
            LeaveType::Annual => "annual",
            LeaveType::Casual => "casual",
            LeaveType::Emergency => "emergency",
            LeaveType::Maternity => "maternity",
            LeaveType::Paternity => "paternity",
            LeaveType::Other => "other",
        }
    }
}

impl std::fmt::Display for LeaveType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a leave is paid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeavePayStatus {
    /// Fully paid.
    #[default]
    Paid,
    /// Not paid; deducted from an enclosing payroll.
    Unpaid,
    /// Half paid; half the unpaid deduction applies.
    HalfPaid,
}

impl LeavePayStatus {
    /// The snake_case name.
    pub fn as_str(self) -> &'static str {
        match self {
            LeavePayStatus::Paid => "paid",
            LeavePayStatus::Unpaid => "unpaid",
            LeavePayStatus::HalfPaid => "half_paid",
        }
    }
}

impl std::fmt::Display for LeavePayStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status of a leave request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaveStatus {
    /// Awaiting a decision.
    Pending,
    /// Approved (terminal).
    Approved,
    /// Rejected (terminal).
    Rejected,
}

impl LeaveStatus {
    /// Returns true for approved and rejected.
    pub fn is_terminal(self) -> bool {
        !matches!(self, LeaveStatus::Pending)
    }

    /// Returns true for statuses that block overlapping requests.
    pub fn blocks_overlap(self) -> bool {
        matches!(self, LeaveStatus::Pending | LeaveStatus::Approved)
    }

    /// The snake_case name.
    pub fn as_str(self) -> &'static str {
        match self {
            LeaveStatus::Pending => "pending",
            LeaveStatus::Approved => "approved",
            LeaveStatus::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for LeaveStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A leave request document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveRequest {
    /// Document id.
    pub id: Uuid,
    /// Requesting employee.
    pub employee_id: String,
    /// Employee fields as they were when the request was made.
    pub employee: EmployeeSnapshot,
    /// Kind of leave.
    pub leave_type: LeaveType,
    /// How the leave is paid.
    pub pay_status: LeavePayStatus,
    /// First day (inclusive).
    pub start_date: NaiveDate,
    /// Last day (inclusive).
    pub end_date: NaiveDate,
    /// Number of calendar days covered.
    pub total_days: i64,
    /// Reason given by the employee.
    #[serde(default)]
    pub reason: String,
    /// Lifecycle status.
    pub status: LeaveStatus,
    /// Approver.
    #[serde(default)]
    pub approved_by: Option<String>,
    /// Approval time.
    #[serde(default)]
    pub approved_at: Option<DateTime<Utc>>,
    /// Rejecter.
    #[serde(default)]
    pub rejected_by: Option<String>,
    /// Rejection time.
    #[serde(default)]
    pub rejected_at: Option<DateTime<Utc>>,
    /// Reason given on rejection.
    #[serde(default)]
    pub rejection_reason: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

impl LeaveRequest {
    /// The inclusive span of the leave.
    pub fn period(&self) -> Period {
        Period::new(self.start_date, self.end_date)
    }

    /// Re-derives `total_days` from the dates.
    pub fn refresh_total_days(&mut self) {
        self.total_days = total_leave_days(self.start_date, self.end_date);
    }
}

/// Inclusive day count of a leave span, `(end - start) + 1`.
///
/// Dates are whole calendar days, so this is the
/// `ceil((end - start) / 1 day) + 1` rule.
///
/// # Example
///
/// ```
/// use payroll_engine::models::total_leave_days;
/// use chrono::NaiveDate;
///
/// let start = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
/// let end = NaiveDate::from_ymd_opt(2026, 3, 4).unwrap();
/// assert_eq!(total_leave_days(start, end), 3);
/// assert_eq!(total_leave_days(start, start), 1);
/// ```
pub fn total_leave_days(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days() + 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use proptest::prelude::*;

    #[test]
    fn test_terminal_statuses() {
        assert!(!LeaveStatus::Pending.is_terminal());
        assert!(LeaveStatus::Approved.is_terminal());
        assert!(LeaveStatus::Rejected.is_terminal());
    }

    #[test]
    fn test_rejected_does_not_block_overlap() {
        assert!(LeaveStatus::Pending.blocks_overlap());
        assert!(LeaveStatus::Approved.blocks_overlap());
        assert!(!LeaveStatus::Rejected.blocks_overlap());
    }

    #[test]
    fn test_pay_status_serialization() {
        assert_eq!(
            serde_json::to_string(&LeavePayStatus::HalfPaid).unwrap(),
            "\"half_paid\""
        );
        let parsed: LeavePayStatus = serde_json::from_str("\"unpaid\"").unwrap();
        assert_eq!(parsed, LeavePayStatus::Unpaid);
    }

    #[test]
    fn test_leave_type_display() {
        assert_eq!(LeaveType::Maternity.to_string(), "maternity");
        assert_eq!(LeaveType::ALL.len(), 7);
    }

    proptest! {
        #[test]
        fn prop_total_days_is_inclusive_and_positive(offset in 0i64..3650, len in 0i64..365) {
            let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap() + Duration::days(offset);
            let end = start + Duration::days(len);
            let days = total_leave_days(start, end);
            prop_assert_eq!(days, len + 1);
            prop_assert!(days >= 1);
        }
    }
}
