//! Document collections and their unique indexes.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::models::{
    AttendanceRecord, AttendanceStatus, LeaveRequest, PayrollRecord, Period, RuleSet, SalaryRule,
};

/// Every collection held by the store.
///
/// The `insert_*` methods enforce the unique indexes; callers hold the
/// store's write guard, so a check and the insert that follows it are one
/// atomic step.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collections {
    /// Attendance rows keyed by document id.
    #[serde(default)]
    pub attendance: HashMap<Uuid, AttendanceRecord>,
    /// Leave requests keyed by document id.
    #[serde(default)]
    pub leaves: HashMap<Uuid, LeaveRequest>,
    /// Payrolls keyed by document id.
    #[serde(default)]
    pub payrolls: HashMap<Uuid, PayrollRecord>,
    /// Salary rules keyed by document id.
    #[serde(default)]
    pub salary_rules: HashMap<Uuid, SalaryRule>,
    /// Rule sets keyed by document id.
    #[serde(default)]
    pub rule_sets: HashMap<Uuid, RuleSet>,
}

impl Collections {
    // --- payrolls ---

    /// Inserts a payroll unless the employee already has one whose period
    /// overlaps it.
    pub fn insert_payroll(&mut self, record: PayrollRecord) -> EngineResult<()> {
        let period = record.period();
        if self.payroll_overlapping(&record.employee_id, &period).is_some() {
            return Err(EngineError::DuplicatePeriod {
                employee_id: record.employee_id.clone(),
                period_start: period.start,
                period_end: period.end,
            });
        }
        self.payrolls.insert(record.id, record);
        Ok(())
    }

    /// The first live payroll of the employee overlapping `period`.
    pub fn payroll_overlapping(&self, employee_id: &str, period: &Period) -> Option<&PayrollRecord> {
        self.payrolls.values().find(|p| {
            !p.is_deleted && p.employee_id == employee_id && p.period().overlaps(period)
        })
    }

    /// The live payroll of the employee for exactly `period`.
    pub fn payroll_for_exact_period(&self, employee_id: &str, period: &Period) -> Option<&PayrollRecord> {
        self.payrolls.values().find(|p| {
            !p.is_deleted && p.employee_id == employee_id && p.period() == *period
        })
    }

    /// Looks a payroll up by id.
    pub fn payroll_mut(&mut self, id: Uuid) -> EngineResult<&mut PayrollRecord> {
        self.payrolls
            .get_mut(&id)
            .filter(|p| !p.is_deleted)
            .ok_or_else(|| not_found("Payroll", id))
    }

    // --- attendance ---

    /// Inserts an attendance row unless the employee already has one for
    /// that day.
    pub fn insert_attendance(&mut self, record: AttendanceRecord) -> EngineResult<()> {
        if self.attendance_on(&record.employee_id, record.date).is_some() {
            return Err(EngineError::DuplicateAttendanceDay {
                employee_id: record.employee_id.clone(),
                date: record.date,
            });
        }
        self.attendance.insert(record.id, record);
        Ok(())
    }

    /// Writes an attendance row, replacing the row for the same
    /// (employee, day) if there is one. The replaced row keeps its id and
    /// creation stamps. Returns the stored row.
    pub fn upsert_attendance(&mut self, mut record: AttendanceRecord) -> AttendanceRecord {
        if let Some(existing) = self
            .attendance
            .values()
            .find(|r| !r.is_deleted && r.employee_id == record.employee_id && r.date == record.date)
        {
            record.id = existing.id;
            record.created_by = existing.created_by.clone();
            record.created_at = existing.created_at;
        }
        self.attendance.insert(record.id, record.clone());
        record
    }

    /// The live attendance row of the employee on `date`.
    pub fn attendance_on(&self, employee_id: &str, date: NaiveDate) -> Option<&AttendanceRecord> {
        self.attendance
            .values()
            .find(|r| !r.is_deleted && r.employee_id == employee_id && r.date == date)
    }

    /// Live attendance rows of the employee inside `period`, oldest first.
    pub fn attendance_in(&self, employee_id: &str, period: &Period) -> Vec<AttendanceRecord> {
        let mut rows: Vec<AttendanceRecord> = self
            .attendance
            .values()
            .filter(|r| !r.is_deleted && r.employee_id == employee_id && period.contains_date(r.date))
            .cloned()
            .collect();
        rows.sort_by_key(|r| r.date);
        rows
    }

    /// Deletes the `leave` rows written for the leave `leave_id` and returns
    /// how many were removed. Rows recorded by other means are kept.
    pub fn delete_leave_attendance(&mut self, leave_id: Uuid) -> usize {
        let before = self.attendance.len();
        self.attendance.retain(|_, r| {
            !(r.status == AttendanceStatus::Leave && r.leave_id == Some(leave_id))
        });
        before - self.attendance.len()
    }

    // --- leaves ---

    /// Inserts or replaces a leave request unless another pending or
    /// approved request of the same employee overlaps it.
    pub fn insert_leave(&mut self, leave: LeaveRequest) -> EngineResult<()> {
        if leave.status.blocks_overlap()
            && self
                .leave_overlapping(&leave.employee_id, &leave.period(), Some(leave.id))
                .is_some()
        {
            return Err(EngineError::OverlappingLeave {
                employee_id: leave.employee_id.clone(),
                start_date: leave.start_date,
                end_date: leave.end_date,
            });
        }
        self.leaves.insert(leave.id, leave);
        Ok(())
    }

    /// The first pending or approved leave of the employee overlapping
    /// `period`, ignoring `exclude`.
    pub fn leave_overlapping(
        &self,
        employee_id: &str,
        period: &Period,
        exclude: Option<Uuid>,
    ) -> Option<&LeaveRequest> {
        self.leaves.values().find(|l| {
            Some(l.id) != exclude
                && l.employee_id == employee_id
                && l.status.blocks_overlap()
                && l.period().overlaps(period)
        })
    }

    /// Looks a leave request up by id.
    pub fn leave(&self, id: Uuid) -> EngineResult<&LeaveRequest> {
        self.leaves.get(&id).ok_or_else(|| not_found("Leave request", id))
    }

    // --- salary rules ---

    /// Inserts a salary rule unless its code is taken by another rule.
    pub fn insert_salary_rule(&mut self, rule: SalaryRule) -> EngineResult<()> {
        let taken = self
            .salary_rules
            .values()
            .any(|r| r.id != rule.id && r.rule_code.eq_ignore_ascii_case(&rule.rule_code));
        if taken {
            return Err(EngineError::DuplicateRuleCode {
                code: rule.rule_code.clone(),
            });
        }
        self.salary_rules.insert(rule.id, rule);
        Ok(())
    }

    /// Looks a salary rule up by id.
    pub fn salary_rule(&self, id: Uuid) -> EngineResult<&SalaryRule> {
        self.salary_rules
            .get(&id)
            .ok_or_else(|| not_found("Salary rule", id))
    }
}

fn not_found(entity: &'static str, id: Uuid) -> EngineError {
    EngineError::NotFound {
        entity,
        id: id.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EmployeeSnapshot, LeavePayStatus, LeaveStatus, LeaveType};
    use chrono::Utc;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, m, d).unwrap()
    }

    fn leave(employee: &str, start: NaiveDate, end: NaiveDate, status: LeaveStatus) -> LeaveRequest {
        let now = Utc::now();
        LeaveRequest {
            id: Uuid::new_v4(),
            employee_id: employee.to_string(),
            employee: EmployeeSnapshot::default(),
            leave_type: LeaveType::Casual,
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
    fn test_attendance_day_is_unique_per_employee() {
        let mut collections = Collections::default();
        let now = Utc::now();
        collections
            .insert_attendance(AttendanceRecord::new("emp_001", date(1, 5), AttendanceStatus::Present, "a", now))
            .unwrap();
        collections
            .insert_attendance(AttendanceRecord::new("emp_002", date(1, 5), AttendanceStatus::Present, "a", now))
            .unwrap();
        let duplicate = collections.insert_attendance(AttendanceRecord::new(
            "emp_001",
            date(1, 5),
            AttendanceStatus::Absent,
            "a",
            now,
        ));
        assert!(matches!(duplicate, Err(EngineError::DuplicateAttendanceDay { .. })));
    }

    #[test]
    fn test_upsert_keeps_identity_of_existing_row() {
        let mut collections = Collections::default();
        let now = Utc::now();
        let original = AttendanceRecord::new("emp_001", date(1, 5), AttendanceStatus::Present, "device", now);
        let original_id = original.id;
        collections.insert_attendance(original).unwrap();

        let stored = collections.upsert_attendance(AttendanceRecord::new(
            "emp_001",
            date(1, 5),
            AttendanceStatus::Leave,
            "admin",
            now,
        ));
        assert_eq!(stored.id, original_id);
        assert_eq!(stored.created_by, "device");
        assert_eq!(collections.attendance.len(), 1);
        assert_eq!(
            collections.attendance_on("emp_001", date(1, 5)).unwrap().status,
            AttendanceStatus::Leave
        );
    }

    #[test]
    fn test_overlapping_active_leave_is_rejected() {
        let mut collections = Collections::default();
        collections
            .insert_leave(leave("emp_001", date(3, 10), date(3, 12), LeaveStatus::Pending))
            .unwrap();
        let overlap = collections.insert_leave(leave("emp_001", date(3, 12), date(3, 14), LeaveStatus::Pending));
        assert!(matches!(overlap, Err(EngineError::OverlappingLeave { .. })));
        // Other employees and rejected requests do not block.
        collections
            .insert_leave(leave("emp_002", date(3, 12), date(3, 14), LeaveStatus::Pending))
            .unwrap();
    }

    #[test]
    fn test_rejected_leave_does_not_block() {
        let mut collections = Collections::default();
        collections
            .insert_leave(leave("emp_001", date(3, 10), date(3, 12), LeaveStatus::Rejected))
            .unwrap();
        collections
            .insert_leave(leave("emp_001", date(3, 11), date(3, 11), LeaveStatus::Pending))
            .unwrap();
    }

    #[test]
    fn test_replacing_a_leave_does_not_conflict_with_itself() {
        let mut collections = Collections::default();
        let mut request = leave("emp_001", date(3, 10), date(3, 12), LeaveStatus::Pending);
        collections.insert_leave(request.clone()).unwrap();
        request.end_date = date(3, 13);
        collections.insert_leave(request).unwrap();
        assert_eq!(collections.leaves.len(), 1);
    }

    #[test]
    fn test_delete_leave_attendance_only_touches_rows_of_that_leave() {
        let mut collections = Collections::default();
        let now = Utc::now();
        let leave_id = Uuid::new_v4();
        for (employee, day, status, owner) in [
            ("emp_001", 10, AttendanceStatus::Leave, Some(leave_id)),
            ("emp_001", 11, AttendanceStatus::Leave, Some(leave_id)),
            ("emp_001", 12, AttendanceStatus::Present, None),
            ("emp_001", 13, AttendanceStatus::Leave, None),
            ("emp_002", 10, AttendanceStatus::Leave, Some(Uuid::new_v4())),
        ] {
            let mut row = AttendanceRecord::new(employee, date(3, day), status, "a", now);
            row.leave_id = owner;
            collections.insert_attendance(row).unwrap();
        }
        let removed = collections.delete_leave_attendance(leave_id);
        assert_eq!(removed, 2);
        assert_eq!(collections.attendance.len(), 3);
        assert!(collections.attendance_on("emp_001", date(3, 13)).is_some());
    }
}
