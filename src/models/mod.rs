//! Core data models for the payroll engine.
//!
//! This module contains all the domain documents stored by the engine and
//! the calculation result types.

mod attendance;
mod calculation_result;
mod employee;
mod leave;
mod payroll;
mod period;
mod salary_rule;

pub use attendance::{AttendanceRecord, AttendanceStatus, worked_hours};
pub use calculation_result::{
    AttendanceSummary, AuditStep, ComponentAmount, RuleAdjustmentAmount, RulesApplied,
    SalaryBreakdown,
};
pub use employee::{Employee, EmployeeSnapshot, EmploymentType, Role};
pub use leave::{LeavePayStatus, LeaveRequest, LeaveStatus, LeaveType, total_leave_days};
pub use payroll::{
    AmountSource, CalculationMetadata, DayRateBlock, Deductions, Earnings, EmployeeApproval,
    ManualAmount, PayrollAudit, PayrollRecord, PayrollStatus, PayrollSummary, SalaryBasis,
    round_money,
};
pub use period::Period;
pub use salary_rule::{
    AdjustmentKind, ComponentKind, DEFAULT_WORKING_DAYS_PER_MONTH, DeductionType, RuleAdjustment,
    RuleComponent, RuleConditions, RuleSet, RuleSetDraft, RuleType, SalaryRule, SalaryRuleSummary,
};
