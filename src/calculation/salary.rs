//! Salary calculation for one employee and one period.
//!
//! [`calculate_salary`] chains the individual steps in this order:
//!
//! 1. attendance summary
//! 2. approved leave days
//! 3. basic pay
//! 4. rule-set components
//! 5. rule-set additions and deductions
//! 6. salary rule adjustments
//!
//! Each step contributes one or more [`AuditStep`]s to the breakdown.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::attendance_summary::{count_leave_days, summarize_attendance};
use super::basic_pay::{calculate_basic_pay, calculation_method};
use super::components::evaluate_rule_set;
use super::salary_rules::{RuleBasis, apply_salary_rules};
use crate::error::{EngineError, EngineResult};
use crate::models::{
    AttendanceRecord, AuditStep, Employee, LeaveRequest, Period, RuleSet, RulesApplied,
    SalaryBreakdown, SalaryRule,
};

/// Everything the calculator reads.
#[derive(Debug, Clone, Copy)]
pub struct SalaryInput<'a> {
    /// The employee being paid.
    pub employee: &'a Employee,
    /// The pay period, bounds inclusive.
    pub period: Period,
    /// The active rule set, if one is configured.
    pub rule_set: Option<&'a RuleSet>,
    /// Salary rules to consider.
    pub salary_rules: &'a [SalaryRule],
    /// The employee's attendance rows.
    pub attendance: &'a [AttendanceRecord],
    /// The employee's leave requests.
    pub leaves: &'a [LeaveRequest],
    /// Timestamp recorded as `calculatedAt`.
    pub now: DateTime<Utc>,
}

/// Calculates the salary breakdown of one employee for one period.
///
/// Pure: reads its inputs and returns a breakdown, nothing is persisted.
///
/// # Errors
///
/// - `Validation` if the period is inverted
/// - `ConfigurationMissing` if no rule set is supplied or it has zero
///   working days
/// - `InvalidFormula` if a formula component does not parse
pub fn calculate_salary(input: &SalaryInput<'_>) -> EngineResult<SalaryBreakdown> {
    let employee = input.employee;
    let period = input.period;
    if !period.is_valid() {
        return Err(EngineError::validation(
            "periodEnd",
            "period end must not be before period start",
        ));
    }
    let rule_set = input.rule_set.ok_or_else(|| EngineError::ConfigurationMissing {
        message: format!("no active rule set effective on {}", period.end),
    })?;

    let mut audit_steps: Vec<AuditStep> = Vec::new();
    let mut step_number: u32 = 1;

    let employee_attendance: Vec<AttendanceRecord> = input
        .attendance
        .iter()
        .filter(|r| r.employee_id == employee.id)
        .cloned()
        .collect();
    let mut attendance = summarize_attendance(&employee_attendance, &period);
    audit_steps.push(AuditStep {
        step_number,
        rule_id: "attendance_summary".to_string(),
        rule_name: "Attendance Summary".to_string(),
        input: serde_json::json!({
            "period_start": period.start.to_string(),
            "period_end": period.end.to_string(),
            "records": employee_attendance.len()
        }),
        output: serde_json::to_value(&attendance).unwrap_or(serde_json::Value::Null),
        reasoning: format!(
            "{} present, {} absent, {} late, {} half day(s)",
            attendance.present_days,
            attendance.absent_days,
            attendance.late_days,
            attendance.half_days
        ),
    });
    step_number += 1;

    let employee_leaves: Vec<LeaveRequest> = input
        .leaves
        .iter()
        .filter(|l| l.employee_id == employee.id)
        .cloned()
        .collect();
    let leave_result = count_leave_days(&employee_leaves, &period, step_number);
    attendance.leave_days = leave_result.leave_days;
    audit_steps.push(leave_result.audit_step);
    step_number += 1;

    let basic = calculate_basic_pay(
        employee.annual_salary,
        attendance.present_days,
        rule_set,
        step_number,
    )?;
    attendance.total_working_days = rule_set.working_days_per_month;
    attendance.attendance_percentage = basic.attendance_percentage;
    audit_steps.push(basic.audit_step);
    step_number += 1;

    let components = evaluate_rule_set(rule_set, basic.basic_pay, step_number)?;
    step_number += components.audit_steps.len() as u32;
    audit_steps.extend(components.audit_steps);

    let rules = apply_salary_rules(
        input.salary_rules,
        &RuleBasis {
            annual_salary: employee.annual_salary,
            basic_pay: basic.basic_pay,
            working_days_per_month: rule_set.working_days_per_month,
            employment_type: employee.employment_type,
            period_end: period.end,
            attendance: &attendance,
        },
        step_number,
    );
    audit_steps.push(rules.audit_step);

    let total_addition = components.total_addition + rules.total_addition;
    let total_deduction = components.total_deduction + rules.total_deduction;
    let net_payable = basic.basic_pay + total_addition - total_deduction;

    Ok(SalaryBreakdown {
        employee_id: employee.id.clone(),
        period,
        monthly_basic: basic.monthly_basic,
        daily_rate: basic.daily_rate,
        basic_pay: basic.basic_pay,
        attendance,
        components: components.components,
        additions: components.additions,
        deductions: components.deductions,
        rules_applied: RulesApplied {
            rule_set_id: rule_set.id,
            rule_name: rule_set.name.clone(),
            calculation_method: calculation_method(rule_set).to_string(),
            salary_rule_ids: rules.adjustments.iter().map(|a| a.rule_id).collect(),
        },
        rule_adjustments: rules.adjustments,
        late_deduction: rules.late_deduction,
        half_day_deduction: rules.half_day_deduction,
        total_addition,
        total_deduction,
        net_payable,
        calculated_at: input.now,
        audit_steps,
    })
}

/// Sums the breakdown's parts; equal to `net_payable` for every breakdown
/// produced by [`calculate_salary`].
pub fn net_from_parts(breakdown: &SalaryBreakdown) -> Decimal {
    breakdown.basic_pay + breakdown.total_addition - breakdown.total_deduction
}
