//! Salary calculation result models.
//!
//! This module contains the [`SalaryBreakdown`] type produced by the salary
//! calculator, together with its attendance summary, component amounts and
//! the audit steps recording every decision taken.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Period, RuleType};

/// A named amount produced from a rule-set entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentAmount {
    /// Entry name.
    pub name: String,
    /// `percentage`, `fixed` or `formula`.
    pub method: String,
    /// Computed amount, rounded to 2 dp.
    pub amount: Decimal,
}

/// The contribution of one salary rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleAdjustmentAmount {
    /// The rule document.
    pub rule_id: Uuid,
    /// The rule code.
    pub rule_code: String,
    /// The kind of rule.
    pub rule_type: RuleType,
    /// Number of units charged (e.g. late-day blocks).
    pub units: Decimal,
    /// Computed amount, rounded to 2 dp.
    pub amount: Decimal,
}

/// Which rules drove a calculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RulesApplied {
    /// The rule set used.
    pub rule_set_id: Uuid,
    /// Its name.
    pub rule_name: String,
    /// `per_day` or `monthly`.
    pub calculation_method: String,
    /// Salary rules that contributed an amount.
    #[serde(default)]
    pub salary_rule_ids: Vec<Uuid>,
}

/// Attendance counts for a period.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceSummary {
    /// Days with status present.
    pub present_days: u32,
    /// Days with status absent.
    pub absent_days: u32,
    /// Days flagged late.
    pub late_days: u32,
    /// Days covered by approved leave, clipped to the period.
    pub leave_days: u32,
    /// Half days.
    pub half_days: u32,
    /// Government holidays.
    pub holidays: u32,
    /// Weekly offs.
    pub weekly_offs: u32,
    /// The rule set's working days per month.
    pub total_working_days: u32,
    /// `presentDays / totalWorkingDays * 100`, uncapped, 2 dp.
    pub attendance_percentage: Decimal,
}

/// A single step in the audit trace recording a calculation decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditStep {
    /// The sequential step number.
    pub step_number: u32,
    /// Identifier of the rule that was applied.
    pub rule_id: String,
    /// Human-readable name of the rule.
    pub rule_name: String,
    /// The input data for this step.
    pub input: serde_json::Value,
    /// The output data from this step.
    pub output: serde_json::Value,
    /// Human-readable explanation of the decision.
    pub reasoning: String,
}

/// The complete result of a salary calculation.
///
/// `net_payable == basic_pay + total_addition - total_deduction` holds
/// exactly because every part is rounded before it is summed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalaryBreakdown {
    /// The employee.
    pub employee_id: String,
    /// The period calculated.
    pub period: Period,
    /// `annualSalary / 12`, 2 dp.
    pub monthly_basic: Decimal,
    /// `monthlyBasic / workingDaysPerMonth`, 2 dp.
    pub daily_rate: Decimal,
    /// Attendance-adjusted basic pay, 2 dp.
    pub basic_pay: Decimal,
    /// Attendance counts.
    pub attendance: AttendanceSummary,
    /// Rule-set components (informational split of the package).
    pub components: Vec<ComponentAmount>,
    /// Rule-set additions.
    pub additions: Vec<ComponentAmount>,
    /// Rule-set deductions.
    pub deductions: Vec<ComponentAmount>,
    /// Salary rule contributions.
    pub rule_adjustments: Vec<RuleAdjustmentAmount>,
    /// Part of `total_deduction` charged by late-deduction rules.
    pub late_deduction: Decimal,
    /// Part of `total_deduction` charged by half-day adjustment rules.
    pub half_day_deduction: Decimal,
    /// Sum of all additions.
    pub total_addition: Decimal,
    /// Sum of all deductions.
    pub total_deduction: Decimal,
    /// `basicPay + totalAddition - totalDeduction`.
    pub net_payable: Decimal,
    /// Rules used.
    pub rules_applied: RulesApplied,
    /// When the calculation ran.
    pub calculated_at: DateTime<Utc>,
    /// Every decision, in order.
    pub audit_steps: Vec<AuditStep>,
}

impl SalaryBreakdown {
    /// Additions contributed by rule-set entries (excluding salary rules).
    pub fn rule_set_additions(&self) -> Decimal {
        self.additions.iter().map(|a| a.amount).sum()
    }

    /// Deductions contributed by rule-set entries (excluding salary rules).
    pub fn rule_set_deductions(&self) -> Decimal {
        self.deductions.iter().map(|d| d.amount).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attendance_summary_serializes_camel_case() {
        let summary = AttendanceSummary {
            present_days: 20,
            total_working_days: 26,
            ..AttendanceSummary::default()
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["presentDays"], 20);
        assert_eq!(json["totalWorkingDays"], 26);
    }

    #[test]
    fn test_rules_applied_defaults_salary_rule_ids() {
        let json = r#"{
            "ruleSetId": "6f0b6f1e-7a44-4a57-9d2a-0d3c1b1d2e3f",
            "ruleName": "Default",
            "calculationMethod": "per_day"
        }"#;
        let applied: RulesApplied = serde_json::from_str(json).unwrap();
        assert!(applied.salary_rule_ids.is_empty());
    }
}
