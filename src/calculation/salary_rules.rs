//! Salary rule adjustments.
//!
//! Applies the active salary rules (late deduction, half-day adjustment,
//! bonus, allowance) to an attendance summary.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::models::{
    AttendanceSummary, AuditStep, DeductionType, EmploymentType, RuleAdjustmentAmount, RuleType,
    SalaryRule, round_money,
};

/// Everything the salary rules need from the rest of the calculation.
#[derive(Debug, Clone, Copy)]
pub struct RuleBasis<'a> {
    /// The employee's annual salary.
    pub annual_salary: Decimal,
    /// Basic pay already computed for the period.
    pub basic_pay: Decimal,
    /// The rule set's working days per month.
    pub working_days_per_month: u32,
    /// The employee's employment class.
    pub employment_type: EmploymentType,
    /// Last day of the period; rules effective after it are skipped.
    pub period_end: NaiveDate,
    /// Attendance counts for the period.
    pub attendance: &'a AttendanceSummary,
}

/// The result of applying salary rules, including the audit step.
#[derive(Debug, Clone)]
pub struct SalaryRulesResult {
    /// One entry per rule that charged a non-zero number of units.
    pub adjustments: Vec<RuleAdjustmentAmount>,
    /// Amount charged by late-deduction rules.
    pub late_deduction: Decimal,
    /// Amount charged by half-day adjustment rules.
    pub half_day_deduction: Decimal,
    /// Amount added by bonus and allowance rules.
    pub total_addition: Decimal,
    /// Amount deducted by all deduction rules.
    pub total_deduction: Decimal,
    /// The audit step recording this calculation.
    pub audit_step: AuditStep,
}

/// Number of units a rule charges for the given attendance.
///
/// Late deductions charge one unit per complete block of `threshold` late
/// days; a threshold of zero is treated as one. Half-day adjustments charge
/// one unit per half day. Bonuses and allowances charge a single unit.
pub fn rule_units(rule: &SalaryRule, attendance: &AttendanceSummary) -> u32 {
    match rule.rule_type {
        RuleType::LateDeduction => attendance.late_days / rule.conditions.threshold.max(1),
        RuleType::AdjustmentDeduction => attendance.half_days,
        RuleType::Bonus | RuleType::Allowance => 1,
    }
}

/// Value of a single unit of a rule, at full precision.
fn unit_value(rule: &SalaryRule, basis: &RuleBasis<'_>) -> Decimal {
    match rule.conditions.deduction_type {
        DeductionType::DailySalary => {
            let working_days = Decimal::from(basis.working_days_per_month.max(1));
            basis.annual_salary / Decimal::from(12) / working_days * rule.deduction_amount
        }
        DeductionType::Percentage => basis.basic_pay * rule.deduction_amount / Decimal::from(100),
        DeductionType::FixedAmount => rule.deduction_amount,
    }
}

/// Applies every applicable salary rule.
///
/// Inactive rules, rules not covering the employment class and rules that
/// become effective after the period are skipped.
pub fn apply_salary_rules(
    rules: &[SalaryRule],
    basis: &RuleBasis<'_>,
    step_number: u32,
) -> SalaryRulesResult {
    let mut adjustments = Vec::new();
    let mut late_deduction = Decimal::ZERO;
    let mut half_day_deduction = Decimal::ZERO;
    let mut total_addition = Decimal::ZERO;
    let mut total_deduction = Decimal::ZERO;
    let mut skipped = Vec::new();

    for rule in rules {
        if !rule.is_applicable(basis.employment_type, basis.period_end) {
            skipped.push(rule.rule_code.clone());
            continue;
        }
        let units = rule_units(rule, basis.attendance);
        if units == 0 {
            continue;
        }

        let units = Decimal::from(units);
        let amount = round_money(unit_value(rule, basis) * units);

        match rule.rule_type {
            RuleType::LateDeduction => {
                late_deduction += amount;
                total_deduction += amount;
            }
            RuleType::AdjustmentDeduction => {
                half_day_deduction += amount;
                total_deduction += amount;
            }
            RuleType::Bonus | RuleType::Allowance => total_addition += amount,
        }

        adjustments.push(RuleAdjustmentAmount {
            rule_id: rule.id,
            rule_code: rule.rule_code.clone(),
            rule_type: rule.rule_type,
            units,
            amount,
        });
    }

    let audit_step = AuditStep {
        step_number,
        rule_id: "salary_rules".to_string(),
        rule_name: "Salary Rule Adjustments".to_string(),
        input: serde_json::json!({
            "late_days": basis.attendance.late_days,
            "half_days": basis.attendance.half_days,
            "employment_type": basis.employment_type.as_str(),
            "rules": rules.len()
        }),
        output: serde_json::json!({
            "applied": adjustments.iter().map(|a| a.rule_code.as_str()).collect::<Vec<_>>(),
            "skipped": skipped,
            "late_deduction": late_deduction.to_string(),
            "half_day_deduction": half_day_deduction.to_string(),
            "total_addition": total_addition.to_string(),
            "total_deduction": total_deduction.to_string()
        }),
        reasoning: if adjustments.is_empty() {
            "No salary rule charged any units for this period".to_string()
        } else {
            format!(
                "{} salary rule(s) applied: additions {}, deductions {}",
                adjustments.len(),
                total_addition,
                total_deduction
            )
        },
    };

    SalaryRulesResult {
        adjustments,
        late_deduction,
        half_day_deduction,
        total_addition,
        total_deduction,
        audit_step,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RuleConditions;
    use chrono::Utc;
    use std::str::FromStr;
    use uuid::Uuid;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn rule(code: &str, rule_type: RuleType, amount: &str, conditions: RuleConditions) -> SalaryRule {
        SalaryRule {
            id: Uuid::new_v4(),
            rule_code: code.to_string(),
            title: code.to_string(),
            description: String::new(),
            rule_type,
            calculation: String::new(),
            deduction_amount: dec(amount),
            conditions,
            is_active: true,
            is_system_default: false,
            created_by: "system".to_string(),
            updated_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn late_rule() -> SalaryRule {
        rule(
            "LATE-001",
            RuleType::LateDeduction,
            "1",
            RuleConditions {
                threshold: 3,
                ..RuleConditions::default()
            },
        )
    }

    fn half_day_rule() -> SalaryRule {
        rule(
            "ADJ-001",
            RuleType::AdjustmentDeduction,
            "0.5",
            RuleConditions::default(),
        )
    }

    fn basis(attendance: &AttendanceSummary) -> RuleBasis<'_> {
        RuleBasis {
            annual_salary: dec("120000"),
            basic_pay: dec("7692.31"),
            working_days_per_month: 26,
            employment_type: EmploymentType::Permanent,
            period_end: NaiveDate::from_ymd_opt(2026, 1, 31).unwrap(),
            attendance,
        }
    }

    #[test]
    fn test_late_deduction_charges_complete_blocks() {
        let attendance = AttendanceSummary {
            late_days: 7,
            ..AttendanceSummary::default()
        };
        let result = apply_salary_rules(&[late_rule()], &basis(&attendance), 1);
        // 7 lates = 2 blocks of 3, each one day of 10000 / 26
        assert_eq!(result.adjustments[0].units, dec("2"));
        assert_eq!(result.late_deduction, dec("769.23"));
        assert_eq!(result.total_deduction, dec("769.23"));
    }

    #[test]
    fn test_fewer_lates_than_threshold_charge_nothing() {
        let attendance = AttendanceSummary {
            late_days: 2,
            ..AttendanceSummary::default()
        };
        let result = apply_salary_rules(&[late_rule()], &basis(&attendance), 1);
        assert!(result.adjustments.is_empty());
        assert_eq!(result.total_deduction, Decimal::ZERO);
    }

    #[test]
    fn test_half_day_adjustment_charges_half_a_day_each() {
        let attendance = AttendanceSummary {
            half_days: 2,
            ..AttendanceSummary::default()
        };
        let result = apply_salary_rules(&[half_day_rule()], &basis(&attendance), 1);
        // 2 * 0.5 * 10000 / 26 = 384.615...
        assert_eq!(result.half_day_deduction, dec("384.62"));
    }

    #[test]
    fn test_bonus_percentage_and_fixed_allowance() {
        let bonus = rule(
            "BONUS-1",
            RuleType::Bonus,
            "10",
            RuleConditions {
                deduction_type: DeductionType::Percentage,
                ..RuleConditions::default()
            },
        );
        let allowance = rule(
            "ALLOW-1",
            RuleType::Allowance,
            "250",
            RuleConditions {
                deduction_type: DeductionType::FixedAmount,
                ..RuleConditions::default()
            },
        );
        let attendance = AttendanceSummary::default();
        let result = apply_salary_rules(&[bonus, allowance], &basis(&attendance), 1);
        // 7692.31 * 10% = 769.231
        assert_eq!(result.total_addition, dec("1019.23"));
        assert_eq!(result.total_deduction, Decimal::ZERO);
    }

    #[test]
    fn test_inapplicable_rules_are_skipped() {
        let mut inactive = late_rule();
        inactive.is_active = false;
        let interns_only = rule(
            "INTERN-1",
            RuleType::Allowance,
            "100",
            RuleConditions {
                deduction_type: DeductionType::FixedAmount,
                applicable_to: vec!["intern".to_string()],
                ..RuleConditions::default()
            },
        );
        let future = rule(
            "FUTURE-1",
            RuleType::Bonus,
            "100",
            RuleConditions {
                deduction_type: DeductionType::FixedAmount,
                effective_from: NaiveDate::from_ymd_opt(2026, 3, 1),
                ..RuleConditions::default()
            },
        );
        let attendance = AttendanceSummary {
            late_days: 9,
            ..AttendanceSummary::default()
        };
        let result = apply_salary_rules(&[inactive, interns_only, future], &basis(&attendance), 1);
        assert!(result.adjustments.is_empty());
        assert_eq!(result.audit_step.output["skipped"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_zero_threshold_is_treated_as_one() {
        let mut zero = late_rule();
        zero.conditions.threshold = 0;
        let attendance = AttendanceSummary {
            late_days: 2,
            ..AttendanceSummary::default()
        };
        assert_eq!(rule_units(&zero, &attendance), 2);
    }
}
