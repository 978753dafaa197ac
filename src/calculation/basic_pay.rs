//! Basic pay calculation.
//!
//! This module derives the monthly basic salary from the annual salary and
//! pro-rates it by present days when the rule set asks for per-day
//! calculation.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::{EngineError, EngineResult};
use crate::models::{AuditStep, RuleSet, round_money};

/// The result of a basic pay calculation, including the audit step.
#[derive(Debug, Clone)]
pub struct BasicPayResult {
    /// `annualSalary / 12`, 2 dp.
    pub monthly_basic: Decimal,
    /// `monthlyBasic / workingDaysPerMonth`, 2 dp.
    pub daily_rate: Decimal,
    /// Attendance-adjusted basic pay, 2 dp.
    pub basic_pay: Decimal,
    /// `presentDays / workingDaysPerMonth * 100`, uncapped, 2 dp.
    pub attendance_percentage: Decimal,
    /// The audit step recording this calculation.
    pub audit_step: AuditStep,
}

/// Calculates basic pay for a period.
///
/// 1. `monthlyBasic = annualSalary / 12`
/// 2. per-day: `basicPay = monthlyBasic / workingDaysPerMonth * presentDays`,
///    otherwise `basicPay = monthlyBasic`
/// 3. `attendancePercentage = presentDays / workingDaysPerMonth * 100`
///
/// Values are computed at full precision and rounded once at the end. The
/// attendance percentage is not capped, so 30 present days out of 26 report
/// more than 100.
///
/// # Errors
///
/// Returns `ConfigurationMissing` if the rule set has zero working days.
///
/// # Examples
///
/// ```
/// use payroll_engine::calculation::calculate_basic_pay;
/// use payroll_engine::models::RuleSet;
/// use chrono::{NaiveDate, Utc};
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
/// use uuid::Uuid;
///
/// let rule_set = RuleSet {
///     id: Uuid::new_v4(),
///     name: "Default".to_string(),
///     effective_from: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
///     is_active: true,
///     working_days_per_month: 26,
///     per_day_salary_calculation: true,
///     components: vec![],
///     additions: vec![],
///     deductions: vec![],
///     created_by: "system".to_string(),
///     created_at: Utc::now(),
/// };
///
/// let result = calculate_basic_pay(Decimal::from(120000), 20, &rule_set, 1).unwrap();
/// assert_eq!(result.basic_pay, Decimal::from_str("7692.31").unwrap());
/// ```
pub fn calculate_basic_pay(
    annual_salary: Decimal,
    present_days: u32,
    rule_set: &RuleSet,
    step_number: u32,
) -> EngineResult<BasicPayResult> {
    if rule_set.working_days_per_month == 0 {
        return Err(EngineError::ConfigurationMissing {
            message: format!(
                "rule set '{}' has zero working days per month",
                rule_set.name
            ),
        });
    }

    let working_days = Decimal::from(rule_set.working_days_per_month);
    let present = Decimal::from(present_days);
    let monthly_basic = annual_salary / Decimal::from(12);
    let daily_rate = monthly_basic / working_days;

    let basic_pay = if rule_set.per_day_salary_calculation {
        daily_rate * present
    } else {
        monthly_basic
    };

    let attendance_percentage = (present / working_days * Decimal::from(100))
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);

    let monthly_basic = round_money(monthly_basic);
    let daily_rate = round_money(daily_rate);
    let basic_pay = round_money(basic_pay);

    let method = calculation_method(rule_set);
    let reasoning = if rule_set.per_day_salary_calculation {
        format!(
            "{} / 12 = {} per month; {} / {} working days x {} present days = {}",
            annual_salary.normalize(),
            monthly_basic,
            monthly_basic,
            rule_set.working_days_per_month,
            present_days,
            basic_pay
        )
    } else {
        format!(
            "{} / 12 = {} per month; full monthly basic paid",
            annual_salary.normalize(),
            monthly_basic
        )
    };

    let audit_step = AuditStep {
        step_number,
        rule_id: "basic_pay".to_string(),
        rule_name: "Basic Pay".to_string(),
        input: serde_json::json!({
            "annual_salary": annual_salary.to_string(),
            "present_days": present_days,
            "working_days_per_month": rule_set.working_days_per_month,
            "per_day_salary_calculation": rule_set.per_day_salary_calculation
        }),
        output: serde_json::json!({
            "monthly_basic": monthly_basic.to_string(),
            "daily_rate": daily_rate.to_string(),
            "basic_pay": basic_pay.to_string(),
            "attendance_percentage": attendance_percentage.to_string(),
            "method": method
        }),
        reasoning,
    };

    Ok(BasicPayResult {
        monthly_basic,
        daily_rate,
        basic_pay,
        attendance_percentage,
        audit_step,
    })
}

/// `per_day` or `monthly`, as recorded in `rulesApplied.calculationMethod`.
pub fn calculation_method(rule_set: &RuleSet) -> &'static str {
    if rule_set.per_day_salary_calculation {
        "per_day"
    } else {
        "monthly"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use std::str::FromStr;
    use uuid::Uuid;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn create_rule_set(working_days: u32, per_day: bool) -> RuleSet {
        RuleSet {
            id: Uuid::new_v4(),
            name: "Test".to_string(),
            effective_from: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            is_active: true,
            working_days_per_month: working_days,
            per_day_salary_calculation: per_day,
            components: vec![],
            additions: vec![],
            deductions: vec![],
            created_by: "system".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_per_day_basic_pay_rounds_to_cents() {
        let result = calculate_basic_pay(dec("120000"), 20, &create_rule_set(26, true), 1).unwrap();
        assert_eq!(result.monthly_basic, dec("10000"));
        assert_eq!(result.daily_rate, dec("384.62"));
        // 10000 / 26 * 20 = 7692.307692...
        assert_eq!(result.basic_pay, dec("7692.31"));
        assert_eq!(result.attendance_percentage, dec("76.92"));
    }

    #[test]
    fn test_rounding_happens_after_full_precision_product() {
        // Rounding the daily rate first would give 384.62 * 20 = 7692.40.
        let result = calculate_basic_pay(dec("120000"), 20, &create_rule_set(26, true), 1).unwrap();
        assert_ne!(result.basic_pay, dec("7692.40"));
    }

    #[test]
    fn test_monthly_basis_ignores_present_days() {
        let result = calculate_basic_pay(dec("120000"), 3, &create_rule_set(26, false), 1).unwrap();
        assert_eq!(result.basic_pay, dec("10000"));
        assert_eq!(result.audit_step.output["method"], "monthly");
    }

    #[test]
    fn test_full_attendance_is_exactly_one_hundred_percent() {
        let result = calculate_basic_pay(dec("120000"), 26, &create_rule_set(26, true), 1).unwrap();
        assert_eq!(result.attendance_percentage, dec("100"));
        assert_eq!(result.basic_pay, dec("10000"));
    }

    #[test]
    fn test_attendance_percentage_is_not_capped() {
        let result = calculate_basic_pay(dec("120000"), 30, &create_rule_set(26, true), 1).unwrap();
        assert!(result.attendance_percentage > dec("100"));
        assert_eq!(result.attendance_percentage, dec("115.38"));
    }

    #[test]
    fn test_zero_working_days_is_a_configuration_error() {
        let result = calculate_basic_pay(dec("120000"), 20, &create_rule_set(0, true), 1);
        assert!(matches!(
            result,
            Err(EngineError::ConfigurationMissing { .. })
        ));
    }

    #[test]
    fn test_audit_step_records_inputs() {
        let result = calculate_basic_pay(dec("120000"), 20, &create_rule_set(26, true), 4).unwrap();
        assert_eq!(result.audit_step.step_number, 4);
        assert_eq!(result.audit_step.rule_id, "basic_pay");
        assert_eq!(result.audit_step.input["present_days"], 20);
        assert_eq!(result.audit_step.output["basic_pay"], "7692.31");
    }
}
