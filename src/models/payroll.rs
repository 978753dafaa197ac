//! Payroll record model.
//!
//! A [`PayrollRecord`] is the persisted result of one salary calculation for
//! one employee and one period, plus the manual adjustments, approval state
//! and audit stamps accumulated afterwards.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{
    AttendanceSummary, ComponentAmount, EmployeeSnapshot, Period, RuleAdjustmentAmount,
    RulesApplied,
};
use crate::calculation::amount_in_words;

/// Lifecycle status of a payroll record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayrollStatus {
    /// Internal, not reachable through the API.
    Draft,
    /// Created and awaiting the employee.
    Pending,
    /// Approved by an administrator.
    Approved,
    /// Accepted by the employee and paid.
    Paid,
    /// Rejected by the employee.
    Rejected,
    /// Internal, not reachable through the API.
    Processing,
}

impl PayrollStatus {
    /// The snake_case name.
    pub fn as_str(self) -> &'static str {
        match self {
            PayrollStatus::Draft => "draft",
            PayrollStatus::Pending => "pending",
            PayrollStatus::Approved => "approved",
            PayrollStatus::Paid => "paid",
            PayrollStatus::Rejected => "rejected",
            PayrollStatus::Processing => "processing",
        }
    }

    /// Paid and approved payrolls are final and are not adjusted by later
    /// leave approvals.
    pub fn is_finalized(self) -> bool {
        matches!(self, PayrollStatus::Paid | PayrollStatus::Approved)
    }
}

impl std::fmt::Display for PayrollStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a manual amount came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmountSource {
    /// Entered by an administrator.
    Manual,
    /// Not provided.
    #[default]
    None,
}

/// An amount with provenance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualAmount {
    /// The amount.
    pub amount: Decimal,
    /// Provenance.
    pub source: AmountSource,
}

impl ManualAmount {
    /// Builds from optional input: `Some` is manual, `None` is zero.
    pub fn from_input(amount: Option<Decimal>) -> Self {
        match amount {
            Some(amount) => Self {
                amount: round_money(amount),
                source: AmountSource::Manual,
            },
            None => Self::default(),
        }
    }
}

/// Rates the salary was derived from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalaryBasis {
    /// Monthly basic salary.
    pub monthly_salary: Decimal,
    /// Monthly salary over working days.
    pub daily_rate: Decimal,
    /// Daily rate over an 8-hour day.
    pub hourly_rate: Decimal,
}

/// Earnings breakdown.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Earnings {
    /// Attendance-adjusted basic pay.
    pub basic_pay: Decimal,
    /// Additions from the rule set and salary rules.
    pub rule_additions: Decimal,
    /// Manual overtime.
    pub overtime: ManualAmount,
    /// Manual bonus.
    pub bonus: ManualAmount,
    /// Manual allowance.
    pub allowance: ManualAmount,
}

/// Deductions breakdown.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deductions {
    /// Late-arrival auto-deduction.
    pub late: Decimal,
    /// Absence auto-deduction.
    pub absent: Decimal,
    /// Unpaid / half-paid leave deduction.
    pub leave: Decimal,
    /// Half-day auto-deduction.
    pub half_day: Decimal,
    /// Other deductions from the rule set and salary rules.
    pub rule_deductions: Decimal,
    /// Manual tax.
    pub tax: ManualAmount,
    /// Manual provident fund.
    pub provident_fund: ManualAmount,
    /// Manual salary advance recovery.
    pub advance: ManualAmount,
    /// Manual loan instalment.
    pub loan: ManualAmount,
    /// Any other manual deduction.
    pub other: ManualAmount,
}

impl Deductions {
    /// Sum of every deduction line.
    pub fn total(&self) -> Decimal {
        self.late
            + self.absent
            + self.leave
            + self.half_day
            + self.rule_deductions
            + self.tax.amount
            + self.provident_fund.amount
            + self.advance.amount
            + self.loan.amount
            + self.other.amount
    }
}

/// A days-times-rate block (meal cost, onsite benefits).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayRateBlock {
    /// Number of days.
    pub days: u32,
    /// Rate per day.
    pub rate_per_day: Decimal,
    /// `days * ratePerDay`.
    pub amount: Decimal,
}

impl DayRateBlock {
    /// Builds the block and derives the amount.
    pub fn new(days: u32, rate_per_day: Decimal) -> Self {
        Self {
            days,
            rate_per_day,
            amount: round_money(Decimal::from(days) * rate_per_day),
        }
    }
}

/// Totals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayrollSummary {
    /// All earnings.
    pub gross_earnings: Decimal,
    /// All deductions.
    pub total_deductions: Decimal,
    /// `grossEarnings - totalDeductions`.
    pub net_payable: Decimal,
    /// Net payable in English words.
    pub net_payable_in_words: String,
    /// Days paid for.
    pub payable_days: Decimal,
}

/// How the payroll was calculated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationMetadata {
    /// `per_day` or `monthly`.
    pub method: String,
    /// Who triggered the calculation.
    pub calculated_by: String,
    /// Collections read.
    pub data_sources: Vec<String>,
    /// When it ran.
    pub calculated_at: DateTime<Utc>,
    /// Rules used.
    pub rules_applied: RulesApplied,
    /// Component split.
    #[serde(default)]
    pub components: Vec<ComponentAmount>,
    /// Salary rule contributions.
    #[serde(default)]
    pub rule_adjustments: Vec<RuleAdjustmentAmount>,
}

/// The employee's response to the payroll.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeApproval {
    /// Whether the employee accepted.
    pub accepted: bool,
    /// Who acted.
    #[serde(default)]
    pub acted_by: Option<String>,
    /// When.
    #[serde(default)]
    pub acted_at: Option<DateTime<Utc>>,
    /// Client IP address.
    #[serde(default)]
    pub ip_address: Option<String>,
    /// Client user agent.
    #[serde(default)]
    pub user_agent: Option<String>,
}

/// Audit stamps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayrollAudit {
    /// Creator.
    pub created_by: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
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
    /// Rejection reason.
    #[serde(default)]
    pub rejection_reason: Option<String>,
    /// Last editor.
    #[serde(default)]
    pub updated_by: Option<String>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

/// A persisted payroll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayrollRecord {
    /// Document id.
    pub id: Uuid,
    /// The employee.
    pub employee_id: String,
    /// Employee fields as they were at creation.
    pub employee: EmployeeSnapshot,
    /// First day of the period.
    pub period_start: NaiveDate,
    /// Last day of the period.
    pub period_end: NaiveDate,
    /// Lifecycle status.
    pub status: PayrollStatus,
    /// Salary basis.
    pub salary_basis: SalaryBasis,
    /// Attendance summary.
    pub attendance: AttendanceSummary,
    /// Earnings.
    pub earnings: Earnings,
    /// Deductions.
    pub deductions: Deductions,
    /// Meal cost deducted from pay.
    pub meal: DayRateBlock,
    /// Onsite benefits added to pay.
    pub onsite_benefits: DayRateBlock,
    /// Totals.
    pub summary: PayrollSummary,
    /// Calculation metadata.
    pub calculation: CalculationMetadata,
    /// Employee response.
    pub employee_approval: EmployeeApproval,
    /// Audit stamps.
    pub audit: PayrollAudit,
    /// When the payroll was paid.
    #[serde(default)]
    pub payment_date: Option<DateTime<Utc>>,
    /// Created by the calculator rather than typed in.
    pub auto_generated: bool,
    /// Soft-delete flag.
    #[serde(default)]
    pub is_deleted: bool,
}

impl PayrollRecord {
    /// The payroll period.
    pub fn period(&self) -> Period {
        Period::new(self.period_start, self.period_end)
    }

    /// Attendance-adjusted basic pay.
    pub fn basic_pay(&self) -> Decimal {
        self.earnings.basic_pay
    }

    /// Everything earned on top of basic pay.
    pub fn additions(&self) -> Decimal {
        self.earnings.rule_additions
            + self.earnings.overtime.amount
            + self.earnings.bonus.amount
            + self.earnings.allowance.amount
            + self.onsite_benefits.amount
    }

    /// Everything deducted, meal cost included.
    pub fn total_deductions(&self) -> Decimal {
        self.deductions.total() + self.meal.amount
    }

    /// Re-derives the summary from the stored component fields.
    ///
    /// `netPayable = basicPay + additions - deductions`; no floor is applied.
    pub fn recompute_summary(&mut self) {
        let gross = self.basic_pay() + self.additions();
        let total_deductions = self.total_deductions();
        let net = gross - total_deductions;
        self.summary.gross_earnings = gross;
        self.summary.total_deductions = total_deductions;
        self.summary.net_payable = net;
        self.summary.net_payable_in_words = amount_in_words(net);
    }
}

/// Rounds a money amount to 2 dp, midpoint away from zero.
///
/// ```
/// use payroll_engine::models::round_money;
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// assert_eq!(round_money(Decimal::from_str("7692.3076").unwrap()), Decimal::from_str("7692.31").unwrap());
/// assert_eq!(round_money(Decimal::from_str("0.125").unwrap()), Decimal::from_str("0.13").unwrap());
/// ```
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn blank_record() -> PayrollRecord {
        let now = Utc::now();
        PayrollRecord {
            id: Uuid::new_v4(),
            employee_id: "emp_001".to_string(),
            employee: EmployeeSnapshot::default(),
            period_start: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            period_end: NaiveDate::from_ymd_opt(2026, 1, 31).unwrap(),
            status: PayrollStatus::Pending,
            salary_basis: SalaryBasis::default(),
            attendance: AttendanceSummary::default(),
            earnings: Earnings {
                basic_pay: dec("3000"),
                ..Earnings::default()
            },
            deductions: Deductions::default(),
            meal: DayRateBlock::default(),
            onsite_benefits: DayRateBlock::default(),
            summary: PayrollSummary::default(),
            calculation: CalculationMetadata {
                method: "per_day".to_string(),
                calculated_by: "system".to_string(),
                data_sources: vec![],
                calculated_at: now,
                rules_applied: RulesApplied {
                    rule_set_id: Uuid::new_v4(),
                    rule_name: "Default".to_string(),
                    calculation_method: "per_day".to_string(),
                    salary_rule_ids: vec![],
                },
                components: vec![],
                rule_adjustments: vec![],
            },
            employee_approval: EmployeeApproval::default(),
            audit: PayrollAudit {
                created_by: "system".to_string(),
                created_at: now,
                approved_by: None,
                approved_at: None,
                rejected_by: None,
                rejected_at: None,
                rejection_reason: None,
                updated_by: None,
                updated_at: now,
            },
            payment_date: None,
            auto_generated: true,
            is_deleted: false,
        }
    }

    #[test]
    fn test_recompute_summary_nets_additions_and_deductions() {
        let mut record = blank_record();
        record.earnings.rule_additions = dec("500");
        record.earnings.bonus = ManualAmount::from_input(Some(dec("250")));
        record.deductions.leave = dec("300");
        record.deductions.tax = ManualAmount::from_input(Some(dec("100")));
        record.meal = DayRateBlock::new(10, dec("20"));

        record.recompute_summary();

        assert_eq!(record.summary.gross_earnings, dec("3750"));
        assert_eq!(record.summary.total_deductions, dec("600"));
        assert_eq!(record.summary.net_payable, dec("3150"));
        assert_eq!(
            record.summary.net_payable_in_words,
            "Three Thousand One Hundred Fifty and 00/100 Only"
        );
    }

    #[test]
    fn test_net_payable_has_no_floor() {
        let mut record = blank_record();
        record.deductions.other = ManualAmount::from_input(Some(dec("5000")));
        record.recompute_summary();
        assert_eq!(record.summary.net_payable, dec("-2000"));
    }

    #[test]
    fn test_manual_amount_provenance() {
        assert_eq!(ManualAmount::from_input(None).source, AmountSource::None);
        let manual = ManualAmount::from_input(Some(dec("12.345")));
        assert_eq!(manual.source, AmountSource::Manual);
        assert_eq!(manual.amount, dec("12.35"));
    }

    #[test]
    fn test_finalized_statuses() {
        assert!(PayrollStatus::Paid.is_finalized());
        assert!(PayrollStatus::Approved.is_finalized());
        assert!(!PayrollStatus::Pending.is_finalized());
        assert!(!PayrollStatus::Rejected.is_finalized());
    }
}
