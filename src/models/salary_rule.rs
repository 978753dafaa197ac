//! Salary rules and rule sets.
//!
//! Two kinds of documents live in the Rule Store:
//!
//! - [`SalaryRule`]: a single deduction/bonus rule (late arrival, half-day
//!   adjustment, bonus, allowance) with a threshold and a valuation method.
//! - [`RuleSet`]: a versioned collection of pay components and
//!   addition/deduction entries, plus the working-day basis used to pro-rate
//!   basic pay. Exactly one rule set drives a calculation.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::EmploymentType;

/// The kind of salary rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleType {
    /// Deduction triggered by accumulated late days.
    LateDeduction,
    /// Deduction applied per half-day.
    AdjustmentDeduction,
    /// Bonus added to earnings.
    Bonus,
    /// Allowance added to earnings.
    Allowance,
}

impl RuleType {
    /// Returns true for rule types that reduce pay.
    pub fn is_deduction(self) -> bool {
        matches!(self, RuleType::LateDeduction | RuleType::AdjustmentDeduction)
    }
}

/// How a salary rule's `deductionAmount` is valued.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeductionType {
    /// `deductionAmount` days of salary.
    #[default]
    DailySalary,
    /// `deductionAmount` percent of basic pay.
    Percentage,
    /// `deductionAmount` as an absolute amount.
    FixedAmount,
}

/// Conditions attached to a salary rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleConditions {
    /// Number of qualifying events per unit (e.g. 3 late days = 1 unit).
    #[serde(default = "default_threshold")]
    pub threshold: u32,
    /// Valuation method.
    #[serde(default)]
    pub deduction_type: DeductionType,
    /// Employment classes the rule applies to; `"all"` matches everyone.
    #[serde(default = "default_applicable_to")]
    pub applicable_to: Vec<String>,
    /// First day the rule is effective.
    #[serde(default)]
    pub effective_from: Option<NaiveDate>,
}

fn default_threshold() -> u32 {
    1
}

fn default_applicable_to() -> Vec<String> {
    vec!["all".to_string()]
}

impl Default for RuleConditions {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            deduction_type: DeductionType::default(),
            applicable_to: default_applicable_to(),
            effective_from: None,
        }
    }
}

impl RuleConditions {
    /// Returns true if the rule covers the given employment class.
    pub fn applies_to(&self, employment_type: EmploymentType) -> bool {
        self.applicable_to.iter().any(|class| {
            class.eq_ignore_ascii_case("all") || class.eq_ignore_ascii_case(employment_type.as_str())
        })
    }
}

/// A single salary deduction/bonus rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalaryRule {
    /// Document id.
    pub id: Uuid,
    /// Unique human-facing code.
    pub rule_code: String,
    /// Short title.
    pub title: String,
    /// Longer description.
    #[serde(default)]
    pub description: String,
    /// Kind of rule.
    pub rule_type: RuleType,
    /// Free-text description of the calculation.
    #[serde(default)]
    pub calculation: String,
    /// The amount valued according to `conditions.deductionType`.
    pub deduction_amount: Decimal,
    /// Threshold and applicability.
    #[serde(default)]
    pub conditions: RuleConditions,
    /// Inactive rules are ignored by the calculator.
    pub is_active: bool,
    /// System defaults cannot be deleted.
    #[serde(default)]
    pub is_system_default: bool,
    /// Creator.
    pub created_by: String,
    /// Last editor.
    #[serde(default)]
    pub updated_by: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

impl SalaryRule {
    /// Returns true if the rule is active, covers the employment class and is
    /// effective on or before `on`.
    pub fn is_applicable(&self, employment_type: EmploymentType, on: NaiveDate) -> bool {
        self.is_active
            && self.conditions.applies_to(employment_type)
            && self.conditions.effective_from.is_none_or(|from| from <= on)
    }
}

/// Read-only projection served to every authenticated role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalaryRuleSummary {
    /// Unique code.
    pub rule_code: String,
    /// Title.
    pub title: String,
    /// Description.
    pub description: String,
    /// Kind of rule.
    pub rule_type: RuleType,
    /// Calculation text.
    pub calculation: String,
    /// Amount.
    pub deduction_amount: Decimal,
    /// Conditions.
    pub conditions: RuleConditions,
}

impl From<&SalaryRule> for SalaryRuleSummary {
    fn from(rule: &SalaryRule) -> Self {
        Self {
            rule_code: rule.rule_code.clone(),
            title: rule.title.clone(),
            description: rule.description.clone(),
            rule_type: rule.rule_type,
            calculation: rule.calculation.clone(),
            deduction_amount: rule.deduction_amount,
            conditions: rule.conditions.clone(),
        }
    }
}

/// How a pay component is valued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ComponentKind {
    /// `basicPay * value / 100`.
    Percentage {
        /// Percent of basic pay.
        value: Decimal,
    },
    /// An absolute amount.
    Fixed {
        /// The amount.
        value: Decimal,
    },
    /// An arithmetic expression over the token `basic`.
    Formula {
        /// The expression, e.g. `"basic * 0.4 + 500"`.
        expression: String,
    },
}

impl ComponentKind {
    /// The method name recorded in calculation breakdowns.
    pub fn method(&self) -> &'static str {
        match self {
            ComponentKind::Percentage { .. } => "percentage",
            ComponentKind::Fixed { .. } => "fixed",
            ComponentKind::Formula { .. } => "formula",
        }
    }
}

/// A named pay component (house rent, medical, conveyance ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleComponent {
    /// Component name.
    pub name: String,
    /// Valuation.
    #[serde(flatten)]
    pub kind: ComponentKind,
}

/// How an addition or deduction entry is valued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentKind {
    /// Percent of basic pay.
    Percentage,
    /// Absolute amount.
    Fixed,
}

/// An addition or deduction entry of a rule set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleAdjustment {
    /// Entry name.
    pub name: String,
    /// Valuation method.
    #[serde(rename = "type")]
    pub kind: AdjustmentKind,
    /// Percent or amount.
    pub value: Decimal,
}

/// A versioned rule set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleSet {
    /// Document id.
    pub id: Uuid,
    /// Human-readable name.
    pub name: String,
    /// First day the set is effective.
    pub effective_from: NaiveDate,
    /// Inactive sets are never selected.
    #[serde(default = "default_true")]
    pub is_active: bool,
    /// Divisor used to pro-rate monthly salary per present day.
    #[serde(default = "default_working_days")]
    pub working_days_per_month: u32,
    /// Whether basic pay is pro-rated by present days.
    #[serde(default = "default_true")]
    pub per_day_salary_calculation: bool,
    /// Pay components.
    #[serde(default)]
    pub components: Vec<RuleComponent>,
    /// Additions to pay.
    #[serde(default)]
    pub additions: Vec<RuleAdjustment>,
    /// Deductions from pay.
    #[serde(default)]
    pub deductions: Vec<RuleAdjustment>,
    /// Creator.
    pub created_by: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

/// The fields of a rule set supplied by a caller or by configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleSetDraft {
    /// Human-readable name.
    pub name: String,
    /// First day the set is effective.
    pub effective_from: NaiveDate,
    /// Inactive sets are never selected.
    #[serde(default = "default_true")]
    pub is_active: bool,
    /// Divisor used to pro-rate monthly salary per present day.
    #[serde(default = "default_working_days")]
    pub working_days_per_month: u32,
    /// Whether basic pay is pro-rated by present days.
    #[serde(default = "default_true")]
    pub per_day_salary_calculation: bool,
    /// Pay components.
    #[serde(default)]
    pub components: Vec<RuleComponent>,
    /// Additions to pay.
    #[serde(default)]
    pub additions: Vec<RuleAdjustment>,
    /// Deductions from pay.
    #[serde(default)]
    pub deductions: Vec<RuleAdjustment>,
}

impl RuleSetDraft {
    /// Stamps the draft into a stored rule set.
    pub fn into_rule_set(self, created_by: impl Into<String>, now: DateTime<Utc>) -> RuleSet {
        RuleSet {
            id: Uuid::new_v4(),
            name: self.name,
            effective_from: self.effective_from,
            is_active: self.is_active,
            working_days_per_month: self.working_days_per_month,
            per_day_salary_calculation: self.per_day_salary_calculation,
            components: self.components,
            additions: self.additions,
            deductions: self.deductions,
            created_by: created_by.into(),
            created_at: now,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Working days per month used when a rule set does not say otherwise.
pub const DEFAULT_WORKING_DAYS_PER_MONTH: u32 = 26;

fn default_working_days() -> u32 {
    DEFAULT_WORKING_DAYS_PER_MONTH
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_component_kind_is_internally_tagged() {
        let json = r#"{"name": "House Rent", "type": "formula", "expression": "basic * 0.5"}"#;
        let component: RuleComponent = serde_json::from_str(json).unwrap();
        assert_eq!(component.name, "House Rent");
        assert_eq!(
            component.kind,
            ComponentKind::Formula {
                expression: "basic * 0.5".to_string()
            }
        );
        assert_eq!(component.kind.method(), "formula");
    }

    #[test]
    fn test_percentage_component_deserializes() {
        let json = r#"{"name": "Medical", "type": "percentage", "value": "10"}"#;
        let component: RuleComponent = serde_json::from_str(json).unwrap();
        assert_eq!(
            component.kind,
            ComponentKind::Percentage {
                value: Decimal::from(10)
            }
        );
    }

    #[test]
    fn test_rule_set_defaults() {
        let json = r#"{
            "id": "6f0b6f1e-7a44-4a57-9d2a-0d3c1b1d2e3f",
            "name": "Default",
            "effectiveFrom": "2026-01-01",
            "createdBy": "system",
            "createdAt": "2026-01-01T00:00:00Z"
        }"#;
        let set: RuleSet = serde_json::from_str(json).unwrap();
        assert_eq!(set.working_days_per_month, 26);
        assert!(set.per_day_salary_calculation);
        assert!(set.is_active);
        assert!(set.components.is_empty());
    }

    #[test]
    fn test_conditions_applicability() {
        let conditions = RuleConditions {
            applicable_to: vec!["permanent".to_string(), "probation".to_string()],
            ..RuleConditions::default()
        };
        assert!(conditions.applies_to(EmploymentType::Permanent));
        assert!(!conditions.applies_to(EmploymentType::Intern));
        assert!(RuleConditions::default().applies_to(EmploymentType::Intern));
    }

    #[test]
    fn test_rule_type_is_deduction() {
        assert!(RuleType::LateDeduction.is_deduction());
        assert!(RuleType::AdjustmentDeduction.is_deduction());
        assert!(!RuleType::Bonus.is_deduction());
        assert_eq!(
            serde_json::to_string(&RuleType::AdjustmentDeduction).unwrap(),
            "\"adjustment_deduction\""
        );
    }
}
