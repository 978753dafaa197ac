//! Rule-set component evaluation.
//!
//! Evaluates the components, additions and deductions of the active rule set
//! against basic pay.

use rust_decimal::Decimal;

use super::formula::evaluate_formula;
use crate::error::EngineResult;
use crate::models::{
    AdjustmentKind, AuditStep, ComponentAmount, ComponentKind, RuleAdjustment, RuleSet,
    round_money,
};

/// The evaluated rule-set entries, including audit steps.
#[derive(Debug, Clone)]
pub struct ComponentsResult {
    /// Component split of the pay package.
    pub components: Vec<ComponentAmount>,
    /// Addition amounts.
    pub additions: Vec<ComponentAmount>,
    /// Deduction amounts.
    pub deductions: Vec<ComponentAmount>,
    /// Sum of additions.
    pub total_addition: Decimal,
    /// Sum of deductions.
    pub total_deduction: Decimal,
    /// One step for components, one for additions/deductions.
    pub audit_steps: Vec<AuditStep>,
}

/// Values a single component against basic pay.
///
/// percentage: `basicPay * value / 100`; fixed: `value`; formula: the
/// expression with `basic` bound to basic pay.
///
/// # Examples
///
/// ```
/// use payroll_engine::calculation::evaluate_component;
/// use payroll_engine::models::ComponentKind;
/// use rust_decimal::Decimal;
///
/// let kind = ComponentKind::Percentage { value: Decimal::from(50) };
/// assert_eq!(evaluate_component(&kind, Decimal::from(8000)).unwrap(), Decimal::from(4000));
/// ```
pub fn evaluate_component(kind: &ComponentKind, basic_pay: Decimal) -> EngineResult<Decimal> {
    let amount = match kind {
        ComponentKind::Percentage { value } => basic_pay * *value / Decimal::from(100),
        ComponentKind::Fixed { value } => *value,
        ComponentKind::Formula { expression } => evaluate_formula(expression, basic_pay)?,
    };
    Ok(round_money(amount))
}

/// Values an addition or deduction entry against basic pay.
pub fn evaluate_adjustment(adjustment: &RuleAdjustment, basic_pay: Decimal) -> Decimal {
    let amount = match adjustment.kind {
        AdjustmentKind::Percentage => basic_pay * adjustment.value / Decimal::from(100),
        AdjustmentKind::Fixed => adjustment.value,
    };
    round_money(amount)
}

/// Evaluates every component, addition and deduction of a rule set.
///
/// # Errors
///
/// Returns `InvalidFormula` if a formula component does not parse.
pub fn evaluate_rule_set(
    rule_set: &RuleSet,
    basic_pay: Decimal,
    step_number: u32,
) -> EngineResult<ComponentsResult> {
    let components = rule_set
        .components
        .iter()
        .map(|component| {
            Ok(ComponentAmount {
                name: component.name.clone(),
                method: component.kind.method().to_string(),
                amount: evaluate_component(&component.kind, basic_pay)?,
            })
        })
        .collect::<EngineResult<Vec<_>>>()?;

    let value_entries = |entries: &[RuleAdjustment]| -> Vec<ComponentAmount> {
        entries
            .iter()
            .map(|entry| ComponentAmount {
                name: entry.name.clone(),
                method: match entry.kind {
                    AdjustmentKind::Percentage => "percentage".to_string(),
                    AdjustmentKind::Fixed => "fixed".to_string(),
                },
                amount: evaluate_adjustment(entry, basic_pay),
            })
            .collect()
    };

    let additions = value_entries(&rule_set.additions);
    let deductions = value_entries(&rule_set.deductions);
    let total_addition: Decimal = additions.iter().map(|a| a.amount).sum();
    let total_deduction: Decimal = deductions.iter().map(|d| d.amount).sum();

    let components_step = AuditStep {
        step_number,
        rule_id: "rule_set_components".to_string(),
        rule_name: "Rule Set Components".to_string(),
        input: serde_json::json!({
            "rule_set_id": rule_set.id.to_string(),
            "basic_pay": basic_pay.to_string(),
            "components": rule_set.components.len()
        }),
        output: serde_json::to_value(&components).unwrap_or(serde_json::Value::Null),
        reasoning: format!(
            "Evaluated {} component(s) of rule set '{}'",
            components.len(),
            rule_set.name
        ),
    };

    let adjustments_step = AuditStep {
        step_number: step_number + 1,
        rule_id: "rule_set_adjustments".to_string(),
        rule_name: "Rule Set Additions and Deductions".to_string(),
        input: serde_json::json!({
            "basic_pay": basic_pay.to_string(),
            "additions": rule_set.additions.len(),
            "deductions": rule_set.deductions.len()
        }),
        output: serde_json::json!({
            "total_addition": total_addition.to_string(),
            "total_deduction": total_deduction.to_string()
        }),
        reasoning: format!(
            "Additions total {}, deductions total {}",
            total_addition, total_deduction
        ),
    };

    Ok(ComponentsResult {
        components,
        additions,
        deductions,
        total_addition,
        total_deduction,
        audit_steps: vec![components_step, adjustments_step],
    })
}
