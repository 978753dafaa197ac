//! Rule Store.
//!
//! Administrators manage salary rules and rule sets here. The calculator
//! reads the rule set selected by [`select_active_rule_set`] and every
//! active salary rule.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use super::{Actor, Clock};
use crate::error::{EngineError, EngineResult};
use crate::models::{
    DeductionType, RuleConditions, RuleSet, RuleSetDraft, RuleType, SalaryRule, SalaryRuleSummary,
};
use crate::store::{Collections, DocumentStore};

/// Code of the bootstrapped late-deduction rule.
pub const DEFAULT_LATE_RULE_CODE: &str = "LATE-001";
/// Code of the bootstrapped half-day adjustment rule.
pub const DEFAULT_HALF_DAY_RULE_CODE: &str = "ADJ-001";

/// Fields of a new salary rule.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSalaryRule {
    /// Unique code; generated when absent.
    #[serde(default)]
    pub rule_code: Option<String>,
    /// Short title.
    pub title: String,
    /// Description.
    #[serde(default)]
    pub description: String,
    /// Kind of rule.
    pub rule_type: RuleType,
    /// Free-text calculation note.
    #[serde(default)]
    pub calculation: String,
    /// Amount valued by `conditions.deductionType`.
    pub deduction_amount: Decimal,
    /// Threshold and applicability.
    #[serde(default)]
    pub conditions: RuleConditions,
    /// Whether the rule starts active (default true).
    #[serde(default)]
    pub is_active: Option<bool>,
}

/// Changes to a salary rule; absent fields are kept.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalaryRuleUpdate {
    /// New code.
    #[serde(default)]
    pub rule_code: Option<String>,
    /// New title.
    #[serde(default)]
    pub title: Option<String>,
    /// New description.
    #[serde(default)]
    pub description: Option<String>,
    /// New kind.
    #[serde(default)]
    pub rule_type: Option<RuleType>,
    /// New calculation note.
    #[serde(default)]
    pub calculation: Option<String>,
    /// New amount.
    #[serde(default)]
    pub deduction_amount: Option<Decimal>,
    /// New conditions.
    #[serde(default)]
    pub conditions: Option<RuleConditions>,
    /// New active flag.
    #[serde(default)]
    pub is_active: Option<bool>,
}

/// Filters for listing salary rules.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalaryRuleFilter {
    /// Only this kind.
    #[serde(default)]
    pub rule_type: Option<RuleType>,
    /// Only active or only inactive.
    #[serde(default)]
    pub is_active: Option<bool>,
}

/// Generates a rule code of the form `RULE-<YYYYMMDD>-<6 hex>`.
///
/// ```
/// use payroll_engine::services::generate_rule_code;
/// use chrono::Utc;
///
/// let code = generate_rule_code(Utc::now());
/// assert!(code.starts_with("RULE-"));
/// assert_eq!(code.len(), "RULE-20260101-ABCDEF".len());
/// ```
pub fn generate_rule_code(now: DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!(
        "RULE-{}-{}",
        now.format("%Y%m%d"),
        suffix[..6].to_uppercase()
    )
}

/// The system-default salary rules.
///
/// - `LATE-001`: every 3 late days deduct one day's salary
/// - `ADJ-001`: every half day deducts half a day's salary
pub fn default_salary_rules(now: DateTime<Utc>) -> Vec<SalaryRule> {
    let rule = |code: &str, title: &str, description: &str, rule_type, calculation: &str, amount, threshold| {
        SalaryRule {
            id: Uuid::new_v4(),
            rule_code: code.to_string(),
            title: title.to_string(),
            description: description.to_string(),
            rule_type,
            calculation: calculation.to_string(),
            deduction_amount: amount,
            conditions: RuleConditions {
                threshold,
                deduction_type: DeductionType::DailySalary,
                ..RuleConditions::default()
            },
            is_active: true,
            is_system_default: true,
            created_by: "system".to_string(),
            updated_by: None,
            created_at: now,
            updated_at: now,
        }
    };
    vec![
        rule(
            DEFAULT_LATE_RULE_CODE,
            "Late Attendance Deduction",
            "Three late arrivals in a period deduct one day's salary",
            RuleType::LateDeduction,
            "floor(lateDays / 3) x daily salary",
            Decimal::ONE,
            3,
        ),
        rule(
            DEFAULT_HALF_DAY_RULE_CODE,
            "Half Day Adjustment",
            "Each half day deducts half of one day's salary",
            RuleType::AdjustmentDeduction,
            "halfDays x 0.5 x daily salary",
            dec!(0.5),
            1,
        ),
    ]
}

/// Selects the rule set in force on `on`.
///
/// Among active sets with `effectiveFrom <= on`, the latest `effectiveFrom`
/// wins; ties go to the most recently created set.
pub fn select_active_rule_set<'a>(
    rule_sets: impl IntoIterator<Item = &'a RuleSet>,
    on: NaiveDate,
) -> Option<&'a RuleSet> {
    rule_sets
        .into_iter()
        .filter(|set| set.is_active && set.effective_from <= on)
        .max_by_key(|set| (set.effective_from, set.created_at))
}

/// Active salary rules, in code order.
pub fn active_salary_rules(collections: &Collections) -> Vec<SalaryRule> {
    let mut rules: Vec<SalaryRule> = collections
        .salary_rules
        .values()
        .filter(|rule| rule.is_active)
        .cloned()
        .collect();
    rules.sort_by(|a, b| a.rule_code.cmp(&b.rule_code));
    rules
}

/// The Rule Store service.
#[derive(Clone)]
pub struct RuleStore {
    store: Arc<DocumentStore>,
    clock: Arc<dyn Clock>,
}

impl RuleStore {
    /// Creates the service.
    pub fn new(store: Arc<DocumentStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Inserts the system-default salary rules that are missing. Idempotent.
    /// Returns how many were inserted.
    pub async fn bootstrap_defaults(&self) -> EngineResult<usize> {
        {
            let collections = self.store.read().await;
            let present = |code: &str| collections.salary_rules.values().any(|r| r.rule_code == code);
            if present(DEFAULT_LATE_RULE_CODE) && present(DEFAULT_HALF_DAY_RULE_CODE) {
                return Ok(0);
            }
        }

        let mut tx = self.store.begin().await;
        let mut inserted = 0;
        for rule in default_salary_rules(self.clock.now()) {
            if tx.salary_rules.values().any(|r| r.rule_code == rule.rule_code) {
                continue;
            }
            tx.insert_salary_rule(rule)?;
            inserted += 1;
        }
        tx.commit().await?;
        if inserted > 0 {
            info!(inserted, "Bootstrapped default salary rules");
        }
        Ok(inserted)
    }

    /// Stores the configured rule sets when no rule set exists yet.
    /// Returns how many were stored.
    pub async fn seed_rule_sets(&self, drafts: Vec<RuleSetDraft>) -> EngineResult<usize> {
        let mut tx = self.store.begin().await;
        if !tx.rule_sets.is_empty() || drafts.is_empty() {
            return Ok(0);
        }
        let now = self.clock.now();
        let count = drafts.len();
        for draft in drafts {
            let set = draft.into_rule_set("system", now);
            tx.rule_sets.insert(set.id, set);
        }
        tx.commit().await?;
        info!(count, "Seeded rule sets from configuration");
        Ok(count)
    }

    // --- salary rules ---

    /// Creates a salary rule. Admin only.
    ///
    /// # Errors
    ///
    /// `DuplicateRuleCode` if the code is taken; `Validation` for an empty
    /// title or a negative amount.
    pub async fn create_rule(&self, actor: &Actor, input: NewSalaryRule) -> EngineResult<SalaryRule> {
        actor.require_admin()?;
        self.bootstrap_defaults().await?;

        if input.title.trim().is_empty() {
            return Err(EngineError::validation("title", "title is required"));
        }
        if input.deduction_amount.is_sign_negative() {
            return Err(EngineError::validation("deductionAmount", "must not be negative"));
        }

        let now = self.clock.now();
        let rule_code = match input.rule_code.map(|c| c.trim().to_string()) {
            Some(code) if !code.is_empty() => code,
            _ => generate_rule_code(now),
        };
        let rule = SalaryRule {
            id: Uuid::new_v4(),
            rule_code,
            title: input.title,
            description: input.description,
            rule_type: input.rule_type,
            calculation: input.calculation,
            deduction_amount: input.deduction_amount,
            conditions: input.conditions,
            is_active: input.is_active.unwrap_or(true),
            is_system_default: false,
            created_by: actor.user_id.clone(),
            updated_by: None,
            created_at: now,
            updated_at: now,
        };

        let mut tx = self.store.begin().await;
        tx.insert_salary_rule(rule.clone())?;
        tx.commit().await?;
        info!(rule_code = %rule.rule_code, actor = %actor.user_id, "Salary rule created");
        Ok(rule)
    }

    /// Lists salary rules, newest first. Admin only.
    pub async fn list_rules(&self, actor: &Actor, filter: SalaryRuleFilter) -> EngineResult<Vec<SalaryRule>> {
        actor.require_admin()?;
        self.bootstrap_defaults().await?;
        let collections = self.store.read().await;
        let mut rules: Vec<SalaryRule> = collections
            .salary_rules
            .values()
            .filter(|r| filter.rule_type.is_none_or(|t| r.rule_type == t))
            .filter(|r| filter.is_active.is_none_or(|a| r.is_active == a))
            .cloned()
            .collect();
        rules.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.rule_code.cmp(&b.rule_code)));
        Ok(rules)
    }

    /// Gets one salary rule. Admin only.
    pub async fn get_rule(&self, actor: &Actor, id: Uuid) -> EngineResult<SalaryRule> {
        actor.require_admin()?;
        self.bootstrap_defaults().await?;
        self.store.read().await.salary_rule(id).cloned()
    }

    /// Updates a salary rule. Admin only.
    pub async fn update_rule(&self, actor: &Actor, id: Uuid, update: SalaryRuleUpdate) -> EngineResult<SalaryRule> {
        actor.require_admin()?;
        self.bootstrap_defaults().await?;

        let mut tx = self.store.begin().await;
        let mut rule = tx.salary_rule(id)?.clone();
        if let Some(code) = update.rule_code {
            if code.trim().is_empty() {
                return Err(EngineError::validation("ruleCode", "must not be empty"));
            }
            rule.rule_code = code.trim().to_string();
        }
        if let Some(title) = update.title {
            rule.title = title;
        }
        if let Some(description) = update.description {
            rule.description = description;
        }
        if let Some(rule_type) = update.rule_type {
            rule.rule_type = rule_type;
        }
        if let Some(calculation) = update.calculation {
            rule.calculation = calculation;
        }
        if let Some(amount) = update.deduction_amount {
            if amount.is_sign_negative() {
                return Err(EngineError::validation("deductionAmount", "must not be negative"));
            }
            rule.deduction_amount = amount;
        }
        if let Some(conditions) = update.conditions {
            rule.conditions = conditions;
        }
        if let Some(active) = update.is_active {
            rule.is_active = active;
        }
        rule.updated_by = Some(actor.user_id.clone());
        rule.updated_at = self.clock.now();

        tx.insert_salary_rule(rule.clone())?;
        tx.commit().await?;
        info!(rule_code = %rule.rule_code, actor = %actor.user_id, "Salary rule updated");
        Ok(rule)
    }

    /// Deletes a salary rule. Admin only; system defaults are protected.
    pub async fn delete_rule(&self, actor: &Actor, id: Uuid) -> EngineResult<SalaryRule> {
        actor.require_admin()?;
        self.bootstrap_defaults().await?;

        let mut tx = self.store.begin().await;
        let rule = tx.salary_rule(id)?.clone();
        if rule.is_system_default {
            return Err(EngineError::ProtectedRule { code: rule.rule_code });
        }
        tx.salary_rules.remove(&id);
        tx.commit().await?;
        info!(rule_code = %rule.rule_code, actor = %actor.user_id, "Salary rule deleted");
        Ok(rule)
    }

    /// Flips a salary rule's active flag. Admin only.
    pub async fn toggle_rule(&self, actor: &Actor, id: Uuid) -> EngineResult<SalaryRule> {
        actor.require_admin()?;
        self.bootstrap_defaults().await?;

        let now = self.clock.now();
        let mut tx = self.store.begin().await;
        let rule = tx
            .salary_rules
            .get_mut(&id)
            .ok_or_else(|| EngineError::NotFound {
                entity: "Salary rule",
                id: id.to_string(),
            })?;
        rule.is_active = !rule.is_active;
        rule.updated_by = Some(actor.user_id.clone());
        rule.updated_at = now;
        let rule = rule.clone();
        tx.commit().await?;
        info!(rule_code = %rule.rule_code, is_active = rule.is_active, "Salary rule toggled");
        Ok(rule)
    }

    /// Read-only projection of the active rules, for every role.
    pub async fn active_rules(&self) -> Vec<SalaryRuleSummary> {
        let collections = self.store.read().await;
        active_salary_rules(&collections)
            .iter()
            .map(SalaryRuleSummary::from)
            .collect()
    }

    // --- rule sets ---

    /// Creates a rule set. Admin only.
    pub async fn create_rule_set(&self, actor: &Actor, draft: RuleSetDraft) -> EngineResult<RuleSet> {
        actor.require_admin()?;
        if draft.name.trim().is_empty() {
            return Err(EngineError::validation("name", "name is required"));
        }
        if draft.working_days_per_month == 0 {
            return Err(EngineError::validation("workingDaysPerMonth", "must be at least 1"));
        }
        let set = draft.into_rule_set(&actor.user_id, self.clock.now());
        let mut tx = self.store.begin().await;
        tx.rule_sets.insert(set.id, set.clone());
        tx.commit().await?;
        info!(rule_set_id = %set.id, name = %set.name, "Rule set created");
        Ok(set)
    }

    /// Lists rule sets, latest effective date first. Admin only.
    pub async fn list_rule_sets(&self, actor: &Actor) -> EngineResult<Vec<RuleSet>> {
        actor.require_admin()?;
        let collections = self.store.read().await;
        let mut sets: Vec<RuleSet> = collections.rule_sets.values().cloned().collect();
        sets.sort_by(|a, b| {
            (b.effective_from, b.created_at).cmp(&(a.effective_from, a.created_at))
        });
        Ok(sets)
    }

    /// The rule set in force on `on` (today when absent).
    ///
    /// # Errors
    ///
    /// `ConfigurationMissing` when no active rule set is effective.
    pub async fn current_rule_set(&self, on: Option<NaiveDate>) -> EngineResult<RuleSet> {
        let on = on.unwrap_or_else(|| self.clock.today());
        let collections = self.store.read().await;
        select_active_rule_set(collections.rule_sets.values(), on)
            .cloned()
            .ok_or_else(|| EngineError::ConfigurationMissing {
                message: format!("no active rule set effective on {}", on),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use crate::services::FixedClock;
    use chrono::Duration;

    fn admin() -> Actor {
        Actor::new("admin_001", Role::Admin)
    }

    fn service() -> (RuleStore, FixedClock) {
        let clock = FixedClock::on(NaiveDate::from_ymd_opt(2026, 2, 10).unwrap());
        (
            RuleStore::new(Arc::new(DocumentStore::new()), Arc::new(clock.clone())),
            clock,
        )
    }

    fn draft(name: &str, effective_from: NaiveDate) -> RuleSetDraft {
        RuleSetDraft {
            name: name.to_string(),
            effective_from,
            is_active: true,
            working_days_per_month: 26,
            per_day_salary_calculation: true,
            components: vec![],
            additions: vec![],
            deductions: vec![],
        }
    }

    fn new_rule(code: Option<&str>) -> NewSalaryRule {
        NewSalaryRule {
            rule_code: code.map(str::to_string),
            title: "Festival Bonus".to_string(),
            description: String::new(),
            rule_type: RuleType::Bonus,
            calculation: String::new(),
            deduction_amount: Decimal::from(1000),
            conditions: RuleConditions {
                deduction_type: DeductionType::FixedAmount,
                ..RuleConditions::default()
            },
            is_active: None,
        }
    }

    #[tokio::test]
    async fn test_bootstrap_is_idempotent() {
        let (rules, _) = service();
        assert_eq!(rules.bootstrap_defaults().await.unwrap(), 2);
        assert_eq!(rules.bootstrap_defaults().await.unwrap(), 0);
        let listed = rules.list_rules(&admin(), SalaryRuleFilter::default()).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert!(listed.iter().all(|r| r.is_system_default));
    }

    #[tokio::test]
    async fn test_generated_code_format() {
        let (rules, _) = service();
        let rule = rules.create_rule(&admin(), new_rule(None)).await.unwrap();
        assert!(rule.rule_code.starts_with("RULE-20260210-"));
        let suffix = &rule.rule_code["RULE-20260210-".len()..];
        assert_eq!(suffix.len(), 6);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[tokio::test]
    async fn test_duplicate_code_is_rejected() {
        let (rules, _) = service();
        rules.create_rule(&admin(), new_rule(Some("BONUS-1"))).await.unwrap();
        let duplicate = rules.create_rule(&admin(), new_rule(Some("BONUS-1"))).await;
        assert!(matches!(duplicate, Err(EngineError::DuplicateRuleCode { .. })));
        let default_clash = rules.create_rule(&admin(), new_rule(Some("LATE-001"))).await;
        assert!(matches!(default_clash, Err(EngineError::DuplicateRuleCode { .. })));
    }

    #[tokio::test]
    async fn test_system_defaults_cannot_be_deleted() {
        let (rules, _) = service();
        let listed = rules.list_rules(&admin(), SalaryRuleFilter::default()).await.unwrap();
        let result = rules.delete_rule(&admin(), listed[0].id).await;
        assert!(matches!(result, Err(EngineError::ProtectedRule { .. })));

        let custom = rules.create_rule(&admin(), new_rule(None)).await.unwrap();
        rules.delete_rule(&admin(), custom.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_toggle_hides_rule_from_active_projection() {
        let (rules, _) = service();
        let custom = rules.create_rule(&admin(), new_rule(Some("BONUS-1"))).await.unwrap();
        assert_eq!(rules.active_rules().await.len(), 3);
        let toggled = rules.toggle_rule(&admin(), custom.id).await.unwrap();
        assert!(!toggled.is_active);
        assert_eq!(rules.active_rules().await.len(), 2);
    }

    #[tokio::test]
    async fn test_update_keeps_unspecified_fields() {
        let (rules, _) = service();
        let custom = rules.create_rule(&admin(), new_rule(Some("BONUS-1"))).await.unwrap();
        let updated = rules
            .update_rule(
                &admin(),
                custom.id,
                SalaryRuleUpdate {
                    deduction_amount: Some(Decimal::from(1500)),
                    ..SalaryRuleUpdate::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.deduction_amount, Decimal::from(1500));
        assert_eq!(updated.title, "Festival Bonus");
        assert_eq!(updated.updated_by.as_deref(), Some("admin_001"));
    }

    #[tokio::test]
    async fn test_employees_cannot_manage_rules() {
        let (rules, _) = service();
        let employee = Actor::new("emp_001", Role::Employee);
        assert!(matches!(
            rules.create_rule(&employee, new_rule(None)).await,
            Err(EngineError::Permission { .. })
        ));
    }

    #[tokio::test]
    async fn test_active_rule_set_prefers_latest_effective_date() {
        let (rules, clock) = service();
        let jan = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let feb = NaiveDate::from_ymd_opt(2026, 2, 1).unwrap();
        let mar = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        rules.create_rule_set(&admin(), draft("January", jan)).await.unwrap();
        rules.create_rule_set(&admin(), draft("February", feb)).await.unwrap();
        rules.create_rule_set(&admin(), draft("March", mar)).await.unwrap();

        assert_eq!(rules.current_rule_set(None).await.unwrap().name, "February");
        assert_eq!(rules.current_rule_set(Some(jan)).await.unwrap().name, "January");

        clock.advance(Duration::hours(1));
        rules.create_rule_set(&admin(), draft("February revised", feb)).await.unwrap();
        assert_eq!(rules.current_rule_set(None).await.unwrap().name, "February revised");
    }

    #[tokio::test]
    async fn test_no_rule_set_is_configuration_missing() {
        let (rules, _) = service();
        assert!(matches!(
            rules.current_rule_set(None).await,
            Err(EngineError::ConfigurationMissing { .. })
        ));
    }

    #[tokio::test]
    async fn test_seed_only_when_empty() {
        let (rules, _) = service();
        let jan = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        assert_eq!(rules.seed_rule_sets(vec![draft("Seed", jan)]).await.unwrap(), 1);
        assert_eq!(rules.seed_rule_sets(vec![draft("Seed", jan)]).await.unwrap(), 0);
    }
}
