//! Payroll Record Manager.
//!
//! Runs the salary calculator for an employee and period, persists the
//! result as a [`PayrollRecord`], and carries the record through its
//! approval lifecycle:
//!
//! ```text
//! pending --accept (employee)--> paid
//! pending --reject (employee)--> rejected
//! pending --approve (admin)----> approved
//! ```

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use super::notify::{Notification, Notifier, notify_best_effort};
use super::pagination::{Page, PageRequest, paginate};
use super::rules::{active_salary_rules, select_active_rule_set};
use super::{Actor, Clock, EmployeeDirectory};
use crate::calculation::{SalaryInput, calculate_salary, leave_deduction};
use crate::error::{EngineError, EngineResult};
use crate::models::{
    CalculationMetadata, DayRateBlock, Deductions, Earnings, Employee, EmployeeApproval,
    LeaveRequest, ManualAmount, PayrollAudit, PayrollRecord, PayrollStatus, PayrollSummary,
    Period, SalaryBasis, SalaryBreakdown, round_money,
};
use crate::store::{Collections, DocumentStore};

/// Hours in a working day, used for the informational hourly rate.
const HOURS_PER_DAY: u32 = 8;

/// Largest manual amount or day rate accepted with a payroll.
const MAX_MANUAL_AMOUNT: Decimal = dec!(1000000000);

/// A days-times-rate block as entered.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayRateInput {
    /// Number of days.
    pub days: u32,
    /// Rate per day.
    pub rate_per_day: Decimal,
}

/// Manual earnings and deductions supplied with a payroll.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualEntries {
    /// Overtime pay.
    #[serde(default)]
    pub overtime: Option<Decimal>,
    /// Bonus.
    #[serde(default)]
    pub bonus: Option<Decimal>,
    /// Allowance.
    #[serde(default)]
    pub allowance: Option<Decimal>,
    /// Income tax.
    #[serde(default)]
    pub tax: Option<Decimal>,
    /// Provident fund contribution.
    #[serde(default)]
    pub provident_fund: Option<Decimal>,
    /// Salary advance recovery.
    #[serde(default)]
    pub advance: Option<Decimal>,
    /// Loan installment.
    #[serde(default)]
    pub loan: Option<Decimal>,
    /// Anything else.
    #[serde(default)]
    pub other: Option<Decimal>,
    /// Meal cost, deducted.
    #[serde(default)]
    pub meal: Option<DayRateInput>,
    /// Onsite benefits, earned.
    #[serde(default)]
    pub onsite_benefits: Option<DayRateInput>,
}

impl ManualEntries {
    /// Rejects negative amounts and amounts above [`MAX_MANUAL_AMOUNT`].
    fn validate(&self) -> EngineResult<()> {
        let amounts = [
            ("overtime", self.overtime),
            ("bonus", self.bonus),
            ("allowance", self.allowance),
            ("tax", self.tax),
            ("providentFund", self.provident_fund),
            ("advance", self.advance),
            ("loan", self.loan),
            ("other", self.other),
            ("meal.ratePerDay", self.meal.map(|m| m.rate_per_day)),
            ("onsiteBenefits.ratePerDay", self.onsite_benefits.map(|b| b.rate_per_day)),
        ];
        for (field, amount) in amounts {
            let Some(amount) = amount else { continue };
            if amount.is_sign_negative() && !amount.is_zero() {
                return Err(EngineError::validation(field, "must not be negative"));
            }
            if amount > MAX_MANUAL_AMOUNT {
                return Err(EngineError::validation(
                    field,
                    format!("must not exceed {}", MAX_MANUAL_AMOUNT),
                ));
            }
        }
        Ok(())
    }
}

/// A request to create one payroll.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPayroll {
    /// The employee.
    #[serde(default)]
    pub employee_id: Option<String>,
    /// First day of the period.
    #[serde(default)]
    pub period_start: Option<NaiveDate>,
    /// Last day of the period.
    #[serde(default)]
    pub period_end: Option<NaiveDate>,
    /// Manual amounts.
    #[serde(flatten)]
    pub manual: ManualEntries,
}

impl NewPayroll {
    fn required(&self) -> EngineResult<(String, Period)> {
        let employee_id = self
            .employee_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| EngineError::validation("employeeId", "employee id is required"))?;
        let start = self
            .period_start
            .ok_or_else(|| EngineError::validation("periodStart", "period start is required"))?;
        let end = self
            .period_end
            .ok_or_else(|| EngineError::validation("periodEnd", "period end is required"))?;
        let period = Period::new(start, end);
        if !period.is_valid() {
            return Err(EngineError::validation(
                "periodEnd",
                "period end must not be before period start",
            ));
        }
        self.manual.validate()?;
        Ok((employee_id.to_string(), period))
    }
}

/// An administrator's status change.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate {
    /// New status.
    #[serde(default)]
    pub status: Option<PayrollStatus>,
    /// New employee-approval flag.
    #[serde(default)]
    pub employee_approved: Option<bool>,
    /// Reason, stored when the status becomes rejected.
    #[serde(default)]
    pub rejection_reason: Option<String>,
}

/// What an employee does with their payslip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayrollAction {
    /// Accept; the payroll becomes paid.
    Accept,
    /// Reject; the payroll becomes rejected.
    Reject,
}

/// Request metadata captured with an employee action.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientInfo {
    /// Caller address.
    pub ip_address: Option<String>,
    /// Caller user agent.
    pub user_agent: Option<String>,
}

/// Filters for the admin payroll list.
#[derive(Debug, Clone, Default)]
pub struct PayrollFilter {
    /// Only this status.
    pub status: Option<PayrollStatus>,
    /// Only this employee.
    pub employee_id: Option<String>,
    /// Periods ending on or after this day.
    pub from: Option<NaiveDate>,
    /// Periods starting on or before this day.
    pub to: Option<NaiveDate>,
}

impl PayrollFilter {
    fn matches(&self, record: &PayrollRecord) -> bool {
        !record.is_deleted
            && self.status.is_none_or(|s| record.status == s)
            && self.employee_id.as_deref().is_none_or(|id| record.employee_id == id)
            && self.from.is_none_or(|from| record.period_end >= from)
            && self.to.is_none_or(|to| record.period_start <= to)
    }
}

/// One employee that failed during a batch run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchError {
    /// The employee.
    pub employee_id: String,
    /// What went wrong.
    pub message: String,
}

/// The result of a monthly batch run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchOutcome {
    /// The period generated.
    pub period: Period,
    /// Payrolls created.
    pub generated: usize,
    /// Employees that already had a payroll for the period.
    pub skipped: usize,
    /// Employees that failed.
    pub failed: usize,
    /// Per-employee failures.
    pub errors: Vec<BatchError>,
}

/// A leave deduction computed for an enclosing payroll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayrollAdjustment {
    /// The payroll.
    pub payroll_id: Uuid,
    /// The deduction.
    pub amount: Decimal,
    /// False when the payroll was finalized and left untouched.
    pub applied: bool,
    /// What happened.
    pub note: String,
}

/// Adds the leave deduction of an approved unpaid or half-paid leave to the
/// payroll whose period encloses the whole leave.
///
/// Returns `None` for paid leave or when no payroll encloses the leave.
/// Paid and approved payrolls are left untouched; the adjustment is still
/// returned with `applied == false`.
pub(crate) fn adjust_payroll_for_leave(
    collections: &mut Collections,
    leave: &LeaveRequest,
    divisor: u32,
    actor_id: &str,
    now: DateTime<Utc>,
) -> Option<PayrollAdjustment> {
    let span = leave.period();
    let payroll = collections.payrolls.values_mut().find(|p| {
        !p.is_deleted && p.employee_id == leave.employee_id && p.period().encloses(&span)
    })?;
    let amount = leave_deduction(payroll.basic_pay(), leave.total_days, leave.pay_status, divisor)?;

    if payroll.status.is_finalized() {
        return Some(PayrollAdjustment {
            payroll_id: payroll.id,
            amount,
            applied: false,
            note: format!("payroll is {}, not adjusted", payroll.status),
        });
    }

    payroll.deductions.leave = round_money(payroll.deductions.leave + amount);
    payroll.recompute_summary();
    payroll.audit.updated_by = Some(actor_id.to_string());
    payroll.audit.updated_at = now;
    Some(PayrollAdjustment {
        payroll_id: payroll.id,
        amount,
        applied: true,
        note: format!("{} leave deduction for {} day(s)", leave.pay_status, leave.total_days),
    })
}

/// Runs the calculator against the store's current documents.
fn calculate_in(
    collections: &Collections,
    employee: &Employee,
    period: Period,
    now: DateTime<Utc>,
) -> EngineResult<SalaryBreakdown> {
    let rule_set = select_active_rule_set(collections.rule_sets.values(), period.end);
    let salary_rules = active_salary_rules(collections);
    let attendance = collections.attendance_in(&employee.id, &period);
    let leaves: Vec<LeaveRequest> = collections
        .leaves
        .values()
        .filter(|l| l.employee_id == employee.id)
        .cloned()
        .collect();

    calculate_salary(&SalaryInput {
        employee,
        period,
        rule_set,
        salary_rules: &salary_rules,
        attendance: &attendance,
        leaves: &leaves,
        now,
    })
}

/// Maps a breakdown and the manual amounts onto a new pending record.
fn build_record(
    employee: &Employee,
    breakdown: SalaryBreakdown,
    manual: &ManualEntries,
    created_by: &str,
    now: DateTime<Utc>,
) -> PayrollRecord {
    let rule_deductions =
        breakdown.total_deduction - breakdown.late_deduction - breakdown.half_day_deduction;
    let day_block = |input: Option<DayRateInput>| {
        input
            .map(|b| DayRateBlock::new(b.days, b.rate_per_day))
            .unwrap_or_default()
    };

    let mut record = PayrollRecord {
        id: Uuid::new_v4(),
        employee_id: employee.id.clone(),
        employee: employee.snapshot(),
        period_start: breakdown.period.start,
        period_end: breakdown.period.end,
        status: PayrollStatus::Pending,
        salary_basis: SalaryBasis {
            monthly_salary: breakdown.monthly_basic,
            daily_rate: breakdown.daily_rate,
            hourly_rate: round_money(breakdown.daily_rate / Decimal::from(HOURS_PER_DAY)),
        },
        attendance: breakdown.attendance.clone(),
        earnings: Earnings {
            basic_pay: breakdown.basic_pay,
            rule_additions: breakdown.total_addition,
            overtime: ManualAmount::from_input(manual.overtime),
            bonus: ManualAmount::from_input(manual.bonus),
            allowance: ManualAmount::from_input(manual.allowance),
        },
        deductions: Deductions {
            late: breakdown.late_deduction,
            absent: Decimal::ZERO,
            leave: Decimal::ZERO,
            half_day: breakdown.half_day_deduction,
            rule_deductions,
            tax: ManualAmount::from_input(manual.tax),
            provident_fund: ManualAmount::from_input(manual.provident_fund),
            advance: ManualAmount::from_input(manual.advance),
            loan: ManualAmount::from_input(manual.loan),
            other: ManualAmount::from_input(manual.other),
        },
        meal: day_block(manual.meal),
        onsite_benefits: day_block(manual.onsite_benefits),
        summary: PayrollSummary {
            payable_days: Decimal::from(breakdown.attendance.present_days),
            ..PayrollSummary::default()
        },
        calculation: CalculationMetadata {
            method: breakdown.rules_applied.calculation_method.clone(),
            calculated_by: created_by.to_string(),
            data_sources: ["attendance", "leaves", "salary_rules", "rule_sets"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            calculated_at: breakdown.calculated_at,
            rules_applied: breakdown.rules_applied,
            components: breakdown
                .components
                .into_iter()
                .chain(breakdown.additions)
                .chain(breakdown.deductions)
                .collect(),
            rule_adjustments: breakdown.rule_adjustments,
        },
        employee_approval: EmployeeApproval::default(),
        audit: PayrollAudit {
            created_by: created_by.to_string(),
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
    };
    record.recompute_summary();
    record
}

/// The Payroll Record Manager service.
#[derive(Clone)]
pub struct PayrollManager {
    store: Arc<DocumentStore>,
    directory: Arc<dyn EmployeeDirectory>,
    clock: Arc<dyn Clock>,
    notifier: Arc<dyn Notifier>,
}

impl PayrollManager {
    /// Creates the service.
    pub fn new(
        store: Arc<DocumentStore>,
        directory: Arc<dyn EmployeeDirectory>,
        clock: Arc<dyn Clock>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            store,
            directory,
            clock,
            notifier,
        }
    }

    /// Calculates a salary breakdown without persisting anything. Admin only.
    pub async fn preview(&self, actor: &Actor, employee_id: &str, period: Period) -> EngineResult<SalaryBreakdown> {
        actor.require_admin()?;
        let employee = self.directory.get(employee_id).await?;
        let collections = self.store.read().await;
        calculate_in(&collections, &employee, period, self.clock.now())
    }

    /// Calculates and persists one pending payroll. Admin only.
    ///
    /// # Errors
    ///
    /// - `Validation` for missing fields or an inverted period
    /// - `EmployeeNotFound` for an unknown employee
    /// - `DuplicatePeriod` if the employee has a payroll overlapping the period
    /// - `ConfigurationMissing` if no rule set is in force at period end
    pub async fn create_payroll(&self, actor: &Actor, input: NewPayroll) -> EngineResult<PayrollRecord> {
        actor.require_admin()?;
        let (employee_id, period) = input.required()?;
        let employee = self.directory.get(&employee_id).await?;
        let now = self.clock.now();

        let mut tx = self.store.begin().await;
        if tx.payroll_overlapping(&employee.id, &period).is_some() {
            return Err(EngineError::DuplicatePeriod {
                employee_id: employee.id.clone(),
                period_start: period.start,
                period_end: period.end,
            });
        }
        let breakdown = calculate_in(&tx, &employee, period, now)?;
        let record = build_record(&employee, breakdown, &input.manual, &actor.user_id, now);
        tx.insert_payroll(record.clone())?;
        tx.commit().await?;

        info!(
            payroll_id = %record.id,
            employee_id = %record.employee_id,
            period_start = %record.period_start,
            period_end = %record.period_end,
            net_payable = %record.summary.net_payable,
            "Payroll created"
        );
        self.notify_created(&record).await;
        Ok(record)
    }

    async fn notify_created(&self, record: &PayrollRecord) {
        notify_best_effort(
            self.notifier.as_ref(),
            Notification {
                recipient: record.employee_id.clone(),
                subject: format!("Payslip for {} to {}", record.period_start, record.period_end),
                body: format!(
                    "Your payslip is ready. Net payable: {} ({}).",
                    record.summary.net_payable, record.summary.net_payable_in_words
                ),
            },
        )
        .await;
    }

    /// Generates payrolls for the calendar month before `today` for every
    /// active non-admin employee.
    ///
    /// Employees that already have a payroll for exactly that period are
    /// skipped; failures are collected per employee and do not stop the run.
    pub async fn generate_monthly_batch(&self, actor: &Actor, today: NaiveDate) -> EngineResult<BatchOutcome> {
        actor.require_admin()?;
        let period = Period::previous_month(today);
        let employees: Vec<Employee> = self
            .directory
            .list_active()
            .await?
            .into_iter()
            .filter(|e| !e.is_admin())
            .collect();
        let now = self.clock.now();

        let mut outcome = BatchOutcome {
            period,
            generated: 0,
            skipped: 0,
            failed: 0,
            errors: Vec::new(),
        };
        let mut created = Vec::new();

        let mut tx = self.store.begin().await;
        for employee in &employees {
            if tx.payroll_for_exact_period(&employee.id, &period).is_some() {
                outcome.skipped += 1;
                continue;
            }
            let attempt = calculate_in(&tx, employee, period, now).and_then(|breakdown| {
                let record = build_record(employee, breakdown, &ManualEntries::default(), &actor.user_id, now);
                tx.insert_payroll(record.clone()).map(|()| record)
            });
            match attempt {
                Ok(record) => {
                    outcome.generated += 1;
                    created.push(record);
                }
                Err(err) => {
                    warn!(employee_id = %employee.id, error = %err, "Payroll generation failed");
                    outcome.failed += 1;
                    outcome.errors.push(BatchError {
                        employee_id: employee.id.clone(),
                        message: err.to_string(),
                    });
                }
            }
        }
        tx.commit().await?;

        info!(
            period_start = %period.start,
            period_end = %period.end,
            generated = outcome.generated,
            skipped = outcome.skipped,
            failed = outcome.failed,
            "Monthly payroll batch complete"
        );
        for record in &created {
            self.notify_created(record).await;
        }
        Ok(outcome)
    }

    /// Changes the status or the employee-approval flag. Admin only.
    pub async fn update_status(&self, actor: &Actor, id: Uuid, update: StatusUpdate) -> EngineResult<PayrollRecord> {
        actor.require_admin()?;
        if let Some(status @ (PayrollStatus::Draft | PayrollStatus::Processing)) = update.status {
            return Err(EngineError::validation(
                "status",
                format!("status '{}' cannot be set directly", status),
            ));
        }
        let now = self.clock.now();

        let mut tx = self.store.begin().await;
        let record = tx.payroll_mut(id)?;
        if let Some(accepted) = update.employee_approved {
            if record.employee_approval.accepted != accepted {
                record.employee_approval.accepted = accepted;
                record.employee_approval.acted_by = Some(actor.user_id.clone());
                record.employee_approval.acted_at = Some(now);
            }
        }
        if let Some(status) = update.status {
            record.status = status;
            match status {
                PayrollStatus::Approved => {
                    record.audit.approved_by = Some(actor.user_id.clone());
                    record.audit.approved_at = Some(now);
                }
                PayrollStatus::Rejected => {
                    record.audit.rejected_by = Some(actor.user_id.clone());
                    record.audit.rejected_at = Some(now);
                    if update.rejection_reason.is_some() {
                        record.audit.rejection_reason = update.rejection_reason.clone();
                    }
                }
                PayrollStatus::Paid => {
                    record.payment_date.get_or_insert(now);
                }
                _ => {}
            }
        }
        record.audit.updated_by = Some(actor.user_id.clone());
        record.audit.updated_at = now;
        let record = record.clone();
        tx.commit().await?;

        info!(payroll_id = %record.id, status = %record.status, actor = %actor.user_id, "Payroll status updated");
        Ok(record)
    }

    /// The owning employee accepts or rejects a pending payroll.
    ///
    /// Accepting marks it paid with a payment date in the same write.
    pub async fn employee_action(
        &self,
        actor: &Actor,
        id: Uuid,
        action: PayrollAction,
        reason: Option<String>,
        client: ClientInfo,
    ) -> EngineResult<PayrollRecord> {
        let now = self.clock.now();
        let mut tx = self.store.begin().await;
        let record = tx.payroll_mut(id)?;
        if record.employee_id != actor.user_id {
            return Err(EngineError::permission("only the payroll's employee can act on it"));
        }
        if record.status != PayrollStatus::Pending {
            return Err(EngineError::AlreadyProcessed {
                status: record.status.to_string(),
            });
        }

        match action {
            PayrollAction::Accept => {
                record.employee_approval.accepted = true;
                record.status = PayrollStatus::Paid;
                record.payment_date = Some(now);
            }
            PayrollAction::Reject => {
                record.employee_approval.accepted = false;
                record.status = PayrollStatus::Rejected;
                record.audit.rejected_by = Some(actor.user_id.clone());
                record.audit.rejected_at = Some(now);
                record.audit.rejection_reason = reason;
            }
        }
        record.employee_approval.acted_by = Some(actor.user_id.clone());
        record.employee_approval.acted_at = Some(now);
        record.employee_approval.ip_address = client.ip_address;
        record.employee_approval.user_agent = client.user_agent;
        record.audit.updated_by = Some(actor.user_id.clone());
        record.audit.updated_at = now;
        let record = record.clone();
        tx.commit().await?;

        info!(payroll_id = %record.id, action = ?action, status = %record.status, "Employee acted on payroll");
        Ok(record)
    }

    /// Removes a payroll. Admin only. Leaves and attendance are untouched.
    pub async fn delete_payroll(&self, actor: &Actor, id: Uuid) -> EngineResult<PayrollRecord> {
        actor.require_admin()?;
        let mut tx = self.store.begin().await;
        let record = tx
            .payrolls
            .remove(&id)
            .ok_or_else(|| EngineError::NotFound {
                entity: "Payroll",
                id: id.to_string(),
            })?;
        tx.commit().await?;
        info!(payroll_id = %id, actor = %actor.user_id, "Payroll deleted");
        Ok(record)
    }

    async fn filtered(&self, filter: &PayrollFilter) -> Vec<PayrollRecord> {
        let collections = self.store.read().await;
        let mut records: Vec<PayrollRecord> = collections
            .payrolls
            .values()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect();
        records.sort_by(|a, b| {
            b.period_start
                .cmp(&a.period_start)
                .then_with(|| a.employee_id.cmp(&b.employee_id))
        });
        records
    }

    /// Every payroll matching the filter, latest period first. Admin only.
    pub async fn list_payrolls(&self, actor: &Actor, filter: PayrollFilter, page: PageRequest) -> EngineResult<Page<PayrollRecord>> {
        actor.require_admin()?;
        Ok(paginate(self.filtered(&filter).await, page))
    }

    /// One payroll. Admin or owner.
    pub async fn get_payroll(&self, actor: &Actor, id: Uuid) -> EngineResult<PayrollRecord> {
        let collections = self.store.read().await;
        let record = collections
            .payrolls
            .get(&id)
            .filter(|p| !p.is_deleted)
            .ok_or_else(|| EngineError::NotFound {
                entity: "Payroll",
                id: id.to_string(),
            })?;
        actor.require_admin_or_self(&record.employee_id)?;
        Ok(record.clone())
    }

    /// An employee's payrolls, latest period first. Admin or self.
    pub async fn employee_payrolls(&self, actor: &Actor, employee_id: &str, page: PageRequest) -> EngineResult<Page<PayrollRecord>> {
        actor.require_admin_or_self(employee_id)?;
        let filter = PayrollFilter {
            employee_id: Some(employee_id.to_string()),
            ..PayrollFilter::default()
        };
        Ok(paginate(self.filtered(&filter).await, page))
    }
}
