//! Leave Workflow.
//!
//! Employees request leave; administrators approve or reject it. Approval
//! writes one `leave` attendance row per covered day and, for unpaid and
//! half-paid leave, adds a leave deduction to the payroll whose period
//! encloses the leave.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use super::notify::{Notification, Notifier, notify_best_effort};
use super::pagination::{Page, PageRequest, paginate};
use super::payroll::{PayrollAdjustment, adjust_payroll_for_leave};
use super::{Actor, Clock, EmployeeDirectory};
use crate::config::LeaveEntitlements;
use crate::error::{EngineError, EngineResult};
use crate::models::{
    AttendanceRecord, AttendanceStatus, LeavePayStatus, LeaveRequest, LeaveStatus, LeaveType,
    Period, total_leave_days,
};
use crate::store::{Collections, DocumentStore};

/// A new leave request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLeave {
    /// Kind of leave.
    pub leave_type: LeaveType,
    /// How the leave is paid (default paid).
    #[serde(default)]
    pub pay_status: Option<LeavePayStatus>,
    /// First day.
    pub start_date: NaiveDate,
    /// Last day.
    pub end_date: NaiveDate,
    /// Reason.
    #[serde(default)]
    pub reason: String,
}

/// Changes to a leave request; absent fields are kept.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveUpdate {
    /// New kind.
    #[serde(default)]
    pub leave_type: Option<LeaveType>,
    /// New pay status.
    #[serde(default)]
    pub pay_status: Option<LeavePayStatus>,
    /// New first day.
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    /// New last day.
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    /// New reason.
    #[serde(default)]
    pub reason: Option<String>,
}

/// Filters for leave lists and exports.
#[derive(Debug, Clone, Default)]
pub struct LeaveFilter {
    /// Only this status.
    pub status: Option<LeaveStatus>,
    /// Only this kind.
    pub leave_type: Option<LeaveType>,
    /// Only this employee.
    pub employee_id: Option<String>,
    /// Only this snapshot department.
    pub department: Option<String>,
    /// Leaves ending on or after this day.
    pub from: Option<NaiveDate>,
    /// Leaves starting on or before this day.
    pub to: Option<NaiveDate>,
    /// Case-insensitive text over name, employee code and reason.
    pub search: Option<String>,
}

impl LeaveFilter {
    fn matches(&self, leave: &LeaveRequest) -> bool {
        if self.status.is_some_and(|s| leave.status != s) {
            return false;
        }
        if self.leave_type.is_some_and(|t| leave.leave_type != t) {
            return false;
        }
        if self.employee_id.as_deref().is_some_and(|id| leave.employee_id != id) {
            return false;
        }
        if self
            .department
            .as_deref()
            .is_some_and(|d| !leave.employee.department.eq_ignore_ascii_case(d))
        {
            return false;
        }
        if self.from.is_some_and(|from| leave.end_date < from) {
            return false;
        }
        if self.to.is_some_and(|to| leave.start_date > to) {
            return false;
        }
        if let Some(search) = self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let needle = search.to_lowercase();
            let hit = [
                leave.employee.name.as_str(),
                leave.employee.employee_code.as_str(),
                leave.reason.as_str(),
            ]
            .iter()
            .any(|field| field.to_lowercase().contains(&needle));
            if !hit {
                return false;
            }
        }
        true
    }
}

/// The result of approving one leave.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalOutcome {
    /// The approved leave.
    pub leave: LeaveRequest,
    /// Attendance rows written.
    pub attendance_days: usize,
    /// The payroll deduction, when the leave is unpaid or half-paid and a
    /// payroll encloses it.
    pub payroll_adjustment: Option<PayrollAdjustment>,
}

/// Per-item result of a bulk operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkItemResult {
    /// The id as supplied.
    pub id: String,
    /// Whether the item succeeded.
    pub success: bool,
    /// Outcome message.
    pub message: String,
}

/// Totals of a bulk operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkSummary {
    /// Items processed.
    pub total: usize,
    /// Items that succeeded.
    pub successful: usize,
    /// Items that failed.
    pub failed: usize,
}

/// The result of a bulk operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkOutcome {
    /// One entry per id, in input order.
    pub results: Vec<BulkItemResult>,
    /// Totals.
    pub summary: BulkSummary,
}

impl BulkOutcome {
    fn from_results(results: Vec<BulkItemResult>) -> Self {
        let successful = results.iter().filter(|r| r.success).count();
        Self {
            summary: BulkSummary {
                total: results.len(),
                successful,
                failed: results.len() - successful,
            },
            results,
        }
    }
}

/// Counts by status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveStats {
    /// All requests.
    pub total: usize,
    /// Pending requests.
    pub pending: usize,
    /// Approved requests.
    pub approved: usize,
    /// Rejected requests.
    pub rejected: usize,
    /// Days covered by approved requests.
    pub approved_days: i64,
}

/// Counts for one leave type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveTypeSummary {
    /// The type.
    pub leave_type: LeaveType,
    /// All requests of this type.
    pub count: usize,
    /// Approved requests of this type.
    pub approved: usize,
    /// Days covered by approved requests of this type.
    pub total_approved_days: i64,
}

/// Remaining entitlement for one leave type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveBalance {
    /// The type.
    pub leave_type: LeaveType,
    /// Yearly entitlement.
    pub entitlement: u32,
    /// Approved days in the year.
    pub used: i64,
    /// `entitlement - used`, never below zero.
    pub remaining: i64,
}

/// A flattened leave row for exports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveExportRow {
    /// Leave id.
    pub id: Uuid,
    /// Employee id.
    pub employee_id: String,
    /// Employee name at request time.
    pub employee_name: String,
    /// Employee code at request time.
    pub employee_code: String,
    /// Department at request time.
    pub department: String,
    /// Kind of leave.
    pub leave_type: LeaveType,
    /// Pay status.
    pub pay_status: LeavePayStatus,
    /// First day.
    pub start_date: NaiveDate,
    /// Last day.
    pub end_date: NaiveDate,
    /// Days covered.
    pub total_days: i64,
    /// Lifecycle status.
    pub status: LeaveStatus,
    /// Reason.
    pub reason: String,
    /// Approver or rejecter.
    pub decided_by: Option<String>,
    /// Rejection reason.
    pub rejection_reason: Option<String>,
}

impl From<&LeaveRequest> for LeaveExportRow {
    fn from(leave: &LeaveRequest) -> Self {
        Self {
            id: leave.id,
            employee_id: leave.employee_id.clone(),
            employee_name: leave.employee.name.clone(),
            employee_code: leave.employee.employee_code.clone(),
            department: leave.employee.department.clone(),
            leave_type: leave.leave_type,
            pay_status: leave.pay_status,
            start_date: leave.start_date,
            end_date: leave.end_date,
            total_days: leave.total_days,
            status: leave.status,
            reason: leave.reason.clone(),
            decided_by: leave.approved_by.clone().or_else(|| leave.rejected_by.clone()),
            rejection_reason: leave.rejection_reason.clone(),
        }
    }
}

/// The Leave Workflow service.
#[derive(Clone)]
pub struct LeaveWorkflow {
    store: Arc<DocumentStore>,
    directory: Arc<dyn EmployeeDirectory>,
    clock: Arc<dyn Clock>,
    notifier: Arc<dyn Notifier>,
    entitlements: LeaveEntitlements,
    leave_divisor: u32,
}

impl LeaveWorkflow {
    /// Creates the service.
    pub fn new(
        store: Arc<DocumentStore>,
        directory: Arc<dyn EmployeeDirectory>,
        clock: Arc<dyn Clock>,
        notifier: Arc<dyn Notifier>,
        entitlements: LeaveEntitlements,
        leave_divisor: u32,
    ) -> Self {
        Self {
            store,
            directory,
            clock,
            notifier,
            entitlements,
            leave_divisor,
        }
    }

    fn validate_span(&self, start: NaiveDate, end: NaiveDate) -> EngineResult<()> {
        if start < self.clock.today() {
            return Err(EngineError::validation("startDate", "start date cannot be in the past"));
        }
        if end < start {
            return Err(EngineError::validation("endDate", "end date cannot be before start date"));
        }
        Ok(())
    }

    /// Creates a pending leave request for the caller.
    ///
    /// # Errors
    ///
    /// - `Validation` for a start in the past or an end before the start
    /// - `EmployeeNotFound` if the caller is not in the directory
    /// - `OverlappingLeave` if a pending or approved request overlaps
    pub async fn request_leave(&self, actor: &Actor, input: NewLeave) -> EngineResult<LeaveRequest> {
        self.validate_span(input.start_date, input.end_date)?;
        let employee = self.directory.get(&actor.user_id).await?;
        let now = self.clock.now();

        let leave = LeaveRequest {
            id: Uuid::new_v4(),
            employee_id: employee.id.clone(),
            employee: employee.snapshot(),
            leave_type: input.leave_type,
            pay_status: input.pay_status.unwrap_or_default(),
            start_date: input.start_date,
            end_date: input.end_date,
            total_days: total_leave_days(input.start_date, input.end_date),
            reason: input.reason,
            status: LeaveStatus::Pending,
            approved_by: None,
            approved_at: None,
            rejected_by: None,
            rejected_at: None,
            rejection_reason: None,
            created_at: now,
            updated_at: now,
        };

        let mut tx = self.store.begin().await;
        tx.insert_leave(leave.clone())?;
        tx.commit().await?;

        info!(
            leave_id = %leave.id,
            employee_id = %leave.employee_id,
            leave_type = %leave.leave_type,
            total_days = leave.total_days,
            "Leave requested"
        );
        Ok(leave)
    }

    /// Approves a pending leave. Admin only.
    ///
    /// # Errors
    ///
    /// `NotFound`, or `AlreadyProcessed` if the leave is not pending.
    pub async fn approve_leave(
        &self,
        actor: &Actor,
        id: Uuid,
        pay_status: Option<LeavePayStatus>,
    ) -> EngineResult<ApprovalOutcome> {
        actor.require_admin()?;
        let mut tx = self.store.begin().await;
        let outcome = self.approve_in(&mut tx, actor, id, pay_status)?;
        tx.commit().await?;
        self.log_approval(&outcome);
        self.notify_decision(&outcome.leave).await;
        Ok(outcome)
    }

    fn approve_in(
        &self,
        collections: &mut Collections,
        actor: &Actor,
        id: Uuid,
        pay_status: Option<LeavePayStatus>,
    ) -> EngineResult<ApprovalOutcome> {
        let now = self.clock.now();
        let mut leave = collections.leave(id)?.clone();
        if leave.status != LeaveStatus::Pending {
            return Err(EngineError::AlreadyProcessed {
                status: leave.status.to_string(),
            });
        }

        if let Some(pay_status) = pay_status {
            leave.pay_status = pay_status;
        }
        leave.status = LeaveStatus::Approved;
        leave.approved_by = Some(actor.user_id.clone());
        leave.approved_at = Some(now);
        leave.updated_at = now;
        collections.leaves.insert(leave.id, leave.clone());

        let attendance_days = materialize_leave_days(collections, &leave, &actor.user_id, now);
        let payroll_adjustment =
            adjust_payroll_for_leave(collections, &leave, self.leave_divisor, &actor.user_id, now);

        Ok(ApprovalOutcome {
            leave,
            attendance_days,
            payroll_adjustment,
        })
    }

    fn log_approval(&self, outcome: &ApprovalOutcome) {
        info!(
            leave_id = %outcome.leave.id,
            employee_id = %outcome.leave.employee_id,
            pay_status = %outcome.leave.pay_status,
            attendance_days = outcome.attendance_days,
            "Leave approved"
        );
        if let Some(adjustment) = &outcome.payroll_adjustment {
            if adjustment.applied {
                info!(
                    payroll_id = %adjustment.payroll_id,
                    amount = %adjustment.amount,
                    "Leave deduction applied to payroll"
                );
            } else {
                warn!(
                    payroll_id = %adjustment.payroll_id,
                    amount = %adjustment.amount,
                    note = %adjustment.note,
                    "Leave deduction not applied"
                );
            }
        }
    }

    async fn notify_decision(&self, leave: &LeaveRequest) {
        let subject = format!("Leave request {}", leave.status);
        let body = format!(
            "Your {} leave from {} to {} has been {}.",
            leave.leave_type, leave.start_date, leave.end_date, leave.status
        );
        notify_best_effort(
            self.notifier.as_ref(),
            Notification {
                recipient: leave.employee_id.clone(),
                subject,
                body,
            },
        )
        .await;
    }

    /// Rejects a pending leave. Admin only.
    ///
    /// A pending leave has written no attendance, so the rows inside its
    /// span are left as they are.
    pub async fn reject_leave(&self, actor: &Actor, id: Uuid, reason: &str) -> EngineResult<LeaveRequest> {
        actor.require_admin()?;
        if reason.trim().is_empty() {
            return Err(EngineError::validation("reason", "rejection reason is required"));
        }
        let now = self.clock.now();

        let mut tx = self.store.begin().await;
        let mut leave = tx.leave(id)?.clone();
        if leave.status != LeaveStatus::Pending {
            return Err(EngineError::AlreadyProcessed {
                status: leave.status.to_string(),
            });
        }
        leave.status = LeaveStatus::Rejected;
        leave.rejected_by = Some(actor.user_id.clone());
        leave.rejected_at = Some(now);
        leave.rejection_reason = Some(reason.trim().to_string());
        leave.updated_at = now;
        tx.leaves.insert(leave.id, leave.clone());
        tx.commit().await?;

        info!(leave_id = %leave.id, employee_id = %leave.employee_id, "Leave rejected");
        self.notify_decision(&leave).await;
        Ok(leave)
    }

    /// Edits a pending leave. The owner or an administrator.
    ///
    /// Date changes are validated again, re-checked for overlap and
    /// recompute `totalDays`.
    pub async fn update_leave(&self, actor: &Actor, id: Uuid, update: LeaveUpdate) -> EngineResult<LeaveRequest> {
        let mut tx = self.store.begin().await;
        let mut leave = tx.leave(id)?.clone();
        actor.require_admin_or_self(&leave.employee_id)?;
        if leave.status.is_terminal() {
            return Err(EngineError::AlreadyProcessed {
                status: leave.status.to_string(),
            });
        }

        let dates_changed = update.start_date.is_some() || update.end_date.is_some();
        if let Some(start) = update.start_date {
            leave.start_date = start;
        }
        if let Some(end) = update.end_date {
            leave.end_date = end;
        }
        if dates_changed {
            self.validate_span(leave.start_date, leave.end_date)?;
            leave.refresh_total_days();
        }
        if let Some(leave_type) = update.leave_type {
            leave.leave_type = leave_type;
        }
        if let Some(pay_status) = update.pay_status {
            leave.pay_status = pay_status;
        }
        if let Some(reason) = update.reason {
            leave.reason = reason;
        }
        leave.updated_at = self.clock.now();

        tx.insert_leave(leave.clone())?;
        tx.commit().await?;
        info!(leave_id = %leave.id, actor = %actor.user_id, "Leave updated");
        Ok(leave)
    }

    /// Deletes a leave. The owner while pending; an administrator always.
    ///
    /// Deleting an approved leave removes the `leave` attendance rows its
    /// approval wrote.
    pub async fn delete_leave(&self, actor: &Actor, id: Uuid) -> EngineResult<LeaveRequest> {
        let mut tx = self.store.begin().await;
        let leave = tx.leave(id)?.clone();
        if !actor.is_admin() {
            actor.require_admin_or_self(&leave.employee_id)?;
            if leave.status != LeaveStatus::Pending {
                return Err(EngineError::AlreadyProcessed {
                    status: leave.status.to_string(),
                });
            }
        }

        tx.leaves.remove(&id);
        let removed = if leave.status == LeaveStatus::Approved {
            tx.delete_leave_attendance(leave.id)
        } else {
            0
        };
        tx.commit().await?;
        info!(
            leave_id = %leave.id,
            actor = %actor.user_id,
            attendance_removed = removed,
            "Leave deleted"
        );
        Ok(leave)
    }

    /// Approves many leaves in one transaction. Admin only.
    ///
    /// Unknown ids and leaves that are no longer pending are reported per
    /// item. Any other failure rolls the whole batch back and is returned.
    pub async fn bulk_approve(
        &self,
        actor: &Actor,
        ids: &[String],
        pay_status: Option<LeavePayStatus>,
    ) -> EngineResult<BulkOutcome> {
        actor.require_admin()?;
        let mut tx = self.store.begin().await;
        let mut results = Vec::with_capacity(ids.len());
        let mut approved = Vec::new();

        for raw_id in ids {
            let attempt = parse_id(raw_id).and_then(|id| self.approve_in(&mut tx, actor, id, pay_status));
            match attempt {
                Ok(outcome) => {
                    results.push(BulkItemResult {
                        id: raw_id.clone(),
                        success: true,
                        message: "Leave approved".to_string(),
                    });
                    approved.push(outcome);
                }
                Err(err) if err.is_item_level() => results.push(BulkItemResult {
                    id: raw_id.clone(),
                    success: false,
                    message: err.to_string(),
                }),
                Err(err) => {
                    warn!(error = %err, "Bulk approval aborted, rolling back");
                    return Err(err);
                }
            }
        }

        tx.commit().await?;
        for outcome in &approved {
            self.log_approval(outcome);
            self.notify_decision(&outcome.leave).await;
        }
        Ok(BulkOutcome::from_results(results))
    }

    /// Rejects many leaves with one reason. Admin only.
    pub async fn bulk_reject(&self, actor: &Actor, ids: &[String], reason: &str) -> EngineResult<BulkOutcome> {
        actor.require_admin()?;
        if reason.trim().is_empty() {
            return Err(EngineError::validation("reason", "rejection reason is required"));
        }
        let mut results = Vec::with_capacity(ids.len());
        for raw_id in ids {
            let result = match parse_id(raw_id) {
                Ok(id) => self.reject_leave(actor, id, reason).await.map(|_| ()),
                Err(err) => Err(err),
            };
            results.push(item_result(raw_id, result, "Leave rejected"));
        }
        Ok(BulkOutcome::from_results(results))
    }

    /// Deletes many leaves. Admin only.
    pub async fn bulk_delete(&self, actor: &Actor, ids: &[String]) -> EngineResult<BulkOutcome> {
        actor.require_admin()?;
        let mut results = Vec::with_capacity(ids.len());
        for raw_id in ids {
            let result = match parse_id(raw_id) {
                Ok(id) => self.delete_leave(actor, id).await.map(|_| ()),
                Err(err) => Err(err),
            };
            results.push(item_result(raw_id, result, "Leave deleted"));
        }
        Ok(BulkOutcome::from_results(results))
    }

    // --- reads ---

    async fn filtered(&self, filter: &LeaveFilter) -> Vec<LeaveRequest> {
        let collections = self.store.read().await;
        let mut leaves: Vec<LeaveRequest> = collections
            .leaves
            .values()
            .filter(|l| filter.matches(l))
            .cloned()
            .collect();
        leaves.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.start_date.cmp(&a.start_date)));
        leaves
    }

    /// Scopes a filter to the caller: employees only ever see their own.
    fn scoped(actor: &Actor, mut filter: LeaveFilter) -> LeaveFilter {
        if !actor.is_admin() {
            filter.employee_id = Some(actor.user_id.clone());
        }
        filter
    }

    /// The caller's own leaves, newest first.
    pub async fn my_leaves(&self, actor: &Actor, status: Option<LeaveStatus>, page: PageRequest) -> Page<LeaveRequest> {
        let filter = LeaveFilter {
            status,
            employee_id: Some(actor.user_id.clone()),
            ..LeaveFilter::default()
        };
        paginate(self.filtered(&filter).await, page)
    }

    /// Every leave matching the filter, newest first. Admin only.
    pub async fn list_leaves(&self, actor: &Actor, filter: LeaveFilter, page: PageRequest) -> EngineResult<Page<LeaveRequest>> {
        actor.require_admin()?;
        Ok(paginate(self.filtered(&filter).await, page))
    }

    /// Counts by status. Employees see their own.
    pub async fn stats(&self, actor: &Actor, filter: LeaveFilter) -> LeaveStats {
        let leaves = self.filtered(&Self::scoped(actor, filter)).await;
        let mut stats = LeaveStats {
            total: leaves.len(),
            ..LeaveStats::default()
        };
        for leave in &leaves {
            match leave.status {
                LeaveStatus::Pending => stats.pending += 1,
                LeaveStatus::Approved => {
                    stats.approved += 1;
                    stats.approved_days += leave.total_days;
                }
                LeaveStatus::Rejected => stats.rejected += 1,
            }
        }
        stats
    }

    /// Per-type counts, one entry per leave type. Employees see their own.
    pub async fn type_summary(&self, actor: &Actor, filter: LeaveFilter) -> Vec<LeaveTypeSummary> {
        let leaves = self.filtered(&Self::scoped(actor, filter)).await;
        LeaveType::ALL
            .iter()
            .map(|&leave_type| {
                let of_type = leaves.iter().filter(|l| l.leave_type == leave_type);
                let approved: Vec<&LeaveRequest> = of_type
                    .clone()
                    .filter(|l| l.status == LeaveStatus::Approved)
                    .collect();
                LeaveTypeSummary {
                    leave_type,
                    count: of_type.count(),
                    approved: approved.len(),
                    total_approved_days: approved.iter().map(|l| l.total_days).sum(),
                }
            })
            .collect()
    }

    /// Remaining entitlement per type for the current year.
    ///
    /// Employees always get their own balance; administrators may name an
    /// employee and default to themselves.
    pub async fn balance(&self, actor: &Actor, employee_id: Option<&str>) -> EngineResult<Vec<LeaveBalance>> {
        let employee_id = match employee_id {
            Some(id) if actor.is_admin() => id.to_string(),
            Some(id) => {
                actor.require_admin_or_self(id)?;
                id.to_string()
            }
            None => actor.user_id.clone(),
        };

        let year = self.clock.today().year();
        let year_span = match (
            NaiveDate::from_ymd_opt(year, 1, 1),
            NaiveDate::from_ymd_opt(year, 12, 31),
        ) {
            (Some(start), Some(end)) => Period::new(start, end),
            _ => return Err(EngineError::validation("year", "year out of range")),
        };

        let collections = self.store.read().await;
        let approved: Vec<&LeaveRequest> = collections
            .leaves
            .values()
            .filter(|l| l.employee_id == employee_id && l.status == LeaveStatus::Approved)
            .collect();

        Ok(LeaveType::ALL
            .iter()
            .map(|&leave_type| {
                let entitlement = self.entitlements.days(leave_type);
                let used: i64 = approved
                    .iter()
                    .filter(|l| l.leave_type == leave_type)
                    .filter_map(|l| l.period().clip_to(&year_span))
                    .map(|span| span.days())
                    .sum();
                LeaveBalance {
                    leave_type,
                    entitlement,
                    used,
                    remaining: (i64::from(entitlement) - used).max(0),
                }
            })
            .collect())
    }

    /// Distinct snapshot departments, sorted. Admin only.
    pub async fn departments(&self, actor: &Actor) -> EngineResult<Vec<String>> {
        actor.require_admin()?;
        let collections = self.store.read().await;
        let departments: BTreeSet<String> = collections
            .leaves
            .values()
            .map(|l| l.employee.department.trim().to_string())
            .filter(|d| !d.is_empty())
            .collect();
        Ok(departments.into_iter().collect())
    }

    /// Flattened rows of every leave matching the filter. Admin only.
    pub async fn export(&self, actor: &Actor, filter: LeaveFilter) -> EngineResult<Vec<LeaveExportRow>> {
        actor.require_admin()?;
        Ok(self
            .filtered(&filter)
            .await
            .iter()
            .map(LeaveExportRow::from)
            .collect())
    }
}

fn parse_id(raw: &str) -> EngineResult<Uuid> {
    Uuid::parse_str(raw.trim()).map_err(|_| EngineError::validation("ids", format!("invalid id '{}'", raw)))
}

fn item_result(raw_id: &str, result: EngineResult<()>, success_message: &str) -> BulkItemResult {
    match result {
        Ok(()) => BulkItemResult {
            id: raw_id.to_string(),
            success: true,
            message: success_message.to_string(),
        },
        Err(err) => BulkItemResult {
            id: raw_id.to_string(),
            success: false,
            message: err.to_string(),
        },
    }
}

/// Writes one `leave` attendance row per day of an approved leave.
///
/// Existing rows keep their identity and clock times; status, leave link,
/// remarks and `updatedBy` are overwritten. Returns the number of days
/// written.
fn materialize_leave_days(
    collections: &mut Collections,
    leave: &LeaveRequest,
    approver: &str,
    now: chrono::DateTime<chrono::Utc>,
) -> usize {
    let remarks = format!("Leave approved: {} ({})", leave.leave_type, leave.pay_status);
    let period = leave.period();
    let existing: HashMap<NaiveDate, Uuid> = collections
        .attendance
        .values()
        .filter(|r| !r.is_deleted && r.employee_id == leave.employee_id && period.contains_date(r.date))
        .map(|r| (r.date, r.id))
        .collect();
    let mut written = 0;
    for day in period.iter_days() {
        let row = existing
            .get(&day)
            .and_then(|id| collections.attendance.get_mut(id));
        match row {
            Some(row) => {
                row.status = AttendanceStatus::Leave;
                row.leave_id = Some(leave.id);
                row.leave_pay_status = Some(leave.pay_status);
                row.remarks = remarks.clone();
                row.updated_by = Some(approver.to_string());
                row.updated_at = now;
            }
            None => {
                let mut row = AttendanceRecord::new(
                    leave.employee_id.clone(),
                    day,
                    AttendanceStatus::Leave,
                    approver,
                    now,
                );
                row.leave_id = Some(leave.id);
                row.leave_pay_status = Some(leave.pay_status);
                row.remarks = remarks.clone();
                row.updated_by = Some(approver.to_string());
                collections.attendance.insert(row.id, row);
            }
        }
        written += 1;
    }
    written
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Employee, EmploymentType, PayrollStatus, Role};
    use crate::services::{FixedClock, InMemoryDirectory, RecordingNotifier};
    use crate::services::payroll::tests::blank_payroll;
    use rust_decimal::Decimal;

    struct Fixture {
        workflow: LeaveWorkflow,
        store: Arc<DocumentStore>,
        notifier: RecordingNotifier,
    }

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, m, d).unwrap()
    }

    fn employee(id: &str, department: &str) -> Employee {
        Employee {
            id: id.to_string(),
            name: format!("Name {}", id),
            employee_code: format!("CODE-{}", id),
            department: department.to_string(),
            designation: String::new(),
            role: Role::Employee,
            employment_type: EmploymentType::Permanent,
            annual_salary: Decimal::from(360000),
            is_active: true,
        }
    }

    fn fixture() -> Fixture {
        let store = Arc::new(DocumentStore::new());
        let notifier = RecordingNotifier::new();
        let directory = InMemoryDirectory::new(vec![
            employee("emp_001", "Finance"),
            employee("emp_002", "Engineering"),
        ]);
        let workflow = LeaveWorkflow::new(
            Arc::clone(&store),
            Arc::new(directory),
            Arc::new(FixedClock::on(date(3, 1))),
            Arc::new(notifier.clone()),
            LeaveEntitlements::default(),
            30,
        );
        Fixture {
            workflow,
            store,
            notifier,
        }
    }

    fn admin() -> Actor {
        Actor::new("admin_001", Role::Admin)
    }

    fn emp(id: &str) -> Actor {
        Actor::new(id, Role::Employee)
    }

    fn new_leave(start: NaiveDate, end: NaiveDate, pay_status: LeavePayStatus) -> NewLeave {
        NewLeave {
            leave_type: LeaveType::Casual,
            pay_status: Some(pay_status),
            start_date: start,
            end_date: end,
            reason: "Family event".to_string(),
        }
    }

    #[tokio::test]
    async fn test_request_computes_inclusive_days_and_snapshot() {
        let f = fixture();
        let leave = f
            .workflow
            .request_leave(&emp("emp_001"), new_leave(date(3, 10), date(3, 12), LeavePayStatus::Paid))
            .await
            .unwrap();
        assert_eq!(leave.total_days, 3);
        assert_eq!(leave.status, LeaveStatus::Pending);
        assert_eq!(leave.employee.department, "Finance");
    }

    #[tokio::test]
    async fn test_request_validation() {
        let f = fixture();
        let past = f
            .workflow
            .request_leave(&emp("emp_001"), new_leave(date(2, 27), date(3, 2), LeavePayStatus::Paid))
            .await;
        assert!(matches!(past, Err(EngineError::Validation { .. })));

        let inverted = f
            .workflow
            .request_leave(&emp("emp_001"), new_leave(date(3, 12), date(3, 10), LeavePayStatus::Paid))
            .await;
        assert!(matches!(inverted, Err(EngineError::Validation { .. })));

        let unknown = f
            .workflow
            .request_leave(&emp("emp_404"), new_leave(date(3, 10), date(3, 10), LeavePayStatus::Paid))
            .await;
        assert!(matches!(unknown, Err(EngineError::EmployeeNotFound { .. })));
    }

    #[tokio::test]
    async fn test_same_day_leave_starting_today_is_allowed() {
        let f = fixture();
        let leave = f
            .workflow
            .request_leave(&emp("emp_001"), new_leave(date(3, 1), date(3, 1), LeavePayStatus::Paid))
            .await
            .unwrap();
        assert_eq!(leave.total_days, 1);
    }

    #[tokio::test]
    async fn test_overlapping_request_is_a_conflict() {
        let f = fixture();
        f.workflow
            .request_leave(&emp("emp_001"), new_leave(date(3, 10), date(3, 12), LeavePayStatus::Paid))
            .await
            .unwrap();
        let overlap = f
            .workflow
            .request_leave(&emp("emp_001"), new_leave(date(3, 12), date(3, 15), LeavePayStatus::Paid))
            .await;
        assert!(matches!(overlap, Err(EngineError::OverlappingLeave { .. })));
    }

    #[tokio::test]
    async fn test_concurrent_overlapping_requests_have_one_winner() {
        let f = fixture();
        let mut handles = Vec::new();
        for _ in 0..6 {
            let workflow = f.workflow.clone();
            handles.push(tokio::spawn(async move {
                workflow
                    .request_leave(&emp("emp_001"), new_leave(date(3, 10), date(3, 12), LeavePayStatus::Paid))
                    .await
                    .is_ok()
            }));
        }
        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
        assert_eq!(f.store.read().await.leaves.len(), 1);
    }

    #[tokio::test]
    async fn test_approval_materializes_attendance() {
        let f = fixture();
        let leave = f
            .workflow
            .request_leave(&emp("emp_001"), new_leave(date(3, 10), date(3, 12), LeavePayStatus::Paid))
            .await
            .unwrap();
        {
            // An existing present row is overwritten in place.
            let mut tx = f.store.begin().await;
            tx.insert_attendance(AttendanceRecord::new(
                "emp_001",
                date(3, 11),
                AttendanceStatus::Present,
                "device",
                chrono::Utc::now(),
            ))
            .unwrap();
            tx.commit().await.unwrap();
        }

        let outcome = f.workflow.approve_leave(&admin(), leave.id, None).await.unwrap();
        assert_eq!(outcome.attendance_days, 3);
        assert_eq!(outcome.leave.approved_by.as_deref(), Some("admin_001"));

        let collections = f.store.read().await;
        let rows = collections.attendance_in("emp_001", &leave.period());
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|r| r.status == AttendanceStatus::Leave));
        assert!(rows.iter().all(|r| r.leave_id == Some(leave.id)));
        assert_eq!(rows[1].created_by, "device");
        assert_eq!(rows[1].remarks, "Leave approved: casual (paid)");
        assert_eq!(f.notifier.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_second_approval_is_already_processed() {
        let f = fixture();
        let leave = f
            .workflow
            .request_leave(&emp("emp_001"), new_leave(date(3, 10), date(3, 10), LeavePayStatus::Paid))
            .await
            .unwrap();
        f.workflow.approve_leave(&admin(), leave.id, None).await.unwrap();
        let again = f.workflow.approve_leave(&admin(), leave.id, None).await;
        match again {
            Err(EngineError::AlreadyProcessed { status }) => assert_eq!(status, "approved"),
            other => panic!("Expected AlreadyProcessed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unpaid_approval_deducts_from_enclosing_payroll() {
        let f = fixture();
        {
            let mut tx = f.store.begin().await;
            let mut payroll = blank_payroll("emp_001", date(3, 1), date(3, 31), Decimal::from(30000));
            payroll.recompute_summary();
            tx.insert_payroll(payroll).unwrap();
            tx.commit().await.unwrap();
        }
        let leave = f
            .workflow
            .request_leave(&emp("emp_001"), new_leave(date(3, 10), date(3, 11), LeavePayStatus::Unpaid))
            .await
            .unwrap();
        let outcome = f.workflow.approve_leave(&admin(), leave.id, None).await.unwrap();
        let adjustment = outcome.payroll_adjustment.unwrap();
        assert!(adjustment.applied);
        assert_eq!(adjustment.amount, Decimal::from(2000));

        let collections = f.store.read().await;
        let payroll = collections.payrolls.values().next().unwrap();
        assert_eq!(payroll.deductions.leave, Decimal::from(2000));
        assert_eq!(payroll.summary.net_payable, Decimal::from(28000));
    }

    #[tokio::test]
    async fn test_half_paid_approval_deducts_half() {
        let f = fixture();
        {
            let mut tx = f.store.begin().await;
            tx.insert_payroll(blank_payroll("emp_001", date(3, 1), date(3, 31), Decimal::from(30000)))
                .unwrap();
            tx.commit().await.unwrap();
        }
        let leave = f
            .workflow
            .request_leave(&emp("emp_001"), new_leave(date(3, 10), date(3, 11), LeavePayStatus::Paid))
            .await
            .unwrap();
        let outcome = f
            .workflow
            .approve_leave(&admin(), leave.id, Some(LeavePayStatus::HalfPaid))
            .await
            .unwrap();
        assert_eq!(outcome.leave.pay_status, LeavePayStatus::HalfPaid);
        assert_eq!(outcome.payroll_adjustment.unwrap().amount, Decimal::from(1000));
    }

    #[tokio::test]
    async fn test_finalized_payroll_is_not_mutated() {
        let f = fixture();
        {
            let mut tx = f.store.begin().await;
            let mut payroll = blank_payroll("emp_001", date(3, 1), date(3, 31), Decimal::from(30000));
            payroll.status = PayrollStatus::Paid;
            tx.insert_payroll(payroll).unwrap();
            tx.commit().await.unwrap();
        }
        let leave = f
            .workflow
            .request_leave(&emp("emp_001"), new_leave(date(3, 10), date(3, 11), LeavePayStatus::Unpaid))
            .await
            .unwrap();
        let outcome = f.workflow.approve_leave(&admin(), leave.id, None).await.unwrap();
        let adjustment = outcome.payroll_adjustment.unwrap();
        assert!(!adjustment.applied);

        let collections = f.store.read().await;
        let payroll = collections.payrolls.values().next().unwrap();
        assert_eq!(payroll.deductions.leave, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_reject_requires_pending_and_reason() {
        let f = fixture();
        let leave = f
            .workflow
            .request_leave(&emp("emp_001"), new_leave(date(3, 10), date(3, 10), LeavePayStatus::Paid))
            .await
            .unwrap();
        assert!(matches!(
            f.workflow.reject_leave(&admin(), leave.id, "  ").await,
            Err(EngineError::Validation { .. })
        ));
        let rejected = f.workflow.reject_leave(&admin(), leave.id, "Busy season").await.unwrap();
        assert_eq!(rejected.rejection_reason.as_deref(), Some("Busy season"));
        assert!(matches!(
            f.workflow.approve_leave(&admin(), leave.id, None).await,
            Err(EngineError::AlreadyProcessed { .. })
        ));
    }

    #[tokio::test]
    async fn test_rejected_leave_frees_the_span() {
        let f = fixture();
        let leave = f
            .workflow
            .request_leave(&emp("emp_001"), new_leave(date(3, 10), date(3, 12), LeavePayStatus::Paid))
            .await
            .unwrap();
        f.workflow.reject_leave(&admin(), leave.id, "No cover").await.unwrap();
        f.workflow
            .request_leave(&emp("emp_001"), new_leave(date(3, 10), date(3, 12), LeavePayStatus::Paid))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_rejecting_pending_leave_keeps_recorded_attendance() {
        let f = fixture();
        {
            // Recorded through the attendance ledger, not by any approval.
            let mut tx = f.store.begin().await;
            tx.insert_attendance(AttendanceRecord::new(
                "emp_001",
                date(3, 11),
                AttendanceStatus::Leave,
                "admin_001",
                chrono::Utc::now(),
            ))
            .unwrap();
            tx.commit().await.unwrap();
        }
        let leave = f
            .workflow
            .request_leave(&emp("emp_001"), new_leave(date(3, 10), date(3, 12), LeavePayStatus::Paid))
            .await
            .unwrap();
        let before = f.store.read().await.attendance_in("emp_001", &leave.period());

        f.workflow.reject_leave(&admin(), leave.id, "No cover").await.unwrap();

        let after = f.store.read().await.attendance_in("emp_001", &leave.period());
        assert_eq!(after, before);
        assert_eq!(after.len(), 1);
        assert_eq!(after[0].status, AttendanceStatus::Leave);
    }

    #[tokio::test]
    async fn test_update_rechecks_overlap_and_days() {
        let f = fixture();
        let first = f
            .workflow
            .request_leave(&emp("emp_001"), new_leave(date(3, 10), date(3, 12), LeavePayStatus::Paid))
            .await
            .unwrap();
        let second = f
            .workflow
            .request_leave(&emp("emp_001"), new_leave(date(3, 20), date(3, 21), LeavePayStatus::Paid))
            .await
            .unwrap();

        let extended = f
            .workflow
            .update_leave(
                &emp("emp_001"),
                first.id,
                LeaveUpdate {
                    end_date: Some(date(3, 14)),
                    ..LeaveUpdate::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(extended.total_days, 5);

        let clash = f
            .workflow
            .update_leave(
                &emp("emp_001"),
                second.id,
                LeaveUpdate {
                    start_date: Some(date(3, 14)),
                    ..LeaveUpdate::default()
                },
            )
            .await;
        assert!(matches!(clash, Err(EngineError::OverlappingLeave { .. })));

        let stranger = f
            .workflow
            .update_leave(&emp("emp_002"), first.id, LeaveUpdate::default())
            .await;
        assert!(matches!(stranger, Err(EngineError::Permission { .. })));
    }

    #[tokio::test]
    async fn test_delete_approved_leave_removes_only_its_rows() {
        let f = fixture();
        let leave = f
            .workflow
            .request_leave(&emp("emp_001"), new_leave(date(3, 10), date(3, 11), LeavePayStatus::Paid))
            .await
            .unwrap();
        let other = f
            .workflow
            .request_leave(&emp("emp_002"), new_leave(date(3, 10), date(3, 11), LeavePayStatus::Paid))
            .await
            .unwrap();
        f.workflow.approve_leave(&admin(), leave.id, None).await.unwrap();
        f.workflow.approve_leave(&admin(), other.id, None).await.unwrap();

        let owner_attempt = f.workflow.delete_leave(&emp("emp_001"), leave.id).await;
        assert!(matches!(owner_attempt, Err(EngineError::AlreadyProcessed { .. })));

        f.workflow.delete_leave(&admin(), leave.id).await.unwrap();
        let collections = f.store.read().await;
        assert!(collections.attendance_in("emp_001", &leave.period()).is_empty());
        assert_eq!(collections.attendance_in("emp_002", &other.period()).len(), 2);
    }

    #[tokio::test]
    async fn test_bulk_approve_reports_items() {
        let f = fixture();
        let a = f
            .workflow
            .request_leave(&emp("emp_001"), new_leave(date(3, 10), date(3, 10), LeavePayStatus::Paid))
            .await
            .unwrap();
        let b = f
            .workflow
            .request_leave(&emp("emp_002"), new_leave(date(3, 10), date(3, 10), LeavePayStatus::Paid))
            .await
            .unwrap();
        f.workflow.reject_leave(&admin(), b.id, "No").await.unwrap();

        let ids = vec![a.id.to_string(), b.id.to_string(), Uuid::new_v4().to_string(), "garbage".to_string()];
        let outcome = f.workflow.bulk_approve(&admin(), &ids, None).await.unwrap();
        assert_eq!(outcome.summary.total, 4);
        assert_eq!(outcome.summary.successful, 1);
        assert_eq!(outcome.summary.failed, 3);
        assert!(outcome.results[1].message.contains("already processed"));
    }

    #[tokio::test]
    async fn test_bulk_reject_and_delete() {
        let f = fixture();
        let a = f
            .workflow
            .request_leave(&emp("emp_001"), new_leave(date(3, 10), date(3, 10), LeavePayStatus::Paid))
            .await
            .unwrap();
        let b = f
            .workflow
            .request_leave(&emp("emp_002"), new_leave(date(3, 10), date(3, 10), LeavePayStatus::Paid))
            .await
            .unwrap();
        let rejected = f
            .workflow
            .bulk_reject(&admin(), &[a.id.to_string()], "Freeze")
            .await
            .unwrap();
        assert_eq!(rejected.summary.successful, 1);

        let deleted = f
            .workflow
            .bulk_delete(&admin(), &[a.id.to_string(), b.id.to_string()])
            .await
            .unwrap();
        assert_eq!(deleted.summary.successful, 2);
        assert!(f.store.read().await.leaves.is_empty());
    }

    #[tokio::test]
    async fn test_reads_filter_and_summarize() {
        let f = fixture();
        let a = f
            .workflow
            .request_leave(&emp("emp_001"), new_leave(date(3, 10), date(3, 12), LeavePayStatus::Paid))
            .await
            .unwrap();
        f.workflow
            .request_leave(
                &emp("emp_002"),
                NewLeave {
                    leave_type: LeaveType::Sick,
                    pay_status: None,
                    start_date: date(3, 20),
                    end_date: date(3, 20),
                    reason: "Flu".to_string(),
                },
            )
            .await
            .unwrap();
        f.workflow.approve_leave(&admin(), a.id, None).await.unwrap();

        let mine = f.workflow.my_leaves(&emp("emp_001"), None, PageRequest::default()).await;
        assert_eq!(mine.total, 1);

        let search = LeaveFilter {
            search: Some("flu".to_string()),
            ..LeaveFilter::default()
        };
        let found = f.workflow.list_leaves(&admin(), search, PageRequest::default()).await.unwrap();
        assert_eq!(found.total, 1);
        assert_eq!(found.items[0].employee_id, "emp_002");

        let by_department = LeaveFilter {
            department: Some("finance".to_string()),
            ..LeaveFilter::default()
        };
        assert_eq!(
            f.workflow.list_leaves(&admin(), by_department, PageRequest::default()).await.unwrap().total,
            1
        );

        let stats = f.workflow.stats(&admin(), LeaveFilter::default()).await;
        assert_eq!(stats.total, 2);
        assert_eq!(stats.approved, 1);
        assert_eq!(stats.pending, 1);
        assert_eq!(stats.approved_days, 3);

        let own_stats = f.workflow.stats(&emp("emp_002"), LeaveFilter::default()).await;
        assert_eq!(own_stats.total, 1);

        let summary = f.workflow.type_summary(&admin(), LeaveFilter::default()).await;
        assert_eq!(summary.len(), LeaveType::ALL.len());
        let casual = summary.iter().find(|s| s.leave_type == LeaveType::Casual).unwrap();
        assert_eq!(casual.total_approved_days, 3);

        let balance = f.workflow.balance(&emp("emp_001"), None).await.unwrap();
        let casual_balance = balance.iter().find(|b| b.leave_type == LeaveType::Casual).unwrap();
        assert_eq!(casual_balance.entitlement, 10);
        assert_eq!(casual_balance.used, 3);
        assert_eq!(casual_balance.remaining, 7);

        assert_eq!(
            f.workflow.departments(&admin()).await.unwrap(),
            vec!["Engineering".to_string(), "Finance".to_string()]
        );
        let rows = f.workflow.export(&admin(), LeaveFilter::default()).await.unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[tokio::test]
    async fn test_employee_cannot_read_other_balance_or_list() {
        let f = fixture();
        assert!(matches!(
            f.workflow.balance(&emp("emp_001"), Some("emp_002")).await,
            Err(EngineError::Permission { .. })
        ));
        assert!(matches!(
            f.workflow.list_leaves(&emp("emp_001"), LeaveFilter::default(), PageRequest::default()).await,
            Err(EngineError::Permission { .. })
        ));
    }
}
