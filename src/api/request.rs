//! Request bodies and query strings for the HTTP API.
//!
//! Bodies that map one-to-one onto a service input (`NewLeave`,
//! `NewPayroll`, `NewSalaryRule`, ...) are deserialized straight into the
//! service type; this module holds the rest.

use chrono::NaiveDate;
use serde::Deserialize;

use crate::models::{LeavePayStatus, LeaveStatus, LeaveType, PayrollStatus, Period, RuleType};
use crate::services::{LeaveFilter, PageRequest, PayrollAction, PayrollFilter, SalaryRuleFilter};

/// `page` / `limit` query parameters.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageQuery {
    /// 1-based page.
    #[serde(default)]
    pub page: Option<u32>,
    /// Page size.
    #[serde(default)]
    pub limit: Option<u32>,
}

impl PageQuery {
    /// The clamped page request.
    pub fn request(self) -> PageRequest {
        PageRequest::new(self.page, self.limit)
    }
}

/// Query string of `GET /leaves/mine`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MyLeavesQuery {
    /// Only this status.
    #[serde(default)]
    pub status: Option<LeaveStatus>,
    /// 1-based page.
    #[serde(default)]
    pub page: Option<u32>,
    /// Page size.
    #[serde(default)]
    pub limit: Option<u32>,
}

impl MyLeavesQuery {
    /// The clamped page request.
    pub fn page_request(&self) -> PageRequest {
        PageRequest::new(self.page, self.limit)
    }
}

/// Query string of the leave list, stats, summary and export endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveQuery {
    /// Only this status.
    #[serde(default)]
    pub status: Option<LeaveStatus>,
    /// Only this kind.
    #[serde(default)]
    pub leave_type: Option<LeaveType>,
    /// Only this employee.
    #[serde(default)]
    pub employee_id: Option<String>,
    /// Only this department.
    #[serde(default)]
    pub department: Option<String>,
    /// Range start.
    #[serde(default)]
    pub from: Option<NaiveDate>,
    /// Range end.
    #[serde(default)]
    pub to: Option<NaiveDate>,
    /// Free text.
    #[serde(default)]
    pub search: Option<String>,
    /// 1-based page.
    #[serde(default)]
    pub page: Option<u32>,
    /// Page size.
    #[serde(default)]
    pub limit: Option<u32>,
}

impl LeaveQuery {
    /// Splits the query into a filter and a page request.
    pub fn into_parts(self) -> (LeaveFilter, PageRequest) {
        let page = PageRequest::new(self.page, self.limit);
        let filter = LeaveFilter {
            status: self.status,
            leave_type: self.leave_type,
            employee_id: self.employee_id,
            department: self.department,
            from: self.from,
            to: self.to,
            search: self.search,
        };
        (filter, page)
    }
}

/// Query string of `GET /leaves/balance`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceQuery {
    /// Employee to report on; defaults to the caller.
    #[serde(default)]
    pub employee_id: Option<String>,
}

/// Optional body of `PATCH /leaves/:id/approve`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApproveBody {
    /// Overrides the requested pay status.
    #[serde(default)]
    pub pay_status: Option<LeavePayStatus>,
}

/// Body of `PATCH /leaves/:id/reject`.
#[derive(Debug, Clone, Deserialize)]
pub struct RejectBody {
    /// Why the leave was rejected.
    #[serde(default)]
    pub reason: String,
}

/// Body of the bulk leave endpoints.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkBody {
    /// Leave ids.
    pub ids: Vec<String>,
    /// Pay status applied by bulk approval.
    #[serde(default)]
    pub pay_status: Option<LeavePayStatus>,
    /// Reason used by bulk rejection.
    #[serde(default)]
    pub reason: Option<String>,
}

/// Query string of `GET /payroll`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayrollQuery {
    /// Only this status.
    #[serde(default)]
    pub status: Option<PayrollStatus>,
    /// Only this employee.
    #[serde(default)]
    pub employee_id: Option<String>,
    /// Range start.
    #[serde(default)]
    pub from: Option<NaiveDate>,
    /// Range end.
    #[serde(default)]
    pub to: Option<NaiveDate>,
    /// 1-based page.
    #[serde(default)]
    pub page: Option<u32>,
    /// Page size.
    #[serde(default)]
    pub limit: Option<u32>,
}

impl PayrollQuery {
    /// Splits the query into a filter and a page request.
    pub fn into_parts(self) -> (PayrollFilter, PageRequest) {
        let page = PageRequest::new(self.page, self.limit);
        let filter = PayrollFilter {
            status: self.status,
            employee_id: self.employee_id,
            from: self.from,
            to: self.to,
        };
        (filter, page)
    }
}

/// Body of `POST /payroll/preview`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewBody {
    /// The employee.
    pub employee_id: String,
    /// First day.
    pub period_start: NaiveDate,
    /// Last day.
    pub period_end: NaiveDate,
}

impl PreviewBody {
    /// The requested period.
    pub fn period(&self) -> Period {
        Period::new(self.period_start, self.period_end)
    }
}

/// Optional body of `POST /payroll/generate-monthly`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateBody {
    /// Run as if today were this day.
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

/// Body of `PATCH /payroll/:id/action`.
#[derive(Debug, Clone, Deserialize)]
pub struct ActionBody {
    /// Accept or reject.
    pub action: PayrollAction,
    /// Reason for a rejection.
    #[serde(default)]
    pub reason: Option<String>,
}

/// Query string of `GET /salary-rules`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleQuery {
    /// Only this rule type.
    #[serde(default)]
    pub rule_type: Option<RuleType>,
    /// Only active or inactive rules.
    #[serde(default)]
    pub is_active: Option<bool>,
}

impl From<RuleQuery> for SalaryRuleFilter {
    fn from(query: RuleQuery) -> Self {
        SalaryRuleFilter {
            rule_type: query.rule_type,
            is_active: query.is_active,
        }
    }
}

/// Query string of `GET /salary-rules/sets/current`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DateQuery {
    /// The day; defaults to today.
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

/// Query string of `GET /attendance/employee/:employeeId`.
#[derive(Debug, Clone, Deserialize)]
pub struct RangeQuery {
    /// First day.
    pub from: NaiveDate,
    /// Last day.
    pub to: NaiveDate,
}

impl RangeQuery {
    /// The requested period.
    pub fn period(&self) -> Period {
        Period::new(self.from, self.to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leave_query_clamps_page() {
        let query = LeaveQuery {
            limit: Some(500),
            search: Some("flu".to_string()),
            ..LeaveQuery::default()
        };
        let (filter, page) = query.into_parts();
        assert_eq!(page.limit, 100);
        assert_eq!(page.page, 1);
        assert_eq!(filter.search.as_deref(), Some("flu"));
    }

    #[test]
    fn test_action_body_parses_snake_case() {
        let body: ActionBody = serde_json::from_str(r#"{"action":"accept"}"#).unwrap();
        assert_eq!(body.action, PayrollAction::Accept);
        assert!(body.reason.is_none());
    }

    #[test]
    fn test_bulk_body_optional_fields() {
        let body: BulkBody =
            serde_json::from_str(r#"{"ids":["a","b"],"payStatus":"half_paid"}"#).unwrap();
        assert_eq!(body.ids.len(), 2);
        assert_eq!(body.pay_status, Some(LeavePayStatus::HalfPaid));
        assert!(body.reason.is_none());
    }
}
