//! Stateful workflows over the document store.
//!
//! Each service owns an `Arc` of the shared [`DocumentStore`](crate::store::DocumentStore)
//! and performs its mutations inside one store transaction, so every unique
//! index check and the write that follows it are a single atomic step.

mod actor;
mod attendance;
mod clock;
mod directory;
mod leave;
mod notify;
mod pagination;
mod payroll;
mod rules;

pub use actor::Actor;
pub use attendance::{AttendanceEntry, AttendanceLedger};
pub use clock::{Clock, FixedClock, SystemClock};
pub use directory::{EmployeeDirectory, InMemoryDirectory};
pub use leave::{
    ApprovalOutcome, BulkItemResult, BulkOutcome, BulkSummary, LeaveBalance, LeaveExportRow,
    LeaveFilter, LeaveStats, LeaveTypeSummary, LeaveUpdate, LeaveWorkflow, NewLeave,
};
pub use notify::{LogNotifier, Notification, Notifier, RecordingNotifier, notify_best_effort};
pub use pagination::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, Page, PageRequest, paginate};
pub use payroll::{
    BatchError, BatchOutcome, ClientInfo, DayRateInput, ManualEntries, NewPayroll,
    PayrollAction, PayrollAdjustment, PayrollFilter, PayrollManager, StatusUpdate,
};
pub use rules::{
    DEFAULT_HALF_DAY_RULE_CODE, DEFAULT_LATE_RULE_CODE, NewSalaryRule, RuleStore,
    SalaryRuleFilter, SalaryRuleUpdate, active_salary_rules, default_salary_rules,
    generate_rule_code, select_active_rule_set,
};
