//! Error types for the payroll engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for every failure the calculator, the workflows and the store can report.

use chrono::NaiveDate;
use thiserror::Error;

/// The main error type for the payroll engine.
///
/// All operations in the engine return this error type, making it easy
/// to handle errors consistently throughout the application.
///
/// # Example
///
/// ```
/// use payroll_engine::error::EngineError;
///
/// let error = EngineError::ConfigNotFound {
///     path: "/missing/app.yaml".to_string(),
/// };
/// assert_eq!(error.to_string(), "Configuration file not found: /missing/app.yaml");
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// A required field was missing or malformed.
    #[error("Invalid field '{field}': {message}")]
    Validation {
        /// The offending field.
        field: String,
        /// What was wrong with it.
        message: String,
    },

    /// An entity id did not resolve.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The kind of entity that was looked up.
        entity: &'static str,
        /// The id that did not resolve.
        id: String,
    },

    /// The employee reference did not resolve in the directory.
    #[error("Employee not found: {employee_id}")]
    EmployeeNotFound {
        /// The unresolved employee id.
        employee_id: String,
    },

    /// The caller's role or ownership does not allow the operation.
    #[error("Permission denied: {message}")]
    Permission {
        /// Why access was refused.
        message: String,
    },

    /// A payroll already exists for an overlapping period.
    #[error("Payroll already exists for employee '{employee_id}' overlapping {period_start} to {period_end}")]
    DuplicatePeriod {
        /// The employee the payroll belongs to.
        employee_id: String,
        /// Start of the requested period.
        period_start: NaiveDate,
        /// End of the requested period.
        period_end: NaiveDate,
    },

    /// An attendance row already exists for the employee on that day.
    #[error("Attendance already recorded for employee '{employee_id}' on {date}")]
    DuplicateAttendanceDay {
        /// The employee.
        employee_id: String,
        /// The calendar day.
        date: NaiveDate,
    },

    /// A pending or approved leave already covers part of the range.
    #[error("Leave request overlaps an existing request for employee '{employee_id}' ({start_date} to {end_date})")]
    OverlappingLeave {
        /// The employee.
        employee_id: String,
        /// Start of the requested leave.
        start_date: NaiveDate,
        /// End of the requested leave.
        end_date: NaiveDate,
    },

    /// A salary rule with the same code already exists.
    #[error("Salary rule code already in use: {code}")]
    DuplicateRuleCode {
        /// The duplicated code.
        code: String,
    },

    /// The document already left the state the operation requires.
    #[error("Request already processed (current status: {status})")]
    AlreadyProcessed {
        /// The current status of the document.
        status: String,
    },

    /// A system default salary rule cannot be deleted.
    #[error("Salary rule '{code}' is a system default and cannot be deleted")]
    ProtectedRule {
        /// The rule code.
        code: String,
    },

    /// No salary rule set is configured.
    #[error("Salary configuration missing: {message}")]
    ConfigurationMissing {
        /// What is missing.
        message: String,
    },

    /// A formula component could not be parsed or evaluated.
    #[error("Invalid formula '{expression}': {message}")]
    InvalidFormula {
        /// The formula text.
        expression: String,
        /// The parse or evaluation failure.
        message: String,
    },

    /// An external collaborator (mail relay, object storage) failed.
    #[error("Downstream service '{service}' failed: {message}")]
    Downstream {
        /// The collaborator.
        service: String,
        /// The failure.
        message: String,
    },

    /// The document store failed.
    #[error("Storage error: {message}")]
    Storage {
        /// A description of the failure.
        message: String,
    },
}

impl EngineError {
    /// Shorthand for a [`EngineError::Validation`] error.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        EngineError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Shorthand for a [`EngineError::Permission`] error.
    pub fn permission(message: impl Into<String>) -> Self {
        EngineError::Permission {
            message: message.into(),
        }
    }

    /// Returns true for uniqueness violations.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            EngineError::DuplicatePeriod { .. }
                | EngineError::DuplicateAttendanceDay { .. }
                | EngineError::OverlappingLeave { .. }
                | EngineError::DuplicateRuleCode { .. }
        )
    }

    /// Returns true for business failures that only concern the single item
    /// of a batch being processed (unknown id, wrong state).
    pub fn is_item_level(&self) -> bool {
        matches!(
            self,
            EngineError::NotFound { .. }
                | EngineError::AlreadyProcessed { .. }
                | EngineError::Validation { .. }
        )
    }
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;
