//! Application state for the HTTP API.
//!
//! Holds one instance of each workflow service; every service shares the
//! same document store, directory, clock and notifier.

use std::sync::Arc;

use chrono::NaiveDate;

use crate::config::{AppSettings, Environment};
use crate::services::{
    AttendanceLedger, Clock, EmployeeDirectory, LeaveWorkflow, Notifier, PayrollManager,
    RuleStore,
};
use crate::store::DocumentStore;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    rules: RuleStore,
    attendance: AttendanceLedger,
    leaves: LeaveWorkflow,
    payroll: PayrollManager,
    clock: Arc<dyn Clock>,
    environment: Environment,
}

impl AppState {
    /// Wires the services together.
    pub fn new(
        settings: &AppSettings,
        store: Arc<DocumentStore>,
        directory: Arc<dyn EmployeeDirectory>,
        clock: Arc<dyn Clock>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            rules: RuleStore::new(Arc::clone(&store), Arc::clone(&clock)),
            attendance: AttendanceLedger::new(Arc::clone(&store), Arc::clone(&clock)),
            leaves: LeaveWorkflow::new(
                Arc::clone(&store),
                Arc::clone(&directory),
                Arc::clone(&clock),
                Arc::clone(&notifier),
                settings.leave.effective_entitlements(),
                settings.payroll.leave_deduction_divisor,
            ),
            payroll: PayrollManager::new(store, directory, Arc::clone(&clock), notifier),
            clock,
            environment: settings.server.environment,
        }
    }

    /// The Rule Store.
    pub fn rules(&self) -> &RuleStore {
        &self.rules
    }

    /// The Attendance Ledger.
    pub fn attendance(&self) -> &AttendanceLedger {
        &self.attendance
    }

    /// The Leave Workflow.
    pub fn leaves(&self) -> &LeaveWorkflow {
        &self.leaves
    }

    /// The Payroll Record Manager.
    pub fn payroll(&self) -> &PayrollManager {
        &self.payroll
    }

    /// The current calendar day.
    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// The deployment environment.
    pub fn environment(&self) -> Environment {
        self.environment
    }
}
