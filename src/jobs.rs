//! Recurring jobs.
//!
//! A [`Scheduler`] polls on a fixed interval and runs every
//! [`RecurringTask`] that reports itself due. Tasks can be driven directly
//! in tests through [`RecurringTask::run`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use tokio::sync::Mutex;
use tracing::{error, info};

use crate::error::EngineResult;
use crate::services::{Actor, Clock, PayrollManager};

/// Work that runs on a calendar schedule.
#[async_trait]
pub trait RecurringTask: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Returns true if the task should run on `today`.
    async fn is_due(&self, today: NaiveDate) -> bool;

    /// Runs the task and returns a one-line summary.
    async fn run(&self, today: NaiveDate) -> EngineResult<String>;
}

/// Generates the previous month's payrolls on a fixed day of the month.
pub struct MonthlyPayrollJob {
    payroll: PayrollManager,
    day_of_month: u32,
    last_run: Mutex<Option<NaiveDate>>,
}

impl MonthlyPayrollJob {
    /// Creates the job, due on `day_of_month` (clamped to 1..=28).
    pub fn new(payroll: PayrollManager, day_of_month: u32) -> Self {
        Self {
            payroll,
            day_of_month: day_of_month.clamp(1, 28),
            last_run: Mutex::new(None),
        }
    }
}

#[async_trait]
impl RecurringTask for MonthlyPayrollJob {
    fn name(&self) -> &str {
        "monthly_payroll"
    }

    async fn is_due(&self, today: NaiveDate) -> bool {
        if today.day() != self.day_of_month {
            return false;
        }
        match *self.last_run.lock().await {
            Some(last) => (last.year(), last.month()) != (today.year(), today.month()),
            None => true,
        }
    }

    async fn run(&self, today: NaiveDate) -> EngineResult<String> {
        let outcome = self
            .payroll
            .generate_monthly_batch(&Actor::system(), today)
            .await?;
        *self.last_run.lock().await = Some(today);
        Ok(format!(
            "{} to {}: {} generated, {} skipped, {} failed",
            outcome.period.start, outcome.period.end, outcome.generated, outcome.skipped, outcome.failed
        ))
    }
}

/// Polls registered tasks and runs the due ones.
pub struct Scheduler {
    tasks: Vec<Arc<dyn RecurringTask>>,
    clock: Arc<dyn Clock>,
    poll_every: Duration,
}

impl Scheduler {
    /// Creates an empty scheduler.
    pub fn new(clock: Arc<dyn Clock>, poll_every: Duration) -> Self {
        Self {
            tasks: Vec::new(),
            clock,
            poll_every,
        }
    }

    /// Registers a task.
    pub fn register(mut self, task: Arc<dyn RecurringTask>) -> Self {
        self.tasks.push(task);
        self
    }

    /// Runs every task due today once. Returns how many ran successfully.
    pub async fn tick(&self) -> usize {
        let today = self.clock.today();
        let mut completed = 0;
        for task in &self.tasks {
            if !task.is_due(today).await {
                continue;
            }
            match task.run(today).await {
                Ok(summary) => {
                    info!(task = task.name(), %today, summary = %summary, "Recurring task finished");
                    completed += 1;
                }
                Err(err) => error!(task = task.name(), %today, error = %err, "Recurring task failed"),
            }
        }
        completed
    }

    /// Polls forever. Spawn this on the runtime.
    pub async fn run(self) {
        info!(
            tasks = self.tasks.len(),
            poll_seconds = self.poll_every.as_secs(),
            "Starting scheduler"
        );
        let mut interval = tokio::time::interval(self.poll_every);
        loop {
            interval.tick().await;
            self.tick().await;
        }
    }
}
