//! Attendance ledger.
//!
//! One row per employee per day. Administrators record or correct a day
//! (last writer wins); strict inserts surface `DuplicateAttendanceDay`.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use tracing::info;

use super::{Actor, Clock};
use crate::error::{EngineError, EngineResult};
use crate::models::{AttendanceRecord, AttendanceStatus, Period};
use crate::store::DocumentStore;

/// One day of attendance as entered by a caller.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceEntry {
    /// The employee.
    pub employee_id: String,
    /// The day.
    pub date: NaiveDate,
    /// Day status.
    pub status: AttendanceStatus,
    /// Clock-in time.
    #[serde(default)]
    pub clock_in: Option<NaiveDateTime>,
    /// Clock-out time.
    #[serde(default)]
    pub clock_out: Option<NaiveDateTime>,
    /// Minutes late.
    #[serde(default)]
    pub late_minutes: u32,
    /// Minutes left early.
    #[serde(default)]
    pub early_minutes: u32,
    /// Remarks.
    #[serde(default)]
    pub remarks: String,
}

/// The attendance ledger service.
#[derive(Clone)]
pub struct AttendanceLedger {
    store: Arc<DocumentStore>,
    clock: Arc<dyn Clock>,
}

impl AttendanceLedger {
    /// Creates the service.
    pub fn new(store: Arc<DocumentStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    fn build_record(&self, actor: &Actor, entry: AttendanceEntry) -> AttendanceRecord {
        let now = self.clock.now();
        let mut record = AttendanceRecord::new(entry.employee_id, entry.date, entry.status, &actor.user_id, now);
        record.set_clock_times(entry.clock_in, entry.clock_out);
        record.late_minutes = entry.late_minutes;
        record.early_minutes = entry.early_minutes;
        record.is_late = record.is_late || entry.late_minutes > 0;
        record.is_early = record.is_early || entry.early_minutes > 0;
        record.remarks = entry.remarks;
        record.updated_by = Some(actor.user_id.clone());
        record.corrected_by_admin = actor.is_admin();
        record
    }

    /// Records or corrects a day, replacing any existing row for the same
    /// (employee, day). Admin only.
    pub async fn record_day(&self, actor: &Actor, entry: AttendanceEntry) -> EngineResult<AttendanceRecord> {
        actor.require_admin()?;
        let record = self.build_record(actor, entry);
        let mut tx = self.store.begin().await;
        let stored = tx.upsert_attendance(record);
        tx.commit().await?;
        info!(
            employee_id = %stored.employee_id,
            date = %stored.date,
            status = ?stored.status,
            actor = %actor.user_id,
            "Attendance recorded"
        );
        Ok(stored)
    }

    /// Inserts a day, failing with `DuplicateAttendanceDay` if the employee
    /// already has a row for it. Admin only.
    pub async fn insert_day(&self, actor: &Actor, entry: AttendanceEntry) -> EngineResult<AttendanceRecord> {
        actor.require_admin()?;
        let record = self.build_record(actor, entry);
        let mut tx = self.store.begin().await;
        tx.insert_attendance(record.clone())?;
        tx.commit().await?;
        Ok(record)
    }

    /// An employee's rows inside `period`, oldest first. Admin or self.
    pub async fn range(&self, actor: &Actor, employee_id: &str, period: Period) -> EngineResult<Vec<AttendanceRecord>> {
        actor.require_admin_or_self(employee_id)?;
        if !period.is_valid() {
            return Err(EngineError::validation("to", "end date must not be before start date"));
        }
        Ok(self.store.read().await.attendance_in(employee_id, &period))
    }
}
