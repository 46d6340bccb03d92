use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{Duration, NaiveDateTime};
use homecare_core::EntityKind;
use rusqlite::{ffi, Connection, Transaction};
use tracing::{debug, error, info, instrument, warn};

use crate::allocator;
use crate::db;
use crate::error::{RecordError, Result};
use crate::tables::{self, Table};
use crate::types::{
    Counts, Patient, PatientDetails, PatientFilter, PatientPatch, Schedule, ScheduleDetails,
    ScheduleFilter, SchedulePatch, Snapshot, Staff, StaffDetails, StaffFilter, StaffPatch,
};
use crate::validation;

/// Thread-safe owner of every patient, staff and schedule record.
///
/// Wraps a single SQLite connection in a `Mutex`. Each mutation holds the
/// lock for its whole transaction, so identifier allocation and the write it
/// serves are never interleaved with another writer.
pub struct RecordStore {
    pub(crate) db: Mutex<Connection>,
}

impl RecordStore {
    /// Wrap an already-open connection, configuring it and creating the
    /// schema if needed.
    pub fn new(conn: Connection) -> Result<Self> {
        db::configure(&conn)?;
        db::init_db(&conn)?;
        Ok(Self {
            db: Mutex::new(conn),
        })
    }

    /// Open (or create) the store file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        info!(path = %path.display(), "record store opened");
        Self::new(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::new(Connection::open_in_memory()?)
    }

    pub(crate) fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.db.lock().map_err(|_| {
            error!("record store lock poisoned");
            RecordError::Poisoned
        })
    }

    // ── patients ─────────────────────────────────────────────────────────────

    #[instrument(skip(self, details))]
    pub fn create_patient(&self, details: PatientDetails, created_by: &str) -> Result<Patient> {
        let details = validation::patient(details)?;
        let now = now_rfc3339();
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let id = allocator::next_id(&tx, EntityKind::Patients)?;
        tables::insert_patient(&tx, id, &details, created_by, &now)
            .map_err(|e| insert_error(e, EntityKind::Patients, id))?;
        tx.commit()?;
        info!(patient_id = id, "patient created");
        Ok(Patient {
            id,
            details,
            created_by: created_by.to_string(),
            created_at: now,
        })
    }

    #[instrument(skip(self, patch))]
    pub fn update_patient(&self, id: i64, patch: PatientPatch) -> Result<Patient> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let current: Patient = get_in(&tx, id)?;
        let details = validation::patient(patch.apply(current.details))?;
        tables::update_patient(&tx, id, &details)?;
        tx.commit()?;
        info!(patient_id = id, "patient updated");
        Ok(Patient { details, ..current })
    }

    /// Remove a patient. Refused with [`RecordError::Referenced`] while any
    /// visit still points at them.
    #[instrument(skip(self))]
    pub fn delete_patient(&self, id: i64) -> Result<()> {
        self.delete_referenced(EntityKind::Patients, id)
    }

    pub fn get_patient(&self, id: i64) -> Result<Patient> {
        get_in(&*self.lock()?, id)
    }

    pub fn list_patients(&self, filter: &PatientFilter) -> Result<Vec<Patient>> {
        let all: Vec<Patient> = tables::fetch_all(&*self.lock()?)?;
        Ok(all.into_iter().filter(|p| filter.matches(p)).collect())
    }

    // ── staff ────────────────────────────────────────────────────────────────

    #[instrument(skip(self, details))]
    pub fn create_staff(&self, details: StaffDetails, created_by: &str) -> Result<Staff> {
        let details = validation::staff(details)?;
        let now = now_rfc3339();
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let id = allocator::next_id(&tx, EntityKind::Staff)?;
        tables::insert_staff(&tx, id, &details, created_by, &now)
            .map_err(|e| insert_error(e, EntityKind::Staff, id))?;
        tx.commit()?;
        info!(staff_id = id, role = %details.role, "staff member created");
        Ok(Staff {
            id,
            details,
            created_by: created_by.to_string(),
            created_at: now,
        })
    }

    #[instrument(skip(self, patch))]
    pub fn update_staff(&self, id: i64, patch: StaffPatch) -> Result<Staff> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let current: Staff = get_in(&tx, id)?;
        let details = validation::staff(patch.apply(current.details))?;
        tables::update_staff(&tx, id, &details)?;
        tx.commit()?;
        info!(staff_id = id, "staff member updated");
        Ok(Staff { details, ..current })
    }

    #[instrument(skip(self))]
    pub fn delete_staff(&self, id: i64) -> Result<()> {
        self.delete_referenced(EntityKind::Staff, id)
    }

    pub fn get_staff(&self, id: i64) -> Result<Staff> {
        get_in(&*self.lock()?, id)
    }

    pub fn list_staff(&self, filter: &StaffFilter) -> Result<Vec<Staff>> {
        let all: Vec<Staff> = tables::fetch_all(&*self.lock()?)?;
        Ok(all.into_iter().filter(|s| filter.matches(s)).collect())
    }

    // ── schedules ────────────────────────────────────────────────────────────

    /// Book a visit. The patient and staff member must exist; the check and
    /// the insert share one transaction.
    #[instrument(skip(self, details))]
    pub fn create_schedule(&self, details: ScheduleDetails, created_by: &str) -> Result<Schedule> {
        let details = validation::schedule(details)?;
        let now = now_rfc3339();
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        check_references(&tx, &details)?;
        let id = allocator::next_id(&tx, EntityKind::Schedules)?;
        tables::insert_schedule(&tx, id, &details, created_by, &now)
            .map_err(|e| insert_error(e, EntityKind::Schedules, id))?;
        tx.commit()?;
        info!(
            schedule_id = id,
            patient_id = details.patient_id,
            staff_id = details.staff_id,
            start = %details.start,
            "visit scheduled"
        );
        Ok(Schedule {
            id,
            details,
            created_by: created_by.to_string(),
            created_at: now,
        })
    }

    #[instrument(skip(self, patch))]
    pub fn update_schedule(&self, id: i64, patch: SchedulePatch) -> Result<Schedule> {
        let recheck = patch.changes_references();
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let current: Schedule = get_in(&tx, id)?;
        let details = validation::schedule(patch.apply(current.details))?;
        if recheck {
            check_references(&tx, &details)?;
        }
        tables::update_schedule(&tx, id, &details)?;
        tx.commit()?;
        info!(schedule_id = id, "visit updated");
        Ok(Schedule { details, ..current })
    }

    #[instrument(skip(self))]
    pub fn delete_schedule(&self, id: i64) -> Result<()> {
        let conn = self.lock()?;
        if tables::delete(&conn, EntityKind::Schedules, id)? == 0 {
            return Err(RecordError::NotFound {
                kind: EntityKind::Schedules,
                id,
            });
        }
        info!(schedule_id = id, "visit deleted");
        Ok(())
    }

    pub fn get_schedule(&self, id: i64) -> Result<Schedule> {
        get_in(&*self.lock()?, id)
    }

    /// Visits matching `filter`, ordered by id.
    pub fn list_schedules(&self, filter: &ScheduleFilter) -> Result<Vec<Schedule>> {
        let all: Vec<Schedule> = tables::fetch_all(&*self.lock()?)?;
        Ok(all.into_iter().filter(|v| filter.matches(v)).collect())
    }

    /// Visits starting in `[now, now + days)`, earliest first.
    pub fn upcoming(&self, now: NaiveDateTime, days: u32) -> Result<Vec<Schedule>> {
        let filter = ScheduleFilter {
            from: Some(now),
            until: Some(now + Duration::days(i64::from(days))),
            ..Default::default()
        };
        let mut visits = self.list_schedules(&filter)?;
        visits.sort_by(|a, b| {
            a.details
                .start
                .cmp(&b.details.start)
                .then(a.id.cmp(&b.id))
        });
        Ok(visits)
    }

    // ── whole-store reads ────────────────────────────────────────────────────

    /// All three lists read under one lock acquisition.
    pub fn snapshot(&self) -> Result<Snapshot> {
        let conn = self.lock()?;
        let snapshot = Snapshot {
            patients: tables::fetch_all(&conn)?,
            staff: tables::fetch_all(&conn)?,
            schedules: tables::fetch_all(&conn)?,
        };
        debug!(
            patients = snapshot.patients.len(),
            staff = snapshot.staff.len(),
            schedules = snapshot.schedules.len(),
            "snapshot taken"
        );
        Ok(snapshot)
    }

    pub fn counts(&self) -> Result<Counts> {
        let conn = self.lock()?;
        Ok(Counts {
            patients: tables::count(&conn, EntityKind::Patients)?,
            staff: tables::count(&conn, EntityKind::Staff)?,
            schedules: tables::count(&conn, EntityKind::Schedules)?,
        })
    }

    pub fn high_water(&self, kind: EntityKind) -> Result<i64> {
        allocator::high_water(&*self.lock()?, kind)
    }

    fn delete_referenced(&self, kind: EntityKind, id: i64) -> Result<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        if !tables::exists(&tx, kind, id)? {
            return Err(RecordError::NotFound { kind, id });
        }
        let schedules = tables::referencing_schedules(&tx, kind, id)?;
        if schedules > 0 {
            warn!(%kind, id, schedules, "delete refused: record still has visits");
            return Err(RecordError::Referenced {
                kind,
                id,
                schedules,
            });
        }
        tables::delete(&tx, kind, id)?;
        tx.commit()?;
        info!(%kind, id, "record deleted");
        Ok(())
    }
}

fn get_in<T: Table>(conn: &Connection, id: i64) -> Result<T> {
    tables::fetch_one(conn, id)?.ok_or(RecordError::NotFound { kind: T::KIND, id })
}

fn check_references(tx: &Transaction<'_>, details: &ScheduleDetails) -> Result<()> {
    if !tables::exists(tx, EntityKind::Patients, details.patient_id)? {
        return Err(RecordError::validation(format!(
            "patient {} does not exist",
            details.patient_id
        )));
    }
    if !tables::exists(tx, EntityKind::Staff, details.staff_id)? {
        return Err(RecordError::validation(format!(
            "staff member {} does not exist",
            details.staff_id
        )));
    }
    Ok(())
}

/// Primary-key collisions become [`RecordError::DuplicateIdentifier`]; the
/// allocator should make them impossible, so they are logged as fatal.
fn insert_error(e: rusqlite::Error, kind: EntityKind, id: i64) -> RecordError {
    match e {
        rusqlite::Error::SqliteFailure(ref err, _)
            if err.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY =>
        {
            error!(%kind, id, "identifier already in use; allocator high-water mark is behind the table");
            RecordError::DuplicateIdentifier { kind, id }
        }
        other => RecordError::Database(other),
    }
}

fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::params;

    #[test]
    fn lagging_allocator_surfaces_duplicate_identifier() {
        let store = RecordStore::open_in_memory().unwrap();
        let p = store
            .create_patient(
                PatientDetails {
                    name: "A. Said".into(),
                    age: 70,
                    ..Default::default()
                },
                "admin",
            )
            .unwrap();

        // Simulate a corrupted allocator row.
        store
            .lock()
            .unwrap()
            .execute(
                "UPDATE id_allocator SET high_water = 0 WHERE entity = ?1",
                params![EntityKind::Patients.as_str()],
            )
            .unwrap();

        let err = store
            .create_patient(
                PatientDetails {
                    name: "B. Other".into(),
                    age: 40,
                    ..Default::default()
                },
                "admin",
            )
            .unwrap_err();
        assert!(matches!(
            err,
            RecordError::DuplicateIdentifier { kind: EntityKind::Patients, id } if id == p.id
        ));
        assert!(err.is_fatal());
        assert_eq!(store.counts().unwrap().patients, 1);
    }

    #[test]
    fn unknown_references_are_rejected_without_consuming_an_id() {
        let store = RecordStore::open_in_memory().unwrap();
        let start = chrono::NaiveDate::from_ymd_opt(2026, 1, 5)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        let err = store
            .create_schedule(ScheduleDetails::new(1, 1, start, 30), "admin")
            .unwrap_err();
        assert!(matches!(err, RecordError::Validation(_)));
        assert_eq!(store.high_water(EntityKind::Schedules).unwrap(), 0);
    }
}
