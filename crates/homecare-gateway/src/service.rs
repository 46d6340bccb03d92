//! Role-gated facade over the record store, exports and user directory.
//!
//! Every method takes the [`Caller`] explicitly and checks the access gate
//! before touching the store. Updates and deletes additionally require the
//! caller to be an admin or the record's creator.

use std::path::PathBuf;

use chrono::{NaiveDateTime, Utc};
use homecare_analytics::Overview;
use homecare_core::config::HomecareConfig;
use homecare_core::{EntityKind, Operation, Role};
use homecare_export::{csv, report, spreadsheet, ReportOptions};
use homecare_records::{
    Counts, Patient, PatientDetails, PatientFilter, PatientPatch, RecordStore, Schedule,
    ScheduleDetails, ScheduleFilter, SchedulePatch, Staff, StaffDetails, StaffFilter, StaffPatch,
};
use homecare_users::{AccessGate, NewUser, User, UserDirectory};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Result, ServiceError};

/// The authenticated operator behind a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    pub username: String,
    pub role: Role,
}

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub counts: Counts,
    pub upcoming: Vec<Schedule>,
}

pub const UPCOMING_DAYS: u32 = 30;

pub struct HomecareService {
    records: RecordStore,
    users: UserDirectory,
    age_bucket_width: u32,
    visit_bucket_hours: u32,
    report_title: String,
    backup_dir: PathBuf,
}

impl HomecareService {
    pub fn new(records: RecordStore, users: UserDirectory, config: &HomecareConfig) -> Self {
        Self {
            records,
            users,
            age_bucket_width: config.analytics.age_bucket_width,
            visit_bucket_hours: config.analytics.visit_bucket_hours,
            report_title: config.report.title.clone(),
            backup_dir: PathBuf::from(&config.backup.dir),
        }
    }

    fn gate(caller: &Caller, op: Operation) -> Result<()> {
        AccessGate::require(caller.role, op)?;
        Ok(())
    }

    /// Edit permission for `kind`, then ownership: admins pass, anyone else
    /// must have created the record.
    fn require_creator(&self, caller: &Caller, kind: EntityKind, id: i64) -> Result<()> {
        Self::gate(caller, Operation::edit(kind))?;
        if caller.role.is_admin() {
            return Ok(());
        }
        let created_by = match kind {
            EntityKind::Patients => self.records.get_patient(id)?.created_by,
            EntityKind::Staff => self.records.get_staff(id)?.created_by,
            EntityKind::Schedules => self.records.get_schedule(id)?.created_by,
        };
        if created_by == caller.username {
            return Ok(());
        }
        warn!(
            username = %caller.username,
            %kind,
            id,
            %created_by,
            "edit refused: caller is not the creator"
        );
        Err(ServiceError::NotCreator { kind, id })
    }

    // ── session boundary ─────────────────────────────────────────────────────

    pub fn login(&self, username: &str, password: &str) -> Result<User> {
        Ok(self.users.login(username, password)?)
    }

    pub fn list_users(&self, caller: &Caller) -> Result<Vec<User>> {
        Self::gate(caller, Operation::ManageUsers)?;
        Ok(self.users.list_users()?)
    }

    pub fn create_user(&self, caller: &Caller, new: NewUser) -> Result<User> {
        Self::gate(caller, Operation::ManageUsers)?;
        Ok(self.users.create_user(new)?)
    }

    pub fn get_user(&self, caller: &Caller, username: &str) -> Result<User> {
        Self::gate(caller, Operation::ManageUsers)?;
        Ok(self.users.get(username)?)
    }

    /// Any role may change its own password.
    pub fn change_password(&self, caller: &Caller, current: &str, new_password: &str) -> Result<()> {
        Ok(self
            .users
            .change_password(&caller.username, current, new_password)?)
    }

    pub fn reset_password(&self, caller: &Caller, username: &str, new_password: &str) -> Result<User> {
        Self::gate(caller, Operation::ManageUsers)?;
        Ok(self.users.reset_password(username, new_password)?)
    }

    // ── patients ─────────────────────────────────────────────────────────────

    pub fn list_patients(&self, caller: &Caller, filter: &PatientFilter) -> Result<Vec<Patient>> {
        Self::gate(caller, Operation::ViewPatients)?;
        Ok(self.records.list_patients(filter)?)
    }

    pub fn get_patient(&self, caller: &Caller, id: i64) -> Result<Patient> {
        Self::gate(caller, Operation::ViewPatients)?;
        Ok(self.records.get_patient(id)?)
    }

    pub fn create_patient(&self, caller: &Caller, details: PatientDetails) -> Result<Patient> {
        Self::gate(caller, Operation::EditPatients)?;
        Ok(self.records.create_patient(details, &caller.username)?)
    }

    pub fn update_patient(&self, caller: &Caller, id: i64, patch: PatientPatch) -> Result<Patient> {
        self.require_creator(caller, EntityKind::Patients, id)?;
        Ok(self.records.update_patient(id, patch)?)
    }

    pub fn delete_patient(&self, caller: &Caller, id: i64) -> Result<()> {
        self.require_creator(caller, EntityKind::Patients, id)?;
        Ok(self.records.delete_patient(id)?)
    }

    // ── staff ────────────────────────────────────────────────────────────────

    pub fn list_staff(&self, caller: &Caller, filter: &StaffFilter) -> Result<Vec<Staff>> {
        Self::gate(caller, Operation::ViewStaff)?;
        Ok(self.records.list_staff(filter)?)
    }

    pub fn get_staff(&self, caller: &Caller, id: i64) -> Result<Staff> {
        Self::gate(caller, Operation::ViewStaff)?;
        Ok(self.records.get_staff(id)?)
    }

    pub fn create_staff(&self, caller: &Caller, details: StaffDetails) -> Result<Staff> {
        Self::gate(caller, Operation::EditStaff)?;
        Ok(self.records.create_staff(details, &caller.username)?)
    }

    pub fn update_staff(&self, caller: &Caller, id: i64, patch: StaffPatch) -> Result<Staff> {
        self.require_creator(caller, EntityKind::Staff, id)?;
        Ok(self.records.update_staff(id, patch)?)
    }

    pub fn delete_staff(&self, caller: &Caller, id: i64) -> Result<()> {
        self.require_creator(caller, EntityKind::Staff, id)?;
        Ok(self.records.delete_staff(id)?)
    }

    // ── schedules ────────────────────────────────────────────────────────────

    pub fn list_schedules(&self, caller: &Caller, filter: &ScheduleFilter) -> Result<Vec<Schedule>> {
        Self::gate(caller, Operation::ViewSchedules)?;
        Ok(self.records.list_schedules(filter)?)
    }

    pub fn get_schedule(&self, caller: &Caller, id: i64) -> Result<Schedule> {
        Self::gate(caller, Operation::ViewSchedules)?;
        Ok(self.records.get_schedule(id)?)
    }

    pub fn create_schedule(&self, caller: &Caller, details: ScheduleDetails) -> Result<Schedule> {
        Self::gate(caller, Operation::EditSchedules)?;
        Ok(self.records.create_schedule(details, &caller.username)?)
    }

    pub fn update_schedule(
        &self,
        caller: &Caller,
        id: i64,
        patch: SchedulePatch,
    ) -> Result<Schedule> {
        self.require_creator(caller, EntityKind::Schedules, id)?;
        Ok(self.records.update_schedule(id, patch)?)
    }

    pub fn delete_schedule(&self, caller: &Caller, id: i64) -> Result<()> {
        self.require_creator(caller, EntityKind::Schedules, id)?;
        Ok(self.records.delete_schedule(id)?)
    }

    // ── read models ──────────────────────────────────────────────────────────

    pub fn dashboard(&self, caller: &Caller, now: NaiveDateTime) -> Result<Dashboard> {
        Self::gate(caller, Operation::ViewPatients)?;
        Self::gate(caller, Operation::ViewSchedules)?;
        Ok(Dashboard {
            counts: self.records.counts()?,
            upcoming: self.records.upcoming(now, UPCOMING_DAYS)?,
        })
    }

    /// Every distribution. Needs patient and schedule visibility since it
    /// summarises both.
    pub fn analytics(&self, caller: &Caller) -> Result<Overview> {
        Self::gate(caller, Operation::ViewPatients)?;
        Self::gate(caller, Operation::ViewSchedules)?;
        let snapshot = self.records.snapshot()?;
        Ok(Overview::from_snapshot(
            &snapshot,
            self.age_bucket_width,
            self.visit_bucket_hours,
        ))
    }

    // ── exports ──────────────────────────────────────────────────────────────

    pub fn export_csv(&self, caller: &Caller, kind: EntityKind) -> Result<Vec<u8>> {
        Self::gate(caller, Operation::Export)?;
        let snapshot = self.records.snapshot()?;
        Ok(csv::to_csv(&snapshot, kind)?)
    }

    pub fn export_xlsx(&self, caller: &Caller, kinds: &[EntityKind]) -> Result<Vec<u8>> {
        Self::gate(caller, Operation::Export)?;
        let snapshot = self.records.snapshot()?;
        Ok(spreadsheet::to_xlsx(&snapshot, kinds)?)
    }

    pub fn export_report(
        &self,
        caller: &Caller,
        kinds: Vec<EntityKind>,
        include_charts: bool,
    ) -> Result<Vec<u8>> {
        Self::gate(caller, Operation::Export)?;
        let snapshot = self.records.snapshot()?;
        let options = ReportOptions {
            kinds,
            include_charts,
            age_bucket_width: self.age_bucket_width,
            visit_bucket_hours: self.visit_bucket_hours,
            ..ReportOptions::new(self.report_title.clone(), Utc::now())
        };
        Ok(report::build_report(&snapshot, &options)?)
    }

    pub fn backup(&self, caller: &Caller) -> Result<PathBuf> {
        Self::gate(caller, Operation::Backup)?;
        Ok(self.records.backup_to(&self.backup_dir)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServiceError;
    use chrono::NaiveDate;
    use homecare_records::{RecordError, StaffRole};
    use homecare_users::UserError;

    fn service() -> HomecareService {
        let dir = std::env::temp_dir().join("homecare-service-tests");
        let mut config = HomecareConfig::default();
        config.backup.dir = dir.to_string_lossy().into_owned();
        HomecareService::new(
            RecordStore::open_in_memory().unwrap(),
            UserDirectory::open_in_memory().unwrap(),
            &config,
        )
    }

    fn caller(role: Role) -> Caller {
        Caller {
            username: role.to_string(),
            role,
        }
    }

    fn denied(result: Result<impl std::fmt::Debug>) -> bool {
        matches!(
            result,
            Err(ServiceError::Users(UserError::PermissionDenied { .. }))
        )
    }

    fn patient(name: &str) -> PatientDetails {
        PatientDetails {
            name: name.into(),
            age: 70,
            ..Default::default()
        }
    }

    #[test]
    fn staff_cannot_delete_a_patient() {
        let svc = service();
        let p = svc
            .create_patient(&caller(Role::Admin), patient("A. Said"))
            .unwrap();

        assert!(denied(svc.delete_patient(&caller(Role::Staff), p.id)));
        assert_eq!(svc.get_patient(&caller(Role::Staff), p.id).unwrap(), p);
    }

    #[test]
    fn doctor_books_visits_but_cannot_edit_staff() {
        let svc = service();
        let admin = caller(Role::Admin);
        let doctor = caller(Role::Doctor);
        let p = svc.create_patient(&doctor, patient("A. Said")).unwrap();
        assert_eq!(p.created_by, "doctor");

        assert!(denied(svc.create_staff(
            &doctor,
            StaffDetails::new("N. Ali", StaffRole::Nurse)
        )));
        let s = svc
            .create_staff(&admin, StaffDetails::new("N. Ali", StaffRole::Nurse))
            .unwrap();

        let start = NaiveDate::from_ymd_opt(2026, 1, 12)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        let visit = svc
            .create_schedule(&doctor, ScheduleDetails::new(p.id, s.id, start, 30))
            .unwrap();
        assert_eq!(visit.details.patient_id, p.id);
    }

    #[test]
    fn exports_and_backup_are_gated() {
        let svc = service();
        assert!(denied(svc.export_csv(&caller(Role::Staff), EntityKind::Patients)));
        assert!(svc
            .export_csv(&caller(Role::Doctor), EntityKind::Patients)
            .is_ok());
        assert!(denied(svc.backup(&caller(Role::Doctor))));
        assert!(denied(svc.list_users(&caller(Role::Doctor))));
    }

    #[test]
    fn only_admin_or_creator_may_change_a_record() {
        let svc = service();
        let admin = caller(Role::Admin);
        let doctor = caller(Role::Doctor);
        let other_doctor = Caller {
            username: "dr.other".into(),
            role: Role::Doctor,
        };

        let by_admin = svc.create_patient(&admin, patient("A. Said")).unwrap();
        let patch = PatientPatch {
            notes: Some("moved".into()),
            ..Default::default()
        };
        let err = svc
            .update_patient(&doctor, by_admin.id, patch.clone())
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotCreator { kind: EntityKind::Patients, id } if id == by_admin.id));
        assert_eq!(err.status(), axum::http::StatusCode::FORBIDDEN);
        assert_eq!(err.code(), "NOT_CREATOR");
        assert_eq!(svc.get_patient(&doctor, by_admin.id).unwrap(), by_admin);

        let by_doctor = svc.create_patient(&doctor, patient("B. Noor")).unwrap();
        assert!(matches!(
            svc.delete_patient(&other_doctor, by_doctor.id),
            Err(ServiceError::NotCreator { .. })
        ));
        let updated = svc.update_patient(&doctor, by_doctor.id, patch).unwrap();
        assert_eq!(updated.details.notes.as_deref(), Some("moved"));

        // admins override ownership
        svc.delete_patient(&admin, by_doctor.id).unwrap();
        assert!(matches!(
            svc.delete_patient(&doctor, by_doctor.id),
            Err(ServiceError::Records(RecordError::NotFound { .. }))
        ));
    }

    #[test]
    fn password_change_is_self_service_and_reset_is_admin_only() {
        let svc = service();
        let admin = caller(Role::Admin);
        svc.create_user(
            &admin,
            NewUser {
                username: "doctor".into(),
                password: "first-pw".into(),
                role: Role::Doctor,
            },
        )
        .unwrap();
        let doctor = caller(Role::Doctor);

        svc.change_password(&doctor, "first-pw", "second-pw").unwrap();
        assert!(svc.login("doctor", "second-pw").is_ok());

        assert!(denied(svc.reset_password(&doctor, "doctor", "third-pw")));
        let user = svc.reset_password(&admin, "doctor", "third-pw").unwrap();
        assert_eq!(user.username, "doctor");
        assert!(svc.login("doctor", "third-pw").is_ok());
        assert_eq!(svc.get_user(&admin, "doctor").unwrap().role, Role::Doctor);
    }

    #[test]
    fn admin_backup_lands_in_configured_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = HomecareConfig::default();
        config.backup.dir = dir.path().to_string_lossy().into_owned();
        let svc = HomecareService::new(
            RecordStore::open_in_memory().unwrap(),
            UserDirectory::open_in_memory().unwrap(),
            &config,
        );
        svc.create_patient(&caller(Role::Admin), patient("A")).unwrap();

        let path = svc.backup(&caller(Role::Admin)).unwrap();
        assert!(path.starts_with(dir.path()));
        let copy = RecordStore::open(&path).unwrap();
        assert_eq!(copy.counts().unwrap().patients, 1);
    }

    #[test]
    fn referenced_delete_surfaces_as_conflict() {
        let svc = service();
        let admin = caller(Role::Admin);
        let p = svc.create_patient(&admin, patient("A")).unwrap();
        let s = svc
            .create_staff(&admin, StaffDetails::new("N", StaffRole::Nurse))
            .unwrap();
        let start = NaiveDate::from_ymd_opt(2026, 1, 12)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        svc.create_schedule(&admin, ScheduleDetails::new(p.id, s.id, start, 30))
            .unwrap();

        let err = svc.delete_patient(&admin, p.id).unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Records(RecordError::Referenced { .. })
        ));
        assert_eq!(err.status(), axum::http::StatusCode::CONFLICT);
        assert_eq!(err.code(), "REFERENCED");
    }
}
