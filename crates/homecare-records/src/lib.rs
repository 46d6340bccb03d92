//! `homecare-records`: SQLite-backed store for patients, staff and visits.
//!
//! # Overview
//!
//! [`store::RecordStore`] owns a single connection behind a mutex. Every
//! mutating call runs in one transaction: the identifier is drawn from the
//! persisted high-water mark in `id_allocator` ([`allocator`]) and the row is
//! written before the transaction commits, so readers never observe a torn
//! state and identifiers are never reissued, even after deletes or restarts.
//!
//! Input is validated and normalised by [`validation`] before it reaches SQL.
//!
//! | Table          | Key           | Notes                                   |
//! |----------------|---------------|-----------------------------------------|
//! | `patients`     | `id`          | list columns stored as JSON arrays      |
//! | `staff`        | `id`          | `specialties` stored as a JSON array    |
//! | `schedules`    | `id`          | FKs to patients/staff, `ON DELETE RESTRICT` |
//! | `id_allocator` | `entity`      | high-water mark per entity kind         |

pub mod allocator;
pub mod backup;
pub mod db;
pub mod error;
pub mod store;
mod tables;
pub mod types;
pub mod validation;

pub use error::{RecordError, Result};
pub use store::RecordStore;
pub use types::{
    Counts, Mobility, Patient, PatientDetails, PatientFilter, PatientPatch, Priority, Schedule,
    ScheduleDetails, ScheduleFilter, SchedulePatch, Snapshot, Staff, StaffDetails, StaffFilter,
    StaffPatch, StaffRole, VisitType,
};
