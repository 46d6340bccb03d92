//! Distributions over a store snapshot, for the dashboard and the report
//! charts.
//!
//! Everything here is a pure function of its input. Results are `BTreeMap`s
//! so iteration order (and therefore chart order and JSON key order) is
//! stable. Empty input yields an empty map.

pub mod buckets;

use std::collections::BTreeMap;

use chrono::Timelike;
use homecare_records::{Patient, Priority, Schedule, Snapshot, Staff, VisitType};
use serde::Serialize;

pub use buckets::{AgeBucket, TimeBucket};

pub const DEFAULT_AGE_BUCKET_WIDTH: u32 = 10;
pub const DEFAULT_VISIT_BUCKET_HOURS: u32 = 1;

/// Patients per fixed-width age bucket. Only buckets with at least one
/// patient appear.
pub fn age_distribution(patients: &[Patient], width: u32) -> BTreeMap<AgeBucket, usize> {
    let mut out = BTreeMap::new();
    for p in patients {
        *out.entry(AgeBucket::containing(p.details.age, width))
            .or_insert(0) += 1;
    }
    out
}

/// Visits per staff id. Every staff member has an entry, zero when
/// unassigned; visits naming an unknown staff id are not counted.
pub fn workload(staff: &[Staff], schedules: &[Schedule]) -> BTreeMap<i64, usize> {
    let mut out: BTreeMap<i64, usize> = staff.iter().map(|s| (s.id, 0)).collect();
    for v in schedules {
        if let Some(n) = out.get_mut(&v.details.staff_id) {
            *n += 1;
        }
    }
    out
}

/// Visits per start-hour bucket of the day.
pub fn visit_distribution(schedules: &[Schedule], width_hours: u32) -> BTreeMap<TimeBucket, usize> {
    let mut out = BTreeMap::new();
    for v in schedules {
        let bucket = TimeBucket::containing(v.details.start.hour(), width_hours);
        *out.entry(bucket).or_insert(0) += 1;
    }
    out
}

pub fn visit_type_distribution(schedules: &[Schedule]) -> BTreeMap<VisitType, usize> {
    let mut out = BTreeMap::new();
    for v in schedules {
        *out.entry(v.details.visit_type).or_insert(0) += 1;
    }
    out
}

pub fn priority_distribution(schedules: &[Schedule]) -> BTreeMap<Priority, usize> {
    let mut out = BTreeMap::new();
    for v in schedules {
        *out.entry(v.details.priority).or_insert(0) += 1;
    }
    out
}

/// One staff member's load, labelled for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StaffLoad {
    pub staff_id: i64,
    pub name: String,
    pub visits: usize,
}

/// [`workload`] joined with staff names, in staff id order.
pub fn labelled_workload(staff: &[Staff], schedules: &[Schedule]) -> Vec<StaffLoad> {
    let counts = workload(staff, schedules);
    staff
        .iter()
        .map(|s| StaffLoad {
            staff_id: s.id,
            name: s.details.name.clone(),
            visits: counts.get(&s.id).copied().unwrap_or(0),
        })
        .collect()
}

/// Every distribution at once, as served by the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Overview {
    pub age: BTreeMap<AgeBucket, usize>,
    pub workload: Vec<StaffLoad>,
    pub visits: BTreeMap<TimeBucket, usize>,
    pub visit_types: BTreeMap<VisitType, usize>,
    pub priorities: BTreeMap<Priority, usize>,
}

impl Overview {
    pub fn from_snapshot(snapshot: &Snapshot, age_width: u32, visit_hours: u32) -> Self {
        let overview = Self {
            age: age_distribution(&snapshot.patients, age_width),
            workload: labelled_workload(&snapshot.staff, &snapshot.schedules),
            visits: visit_distribution(&snapshot.schedules, visit_hours),
            visit_types: visit_type_distribution(&snapshot.schedules),
            priorities: priority_distribution(&snapshot.schedules),
        };
        tracing::debug!(
            age_buckets = overview.age.len(),
            staff = overview.workload.len(),
            visit_buckets = overview.visits.len(),
            "analytics overview computed"
        );
        overview
    }
}
