use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Storage and export format for visit start times (minute precision).
pub const START_FORMAT: &str = "%Y-%m-%dT%H:%M";

// ── Enumerations ─────────────────────────────────────────────────────────────

/// How independently a patient moves around.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum Mobility {
    #[default]
    Independent,
    Assisted,
    Wheelchair,
    Bedbound,
}

impl Mobility {
    pub const ALL: [Mobility; 4] = [
        Mobility::Independent,
        Mobility::Assisted,
        Mobility::Wheelchair,
        Mobility::Bedbound,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Mobility::Independent => "Independent",
            Mobility::Assisted => "Assisted",
            Mobility::Wheelchair => "Wheelchair",
            Mobility::Bedbound => "Bedbound",
        }
    }
}

impl std::fmt::Display for Mobility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Mobility {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        Mobility::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown mobility status: {s}"))
    }
}

/// Clinical role of a staff member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StaffRole {
    Specialist,
    #[serde(rename = "General-Practitioner", alias = "GP")]
    GeneralPractitioner,
    Nurse,
    #[serde(rename = "Respiratory-Therapist", alias = "RT")]
    RespiratoryTherapist,
    #[serde(rename = "Physical-Therapist", alias = "PT")]
    PhysicalTherapist,
    #[serde(rename = "Care-Giver", alias = "Care Giver")]
    CareGiver,
}

impl StaffRole {
    pub const ALL: [StaffRole; 6] = [
        StaffRole::Specialist,
        StaffRole::GeneralPractitioner,
        StaffRole::Nurse,
        StaffRole::RespiratoryTherapist,
        StaffRole::PhysicalTherapist,
        StaffRole::CareGiver,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StaffRole::Specialist => "Specialist",
            StaffRole::GeneralPractitioner => "General-Practitioner",
            StaffRole::Nurse => "Nurse",
            StaffRole::RespiratoryTherapist => "Respiratory-Therapist",
            StaffRole::PhysicalTherapist => "Physical-Therapist",
            StaffRole::CareGiver => "Care-Giver",
        }
    }

    /// Short form used on the paper rota.
    fn abbreviation(&self) -> Option<&'static str> {
        match self {
            StaffRole::GeneralPractitioner => Some("GP"),
            StaffRole::RespiratoryTherapist => Some("RT"),
            StaffRole::PhysicalTherapist => Some("PT"),
            StaffRole::CareGiver => Some("Care Giver"),
            _ => None,
        }
    }
}

impl std::fmt::Display for StaffRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for StaffRole {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        StaffRole::ALL
            .into_iter()
            .find(|r| {
                r.as_str().eq_ignore_ascii_case(s)
                    || r.abbreviation().is_some_and(|a| a.eq_ignore_ascii_case(s))
            })
            .ok_or_else(|| format!("unknown staff role: {s}"))
    }
}

/// Visit urgency. Ordered: `Low < Normal < High < Critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
    Critical,
}

impl Priority {
    pub const ALL: [Priority; 4] = [Priority::Low, Priority::Normal, Priority::High, Priority::Critical];

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Normal => "Normal",
            Priority::High => "High",
            Priority::Critical => "Critical",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        Priority::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown priority: {s}"))
    }
}

/// Kind of visit booked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum VisitType {
    #[default]
    #[serde(rename = "Home visit")]
    HomeVisit,
    Telehealth,
    #[serde(rename = "Wound care")]
    WoundCare,
    #[serde(rename = "Medication administration")]
    MedicationAdministration,
    Physiotherapy,
    #[serde(rename = "Respiratory therapy")]
    RespiratoryTherapy,
    Assessment,
    Other,
}

impl VisitType {
    pub const ALL: [VisitType; 8] = [
        VisitType::HomeVisit,
        VisitType::Telehealth,
        VisitType::WoundCare,
        VisitType::MedicationAdministration,
        VisitType::Physiotherapy,
        VisitType::RespiratoryTherapy,
        VisitType::Assessment,
        VisitType::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VisitType::HomeVisit => "Home visit",
            VisitType::Telehealth => "Telehealth",
            VisitType::WoundCare => "Wound care",
            VisitType::MedicationAdministration => "Medication administration",
            VisitType::Physiotherapy => "Physiotherapy",
            VisitType::RespiratoryTherapy => "Respiratory therapy",
            VisitType::Assessment => "Assessment",
            VisitType::Other => "Other",
        }
    }
}

impl std::fmt::Display for VisitType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for VisitType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        VisitType::ALL
            .into_iter()
            .find(|v| v.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown visit type: {s}"))
    }
}

// ── Patients ─────────────────────────────────────────────────────────────────

/// Everything about a patient except identity and audit fields.
///
/// This is also the create payload; `validation::patient` normalises it
/// (trimmed text, blank optionals become `None`, blank list items dropped).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PatientDetails {
    pub name: String,
    pub age: u32,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub emergency_contact: Option<String>,
    #[serde(default)]
    pub insurance_provider: Option<String>,
    #[serde(default)]
    pub insurance_number: Option<String>,
    #[serde(default)]
    pub diagnosis: Option<String>,
    #[serde(default)]
    pub allergies: Vec<String>,
    #[serde(default)]
    pub medications: Vec<String>,
    #[serde(default)]
    pub equipment: Vec<String>,
    #[serde(default)]
    pub mobility: Mobility,
    #[serde(default)]
    pub care_plan: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patient {
    pub id: i64,
    #[serde(flatten)]
    pub details: PatientDetails,
    pub created_by: String,
    /// RFC 3339.
    pub created_at: String,
}

/// Partial update. `None` leaves a field untouched; for optional text an
/// empty string clears it, for lists an empty list clears it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatientPatch {
    pub name: Option<String>,
    pub age: Option<u32>,
    pub gender: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub emergency_contact: Option<String>,
    pub insurance_provider: Option<String>,
    pub insurance_number: Option<String>,
    pub diagnosis: Option<String>,
    pub allergies: Option<Vec<String>>,
    pub medications: Option<Vec<String>>,
    pub equipment: Option<Vec<String>>,
    pub mobility: Option<Mobility>,
    pub care_plan: Option<String>,
    pub notes: Option<String>,
}

impl PatientPatch {
    /// Overlay the patch on `base`. The result still needs validation.
    pub fn apply(self, mut base: PatientDetails) -> PatientDetails {
        if let Some(v) = self.name {
            base.name = v;
        }
        if let Some(v) = self.age {
            base.age = v;
        }
        patch_text(&mut base.gender, self.gender);
        patch_text(&mut base.phone, self.phone);
        patch_text(&mut base.email, self.email);
        patch_text(&mut base.address, self.address);
        patch_text(&mut base.emergency_contact, self.emergency_contact);
        patch_text(&mut base.insurance_provider, self.insurance_provider);
        patch_text(&mut base.insurance_number, self.insurance_number);
        patch_text(&mut base.diagnosis, self.diagnosis);
        if let Some(v) = self.allergies {
            base.allergies = v;
        }
        if let Some(v) = self.medications {
            base.medications = v;
        }
        if let Some(v) = self.equipment {
            base.equipment = v;
        }
        if let Some(v) = self.mobility {
            base.mobility = v;
        }
        patch_text(&mut base.care_plan, self.care_plan);
        patch_text(&mut base.notes, self.notes);
        base
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatientFilter {
    /// Case-insensitive substring of the patient name.
    pub name_contains: Option<String>,
    pub mobility: Option<Mobility>,
}

impl PatientFilter {
    pub fn matches(&self, patient: &Patient) -> bool {
        if let Some(needle) = &self.name_contains {
            let needle = needle.to_lowercase();
            if !patient.details.name.to_lowercase().contains(&needle) {
                return false;
            }
        }
        self.mobility.map_or(true, |m| patient.details.mobility == m)
    }
}

// ── Staff ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffDetails {
    pub name: String,
    pub role: StaffRole,
    #[serde(default)]
    pub license_number: Option<String>,
    #[serde(default)]
    pub specialties: Vec<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    /// Free text, e.g. "Weekdays 08:00-16:00".
    #[serde(default)]
    pub availability: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl StaffDetails {
    pub fn new(name: impl Into<String>, role: StaffRole) -> Self {
        Self {
            name: name.into(),
            role,
            license_number: None,
            specialties: Vec::new(),
            phone: None,
            email: None,
            availability: None,
            notes: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Staff {
    pub id: i64,
    #[serde(flatten)]
    pub details: StaffDetails,
    pub created_by: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaffPatch {
    pub name: Option<String>,
    pub role: Option<StaffRole>,
    pub license_number: Option<String>,
    pub specialties: Option<Vec<String>>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub availability: Option<String>,
    pub notes: Option<String>,
}

impl StaffPatch {
    pub fn apply(self, mut base: StaffDetails) -> StaffDetails {
        if let Some(v) = self.name {
            base.name = v;
        }
        if let Some(v) = self.role {
            base.role = v;
        }
        patch_text(&mut base.license_number, self.license_number);
        if let Some(v) = self.specialties {
            base.specialties = v;
        }
        patch_text(&mut base.phone, self.phone);
        patch_text(&mut base.email, self.email);
        patch_text(&mut base.availability, self.availability);
        patch_text(&mut base.notes, self.notes);
        base
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaffFilter {
    pub role: Option<StaffRole>,
}

impl StaffFilter {
    pub fn matches(&self, staff: &Staff) -> bool {
        self.role.map_or(true, |r| staff.details.role == r)
    }
}

// ── Schedules ────────────────────────────────────────────────────────────────

/// A booked visit of one staff member to one patient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleDetails {
    pub patient_id: i64,
    pub staff_id: i64,
    /// Local wall-clock start; seconds are dropped on validation.
    pub start: NaiveDateTime,
    pub duration_minutes: u32,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub visit_type: VisitType,
    #[serde(default)]
    pub notes: Option<String>,
}

impl ScheduleDetails {
    pub fn new(patient_id: i64, staff_id: i64, start: NaiveDateTime, duration_minutes: u32) -> Self {
        Self {
            patient_id,
            staff_id,
            start,
            duration_minutes,
            priority: Priority::default(),
            visit_type: VisitType::default(),
            notes: None,
        }
    }

    pub fn end(&self) -> NaiveDateTime {
        self.start + Duration::minutes(i64::from(self.duration_minutes))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    pub id: i64,
    #[serde(flatten)]
    pub details: ScheduleDetails,
    pub created_by: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchedulePatch {
    pub patient_id: Option<i64>,
    pub staff_id: Option<i64>,
    pub start: Option<NaiveDateTime>,
    pub duration_minutes: Option<u32>,
    pub priority: Option<Priority>,
    pub visit_type: Option<VisitType>,
    pub notes: Option<String>,
}

impl SchedulePatch {
    pub fn apply(self, mut base: ScheduleDetails) -> ScheduleDetails {
        if let Some(v) = self.patient_id {
            base.patient_id = v;
        }
        if let Some(v) = self.staff_id {
            base.staff_id = v;
        }
        if let Some(v) = self.start {
            base.start = v;
        }
        if let Some(v) = self.duration_minutes {
            base.duration_minutes = v;
        }
        if let Some(v) = self.priority {
            base.priority = v;
        }
        if let Some(v) = self.visit_type {
            base.visit_type = v;
        }
        patch_text(&mut base.notes, self.notes);
        base
    }

    /// True when the patch re-points the visit at another patient or staff member.
    pub fn changes_references(&self) -> bool {
        self.patient_id.is_some() || self.staff_id.is_some()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScheduleFilter {
    pub patient_id: Option<i64>,
    pub staff_id: Option<i64>,
    /// Inclusive lower bound on start.
    pub from: Option<NaiveDateTime>,
    /// Exclusive upper bound on start.
    pub until: Option<NaiveDateTime>,
    pub min_priority: Option<Priority>,
}

impl ScheduleFilter {
    pub fn matches(&self, schedule: &Schedule) -> bool {
        let d = &schedule.details;
        self.patient_id.map_or(true, |id| d.patient_id == id)
            && self.staff_id.map_or(true, |id| d.staff_id == id)
            && self.from.map_or(true, |from| d.start >= from)
            && self.until.map_or(true, |until| d.start < until)
            && self.min_priority.map_or(true, |p| d.priority >= p)
    }
}

// ── Aggregates ───────────────────────────────────────────────────────────────

/// All records, each list ordered by id, read under one lock.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub patients: Vec<Patient>,
    pub staff: Vec<Staff>,
    pub schedules: Vec<Schedule>,
}

impl Snapshot {
    pub fn is_empty(&self) -> bool {
        self.patients.is_empty() && self.staff.is_empty() && self.schedules.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counts {
    pub patients: u64,
    pub staff: u64,
    pub schedules: u64,
}

fn patch_text(slot: &mut Option<String>, value: Option<String>) {
    if let Some(v) = value {
        *slot = Some(v);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 14)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn staff_role_accepts_rota_abbreviations() {
        assert_eq!("GP".parse::<StaffRole>().unwrap(), StaffRole::GeneralPractitioner);
        assert_eq!("care giver".parse::<StaffRole>().unwrap(), StaffRole::CareGiver);
        assert_eq!("Nurse".parse::<StaffRole>().unwrap(), StaffRole::Nurse);
        assert!("Surgeon".parse::<StaffRole>().is_err());
    }

    #[test]
    fn staff_role_serde_matches_display() {
        let json = serde_json::to_string(&StaffRole::RespiratoryTherapist).unwrap();
        assert_eq!(json, "\"Respiratory-Therapist\"");
        let back: StaffRole = serde_json::from_str("\"PT\"").unwrap();
        assert_eq!(back, StaffRole::PhysicalTherapist);
    }

    #[test]
    fn priority_is_ordered() {
        assert!(Priority::Low < Priority::Normal);
        assert!(Priority::High < Priority::Critical);
        assert_eq!(Priority::ALL.iter().max(), Some(&Priority::Critical));
    }

    #[test]
    fn visit_end_adds_duration() {
        let d = ScheduleDetails::new(1, 1, at(9, 45), 30);
        assert_eq!(d.end(), at(10, 15));
    }

    #[test]
    fn patient_patch_leaves_unpatched_fields() {
        let base = PatientDetails {
            name: "A. Said".into(),
            age: 70,
            allergies: vec!["Penicillin".into()],
            diagnosis: Some("COPD".into()),
            ..Default::default()
        };
        let patched = PatientPatch {
            age: Some(71),
            ..Default::default()
        }
        .apply(base.clone());

        assert_eq!(patched.age, 71);
        assert_eq!(patched.name, base.name);
        assert_eq!(patched.allergies, base.allergies);
        assert_eq!(patched.diagnosis, base.diagnosis);
    }

    #[test]
    fn schedule_filter_window_is_half_open() {
        let visit = Schedule {
            id: 1,
            details: ScheduleDetails::new(1, 2, at(10, 0), 30),
            created_by: "admin".into(),
            created_at: "2026-03-01T00:00:00+00:00".into(),
        };
        let inside = ScheduleFilter {
            from: Some(at(10, 0)),
            until: Some(at(11, 0)),
            ..Default::default()
        };
        let after = ScheduleFilter {
            until: Some(at(10, 0)),
            ..Default::default()
        };
        assert!(inside.matches(&visit));
        assert!(!after.matches(&visit));
    }
}
