//! Flat column layout shared by the CSV and spreadsheet formats.
//!
//! Headers are the record field names. List fields are joined into one cell
//! with `"; "`; absent optional text is an empty cell. `created_by` and
//! `created_at` are always the last two columns and never empty.

use chrono::NaiveDateTime;
use homecare_core::EntityKind;
use homecare_records::types::START_FORMAT;
use homecare_records::validation::{join_list, parse_age, split_list};
use homecare_records::{
    Patient, PatientDetails, Schedule, ScheduleDetails, Snapshot, Staff, StaffDetails,
};

/// One output cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Int(i64),
    Text(String),
    Blank,
}

impl Cell {
    fn opt(value: &Option<String>) -> Self {
        value.clone().map_or(Cell::Blank, Cell::Text)
    }

    fn list(items: &[String]) -> Self {
        if items.is_empty() {
            Cell::Blank
        } else {
            Cell::Text(join_list(items))
        }
    }

    /// Text rendering for formats without typed cells.
    pub fn to_text(&self) -> String {
        match self {
            Cell::Int(n) => n.to_string(),
            Cell::Text(s) => s.clone(),
            Cell::Blank => String::new(),
        }
    }
}

/// A record type that can be written as one table row and read back.
pub trait Tabular: Sized {
    const KIND: EntityKind;
    const HEADERS: &'static [&'static str];

    fn cells(&self) -> Vec<Cell>;

    /// Rebuild from the text of each cell, in `HEADERS` order. Errors name
    /// the offending column.
    fn from_texts(texts: &[String]) -> Result<Self, String>;

    fn rows(snapshot: &Snapshot) -> &[Self];
}

impl Tabular for Patient {
    const KIND: EntityKind = EntityKind::Patients;
    const HEADERS: &'static [&'static str] = &[
        "id",
        "name",
        "age",
        "gender",
        "phone",
        "email",
        "address",
        "emergency_contact",
        "insurance_provider",
        "insurance_number",
        "diagnosis",
        "allergies",
        "medications",
        "equipment",
        "mobility",
        "care_plan",
        "notes",
        "created_by",
        "created_at",
    ];

    fn cells(&self) -> Vec<Cell> {
        let d = &self.details;
        vec![
            Cell::Int(self.id),
            Cell::Text(d.name.clone()),
            Cell::Int(i64::from(d.age)),
            Cell::opt(&d.gender),
            Cell::opt(&d.phone),
            Cell::opt(&d.email),
            Cell::opt(&d.address),
            Cell::opt(&d.emergency_contact),
            Cell::opt(&d.insurance_provider),
            Cell::opt(&d.insurance_number),
            Cell::opt(&d.diagnosis),
            Cell::list(&d.allergies),
            Cell::list(&d.medications),
            Cell::list(&d.equipment),
            Cell::Text(d.mobility.to_string()),
            Cell::opt(&d.care_plan),
            Cell::opt(&d.notes),
            Cell::Text(self.created_by.clone()),
            Cell::Text(self.created_at.clone()),
        ]
    }

    fn from_texts(t: &[String]) -> Result<Self, String> {
        let r = Reader::new(Self::HEADERS, t)?;
        Ok(Patient {
            id: r.id(0)?,
            details: PatientDetails {
                name: r.text(1),
                age: parse_age(&t[2]).map_err(|e| r.column_error(2, e))?,
                gender: r.opt(3),
                phone: r.opt(4),
                email: r.opt(5),
                address: r.opt(6),
                emergency_contact: r.opt(7),
                insurance_provider: r.opt(8),
                insurance_number: r.opt(9),
                diagnosis: r.opt(10),
                allergies: split_list(&t[11]),
                medications: split_list(&t[12]),
                equipment: split_list(&t[13]),
                mobility: r.parse(14)?,
                care_plan: r.opt(15),
                notes: r.opt(16),
            },
            created_by: r.text(17),
            created_at: r.text(18),
        })
    }

    fn rows(snapshot: &Snapshot) -> &[Self] {
        &snapshot.patients
    }
}

impl Tabular for Staff {
    const KIND: EntityKind = EntityKind::Staff;
    const HEADERS: &'static [&'static str] = &[
        "id",
        "name",
        "role",
        "license_number",
        "specialties",
        "phone",
        "email",
        "availability",
        "notes",
        "created_by",
        "created_at",
    ];

    fn cells(&self) -> Vec<Cell> {
        let d = &self.details;
        vec![
            Cell::Int(self.id),
            Cell::Text(d.name.clone()),
            Cell::Text(d.role.to_string()),
            Cell::opt(&d.license_number),
            Cell::list(&d.specialties),
            Cell::opt(&d.phone),
            Cell::opt(&d.email),
            Cell::opt(&d.availability),
            Cell::opt(&d.notes),
            Cell::Text(self.created_by.clone()),
            Cell::Text(self.created_at.clone()),
        ]
    }

    fn from_texts(t: &[String]) -> Result<Self, String> {
        let r = Reader::new(Self::HEADERS, t)?;
        Ok(Staff {
            id: r.id(0)?,
            details: StaffDetails {
                name: r.text(1),
                role: r.parse(2)?,
                license_number: r.opt(3),
                specialties: split_list(&t[4]),
                phone: r.opt(5),
                email: r.opt(6),
                availability: r.opt(7),
                notes: r.opt(8),
            },
            created_by: r.text(9),
            created_at: r.text(10),
        })
    }

    fn rows(snapshot: &Snapshot) -> &[Self] {
        &snapshot.staff
    }
}

impl Tabular for Schedule {
    const KIND: EntityKind = EntityKind::Schedules;
    const HEADERS: &'static [&'static str] = &[
        "id",
        "patient_id",
        "staff_id",
        "start",
        "duration_minutes",
        "priority",
        "visit_type",
        "notes",
        "created_by",
        "created_at",
    ];

    fn cells(&self) -> Vec<Cell> {
        let d = &self.details;
        vec![
            Cell::Int(self.id),
            Cell::Int(d.patient_id),
            Cell::Int(d.staff_id),
            Cell::Text(d.start.format(START_FORMAT).to_string()),
            Cell::Int(i64::from(d.duration_minutes)),
            Cell::Text(d.priority.to_string()),
            Cell::Text(d.visit_type.to_string()),
            Cell::opt(&d.notes),
            Cell::Text(self.created_by.clone()),
            Cell::Text(self.created_at.clone()),
        ]
    }

    fn from_texts(t: &[String]) -> Result<Self, String> {
        let r = Reader::new(Self::HEADERS, t)?;
        let start = NaiveDateTime::parse_from_str(t[3].trim(), START_FORMAT)
            .map_err(|e| r.column_error(3, e))?;
        let duration = r.id(4)?;
        Ok(Schedule {
            id: r.id(0)?,
            details: ScheduleDetails {
                patient_id: r.id(1)?,
                staff_id: r.id(2)?,
                start,
                duration_minutes: u32::try_from(duration).map_err(|e| r.column_error(4, e))?,
                priority: r.parse(5)?,
                visit_type: r.parse(6)?,
                notes: r.opt(7),
            },
            created_by: r.text(8),
            created_at: r.text(9),
        })
    }

    fn rows(snapshot: &Snapshot) -> &[Self] {
        &snapshot.schedules
    }
}

/// Header row for `kind`.
pub fn headers(kind: EntityKind) -> &'static [&'static str] {
    match kind {
        EntityKind::Patients => Patient::HEADERS,
        EntityKind::Staff => Staff::HEADERS,
        EntityKind::Schedules => Schedule::HEADERS,
    }
}

/// Cell rows for every record of `kind`, in id order.
pub fn rows(snapshot: &Snapshot, kind: EntityKind) -> Vec<Vec<Cell>> {
    fn collect<T: Tabular>(snapshot: &Snapshot) -> Vec<Vec<Cell>> {
        T::rows(snapshot).iter().map(T::cells).collect()
    }
    match kind {
        EntityKind::Patients => collect::<Patient>(snapshot),
        EntityKind::Staff => collect::<Staff>(snapshot),
        EntityKind::Schedules => collect::<Schedule>(snapshot),
    }
}

struct Reader<'a> {
    headers: &'static [&'static str],
    texts: &'a [String],
}

impl<'a> Reader<'a> {
    fn new(headers: &'static [&'static str], texts: &'a [String]) -> Result<Self, String> {
        if texts.len() != headers.len() {
            return Err(format!(
                "expected {} columns, found {}",
                headers.len(),
                texts.len()
            ));
        }
        Ok(Self { headers, texts })
    }

    fn column_error(&self, idx: usize, e: impl std::fmt::Display) -> String {
        format!("column '{}': {e}", self.headers[idx])
    }

    fn text(&self, idx: usize) -> String {
        self.texts[idx].trim().to_string()
    }

    fn opt(&self, idx: usize) -> Option<String> {
        Some(self.text(idx)).filter(|s| !s.is_empty())
    }

    fn id(&self, idx: usize) -> Result<i64, String> {
        let raw = self.texts[idx].trim();
        // Numeric spreadsheet cells may come back as "12.0".
        raw.strip_suffix(".0")
            .unwrap_or(raw)
            .parse::<i64>()
            .map_err(|e| self.column_error(idx, format!("{e} ({raw:?})")))
    }

    fn parse<T>(&self, idx: usize) -> Result<T, String>
    where
        T: std::str::FromStr<Err = String>,
    {
        self.texts[idx].parse().map_err(|e| self.column_error(idx, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use homecare_records::{Mobility, StaffRole};

    #[test]
    fn header_count_matches_cells() {
        let p = Patient {
            id: 1,
            details: PatientDetails {
                name: "A. Said".into(),
                age: 70,
                ..Default::default()
            },
            created_by: "admin".into(),
            created_at: "2026-01-01T00:00:00+00:00".into(),
        };
        assert_eq!(p.cells().len(), Patient::HEADERS.len());

        let s = Staff {
            id: 1,
            details: StaffDetails::new("N. Ali", StaffRole::Nurse),
            created_by: "admin".into(),
            created_at: "x".into(),
        };
        assert_eq!(s.cells().len(), Staff::HEADERS.len());
    }

    #[test]
    fn patient_row_reads_back() {
        let p = Patient {
            id: 4,
            details: PatientDetails {
                name: "A. Said".into(),
                age: 70,
                allergies: vec!["Penicillin".into(), "Latex".into()],
                mobility: Mobility::Wheelchair,
                diagnosis: Some("COPD".into()),
                ..Default::default()
            },
            created_by: "doctor".into(),
            created_at: "2026-01-01T00:00:00+00:00".into(),
        };
        let texts: Vec<String> = p.cells().iter().map(Cell::to_text).collect();
        assert_eq!(texts[11], "Penicillin; Latex");
        assert_eq!(Patient::from_texts(&texts).unwrap(), p);
    }

    #[test]
    fn bad_cell_names_its_column() {
        let mut texts: Vec<String> = vec![String::new(); Staff::HEADERS.len()];
        texts[0] = "1".into();
        texts[1] = "N. Ali".into();
        texts[2] = "Surgeon".into();
        let err = Staff::from_texts(&texts).unwrap_err();
        assert!(err.contains("'role'"), "{err}");
    }
}
