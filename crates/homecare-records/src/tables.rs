//! Row <-> struct mapping for the three entity tables.
//!
//! Column order in each `SELECT` constant matches the indices used by the
//! matching `from_row`; keep them together when adding a column.

use chrono::NaiveDateTime;
use homecare_core::EntityKind;
use rusqlite::{params, types::Type, Connection, Row};

use crate::error::Result;
use crate::types::{
    Patient, PatientDetails, Schedule, ScheduleDetails, Staff, StaffDetails, START_FORMAT,
};

pub(crate) trait Table: Sized {
    const KIND: EntityKind;
    /// `SELECT ... FROM <table>` without a WHERE clause.
    const SELECT: &'static str;

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;
}

impl Table for Patient {
    const KIND: EntityKind = EntityKind::Patients;
    const SELECT: &'static str = "SELECT id, name, age, gender, phone, email, address,
            emergency_contact, insurance_provider, insurance_number, diagnosis,
            allergies, medications, equipment, mobility, care_plan, notes,
            created_by, created_at
         FROM patients";

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Patient {
            id: row.get(0)?,
            details: PatientDetails {
                name: row.get(1)?,
                age: row.get(2)?,
                gender: row.get(3)?,
                phone: row.get(4)?,
                email: row.get(5)?,
                address: row.get(6)?,
                emergency_contact: row.get(7)?,
                insurance_provider: row.get(8)?,
                insurance_number: row.get(9)?,
                diagnosis: row.get(10)?,
                allergies: json_list(row, 11)?,
                medications: json_list(row, 12)?,
                equipment: json_list(row, 13)?,
                mobility: parsed(row, 14)?,
                care_plan: row.get(15)?,
                notes: row.get(16)?,
            },
            created_by: row.get(17)?,
            created_at: row.get(18)?,
        })
    }
}

impl Table for Staff {
    const KIND: EntityKind = EntityKind::Staff;
    const SELECT: &'static str = "SELECT id, name, role, license_number, specialties, phone,
            email, availability, notes, created_by, created_at
         FROM staff";

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Staff {
            id: row.get(0)?,
            details: StaffDetails {
                name: row.get(1)?,
                role: parsed(row, 2)?,
                license_number: row.get(3)?,
                specialties: json_list(row, 4)?,
                phone: row.get(5)?,
                email: row.get(6)?,
                availability: row.get(7)?,
                notes: row.get(8)?,
            },
            created_by: row.get(9)?,
            created_at: row.get(10)?,
        })
    }
}

impl Table for Schedule {
    const KIND: EntityKind = EntityKind::Schedules;
    const SELECT: &'static str = "SELECT id, patient_id, staff_id, start, duration_minutes,
            priority, visit_type, notes, created_by, created_at
         FROM schedules";

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let start: String = row.get(3)?;
        let start = NaiveDateTime::parse_from_str(&start, START_FORMAT)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e)))?;
        Ok(Schedule {
            id: row.get(0)?,
            details: ScheduleDetails {
                patient_id: row.get(1)?,
                staff_id: row.get(2)?,
                start,
                duration_minutes: row.get(4)?,
                priority: parsed(row, 5)?,
                visit_type: parsed(row, 6)?,
                notes: row.get(7)?,
            },
            created_by: row.get(8)?,
            created_at: row.get(9)?,
        })
    }
}

/// Fetch one row by id, `None` when absent.
pub(crate) fn fetch_one<T: Table>(conn: &Connection, id: i64) -> Result<Option<T>> {
    let sql = format!("{} WHERE id = ?1", T::SELECT);
    match conn.query_row(&sql, params![id], T::from_row) {
        Ok(record) => Ok(Some(record)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Fetch every row ordered by id. A row that fails to decode fails the
/// whole read: a corrupted store must not be silently truncated.
pub(crate) fn fetch_all<T: Table>(conn: &Connection) -> Result<Vec<T>> {
    let sql = format!("{} ORDER BY id", T::SELECT);
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], T::from_row)?;
    let records = rows.collect::<rusqlite::Result<Vec<T>>>()?;
    Ok(records)
}

pub(crate) fn exists(conn: &Connection, kind: EntityKind, id: i64) -> Result<bool> {
    let sql = format!("SELECT EXISTS(SELECT 1 FROM {} WHERE id = ?1)", kind.as_str());
    let found: bool = conn.query_row(&sql, params![id], |row| row.get(0))?;
    Ok(found)
}

pub(crate) fn count(conn: &Connection, kind: EntityKind) -> Result<u64> {
    let sql = format!("SELECT COUNT(*) FROM {}", kind.as_str());
    let n: i64 = conn.query_row(&sql, [], |row| row.get(0))?;
    Ok(n as u64)
}

/// Visits pointing at a patient or staff member.
pub(crate) fn referencing_schedules(conn: &Connection, kind: EntityKind, id: i64) -> Result<i64> {
    let column = match kind {
        EntityKind::Patients => "patient_id",
        EntityKind::Staff => "staff_id",
        EntityKind::Schedules => return Ok(0),
    };
    let sql = format!("SELECT COUNT(*) FROM schedules WHERE {column} = ?1");
    let n: i64 = conn.query_row(&sql, params![id], |row| row.get(0))?;
    Ok(n)
}

pub(crate) fn delete(conn: &Connection, kind: EntityKind, id: i64) -> Result<usize> {
    let sql = format!("DELETE FROM {} WHERE id = ?1", kind.as_str());
    Ok(conn.execute(&sql, params![id])?)
}

// ── writes ───────────────────────────────────────────────────────────────────

pub(crate) fn insert_patient(
    conn: &Connection,
    id: i64,
    p: &PatientDetails,
    created_by: &str,
    created_at: &str,
) -> rusqlite::Result<usize> {
    conn.execute(
        "INSERT INTO patients
         (id, name, age, gender, phone, email, address, emergency_contact,
          insurance_provider, insurance_number, diagnosis, allergies, medications,
          equipment, mobility, care_plan, notes, created_by, created_at)
         VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14,?15,?16,?17,?18,?19)",
        params![
            id,
            p.name,
            p.age,
            p.gender,
            p.phone,
            p.email,
            p.address,
            p.emergency_contact,
            p.insurance_provider,
            p.insurance_number,
            p.diagnosis,
            to_json(&p.allergies),
            to_json(&p.medications),
            to_json(&p.equipment),
            p.mobility.as_str(),
            p.care_plan,
            p.notes,
            created_by,
            created_at,
        ],
    )
}

pub(crate) fn update_patient(conn: &Connection, id: i64, p: &PatientDetails) -> Result<usize> {
    let n = conn.execute(
        "UPDATE patients SET
            name = ?2, age = ?3, gender = ?4, phone = ?5, email = ?6, address = ?7,
            emergency_contact = ?8, insurance_provider = ?9, insurance_number = ?10,
            diagnosis = ?11, allergies = ?12, medications = ?13, equipment = ?14,
            mobility = ?15, care_plan = ?16, notes = ?17
         WHERE id = ?1",
        params![
            id,
            p.name,
            p.age,
            p.gender,
            p.phone,
            p.email,
            p.address,
            p.emergency_contact,
            p.insurance_provider,
            p.insurance_number,
            p.diagnosis,
            to_json(&p.allergies),
            to_json(&p.medications),
            to_json(&p.equipment),
            p.mobility.as_str(),
            p.care_plan,
            p.notes,
        ],
    )?;
    Ok(n)
}

pub(crate) fn insert_staff(
    conn: &Connection,
    id: i64,
    s: &StaffDetails,
    created_by: &str,
    created_at: &str,
) -> rusqlite::Result<usize> {
    conn.execute(
        "INSERT INTO staff
         (id, name, role, license_number, specialties, phone, email, availability,
          notes, created_by, created_at)
         VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11)",
        params![
            id,
            s.name,
            s.role.as_str(),
            s.license_number,
            to_json(&s.specialties),
            s.phone,
            s.email,
            s.availability,
            s.notes,
            created_by,
            created_at,
        ],
    )
}

pub(crate) fn update_staff(conn: &Connection, id: i64, s: &StaffDetails) -> Result<usize> {
    let n = conn.execute(
        "UPDATE staff SET
            name = ?2, role = ?3, license_number = ?4, specialties = ?5, phone = ?6,
            email = ?7, availability = ?8, notes = ?9
         WHERE id = ?1",
        params![
            id,
            s.name,
            s.role.as_str(),
            s.license_number,
            to_json(&s.specialties),
            s.phone,
            s.email,
            s.availability,
            s.notes,
        ],
    )?;
    Ok(n)
}

pub(crate) fn insert_schedule(
    conn: &Connection,
    id: i64,
    v: &ScheduleDetails,
    created_by: &str,
    created_at: &str,
) -> rusqlite::Result<usize> {
    conn.execute(
        "INSERT INTO schedules
         (id, patient_id, staff_id, start, duration_minutes, priority, visit_type,
          notes, created_by, created_at)
         VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10)",
        params![
            id,
            v.patient_id,
            v.staff_id,
            v.start.format(START_FORMAT).to_string(),
            v.duration_minutes,
            v.priority.as_str(),
            v.visit_type.as_str(),
            v.notes,
            created_by,
            created_at,
        ],
    )
}

pub(crate) fn update_schedule(conn: &Connection, id: i64, v: &ScheduleDetails) -> Result<usize> {
    let n = conn.execute(
        "UPDATE schedules SET
            patient_id = ?2, staff_id = ?3, start = ?4, duration_minutes = ?5,
            priority = ?6, visit_type = ?7, notes = ?8
         WHERE id = ?1",
        params![
            id,
            v.patient_id,
            v.staff_id,
            v.start.format(START_FORMAT).to_string(),
            v.duration_minutes,
            v.priority.as_str(),
            v.visit_type.as_str(),
            v.notes,
        ],
    )?;
    Ok(n)
}

// ── column helpers ───────────────────────────────────────────────────────────

fn to_json(items: &[String]) -> String {
    // Serialising a slice of strings cannot fail.
    serde_json::to_string(items).unwrap_or_else(|_| "[]".to_string())
}

fn json_list(row: &Row<'_>, idx: usize) -> rusqlite::Result<Vec<String>> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn parsed<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: std::str::FromStr<Err = String>,
{
    let raw: String = row.get(idx)?;
    raw.parse()
        .map_err(|e: String| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, e.into()))
}
