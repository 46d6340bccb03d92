//! Field-level checks applied to every create and update payload before it
//! reaches SQL. Each entry point returns the normalised value: text trimmed,
//! blank optional text turned into `None`, blank list items dropped.

use chrono::Timelike;

use crate::error::{RecordError, Result};
use crate::types::{PatientDetails, ScheduleDetails, StaffDetails};

const MAX_NAME_LEN: usize = 120;
const MAX_TEXT_LEN: usize = 4000;
const MAX_LIST_ITEMS: usize = 64;
const MAX_AGE: u32 = 130;
const MAX_DURATION_MINUTES: u32 = 24 * 60;

/// Separator used when a list is flattened into one CSV/spreadsheet cell.
pub const LIST_SEPARATOR: &str = "; ";

pub fn patient(mut p: PatientDetails) -> Result<PatientDetails> {
    p.name = required_name("name", &p.name)?;
    if p.age > MAX_AGE {
        return Err(RecordError::validation(format!(
            "age must be between 0 and {MAX_AGE}, got {}",
            p.age
        )));
    }
    p.gender = optional_text("gender", p.gender)?;
    p.phone = optional_text("phone", p.phone)?;
    p.email = email(p.email)?;
    p.address = optional_text("address", p.address)?;
    p.emergency_contact = optional_text("emergency_contact", p.emergency_contact)?;
    p.insurance_provider = optional_text("insurance_provider", p.insurance_provider)?;
    p.insurance_number = optional_text("insurance_number", p.insurance_number)?;
    p.diagnosis = optional_text("diagnosis", p.diagnosis)?;
    p.allergies = list("allergies", p.allergies)?;
    p.medications = list("medications", p.medications)?;
    p.equipment = list("equipment", p.equipment)?;
    p.care_plan = optional_text("care_plan", p.care_plan)?;
    p.notes = optional_text("notes", p.notes)?;
    Ok(p)
}

pub fn staff(mut s: StaffDetails) -> Result<StaffDetails> {
    s.name = required_name("name", &s.name)?;
    s.license_number = optional_text("license_number", s.license_number)?;
    s.specialties = list("specialties", s.specialties)?;
    s.phone = optional_text("phone", s.phone)?;
    s.email = email(s.email)?;
    s.availability = optional_text("availability", s.availability)?;
    s.notes = optional_text("notes", s.notes)?;
    Ok(s)
}

/// Shape checks only; whether the patient and staff member exist is checked
/// by the store inside the write transaction.
pub fn schedule(mut v: ScheduleDetails) -> Result<ScheduleDetails> {
    if v.patient_id <= 0 || v.staff_id <= 0 {
        return Err(RecordError::validation(
            "patient_id and staff_id must be positive identifiers",
        ));
    }
    if !(1..=MAX_DURATION_MINUTES).contains(&v.duration_minutes) {
        return Err(RecordError::validation(format!(
            "duration_minutes must be between 1 and {MAX_DURATION_MINUTES}, got {}",
            v.duration_minutes
        )));
    }
    // Minute precision: storage format has no seconds.
    v.start = v
        .start
        .with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .ok_or_else(|| RecordError::validation("start time is out of range"))?;
    v.notes = optional_text("notes", v.notes)?;
    Ok(v)
}

/// Parse a form/cell value as an age in whole years.
pub fn parse_age(raw: &str) -> Result<u32> {
    let raw = raw.trim();
    // Spreadsheet cells come back as floats ("70" or "70.0").
    let as_int = raw.strip_suffix(".0").unwrap_or(raw);
    as_int
        .parse::<u32>()
        .map_err(|_| RecordError::validation(format!("age must be a whole number, got {raw:?}")))
}

/// Join list items for a single tabular cell.
pub fn join_list(items: &[String]) -> String {
    items.join(LIST_SEPARATOR)
}

/// Inverse of [`join_list`].
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn required_name(field: &str, value: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(RecordError::validation(format!("{field} is required")));
    }
    if value.chars().count() > MAX_NAME_LEN {
        return Err(RecordError::validation(format!(
            "{field} is longer than {MAX_NAME_LEN} characters"
        )));
    }
    if value.chars().any(char::is_control) {
        return Err(RecordError::validation(format!(
            "{field} contains control characters"
        )));
    }
    Ok(value.to_string())
}

fn optional_text(field: &str, value: Option<String>) -> Result<Option<String>> {
    let Some(value) = value else {
        return Ok(None);
    };
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    if value.chars().count() > MAX_TEXT_LEN {
        return Err(RecordError::validation(format!(
            "{field} is longer than {MAX_TEXT_LEN} characters"
        )));
    }
    Ok(Some(value.to_string()))
}

fn email(value: Option<String>) -> Result<Option<String>> {
    let value = optional_text("email", value)?;
    if let Some(addr) = &value {
        let valid = addr
            .split_once('@')
            .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'))
            && !addr.contains(char::is_whitespace);
        if !valid {
            return Err(RecordError::validation(format!("email is malformed: {addr}")));
        }
    }
    Ok(value)
}

fn list(field: &str, items: Vec<String>) -> Result<Vec<String>> {
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        let item = item.trim();
        if item.is_empty() {
            continue;
        }
        // Items are joined with ';' in tabular exports.
        if item.contains([';', '\n', '\r']) {
            return Err(RecordError::validation(format!(
                "{field} items cannot contain ';' or line breaks: {item:?}"
            )));
        }
        out.push(item.to_string());
    }
    if out.len() > MAX_LIST_ITEMS {
        return Err(RecordError::validation(format!(
            "{field} has more than {MAX_LIST_ITEMS} items"
        )));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StaffRole;
    use chrono::NaiveDate;

    fn patient_named(name: &str) -> PatientDetails {
        PatientDetails {
            name: name.to_string(),
            age: 70,
            ..Default::default()
        }
    }

    #[test]
    fn blank_name_is_rejected() {
        let err = patient(patient_named("   ")).unwrap_err();
        assert!(matches!(err, RecordError::Validation(_)));
    }

    #[test]
    fn text_is_trimmed_and_blank_optionals_dropped() {
        let mut p = patient_named("  A. Said ");
        p.diagnosis = Some("   ".into());
        p.phone = Some(" 0123 ".into());
        p.allergies = vec![" Penicillin ".into(), "".into()];

        let p = patient(p).unwrap();
        assert_eq!(p.name, "A. Said");
        assert_eq!(p.diagnosis, None);
        assert_eq!(p.phone.as_deref(), Some("0123"));
        assert_eq!(p.allergies, vec!["Penicillin".to_string()]);
    }

    #[test]
    fn implausible_age_is_rejected() {
        let mut p = patient_named("Old");
        p.age = 200;
        assert!(patient(p).is_err());
    }

    #[test]
    fn non_numeric_age_is_a_validation_error() {
        assert_eq!(parse_age("70").unwrap(), 70);
        assert_eq!(parse_age("70.0").unwrap(), 70);
        assert!(matches!(parse_age("seventy"), Err(RecordError::Validation(_))));
        assert!(parse_age("-3").is_err());
    }

    #[test]
    fn list_items_cannot_contain_separator() {
        let mut s = StaffDetails::new("N. Ali", StaffRole::Nurse);
        s.specialties = vec!["wound; care".into()];
        assert!(staff(s).is_err());
    }

    #[test]
    fn malformed_email_is_rejected() {
        let mut s = StaffDetails::new("N. Ali", StaffRole::Nurse);
        s.email = Some("not-an-address".into());
        assert!(staff(s).is_err());

        let mut s = StaffDetails::new("N. Ali", StaffRole::Nurse);
        s.email = Some("n.ali@clinic.example".into());
        assert!(staff(s).is_ok());
    }

    #[test]
    fn schedule_drops_seconds_and_bounds_duration() {
        let start = NaiveDate::from_ymd_opt(2026, 1, 5)
            .unwrap()
            .and_hms_opt(9, 30, 42)
            .unwrap();
        let v = schedule(ScheduleDetails::new(1, 2, start, 30)).unwrap();
        assert_eq!(v.start, start.with_second(0).unwrap());

        assert!(schedule(ScheduleDetails::new(1, 2, start, 0)).is_err());
        assert!(schedule(ScheduleDetails::new(1, 2, start, 24 * 60 + 1)).is_err());
        assert!(schedule(ScheduleDetails::new(0, 2, start, 30)).is_err());
    }

    #[test]
    fn list_join_and_split_are_inverse() {
        let items = vec!["Oxygen concentrator".to_string(), "Walker".to_string()];
        assert_eq!(split_list(&join_list(&items)), items);
        assert!(split_list("").is_empty());
    }
}
