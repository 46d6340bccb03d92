use std::io::Cursor;

use calamine::{open_workbook_from_rs, Data, Range, Reader, Xlsx};
use homecare_core::EntityKind;
use homecare_records::{Patient, Schedule, Snapshot, Staff};
use tracing::{info, warn};

use crate::columns::Tabular;
use crate::error::{ExportError, Result};

/// Read a workbook written by [`crate::spreadsheet::to_xlsx`] back into
/// records. Sheets are matched by kind name; a missing sheet yields an empty
/// list and unrecognised sheets are skipped. Rows keep their identifiers.
pub fn from_xlsx(bytes: &[u8]) -> Result<Snapshot> {
    let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes))
        .map_err(|e| ExportError::import(format!("not a readable workbook: {e}")))?;

    let mut snapshot = Snapshot::default();
    for name in workbook.sheet_names() {
        let Ok(kind) = name.parse::<EntityKind>() else {
            warn!(sheet = %name, "skipping unrecognised worksheet");
            continue;
        };
        if kind.as_str() != name {
            warn!(sheet = %name, "skipping worksheet with non-canonical name");
            continue;
        }
        let range = workbook
            .worksheet_range(&name)
            .map_err(|e| ExportError::import(format!("sheet '{name}': {e}")))?;
        match kind {
            EntityKind::Patients => snapshot.patients = read_sheet::<Patient>(&range)?,
            EntityKind::Staff => snapshot.staff = read_sheet::<Staff>(&range)?,
            EntityKind::Schedules => snapshot.schedules = read_sheet::<Schedule>(&range)?,
        }
    }

    info!(
        patients = snapshot.patients.len(),
        staff = snapshot.staff.len(),
        schedules = snapshot.schedules.len(),
        "workbook imported"
    );
    Ok(snapshot)
}

fn read_sheet<T: Tabular>(range: &Range<Data>) -> Result<Vec<T>> {
    let sheet = T::KIND.as_str();
    let mut rows = range.rows();

    let header: Vec<String> = rows
        .next()
        .map(|r| r.iter().map(cell_text).collect())
        .unwrap_or_default();
    if header != T::HEADERS {
        return Err(ExportError::import(format!(
            "sheet '{sheet}': header row does not match; expected {:?}, found {header:?}",
            T::HEADERS
        )));
    }

    let mut out = Vec::new();
    for (i, row) in rows.enumerate() {
        let mut texts: Vec<String> = row.iter().map(cell_text).collect();
        if texts.iter().all(String::is_empty) {
            continue;
        }
        texts.resize(T::HEADERS.len(), String::new());
        let record = T::from_texts(&texts)
            // +2: one-based, after the header row
            .map_err(|e| ExportError::import(format!("sheet '{sheet}' row {}: {e}", i + 2)))?;
        out.push(record);
    }
    Ok(out)
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) if f.fract() == 0.0 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::Int(n) => n.to_string(),
        Data::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}
