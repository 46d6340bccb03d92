use homecare_core::EntityKind;
use homecare_records::Snapshot;
use tracing::debug;

use crate::columns::{self, Cell};
use crate::error::{ExportError, Result};

/// Render every record of `kind` as CSV: a header row of field names, then
/// one row per record in id order. An empty set yields the header row only.
pub fn to_csv(snapshot: &Snapshot, kind: EntityKind) -> Result<Vec<u8>> {
    let mut writer = ::csv::Writer::from_writer(Vec::new());
    writer.write_record(columns::headers(kind))?;
    let rows = columns::rows(snapshot, kind);
    for row in &rows {
        writer.write_record(row.iter().map(Cell::to_text))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| ExportError::Io(e.into_error()))?;
    debug!(%kind, rows = rows.len(), bytes = bytes.len(), "csv export rendered");
    Ok(bytes)
}
