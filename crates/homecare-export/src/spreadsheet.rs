use homecare_core::EntityKind;
use homecare_records::Snapshot;
use rust_xlsxwriter::{Format, Workbook};
use tracing::debug;

use crate::columns::{self, Cell};
use crate::error::Result;

/// Build an xlsx workbook with one sheet per kind, named after the kind,
/// with a bold frozen header row. Kinds are written in the order given,
/// duplicates skipped; an empty kind gets a header-only sheet.
pub fn to_xlsx(snapshot: &Snapshot, kinds: &[EntityKind]) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();

    let mut written: Vec<EntityKind> = Vec::with_capacity(kinds.len());
    for &kind in kinds {
        if written.contains(&kind) {
            continue;
        }
        written.push(kind);

        let sheet = workbook.add_worksheet();
        sheet.set_name(kind.as_str())?;
        for (col, header) in columns::headers(kind).iter().enumerate() {
            sheet.write_string_with_format(0, col as u16, *header, &bold)?;
        }
        sheet.set_freeze_panes(1, 0)?;

        let rows = columns::rows(snapshot, kind);
        for (r, row) in rows.iter().enumerate() {
            let r = (r + 1) as u32;
            for (col, cell) in row.iter().enumerate() {
                let col = col as u16;
                match cell {
                    Cell::Int(n) => {
                        sheet.write_number(r, col, *n as f64)?;
                    }
                    Cell::Text(s) => {
                        sheet.write_string(r, col, s)?;
                    }
                    Cell::Blank => {}
                }
            }
        }
        debug!(%kind, rows = rows.len(), "worksheet written");
    }

    Ok(workbook.save_to_buffer()?)
}
