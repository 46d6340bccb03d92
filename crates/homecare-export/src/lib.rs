//! `homecare-export`: turns a store [`Snapshot`](homecare_records::Snapshot)
//! into files operators take away.
//!
//! | Format       | Entry point                     | Notes                                 |
//! |--------------|---------------------------------|---------------------------------------|
//! | CSV          | [`csv::to_csv`]                 | one kind per file, header row always  |
//! | xlsx         | [`spreadsheet::to_xlsx`]        | one sheet per kind                    |
//! | xlsx → store | [`import::from_xlsx`]           | inverse of `to_xlsx`                  |
//! | docx         | [`report::build_report`]        | tables plus PNG bar charts            |
//!
//! Exports only read the snapshot they are given.

pub mod chart;
pub mod columns;
pub mod csv;
pub mod error;
pub mod import;
pub mod report;
pub mod spreadsheet;

pub use error::{ExportError, Result};
pub use report::ReportOptions;
