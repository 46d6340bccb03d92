use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    /// A chart was asked to draw zero data points.
    #[error("Chart '{chart}' has no data points")]
    EmptyChart { chart: String },

    #[error("CSV error: {0}")]
    Csv(#[from] ::csv::Error),

    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] rust_xlsxwriter::XlsxError),

    /// Workbook could not be read back into records.
    #[error("Import error: {0}")]
    Import(String),

    /// Chart image or document assembly failed.
    #[error("Render error: {0}")]
    Render(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExportError {
    pub fn import(msg: impl Into<String>) -> Self {
        ExportError::Import(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, ExportError>;
