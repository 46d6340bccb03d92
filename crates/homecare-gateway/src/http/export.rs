//! File downloads: CSV per entity kind, a multi-sheet workbook and the
//! Word report.

use std::sync::Arc;

use axum::{extract::State, http::header, response::IntoResponse};
use homecare_core::EntityKind;
use serde::Deserialize;
use tracing::info;

use crate::app::AppState;
use crate::error::{Result, ServiceError};
use crate::http::{
    blocking,
    extract::{PathParam, QueryParams},
};
use crate::service::Caller;

const CSV_TYPE: &str = "text/csv; charset=utf-8";
const XLSX_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
const DOCX_TYPE: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

#[derive(Debug, Default, Deserialize)]
pub struct ExportQuery {
    /// Comma-separated entity kinds; all three when absent.
    pub kinds: Option<String>,
    /// Report only: embed charts (default true).
    pub charts: Option<bool>,
}

fn parse_kind(raw: &str) -> Result<EntityKind> {
    raw.parse().map_err(ServiceError::BadRequest)
}

/// Parse `?kinds=`, keeping first occurrence order and dropping repeats.
fn parse_kinds(raw: Option<&str>) -> Result<Vec<EntityKind>> {
    let Some(raw) = raw.filter(|r| !r.trim().is_empty()) else {
        return Ok(EntityKind::ALL.to_vec());
    };
    let mut kinds = Vec::new();
    for part in raw.split(',').filter(|p| !p.trim().is_empty()) {
        let kind = parse_kind(part)?;
        if !kinds.contains(&kind) {
            kinds.push(kind);
        }
    }
    Ok(kinds)
}

fn attachment(
    content_type: &'static str,
    filename: String,
    body: Vec<u8>,
) -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body,
    )
}

/// GET /export/csv/{kind}
pub async fn csv_handler(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    PathParam(kind): PathParam<String>,
) -> Result<impl IntoResponse> {
    let kind = parse_kind(&kind)?;
    let body = {
        let (state, caller) = (Arc::clone(&state), caller.clone());
        blocking(move || state.service.export_csv(&caller, kind)).await?
    };
    info!(username = %caller.username, %kind, bytes = body.len(), "csv export");
    Ok(attachment(CSV_TYPE, format!("{kind}.csv"), body))
}

/// GET /export/xlsx?kinds=patients,staff
pub async fn xlsx_handler(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    QueryParams(query): QueryParams<ExportQuery>,
) -> Result<impl IntoResponse> {
    let kinds = parse_kinds(query.kinds.as_deref())?;
    let sheets = kinds.len();
    let body = {
        let (state, caller) = (Arc::clone(&state), caller.clone());
        blocking(move || state.service.export_xlsx(&caller, &kinds)).await?
    };
    info!(username = %caller.username, sheets, bytes = body.len(), "xlsx export");
    Ok(attachment(XLSX_TYPE, "homecare.xlsx".to_string(), body))
}

/// GET /export/report?kinds=&charts=false
pub async fn report_handler(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    QueryParams(query): QueryParams<ExportQuery>,
) -> Result<impl IntoResponse> {
    let kinds = parse_kinds(query.kinds.as_deref())?;
    let charts = query.charts.unwrap_or(true);
    let body = {
        let (state, caller) = (Arc::clone(&state), caller.clone());
        blocking(move || state.service.export_report(&caller, kinds, charts)).await?
    };
    info!(username = %caller.username, charts, bytes = body.len(), "report export");
    Ok(attachment(DOCX_TYPE, "homecare-report.docx".to_string(), body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_default_to_all() {
        assert_eq!(parse_kinds(None).unwrap(), EntityKind::ALL.to_vec());
        assert_eq!(parse_kinds(Some(" ")).unwrap(), EntityKind::ALL.to_vec());
    }

    #[test]
    fn kinds_keep_order_and_drop_repeats() {
        let kinds = parse_kinds(Some("staff,patients,staff")).unwrap();
        assert_eq!(kinds, vec![EntityKind::Staff, EntityKind::Patients]);
    }

    #[test]
    fn unknown_kind_is_a_bad_request() {
        let err = parse_kinds(Some("patients,invoices")).unwrap_err();
        assert_eq!(err.code(), "BAD_REQUEST");
    }
}
