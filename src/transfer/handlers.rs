use axum::{
    extract::{DefaultBodyLimit, Multipart, Query, State},
    http::{header, HeaderMap, HeaderValue},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use time::OffsetDateTime;
use tracing::instrument;

use crate::{
    auth::services::AuthUser,
    dates::parse_iso_date,
    error::ApiError,
    state::AppState,
    transfer::{pdf, repo, service, service::ImportSummary},
};

const MAX_IMPORT_BYTES: usize = 5 * 1024 * 1024;

pub fn transfer_routes() -> Router<AppState> {
    Router::new()
        .route("/export/csv", get(export_csv))
        .route("/export/pdf", get(export_pdf))
        .route(
            "/import/csv",
            post(import_csv).layer(DefaultBodyLimit::max(MAX_IMPORT_BYTES)),
        )
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

fn parse_range(
    q: &ExportQuery,
) -> Result<(Option<OffsetDateTime>, Option<OffsetDateTime>), ApiError> {
    let start = match &q.start_date {
        Some(s) => Some(
            parse_iso_date(s)
                .ok_or_else(|| ApiError::validation("startDate must be YYYY-MM-DD"))?
                .midnight()
                .assume_utc(),
        ),
        None => None,
    };
    let end = match &q.end_date {
        Some(s) => {
            let d = parse_iso_date(s)
                .ok_or_else(|| ApiError::validation("endDate must be YYYY-MM-DD"))?;
            let next = d
                .next_day()
                .ok_or_else(|| ApiError::validation("endDate out of range"))?;
            Some(next.midnight().assume_utc())
        }
        None => None,
    };
    Ok((start, end))
}

fn attachment_headers(content_type: &'static str, filename: &'static str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_static(filename),
    );
    headers
}

#[instrument(skip(state))]
pub async fn export_csv(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<ExportQuery>,
) -> Result<(HeaderMap, String), ApiError> {
    let (start, end) = parse_range(&q)?;
    let data = repo::load_export(&state.db, user_id, start, end).await?;
    let body = service::render_csv(&data);
    Ok((
        attachment_headers(
            "text/csv; charset=utf-8",
            "attachment; filename=\"health-export.csv\"",
        ),
        body,
    ))
}

#[instrument(skip(state))]
pub async fn export_pdf(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<ExportQuery>,
) -> Result<(HeaderMap, Vec<u8>), ApiError> {
    let (start, end) = parse_range(&q)?;
    let data = repo::load_export(&state.db, user_id, start, end).await?;
    let body = pdf::render(&data)?;
    Ok((
        attachment_headers(
            "application/pdf",
            "attachment; filename=\"health-export.pdf\"",
        ),
        body,
    ))
}

#[instrument(skip(state, multipart))]
pub async fn import_csv(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    mut multipart: Multipart,
) -> Result<Json<ImportSummary>, ApiError> {
    let mut text: Option<String> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::BadRequest("Invalid multipart body".to_string()))?
    {
        if field.name() == Some("file") {
            let bytes = field
                .bytes()
                .await
                .map_err(|_| ApiError::BadRequest("Could not read file field".to_string()))?;
            let parsed = String::from_utf8(bytes.to_vec())
                .map_err(|_| ApiError::BadRequest("File must be UTF-8 text".to_string()))?;
            text = Some(parsed);
        }
    }
    let text = text.ok_or_else(|| ApiError::BadRequest("file field is required".to_string()))?;

    let summary = service::import_csv(&state.db, user_id, &text).await?;
    Ok(Json(summary))
}
