use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Extension,
};

use crate::{
    dto::applicant_dto::ApplicantExportQuery,
    error::Result,
    middleware::auth::Claims,
    routes::applicants::company_scope,
    services::{audit_service::RequestMeta, export_service::ExportService},
    utils::time,
    AppState,
};

/// CSV download of the applicant book. Admins may export any company;
/// client users only their own.
#[utoipa::path(
    get,
    path = "/api/applicants/export",
    params(
        ("companyId" = Option<String>, Query, description = "Company filter (admin only)"),
        ("status" = Option<String>, Query, description = "Status filter"),
        ("jobId" = Option<String>, Query, description = "Job filter")
    ),
    responses(
        (status = 200, description = "CSV attachment, UTF-8 with BOM"),
        (status = 403, description = "Caller has no company scope")
    )
)]
#[axum::debug_handler]
pub async fn export_applicants(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<ApplicantExportQuery>,
    headers: HeaderMap,
) -> Result<impl IntoResponse> {
    let company_scope = company_scope(&claims, query.company_id.as_deref())?;
    let scoped = ApplicantExportQuery {
        company_id: company_scope.clone(),
        status: query.status,
        job_id: query.job_id,
    };

    let rows = state.applicant_service.export_rows(&scoped).await?;
    let csv = ExportService::build_applicants_csv(&rows)?;

    let meta = RequestMeta::from_headers(&headers);
    state
        .audit_service
        .record_applicant_export(&claims.sub, rows.len(), company_scope.as_deref(), &meta)
        .await;

    let filename = format!("applicants_{}.csv", time::utc_today().format("%Y-%m-%d"));
    let disposition = format!("attachment; filename=\"{}\"", filename);

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        csv,
    ))
}
