use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use validator::Validate;

use crate::{
    dto::{
        applicant_dto::{
            ApplicantListQuery, ApplicantListResponse, ApplicantResponse, ApplicantSearchQuery,
            ApplicantSearchResponse, ApplicantStats, CreateApplicantPayload,
            UpdateApplicantPayload,
        },
        ApiData,
    },
    error::{Error, Result},
    middleware::auth::Claims,
    services::audit_service::RequestMeta,
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/applicants",
    params(
        ("limit" = Option<i64>, Query, description = "Max rows (1-100, default 20)"),
        ("companyId" = Option<String>, Query, description = "Filter by company"),
        ("jobId" = Option<String>, Query, description = "Filter by job")
    ),
    responses(
        (status = 200, description = "Applicants ordered by registration, newest first")
    )
)]
#[axum::debug_handler]
pub async fn list_applicants(
    State(state): State<AppState>,
    Query(query): Query<ApplicantListQuery>,
) -> Result<impl IntoResponse> {
    let list = state.applicant_service.list(query).await?;
    let items = list.items.into_iter().map(ApplicantResponse::from).collect();
    Ok(Json(ApiData::new(ApplicantListResponse {
        items,
        total: list.total,
        stats: ApplicantStats {
            total_new: list.total_new,
        },
    })))
}

#[utoipa::path(
    post,
    path = "/api/applicants",
    request_body = CreateApplicantPayload,
    responses(
        (status = 201, description = "Applicant created"),
        (status = 400, description = "Missing identity fields or future applied date")
    )
)]
#[axum::debug_handler]
pub async fn create_applicant(
    State(state): State<AppState>,
    Json(payload): Json<CreateApplicantPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let applicant = state.applicant_service.create(payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiData::new(ApplicantResponse::from(applicant))),
    ))
}

#[utoipa::path(
    get,
    path = "/api/applicants/{id}",
    params(("id" = String, Path, description = "Applicant ID")),
    responses(
        (status = 200, description = "Applicant with display names resolved"),
        (status = 404, description = "Missing or soft-deleted")
    )
)]
#[axum::debug_handler]
pub async fn get_applicant(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<impl IntoResponse> {
    let applicant = state
        .applicant_service
        .get(&id)
        .await?
        .ok_or_else(|| Error::NotFound("Applicant not found".into()))?;

    let meta = RequestMeta::from_headers(&headers);
    state
        .audit_service
        .record_applicant_view(&claims.sub, &id, Some(&applicant.company_id), &meta)
        .await;

    let (company_names, job_titles) = state
        .applicant_service
        .resolve_names(std::slice::from_ref(&applicant))
        .await?;

    let mut response = ApplicantResponse::from(applicant);
    let job_entry = job_titles.get(&response.job_id);
    response.company_name = company_names
        .get(&response.company_id)
        .cloned()
        .or_else(|| job_entry.and_then(|(_, company)| company.clone()));
    response.job_title = job_entry.map(|(title, _)| title.clone());

    Ok(Json(ApiData::new(response)))
}

#[utoipa::path(
    patch,
    path = "/api/applicants/{id}",
    params(("id" = String, Path, description = "Applicant ID")),
    request_body = UpdateApplicantPayload,
    responses(
        (status = 200, description = "Applicant updated"),
        (status = 400, description = "Invalid status value or disallowed transition"),
        (status = 404, description = "Missing or soft-deleted")
    )
)]
#[axum::debug_handler]
pub async fn patch_applicant(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<UpdateApplicantPayload>,
) -> Result<impl IntoResponse> {
    let outcome = state.applicant_service.patch(&id, payload).await?;

    let meta = RequestMeta::from_headers(&headers);
    state
        .audit_service
        .record_applicant_update(
            &claims.sub,
            &id,
            Some(&outcome.company_id),
            outcome.old_value,
            outcome.new_value,
            &meta,
        )
        .await;

    Ok(Json(ApiData::new(serde_json::Value::Null)))
}

#[utoipa::path(
    delete,
    path = "/api/applicants/{id}",
    params(("id" = String, Path, description = "Applicant ID")),
    responses(
        (status = 200, description = "Slot released and applicant soft-deleted")
    )
)]
#[axum::debug_handler]
pub async fn delete_applicant(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<impl IntoResponse> {
    // Release any bound interview slot before hiding the row; a
    // failed release must not block the deletion.
    if let Err(err) = state.slot_service.release_for_applicant(&id).await {
        tracing::error!(error = ?err, applicant_id = %id, "slot release before delete failed");
    }

    let company_id = state.applicant_service.soft_delete(&id).await?;

    let meta = RequestMeta::from_headers(&headers);
    state
        .audit_service
        .record_applicant_delete(&claims.sub, &id, company_id.as_deref(), &meta)
        .await;

    Ok(Json(ApiData::new(serde_json::Value::Null)))
}

#[utoipa::path(
    get,
    path = "/api/applicants/search",
    params(
        ("q" = Option<String>, Query, description = "Free text over name/note/site/job"),
        ("status" = Option<String>, Query, description = "Status filter, ALL disables"),
        ("companyId" = Option<String>, Query, description = "Company filter (admin only)"),
        ("limit" = Option<i64>, Query, description = "Max rows (1-500, default 300)")
    ),
    responses(
        (status = 200, description = "Matching applicants with display names"),
        (status = 403, description = "Caller has no company scope")
    )
)]
#[axum::debug_handler]
pub async fn search_applicants(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<ApplicantSearchQuery>,
) -> Result<impl IntoResponse> {
    let company_scope = company_scope(&claims, query.company_id.as_deref())?;

    let applicants = state
        .applicant_service
        .search(
            query.q.as_deref(),
            query.status.as_deref(),
            company_scope.as_deref(),
            query.limit,
        )
        .await?;

    let (company_names, job_titles) = state.applicant_service.resolve_names(&applicants).await?;

    let items = applicants
        .into_iter()
        .map(|applicant| {
            let mut response = ApplicantResponse::from(applicant);
            let job_entry = job_titles.get(&response.job_id);
            response.company_name = company_names
                .get(&response.company_id)
                .cloned()
                .or_else(|| job_entry.and_then(|(_, company)| company.clone()));
            response.job_title = job_entry.map(|(title, _)| title.clone());
            response
        })
        .collect();

    Ok(Json(ApiData::new(ApplicantSearchResponse { items })))
}

/// Admins may pass any company filter; client users are pinned to
/// their own company regardless of what they ask for.
pub fn company_scope(claims: &Claims, requested: Option<&str>) -> Result<Option<String>> {
    let role = claims.role.clone().unwrap_or_default();
    if role.eq_ignore_ascii_case("admin") {
        return Ok(requested
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string()));
    }
    match claims.company_id.clone().filter(|s| !s.is_empty()) {
        Some(company_id) => Ok(Some(company_id)),
        None => Err(Error::Forbidden("Access denied".into())),
    }
}
