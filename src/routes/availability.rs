use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};

use crate::{
    dto::{
        availability_dto::{
            AvailabilityDeleteQuery, CreateAvailabilityPayload, UpdateAvailabilityPayload,
        },
        ApiData,
    },
    error::{Error, Result},
    middleware::auth::Claims,
    utils::time,
    AppState,
};

fn client_company(claims: &Claims) -> Result<&str> {
    claims
        .company_id
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| Error::Forbidden("Client user not found".into()))
}

#[utoipa::path(
    get,
    path = "/api/client/interview-availability",
    responses(
        (status = 200, description = "The company's future availability, booked or not")
    )
)]
#[axum::debug_handler]
pub async fn list_availability(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse> {
    let company_id = client_company(&claims)?;
    let slots = state.slot_service.list_company_slots(company_id).await?;
    Ok(Json(ApiData::new(slots)))
}

#[utoipa::path(
    post,
    path = "/api/client/interview-availability",
    request_body = CreateAvailabilityPayload,
    responses(
        (status = 201, description = "Availability published"),
        (status = 400, description = "Missing fields, past date, or inverted time range")
    )
)]
#[axum::debug_handler]
pub async fn create_availability(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateAvailabilityPayload>,
) -> Result<impl IntoResponse> {
    let company_id = client_company(&claims)?;

    let (Some(raw_date), Some(raw_start), Some(raw_end)) = (
        payload.available_date.as_deref().filter(|s| !s.is_empty()),
        payload.start_time.as_deref().filter(|s| !s.is_empty()),
        payload.end_time.as_deref().filter(|s| !s.is_empty()),
    ) else {
        return Err(Error::BadRequest("日付と時間は必須です".into()));
    };

    let date =
        time::parse_date(raw_date).ok_or_else(|| Error::BadRequest("Invalid date format".into()))?;
    let start =
        time::parse_time(raw_start).ok_or_else(|| Error::BadRequest("Invalid time format".into()))?;
    let end =
        time::parse_time(raw_end).ok_or_else(|| Error::BadRequest("Invalid time format".into()))?;

    let slot = state
        .slot_service
        .create_slot(company_id, &claims.sub, date, start, end, payload.note)
        .await?;

    Ok((StatusCode::CREATED, Json(ApiData::new(slot))))
}

#[utoipa::path(
    put,
    path = "/api/client/interview-availability",
    request_body = UpdateAvailabilityPayload,
    responses(
        (status = 200, description = "Availability updated"),
        (status = 400, description = "Booked slots cannot be edited"),
        (status = 403, description = "Another company's slot"),
        (status = 404, description = "Slot not found")
    )
)]
#[axum::debug_handler]
pub async fn update_availability(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<UpdateAvailabilityPayload>,
) -> Result<impl IntoResponse> {
    let company_id = client_company(&claims)?;

    let slot_id = payload
        .id
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| Error::BadRequest("IDが必要です".into()))?;

    let date = match payload.available_date.as_deref().filter(|s| !s.is_empty()) {
        Some(raw) => Some(
            time::parse_date(raw).ok_or_else(|| Error::BadRequest("Invalid date format".into()))?,
        ),
        None => None,
    };
    let start = match payload.start_time.as_deref().filter(|s| !s.is_empty()) {
        Some(raw) => Some(
            time::parse_time(raw).ok_or_else(|| Error::BadRequest("Invalid time format".into()))?,
        ),
        None => None,
    };
    let end = match payload.end_time.as_deref().filter(|s| !s.is_empty()) {
        Some(raw) => Some(
            time::parse_time(raw).ok_or_else(|| Error::BadRequest("Invalid time format".into()))?,
        ),
        None => None,
    };

    let slot = state
        .slot_service
        .update_slot(slot_id, company_id, date, start, end, payload.note.map(Some))
        .await?;

    Ok(Json(ApiData::new(slot)))
}

#[utoipa::path(
    delete,
    path = "/api/client/interview-availability",
    params(("id" = String, Query, description = "Slot ID")),
    responses(
        (status = 200, description = "Availability removed"),
        (status = 400, description = "Booked slots cannot be removed"),
        (status = 404, description = "Slot not found")
    )
)]
#[axum::debug_handler]
pub async fn delete_availability(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<AvailabilityDeleteQuery>,
) -> Result<impl IntoResponse> {
    let company_id = client_company(&claims)?;

    let slot_id = query
        .id
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| Error::BadRequest("IDが必要です".into()))?;

    state.slot_service.delete_slot(slot_id, company_id).await?;
    Ok(Json(ApiData::new(serde_json::Value::Null)))
}
