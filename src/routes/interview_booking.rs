use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Extension, Json,
};
use chrono::NaiveTime;

use crate::{
    dto::{
        booking_dto::{BookingRequest, BookingSlotView, BookingView, ClientBookingView},
        ApiData,
    },
    error::{Error, Result},
    middleware::auth::Claims,
    utils::time,
    AppState,
};

fn default_start() -> NaiveTime {
    NaiveTime::from_hms_opt(10, 0, 0).expect("valid default start")
}

fn default_end() -> NaiveTime {
    NaiveTime::from_hms_opt(11, 0, 0).expect("valid default end")
}

#[utoipa::path(
    get,
    path = "/api/admin/applicants/{id}/interview-booking",
    params(("id" = String, Path, description = "Applicant ID")),
    responses(
        (status = 200, description = "Current booking plus the company's open slots"),
        (status = 404, description = "Applicant missing or soft-deleted")
    )
)]
#[axum::debug_handler]
pub async fn get_booking(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let applicant = state
        .applicant_service
        .get(&id)
        .await?
        .ok_or_else(|| Error::NotFound("Applicant not found".into()))?;

    let booking = applicant.interview_date.map(|date| {
        BookingSlotView::for_applicant(
            &id,
            date,
            applicant.interview_start_time.unwrap_or_else(default_start),
            applicant.interview_end_time.unwrap_or_else(default_end),
            None,
        )
    });

    let available_slots = state
        .slot_service
        .list_open_slots(&applicant.company_id)
        .await?;

    Ok(Json(ApiData::new(BookingView {
        booking,
        available_slots,
    })))
}

#[utoipa::path(
    post,
    path = "/api/admin/applicants/{id}/interview-booking",
    params(("id" = String, Path, description = "Applicant ID")),
    request_body = BookingRequest,
    responses(
        (status = 200, description = "Interview booked"),
        (status = 400, description = "Slot already booked, past date, or neither mode supplied"),
        (status = 404, description = "Applicant missing")
    )
)]
#[axum::debug_handler]
pub async fn set_booking(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<BookingRequest>,
) -> Result<impl IntoResponse> {
    // Mode 1: claim one of the company's published slots.
    if let Some(slot_id) = payload.slot_id.as_deref().filter(|s| !s.is_empty()) {
        let slot = state.slot_service.book_slot(&id, slot_id).await?;
        let view = BookingSlotView::for_applicant(
            &id,
            slot.available_date,
            slot.start_time,
            slot.end_time,
            slot.note,
        );
        return Ok(Json(ApiData::new(view)));
    }

    // Mode 2: ad-hoc date written straight onto the applicant.
    if let Some(raw_date) = payload.manual_date.as_deref().filter(|s| !s.is_empty()) {
        let date = time::parse_date(raw_date)
            .ok_or_else(|| Error::BadRequest("Invalid date format".into()))?;
        let start = match payload.start_time.as_deref().filter(|s| !s.is_empty()) {
            Some(raw) => {
                time::parse_time(raw).ok_or_else(|| Error::BadRequest("Invalid time format".into()))?
            }
            None => default_start(),
        };
        let end = match payload.end_time.as_deref().filter(|s| !s.is_empty()) {
            Some(raw) => {
                time::parse_time(raw).ok_or_else(|| Error::BadRequest("Invalid time format".into()))?
            }
            None => default_end(),
        };

        state.slot_service.book_manual(&id, date, start, end).await?;
        let view = BookingSlotView::for_applicant(&id, date, start, end, None);
        return Ok(Json(ApiData::new(view)));
    }

    Err(Error::BadRequest("slotId or manualDate is required".into()))
}

#[utoipa::path(
    delete,
    path = "/api/admin/applicants/{id}/interview-booking",
    params(("id" = String, Path, description = "Applicant ID")),
    responses(
        (status = 200, description = "Interview cleared and any bound slot released")
    )
)]
#[axum::debug_handler]
pub async fn clear_booking(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    state.slot_service.clear_booking(&id).await?;
    Ok(Json(ApiData::new(serde_json::Value::Null)))
}

#[utoipa::path(
    get,
    path = "/api/client/applicants/{id}/interview-booking",
    params(("id" = String, Path, description = "Applicant ID")),
    responses(
        (status = 200, description = "Booked slot for a shared applicant, if any"),
        (status = 403, description = "Caller has no company scope"),
        (status = 404, description = "Applicant not shared with this company")
    )
)]
#[axum::debug_handler]
pub async fn client_get_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let company_id = claims
        .company_id
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| Error::Forbidden("Client user not found".into()))?;

    let applicant = state
        .applicant_service
        .get_shared_for_company(&id, company_id)
        .await?
        .ok_or_else(|| Error::NotFound("Applicant not found or not shared".into()))?;

    let booked_slot = applicant.interview_date.map(|date| {
        BookingSlotView::for_applicant(
            &id,
            date,
            applicant.interview_start_time.unwrap_or_else(default_start),
            applicant.interview_end_time.unwrap_or_else(default_end),
            None,
        )
    });

    Ok(Json(ApiData::new(ClientBookingView { booked_slot })))
}
