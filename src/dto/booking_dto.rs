use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Either `slotId` (claim a published slot) or `manualDate` (ad-hoc
/// date written straight onto the applicant).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct BookingRequest {
    pub slot_id: Option<String>,
    pub manual_date: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

/// Booking as presented to the UI. The id is synthetic
/// (`interview_<applicantId>`) because the booking lives on the
/// applicant row, whether or not a slot was consumed.
#[derive(Debug, Clone, Serialize)]
pub struct BookingSlotView {
    pub id: String,
    pub available_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub note: Option<String>,
    pub is_booked: bool,
}

impl BookingSlotView {
    pub fn for_applicant(
        applicant_id: &str,
        available_date: NaiveDate,
        start_time: NaiveTime,
        end_time: NaiveTime,
        note: Option<String>,
    ) -> Self {
        Self {
            id: format!("interview_{}", applicant_id),
            available_date,
            start_time,
            end_time,
            note,
            is_booked: true,
        }
    }
}

/// Subset of a slot row shown in the admin booking picker.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct OpenSlot {
    pub id: String,
    pub available_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub note: Option<String>,
    pub is_booked: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct BookingView {
    pub booking: Option<BookingSlotView>,
    #[serde(rename = "availableSlots")]
    pub available_slots: Vec<OpenSlot>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClientBookingView {
    #[serde(rename = "bookedSlot")]
    pub booked_slot: Option<BookingSlotView>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn booking_request_tolerates_either_mode() {
        let by_slot: BookingRequest = serde_json::from_str(r#"{"slotId":"slot_1"}"#).unwrap();
        assert_eq!(by_slot.slot_id.as_deref(), Some("slot_1"));
        assert!(by_slot.manual_date.is_none());

        let manual: BookingRequest =
            serde_json::from_str(r#"{"manualDate":"2026-09-01","startTime":"13:00"}"#).unwrap();
        assert_eq!(manual.manual_date.as_deref(), Some("2026-09-01"));
        assert_eq!(manual.start_time.as_deref(), Some("13:00"));
        assert!(manual.end_time.is_none());
    }

    #[test]
    fn booking_view_serializes_slot_list_under_camel_key() {
        let view = BookingView {
            booking: None,
            available_slots: vec![],
        };
        let v = serde_json::to_value(view).unwrap();
        assert!(v["booking"].is_null());
        assert!(v["availableSlots"].is_array());
    }
}
