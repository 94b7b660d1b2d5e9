use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A client-published interview time window. At most one applicant may
/// hold `is_booked = true`; `booked_applicant_id` mirrors the
/// applicant whose denormalized interview columns point back here.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct InterviewSlot {
    pub id: String,
    pub company_id: String,
    pub client_user_id: Option<String>,
    pub available_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub note: Option<String>,
    pub is_booked: bool,
    pub booked_applicant_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
