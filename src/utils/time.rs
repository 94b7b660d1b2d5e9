use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, Utc};

pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Today on the UTC calendar (used for applied_at checks and export
/// filenames).
pub fn utc_today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Today on the JST (UTC+9) calendar. Interview dates are validated
/// against the agency's local day boundary, not the server's.
pub fn jst_today() -> NaiveDate {
    jst_date_of(Utc::now())
}

fn jst_date_of(instant: DateTime<Utc>) -> NaiveDate {
    let jst = FixedOffset::east_opt(9 * 3600).expect("fixed JST offset");
    instant.with_timezone(&jst).date_naive()
}

/// Accepts both `HH:MM` (form input) and `HH:MM:SS` (stored values).
pub fn parse_time(raw: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .ok()
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}
