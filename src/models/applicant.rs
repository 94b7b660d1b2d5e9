use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Recruiting pipeline status. Stored as TEXT; inbound strings are
/// normalized once at the boundary and rejected if outside this set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ApplicantStatus {
    New,
    Doc,
    Int,
    Offer,
    Ng,
}

impl ApplicantStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicantStatus::New => "NEW",
            ApplicantStatus::Doc => "DOC",
            ApplicantStatus::Int => "INT",
            ApplicantStatus::Offer => "OFFER",
            ApplicantStatus::Ng => "NG",
        }
    }

    /// Case-insensitive parse of the five-value set.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "NEW" => Some(ApplicantStatus::New),
            "DOC" => Some(ApplicantStatus::Doc),
            "INT" => Some(ApplicantStatus::Int),
            "OFFER" => Some(ApplicantStatus::Offer),
            "NG" => Some(ApplicantStatus::Ng),
            _ => None,
        }
    }

    /// Stored rows with an empty or unknown status are treated as NEW.
    pub fn parse_or_new(raw: &str) -> Self {
        Self::parse(raw).unwrap_or(ApplicantStatus::New)
    }

    /// Directed transition table. No back-edges; NG is terminal and
    /// OFFER can only be withdrawn.
    pub fn allowed_transitions(&self) -> &'static [ApplicantStatus] {
        match self {
            ApplicantStatus::New => &[
                ApplicantStatus::Doc,
                ApplicantStatus::Int,
                ApplicantStatus::Ng,
            ],
            ApplicantStatus::Doc => &[ApplicantStatus::Int, ApplicantStatus::Ng],
            ApplicantStatus::Int => &[ApplicantStatus::Offer, ApplicantStatus::Ng],
            ApplicantStatus::Offer => &[ApplicantStatus::Ng],
            ApplicantStatus::Ng => &[],
        }
    }

    /// A request for the current status is always an allowed no-op.
    pub fn can_transition_to(&self, target: ApplicantStatus) -> bool {
        *self == target || self.allowed_transitions().contains(&target)
    }
}

impl std::fmt::Display for ApplicantStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Applicant {
    pub id: String,
    pub company_id: String,
    pub job_id: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub applied_at: NaiveDate,
    pub site_key: String,
    pub status: String,
    pub note: Option<String>,
    pub client_comment: Option<String>,
    pub shared_with_client: bool,
    pub shared_at: Option<DateTime<Utc>>,
    pub interview_date: Option<NaiveDate>,
    pub interview_start_time: Option<NaiveTime>,
    pub interview_end_time: Option<NaiveTime>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Applicant {
    pub fn status(&self) -> ApplicantStatus {
        ApplicantStatus::parse_or_new(&self.status)
    }
}
