use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::applicant::Applicant;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateApplicantPayload {
    #[validate(length(min = 1))]
    pub company_id: String,
    #[validate(length(min = 1))]
    pub job_id: String,
    #[validate(length(min = 1))]
    pub name: String,
    pub applied_at: Option<NaiveDate>,
    pub site_key: Option<String>,
    pub status: Option<String>,
    pub note: Option<String>,
}

/// All fields optional; at least one must be present. Empty strings
/// clear the column.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateApplicantPayload {
    pub status: Option<String>,
    pub note: Option<String>,
    pub client_comment: Option<String>,
    pub job_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicantResponse {
    pub id: String,
    pub company_id: String,
    pub job_id: String,
    pub applied_at: NaiveDate,
    pub site_key: String,
    pub name: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_comment: Option<String>,
    pub shared_with_client: bool,
    pub shared_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_title: Option<String>,
}

impl From<Applicant> for ApplicantResponse {
    fn from(value: Applicant) -> Self {
        Self {
            id: value.id,
            company_id: value.company_id,
            job_id: value.job_id,
            applied_at: value.applied_at,
            site_key: value.site_key,
            name: value.name,
            status: value.status,
            note: value.note,
            client_comment: value.client_comment,
            shared_with_client: value.shared_with_client,
            shared_at: value.shared_at,
            created_at: value.created_at,
            updated_at: value.updated_at,
            company_name: None,
            job_title: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ApplicantListQuery {
    pub limit: Option<i64>,
    pub company_id: Option<String>,
    pub job_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ApplicantSearchQuery {
    pub q: Option<String>,
    pub status: Option<String>,
    pub company_id: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ApplicantExportQuery {
    pub company_id: Option<String>,
    pub status: Option<String>,
    pub job_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicantStats {
    pub total_new: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApplicantListResponse {
    pub items: Vec<ApplicantResponse>,
    pub total: i64,
    pub stats: ApplicantStats,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApplicantSearchResponse {
    pub items: Vec<ApplicantResponse>,
}
