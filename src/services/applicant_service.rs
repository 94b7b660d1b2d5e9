use std::collections::HashMap;

use serde_json::{Map as JsonMap, Value as JsonValue};
use sqlx::{FromRow, PgPool, QueryBuilder};
use uuid::Uuid;

use crate::dto::applicant_dto::{
    ApplicantExportQuery, ApplicantListQuery, CreateApplicantPayload, UpdateApplicantPayload,
};
use crate::error::{Error, Result};
use crate::models::applicant::{Applicant, ApplicantStatus};
use crate::utils::time;

const APPLICANT_COLUMNS: &str = "id, company_id, job_id, name, email, phone, applied_at, site_key, \
     status, note, client_comment, shared_with_client, shared_at, interview_date, \
     interview_start_time, interview_end_time, created_at, updated_at, deleted_at";

#[derive(Debug, Clone)]
pub struct ApplicantList {
    pub items: Vec<Applicant>,
    pub total: i64,
    pub total_new: i64,
}

/// What a patch changed, for the audit trail: only the fields that
/// were present in the request appear in old/new.
#[derive(Debug, Clone)]
pub struct PatchOutcome {
    pub company_id: String,
    pub old_value: JsonValue,
    pub new_value: JsonValue,
}

#[derive(Debug, FromRow)]
struct CurrentFields {
    company_id: String,
    status: String,
    note: Option<String>,
    client_comment: Option<String>,
    job_id: String,
}

#[derive(Clone)]
pub struct ApplicantService {
    pool: PgPool,
}

impl ApplicantService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Soft-deleted rows are invisible here.
    pub async fn get(&self, id: &str) -> Result<Option<Applicant>> {
        let applicant = sqlx::query_as::<_, Applicant>(&format!(
            "SELECT {APPLICANT_COLUMNS} FROM applicants WHERE id = $1 AND deleted_at IS NULL"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(applicant)
    }

    /// Portal view: only applicants explicitly shared with the
    /// caller's company are visible.
    pub async fn get_shared_for_company(
        &self,
        id: &str,
        company_id: &str,
    ) -> Result<Option<Applicant>> {
        let applicant = sqlx::query_as::<_, Applicant>(&format!(
            "SELECT {APPLICANT_COLUMNS} FROM applicants \
             WHERE id = $1 AND company_id = $2 AND shared_with_client = TRUE \
               AND deleted_at IS NULL"
        ))
        .bind(id)
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(applicant)
    }

    pub async fn list(&self, query: ApplicantListQuery) -> Result<ApplicantList> {
        let limit = query.limit.unwrap_or(20).clamp(1, 100);

        let mut qb = QueryBuilder::new(format!(
            "SELECT {APPLICANT_COLUMNS} FROM applicants WHERE deleted_at IS NULL"
        ));
        if let Some(company_id) = query.company_id.as_deref().filter(|s| !s.is_empty()) {
            qb.push(" AND company_id = ").push_bind(company_id);
        }
        if let Some(job_id) = query.job_id.as_deref().filter(|s| !s.is_empty()) {
            qb.push(" AND job_id = ").push_bind(job_id);
        }
        qb.push(" ORDER BY created_at DESC LIMIT ").push_bind(limit);
        let items = qb.build_query_as::<Applicant>().fetch_all(&self.pool).await?;

        let mut count_qb =
            QueryBuilder::new("SELECT COUNT(*) FROM applicants WHERE deleted_at IS NULL");
        if let Some(company_id) = query.company_id.as_deref().filter(|s| !s.is_empty()) {
            count_qb.push(" AND company_id = ").push_bind(company_id);
        }
        if let Some(job_id) = query.job_id.as_deref().filter(|s| !s.is_empty()) {
            count_qb.push(" AND job_id = ").push_bind(job_id);
        }
        let (total,): (i64,) = count_qb.build_query_as().fetch_one(&self.pool).await?;

        // Unfiltered NEW count for the dashboard badge; legacy rows
        // with an empty status count as NEW.
        let (total_new,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM applicants \
             WHERE deleted_at IS NULL AND (UPPER(status) = 'NEW' OR status = '')",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(ApplicantList {
            items,
            total,
            total_new,
        })
    }

    pub async fn search(
        &self,
        q: Option<&str>,
        status: Option<&str>,
        company_id: Option<&str>,
        limit: Option<i64>,
    ) -> Result<Vec<Applicant>> {
        let limit = limit.unwrap_or(300).clamp(1, 500);

        let mut qb = QueryBuilder::new(format!(
            "SELECT {APPLICANT_COLUMNS} FROM applicants WHERE deleted_at IS NULL"
        ));
        if let Some(company_id) = company_id.filter(|s| !s.is_empty()) {
            qb.push(" AND company_id = ").push_bind(company_id);
        }
        if let Some(status) = status.filter(|s| !s.is_empty() && *s != "ALL") {
            qb.push(" AND status = ").push_bind(status);
        }
        if let Some(q) = q.map(str::trim).filter(|s| !s.is_empty()) {
            let like = format!("%{}%", q);
            qb.push(" AND (name ILIKE ")
                .push_bind(like.clone())
                .push(" OR note ILIKE ")
                .push_bind(like.clone())
                .push(" OR site_key ILIKE ")
                .push_bind(like.clone())
                .push(" OR job_id ILIKE ")
                .push_bind(like.clone())
                .push(" OR applied_at::text ILIKE ")
                .push_bind(like)
                .push(")");
        }
        qb.push(" ORDER BY created_at DESC LIMIT ").push_bind(limit);

        let items = qb.build_query_as::<Applicant>().fetch_all(&self.pool).await?;
        Ok(items)
    }

    pub async fn create(&self, payload: CreateApplicantPayload) -> Result<Applicant> {
        let applied_at = payload.applied_at.unwrap_or_else(time::utc_today);
        if applied_at > time::utc_today() {
            return Err(Error::BadRequest("応募日は未来の日付にできません".into()));
        }

        let status = match payload.status.as_deref().filter(|s| !s.is_empty()) {
            Some(raw) => {
                ApplicantStatus::parse(raw).ok_or_else(|| Error::InvalidStatus(raw.to_string()))?
            }
            None => ApplicantStatus::New,
        };

        let id = format!("applicant_{}", Uuid::new_v4().simple());
        let site_key = payload
            .site_key
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "Direct".to_string());

        let applicant = sqlx::query_as::<_, Applicant>(&format!(
            "INSERT INTO applicants (id, company_id, job_id, name, applied_at, site_key, status, note) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {APPLICANT_COLUMNS}"
        ))
        .bind(&id)
        .bind(&payload.company_id)
        .bind(&payload.job_id)
        .bind(&payload.name)
        .bind(applied_at)
        .bind(&site_key)
        .bind(status.as_str())
        .bind(payload.note.filter(|s| !s.is_empty()))
        .fetch_one(&self.pool)
        .await?;
        Ok(applicant)
    }

    /// Guarded partial update. The current status is re-read here, not
    /// taken from the caller, so a stale client cannot skip the
    /// transition table.
    pub async fn patch(&self, id: &str, payload: UpdateApplicantPayload) -> Result<PatchOutcome> {
        let requested_status = match payload.status.as_deref().filter(|s| !s.is_empty()) {
            Some(raw) => Some(
                ApplicantStatus::parse(raw).ok_or_else(|| Error::InvalidStatus(raw.to_string()))?,
            ),
            None => None,
        };

        if requested_status.is_none()
            && payload.note.is_none()
            && payload.client_comment.is_none()
            && payload.job_id.is_none()
        {
            return Err(Error::BadRequest(
                "status, note, clientComment, or jobId is required".into(),
            ));
        }

        let current = sqlx::query_as::<_, CurrentFields>(
            "SELECT company_id, status, note, client_comment, job_id \
             FROM applicants WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound("Applicant not found".into()))?;

        if let Some(requested) = requested_status {
            let current_status = ApplicantStatus::parse_or_new(&current.status);
            if !current_status.can_transition_to(requested) {
                return Err(Error::InvalidTransition {
                    current: current_status,
                    attempted: requested,
                    allowed: current_status.allowed_transitions().to_vec(),
                });
            }
        }

        let mut old_value = JsonMap::new();
        let mut new_value = JsonMap::new();

        let mut qb = QueryBuilder::new("UPDATE applicants SET updated_at = NOW()");
        if let Some(status) = requested_status {
            qb.push(", status = ").push_bind(status.as_str());
            old_value.insert("status".into(), JsonValue::from(current.status.clone()));
            new_value.insert("status".into(), JsonValue::from(status.as_str()));
        }
        if let Some(note) = payload.note {
            let note = Some(note).filter(|s| !s.is_empty());
            qb.push(", note = ").push_bind(note.clone());
            old_value.insert("note".into(), json_or_null(current.note.clone()));
            new_value.insert("note".into(), json_or_null(note));
        }
        if let Some(comment) = payload.client_comment {
            let comment = Some(comment).filter(|s| !s.is_empty());
            qb.push(", client_comment = ").push_bind(comment.clone());
            old_value.insert(
                "client_comment".into(),
                json_or_null(current.client_comment.clone()),
            );
            new_value.insert("client_comment".into(), json_or_null(comment));
        }
        if let Some(job_id) = payload.job_id {
            let job_id = Some(job_id).filter(|s| !s.is_empty());
            qb.push(", job_id = ").push_bind(job_id.clone());
            old_value.insert("job_id".into(), JsonValue::from(current.job_id.clone()));
            new_value.insert("job_id".into(), json_or_null(job_id));
        }
        qb.push(" WHERE id = ")
            .push_bind(id)
            .push(" AND deleted_at IS NULL");

        let result = qb.build().execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound("Applicant not found".into()));
        }

        Ok(PatchOutcome {
            company_id: current.company_id,
            old_value: JsonValue::Object(old_value),
            new_value: JsonValue::Object(new_value),
        })
    }

    /// Marks the row deleted; the caller releases any bound interview
    /// slot first. Returns the applicant's company for the audit
    /// trail, or None when no live row matched.
    pub async fn soft_delete(&self, id: &str) -> Result<Option<String>> {
        let company_id: Option<(String,)> =
            sqlx::query_as("SELECT company_id FROM applicants WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        sqlx::query(
            "UPDATE applicants SET deleted_at = NOW(), updated_at = NOW() \
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(company_id.map(|(c,)| c))
    }

    pub async fn export_rows(&self, query: &ApplicantExportQuery) -> Result<Vec<Applicant>> {
        let mut qb = QueryBuilder::new(format!(
            "SELECT {APPLICANT_COLUMNS} FROM applicants WHERE deleted_at IS NULL"
        ));
        if let Some(company_id) = query.company_id.as_deref().filter(|s| !s.is_empty()) {
            qb.push(" AND company_id = ").push_bind(company_id);
        }
        if let Some(status) = query.status.as_deref().filter(|s| !s.is_empty()) {
            qb.push(" AND status = ").push_bind(status);
        }
        if let Some(job_id) = query.job_id.as_deref().filter(|s| !s.is_empty()) {
            qb.push(" AND job_id = ").push_bind(job_id);
        }
        qb.push(" ORDER BY applied_at DESC");

        let rows = qb.build_query_as::<Applicant>().fetch_all(&self.pool).await?;
        Ok(rows)
    }

    /// Display-name lookups for list screens: company id -> name and
    /// job id -> (title, denormalized company name).
    pub async fn resolve_names(
        &self,
        applicants: &[Applicant],
    ) -> Result<(HashMap<String, String>, HashMap<String, (String, Option<String>)>)> {
        let mut company_ids: Vec<String> =
            applicants.iter().map(|a| a.company_id.clone()).collect();
        company_ids.sort();
        company_ids.dedup();

        let mut job_ids: Vec<String> = applicants.iter().map(|a| a.job_id.clone()).collect();
        job_ids.sort();
        job_ids.dedup();

        let mut company_names = HashMap::new();
        if !company_ids.is_empty() {
            let rows: Vec<(String, String)> = sqlx::query_as(
                "SELECT id, company_name FROM companies \
                 WHERE deleted_at IS NULL AND id = ANY($1)",
            )
            .bind(&company_ids)
            .fetch_all(&self.pool)
            .await?;
            company_names.extend(rows);
        }

        let mut job_titles = HashMap::new();
        if !job_ids.is_empty() {
            let rows: Vec<(String, String, Option<String>)> = sqlx::query_as(
                "SELECT id, job_title, company_name FROM jobs \
                 WHERE deleted_at IS NULL AND id = ANY($1)",
            )
            .bind(&job_ids)
            .fetch_all(&self.pool)
            .await?;
            for (id, title, company_name) in rows {
                job_titles.insert(id, (title, company_name));
            }
        }

        Ok((company_names, job_titles))
    }
}

fn json_or_null(value: Option<String>) -> JsonValue {
    value.map(JsonValue::from).unwrap_or(JsonValue::Null)
}
