use chrono::{NaiveDate, NaiveTime};
use sqlx::{PgPool, QueryBuilder};
use uuid::Uuid;

use crate::dto::booking_dto::OpenSlot;
use crate::error::{Error, Result};
use crate::models::interview_slot::InterviewSlot;
use crate::utils::time;

const SLOT_COLUMNS: &str = "id, company_id, client_user_id, available_date, start_time, end_time, \
     note, is_booked, booked_applicant_id, created_at, updated_at";

#[derive(Clone)]
pub struct SlotService {
    pool: PgPool,
}

impl SlotService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Claims a published slot for an applicant and mirrors the slot's
    /// date/time onto the applicant row.
    ///
    /// The claim is a single conditional update: the WHERE clause only
    /// matches while `is_booked` is still false, so of two concurrent
    /// attempts exactly one sees a row come back. The applicant write
    /// is a second, separate statement; if it fails the slot is
    /// reverted (best-effort compensation, no cross-statement
    /// transaction).
    pub async fn book_slot(&self, applicant_id: &str, slot_id: &str) -> Result<InterviewSlot> {
        let claimed = sqlx::query_as::<_, InterviewSlot>(&format!(
            "UPDATE interview_availability \
             SET is_booked = TRUE, booked_applicant_id = $1, updated_at = NOW() \
             WHERE id = $2 AND is_booked = FALSE \
             RETURNING {SLOT_COLUMNS}"
        ))
        .bind(applicant_id)
        .bind(slot_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(Error::SlotAlreadyBooked)?;

        let applicant_write = sqlx::query(
            "UPDATE applicants \
             SET interview_date = $1, interview_start_time = $2, interview_end_time = $3, \
                 updated_at = NOW() \
             WHERE id = $4 AND deleted_at IS NULL",
        )
        .bind(claimed.available_date)
        .bind(claimed.start_time)
        .bind(claimed.end_time)
        .bind(applicant_id)
        .execute(&self.pool)
        .await;

        match applicant_write {
            Ok(result) if result.rows_affected() > 0 => Ok(claimed),
            Ok(_) => {
                self.revert_claim(slot_id).await;
                Err(Error::NotFound("Applicant not found".into()))
            }
            Err(err) => {
                tracing::error!(error = ?err, slot_id, applicant_id, "applicant write failed after slot claim");
                self.revert_claim(slot_id).await;
                Err(err.into())
            }
        }
    }

    /// Compensating write for a half-finished booking. Idempotent:
    /// absolute values keyed by slot id, safe to retry. Failure leaves
    /// a booked slot without applicant data; that degraded state is
    /// surfaced to the caller as the original error.
    async fn revert_claim(&self, slot_id: &str) {
        let result = sqlx::query(
            "UPDATE interview_availability \
             SET is_booked = FALSE, booked_applicant_id = NULL, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(slot_id)
        .execute(&self.pool)
        .await;
        if let Err(err) = result {
            tracing::error!(error = ?err, slot_id, "slot compensation failed; slot left booked without applicant data");
        }
    }

    /// Ad-hoc interview date with no slot consumed. The date must not
    /// be before today on the JST calendar.
    pub async fn book_manual(
        &self,
        applicant_id: &str,
        date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
    ) -> Result<()> {
        if date < time::jst_today() {
            return Err(Error::PastDate);
        }

        let result = sqlx::query(
            "UPDATE applicants \
             SET interview_date = $1, interview_start_time = $2, interview_end_time = $3, \
                 updated_at = NOW() \
             WHERE id = $4 AND deleted_at IS NULL",
        )
        .bind(date)
        .bind(start)
        .bind(end)
        .bind(applicant_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound("Applicant not found".into()));
        }
        Ok(())
    }

    /// Clears the applicant's interview columns, then releases any
    /// slot still pointing at it. The release is best-effort; the
    /// clear alone makes the operation a success.
    pub async fn clear_booking(&self, applicant_id: &str) -> Result<()> {
        sqlx::query(
            "UPDATE applicants \
             SET interview_date = NULL, interview_start_time = NULL, interview_end_time = NULL, \
                 updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(applicant_id)
        .execute(&self.pool)
        .await?;

        if let Err(err) = self.release_for_applicant(applicant_id).await {
            tracing::error!(error = ?err, applicant_id, "slot release after clearing interview failed");
        }
        Ok(())
    }

    /// Unbooks every slot held by this applicant. Used by booking
    /// cancellation and by applicant deletion (cascading release).
    pub async fn release_for_applicant(&self, applicant_id: &str) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE interview_availability \
             SET is_booked = FALSE, booked_applicant_id = NULL, updated_at = NOW() \
             WHERE booked_applicant_id = $1",
        )
        .bind(applicant_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Open future slots for the admin booking picker.
    pub async fn list_open_slots(&self, company_id: &str) -> Result<Vec<OpenSlot>> {
        let slots = sqlx::query_as::<_, OpenSlot>(
            "SELECT id, available_date, start_time, end_time, note, is_booked \
             FROM interview_availability \
             WHERE company_id = $1 AND is_booked = FALSE AND available_date >= $2 \
             ORDER BY available_date ASC, start_time ASC",
        )
        .bind(company_id)
        .bind(time::utc_today())
        .fetch_all(&self.pool)
        .await?;
        Ok(slots)
    }

    /// All of a company's future availability, booked or not (client
    /// portal calendar).
    pub async fn list_company_slots(&self, company_id: &str) -> Result<Vec<InterviewSlot>> {
        let slots = sqlx::query_as::<_, InterviewSlot>(&format!(
            "SELECT {SLOT_COLUMNS} FROM interview_availability \
             WHERE company_id = $1 AND available_date >= $2 \
             ORDER BY available_date ASC, start_time ASC"
        ))
        .bind(company_id)
        .bind(time::utc_today())
        .fetch_all(&self.pool)
        .await?;
        Ok(slots)
    }

    pub async fn create_slot(
        &self,
        company_id: &str,
        client_user_id: &str,
        date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
        note: Option<String>,
    ) -> Result<InterviewSlot> {
        if date < time::utc_today() {
            return Err(Error::BadRequest("過去の日付は登録できません".into()));
        }
        if start >= end {
            return Err(Error::BadRequest(
                "終了時間は開始時間より後にしてください".into(),
            ));
        }

        let slot = sqlx::query_as::<_, InterviewSlot>(&format!(
            "INSERT INTO interview_availability \
                 (id, company_id, client_user_id, available_date, start_time, end_time, note) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {SLOT_COLUMNS}"
        ))
        .bind(Uuid::new_v4().to_string())
        .bind(company_id)
        .bind(client_user_id)
        .bind(date)
        .bind(start)
        .bind(end)
        .bind(note.filter(|s| !s.is_empty()))
        .fetch_one(&self.pool)
        .await?;
        Ok(slot)
    }

    pub async fn update_slot(
        &self,
        slot_id: &str,
        company_id: &str,
        date: Option<NaiveDate>,
        start: Option<NaiveTime>,
        end: Option<NaiveTime>,
        note: Option<Option<String>>,
    ) -> Result<InterviewSlot> {
        let existing = self.require_editable(slot_id, company_id, "予約済みの日程は変更できません").await?;

        if let Some(date) = date {
            if date < time::utc_today() {
                return Err(Error::BadRequest("過去の日付は登録できません".into()));
            }
        }
        let effective_start = start.unwrap_or(existing.start_time);
        let effective_end = end.unwrap_or(existing.end_time);
        if effective_start >= effective_end {
            return Err(Error::BadRequest(
                "終了時間は開始時間より後にしてください".into(),
            ));
        }

        let mut qb = QueryBuilder::new("UPDATE interview_availability SET updated_at = NOW()");
        if let Some(date) = date {
            qb.push(", available_date = ").push_bind(date);
        }
        if let Some(start) = start {
            qb.push(", start_time = ").push_bind(start);
        }
        if let Some(end) = end {
            qb.push(", end_time = ").push_bind(end);
        }
        if let Some(note) = note {
            qb.push(", note = ").push_bind(note.filter(|s| !s.is_empty()));
        }
        qb.push(" WHERE id = ").push_bind(slot_id);
        qb.push(&format!(" RETURNING {SLOT_COLUMNS}"));

        let slot = qb
            .build_query_as::<InterviewSlot>()
            .fetch_one(&self.pool)
            .await?;
        Ok(slot)
    }

    pub async fn delete_slot(&self, slot_id: &str, company_id: &str) -> Result<()> {
        self.require_editable(slot_id, company_id, "予約済みの日程は削除できません").await?;

        sqlx::query("DELETE FROM interview_availability WHERE id = $1")
            .bind(slot_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// A slot may only be edited by its own company and only while no
    /// applicant holds it.
    async fn require_editable(
        &self,
        slot_id: &str,
        company_id: &str,
        booked_message: &str,
    ) -> Result<InterviewSlot> {
        let slot = sqlx::query_as::<_, InterviewSlot>(&format!(
            "SELECT {SLOT_COLUMNS} FROM interview_availability WHERE id = $1"
        ))
        .bind(slot_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound("対応可能日が見つかりません".into()))?;

        if slot.company_id != company_id {
            return Err(Error::Forbidden("権限がありません".into()));
        }
        if slot.is_booked {
            return Err(Error::BadRequest(booked_message.into()));
        }
        Ok(slot)
    }
}
