use axum::{
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::json;

use crate::models::applicant::ApplicantStatus;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("無効なステータスです: {0}")]
    InvalidStatus(String),

    #[error("{current}から{attempted}への遷移はできません")]
    InvalidTransition {
        current: ApplicantStatus,
        attempted: ApplicantStatus,
        allowed: Vec<ApplicantStatus>,
    },

    #[error("このスロットは既に予約済みです")]
    SlotAlreadyBooked,

    #[error("過去の日付は指定できません")]
    PastDate,

    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        // Transition failures carry machine-readable detail so the UI
        // can disable invalid options proactively.
        if let Error::InvalidTransition {
            current,
            attempted,
            allowed,
        } = &self
        {
            let body = Json(json!({
                "ok": false,
                "error": {
                    "message": format!("{current}から{attempted}への遷移はできません"),
                    "currentStatus": current,
                    "attemptedStatus": attempted,
                    "allowedTransitions": allowed,
                }
            }));
            return (StatusCode::BAD_REQUEST, body).into_response();
        }

        let (status, error_message) = match self {
            Error::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Error::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            Error::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            Error::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Error::InvalidStatus(_) => (StatusCode::BAD_REQUEST, "無効なステータスです".to_string()),
            Error::SlotAlreadyBooked => (
                StatusCode::BAD_REQUEST,
                "このスロットは既に予約済みです".to_string(),
            ),
            Error::PastDate => (
                StatusCode::BAD_REQUEST,
                "過去の日付は指定できません".to_string(),
            ),
            Error::Validation(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            Error::Database(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
            Error::Json(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            Error::Csv(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
            Error::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            Error::Io(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
            Error::Anyhow(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "An unexpected error occurred".to_string(),
            ),
        };

        let body = Json(json!({ "ok": false, "error": { "message": error_message } }));
        (status, body).into_response()
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Error::NotFound("Resource not found".to_string()),
            other => Error::Database(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(err: Error) -> (StatusCode, serde_json::Value) {
        let resp = err.into_response();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), 64 * 1024).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn invalid_transition_carries_structured_detail() {
        let (status, body) = body_json(Error::InvalidTransition {
            current: ApplicantStatus::New,
            attempted: ApplicantStatus::Offer,
            allowed: ApplicantStatus::New.allowed_transitions().to_vec(),
        })
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["ok"], false);
        assert_eq!(body["error"]["currentStatus"], "NEW");
        assert_eq!(body["error"]["attemptedStatus"], "OFFER");
        assert_eq!(
            body["error"]["allowedTransitions"],
            serde_json::json!(["DOC", "INT", "NG"])
        );
    }

    #[tokio::test]
    async fn slot_already_booked_is_400_with_fixed_message() {
        let (status, body) = body_json(Error::SlotAlreadyBooked).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["message"], "このスロットは既に予約済みです");
    }

    #[tokio::test]
    async fn not_found_maps_to_404_envelope() {
        let (status, body) = body_json(Error::NotFound("Applicant not found".into())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["ok"], false);
        assert_eq!(body["error"]["message"], "Applicant not found");
    }
}
