use axum::http::HeaderMap;
use serde_json::Value as JsonValue;
use sqlx::types::ipnetwork::IpNetwork;
use sqlx::PgPool;

use crate::error::Result;
use crate::models::audit_log::AuditLog;

/// Request metadata forwarded into the audit trail.
#[derive(Debug, Clone, Default)]
pub struct RequestMeta {
    pub ip: Option<IpNetwork>,
    pub user_agent: Option<String>,
}

impl RequestMeta {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let ip = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .and_then(|v| v.trim().parse::<std::net::IpAddr>().ok())
            .map(IpNetwork::from);
        let user_agent = headers
            .get(axum::http::header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string());
        Self { ip, user_agent }
    }
}

#[derive(Clone)]
pub struct AuditService {
    pool: PgPool,
}

impl AuditService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn log(
        &self,
        user_id: &str,
        company_id: Option<&str>,
        action: &str,
        resource_type: &str,
        resource_id: &str,
        old_value: Option<JsonValue>,
        new_value: Option<JsonValue>,
        meta: &RequestMeta,
    ) -> Result<AuditLog> {
        let row = sqlx::query_as::<_, AuditLog>(
            "INSERT INTO audit_logs \
                 (user_id, company_id, action, resource_type, resource_id, old_value, new_value, ip_address, user_agent) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING id, user_id, company_id, action, resource_type, resource_id, old_value, new_value, ip_address, user_agent, created_at",
        )
        .bind(user_id)
        .bind(company_id)
        .bind(action)
        .bind(resource_type)
        .bind(resource_id)
        .bind(old_value)
        .bind(new_value)
        .bind(meta.ip)
        .bind(meta.user_agent.as_deref())
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    // The record_* helpers are best-effort: a failed audit write is
    // logged and swallowed so it never blocks the primary operation.

    pub async fn record_applicant_view(
        &self,
        user_id: &str,
        applicant_id: &str,
        company_id: Option<&str>,
        meta: &RequestMeta,
    ) {
        self.record(
            user_id,
            company_id,
            "applicant_view",
            applicant_id,
            None,
            None,
            meta,
        )
        .await;
    }

    pub async fn record_applicant_update(
        &self,
        user_id: &str,
        applicant_id: &str,
        company_id: Option<&str>,
        old_value: JsonValue,
        new_value: JsonValue,
        meta: &RequestMeta,
    ) {
        self.record(
            user_id,
            company_id,
            "applicant_update",
            applicant_id,
            Some(old_value),
            Some(new_value),
            meta,
        )
        .await;
    }

    pub async fn record_applicant_delete(
        &self,
        user_id: &str,
        applicant_id: &str,
        company_id: Option<&str>,
        meta: &RequestMeta,
    ) {
        self.record(
            user_id,
            company_id,
            "applicant_delete",
            applicant_id,
            None,
            None,
            meta,
        )
        .await;
    }

    pub async fn record_applicant_export(
        &self,
        user_id: &str,
        export_count: usize,
        company_id: Option<&str>,
        meta: &RequestMeta,
    ) {
        let resource_id = format!("bulk_export_{}_records", export_count);
        self.record(
            user_id,
            company_id,
            "applicant_export",
            &resource_id,
            None,
            None,
            meta,
        )
        .await;
    }

    async fn record(
        &self,
        user_id: &str,
        company_id: Option<&str>,
        action: &str,
        resource_id: &str,
        old_value: Option<JsonValue>,
        new_value: Option<JsonValue>,
        meta: &RequestMeta,
    ) {
        if let Err(err) = self
            .log(
                user_id,
                company_id,
                action,
                "applicant",
                resource_id,
                old_value,
                new_value,
                meta,
            )
            .await
        {
            tracing::error!(error = ?err, action, resource_id, "failed to record audit log");
        }
    }
}
