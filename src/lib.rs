pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use crate::services::{
    applicant_service::ApplicantService, audit_service::AuditService, slot_service::SlotService,
};
use sqlx::PgPool;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub applicant_service: ApplicantService,
    pub slot_service: SlotService,
    pub audit_service: AuditService,
}

impl AppState {
    pub fn new(pool: PgPool) -> Self {
        let applicant_service = ApplicantService::new(pool.clone());
        let slot_service = SlotService::new(pool.clone());
        let audit_service = AuditService::new(pool.clone());

        Self {
            pool,
            applicant_service,
            slot_service,
            audit_service,
        }
    }
}
