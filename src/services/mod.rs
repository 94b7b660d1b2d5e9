pub mod applicant_service;
pub mod audit_service;
pub mod export_service;
pub mod slot_service;
