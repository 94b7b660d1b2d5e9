pub mod applicant_dto;
pub mod availability_dto;
pub mod booking_dto;

use serde::Serialize;

/// Success envelope: `{ "ok": true, "data": ... }`. Errors use the
/// mirror shape via `crate::error::Error`.
#[derive(Debug, Clone, Serialize)]
pub struct ApiData<T> {
    pub ok: bool,
    pub data: T,
}

impl<T> ApiData<T> {
    pub fn new(data: T) -> Self {
        Self { ok: true, data }
    }
}
