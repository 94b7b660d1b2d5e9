use csv::{QuoteStyle, WriterBuilder};

use crate::error::{Error, Result};
use crate::models::applicant::Applicant;

/// Spreadsheet-friendly header order; every exported row follows it.
const CSV_HEADERS: [&str; 11] = [
    "ID",
    "氏名",
    "会社ID",
    "求人ID",
    "応募日",
    "媒体",
    "ステータス",
    "メモ",
    "メールアドレス",
    "電話番号",
    "登録日",
];

pub struct ExportService;

impl ExportService {
    /// Renders applicants as a UTF-8 CSV with a BOM prefix so Excel
    /// detects the encoding. Every field is quote-wrapped; embedded
    /// quotes are doubled by the writer.
    pub fn build_applicants_csv(rows: &[Applicant]) -> Result<Vec<u8>> {
        // BOM goes in front of the header row.
        let buf = vec![0xEF, 0xBB, 0xBF];
        let mut writer = WriterBuilder::new()
            .quote_style(QuoteStyle::Always)
            .from_writer(buf);

        writer.write_record(CSV_HEADERS)?;
        for row in rows {
            writer.write_record([
                row.id.clone(),
                row.name.clone(),
                row.company_id.clone(),
                row.job_id.clone(),
                row.applied_at.format("%Y-%m-%d").to_string(),
                row.site_key.clone(),
                row.status.clone(),
                flatten_newlines(row.note.as_deref().unwrap_or("")),
                row.email.clone().unwrap_or_default(),
                row.phone.clone().unwrap_or_default(),
                row.created_at.to_rfc3339(),
            ])?;
        }

        writer
            .into_inner()
            .map_err(|e| Error::Internal(format!("CSV buffer error: {}", e)))
    }
}

/// Multi-line notes break spreadsheet imports; collapse them.
fn flatten_newlines(text: &str) -> String {
    text.replace('\n', " ").replace('\r', "")
}
