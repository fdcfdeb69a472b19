// src/export/mod.rs
use crate::ctc::CtcRecord;
use crate::utils::error::ExportError;
use rust_xlsxwriter::{Format, Workbook};
use std::path::Path;
use uuid::Uuid;

/// Filename offered to the user on download.
pub const DOWNLOAD_NAME: &str = "dados_ctc.xlsx";

const SHEET_NAME: &str = "Dados";
const PERIOD_COLUMN: &str = "Competência";
const AMOUNT_COLUMN: &str = "Valor";

/// The export product for one document: the workbook bytes plus the fields
/// the storage layer persists alongside them. The file id doubles as the
/// per-call identifier.
#[derive(Debug, Clone)]
pub struct ExportArtifact {
    pub file_id: Uuid,
    pub download_name: String,
    pub record_count: usize,
    pub content: Vec<u8>,
}

impl ExportArtifact {
    /// Serializes `records` into a workbook under a fresh file id.
    pub fn build(records: &[CtcRecord]) -> Result<Self, ExportError> {
        Ok(Self {
            file_id: Uuid::new_v4(),
            download_name: DOWNLOAD_NAME.to_string(),
            record_count: records.len(),
            content: workbook_bytes(records)?,
        })
    }
}

/// Builds the export workbook in memory.
pub fn workbook_bytes(records: &[CtcRecord]) -> Result<Vec<u8>, ExportError> {
    let mut workbook = build_workbook(records)?;
    Ok(workbook.save_to_buffer()?)
}

/// Writes the export workbook directly to `path`.
pub fn write_workbook(records: &[CtcRecord], path: &Path) -> Result<(), ExportError> {
    let mut workbook = build_workbook(records)?;
    workbook.save(path)?;
    Ok(())
}

/// One `Dados` sheet, header row, one row per record in extraction order.
/// Periods stay strings; amounts are written as numbers.
fn build_workbook(records: &[CtcRecord]) -> Result<Workbook, ExportError> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();

    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;
    sheet.write_string_with_format(0, 0, PERIOD_COLUMN, &header_format)?;
    sheet.write_string_with_format(0, 1, AMOUNT_COLUMN, &header_format)?;

    for (i, record) in records.iter().enumerate() {
        let row = (i + 1) as u32;
        sheet.write_string(row, 0, record.period.as_str())?;
        sheet.write_number(row, 1, record.amount)?;
    }

    Ok(workbook)
}
