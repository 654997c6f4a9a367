//! xlsx export of scraped complaints

use std::path::{Path, PathBuf};

use rust_xlsxwriter::{DocProperties, ExcelDateTime, Format, Workbook};
use tracing::info;

use crate::complaint::ComplaintResult;
use crate::error::ScraperError;

pub const SHEET_NAME: &str = "Análise Reclame Aqui";
pub const EXPORT_FILENAME: &str = "analise-reclame-aqui.xlsx";
pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const HEADERS: [&str; 4] = ["URL", "Title", "Complaint Text", "Date"];

const COLUMN_WIDTHS: [f64; 4] = [50.0, 40.0, 80.0, 20.0];

/// Row-per-result view of a result set, in result order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplaintTable {
    rows: Vec<[String; 4]>,
}

impl ComplaintTable {
    pub fn from_results(results: &[ComplaintResult]) -> Self {
        let rows = results
            .iter()
            .map(|r| {
                [
                    r.url.clone(),
                    r.title.clone(),
                    r.complaint_text.clone(),
                    r.date.clone(),
                ]
            })
            .collect();
        Self { rows }
    }

    pub fn headers(&self) -> &'static [&'static str; 4] {
        &HEADERS
    }

    pub fn rows(&self) -> &[[String; 4]] {
        &self.rows
    }

    fn to_workbook(&self) -> Result<Workbook, ScraperError> {
        let mut workbook = Workbook::new();

        // Creation time is otherwise "now", which would make identical exports differ.
        let created = ExcelDateTime::from_ymd(2024, 1, 1)?;
        workbook.set_properties(&DocProperties::new().set_creation_datetime(&created));

        let header_format = Format::new().set_bold();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(SHEET_NAME)?;

        for (col, (header, width)) in HEADERS.iter().zip(COLUMN_WIDTHS).enumerate() {
            let col = col as u16;
            worksheet.write_string_with_format(0, col, *header, &header_format)?;
            worksheet.set_column_width(col, width)?;
        }

        for (i, row) in self.rows.iter().enumerate() {
            let row_num = (i + 1) as u32;
            for (col, value) in row.iter().enumerate() {
                worksheet.write_string(row_num, col as u16, value)?;
            }
        }

        Ok(workbook)
    }
}

/// Serializes `results` to xlsx bytes. Empty input is rejected.
pub fn to_xlsx(results: &[ComplaintResult]) -> Result<Vec<u8>, ScraperError> {
    if results.is_empty() {
        return Err(ScraperError::NothingToExport);
    }
    let mut workbook = ComplaintTable::from_results(results).to_workbook()?;
    Ok(workbook.save_to_buffer()?)
}

/// Writes `EXPORT_FILENAME` into `dir` and returns its path.
pub fn write_xlsx(results: &[ComplaintResult], dir: &Path) -> Result<PathBuf, ScraperError> {
    let bytes = to_xlsx(results)?;

    std::fs::create_dir_all(dir)?;
    let path = dir.join(EXPORT_FILENAME);
    std::fs::write(&path, &bytes)?;

    info!("Exported {} complaint(s) to {:?}", results.len(), path);
    Ok(path)
}
