// XLSX export

use std::path::Path;

use rollcall_recon::{OutputTable, ReconError};
use rust_xlsxwriter::{Format, Workbook};

pub const SHEET_NAME: &str = "Reordered";

/// Excel's column limit.
const MAX_COLS: usize = 16_384;

/// Build the output workbook: bold header row, frozen below it, every cell
/// written as text so identifiers and times keep their exact form.
fn build_workbook(table: &OutputTable) -> Result<Workbook, ReconError> {
    let width = table.rows.iter().map(Vec::len).chain(std::iter::once(table.headers.len())).max().unwrap_or(0);
    if width > MAX_COLS {
        return Err(ReconError::Io(format!("output has {width} columns; XLSX allows {MAX_COLS}")));
    }

    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();
    let worksheet = workbook.add_worksheet();
    worksheet
        .set_name(SHEET_NAME)
        .map_err(|e| ReconError::Io(format!("Failed to create sheet '{SHEET_NAME}': {e}")))?;

    for (col, header) in table.headers.iter().enumerate() {
        worksheet
            .write_string_with_format(0, col as u16, header, &header_format)
            .map_err(|e| ReconError::Io(format!("Failed to write header {col}: {e}")))?;
    }

    for (row_idx, row) in table.rows.iter().enumerate() {
        let row32 = u32::try_from(row_idx + 1)
            .map_err(|_| ReconError::Io(format!("row {row_idx} exceeds XLSX limits")))?;
        for (col, value) in row.iter().enumerate() {
            if value.is_empty() {
                continue;
            }
            worksheet
                .write_string(row32, col as u16, value)
                .map_err(|e| ReconError::Io(format!("Failed to write cell ({}, {}): {}", row_idx + 1, col, e)))?;
        }
    }

    worksheet
        .set_freeze_panes(1, 0)
        .map_err(|e| ReconError::Io(format!("Failed to freeze header row: {e}")))?;
    worksheet.autofit();

    Ok(workbook)
}

/// Serialize to an in-memory `.xlsx` file (for download responses).
pub fn to_buffer(table: &OutputTable) -> Result<Vec<u8>, ReconError> {
    build_workbook(table)?
        .save_to_buffer()
        .map_err(|e| ReconError::Io(format!("Failed to build XLSX file: {e}")))
}

pub fn write(table: &OutputTable, path: &Path) -> Result<(), ReconError> {
    build_workbook(table)?
        .save(path)
        .map_err(|e| ReconError::Io(format!("Failed to save XLSX file {}: {e}", path.display())))
}
