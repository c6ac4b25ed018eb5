//! FILENAME: core/persistence/src/xlsx_writer.rs

use crate::PersistenceError;
use pivot_engine::{ExportCell, ExportGrid};
use rust_xlsxwriter::{Format, Workbook as XlsxWorkbook};
use std::path::Path;

/// Width of the label column, in Excel character units.
const LABEL_COLUMN_WIDTH: f64 = 28.0;

/// Writes a flattened pivot to a single-sheet workbook. Header rows are bold
/// and frozen; missing values are written as `grid.empty_cell_text`.
pub fn save_pivot_xlsx(grid: &ExportGrid, sheet_name: &str, path: &Path) -> Result<(), PersistenceError> {
    if grid.width() > u16::MAX as usize {
        return Err(PersistenceError::InvalidFormat(format!(
            "pivot is {} columns wide",
            grid.width()
        )));
    }

    let mut xlsx = XlsxWorkbook::new();
    let worksheet = xlsx.add_worksheet();
    worksheet.set_name(sheet_name)?;
    worksheet.set_column_width(0, LABEL_COLUMN_WIDTH)?;

    let bold = Format::new().set_bold();

    for (r, row) in grid.cells.iter().enumerate() {
        let is_header = r < grid.header_rows;
        let xr = r as u32;
        for (c, cell) in row.iter().enumerate() {
            let xc = c as u16;
            match cell {
                ExportCell::Blank => {}
                ExportCell::Label(s) => {
                    if is_header {
                        worksheet.write_string_with_format(xr, xc, s, &bold)?;
                    } else {
                        worksheet.write_string(xr, xc, s)?;
                    }
                }
                ExportCell::Number(n) => {
                    worksheet.write_number(xr, xc, *n)?;
                }
                ExportCell::Missing => {
                    worksheet.write_string(xr, xc, &grid.empty_cell_text)?;
                }
            }
        }
    }

    if grid.header_rows > 0 {
        worksheet.set_freeze_panes(grid.header_rows as u32, 1)?;
    }

    xlsx.save(path)?;
    log::debug!("saved pivot sheet '{}' ({}x{})", sheet_name, grid.height(), grid.width());
    Ok(())
}
