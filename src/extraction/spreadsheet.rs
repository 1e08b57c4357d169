// Cell values from .xlsx / .xls workbooks via calamine

use std::fmt::Display;
use std::io::Cursor;

use calamine::{Reader, Xls, Xlsx};
use tracing::debug;

use super::{DocumentKind, ExtractionError};

pub fn extract(bytes: &[u8], legacy: bool) -> Result<String, ExtractionError> {
    let kind = DocumentKind::Spreadsheet { legacy };
    let cursor = Cursor::new(bytes.to_vec());

    if legacy {
        let workbook: Xls<_> = Xls::new(cursor).map_err(|e| ExtractionError::corrupt(kind, e))?;
        collect_sheets(workbook, kind)
    } else {
        let workbook: Xlsx<_> = Xlsx::new(cursor).map_err(|e| ExtractionError::corrupt(kind, e))?;
        collect_sheets(workbook, kind)
    }
}

/// Each sheet gets a "=== Sheet: name ===" header, then one line per non-empty row
fn collect_sheets<R>(mut workbook: R, kind: DocumentKind) -> Result<String, ExtractionError>
where
    R: Reader<Cursor<Vec<u8>>>,
    R::Error: Display,
{
    let mut all_text = String::new();
    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();

    for sheet_name in &sheet_names {
        let range = workbook
            .worksheet_range(sheet_name)
            .map_err(|e| ExtractionError::corrupt(kind, format!("sheet '{}': {}", sheet_name, e)))?;

        all_text.push_str(&format!("=== Sheet: {} ===\n", sheet_name));

        for row in range.rows() {
            let row_text: Vec<String> = row
                .iter()
                .map(|cell| cell.to_string())
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();

            if !row_text.is_empty() {
                all_text.push_str(&row_text.join(" | "));
                all_text.push('\n');
            }
        }
    }

    debug!(sheets = sheet_names.len(), chars = all_text.len(), "Extracted workbook text");
    Ok(all_text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::Workbook;

    #[test]
    fn test_xlsx_cells_per_sheet() {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.set_name("Budget").unwrap();
        sheet.write_string(0, 0, "Item").unwrap();
        sheet.write_string(0, 1, "Cost").unwrap();
        sheet.write_string(1, 0, "Laptops").unwrap();
        sheet.write_number(1, 1, 1200).unwrap();
        let notes = workbook.add_worksheet();
        notes.set_name("Notes").unwrap();
        notes.write_string(2, 1, "Approved").unwrap();
        let bytes = workbook.save_to_buffer().unwrap();

        let text = extract(&bytes, false).unwrap();
        assert_eq!(
            text,
            "=== Sheet: Budget ===\nItem | Cost\nLaptops | 1200\n=== Sheet: Notes ===\nApproved\n"
        );
    }

    #[test]
    fn test_garbage_is_corrupt() {
        let err = extract(b"not a workbook", false).unwrap_err();
        assert!(matches!(err, ExtractionError::Corrupt { .. }));

        let err = extract(b"not a workbook either", true).unwrap_err();
        assert!(matches!(err, ExtractionError::Corrupt { .. }));
    }
}
