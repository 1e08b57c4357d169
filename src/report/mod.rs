//! Excel report output
//!
//! One worksheet of analysis rows, plus an "Errors" worksheet only when at
//! least one file failed.

use std::path::{Path, PathBuf};

use rust_xlsxwriter::{Color, Format, FormatAlign, Workbook, Worksheet, XlsxError};
use tracing::info;

use crate::extraction::truncate_chars;
use crate::models::Report;
use crate::types::{AppError, AppResult};

pub const ANALYSIS_SHEET: &str = "File Analysis";
pub const ERRORS_SHEET: &str = "Errors";

const ANALYSIS_HEADERS: [&str; 6] = ["#", "Filename", "Title", "Summary", "File Size (KB)", "Last Modified"];
const ANALYSIS_WIDTHS: [f64; 6] = [5.0, 30.0, 35.0, 60.0, 15.0, 20.0];
const ERROR_HEADERS: [&str; 3] = ["Filename", "Error Type", "Error Message"];
const ERROR_WIDTHS: [f64; 3] = [30.0, 20.0, 60.0];

// Zero-based rows
const ANALYSIS_HEADER_ROW: u32 = 6;
const ERROR_HEADER_ROW: u32 = 2;
const DATA_ROW_HEIGHT: f64 = 60.0;

/// Longest string Excel stores in a single cell
pub const CELL_MAX_CHARS: usize = 32_767;

pub struct ReportWriter {
    path: PathBuf,
}

impl ReportWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write(&self, report: &Report) -> AppResult<()> {
        self.build(report).map_err(|e| AppError::ReportWrite {
            path: self.path.display().to_string(),
            message: e.to_string(),
        })?;

        info!(
            path = %self.path.display(),
            results = report.results.len(),
            errors = report.errors.len(),
            "Report written"
        );
        Ok(())
    }

    fn build(&self, report: &Report) -> Result<(), XlsxError> {
        let mut workbook = Workbook::new();

        write_analysis_sheet(workbook.add_worksheet(), report)?;
        if report.has_errors() {
            write_errors_sheet(workbook.add_worksheet(), report)?;
        }

        workbook.save(&self.path)
    }
}

/// Text clipped to what one cell can hold
fn cell(text: &str) -> String {
    truncate_chars(text, CELL_MAX_CHARS).0
}

fn header_format(background: u32) -> Format {
    Format::new()
        .set_bold()
        .set_font_color(Color::White)
        .set_background_color(Color::RGB(background))
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::VerticalCenter)
}

fn write_analysis_sheet(sheet: &mut Worksheet, report: &Report) -> Result<(), XlsxError> {
    sheet.set_name(ANALYSIS_SHEET)?;

    let title = Format::new().set_bold().set_font_size(16);
    sheet.merge_range(0, 0, 0, 5, "SharePoint File Analysis Report", &title)?;
    sheet.write_string(1, 0, cell(&format!("SharePoint Site: {}", report.site_url)))?;
    sheet.write_string(2, 0, cell(&format!("Folder Path: {}", report.folder_path)))?;
    sheet.write_string(
        3,
        0,
        format!("Generated: {}", report.generated_at.format("%Y-%m-%d %H:%M:%S")),
    )?;
    sheet.write_string(4, 0, format!("Total Files Analyzed: {}", report.results.len()))?;

    let header = header_format(0x366092);
    for (col, name) in ANALYSIS_HEADERS.iter().enumerate() {
        sheet.write_string_with_format(ANALYSIS_HEADER_ROW, col as u16, *name, &header)?;
    }

    let top = Format::new().set_align(FormatAlign::Top);
    let wrapped = Format::new().set_text_wrap().set_align(FormatAlign::Top);

    for (i, result) in report.results.iter().enumerate() {
        let row = ANALYSIS_HEADER_ROW + 1 + i as u32;
        sheet.write_number_with_format(row, 0, result.row as f64, &top)?;
        sheet.write_string_with_format(row, 1, cell(&result.filename), &top)?;
        sheet.write_string_with_format(row, 2, cell(&result.title), &top)?;
        sheet.write_string_with_format(row, 3, cell(&result.summary), &wrapped)?;
        sheet.write_number_with_format(row, 4, result.size_kb(), &top)?;
        sheet.write_string_with_format(row, 5, result.last_modified_display(), &top)?;
        sheet.set_row_height(row, DATA_ROW_HEIGHT)?;
    }

    for (col, width) in ANALYSIS_WIDTHS.iter().enumerate() {
        sheet.set_column_width(col as u16, *width)?;
    }
    Ok(())
}

fn write_errors_sheet(sheet: &mut Worksheet, report: &Report) -> Result<(), XlsxError> {
    sheet.set_name(ERRORS_SHEET)?;

    let title = Format::new().set_bold().set_font_size(14);
    sheet.merge_range(0, 0, 0, 2, "Files with Processing Errors", &title)?;

    let header = header_format(0xC00000);
    for (col, name) in ERROR_HEADERS.iter().enumerate() {
        sheet.write_string_with_format(ERROR_HEADER_ROW, col as u16, *name, &header)?;
    }

    let wrapped = Format::new().set_text_wrap().set_align(FormatAlign::Top);
    for (i, error) in report.errors.iter().enumerate() {
        let row = ERROR_HEADER_ROW + 1 + i as u32;
        sheet.write_string(row, 0, cell(&error.filename))?;
        sheet.write_string(row, 1, error.kind.to_string())?;
        sheet.write_string_with_format(row, 2, cell(&error.message), &wrapped)?;
    }

    for (col, width) in ERROR_WIDTHS.iter().enumerate() {
        sheet.set_column_width(col as u16, *width)?;
    }
    Ok(())
}
