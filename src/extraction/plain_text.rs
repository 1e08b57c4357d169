// Direct decoding for text, markup and delimited files

use csv::ReaderBuilder;

use super::{DocumentKind, ExtractionError};

const UTF8_BOM: char = '\u{feff}';

/// Lossy UTF-8 decode; invalid sequences become U+FFFD
pub fn decode(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    text.trim_start_matches(UTF8_BOM).to_string()
}

/// One line per record, non-empty cells joined with " | "
pub fn extract_delimited(bytes: &[u8], delimiter: u8) -> Result<String, ExtractionError> {
    let kind = DocumentKind::Delimited { delimiter };
    let mut rdr = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let mut out = String::new();
    for record in rdr.byte_records() {
        let record = record.map_err(|e| ExtractionError::corrupt(kind, e))?;
        let cells: Vec<String> = record
            .iter()
            .map(|cell| decode(cell).trim().to_string())
            .filter(|cell| !cell.is_empty())
            .collect();

        if !cells.is_empty() {
            out.push_str(&cells.join(" | "));
            out.push('\n');
        }
    }

    Ok(out)
}
