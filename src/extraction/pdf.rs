// PDF text extraction via lopdf, one page at a time

use lopdf::Document;
use tracing::debug;

use super::{DocumentKind, ExtractionError};

/// Extract text from every page, pages separated by a newline.
/// lopdf can panic on malformed fonts or streams, so parsing runs under catch_unwind.
pub fn extract(bytes: &[u8]) -> Result<String, ExtractionError> {
    match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| extract_pages(bytes))) {
        Ok(result) => result,
        Err(_panic) => {
            debug!("PDF parser panicked on malformed input");
            Err(ExtractionError::ParserPanic(DocumentKind::Pdf))
        }
    }
}

fn extract_pages(bytes: &[u8]) -> Result<String, ExtractionError> {
    let doc = Document::load_mem(bytes).map_err(|e| ExtractionError::corrupt(DocumentKind::Pdf, e))?;

    if doc.is_encrypted() {
        return Err(ExtractionError::PasswordProtected(DocumentKind::Pdf));
    }

    let pages = doc.get_pages();
    let mut parts = Vec::with_capacity(pages.len());

    for page_number in pages.keys() {
        match doc.extract_text(&[*page_number]) {
            Ok(text) => parts.push(text),
            Err(e) => {
                debug!(page = page_number, error = %e, "Skipping PDF page without extractable text");
            }
        }
    }

    if parts.is_empty() && !pages.is_empty() {
        return Err(ExtractionError::corrupt(
            DocumentKind::Pdf,
            "no page contained extractable text",
        ));
    }

    debug!(pages = pages.len(), "Extracted PDF text");
    Ok(parts.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_garbage_bytes_fail() {
        let err = extract(b"%PDF-garbage without any objects").unwrap_err();
        assert!(matches!(
            err,
            ExtractionError::Corrupt { .. } | ExtractionError::ParserPanic(_)
        ));
    }

    #[test]
    fn test_empty_input_fails() {
        assert!(extract(b"").is_err());
    }
}
