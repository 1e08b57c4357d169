// Text runs from OOXML packages (.docx, .pptx)

use std::io::{Cursor, Read};

use quick_xml::events::Event;
use quick_xml::Reader;
use zip::ZipArchive;

use super::{DocumentKind, ExtractionError};

/// Compound File Binary header shared by legacy .doc/.ppt and encrypted OOXML files
const CFB_MAGIC: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

const DOCX_BODY: &str = "word/document.xml";

pub fn extract_docx(bytes: &[u8]) -> Result<String, ExtractionError> {
    let kind = DocumentKind::WordProcessor;
    let mut archive = open_package(bytes, kind)?;
    let xml = read_part(&mut archive, DOCX_BODY, kind)?;
    text_runs(&xml, kind)
}

/// Slides are emitted in slide-number order, each under a "--- Slide N ---" marker
pub fn extract_pptx(bytes: &[u8]) -> Result<String, ExtractionError> {
    let kind = DocumentKind::SlideDeck;
    let mut archive = open_package(bytes, kind)?;

    let mut slides: Vec<(u32, String)> = archive
        .file_names()
        .filter_map(|name| slide_number(name).map(|n| (n, name.to_string())))
        .collect();
    slides.sort_by_key(|(n, _)| *n);

    if slides.is_empty() {
        return Err(ExtractionError::corrupt(kind, "package contains no slides"));
    }

    let mut out = String::new();
    for (number, name) in slides {
        let xml = read_part(&mut archive, &name, kind)?;
        let text = text_runs(&xml, kind)?;
        if !text.trim().is_empty() {
            out.push_str(&format!("--- Slide {} ---\n", number));
            out.push_str(text.trim_end());
            out.push('\n');
        }
    }

    Ok(out)
}

fn slide_number(name: &str) -> Option<u32> {
    name.strip_prefix("ppt/slides/slide")?
        .strip_suffix(".xml")?
        .parse()
        .ok()
}

fn open_package(bytes: &[u8], kind: DocumentKind) -> Result<ZipArchive<Cursor<&[u8]>>, ExtractionError> {
    if bytes.starts_with(&CFB_MAGIC) {
        return Err(ExtractionError::UnsupportedFormat(format!(
            "legacy binary or password-protected {} file",
            kind
        )));
    }

    ZipArchive::new(Cursor::new(bytes)).map_err(|e| ExtractionError::corrupt(kind, e))
}

fn read_part(
    archive: &mut ZipArchive<Cursor<&[u8]>>,
    name: &str,
    kind: DocumentKind,
) -> Result<String, ExtractionError> {
    let mut part = archive
        .by_name(name)
        .map_err(|e| ExtractionError::corrupt(kind, format!("{}: {}", name, e)))?;

    let mut xml = String::new();
    part.read_to_string(&mut xml)
        .map_err(|e| ExtractionError::corrupt(kind, format!("{}: {}", name, e)))?;
    Ok(xml)
}

/// Collect the text of `t` elements (w:t in Word, a:t in DrawingML);
/// a closing paragraph element ends the line.
fn text_runs(xml: &str, kind: DocumentKind) -> Result<String, ExtractionError> {
    let mut reader = Reader::from_str(xml);
    let mut out = String::new();
    let mut in_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                if e.local_name().as_ref() == b"t" {
                    in_text = true;
                }
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => out.push('\n'),
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"tab" => out.push('\t'),
                b"br" | b"cr" => out.push('\n'),
                _ => {}
            },
            Ok(Event::Text(e)) if in_text => {
                let text = e.unescape().map_err(|err| ExtractionError::corrupt(kind, err))?;
                out.push_str(&text);
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(ExtractionError::corrupt(kind, e)),
            _ => {}
        }
    }

    Ok(out)
}
