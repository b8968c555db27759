use super::{ExtractionError, ExtractionResult};
use quick_xml::Reader;
use quick_xml::events::Event;
use std::fs::File;
use std::io::Read;
use std::path::Path;

const BODY_PART: &str = "word/document.xml";

/// Paragraph texts of the document body, in source order.
pub(super) fn load_paragraphs(path: &Path) -> ExtractionResult<Vec<String>> {
    let file = File::open(path).map_err(|err| ExtractionError::Io(err.to_string()))?;
    let mut archive = zip::ZipArchive::new(file).map_err(docx_error)?;
    let mut part = archive.by_name(BODY_PART).map_err(docx_error)?;

    let mut xml = String::new();
    part.read_to_string(&mut xml)
        .map_err(|err| ExtractionError::Docx(format!("{BODY_PART}: {err}")))?;

    paragraphs_from_xml(&xml)
}

fn paragraphs_from_xml(xml: &str) -> ExtractionResult<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    let mut paragraphs = Vec::new();
    let mut current = String::new();
    let mut in_text_run = false;

    loop {
        match reader.read_event().map_err(docx_error)? {
            Event::Start(tag) if tag.local_name().as_ref() == b"t" => in_text_run = true,
            Event::End(tag) => match tag.local_name().as_ref() {
                b"t" => in_text_run = false,
                b"p" => paragraphs.push(std::mem::take(&mut current)),
                _ => {}
            },
            Event::Empty(tag) => match tag.local_name().as_ref() {
                b"tab" => current.push('\t'),
                b"br" | b"cr" => current.push('\n'),
                b"p" => paragraphs.push(String::new()),
                _ => {}
            },
            Event::Text(text) if in_text_run => {
                current.push_str(&text.unescape().map_err(docx_error)?);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !current.is_empty() {
        paragraphs.push(current);
    }
    Ok(paragraphs)
}

fn docx_error(err: impl std::fmt::Display) -> ExtractionError {
    ExtractionError::Docx(err.to_string())
}
