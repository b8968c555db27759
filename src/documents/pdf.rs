use super::{ExtractionError, ExtractionResult};
use lopdf::Document;
use std::path::Path;

/// Text of each page, in page order.
pub(super) fn load_pages(path: &Path) -> ExtractionResult<Vec<String>> {
    let document = Document::load(path).map_err(|err| ExtractionError::Pdf(err.to_string()))?;
    let pages = document.get_pages();
    if pages.is_empty() {
        return Err(ExtractionError::Empty);
    }

    pages
        .keys()
        .map(|&page_number| {
            document
                .extract_text(&[page_number])
                .map(|text| text.trim_end_matches('\n').to_string())
                .map_err(|err| ExtractionError::Pdf(format!("page {page_number}: {err}")))
        })
        .collect()
}
