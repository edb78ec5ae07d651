use crate::error::IngestError;
use lopdf::Document;
use std::fs;
use std::path::Path;

/// Returns the textual content of a file as a single string.
///
/// PDFs are extracted page by page in page order; a page whose text cannot
/// be decoded contributes an empty string instead of failing the document,
/// and pages are joined with a newline. Every other file is read as bytes
/// and decoded lossily, so stray invalid UTF-8 never aborts a run. Only a
/// file that cannot be opened at all is an error.
pub fn extract_text(path: &Path) -> Result<String, IngestError> {
    let is_pdf = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));

    let bytes = fs::read(path)?;

    if is_pdf {
        return extract_pdf_text(&bytes);
    }

    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn extract_pdf_text(bytes: &[u8]) -> Result<String, IngestError> {
    let document =
        Document::load_mem(bytes).map_err(|error| IngestError::PdfParse(error.to_string()))?;

    let pages = document
        .get_pages()
        .keys()
        .map(|page_no| document.extract_text(&[*page_no]).unwrap_or_default())
        .collect::<Vec<_>>();

    Ok(pages.join("\n"))
}
