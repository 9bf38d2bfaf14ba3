//! Text extraction for the supported source formats.
//!
//! The loader supplies bytes plus a content-type; this module returns plain
//! UTF-8 text, one entry per page for paged formats. Failures come back as
//! [`ExtractError`] and the indexer applies its parse-error policy. A panic
//! inside the PDF parser is caught and reported as [`ExtractError::Pdf`].

use thiserror::Error;

use crate::models::{CONTENT_TYPE_PDF, CONTENT_TYPE_TEXT};

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unsupported content-type: {0}")]
    UnsupportedContentType(String),
    #[error("PDF extraction failed: {0}")]
    Pdf(String),
    #[error("file is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// One extracted text segment. `page` is 1-based and only set for PDFs.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedPage {
    pub page: Option<u32>,
    pub text: String,
}

/// Extract text from file content according to its content-type.
pub fn extract_pages(bytes: &[u8], content_type: &str) -> Result<Vec<ExtractedPage>, ExtractError> {
    match content_type {
        CONTENT_TYPE_TEXT => extract_plain(bytes),
        CONTENT_TYPE_PDF => extract_pdf(bytes),
        _ => Err(ExtractError::UnsupportedContentType(
            content_type.to_string(),
        )),
    }
}

fn extract_plain(bytes: &[u8]) -> Result<Vec<ExtractedPage>, ExtractError> {
    let text = String::from_utf8(bytes.to_vec())?;
    Ok(vec![ExtractedPage { page: None, text }])
}

fn extract_pdf(bytes: &[u8]) -> Result<Vec<ExtractedPage>, ExtractError> {
    let pages = catch_pdf_panic(|| pdf_extract::extract_text_from_mem_by_pages(bytes))?
        .map_err(|e| ExtractError::Pdf(e.to_string()))?;

    Ok(pages
        .into_iter()
        .enumerate()
        .map(|(i, text)| ExtractedPage {
            page: Some(i as u32 + 1),
            text,
        })
        .collect())
}

/// Run `f`, turning a panic into [`ExtractError::Pdf`].
fn catch_pdf_panic<T>(f: impl FnOnce() -> T) -> Result<T, ExtractError> {
    std::panic::catch_unwind(std::panic::AssertUnwindSafe(f)).map_err(|payload| {
        let msg = if let Some(s) = payload.downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic".to_string()
        };
        ExtractError::Pdf(format!("parser panicked: {}", msg))
    })
}
