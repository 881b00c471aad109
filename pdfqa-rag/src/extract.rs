//! PDF text extraction into per-page [`Page`]s.
//!
//! This module is only available when the `pdf` feature is enabled.
//!
//! Extraction tries `pdf-extract` first and falls back to `lopdf`'s own text
//! extraction when it fails or panics on unusual fonts.

use tracing::{debug, warn};

use crate::document::Page;
use crate::error::{RagError, Result};

/// Extract the text of every page of a PDF.
///
/// Runs on the blocking thread pool. Pages are numbered from 1 and tagged
/// with `source`; pages without text are dropped.
///
/// # Errors
///
/// Returns [`RagError::Extraction`] if the bytes are not a readable PDF or no
/// page contains text.
pub async fn extract_pages(bytes: Vec<u8>, source: String) -> Result<Vec<Page>> {
    tokio::task::spawn_blocking(move || extract_pages_blocking(&bytes, &source))
        .await
        .map_err(|e| RagError::Extraction(format!("extraction task failed: {e}")))?
}

/// Synchronous variant of [`extract_pages`].
pub fn extract_pages_blocking(bytes: &[u8], source: &str) -> Result<Vec<Page>> {
    let attempt = std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem_by_pages(bytes));
    let raw_pages = match attempt {
        Ok(Ok(pages)) => pages,
        Ok(Err(e)) => {
            warn!(source, error = %e, "pdf-extract failed, trying lopdf fallback");
            extract_with_lopdf(bytes)?
        }
        Err(_) => {
            warn!(source, "pdf-extract panicked, trying lopdf fallback");
            extract_with_lopdf(bytes)?
        }
    };

    let pages: Vec<Page> = raw_pages
        .into_iter()
        .enumerate()
        .filter_map(|(i, text)| {
            let text = clean_text(&text);
            (!text.is_empty()).then(|| Page::new(text, i + 1).with_source(source))
        })
        .collect();

    if pages.is_empty() {
        return Err(RagError::Extraction(format!("no text could be extracted from '{source}'")));
    }

    debug!(source, page_count = pages.len(), "extracted pages");
    Ok(pages)
}

fn extract_with_lopdf(bytes: &[u8]) -> Result<Vec<String>> {
    let doc = lopdf::Document::load_mem(bytes)
        .map_err(|e| RagError::Extraction(format!("failed to load PDF: {e}")))?;

    let page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();
    Ok(page_numbers
        .into_iter()
        .map(|n| {
            doc.extract_text(&[n]).unwrap_or_else(|e| {
                debug!(page = n, error = %e, "could not extract page text");
                String::new()
            })
        })
        .collect())
}

/// Strip NUL characters and surrounding whitespace.
fn clean_text(text: &str) -> String {
    text.replace('\0', "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use lopdf::content::{Content, Operation};
    use lopdf::{Document, Object, Stream, dictionary};

    use super::*;

    fn pdf_with_pages(lines: &[&str]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids: Vec<Object> = Vec::new();
        for line in lines {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 24.into()]),
                    Operation::new("Td", vec![72.into(), 700.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*line)]),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id =
                doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn extracts_one_page_per_pdf_page() {
        let bytes = pdf_with_pages(&["The sky is blue.", "The grass is green."]);
        let pages = extract_pages_blocking(&bytes, "colors.pdf").unwrap();

        assert_eq!(pages.len(), 2);
        assert!(pages[0].text.contains("sky"));
        assert!(pages[1].text.contains("grass"));
        assert_eq!(pages[1].page_number(), Some(2));
        assert_eq!(pages[0].metadata.get("source").map(String::as_str), Some("colors.pdf"));
    }

    #[test]
    fn garbage_bytes_are_an_extraction_error() {
        let err = extract_pages_blocking(b"definitely not a pdf", "junk.pdf").unwrap_err();
        assert!(matches!(err, RagError::Extraction(_)));
    }

    #[test]
    fn clean_text_strips_nul_and_whitespace() {
        assert_eq!(clean_text("\0 hello \n"), "hello");
    }

    #[tokio::test]
    async fn async_wrapper_reports_errors() {
        let err = extract_pages(Vec::new(), "empty.pdf".into()).await.unwrap_err();
        assert!(matches!(err, RagError::Extraction(_)));
    }
}
