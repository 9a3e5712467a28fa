use anyhow::{Context, Result};

/// Extract the text of each page of a PDF deck; one page is one slide.
pub fn extract_pdf_pages(pdf_bytes: &[u8]) -> Result<Vec<String>> {
    let doc = lopdf::Document::load_mem(pdf_bytes).context("Failed to parse PDF")?;

    let mut pages: Vec<u32> = doc.get_pages().keys().cloned().collect();
    pages.sort(); // Ensure pages are in order

    let texts: Vec<String> = pages
        .iter()
        .map(|page_num| {
            doc.extract_text(&[*page_num])
                .map(|text| text.trim().to_string())
                .unwrap_or_else(|e| {
                    tracing::warn!(page = page_num, error = %e, "No extractable text on page");
                    String::new()
                })
        })
        .collect();

    tracing::debug!(
        "Extracted {} chars from {} pages",
        texts.iter().map(String::len).sum::<usize>(),
        texts.len()
    );

    Ok(texts)
}
