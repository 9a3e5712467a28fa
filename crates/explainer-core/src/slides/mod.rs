//! Slide text extraction.
//!
//! Turns a slide deck into one [`TextUnit`] per slide, in deck order. Blank
//! slides are kept so indices line up with the source document.

mod pdf;
mod pptx;

use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::jobs::TextUnit;

pub use pdf::extract_pdf_pages;
pub use pptx::extract_pptx_slides;

/// Deck formats we can read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeckFormat {
    Pptx,
    Pdf,
}

impl DeckFormat {
    /// Detect the format from a file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "pptx" => Some(Self::Pptx),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }
}

/// Whether `path` names a deck format we can read.
pub fn is_supported(path: &Path) -> bool {
    DeckFormat::from_path(path).is_some()
}

/// Extract per-slide text from a deck on disk.
pub fn extract_slides(path: &Path) -> Result<Vec<TextUnit>> {
    let Some(format) = DeckFormat::from_path(path) else {
        bail!("Unsupported deck format: {}", path.display());
    };
    let bytes = std::fs::read(path).context("Failed to read deck file")?;
    extract_slides_from_bytes(format, &bytes)
}

/// Extract per-slide text from deck bytes already in memory.
pub fn extract_slides_from_bytes(format: DeckFormat, bytes: &[u8]) -> Result<Vec<TextUnit>> {
    let texts = match format {
        DeckFormat::Pptx => extract_pptx_slides(bytes)?,
        DeckFormat::Pdf => extract_pdf_pages(bytes)?,
    };

    tracing::debug!(
        slides = texts.len(),
        blank = texts.iter().filter(|t| t.is_empty()).count(),
        "Extracted slide text"
    );

    Ok(texts
        .into_iter()
        .enumerate()
        .map(|(index, content)| TextUnit::new(index, content))
        .collect())
}

#[cfg(test)]
pub(crate) mod testing {
    //! Builders for small in-memory decks.

    use std::io::{Cursor, Write};

    use zip::write::SimpleFileOptions;

    const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"/>"#;

    /// Escape text for inclusion in slide XML.
    fn escape(text: &str) -> String {
        text.replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;")
    }

    /// Slide XML with one text shape per entry; each shape's lines become paragraphs.
    pub fn slide_xml(shapes: &[&[&str]]) -> String {
        let mut body = String::new();
        for (i, paragraphs) in shapes.iter().enumerate() {
            body.push_str(&format!(
                r#"<p:sp><p:nvSpPr><p:cNvPr id="{}" name="Shape {}"/></p:nvSpPr><p:txBody><a:bodyPr/>"#,
                i + 2,
                i + 1
            ));
            for paragraph in paragraphs.iter() {
                body.push_str(&format!(
                    "<a:p><a:r><a:rPr lang=\"en-US\"/><a:t>{}</a:t></a:r></a:p>",
                    escape(paragraph)
                ));
            }
            body.push_str("</p:txBody></p:sp>");
        }

        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"><p:cSld><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/></p:nvGrpSpPr><p:grpSpPr/>{body}</p:spTree></p:cSld></p:sld>"#
        )
    }

    /// Build a PPTX container whose slides each hold a single one-line shape.
    /// Empty strings produce slides without any shapes.
    pub fn build_pptx(slides: &[&str]) -> Vec<u8> {
        let xmls: Vec<String> = slides
            .iter()
            .map(|text| {
                if text.is_empty() {
                    slide_xml(&[])
                } else {
                    let lines: &[&str] = &[*text];
                    slide_xml(&[lines])
                }
            })
            .collect();
        build_pptx_from_xml(&xmls, true)
    }

    /// Build a PPTX container from raw slide XML.
    ///
    /// Slides are stored as `slide{n}.xml` in reverse zip order so readers
    /// cannot rely on archive order. With `with_manifest`, the presentation
    /// part lists them in the given order.
    pub fn build_pptx_from_xml(slides: &[String], with_manifest: bool) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));

        writer.start_file("[Content_Types].xml", SimpleFileOptions::default()).unwrap();
        writer.write_all(CONTENT_TYPES.as_bytes()).unwrap();

        if with_manifest {
            let mut ids = String::new();
            let mut rels = String::new();
            for n in 1..=slides.len() {
                ids.push_str(&format!(r#"<p:sldId id="{}" r:id="rId{}"/>"#, 255 + n, n + 1));
                rels.push_str(&format!(
                    r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide" Target="slides/slide{}.xml"/>"#,
                    n + 1,
                    n
                ));
            }

            writer.start_file("ppt/presentation.xml", SimpleFileOptions::default()).unwrap();
            writer
                .write_all(
                    format!(
                        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:presentation xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"><p:sldIdLst>{ids}</p:sldIdLst></p:presentation>"#
                    )
                    .as_bytes(),
                )
                .unwrap();

            writer
                .start_file("ppt/_rels/presentation.xml.rels", SimpleFileOptions::default())
                .unwrap();
            writer
                .write_all(
                    format!(
                        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster" Target="slideMasters/slideMaster1.xml"/>{rels}</Relationships>"#
                    )
                    .as_bytes(),
                )
                .unwrap();
        }

        for (i, xml) in slides.iter().enumerate().rev() {
            writer
                .start_file(format!("ppt/slides/slide{}.xml", i + 1), SimpleFileOptions::default())
                .unwrap();
            writer.write_all(xml.as_bytes()).unwrap();
        }

        writer.finish().unwrap().into_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_detection() {
        assert_eq!(
            DeckFormat::from_path(Path::new("talk.PPTX")),
            Some(DeckFormat::Pptx)
        );
        assert_eq!(
            DeckFormat::from_path(Path::new("/tmp/deck.pdf")),
            Some(DeckFormat::Pdf)
        );
        assert_eq!(DeckFormat::from_path(Path::new("notes.txt")), None);
        assert_eq!(DeckFormat::from_path(Path::new("no_extension")), None);
    }

    #[test]
    fn test_extract_slides_keeps_blank_indices() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("deck.pptx");
        std::fs::write(&path, testing::build_pptx(&["A", "", "B", "C"])).unwrap();

        let units = extract_slides(&path).unwrap();

        assert_eq!(
            units,
            vec![
                TextUnit::new(0, "A"),
                TextUnit::new(1, ""),
                TextUnit::new(2, "B"),
                TextUnit::new(3, "C"),
            ]
        );
    }

    #[test]
    fn test_extract_slides_unsupported_extension() {
        let err = extract_slides(Path::new("/tmp/slides.key")).unwrap_err();
        assert!(err.to_string().contains("Unsupported deck format"));
    }

    #[test]
    fn test_extract_slides_missing_file() {
        let err = extract_slides(Path::new("/nonexistent/deck.pptx")).unwrap_err();
        assert!(
            err.to_string().contains("Failed to read deck file"),
            "unexpected error: {err}"
        );
    }
}
