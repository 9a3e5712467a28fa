use std::collections::HashMap;
use std::io::{Cursor, Read};

use anyhow::{bail, Context, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use zip::ZipArchive;

type Archive<'a> = ZipArchive<Cursor<&'a [u8]>>;

const PRESENTATION_PART: &str = "ppt/presentation.xml";
const PRESENTATION_RELS: &str = "ppt/_rels/presentation.xml.rels";
const SLIDES_DIR: &str = "ppt/slides/";

/// Extract the text of every slide in a PPTX file, in presentation order.
///
/// A slide's text is each text shape's paragraphs joined by newlines, the
/// shapes joined by a space, trimmed.
pub fn extract_pptx_slides(bytes: &[u8]) -> Result<Vec<String>> {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).context("Failed to open PPTX container")?;

    let parts = match manifest_order(&mut archive) {
        Ok(parts) => parts,
        Err(e) => {
            tracing::debug!(error = %e, "No usable slide manifest, ordering slides by part name");
            numeric_order(&archive)
        }
    };

    if parts.is_empty() && archive.by_name(PRESENTATION_PART).is_err() {
        bail!("Not a PPTX presentation: missing {PRESENTATION_PART}");
    }

    parts
        .iter()
        .map(|part| {
            let xml = read_part(&mut archive, part)?;
            slide_text(&xml).with_context(|| format!("Failed to parse {part}"))
        })
        .collect()
}

fn read_part(archive: &mut Archive<'_>, name: &str) -> Result<String> {
    let mut file = archive
        .by_name(name)
        .with_context(|| format!("Missing part {name}"))?;
    let mut xml = String::new();
    file.read_to_string(&mut xml)
        .with_context(|| format!("Failed to read {name}"))?;
    Ok(xml)
}

/// Slide parts in the order listed by `p:sldIdLst`.
fn manifest_order(archive: &mut Archive<'_>) -> Result<Vec<String>> {
    let presentation = read_part(archive, PRESENTATION_PART)?;
    let rels = read_part(archive, PRESENTATION_RELS)?;

    let targets = relationship_targets(&rels)?;
    let ids = slide_relationship_ids(&presentation)?;

    let mut parts = Vec::with_capacity(ids.len());
    for id in ids {
        let Some(target) = targets.get(&id) else {
            bail!("Slide relationship {id} has no target");
        };
        let part = resolve_target(target);
        if archive.index_for_name(&part).is_none() {
            bail!("Slide part {part} is missing from the container");
        }
        parts.push(part);
    }
    Ok(parts)
}

/// `ppt/slides/slideN.xml` parts sorted by N.
fn numeric_order(archive: &Archive<'_>) -> Vec<String> {
    let mut numbered: Vec<(u32, String)> = archive
        .file_names()
        .filter_map(|name| {
            let n = name
                .strip_prefix(SLIDES_DIR)?
                .strip_prefix("slide")?
                .strip_suffix(".xml")?
                .parse::<u32>()
                .ok()?;
            Some((n, name.to_string()))
        })
        .collect();
    numbered.sort();
    numbered.into_iter().map(|(_, name)| name).collect()
}

/// Relationship targets are relative to `ppt/` unless absolute.
fn resolve_target(target: &str) -> String {
    match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("ppt/{}", target.trim_start_matches("./")),
    }
}

fn attribute(e: &BytesStart<'_>, name: &[u8], prefixed: bool) -> Result<Option<String>> {
    for attr in e.attributes() {
        let attr = attr?;
        if attr.key.local_name().as_ref() == name && attr.key.prefix().is_some() == prefixed {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

fn relationship_targets(xml: &str) -> Result<HashMap<String, String>> {
    let mut reader = Reader::from_str(xml);
    let mut targets = HashMap::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"Relationship" => {
                if let (Some(id), Some(target)) =
                    (attribute(&e, b"Id", false)?, attribute(&e, b"Target", false)?)
                {
                    targets.insert(id, target);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(targets)
}

fn slide_relationship_ids(xml: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    let mut ids = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"sldId" => {
                if let Some(id) = attribute(&e, b"id", true)? {
                    ids.push(id);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(ids)
}

/// Text of one slide's XML part.
fn slide_text(xml: &str) -> Result<String> {
    let mut reader = Reader::from_str(xml);

    let mut shapes: Vec<String> = Vec::new();
    let mut paragraphs: Vec<String> = Vec::new();
    let mut paragraph = String::new();
    let mut shape_depth = 0usize;
    let mut in_run_text = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"sp" => {
                    if shape_depth == 0 {
                        paragraphs.clear();
                    }
                    shape_depth += 1;
                }
                b"p" if shape_depth > 0 => paragraph.clear(),
                b"t" if shape_depth > 0 => in_run_text = true,
                _ => {}
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"br" if shape_depth > 0 => paragraph.push('\n'),
                b"p" if shape_depth > 0 => paragraphs.push(String::new()),
                b"sp" if shape_depth == 0 => shapes.push(String::new()),
                _ => {}
            },
            Event::Text(t) if in_run_text => paragraph.push_str(&t.unescape()?),
            Event::End(e) => match e.local_name().as_ref() {
                b"t" => in_run_text = false,
                b"p" if shape_depth > 0 => paragraphs.push(std::mem::take(&mut paragraph)),
                b"sp" if shape_depth > 0 => {
                    shape_depth -= 1;
                    if shape_depth == 0 {
                        shapes.push(paragraphs.join("\n"));
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(shapes.join(" ").trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slides::testing::{build_pptx, build_pptx_from_xml, slide_xml};

    #[test]
    fn test_extract_in_manifest_order() {
        let bytes = build_pptx(&["First", "Second", "Third"]);
        let slides = extract_pptx_slides(&bytes).unwrap();
        assert_eq!(slides, vec!["First", "Second", "Third"]);
    }

    #[test]
    fn test_numeric_fallback_without_manifest() {
        let xmls: Vec<String> = (1..=11)
            .map(|n| {
                let text = format!("Slide {n}");
                let lines: &[&str] = &[text.as_str()];
                slide_xml(&[lines])
            })
            .collect();
        let bytes = build_pptx_from_xml(&xmls, false);

        let slides = extract_pptx_slides(&bytes).unwrap();

        assert_eq!(slides.len(), 11);
        assert_eq!(slides[1], "Slide 2");
        // slide10 must not sort before slide2
        assert_eq!(slides[9], "Slide 10");
    }

    #[test]
    fn test_paragraphs_and_shapes_are_joined() {
        let title: &[&str] = &["Title"];
        let body: &[&str] = &["Line one", "Line two"];
        let xml = slide_xml(&[title, body]);

        assert_eq!(slide_text(&xml).unwrap(), "Title Line one\nLine two");
    }

    #[test]
    fn test_entities_are_unescaped() {
        let lines: &[&str] = &["Fish & <Chips>"];
        let xml = slide_xml(&[lines]);
        assert_eq!(slide_text(&xml).unwrap(), "Fish & <Chips>");
    }

    #[test]
    fn test_text_outside_shapes_is_ignored() {
        let xml = r#"<p:sld xmlns:a="a" xmlns:p="p"><p:cSld><p:spTree>
            <p:graphicFrame><a:tbl><a:tc><a:txBody><a:p><a:r><a:t>table cell</a:t></a:r></a:p></a:txBody></a:tc></a:tbl></p:graphicFrame>
            <p:sp><p:txBody><a:p><a:r><a:t>kept</a:t></a:r></a:p></p:txBody></p:sp>
        </p:spTree></p:cSld></p:sld>"#;
        assert_eq!(slide_text(xml).unwrap(), "kept");
    }

    #[test]
    fn test_blank_slide_is_empty_string() {
        let bytes = build_pptx(&["", "Only text"]);
        let slides = extract_pptx_slides(&bytes).unwrap();
        assert_eq!(slides, vec!["", "Only text"]);
    }

    #[test]
    fn test_garbage_is_rejected() {
        let err = extract_pptx_slides(b"this is not a zip file").unwrap_err();
        assert!(err.to_string().contains("Failed to open PPTX container"));
    }

    #[test]
    fn test_resolve_target() {
        assert_eq!(resolve_target("slides/slide1.xml"), "ppt/slides/slide1.xml");
        assert_eq!(resolve_target("/ppt/slides/slide3.xml"), "ppt/slides/slide3.xml");
    }
}
