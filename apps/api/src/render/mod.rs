//! Persona document renderer.
//!
//! Geometry is in millimetres measured from the top-left corner of an A4
//! page, then converted to PDF points (origin bottom-left) when the content
//! stream is written. The title sits at 10mm; entries start at 20mm and step
//! down 10mm each. An entry that would land below the bottom margin starts a
//! new page at the title offset.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use serde_json::Value;
use thiserror::Error;

use crate::forms::FormPayload;

pub const DOCUMENT_TITLE: &str = "Customer Personas";

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const LEFT_MM: f32 = 10.0;
const TITLE_TOP_MM: f32 = 10.0;
const FIRST_ENTRY_TOP_MM: f32 = 20.0;
const LINE_SPACING_MM: f32 = 10.0;
const BOTTOM_MARGIN_MM: f32 = 10.0;
const FONT_SIZE_PT: i64 = 16;
const FONT_RESOURCE: &str = "F1";

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("PDF encoding failed: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("PDF write failed: {0}")]
    Io(#[from] std::io::Error),
}

/// One line of text positioned on a page.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedLine {
    pub top_mm: f32,
    pub text: String,
}

/// Formats a single entry as `key: value`.
pub fn entry_line(key: &str, value: &Value) -> String {
    format!("{key}: {}", display_value(value))
}

/// Scalars are written bare and arrays are joined with commas, the way string
/// interpolation renders them. Objects are written as compact JSON.
fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => display_value(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        other => other.to_string(),
    }
}

/// Splits the title and entries into pages.
pub fn layout_pages(entries: &FormPayload) -> Vec<Vec<PlacedLine>> {
    let last_top_mm = PAGE_HEIGHT_MM - BOTTOM_MARGIN_MM;

    let mut pages = vec![vec![PlacedLine {
        top_mm: TITLE_TOP_MM,
        text: DOCUMENT_TITLE.to_string(),
    }]];
    let mut next_top_mm = FIRST_ENTRY_TOP_MM;

    for (key, value) in entries {
        if next_top_mm > last_top_mm {
            pages.push(Vec::new());
            next_top_mm = TITLE_TOP_MM;
        }
        if let Some(page) = pages.last_mut() {
            page.push(PlacedLine {
                top_mm: next_top_mm,
                text: entry_line(key, value),
            });
        }
        next_top_mm += LINE_SPACING_MM;
    }

    pages
}

/// Renders the persona entries into a PDF byte stream.
pub fn render_persona_pdf(entries: &FormPayload) -> Result<Vec<u8>, RenderError> {
    let pages = layout_pages(entries);

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            FONT_RESOURCE => font_id,
        },
    });

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for lines in &pages {
        let page_id = add_page(&mut doc, pages_id, lines)?;
        kids.push(page_id.into());
    }

    let page_count = kids.len() as i64;
    let pages_dict = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => page_count,
        "Resources" => resources_id,
        "MediaBox" => vec![
            0.into(),
            0.into(),
            mm_to_pt(PAGE_WIDTH_MM).into(),
            mm_to_pt(PAGE_HEIGHT_MM).into(),
        ],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)?;
    Ok(bytes)
}

fn add_page(
    doc: &mut Document,
    pages_id: ObjectId,
    lines: &[PlacedLine],
) -> Result<ObjectId, RenderError> {
    let mut operations = Vec::with_capacity(lines.len() * 4);
    for line in lines {
        operations.push(Operation::new("BT", vec![]));
        operations.push(Operation::new(
            "Tf",
            vec![FONT_RESOURCE.into(), FONT_SIZE_PT.into()],
        ));
        operations.push(Operation::new(
            "Td",
            vec![
                mm_to_pt(LEFT_MM).into(),
                mm_to_pt(PAGE_HEIGHT_MM - line.top_mm).into(),
            ],
        ));
        operations.push(Operation::new(
            "Tj",
            vec![Object::string_literal(encode_win_ansi(&line.text))],
        ));
        operations.push(Operation::new("ET", vec![]));
    }

    let content = Content { operations };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));

    Ok(doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    }))
}

fn mm_to_pt(mm: f32) -> i64 {
    (mm * 72.0 / 25.4).round() as i64
}

/// Latin-1 subset of WinAnsi; anything outside it becomes `?`.
fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .collect()
}
