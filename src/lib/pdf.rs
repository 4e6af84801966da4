//! PDF serialization of laid out pages.
//!
//! Every page of a [`PageWriter`] becomes one PDF page whose content stream replays
//! the recorded drawing operations. Text uses the four standard Type1 fonts with
//! WinAnsiEncoding, so no font program is embedded. Link areas become `/Link`
//! annotations: internal links jump to the page their handle is bound to and
//! external links open a URI.
//!
//! Layout coordinates are millimetres from the top-left corner; PDF user space is
//! points from the bottom-left corner. [`to_pdf_x`] and [`to_pdf_y`] convert.

use crate::fonts::{to_winansi_bytes, FontFace};
use crate::styling::Rgb;
use crate::writer::{DrawOp, LinkArea, LinkTarget, Page, PageWriter};
use crate::PortfolioError;
use log::debug;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use std::path::Path;

/// PDF points per millimetre.
pub const PT_PER_MM: f32 = 72.0 / 25.4;

/// Metadata written to the document information dictionary.
#[derive(Debug, Clone, Default)]
pub struct DocumentInfo {
    pub title: String,
    pub author: Option<String>,
}

pub fn to_pdf_x(x: f32) -> f32 {
    x * PT_PER_MM
}

pub fn to_pdf_y(y: f32, page_height: f32) -> f32 {
    (page_height - y) * PT_PER_MM
}

fn real(value: f32) -> Object {
    value.into()
}

fn name(value: &str) -> Object {
    Object::Name(value.as_bytes().to_vec())
}

fn color_operands(color: Rgb) -> Vec<Object> {
    let (r, g, b) = color.to_unit();
    vec![real(r), real(g), real(b)]
}

fn pdf_error(message: impl Into<String>) -> PortfolioError {
    PortfolioError::PdfError {
        message: message.into(),
        path: None,
        suggestion: None,
    }
}

/// Builds the content stream of one page.
fn page_content(page: &Page, page_height: f32) -> Content {
    let mut operations = Vec::new();
    for op in &page.ops {
        match op {
            DrawOp::Text {
                x,
                y,
                font,
                color,
                text,
            } => {
                operations.push(Operation::new("BT", vec![]));
                operations.push(Operation::new(
                    "Tf",
                    vec![name(font.face.resource_name()), real(font.size)],
                ));
                operations.push(Operation::new("rg", color_operands(*color)));
                operations.push(Operation::new(
                    "Td",
                    vec![real(to_pdf_x(*x)), real(to_pdf_y(*y, page_height))],
                ));
                operations.push(Operation::new(
                    "Tj",
                    vec![Object::string_literal(to_winansi_bytes(text))],
                ));
                operations.push(Operation::new("ET", vec![]));
            }
            DrawOp::Rect {
                x,
                y,
                width,
                height,
                fill,
            } => {
                operations.push(Operation::new("rg", color_operands(*fill)));
                operations.push(Operation::new(
                    "re",
                    vec![
                        real(to_pdf_x(*x)),
                        real(to_pdf_y(y + height, page_height)),
                        real(width * PT_PER_MM),
                        real(height * PT_PER_MM),
                    ],
                ));
                operations.push(Operation::new("f", vec![]));
            }
            DrawOp::Line {
                x1,
                y1,
                x2,
                y2,
                width,
                color,
            } => {
                operations.push(Operation::new("RG", color_operands(*color)));
                operations.push(Operation::new("w", vec![real(width * PT_PER_MM)]));
                operations.push(Operation::new(
                    "m",
                    vec![real(to_pdf_x(*x1)), real(to_pdf_y(*y1, page_height))],
                ));
                operations.push(Operation::new(
                    "l",
                    vec![real(to_pdf_x(*x2)), real(to_pdf_y(*y2, page_height))],
                ));
                operations.push(Operation::new("S", vec![]));
            }
        }
    }
    Content { operations }
}

fn link_annotation(
    link: &LinkArea,
    writer: &PageWriter,
    page_ids: &[ObjectId],
    page_height: f32,
) -> Result<Dictionary, PortfolioError> {
    let rect = vec![
        real(to_pdf_x(link.x)),
        real(to_pdf_y(link.y + link.height, page_height)),
        real(to_pdf_x(link.x + link.width)),
        real(to_pdf_y(link.y, page_height)),
    ];
    let mut annotation = dictionary! {
        "Type" => "Annot",
        "Subtype" => "Link",
        "Rect" => rect,
        "Border" => vec![Object::Integer(0), Object::Integer(0), Object::Integer(0)],
    };
    match &link.target {
        LinkTarget::Internal(handle) => {
            let page = writer.link_page(*handle).ok_or_else(|| PortfolioError::LayoutError {
                message: format!("link {} was never bound to a page", handle.index()),
            })?;
            let target = page
                .checked_sub(1)
                .and_then(|index| page_ids.get(index as usize))
                .ok_or_else(|| PortfolioError::LayoutError {
                    message: format!(
                        "link {} points to page {} of a {}-page document",
                        handle.index(),
                        page,
                        page_ids.len()
                    ),
                })?;
            annotation.set(
                "Dest",
                vec![
                    Object::Reference(*target),
                    name("XYZ"),
                    Object::Null,
                    real(page_height * PT_PER_MM),
                    Object::Null,
                ],
            );
        }
        LinkTarget::Uri(uri) => {
            annotation.set(
                "A",
                dictionary! {
                    "S" => "URI",
                    "URI" => Object::string_literal(uri.as_bytes().to_vec()),
                },
            );
        }
    }
    Ok(annotation)
}

/// Serializes the pages of `writer` into a PDF file in memory.
pub fn write_pdf(writer: &PageWriter, info: &DocumentInfo) -> Result<Vec<u8>, PortfolioError> {
    let style = writer.style();
    let page_height = style.page.height;
    let media_box = vec![
        Object::Integer(0),
        Object::Integer(0),
        real(style.page.width * PT_PER_MM),
        real(page_height * PT_PER_MM),
    ];

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut fonts = Dictionary::new();
    for face in FontFace::ALL {
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => face.base_font(),
            "Encoding" => "WinAnsiEncoding",
        });
        fonts.set(face.resource_name(), font_id);
    }
    let resources_id = doc.add_object(dictionary! { "Font" => fonts });

    // Page ids are allocated up front so links can point at later pages.
    let page_ids: Vec<ObjectId> = writer.pages().iter().map(|_| doc.new_object_id()).collect();

    for (page, page_id) in writer.pages().iter().zip(&page_ids) {
        let content = page_content(page, page_height)
            .encode()
            .map_err(|e| pdf_error(format!("Failed to encode page content: {}", e)))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, content));

        let mut annotations = Vec::with_capacity(page.links.len());
        for link in &page.links {
            let annotation = link_annotation(link, writer, &page_ids, page_height)?;
            annotations.push(Object::Reference(doc.add_object(annotation)));
        }

        let mut page_dict = dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => media_box.clone(),
        };
        if !annotations.is_empty() {
            page_dict.set("Annots", annotations);
        }
        doc.objects.insert(*page_id, Object::Dictionary(page_dict));
    }

    let kids: Vec<Object> = page_ids.iter().map(|id| Object::Reference(*id)).collect();
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => Object::Integer(page_ids.len() as i64),
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    let mut info_dict = dictionary! {
        "Title" => Object::string_literal(to_winansi_bytes(&info.title)),
        "Producer" => Object::string_literal(concat!("github-portfolio ", env!("CARGO_PKG_VERSION"))),
    };
    if let Some(author) = &info.author {
        info_dict.set("Author", Object::string_literal(to_winansi_bytes(author)));
    }
    let info_id = doc.add_object(info_dict);
    doc.trailer.set("Root", catalog_id);
    doc.trailer.set("Info", info_id);
    doc.compress();

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)
        .map_err(|e| pdf_error(format!("Failed to serialize PDF: {}", e)))?;
    debug!(
        "serialized {} page(s) into {} bytes",
        page_ids.len(),
        bytes.len()
    );
    Ok(bytes)
}

/// Serializes the pages of `writer` and writes them to `path`.
pub fn save_pdf(
    writer: &PageWriter,
    info: &DocumentInfo,
    path: &Path,
) -> Result<(), PortfolioError> {
    let bytes = write_pdf(writer, info).map_err(|e| match e {
        PortfolioError::PdfError {
            message,
            suggestion,
            ..
        } => PortfolioError::PdfError {
            message,
            path: Some(path.display().to_string()),
            suggestion,
        },
        other => other,
    })?;
    std::fs::write(path, bytes).map_err(|e| PortfolioError::IoError {
        message: format!("Failed to write PDF: {}", e),
        path: path.display().to_string(),
        suggestion: "Check that the output directory exists and is writable".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::styling::LayoutStyle;
    use crate::writer::Align;

    #[test]
    fn test_coordinate_conversion() {
        assert!((to_pdf_x(25.4) - 72.0).abs() < 1e-3);
        assert!((to_pdf_y(0.0, 297.0) - 841.89).abs() < 0.01);
        assert!(to_pdf_y(297.0, 297.0).abs() < 1e-3);
    }

    #[test]
    fn test_write_pdf_pages_and_links() {
        let mut writer = PageWriter::new(LayoutStyle::default());
        writer.add_page();
        let handle = writer.register_link();
        writer.cell(40.0, 5.0, "go", Align::Left, Some(LinkTarget::Internal(handle)));
        writer.cell(
            40.0,
            5.0,
            "site",
            Align::Left,
            Some(LinkTarget::Uri("https://example.com".to_string())),
        );
        writer.fill_rect(20.0, 40.0, 3.0, 3.0, Rgb(0x21, 0x6e, 0x39));
        writer.add_page();
        writer.bind_link(handle, 2).unwrap();

        let bytes = write_pdf(
            &writer,
            &DocumentInfo {
                title: "Test".to_string(),
                author: None,
            },
        )
        .unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        let pages = doc.get_pages();
        assert_eq!(pages.len(), 2);

        let first = doc.get_dictionary(pages[&1]).unwrap();
        let annots = first.get(b"Annots").unwrap().as_array().unwrap();
        assert_eq!(annots.len(), 2);
        let annot = doc
            .get_dictionary(annots[0].as_reference().unwrap())
            .unwrap();
        let dest = annot.get(b"Dest").unwrap().as_array().unwrap();
        assert_eq!(dest[0].as_reference().unwrap(), pages[&2]);

        let content = Content::decode(&doc.get_page_content(pages[&1]).unwrap()).unwrap();
        assert!(content.operations.iter().any(|op| op.operator == "re"));
        assert!(content.operations.iter().any(|op| op.operator == "Tj"));
    }

    #[test]
    fn test_unbound_link_is_rejected() {
        let mut writer = PageWriter::new(LayoutStyle::default());
        writer.add_page();
        let handle = writer.register_link();
        writer.cell(40.0, 5.0, "go", Align::Left, Some(LinkTarget::Internal(handle)));
        let err = write_pdf(&writer, &DocumentInfo::default()).unwrap_err();
        assert!(matches!(err, PortfolioError::LayoutError { .. }));
    }

    #[test]
    fn test_link_past_last_page_is_rejected() {
        let mut writer = PageWriter::new(LayoutStyle::default());
        writer.add_page();
        let handle = writer.register_link();
        writer.cell(40.0, 5.0, "go", Align::Left, Some(LinkTarget::Internal(handle)));
        writer.bind_link(handle, 5).unwrap();
        assert!(write_pdf(&writer, &DocumentInfo::default()).is_err());
    }
}
