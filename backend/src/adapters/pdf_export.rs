use crate::adapters::local_document::{Block, DocumentSource, Exporter};
use crate::error::{ReportError, ReportResult};
use crate::pipeline::capabilities::{ParagraphStyle, Rendering};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use genpdf::elements::{Break, Image as PdfImage, LinearLayout, Paragraph};
use genpdf::style::{Style, StyledString};
use genpdf::Document;
use image::imageops::FilterType;
use image::{load_from_memory, DynamicImage, GenericImageView};
use png::{BitDepth as PngBitDepth, ColorType as PngColorType, Encoder as PngEncoder};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

const IMAGE_DPI: f64 = 150.0;
/// Display sizes are expressed in CSS pixels.
const CSS_PX_PER_INCH: f64 = 96.0;
const BODY_FONT_SIZE: u8 = 10;
const HEADING_FONT_SIZE: u8 = 13;

/// Renders documents to PDF with genpdf.
pub struct PdfExporter {
    font_dir: PathBuf,
    font_family: String,
}

impl PdfExporter {
    pub fn new(font_dir: impl Into<PathBuf>, font_family: impl Into<String>) -> Self {
        Self {
            font_dir: font_dir.into(),
            font_family: font_family.into(),
        }
    }

    /// Load the configured font family, falling back to LiberationSans in the same directory.
    fn load_font(&self) -> ReportResult<genpdf::fonts::FontFamily<genpdf::fonts::FontData>> {
        if let Ok(family) = genpdf::fonts::from_files(&self.font_dir, &self.font_family, None) {
            return Ok(family);
        }
        genpdf::fonts::from_files(&self.font_dir, "LiberationSans", None).map_err(|e| {
            ReportError::Render(format!(
                "no usable font in {}: {}",
                self.font_dir.display(),
                e
            ))
        })
    }

    /// Configure a genpdf Document with font, title and page decorator.
    fn configure_document(&self, title: &str) -> ReportResult<Document> {
        let mut doc = Document::new(self.load_font()?);
        doc.set_title(title);
        doc.set_font_size(BODY_FONT_SIZE);
        doc.set_line_spacing(1.0f64);

        let mut decorator = genpdf::SimplePageDecorator::new();
        decorator.set_margins(10);
        doc.set_page_decorator(decorator);
        Ok(doc)
    }
}

impl Exporter for PdfExporter {
    fn export(&self, source: &DocumentSource) -> ReportResult<Rendering> {
        let mut doc = self.configure_document(&source.title)?;

        // Keep temporary image files alive until rendering finishes.
        let mut temp_files: Vec<NamedTempFile> = Vec::new();

        for block in &source.blocks {
            match block {
                Block::Break => doc.push(Break::new(1)),
                Block::ListItem { text } => push_list_item(&mut doc, text),
                Block::Paragraph {
                    text,
                    style: ParagraphStyle::Heading2,
                } => {
                    let heading = Style::new().bold().with_font_size(HEADING_FONT_SIZE);
                    doc.push(Paragraph::new(StyledString::new(text.clone(), heading)));
                }
                Block::Paragraph {
                    text,
                    style: ParagraphStyle::Normal,
                } => doc.push(parse_styled_paragraph(text)),
                Block::Image {
                    data,
                    width,
                    height,
                } => {
                    let bytes = BASE64
                        .decode(data)
                        .map_err(|e| ReportError::MalformedInput(format!("embedded image: {}", e)))?;
                    let tmp = write_display_png(&bytes, *width, *height)?;
                    let mut element = PdfImage::from_path(tmp.path())
                        .map_err(|e| ReportError::Render(e.to_string()))?;
                    element.set_dpi(IMAGE_DPI);
                    temp_files.push(tmp);
                    doc.push(element);
                }
            }
        }

        let mut out: Vec<u8> = Vec::new();
        doc.render(&mut out)
            .map_err(|e| ReportError::Render(e.to_string()))?;

        Ok(Rendering {
            bytes: out,
            mime_type: "application/pdf".to_string(),
            extension: "pdf".to_string(),
        })
    }
}

/// Handle a list item with a bullet.
fn push_list_item(doc: &mut Document, item_text: &str) {
    let mut p = Paragraph::new("");
    p.push(StyledString::new("• ", Style::new()));
    for styled in styled_segments(item_text) {
        p.push(styled);
    }
    let mut layout = LinearLayout::vertical();
    layout.push(p);
    doc.push(layout);
}

/// Target pixel size of an image displayed at `width` x `height` CSS px.
pub(crate) fn pixel_size(width: f64, height: f64) -> (u32, u32) {
    let scale = IMAGE_DPI / CSS_PX_PER_INCH;
    (
        (width * scale).max(1.0).round() as u32,
        (height * scale).max(1.0).round() as u32,
    )
}

/// Resizes the image to its display size, flattens alpha over white and writes
/// it to a temporary PNG that genpdf can embed.
fn write_display_png(bytes: &[u8], width: f64, height: f64) -> ReportResult<NamedTempFile> {
    let img = load_from_memory(bytes)?;
    let (target_w, target_h) = pixel_size(width, height);
    let resized: DynamicImage = if img.dimensions() == (target_w, target_h) {
        img
    } else {
        img.resize_exact(target_w, target_h, FilterType::Lanczos3)
    };

    let rgba = resized.to_rgba8();
    let (w, h) = rgba.dimensions();
    let mut background = image::RgbaImage::from_pixel(w, h, image::Rgba([255, 255, 255, 255]));
    image::imageops::overlay(&mut background, &rgba, 0, 0);
    let raw = DynamicImage::ImageRgba8(background).to_rgb8().into_raw();

    let mut tmp = NamedTempFile::new()?;
    {
        let file = tmp.as_file_mut();
        let mut encoder = PngEncoder::new(file, w, h);
        encoder.set_color(PngColorType::Rgb);
        encoder.set_depth(PngBitDepth::Eight);
        let mut writer = encoder
            .write_header()
            .map_err(|e| ReportError::Render(e.to_string()))?;
        writer
            .write_image_data(&raw)
            .map_err(|e| ReportError::Render(e.to_string()))?;
    }
    Ok(tmp)
}

/// Find next HTML-like tag `<b>` or `<i>` in text, returning tag name and index.
fn find_next_tag(text: &str) -> Option<(&str, usize)> {
    let b_pos = text.find("<b>");
    let i_pos = text.find("<i>");
    match (b_pos, i_pos) {
        (Some(b), Some(i)) if b < i => Some(("b", b)),
        (Some(_), Some(i)) => Some(("i", i)),
        (Some(b), None) => Some(("b", b)),
        (None, Some(i)) => Some(("i", i)),
        (None, None) => None,
    }
}

/// Split a line containing `<b>...</b>` and/or `<i>...</i>` tags into styled strings.
/// An unclosed tag leaves the remainder as plain text.
fn styled_segments(text: &str) -> Vec<StyledString> {
    let mut segments = Vec::new();
    let mut rest = text;

    while let Some((tag, start)) = find_next_tag(rest) {
        if start > 0 {
            segments.push(StyledString::new(rest[..start].to_string(), Style::new()));
        }
        let (open, close, style) = if tag == "b" {
            ("<b>", "</b>", Style::new().bold())
        } else {
            ("<i>", "</i>", Style::new().italic())
        };

        let body = &rest[start + open.len()..];
        match body.find(close) {
            Some(end) => {
                segments.push(StyledString::new(body[..end].to_string(), style));
                rest = &body[end + close.len()..];
            }
            None => {
                segments.push(StyledString::new(rest[start..].to_string(), Style::new()));
                return segments;
            }
        }
    }

    if !rest.is_empty() {
        segments.push(StyledString::new(rest.to_string(), Style::new()));
    }
    segments
}

fn parse_styled_paragraph(text: &str) -> Paragraph {
    let mut paragraph = Paragraph::new("");
    for styled in styled_segments(text) {
        paragraph.push(styled);
    }
    paragraph
}

/// True when `dir` holds at least one TTF file, i.e. PDF export can work.
pub fn fonts_available(dir: &Path) -> bool {
    std::fs::read_dir(dir)
        .map(|entries| {
            entries.filter_map(Result::ok).any(|entry| {
                entry
                    .path()
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("ttf"))
            })
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(segments: &[StyledString]) -> Vec<String> {
        segments.iter().map(|s| s.s.clone()).collect()
    }

    #[test]
    fn tags_split_into_segments() {
        let segments = styled_segments("Site <b>Tower-12</b> on <i>Monday</i>.");
        assert_eq!(texts(&segments), vec!["Site ", "Tower-12", " on ", "Monday", "."]);
        assert!(segments[1].style.is_bold());
        assert!(segments[3].style.is_italic());
    }

    #[test]
    fn unclosed_tag_stays_literal() {
        let segments = styled_segments("a <b>b");
        assert_eq!(texts(&segments), vec!["a ", "<b>b"]);
    }

    #[test]
    fn display_size_maps_to_pixels_at_export_dpi() {
        assert_eq!(pixel_size(640.0, 320.0), (1000, 500));
        assert_eq!(pixel_size(0.1, 0.1), (1, 1));
    }

    #[test]
    fn display_png_has_target_size() {
        let bytes = crate::adapters::local_document::tests::png_bytes(64, 32);
        let tmp = write_display_png(&bytes, 96.0, 48.0).unwrap();
        let written = load_from_memory(&std::fs::read(tmp.path()).unwrap()).unwrap();
        assert_eq!(written.dimensions(), (150, 75));
    }

    #[test]
    fn missing_fonts_are_detected() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!fonts_available(dir.path()));
        std::fs::write(dir.path().join("LiberationSans-Regular.ttf"), b"").unwrap();
        assert!(fonts_available(dir.path()));
    }
}
