//! Editable documents kept as files in `FileStorage`.
//!
//! A document is stored as a JSON `DocumentSource`: an ordered list of
//! blocks. Embedded images travel inside the source as base64, so a document
//! stays self-contained after the original image files move. A file that is
//! not a JSON source but valid UTF-8 is read as a plain-text template:
//!
//! - an empty line is a break
//! - a line starting with `- ` is a list item
//! - anything else is a normal paragraph

use crate::error::{ReportError, ReportResult};
use crate::pipeline::capabilities::{
    Blob, DocumentBody, DocumentEditor, FileId, FileStorage, ImageId, ParagraphStyle, Rendering,
};
use crate::pipeline::image_size::ImageSize;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use image::GenericImageView;
use regex::{NoExpand, Regex};
use serde::{Deserialize, Serialize};

const SOURCE_MIME_TYPE: &str = "application/json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Block {
    Paragraph { text: String, style: ParagraphStyle },
    ListItem { text: String },
    Break,
    Image {
        /// Base64 of the embedded image file.
        data: String,
        width: f64,
        height: f64,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentSource {
    pub title: String,
    pub blocks: Vec<Block>,
}

impl DocumentSource {
    pub fn from_template_text(title: &str, text: &str) -> Self {
        let blocks = text
            .lines()
            .map(|line| {
                if line.is_empty() {
                    Block::Break
                } else if let Some(item) = line.strip_prefix("- ") {
                    Block::ListItem {
                        text: item.to_string(),
                    }
                } else {
                    Block::Paragraph {
                        text: line.to_string(),
                        style: ParagraphStyle::Normal,
                    }
                }
            })
            .collect();
        Self {
            title: title.to_string(),
            blocks,
        }
    }

    /// Reads a stored document: a JSON source, or else a plain-text template.
    pub fn parse(title: &str, bytes: &[u8]) -> ReportResult<Self> {
        if let Ok(source) = serde_json::from_slice::<DocumentSource>(bytes) {
            return Ok(source);
        }
        let text = std::str::from_utf8(bytes).map_err(|_| {
            ReportError::MalformedInput(format!("document '{}' is neither a source nor text", title))
        })?;
        Ok(Self::from_template_text(title, text))
    }

    fn replace_all(&mut self, token: &str, value: &str) -> ReportResult<()> {
        let pattern = Regex::new(&regex::escape(token))
            .map_err(|e| ReportError::MalformedInput(e.to_string()))?;
        for block in &mut self.blocks {
            if let Block::Paragraph { text, .. } | Block::ListItem { text } = block {
                if pattern.is_match(text) {
                    *text = pattern.replace_all(text, NoExpand(value)).into_owned();
                }
            }
        }
        Ok(())
    }
}

/// Turns a closed document into its fixed-format rendering.
pub trait Exporter {
    fn export(&self, source: &DocumentSource) -> ReportResult<Rendering>;
}

pub struct LocalDocumentEditor<'s, S, X> {
    storage: &'s S,
    exporter: &'s X,
}

impl<'s, S, X> LocalDocumentEditor<'s, S, X> {
    pub fn new(storage: &'s S, exporter: &'s X) -> Self {
        Self { storage, exporter }
    }
}

impl<'s, S: FileStorage, X: Exporter> DocumentEditor for LocalDocumentEditor<'s, S, X> {
    type Document = LocalDocument<'s, S, X>;

    fn open_document(&self, file: &FileId) -> ReportResult<Self::Document> {
        let blob = self.storage.get_file(file)?;
        let source = DocumentSource::parse(&blob.name, &blob.bytes)?;
        Ok(LocalDocument {
            file: file.clone(),
            storage: self.storage,
            exporter: self.exporter,
            source,
        })
    }
}

pub struct LocalDocument<'s, S, X> {
    file: FileId,
    storage: &'s S,
    exporter: &'s X,
    source: DocumentSource,
}

#[cfg(test)]
impl<'s, S, X> LocalDocument<'s, S, X> {
    pub fn source(&self) -> &DocumentSource {
        &self.source
    }
}

impl<'s, S: FileStorage, X: Exporter> LocalDocument<'s, S, X> {
    /// Writes the current source back to the document's file as JSON.
    pub fn save(&self) -> ReportResult<()> {
        let bytes = serde_json::to_vec(&self.source)?;
        self.storage.overwrite_file(&self.file, &bytes, SOURCE_MIME_TYPE)
    }

    fn image_block(&mut self, image: ImageId) -> ReportResult<(&mut f64, &mut f64)> {
        match self.source.blocks.get_mut(image.0) {
            Some(Block::Image { width, height, .. }) => Ok((width, height)),
            _ => Err(ReportError::MalformedInput(format!(
                "no image at block {}",
                image.0
            ))),
        }
    }
}

impl<'s, S: FileStorage, X: Exporter> DocumentBody for LocalDocument<'s, S, X> {
    fn replace_text(&mut self, token: &str, value: &str) -> ReportResult<()> {
        self.source.replace_all(token, value)
    }

    fn append_paragraph(&mut self, text: &str, style: ParagraphStyle) -> ReportResult<()> {
        self.source.blocks.push(Block::Paragraph {
            text: text.to_string(),
            style,
        });
        Ok(())
    }

    fn append_image(&mut self, blob: &Blob) -> ReportResult<ImageId> {
        let (width, height) = image::load_from_memory(&blob.bytes)?.dimensions();
        self.source.blocks.push(Block::Image {
            data: BASE64.encode(&blob.bytes),
            width: f64::from(width),
            height: f64::from(height),
        });
        Ok(ImageId(self.source.blocks.len() - 1))
    }

    fn image_size(&self, image: ImageId) -> ReportResult<ImageSize> {
        match self.source.blocks.get(image.0) {
            Some(Block::Image { width, height, .. }) => Ok(ImageSize::new(*width, *height)),
            _ => Err(ReportError::MalformedInput(format!(
                "no image at block {}",
                image.0
            ))),
        }
    }

    fn set_image_size(&mut self, image: ImageId, size: ImageSize) -> ReportResult<()> {
        let (width, height) = self.image_block(image)?;
        *width = size.width;
        *height = size.height;
        Ok(())
    }

    fn save_and_close(self) -> ReportResult<Rendering> {
        self.save()?;
        self.exporter.export(&self.source)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::adapters::sqlite_storage::SqliteStorage;
    use crate::pipeline::capabilities::FolderId;
    use image::{ImageFormat, RgbImage};
    use std::io::Cursor;

    /// Exports the JSON source itself; stands in for PDF rendering in tests.
    pub(crate) struct SourceExporter;

    impl Exporter for SourceExporter {
        fn export(&self, source: &DocumentSource) -> ReportResult<Rendering> {
            Ok(Rendering {
                bytes: serde_json::to_vec(source)?,
                mime_type: "application/json".to_string(),
                extension: "json".to_string(),
            })
        }
    }

    pub(crate) fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let mut bytes = Cursor::new(Vec::new());
        RgbImage::new(width, height)
            .write_to(&mut bytes, ImageFormat::Png)
            .unwrap();
        bytes.into_inner()
    }

    fn stored_template(storage: &SqliteStorage, text: &str) -> (FolderId, FileId) {
        let folder = storage.create_top_level_folder("Templates").unwrap();
        let file = storage
            .create_file(
                &folder,
                &Blob::new("template.txt", "text/plain", text.as_bytes().to_vec()),
            )
            .unwrap();
        (folder, file)
    }

    #[test]
    fn template_text_is_split_into_blocks() {
        let source = DocumentSource::from_template_text("t", "Report XXXXXX\n\n- item one\nplain");
        assert_eq!(
            source.blocks,
            vec![
                Block::Paragraph {
                    text: "Report XXXXXX".into(),
                    style: ParagraphStyle::Normal
                },
                Block::Break,
                Block::ListItem {
                    text: "item one".into()
                },
                Block::Paragraph {
                    text: "plain".into(),
                    style: ParagraphStyle::Normal
                },
            ]
        );
    }

    #[test]
    fn replace_is_global_and_literal() {
        let mut source = DocumentSource::from_template_text("t", "XXXXXX and XXXXXX\n- a.b XXXXXX");
        source.replace_all("XXXXXX", "$1 Tower").unwrap();
        assert_eq!(
            source.blocks[0],
            Block::Paragraph {
                text: "$1 Tower and $1 Tower".into(),
                style: ParagraphStyle::Normal
            }
        );
        assert_eq!(
            source.blocks[1],
            Block::ListItem {
                text: "a.b $1 Tower".into()
            }
        );

        // Regex metacharacters in the token are matched literally.
        source.replace_all("a.b", "x").unwrap();
        source.replace_all("a+b", "y").unwrap();
        assert_eq!(
            source.blocks[1],
            Block::ListItem {
                text: "x $1 Tower".into()
            }
        );
    }

    #[test]
    fn absent_token_is_a_no_op() {
        let storage = SqliteStorage::in_memory().unwrap();
        let (_, file) = stored_template(&storage, "no tokens here");
        let editor = LocalDocumentEditor::new(&storage, &SourceExporter);
        let mut document = editor.open_document(&file).unwrap();
        let before = document.source().clone();

        document.replace_text("ZZZZZZ", "value").unwrap();
        document.replace_text("ZZZZZZ", "value").unwrap();

        assert_eq!(document.source(), &before);
    }

    #[test]
    fn images_are_embedded_at_natural_size() {
        let storage = SqliteStorage::in_memory().unwrap();
        let (_, file) = stored_template(&storage, "");
        let editor = LocalDocumentEditor::new(&storage, &SourceExporter);
        let mut document = editor.open_document(&file).unwrap();

        let image = document
            .append_image(&Blob::new("p.png", "image/png", png_bytes(12, 6)))
            .unwrap();
        assert_eq!(document.image_size(image).unwrap(), ImageSize::new(12.0, 6.0));

        document.set_image_size(image, ImageSize::new(6.0, 3.0)).unwrap();
        assert_eq!(document.image_size(image).unwrap(), ImageSize::new(6.0, 3.0));
    }

    #[test]
    fn non_image_handles_are_rejected() {
        let storage = SqliteStorage::in_memory().unwrap();
        let (_, file) = stored_template(&storage, "text");
        let editor = LocalDocumentEditor::new(&storage, &SourceExporter);
        let document = editor.open_document(&file).unwrap();
        assert!(matches!(
            document.image_size(ImageId(0)),
            Err(ReportError::MalformedInput(_))
        ));
    }

    #[test]
    fn save_and_close_persists_the_source() {
        let storage = SqliteStorage::in_memory().unwrap();
        let (_, file) = stored_template(&storage, "XXXXXX");
        let editor = LocalDocumentEditor::new(&storage, &SourceExporter);
        let mut document = editor.open_document(&file).unwrap();
        document.replace_text("XXXXXX", "Tower-12").unwrap();
        document
            .append_paragraph("Site Name: Tower-12", ParagraphStyle::Heading2)
            .unwrap();

        let rendering = document.save_and_close().unwrap();
        assert_eq!(rendering.extension, "json");
        // The template was plain text; the saved document is a JSON source.
        assert_eq!(storage.file_entry(&file).unwrap().mime_type, "application/json");

        let reopened = editor.open_document(&file).unwrap();
        assert_eq!(reopened.source().blocks.len(), 2);
        assert_eq!(
            reopened.source().blocks[1],
            Block::Paragraph {
                text: "Site Name: Tower-12".into(),
                style: ParagraphStyle::Heading2
            }
        );
    }

    #[test]
    fn binary_non_source_is_malformed() {
        let err = DocumentSource::parse("bin", &[0xff, 0xfe, 0x00]).unwrap_err();
        assert!(matches!(err, ReportError::MalformedInput(_)));
    }
}
