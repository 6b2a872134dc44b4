//! Narrow interfaces to the platform services the pipeline drives.
//!
//! The pipeline only ever talks to hierarchical file storage, a document
//! editor and a notification sender through these traits. `crate::adapters`
//! provides local implementations; tests substitute their own.
//!
//! Every call is synchronous and may fail; callers propagate the error.

use crate::error::ReportResult;
use crate::pipeline::image_size::ImageSize;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FolderId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileId(pub String);

impl fmt::Display for FolderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A named chunk of file content.
#[derive(Debug, Clone, PartialEq)]
pub struct Blob {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl Blob {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }
}

/// Hierarchical file storage.
///
/// Name lookup is not guaranteed unique: several folders may share a name and
/// `find_folder_by_name` returns whichever the backend lists first.
pub trait FileStorage {
    fn find_folder_by_name(&self, name: &str) -> ReportResult<FolderId>;

    /// Always creates a new folder, even when `parent` already holds one named `name`.
    fn create_folder(&self, parent: &FolderId, name: &str) -> ReportResult<FolderId>;

    fn copy_file(&self, file: &FileId, destination: &FolderId, name: &str) -> ReportResult<FileId>;

    fn get_file(&self, file: &FileId) -> ReportResult<Blob>;

    /// Moves `file` into `destination`, removing it from its previous folder.
    fn move_file(&self, file: &FileId, destination: &FolderId) -> ReportResult<()>;

    fn rename_file(&self, file: &FileId, name: &str) -> ReportResult<()>;

    fn create_file(&self, folder: &FolderId, blob: &Blob) -> ReportResult<FileId>;

    /// Replaces the content and MIME type of an existing file, keeping its id, name and folder.
    fn overwrite_file(&self, file: &FileId, bytes: &[u8], mime_type: &str) -> ReportResult<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParagraphStyle {
    Normal,
    Heading2,
}

/// Handle of an image embedded in a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageId(pub usize);

/// The fixed-format export of a closed document.
#[derive(Debug, Clone, PartialEq)]
pub struct Rendering {
    pub bytes: Vec<u8>,
    pub mime_type: String,
    /// File extension without the dot, e.g. `pdf`.
    pub extension: String,
}

/// An open, editable document.
pub trait DocumentBody {
    /// Replaces every occurrence of `token`. A token that does not occur is not an error.
    fn replace_text(&mut self, token: &str, value: &str) -> ReportResult<()>;

    fn append_paragraph(&mut self, text: &str, style: ParagraphStyle) -> ReportResult<()>;

    /// Embeds a copy of `blob` as an inline image at its natural size.
    fn append_image(&mut self, blob: &Blob) -> ReportResult<ImageId>;

    fn image_size(&self, image: ImageId) -> ReportResult<ImageSize>;

    fn set_image_size(&mut self, image: ImageId, size: ImageSize) -> ReportResult<()>;

    /// Persists the document and exports it. The document cannot be used afterwards.
    fn save_and_close(self) -> ReportResult<Rendering>;
}

pub trait DocumentEditor {
    type Document: DocumentBody;

    fn open_document(&self, file: &FileId) -> ReportResult<Self::Document>;
}

/// An outgoing message with attachments.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub from_name: String,
    pub to: String,
    pub subject: String,
    pub html_body: String,
    pub attachments: Vec<Blob>,
}

/// Delivery is fire-and-forget: no confirmation is consumed.
pub trait Notifier {
    fn send(&self, notification: &Notification) -> ReportResult<()>;
}
