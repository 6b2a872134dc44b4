//! Relocation of submitted photos into the archive folder and their embedding
//! in the report.
//!
//! A photo field holds comma-separated URLs. Each URL names a stored file by
//! the text after its last `=`, which is how the form host links uploads. The
//! file is moved (not copied) into the archive folder, renamed
//! `<label>_<index>`, then embedded and size-normalised.

use crate::error::{ReportError, ReportResult};
use crate::pipeline::capabilities::{
    DocumentBody, FileId, FileStorage, FolderId, ParagraphStyle,
};
use crate::pipeline::image_size::normalize_image;
use log::debug;

/// Returns the text after the last `=` in `url`, or `""` when there is none.
pub fn extract_file_id(url: &str) -> &str {
    match url.rfind('=') {
        Some(index) => &url[index + 1..],
        None => "",
    }
}

/// Splits a raw photo value on `,`. Tokens are not trimmed.
pub fn split_photo_urls(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',')
}

/// Moves `file` into `folder` and renames it.
pub fn relocate<S: FileStorage>(
    storage: &S,
    file: &FileId,
    folder: &FolderId,
    name: &str,
) -> ReportResult<()> {
    storage.move_file(file, folder)?;
    storage.rename_file(file, name)?;
    Ok(())
}

/// Appends every photo of one field to `document`. Returns the relocated ids in input order.
pub fn append_photos<S, D>(
    document: &mut D,
    storage: &S,
    raw_urls: &str,
    label: &str,
    folder: &FolderId,
    max_image_width: f64,
) -> ReportResult<Vec<FileId>>
where
    S: FileStorage,
    D: DocumentBody,
{
    let mut relocated = Vec::new();
    for (index, url) in split_photo_urls(raw_urls).enumerate() {
        document.append_paragraph(&format!("{} [{}]", label, index), ParagraphStyle::Heading2)?;

        let id = extract_file_id(url);
        if id.is_empty() {
            return Err(ReportError::MalformedInput(format!(
                "photo reference without an '=' delimited id: {}",
                url
            )));
        }
        let file = FileId(id.to_string());
        let name = format!("{}_{}", label, index);
        relocate(storage, &file, folder, &name)?;
        debug!("Relocated photo {} as '{}'", file, name);

        let blob = storage.get_file(&file)?;
        let image = document.append_image(&blob)?;
        normalize_image(document, image, max_image_width)?;
        relocated.push(file);
    }
    Ok(relocated)
}
