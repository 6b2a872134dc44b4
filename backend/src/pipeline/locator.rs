//! Resolution of the archive folder and the per-submission subfolder.
//!
//! Lookup is by display name and returns the first match. Creation never
//! checks for an existing folder of the same name, so two submissions with the
//! same archival path get two folders sharing one name. The subfolder id is
//! taken from the create call itself rather than from a second lookup by name,
//! which would not be guaranteed to return the folder just created. Concurrent
//! creations of the same name are not coordinated.

use crate::error::ReportResult;
use crate::pipeline::capabilities::{FileStorage, FolderId};
use log::debug;

pub fn resolve_folder<S: FileStorage>(storage: &S, name: &str) -> ReportResult<FolderId> {
    let folder = storage.find_folder_by_name(name)?;
    debug!("Resolved folder '{}' to {}", name, folder);
    Ok(folder)
}

pub fn create_subfolder<S: FileStorage>(
    storage: &S,
    parent: &FolderId,
    name: &str,
) -> ReportResult<FolderId> {
    let folder = storage.create_folder(parent, name)?;
    debug!("Created subfolder '{}' ({}) under {}", name, folder, parent);
    Ok(folder)
}
