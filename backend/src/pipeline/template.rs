//! Template instantiation and placeholder substitution.
//!
//! The template is an external contract: it must contain the configured tokens
//! for the substitution to have any effect. A missing token is silently skipped.

use crate::config::PlaceholderTokens;
use crate::error::{ObjectKind, ReportError, ReportResult};
use crate::pipeline::capabilities::{DocumentBody, FileId, FileStorage, FolderId};
use crate::pipeline::naming::{scope_of_work_summary, MISSING_VALUE};
use common::model::submission::SubmissionRecord;

/// Copies the template into `destination` under `new_name` and returns the copy's id.
pub fn instantiate<S: FileStorage>(
    storage: &S,
    template_id: &str,
    destination: &FolderId,
    new_name: &str,
) -> ReportResult<FileId> {
    let template = FileId(template_id.to_string());
    storage
        .copy_file(&template, destination, new_name)
        .map_err(|e| match e {
            ReportError::NotFound {
                kind: ObjectKind::File,
                id,
            } if id == template_id => ReportError::not_found(ObjectKind::Template, id),
            other => other,
        })
}

/// Replaces the site-name, date and scope-of-work tokens everywhere in `document`.
pub fn substitute<D: DocumentBody>(
    document: &mut D,
    tokens: &PlaceholderTokens,
    record: &SubmissionRecord,
    formatted_date: &str,
) -> ReportResult<()> {
    let site_name = record.site_name.as_deref().unwrap_or(MISSING_VALUE);
    document.replace_text(&tokens.site_name, site_name)?;
    document.replace_text(&tokens.date, formatted_date)?;
    document.replace_text(&tokens.scope_of_work, &scope_of_work_summary(record))?;
    Ok(())
}
