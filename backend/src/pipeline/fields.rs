use crate::error::ReportResult;
use crate::pipeline::capabilities::{DocumentBody, FileStorage, FolderId, ParagraphStyle};
use crate::pipeline::photos::append_photos;
use crate::pipeline::summary::ReportSummary;
use common::model::submission::{FieldSpec, SubmissionRecord};

/// Appends the recognised fields of `record` to `document` in list order.
///
/// Text fields become a `label: value` heading and a summary entry. Photo
/// fields are relocated and embedded. Absent fields produce nothing.
pub fn append_fields<S, D>(
    document: &mut D,
    storage: &S,
    fields: &[FieldSpec],
    record: &SubmissionRecord,
    folder: &FolderId,
    max_image_width: f64,
) -> ReportResult<ReportSummary>
where
    S: FileStorage,
    D: DocumentBody,
{
    let mut summary = ReportSummary::default();
    for spec in fields {
        let Some(value) = record.get(spec.key) else {
            continue;
        };
        let label = spec.display_label();
        if spec.is_photo() {
            append_photos(document, storage, value, label, folder, max_image_width)?;
        } else {
            document.append_paragraph(&format!("{}: {}", label, value), ParagraphStyle::Heading2)?;
            summary.push(label, value);
        }
    }
    Ok(summary)
}
