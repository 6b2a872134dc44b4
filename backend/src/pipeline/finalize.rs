use crate::error::{ReportError, ReportResult};
use crate::pipeline::capabilities::{
    Blob, DocumentBody, FileId, FileStorage, FolderId, Notification, Notifier,
};
use crate::pipeline::naming::notification_subject;
use crate::pipeline::summary::ReportSummary;
use common::model::submission::SubmissionRecord;
use log::info;

/// What `finalize` leaves behind.
#[derive(Debug, Clone, PartialEq)]
pub struct FinalizedReport {
    pub artifact_id: FileId,
    pub artifact_name: String,
    pub recipient: String,
}

/// Closes `document`, stores its export as `<path>.<ext>` next to the source
/// and mails it to the submitter with the summary as body.
#[allow(clippy::too_many_arguments)]
pub fn finalize<D, S, N>(
    document: D,
    storage: &S,
    notifier: &N,
    folder: &FolderId,
    path: &str,
    sender_name: &str,
    record: &SubmissionRecord,
    summary: &ReportSummary,
) -> ReportResult<FinalizedReport>
where
    D: DocumentBody,
    S: FileStorage,
    N: Notifier,
{
    let rendering = document.save_and_close()?;
    let artifact_name = format!("{}.{}", path, rendering.extension);
    let artifact = Blob::new(&artifact_name, rendering.mime_type, rendering.bytes);
    let artifact_id = storage.create_file(folder, &artifact)?;
    info!("Stored rendering '{}' as {}", artifact_name, artifact_id);

    let recipient = record
        .email_address
        .clone()
        .ok_or_else(|| ReportError::MalformedInput("submission has no contact address".into()))?;

    notifier.send(&Notification {
        from_name: sender_name.to_string(),
        to: recipient.clone(),
        subject: notification_subject(record),
        html_body: summary.render_html(),
        attachments: vec![artifact],
    })?;
    info!("Notification sent to {}", recipient);

    Ok(FinalizedReport {
        artifact_id,
        artifact_name,
        recipient,
    })
}
