//! # Report Pipeline
//!
//! Turns one field-visit submission into an archived, mailed report. The steps
//! run strictly in order and each one maps to a `PipelineStage`:
//!
//! 1.  **Path**: `naming::derive_path` builds the archival path from the record.
//! 2.  **Folder**: `locator` resolves the archive folder by name and creates a
//!     subfolder named after the path.
//! 3.  **Document**: `template::instantiate` copies the template into the
//!     subfolder and the copy is opened for editing.
//! 4.  **Placeholders**: `template::substitute` fills the three tokens.
//! 5.  **Fields**: `fields::append_fields` writes the recognised fields; photo
//!     fields go through `photos::append_photos`.
//! 6.  **Finalize**: `finalize::finalize` closes and exports the document,
//!     stores the export beside it and sends the notification.
//!
//! The first error aborts the submission. Nothing is rolled back: folders
//! already created and photos already moved stay where they are.

pub mod capabilities;
pub mod fields;
pub mod finalize;
pub mod image_size;
pub mod locator;
pub mod naming;
pub mod photos;
pub mod summary;
pub mod template;

use crate::config::ReportConfig;
use crate::error::ReportResult;
use capabilities::{DocumentEditor, FileId, FileStorage, FolderId, Notifier};
use chrono::{DateTime, Utc};
use common::jobs::PipelineStage;
use common::model::submission::SubmissionRecord;
use log::info;

/// Result of a completed submission.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportOutcome {
    pub archival_path: String,
    pub folder: FolderId,
    pub document: FileId,
    pub artifact: FileId,
    pub recipient: String,
}

pub struct ReportPipeline<'a, S, E, N> {
    config: &'a ReportConfig,
    storage: &'a S,
    editor: &'a E,
    notifier: &'a N,
}

impl<'a, S, E, N> ReportPipeline<'a, S, E, N>
where
    S: FileStorage,
    E: DocumentEditor,
    N: Notifier,
{
    pub fn new(config: &'a ReportConfig, storage: &'a S, editor: &'a E, notifier: &'a N) -> Self {
        Self {
            config,
            storage,
            editor,
            notifier,
        }
    }

    /// Runs every step for `record`, reporting each stage reached to `on_stage`.
    ///
    /// `now` is the moment used for the date stamp.
    pub fn process(
        &self,
        record: &SubmissionRecord,
        now: DateTime<Utc>,
        on_stage: &mut dyn FnMut(PipelineStage),
    ) -> ReportResult<ReportOutcome> {
        on_stage(PipelineStage::Received);

        let path = naming::derive_path(record);
        let date_stamp = naming::format_report_date(now, self.config)?;
        info!("Processing submission '{}'", path);
        on_stage(PipelineStage::PathDerived);

        let root = locator::resolve_folder(self.storage, &self.config.root_folder_name)?;
        let folder = locator::create_subfolder(self.storage, &root, &path)?;
        on_stage(PipelineStage::FolderResolved);

        let document_id =
            template::instantiate(self.storage, &self.config.template_id, &folder, &path)?;
        let mut document = self.editor.open_document(&document_id)?;
        on_stage(PipelineStage::DocumentInstantiated);

        template::substitute(&mut document, &self.config.placeholders, record, &date_stamp)?;
        on_stage(PipelineStage::PlaceholdersSubstituted);

        let summary = fields::append_fields(
            &mut document,
            self.storage,
            &self.config.fields,
            record,
            &folder,
            self.config.max_image_width,
        )?;
        on_stage(PipelineStage::FieldsAppended);

        let finalized = finalize::finalize(
            document,
            self.storage,
            self.notifier,
            &folder,
            &path,
            &self.config.sender_name,
            record,
            &summary,
        )?;
        on_stage(PipelineStage::Finalized);
        info!("Submission '{}' finalized", path);

        Ok(ReportOutcome {
            archival_path: path,
            folder,
            document: document_id,
            artifact: finalized.artifact_id,
            recipient: finalized.recipient,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::local_document::tests::{png_bytes, SourceExporter};
    use crate::adapters::local_document::{Block, DocumentSource, LocalDocumentEditor};
    use crate::adapters::sqlite_storage::SqliteStorage;
    use crate::error::{ObjectKind, ReportError};
    use crate::pipeline::capabilities::{Blob, Notification, ParagraphStyle};
    use chrono::TimeZone;
    use common::model::submission::FieldKey;
    use std::cell::RefCell;

    const TEMPLATE: &str = "Field Visit Report\nSite: XXXXXX\nDate: YYYYYY\nScope: ZZZZZZ\n";

    #[derive(Default)]
    struct RecordingNotifier {
        sent: RefCell<Vec<Notification>>,
    }

    impl Notifier for RecordingNotifier {
        fn send(&self, notification: &Notification) -> ReportResult<()> {
            self.sent.borrow_mut().push(notification.clone());
            Ok(())
        }
    }

    struct Fixture {
        storage: SqliteStorage,
        config: ReportConfig,
        uploads: FolderId,
    }

    impl Fixture {
        fn new() -> Self {
            let storage = SqliteStorage::in_memory().unwrap();
            let templates = storage.create_top_level_folder("Templates").unwrap();
            let template = storage
                .create_file(
                    &templates,
                    &Blob::new("template.txt", "text/plain", TEMPLATE.as_bytes().to_vec()),
                )
                .unwrap();
            storage.set_read_only(&templates, true).unwrap();
            storage.create_top_level_folder("Field Reports").unwrap();
            let uploads = storage.create_top_level_folder("Uploads").unwrap();

            let config = ReportConfig {
                template_id: template.0,
                ..ReportConfig::default()
            };
            Self {
                storage,
                config,
                uploads,
            }
        }

        fn upload_photo(&self, width: u32, height: u32) -> FileId {
            self.storage
                .create_file(
                    &self.uploads,
                    &Blob::new("upload.png", "image/png", png_bytes(width, height)),
                )
                .unwrap()
        }

        fn run(
            &self,
            record: &SubmissionRecord,
            notifier: &RecordingNotifier,
        ) -> (ReportResult<ReportOutcome>, Vec<PipelineStage>) {
            let exporter = SourceExporter;
            let editor = LocalDocumentEditor::new(&self.storage, &exporter);
            let pipeline = ReportPipeline::new(&self.config, &self.storage, &editor, notifier);
            let mut stages = Vec::new();
            let now = Utc.with_ymd_and_hms(2024, 1, 2, 18, 0, 0).unwrap();
            let result = pipeline.process(record, now, &mut |stage| stages.push(stage));
            (result, stages)
        }
    }

    fn tower_record(photos: &str) -> SubmissionRecord {
        SubmissionRecord::default()
            .with(FieldKey::SiteName, "Tower-12")
            .with(FieldKey::ActivityPhase, "pre-log-in")
            .with(FieldKey::ActivityType, "Install")
            .with(FieldKey::Timestamp, "01/02/2024 10:00:00")
            .with(FieldKey::EmailAddress, "a@b.com")
            .with(FieldKey::SitePhoto, photos)
    }

    fn paragraphs(source: &DocumentSource) -> Vec<String> {
        source
            .blocks
            .iter()
            .filter_map(|block| match block {
                Block::Paragraph { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    fn images(source: &DocumentSource) -> Vec<(f64, f64)> {
        source
            .blocks
            .iter()
            .filter_map(|block| match block {
                Block::Image { width, height, .. } => Some((*width, *height)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn tower_submission_end_to_end() {
        let fixture = Fixture::new();
        let first = fixture.upload_photo(1280, 640);
        let second = fixture.upload_photo(100, 1000);
        let record = tower_record(&format!("url1={},url2={}", first, second));
        let notifier = RecordingNotifier::default();

        let (result, stages) = fixture.run(&record, &notifier);
        let outcome = result.unwrap();

        assert_eq!(
            outcome.archival_path,
            "Tower-12_pre-log-in_Install_01/02/2024 10:00:00"
        );
        assert_eq!(
            stages,
            vec![
                PipelineStage::Received,
                PipelineStage::PathDerived,
                PipelineStage::FolderResolved,
                PipelineStage::DocumentInstantiated,
                PipelineStage::PlaceholdersSubstituted,
                PipelineStage::FieldsAppended,
                PipelineStage::Finalized,
            ]
        );

        // Photos were moved out of the upload folder and renamed in order.
        assert!(fixture.storage.list_files(&fixture.uploads).unwrap().is_empty());
        let archived = fixture.storage.list_files(&outcome.folder).unwrap();
        let names: Vec<&str> = archived.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "Site Photo_0",
                "Site Photo_1",
                outcome.archival_path.as_str(),
                "Tower-12_pre-log-in_Install_01/02/2024 10:00:00.json",
            ]
        );
        assert_eq!(archived[0].id, first);
        assert_eq!(archived[1].id, second);
        assert_eq!(archived[2].id, outcome.document);
        assert_eq!(archived[3].id, outcome.artifact);

        // One notification with the rendering attached.
        let sent = notifier.sent.borrow();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "a@b.com");
        assert!(sent[0].subject.contains("Tower-12"));
        assert_eq!(sent[0].from_name, "Automated Field Test Reporting Project");
        assert_eq!(sent[0].attachments.len(), 1);
        assert_eq!(
            sent[0].attachments[0].name,
            "Tower-12_pre-log-in_Install_01/02/2024 10:00:00.json"
        );
        assert_eq!(
            sent[0].html_body,
            "<ul><li>Timestamp: 01/02/2024 10:00:00</li>\
             <li>Email Address: a@b.com</li>\
             <li>Site Name: Tower-12</li>\
             <li>Is it a pre-log-in or post-log-out activity?: pre-log-in</li>\
             <li>Type of Activity: Install</li></ul>"
        );
    }

    #[test]
    fn saved_document_carries_substitutions_fields_and_sized_images() {
        let fixture = Fixture::new();
        let first = fixture.upload_photo(1280, 640);
        let second = fixture.upload_photo(100, 1000);
        let record = tower_record(&format!("url1={},url2={}", first, second));
        let notifier = RecordingNotifier::default();

        let outcome = fixture.run(&record, &notifier).0.unwrap();
        let stored = fixture.storage.get_file(&outcome.document).unwrap();
        let source = DocumentSource::parse(&stored.name, &stored.bytes).unwrap();

        assert_eq!(
            paragraphs(&source),
            vec![
                "Field Visit Report",
                "Site: Tower-12",
                "Date: 01/02/2024",
                "Scope: pre-log-in_Install",
                "Timestamp: 01/02/2024 10:00:00",
                "Email Address: a@b.com",
                "Site Name: Tower-12",
                "Is it a pre-log-in or post-log-out activity?: pre-log-in",
                "Type of Activity: Install",
                "Site Photo [0]",
                "Site Photo [1]",
            ]
        );
        assert!(source.blocks.iter().any(|b| matches!(
            b,
            Block::Paragraph { text, style: ParagraphStyle::Heading2 } if text == "Site Photo [0]"
        )));
        assert_eq!(images(&source), vec![(640.0, 320.0), (100.0, 1000.0)]);
    }

    #[test]
    fn absent_fields_emit_nothing() {
        let fixture = Fixture::new();
        let record = SubmissionRecord::default()
            .with(FieldKey::SiteName, "Tower-12")
            .with(FieldKey::EmailAddress, "a@b.com");
        let notifier = RecordingNotifier::default();

        let outcome = fixture.run(&record, &notifier).0.unwrap();
        let stored = fixture.storage.get_file(&outcome.document).unwrap();
        let source = DocumentSource::parse(&stored.name, &stored.bytes).unwrap();

        let appended: Vec<String> = paragraphs(&source).into_iter().skip(4).collect();
        assert_eq!(appended, vec!["Email Address: a@b.com", "Site Name: Tower-12"]);
        assert!(images(&source).is_empty());
        assert_eq!(
            notifier.sent.borrow()[0].html_body,
            "<ul><li>Email Address: a@b.com</li><li>Site Name: Tower-12</li></ul>"
        );
        assert_eq!(outcome.archival_path, "Tower-12_undefined_undefined_undefined");
    }

    #[test]
    fn missing_root_folder_aborts_before_any_side_effect() {
        let mut fixture = Fixture::new();
        fixture.config.root_folder_name = "Nowhere".into();
        let notifier = RecordingNotifier::default();

        let (result, stages) = fixture.run(&tower_record("url=x"), &notifier);
        assert!(matches!(
            result,
            Err(ReportError::NotFound {
                kind: ObjectKind::Folder,
                ..
            })
        ));
        assert_eq!(stages, vec![PipelineStage::Received, PipelineStage::PathDerived]);
        assert!(notifier.sent.borrow().is_empty());
    }

    #[test]
    fn unknown_template_is_reported_as_template_not_found() {
        let mut fixture = Fixture::new();
        fixture.config.template_id = "no-such-template".into();
        let notifier = RecordingNotifier::default();

        let (result, _) = fixture.run(&tower_record("url=x"), &notifier);
        match result {
            Err(ReportError::NotFound { kind, id }) => {
                assert_eq!(kind, ObjectKind::Template);
                assert_eq!(id, "no-such-template");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn photo_url_without_id_aborts_and_keeps_earlier_moves() {
        let fixture = Fixture::new();
        let first = fixture.upload_photo(10, 10);
        let record = tower_record(&format!("url1={},https://host/no-id", first));
        let notifier = RecordingNotifier::default();

        let (result, stages) = fixture.run(&record, &notifier);
        assert!(matches!(result, Err(ReportError::MalformedInput(_))));
        assert_eq!(stages.last(), Some(&PipelineStage::PlaceholdersSubstituted));
        assert!(notifier.sent.borrow().is_empty());

        // No rollback: the first photo stays relocated.
        let report_folder = fixture
            .storage
            .find_folder_by_name("Tower-12_pre-log-in_Install_01/02/2024 10:00:00")
            .unwrap();
        let names: Vec<String> = fixture
            .storage
            .list_files(&report_folder)
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert!(names.contains(&"Site Photo_0".to_string()));
    }

    #[test]
    fn duplicate_submissions_get_separate_folders() {
        let fixture = Fixture::new();
        let record = SubmissionRecord::default()
            .with(FieldKey::SiteName, "Tower-12")
            .with(FieldKey::EmailAddress, "a@b.com");
        let notifier = RecordingNotifier::default();

        let first = fixture.run(&record, &notifier).0.unwrap();
        let second = fixture.run(&record, &notifier).0.unwrap();

        assert_ne!(first.folder, second.folder);
        assert_eq!(
            fixture
                .storage
                .folders_named(&first.archival_path)
                .unwrap()
                .len(),
            2
        );
        assert_eq!(notifier.sent.borrow().len(), 2);
    }

    #[test]
    fn missing_contact_address_fails_after_storing_the_rendering() {
        let fixture = Fixture::new();
        let record = SubmissionRecord::default().with(FieldKey::SiteName, "Tower-12");
        let notifier = RecordingNotifier::default();

        let (result, stages) = fixture.run(&record, &notifier);
        assert!(matches!(result, Err(ReportError::MalformedInput(_))));
        assert_eq!(stages.last(), Some(&PipelineStage::FieldsAppended));
        assert!(notifier.sent.borrow().is_empty());

        let report_folder = fixture
            .storage
            .find_folder_by_name("Tower-12_undefined_undefined_undefined")
            .unwrap();
        let stored = fixture.storage.list_files(&report_folder).unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[1].name, "Tower-12_undefined_undefined_undefined.json");
    }
}
