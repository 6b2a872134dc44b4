//! Local implementations of the pipeline's collaborators: SQLite-backed file
//! storage, JSON-sourced documents exported to PDF, and an outbox notifier.

pub mod local_document;
pub mod outbox;
pub mod pdf_export;
pub mod sqlite_storage;
