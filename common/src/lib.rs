//! Models shared across the field-report workspace.
//!
//! - `model`: the typed submission record and the recognised-field list.
//! - `jobs`: status values reported while a submission moves through the pipeline.
//! - `requests`: HTTP request payloads accepted by the backend.

pub mod jobs;
pub mod model;
pub mod requests;
