use crate::model::submission::FieldValue;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Request payload for `POST /api/reports/submit`.
/// Mirrors the `namedValues` map a form host delivers on submission.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct SubmitReportRequest {
    #[serde(rename = "namedValues")]
    pub named_values: HashMap<String, FieldValue>,
}

/// Metadata part of a `POST /api/storage/upload` request.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct UploadTarget {
    /// Top-level folder the file is stored in; created when missing.
    pub folder: String,
    #[serde(default)]
    pub read_only: bool,
}
