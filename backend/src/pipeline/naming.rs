//! Names derived from a submission: the archival path, the date stamp and
//! the notification subject.

use crate::config::ReportConfig;
use crate::error::ReportResult;
use chrono::{DateTime, Utc};
use common::model::submission::{FieldKey, SubmissionRecord};

/// Stand-in for a naming field the submission did not carry.
pub const MISSING_VALUE: &str = "undefined";

/// Fields joined into the archival path, in order.
const PATH_FIELDS: [FieldKey; 4] = [
    FieldKey::SiteName,
    FieldKey::ActivityPhase,
    FieldKey::ActivityType,
    FieldKey::Timestamp,
];

fn value_or_missing(record: &SubmissionRecord, key: FieldKey) -> &str {
    record.get(key).unwrap_or(MISSING_VALUE)
}

/// Builds `site_flag_type_timestamp`.
///
/// Values are used verbatim: an underscore (or a `/`) inside a field is not
/// escaped and ends up in the path as is. Missing fields become `undefined`.
pub fn derive_path(record: &SubmissionRecord) -> String {
    PATH_FIELDS
        .iter()
        .map(|key| value_or_missing(record, *key))
        .collect::<Vec<_>>()
        .join("_")
}

/// The scope-of-work text substituted into the template: `flag_type`.
pub fn scope_of_work_summary(record: &SubmissionRecord) -> String {
    format!(
        "{}_{}",
        value_or_missing(record, FieldKey::ActivityPhase),
        value_or_missing(record, FieldKey::ActivityType)
    )
}

pub fn notification_subject(record: &SubmissionRecord) -> String {
    format!(
        "{} Site Visit for {}-{} on {}",
        value_or_missing(record, FieldKey::SiteName),
        value_or_missing(record, FieldKey::ActivityPhase),
        value_or_missing(record, FieldKey::ActivityType),
        value_or_missing(record, FieldKey::Timestamp)
    )
}

/// Formats `now` in the configured fixed offset and format.
pub fn format_report_date(now: DateTime<Utc>, config: &ReportConfig) -> ReportResult<String> {
    let offset = config.utc_offset()?;
    Ok(now
        .with_timezone(&offset)
        .format(&config.date_format)
        .to_string())
}
