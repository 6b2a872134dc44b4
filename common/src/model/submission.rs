use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The closed set of fields a field-visit submission may carry.
///
/// The variant order matches the default document order produced by
/// `FieldSpec::default_list`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKey {
    Timestamp,
    EmailAddress,
    SiteName,
    /// Whether the visit is a pre-log-in or post-log-out activity.
    ActivityPhase,
    ActivityType,
    ScopeOfWork,
    ActivityOrderNumber,
    /// Whether the activity was service-effecting.
    ServiceImpact,
    SitePhoto,
    EquipmentPhoto,
}

impl FieldKey {
    pub const ALL: [FieldKey; 10] = [
        FieldKey::Timestamp,
        FieldKey::EmailAddress,
        FieldKey::SiteName,
        FieldKey::ActivityPhase,
        FieldKey::ActivityType,
        FieldKey::ScopeOfWork,
        FieldKey::ActivityOrderNumber,
        FieldKey::ServiceImpact,
        FieldKey::SitePhoto,
        FieldKey::EquipmentPhoto,
    ];

    /// The form question text used when no label is configured for this key.
    pub fn default_label(self) -> &'static str {
        match self {
            FieldKey::Timestamp => "Timestamp",
            FieldKey::EmailAddress => "Email Address",
            FieldKey::SiteName => "Site Name",
            FieldKey::ActivityPhase => "Is it a pre-log-in or post-log-out activity?",
            FieldKey::ActivityType => "Type of Activity",
            FieldKey::ScopeOfWork => "Scope of Work Details",
            FieldKey::ActivityOrderNumber => "Activity Order Number",
            FieldKey::ServiceImpact => "Service-effecting or not Service-effecting",
            FieldKey::SitePhoto => "Site Photo",
            FieldKey::EquipmentPhoto => "Equipment Photo",
        }
    }
}

/// One entry of the recognised-field list: which field to emit and under what label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub key: FieldKey,
    /// The form question text. Doubles as the display label in the report.
    pub label: String,
}

impl FieldSpec {
    pub fn new(key: FieldKey, label: impl Into<String>) -> Self {
        Self {
            key,
            label: label.into(),
        }
    }

    /// The label as shown in the report, without the padding forms tend to add.
    pub fn display_label(&self) -> &str {
        self.label.trim()
    }

    /// Photo fields are recognised by label, not by key.
    pub fn is_photo(&self) -> bool {
        self.label.to_lowercase().contains("photo")
    }

    /// Every field in its default order with its default label.
    pub fn default_list() -> Vec<FieldSpec> {
        FieldKey::ALL
            .iter()
            .map(|key| FieldSpec::new(*key, key.default_label()))
            .collect()
    }
}

/// A raw value as delivered by the form host: either a single string or a list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Single(String),
    Multiple(Vec<String>),
}

impl FieldValue {
    /// Lists are comma-joined, which is how photo references arrive.
    pub fn joined(&self) -> String {
        match self {
            FieldValue::Single(value) => value.clone(),
            FieldValue::Multiple(values) => values.join(","),
        }
    }
}

/// A single field-visit submission, resolved to typed optional fields at ingestion.
///
/// An absent field is `None`; empty values are never stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubmissionRecord {
    pub timestamp: Option<String>,
    pub email_address: Option<String>,
    pub site_name: Option<String>,
    pub activity_phase: Option<String>,
    pub activity_type: Option<String>,
    pub scope_of_work: Option<String>,
    pub activity_order_number: Option<String>,
    pub service_impact: Option<String>,
    pub site_photo: Option<String>,
    pub equipment_photo: Option<String>,
}

impl SubmissionRecord {
    /// Resolves a form host's `namedValues` map against the recognised fields.
    ///
    /// Keys are matched by label with surrounding whitespace ignored on both
    /// sides. Fields missing from `fields` are still resolved through their
    /// default label, so the naming fields are available even when they are
    /// not printed in the document.
    pub fn from_named_values(values: &HashMap<String, FieldValue>, fields: &[FieldSpec]) -> Self {
        let by_label: HashMap<&str, &FieldValue> = values
            .iter()
            .map(|(label, value)| (label.trim(), value))
            .collect();

        let mut record = SubmissionRecord::default();
        for key in FieldKey::ALL {
            let label = fields
                .iter()
                .find(|spec| spec.key == key)
                .map(|spec| spec.display_label())
                .unwrap_or_else(|| key.default_label());
            if let Some(value) = by_label.get(label) {
                record.set(key, value.joined());
            }
        }
        record
    }

    pub fn get(&self, key: FieldKey) -> Option<&str> {
        self.slot(key).as_deref()
    }

    /// Stores `value` under `key`; an empty value clears the field.
    pub fn set(&mut self, key: FieldKey, value: impl Into<String>) {
        let value = value.into();
        *self.slot_mut(key) = if value.is_empty() { None } else { Some(value) };
    }

    pub fn with(mut self, key: FieldKey, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    fn slot(&self, key: FieldKey) -> &Option<String> {
        match key {
            FieldKey::Timestamp => &self.timestamp,
            FieldKey::EmailAddress => &self.email_address,
            FieldKey::SiteName => &self.site_name,
            FieldKey::ActivityPhase => &self.activity_phase,
            FieldKey::ActivityType => &self.activity_type,
            FieldKey::ScopeOfWork => &self.scope_of_work,
            FieldKey::ActivityOrderNumber => &self.activity_order_number,
            FieldKey::ServiceImpact => &self.service_impact,
            FieldKey::SitePhoto => &self.site_photo,
            FieldKey::EquipmentPhoto => &self.equipment_photo,
        }
    }

    fn slot_mut(&mut self, key: FieldKey) -> &mut Option<String> {
        match key {
            FieldKey::Timestamp => &mut self.timestamp,
            FieldKey::EmailAddress => &mut self.email_address,
            FieldKey::SiteName => &mut self.site_name,
            FieldKey::ActivityPhase => &mut self.activity_phase,
            FieldKey::ActivityType => &mut self.activity_type,
            FieldKey::ScopeOfWork => &mut self.scope_of_work,
            FieldKey::ActivityOrderNumber => &mut self.activity_order_number,
            FieldKey::ServiceImpact => &mut self.service_impact,
            FieldKey::SitePhoto => &mut self.site_photo,
            FieldKey::EquipmentPhoto => &mut self.equipment_photo,
        }
    }
}
