//! Deployment configuration.
//!
//! Everything the pipeline needs is carried by `ReportConfig` and passed in
//! explicitly; nothing is read from globals at run time. `ServerConfig` wraps
//! it with the settings of the HTTP service and the local adapters.
//!
//! The configuration is read once at startup from the TOML file named by
//! `FIELD_REPORT_CONFIG` (default `field_report.toml`). A missing file means
//! built-in defaults.

use crate::error::{ReportError, ReportResult};
use chrono::FixedOffset;
use common::model::submission::{FieldKey, FieldSpec};
use log::{info, warn};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

const CONFIG_ENV: &str = "FIELD_REPORT_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "field_report.toml";

/// The three literal markers the template carries.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PlaceholderTokens {
    pub site_name: String,
    pub date: String,
    pub scope_of_work: String,
}

impl Default for PlaceholderTokens {
    fn default() -> Self {
        Self {
            site_name: "XXXXXX".to_string(),
            date: "YYYYYY".to_string(),
            scope_of_work: "ZZZZZZ".to_string(),
        }
    }
}

/// Options of the report pipeline.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Storage identifier of the template document.
    pub template_id: String,
    /// Name of the top-level folder that receives one subfolder per submission.
    pub root_folder_name: String,
    /// Display name on outgoing notifications.
    pub sender_name: String,
    /// Embedded images wider than this are scaled down.
    pub max_image_width: f64,
    pub placeholders: PlaceholderTokens,
    /// Recognised fields in document order.
    pub fields: Vec<FieldSpec>,
    /// chrono format string of the date stamp.
    pub date_format: String,
    pub utc_offset_hours: i32,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            template_id: String::new(),
            root_folder_name: "Field Reports".to_string(),
            sender_name: "Automated Field Test Reporting Project".to_string(),
            max_image_width: 640.0,
            placeholders: PlaceholderTokens::default(),
            fields: FieldSpec::default_list(),
            date_format: "%m/%d/%Y".to_string(),
            utc_offset_hours: -8,
        }
    }
}

impl ReportConfig {
    pub fn validate(&self) -> ReportResult<()> {
        if self.max_image_width.is_nan() || self.max_image_width <= 0.0 {
            return Err(ReportError::Config(format!(
                "max_image_width must be positive, got {}",
                self.max_image_width
            )));
        }

        let tokens = [
            &self.placeholders.site_name,
            &self.placeholders.date,
            &self.placeholders.scope_of_work,
        ];
        if tokens.iter().any(|t| t.is_empty()) {
            return Err(ReportError::Config("placeholder tokens must not be empty".into()));
        }
        let distinct: HashSet<&String> = tokens.iter().copied().collect();
        if distinct.len() != tokens.len() {
            return Err(ReportError::Config("placeholder tokens must be distinct".into()));
        }

        if self.fields.is_empty() {
            return Err(ReportError::Config("the field list must not be empty".into()));
        }
        let mut seen: HashSet<FieldKey> = HashSet::new();
        for spec in &self.fields {
            if !seen.insert(spec.key) {
                return Err(ReportError::Config(format!(
                    "field {:?} is listed more than once",
                    spec.key
                )));
            }
        }

        self.utc_offset()?;
        Ok(())
    }

    pub fn utc_offset(&self) -> ReportResult<FixedOffset> {
        FixedOffset::east_opt(self.utc_offset_hours * 3600).ok_or_else(|| {
            ReportError::Config(format!(
                "utc_offset_hours out of range: {}",
                self.utc_offset_hours
            ))
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// SQLite catalog backing the local file storage.
    pub database_path: PathBuf,
    /// Directory outgoing notifications are written to.
    pub outbox_dir: PathBuf,
    pub font_dir: PathBuf,
    pub font_family: String,
    pub report: ReportConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            database_path: PathBuf::from("fieldreport.sqlite"),
            outbox_dir: PathBuf::from("outbox"),
            font_dir: PathBuf::from("./fonts"),
            font_family: "LiberationSans".to_string(),
            report: ReportConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Loads the configuration from the path in `FIELD_REPORT_CONFIG`, or the default path.
    pub fn load() -> ReportResult<Self> {
        let path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from(Path::new(&path))
    }

    pub fn load_from(path: &Path) -> ReportResult<Self> {
        let config = if path.exists() {
            info!("Loading configuration from {}", path.display());
            let text = std::fs::read_to_string(path)?;
            Self::parse(&text)?
        } else {
            warn!(
                "Configuration file {} not found, using defaults",
                path.display()
            );
            Self::default()
        };
        config.report.validate()?;
        Ok(config)
    }

    pub fn parse(text: &str) -> ReportResult<Self> {
        toml::from_str(text).map_err(|e| ReportError::Config(e.to_string()))
    }
}
