//! Hands notifications to the host's mail transport through an outbox directory.
//!
//! Each notification becomes one JSON file. Attachments are base64-encoded so
//! the message is self-contained. Any failure to write it is a transport failure.

use crate::error::{ReportError, ReportResult};
use crate::pipeline::capabilities::{Notification, Notifier};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize)]
pub struct OutboxAttachment {
    pub name: String,
    pub mime_type: String,
    pub base64: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OutboxMessage {
    pub from_name: String,
    pub to: String,
    pub subject: String,
    pub html_body: String,
    pub attachments: Vec<OutboxAttachment>,
}

impl From<&Notification> for OutboxMessage {
    fn from(notification: &Notification) -> Self {
        Self {
            from_name: notification.from_name.clone(),
            to: notification.to.clone(),
            subject: notification.subject.clone(),
            html_body: notification.html_body.clone(),
            attachments: notification
                .attachments
                .iter()
                .map(|blob| OutboxAttachment {
                    name: blob.name.clone(),
                    mime_type: blob.mime_type.clone(),
                    base64: BASE64.encode(&blob.bytes),
                })
                .collect(),
        }
    }
}

pub struct OutboxNotifier {
    dir: PathBuf,
}

impl OutboxNotifier {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl Notifier for OutboxNotifier {
    fn send(&self, notification: &Notification) -> ReportResult<()> {
        let transport = |e: std::io::Error| {
            ReportError::TransportFailure(format!("{}: {}", self.dir.display(), e))
        };
        fs::create_dir_all(&self.dir).map_err(transport)?;

        let message = OutboxMessage::from(notification);
        let body = serde_json::to_vec_pretty(&message)?;
        let file_name = format!(
            "{}_{}.json",
            Utc::now().format("%Y%m%dT%H%M%S"),
            Uuid::new_v4()
        );
        fs::write(self.dir.join(file_name), body).map_err(transport)?;
        Ok(())
    }
}
