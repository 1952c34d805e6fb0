//! Handing a recording to a mail client or any other share target.

use crate::models::RecordingRecord;
use anyhow::Result;
use std::path::{Path, PathBuf};

/// Platform integration able to send a file (mail client, messaging app, ...).
///
/// Calls happen in order: [`compose`](Self::compose), [`attach`](Self::attach),
/// then [`send_or_display`](Self::send_or_display).
pub trait ShareTarget {
    fn compose(&mut self, subject: &str, body: &str) -> Result<()>;
    fn attach(&mut self, path: &Path) -> Result<()>;
    /// Send directly or leave the draft open for the user.
    fn send_or_display(&mut self) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareRequest {
    pub subject: String,
    pub body: String,
    pub attachment: PathBuf,
}

impl ShareRequest {
    pub fn for_record(record: &RecordingRecord) -> Self {
        Self {
            subject: format!("Call recording {}", record.display_name()),
            body: format!(
                "Hello,\n\nPlease find attached the recording of the call from {}.\n\nBest regards",
                record.date_display()
            ),
            attachment: record.file_path.clone(),
        }
    }

    pub fn send_to(&self, target: &mut dyn ShareTarget) -> Result<()> {
        target.compose(&self.subject, &self.body)?;
        target.attach(&self.attachment)?;
        target.send_or_display()
    }

    /// `mailto:` link for clients that cannot take an attachment; the body
    /// asks the user to attach the file by hand.
    pub fn mailto_link(&self) -> String {
        let body = format!("{}\n\n[Attach the recording manually]", self.body);
        format!(
            "mailto:?subject={}&body={}",
            urlencoding::encode(&self.subject),
            urlencoding::encode(&body)
        )
    }
}
