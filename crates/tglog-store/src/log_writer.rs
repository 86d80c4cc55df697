//! Per-day text logs.
//!
//! Layout: `<root>/<peer directory>/<YYYY-MM-DD>.txt`, one line per message:
//!
//! ```text
//! [14:02:11] Ada Lovelace: see you tomorrow
//! [14:03:40] Charles Babbage: << Photo >>
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate, TimeZone};
use tracing::debug;

use tglog_shared::constants::{DAY_KEY_FORMAT, LINE_TIME_FORMAT, LOG_FILE_EXTENSION};
use tglog_shared::{Message, UserId, UserRecord};
use tglog_sync::LogSink;

use crate::error::{Result, StoreError};
use crate::paths::sanitize_component;

/// Render one message as a log line, with its time of day in `tz`.
pub fn render_line<Tz: TimeZone>(
    message: &Message,
    users: &HashMap<UserId, UserRecord>,
    tz: &Tz,
) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let time = tz
        .timestamp_opt(message.date, 0)
        .single()
        .map(|dt| dt.format(LINE_TIME_FORMAT).to_string())
        .unwrap_or_else(|| "--:--:--".to_string());

    let sender = users
        .get(&message.sender_id)
        .map(UserRecord::display_name)
        .unwrap_or_else(|| format!("User {}", message.sender_id));

    format!("[{time}] {sender}: {}", message.contents())
}

pub struct LogWriter<Tz: TimeZone = Local> {
    root: PathBuf,
    tz: Tz,
}

impl LogWriter<Local> {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            tz: Local,
        }
    }
}

impl<Tz: TimeZone> LogWriter<Tz>
where
    Tz::Offset: std::fmt::Display,
{
    pub fn with_timezone<T: TimeZone>(self, tz: T) -> LogWriter<T> {
        LogWriter {
            root: self.root,
            tz,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn peer_dir(&self, directory: &str) -> PathBuf {
        self.root.join(sanitize_component(directory))
    }

    pub fn day_path(&self, directory: &str, day: NaiveDate) -> PathBuf {
        self.peer_dir(directory).join(format!(
            "{}.{LOG_FILE_EXTENSION}",
            day.format(DAY_KEY_FORMAT)
        ))
    }

    /// Newest day file under `directory`; `None` when there is none yet.
    pub fn latest_day(&self, directory: &str) -> Result<Option<NaiveDate>> {
        let entries = match std::fs::read_dir(self.peer_dir(directory)) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let mut latest: Option<NaiveDate> = None;
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(LOG_FILE_EXTENSION) {
                continue;
            }
            let Some(day) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| NaiveDate::parse_from_str(s, DAY_KEY_FORMAT).ok())
            else {
                continue;
            };
            latest = latest.max(Some(day));
        }
        Ok(latest)
    }

    /// Write a day file, replacing any previous content.
    pub fn write_messages(
        &self,
        directory: &str,
        day: NaiveDate,
        messages: &[Message],
        users: &HashMap<UserId, UserRecord>,
    ) -> Result<PathBuf> {
        let dir = self.peer_dir(directory);
        std::fs::create_dir_all(&dir)?;

        let body = messages
            .iter()
            .map(|m| render_line(m, users, &self.tz))
            .collect::<Vec<_>>()
            .join("\n");

        let path = self.day_path(directory, day);
        let tmp = path.with_extension(format!("{LOG_FILE_EXTENSION}.tmp"));
        std::fs::write(&tmp, body)?;
        std::fs::rename(&tmp, &path)?;

        debug!(path = %path.display(), lines = messages.len(), "Wrote day log");
        Ok(path)
    }
}

impl<Tz: TimeZone> LogSink for LogWriter<Tz>
where
    Tz::Offset: std::fmt::Display,
{
    type Error = StoreError;

    fn resume_point(&self, directory: &str) -> Result<Option<NaiveDate>> {
        self.latest_day(directory)
    }

    fn write_day(
        &self,
        directory: &str,
        day: NaiveDate,
        messages: &[Message],
        users: &HashMap<UserId, UserRecord>,
    ) -> Result<()> {
        self.write_messages(directory, day, messages, users)
            .map(|_| ())
    }
}
