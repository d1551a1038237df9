//! Import log streaming via Server-Sent Events (SSE).
//!
//! Every log line goes through one process-wide broadcast channel. It is
//! echoed to stdout and forwarded to any client connected to `/api/logs`.
//! Nothing reads the channel back during an import.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Log level for display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A single log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    /// Nesting depth for display
    #[serde(default)]
    pub indent: u8,
    /// Import this entry belongs to, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub import_id: Option<String>,
    /// Pipeline stage name ("received", "decoded", ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl LogEntry {
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            indent: 0,
            import_id: None,
            stage: None,
            timestamp: Utc::now(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Info, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Success, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Error, message)
    }

    pub fn with_indent(mut self, indent: u8) -> Self {
        self.indent = indent;
        self
    }

    pub fn for_import(mut self, import_id: &str, stage: &str) -> Self {
        self.import_id = Some(import_id.to_string());
        self.stage = Some(stage.to_string());
        self
    }
}

/// Global log broadcaster
pub static LOG_BROADCASTER: Lazy<LogBroadcaster> = Lazy::new(LogBroadcaster::new);

/// Broadcasts log entries to all connected SSE clients
pub struct LogBroadcaster {
    sender: broadcast::Sender<LogEntry>,
}

impl LogBroadcaster {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(256);
        Self { sender }
    }

    /// Send a log entry to all subscribers
    pub fn log(&self, entry: LogEntry) {
        let prefix = match entry.level {
            LogLevel::Info => "   ",
            LogLevel::Success => "   ✓",
            LogLevel::Warning => "   ⚠️",
            LogLevel::Error => "   ❌",
        };
        let indent = "   ".repeat(entry.indent as usize);
        let tag = match (&entry.import_id, &entry.stage) {
            (Some(id), Some(stage)) => format!("[{} {}] ", short_id(id), stage),
            _ => String::new(),
        };
        println!("{}{} {}{}", indent, prefix, tag, entry.message);

        // No receivers is fine
        let _ = self.sender.send(entry);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LogEntry> {
        self.sender.subscribe()
    }
}

impl Default for LogBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

/// Logger bound to one import id.
#[derive(Debug, Clone)]
pub struct ImportLog {
    import_id: String,
}

impl ImportLog {
    pub fn new(import_id: impl Into<String>) -> Self {
        Self { import_id: import_id.into() }
    }

    pub fn import_id(&self) -> &str {
        &self.import_id
    }

    pub fn info(&self, stage: &str, msg: impl Into<String>) {
        self.emit(LogEntry::info(msg), stage);
    }

    pub fn success(&self, stage: &str, msg: impl Into<String>) {
        self.emit(LogEntry::success(msg), stage);
    }

    pub fn warning(&self, stage: &str, msg: impl Into<String>) {
        self.emit(LogEntry::warning(msg), stage);
    }

    pub fn error(&self, stage: &str, msg: impl Into<String>) {
        self.emit(LogEntry::error(msg), stage);
    }

    pub fn detail(&self, stage: &str, msg: impl Into<String>) {
        self.emit(LogEntry::info(msg).with_indent(1), stage);
    }

    fn emit(&self, entry: LogEntry, stage: &str) {
        LOG_BROADCASTER.log(entry.for_import(&self.import_id, stage));
    }
}
