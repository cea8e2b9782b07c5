//! Delivery of the finished report.
//!
//! Sinks are only handed a report after a successful run, so a failed run
//! never overwrites the previous message.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};

pub const ENV_TELEGRAM_BOT_TOKEN: &str = "TELEGRAM_BOT_TOKEN";
pub const ENV_TELEGRAM_CHAT_ID: &str = "TELEGRAM_CHAT_ID";

/// Telegram rejects messages longer than this many characters.
pub const TELEGRAM_MAX_CHARS: usize = 4096;

const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("telegram is not configured: {0} is not set")]
    TelegramNotConfigured(&'static str),

    #[error("telegram request failed: {0}")]
    Http(String),

    #[error("telegram rejected the message: {0}")]
    Rejected(String),
}

/// Somewhere a report can be delivered.
pub trait MessageSink {
    fn name(&self) -> &str;
    fn deliver(&self, text: &str) -> Result<(), SinkError>;
}

/// Writes the report to a file, creating parent directories.
#[derive(Debug, Clone)]
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl MessageSink for FileSink {
    fn name(&self) -> &str {
        "file"
    }

    fn deliver(&self, text: &str) -> Result<(), SinkError> {
        let write_err = |source| SinkError::Write {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        fs::write(&self.path, text).map_err(write_err)?;
        info!(path = %self.path.display(), "report written");
        Ok(())
    }
}

/// Prints the report to standard output.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutSink;

impl MessageSink for StdoutSink {
    fn name(&self) -> &str {
        "stdout"
    }

    fn deliver(&self, text: &str) -> Result<(), SinkError> {
        println!("{text}");
        Ok(())
    }
}

/// Bot credentials for the Telegram sink.
#[derive(Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub chat_id: String,
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &"<redacted>")
            .field("chat_id", &self.chat_id)
            .finish()
    }
}

impl TelegramConfig {
    pub fn from_env() -> Result<Self, SinkError> {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    pub fn from_env_with<F>(lookup: F) -> Result<Self, SinkError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &'static str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or(SinkError::TelegramNotConfigured(key))
        };
        Ok(Self {
            bot_token: read(ENV_TELEGRAM_BOT_TOKEN)?,
            chat_id: read(ENV_TELEGRAM_CHAT_ID)?,
        })
    }
}

#[derive(Debug, Deserialize)]
struct TelegramResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Posts the report through the Telegram Bot API `sendMessage` method.
pub struct TelegramSink {
    config: TelegramConfig,
    api_base: String,
    client: reqwest::blocking::Client,
}

impl TelegramSink {
    pub fn new(config: TelegramConfig) -> Result<Self, SinkError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| SinkError::Http(e.to_string()))?;
        Ok(Self {
            config,
            api_base: TELEGRAM_API_BASE.to_string(),
            client,
        })
    }

    /// Point the sink at another Bot API host.
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }

    fn send_url(&self) -> String {
        format!(
            "{}/bot{}/sendMessage",
            self.api_base.trim_end_matches('/'),
            self.config.bot_token
        )
    }
}

impl MessageSink for TelegramSink {
    fn name(&self) -> &str {
        "telegram"
    }

    fn deliver(&self, text: &str) -> Result<(), SinkError> {
        let body = truncate_message(text, TELEGRAM_MAX_CHARS);
        if body.len() < text.len() {
            warn!(max = TELEGRAM_MAX_CHARS, "report truncated for telegram");
        }

        debug!(chat_id = %self.config.chat_id, "sending telegram message");
        let response = self
            .client
            .post(self.send_url())
            .form(&[
                ("chat_id", self.config.chat_id.as_str()),
                ("text", body),
                ("disable_web_page_preview", "true"),
            ])
            .send()
            // reqwest errors embed the URL, which carries the bot token.
            .map_err(|e| SinkError::Http(e.without_url().to_string()))?;

        let status = response.status();
        let parsed: Option<TelegramResponse> = response.json().ok();
        match parsed {
            Some(r) if status.is_success() && r.ok => {
                info!(chat_id = %self.config.chat_id, "telegram message sent");
                Ok(())
            }
            Some(r) => Err(SinkError::Rejected(
                r.description.unwrap_or_else(|| format!("HTTP {status}")),
            )),
            None => Err(SinkError::Rejected(format!("HTTP {status}"))),
        }
    }
}

/// Cut `text` to at most `max_chars` characters on a char boundary.
pub fn truncate_message(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn file_sink_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("gem_message.txt");
        let sink = FileSink::new(&path);
        sink.deliver("✅ DECISION: USA").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "✅ DECISION: USA");
    }

    #[test]
    fn file_sink_overwrites_previous_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gem_message.txt");
        let sink = FileSink::new(&path);
        sink.deliver("first").unwrap();
        sink.deliver("second").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "second");
    }

    #[test]
    fn file_sink_bare_filename_has_no_parent_to_create() {
        let sink = FileSink::new("gem_message.txt");
        assert_eq!(sink.path(), Path::new("gem_message.txt"));
        assert_eq!(sink.name(), "file");
    }

    #[test]
    fn telegram_config_requires_both_vars() {
        let vars: HashMap<&str, &str> = [(ENV_TELEGRAM_BOT_TOKEN, "123:abc")].into();
        let err = TelegramConfig::from_env_with(|k: &str| vars.get(k).map(|v| v.to_string()))
            .unwrap_err();
        assert!(matches!(
            err,
            SinkError::TelegramNotConfigured(ENV_TELEGRAM_CHAT_ID)
        ));
    }

    #[test]
    fn telegram_config_treats_blank_as_unset() {
        let vars: HashMap<&str, &str> =
            [(ENV_TELEGRAM_BOT_TOKEN, "  "), (ENV_TELEGRAM_CHAT_ID, "42")].into();
        let err = TelegramConfig::from_env_with(|k: &str| vars.get(k).map(|v| v.to_string()))
            .unwrap_err();
        assert!(matches!(
            err,
            SinkError::TelegramNotConfigured(ENV_TELEGRAM_BOT_TOKEN)
        ));
    }

    #[test]
    fn telegram_config_debug_hides_token() {
        let cfg = TelegramConfig {
            bot_token: "123:secret".into(),
            chat_id: "42".into(),
        };
        let dbg = format!("{cfg:?}");
        assert!(!dbg.contains("secret"));
        assert!(dbg.contains("42"));
    }

    #[test]
    fn send_url_uses_token_and_base() {
        let sink = TelegramSink::new(TelegramConfig {
            bot_token: "123:abc".into(),
            chat_id: "42".into(),
        })
        .unwrap()
        .with_api_base("http://localhost:8080/");
        assert_eq!(sink.send_url(), "http://localhost:8080/bot123:abc/sendMessage");
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        let text = "📈📈📈";
        assert_eq!(truncate_message(text, 2), "📈📈");
        assert_eq!(truncate_message(text, 3), text);
        assert_eq!(truncate_message(text, 10), text);
        assert_eq!(truncate_message("", 5), "");
    }
}
