//! Configuration loading and representation.
//!
//! Everything comes from the environment:
//!
//! | variable | meaning | default |
//! |---|---|---|
//! | `REVIVE_DATA_DIR` | directory holding `items.json` / `users.json` | `<platform data dir>/revive` |
//! | `REVIVE_AUDIT_LOG` | `off`, `tracing`, or a JSON-lines file path | `tracing` |
//! | `REVIVE_LOG_FORMAT` | `text` or `json` | `text` |

use std::path::PathBuf;

use thiserror::Error;

use revive_events::{AuditError, AuditSink, NullAuditSink, TracingAuditSink};
use revive_infra::JsonLinesAuditSink;
use revive_observability::LogFormat;

pub const DATA_DIR_VAR: &str = "REVIVE_DATA_DIR";
pub const AUDIT_LOG_VAR: &str = "REVIVE_AUDIT_LOG";
pub const LOG_FORMAT_VAR: &str = "REVIVE_LOG_FORMAT";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {var}: {message}")]
    Invalid { var: &'static str, message: String },

    #[error("failed to open audit log: {0}")]
    AuditLog(#[from] AuditError),
}

/// Where audit events go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuditTarget {
    Off,
    Tracing,
    File(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub data_dir: PathBuf,
    pub audit: AuditTarget,
    pub log_format: LogFormat,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let data_dir = get(DATA_DIR_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(default_data_dir);

        let audit = match get(AUDIT_LOG_VAR) {
            None => AuditTarget::Tracing,
            Some(v) if v.eq_ignore_ascii_case("tracing") => AuditTarget::Tracing,
            Some(v) if v.eq_ignore_ascii_case("off") => AuditTarget::Off,
            Some(path) => AuditTarget::File(PathBuf::from(path)),
        };

        let log_format = match get(LOG_FORMAT_VAR) {
            None => LogFormat::default(),
            Some(v) => v.parse::<LogFormat>().map_err(|message| ConfigError::Invalid {
                var: LOG_FORMAT_VAR,
                message,
            })?,
        };

        Ok(Self {
            data_dir,
            audit,
            log_format,
        })
    }

    /// Instantiate the configured audit sink.
    pub fn audit_sink(&self) -> Result<Box<dyn AuditSink>, ConfigError> {
        let sink: Box<dyn AuditSink> = match &self.audit {
            AuditTarget::Off => Box::new(NullAuditSink),
            AuditTarget::Tracing => Box::new(TracingAuditSink),
            AuditTarget::File(path) => Box::new(JsonLinesAuditSink::open(path)?),
        };
        Ok(sink)
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("revive"))
        .unwrap_or_else(|| PathBuf::from("."))
}
