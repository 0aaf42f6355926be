//! Configuration file support.
//!
//! Settings for the recolor screen, loaded from a JSON file. Every field is
//! optional; anything missing falls back to the defaults and command-line
//! flags take precedence over the file.

use std::{path::Path, time::Duration};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::{
    endpoint::DEFAULT_ENDPOINT,
    media::CaptureOptions,
    screen::{state::ConcurrencyPolicy, ScreenOptions},
};

/// Log level setting for the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    #[default]
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Level reached by passing `-v` this many times, starting from `self`
    pub fn raised_by(&self, verbosity: u8) -> LogLevel {
        let all = [
            LogLevel::Error,
            LogLevel::Warn,
            LogLevel::Info,
            LogLevel::Debug,
            LogLevel::Trace,
        ];
        let start = all.iter().position(|level| level == self).unwrap_or(1);
        all[(start + usize::from(verbosity)).min(all.len() - 1)]
    }

    /// Convert to log crate's LevelFilter.
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
    /// Recolor endpoint url
    pub endpoint: Option<String>,
    /// Request timeout in seconds. No timeout when absent.
    pub timeout_secs: Option<u64>,
    pub capture: Option<CaptureOptions>,
    pub policy: Option<ConcurrencyPolicy>,
    pub log_level: Option<LogLevel>,
}

impl AppConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        Self::parse(&contents).with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    pub fn parse(contents: &str) -> Result<Self> {
        Ok(serde_json::from_str(contents)?)
    }

    pub fn endpoint(&self) -> &str {
        self.endpoint.as_deref().unwrap_or(DEFAULT_ENDPOINT)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    pub fn log_level(&self) -> LogLevel {
        self.log_level.unwrap_or_default()
    }

    pub fn screen_options(&self) -> ScreenOptions {
        ScreenOptions {
            capture: self.capture.unwrap_or_default(),
            policy: self.policy.unwrap_or_default(),
        }
    }
}
