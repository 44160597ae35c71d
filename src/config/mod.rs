#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli::CliConfig;

use crate::utils::error::{MashupError, Result};
use crate::utils::validation::{
    validate_email, validate_non_empty_string, validate_path, validate_positive_number,
    validate_range, validate_url, Validate,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 10000;
pub const DEFAULT_JOB_TIMEOUT_SECS: u64 = 600;
pub const DEFAULT_EMAIL_SUBJECT: &str = "Your Mashup ZIP File";
pub const DEFAULT_EMAIL_BODY: &str =
    "Hi,\n\nYour mashup has been generated successfully. Please find the ZIP attached.\n\nThanks!";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub worker: WorkerConfig,
    pub media: MediaConfig,
    pub email: EmailConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    pub concurrency: usize,
    pub job_timeout_secs: u64,
    pub queue_capacity: usize,
    pub max_tracked_jobs: usize,
    pub shutdown_grace_secs: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            concurrency: 1,
            job_timeout_secs: DEFAULT_JOB_TIMEOUT_SECS,
            queue_capacity: 100,
            max_tracked_jobs: 1000,
            shutdown_grace_secs: 30,
        }
    }
}

impl WorkerConfig {
    pub fn job_timeout(&self) -> Duration {
        Duration::from_secs(self.job_timeout_secs)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    pub ytdlp_bin: String,
    pub ffmpeg_bin: String,
    pub ffprobe_bin: String,
    pub audio_bitrate: String,
    pub search_suffix: String,
    /// Parent directory for per-job workspaces; the system temp dir when unset.
    pub work_dir: Option<PathBuf>,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            ytdlp_bin: "yt-dlp".to_string(),
            ffmpeg_bin: "ffmpeg".to_string(),
            ffprobe_bin: "ffprobe".to_string(),
            audio_bitrate: "192k".to_string(),
            search_suffix: "official song".to_string(),
            work_dir: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailConfig {
    pub sendgrid_api_key: Option<String>,
    pub from_email: Option<String>,
    pub api_base: String,
    pub subject: String,
    pub body: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            sendgrid_api_key: None,
            from_email: None,
            api_base: "https://api.sendgrid.com".to_string(),
            subject: DEFAULT_EMAIL_SUBJECT.to_string(),
            body: DEFAULT_EMAIL_BODY.to_string(),
        }
    }
}

impl EmailConfig {
    pub fn has_credentials(&self) -> bool {
        self.sendgrid_api_key.is_some() && self.from_email.is_some()
    }
}

fn parse_env<T: FromStr>(name: &str, raw: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| MashupError::InvalidConfigValueError {
            field: name.to_string(),
            value: raw.to_string(),
            reason: e.to_string(),
        })
}

/// Empty strings and unresolved `${VAR}` placeholders count as unset.
fn non_placeholder(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && !(v.starts_with("${") && v.ends_with('}')))
}

impl AppConfig {
    /// Defaults overlaid with the process environment.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Defaults, then the TOML file if given, then the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with(path, |name| std::env::var(name).ok())
    }

    pub fn load_with<F>(path: Option<&Path>, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env_from(lookup)?;
        Ok(config)
    }

    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_env_from(|name| std::env::var(name).ok())
    }

    pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("PORT").filter(|v| !v.trim().is_empty()) {
            self.server.port = parse_env("PORT", &port)?;
        }
        if let Some(key) = non_placeholder(lookup("SENDGRID_API_KEY")) {
            self.email.sendgrid_api_key = Some(key);
        }
        if let Some(from) = non_placeholder(lookup("FROM_EMAIL")) {
            self.email.from_email = Some(from);
        }
        if let Some(concurrency) = lookup("WORKER_CONCURRENCY") {
            self.worker.concurrency = parse_env("WORKER_CONCURRENCY", &concurrency)?;
        }
        if let Some(timeout) = lookup("JOB_TIMEOUT_SECS") {
            self.worker.job_timeout_secs = parse_env("JOB_TIMEOUT_SECS", &timeout)?;
        }
        if let Some(dir) = lookup("MASHUP_WORK_DIR").filter(|v| !v.trim().is_empty()) {
            self.media.work_dir = Some(PathBuf::from(dir));
        }
        Ok(())
    }

    pub(crate) fn normalize(&mut self) {
        self.email.sendgrid_api_key = non_placeholder(self.email.sendgrid_api_key.take());
        self.email.from_email = non_placeholder(self.email.from_email.take());
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("server.host", &self.server.host)?;
        validate_positive_number("server.port", self.server.port as usize, 1)?;

        validate_range("worker.concurrency", self.worker.concurrency, 1, 32)?;
        validate_positive_number("worker.job_timeout_secs", self.worker.job_timeout_secs as usize, 1)?;
        validate_positive_number("worker.queue_capacity", self.worker.queue_capacity, 1)?;
        validate_positive_number("worker.max_tracked_jobs", self.worker.max_tracked_jobs, 1)?;

        validate_non_empty_string("media.ytdlp_bin", &self.media.ytdlp_bin)?;
        validate_non_empty_string("media.ffmpeg_bin", &self.media.ffmpeg_bin)?;
        validate_non_empty_string("media.ffprobe_bin", &self.media.ffprobe_bin)?;
        validate_non_empty_string("media.audio_bitrate", &self.media.audio_bitrate)?;
        if let Some(dir) = &self.media.work_dir {
            validate_path("media.work_dir", &dir.to_string_lossy())?;
        }

        validate_url("email.api_base", &self.email.api_base)?;
        if let Some(from) = &self.email.from_email {
            validate_email("email.from_email", from)?;
        }

        Ok(())
    }
}
