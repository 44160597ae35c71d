use crate::domain::model::RequestRejection;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MashupError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("{0}")]
    InvalidRequest(#[from] RequestRejection),

    #[error("Download failed: {message}")]
    DownloadError { message: String },

    #[error("No audio files downloaded. Try a different singer name.")]
    NoAudioDownloaded,

    #[error("{tool} exited with code {code}: {stderr}")]
    ToolFailed {
        tool: String,
        code: i32,
        stderr: String,
    },

    #[error("Audio processing error: {message}")]
    ProcessingError { message: String },

    #[error("Delivery failed with status {status}: {message}")]
    DeliveryError { status: u16, message: String },

    #[error("Job timed out after {seconds}s")]
    JobTimeout { seconds: u64 },

    #[error("Job queue is full ({capacity} jobs waiting)")]
    QueueFull { capacity: usize },

    #[error("Job queue is closed")]
    QueueClosed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Input,
    Network,
    Media,
    Storage,
    Queue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ErrorSeverity {
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorSeverity::Low => 0,      // 警告，但成功
            ErrorSeverity::Medium => 2,   // 可重試
            ErrorSeverity::High => 1,     // 處理錯誤
            ErrorSeverity::Critical => 3, // 系統/配置錯誤
        }
    }
}

impl MashupError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            MashupError::ConfigError { .. }
            | MashupError::ConfigValidationError { .. }
            | MashupError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            MashupError::InvalidRequest(_) => ErrorCategory::Input,
            MashupError::HttpError(_) | MashupError::DeliveryError { .. } => {
                ErrorCategory::Network
            }
            MashupError::DownloadError { .. }
            | MashupError::NoAudioDownloaded
            | MashupError::ToolFailed { .. }
            | MashupError::ProcessingError { .. } => ErrorCategory::Media,
            MashupError::ZipError(_)
            | MashupError::IoError(_)
            | MashupError::SerializationError(_) => ErrorCategory::Storage,
            MashupError::JobTimeout { .. }
            | MashupError::QueueFull { .. }
            | MashupError::QueueClosed => ErrorCategory::Queue,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Input => ErrorSeverity::Low,
            ErrorCategory::Network | ErrorCategory::Queue => ErrorSeverity::Medium,
            ErrorCategory::Media | ErrorCategory::Storage => ErrorSeverity::High,
            ErrorCategory::Configuration => ErrorSeverity::Critical,
        }
    }

    /// Process exit status for a run that ended with this error; never 0.
    pub fn exit_code(&self) -> i32 {
        self.severity().exit_code().max(1)
    }

    /// Whether running the same job again could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            MashupError::HttpError(_)
                | MashupError::DeliveryError { .. }
                | MashupError::DownloadError { .. }
                | MashupError::JobTimeout { .. }
                | MashupError::QueueFull { .. }
        )
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            MashupError::ConfigError { .. } => {
                "Set SENDGRID_API_KEY and FROM_EMAIL, or check the config file"
            }
            MashupError::ConfigValidationError { .. }
            | MashupError::InvalidConfigValueError { .. } => {
                "Fix the reported configuration value and restart"
            }
            MashupError::InvalidRequest(_) => "Correct the form fields and submit again",
            MashupError::NoAudioDownloaded => "Try a different singer name",
            MashupError::DownloadError { .. } => {
                "Check network access and that yt-dlp is up to date"
            }
            MashupError::ToolFailed { .. } | MashupError::ProcessingError { .. } => {
                "Make sure ffmpeg, ffprobe and yt-dlp are installed and on PATH"
            }
            MashupError::HttpError(_) | MashupError::DeliveryError { .. } => {
                "Check the SendGrid API key, sender verification and network access"
            }
            MashupError::JobTimeout { .. } => {
                "Lower N or Y, or raise JOB_TIMEOUT_SECS"
            }
            MashupError::QueueFull { .. } => "Wait for running jobs to finish and retry",
            MashupError::QueueClosed => "The service is shutting down; retry shortly",
            MashupError::ZipError(_)
            | MashupError::IoError(_)
            | MashupError::SerializationError(_) => {
                "Check free disk space and permissions on the work directory"
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            MashupError::InvalidRequest(rejection) => rejection.to_string(),
            MashupError::QueueFull { .. } => {
                "The service is busy right now. Please try again in a few minutes.".to_string()
            }
            MashupError::QueueClosed => {
                "The service is restarting. Please try again shortly.".to_string()
            }
            MashupError::JobTimeout { seconds } => {
                format!("The mashup took longer than {} seconds and was stopped.", seconds)
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, MashupError>;
