use crate::utils::validation::is_valid_email;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

/// Smallest accepted N is one above this.
pub const MIN_VIDEO_COUNT_EXCLUSIVE: i64 = 10;
/// Smallest accepted Y is one above this.
pub const MIN_CLIP_SECONDS_EXCLUSIVE: i64 = 20;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MashupRequest {
    pub singer: String,
    pub video_count: u32,
    pub clip_seconds: u32,
    pub email: String,
}

impl MashupRequest {
    /// Builds a request without the web form rules (used by the local runner).
    pub fn new(singer: impl Into<String>, video_count: u32, clip_seconds: u32, email: impl Into<String>) -> Self {
        Self {
            singer: singer.into(),
            video_count,
            clip_seconds,
            email: email.into(),
        }
    }
}

/// Raw fields as posted by the HTML form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SubmitForm {
    pub singer: String,
    pub n: String,
    pub y: String,
    pub email: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RequestRejection {
    #[error("Invalid email.")]
    InvalidEmail,
    #[error("Singer name cannot be empty.")]
    EmptySinger,
    #[error("N and Y must be integers.")]
    NotInteger,
    #[error("N must be > 10.")]
    TooFewVideos,
    #[error("Y must be > 20 seconds.")]
    ClipTooShort,
}

impl SubmitForm {
    /// Checks run in a fixed order and the first failure wins.
    pub fn into_request(self) -> Result<MashupRequest, RequestRejection> {
        let singer = self.singer.trim();
        let email = self.email.trim();

        if !is_valid_email(email) {
            return Err(RequestRejection::InvalidEmail);
        }
        if singer.is_empty() {
            return Err(RequestRejection::EmptySinger);
        }

        let (n, y) = match (self.n.trim().parse::<i64>(), self.y.trim().parse::<i64>()) {
            (Ok(n), Ok(y)) => (n, y),
            _ => return Err(RequestRejection::NotInteger),
        };

        if n <= MIN_VIDEO_COUNT_EXCLUSIVE {
            return Err(RequestRejection::TooFewVideos);
        }
        if y <= MIN_CLIP_SECONDS_EXCLUSIVE {
            return Err(RequestRejection::ClipTooShort);
        }

        // Values beyond u32 are not meaningful for either field.
        let video_count = u32::try_from(n).map_err(|_| RequestRejection::NotInteger)?;
        let clip_seconds = u32::try_from(y).map_err(|_| RequestRejection::NotInteger)?;

        Ok(MashupRequest::new(singer, video_count, clip_seconds, email))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioTrack {
    pub path: PathBuf,
    pub title: String,
}

impl AudioTrack {
    pub fn from_path(path: PathBuf) -> Self {
        let title = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self { path, title }
    }
}

#[derive(Debug, Clone)]
pub struct TransformResult {
    pub clips: Vec<AudioTrack>,
    pub mashup: AudioTrack,
    pub duration: Option<Duration>,
}

#[derive(Debug, Clone)]
pub struct Archive {
    pub path: PathBuf,
    pub file_name: String,
    pub size_bytes: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Uuid::parse_str(raw).ok().map(Self)
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_finished(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

/// Public view of a job; never carries the recipient address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: JobId,
    pub singer: String,
    pub video_count: u32,
    pub clip_seconds: u32,
    pub status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl JobRecord {
    pub fn queued(id: JobId, request: &MashupRequest) -> Self {
        Self {
            id,
            singer: request.singer.clone(),
            video_count: request.video_count,
            clip_seconds: request.clip_seconds,
            status: JobStatus::Queued,
            detail: None,
            error: None,
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
        }
    }
}

/// A queued unit of work: the id plus the full request including the email.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: JobId,
    pub request: MashupRequest,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(singer: &str, n: &str, y: &str, email: &str) -> SubmitForm {
        SubmitForm {
            singer: singer.to_string(),
            n: n.to_string(),
            y: y.to_string(),
            email: email.to_string(),
        }
    }

    #[test]
    fn test_valid_form_is_trimmed() {
        let request = form("  Arijit Singh ", " 12", "30 ", " fan@example.com ")
            .into_request()
            .unwrap();
        assert_eq!(request.singer, "Arijit Singh");
        assert_eq!(request.video_count, 12);
        assert_eq!(request.clip_seconds, 30);
        assert_eq!(request.email, "fan@example.com");
    }

    #[test]
    fn test_email_is_checked_first() {
        let rejection = form("", "x", "y", "not-an-email").into_request().unwrap_err();
        assert_eq!(rejection, RequestRejection::InvalidEmail);
        assert_eq!(rejection.to_string(), "Invalid email.");
    }

    #[test]
    fn test_empty_singer_before_numbers() {
        let rejection = form("   ", "abc", "1", "fan@example.com").into_request().unwrap_err();
        assert_eq!(rejection.to_string(), "Singer name cannot be empty.");
    }

    #[test]
    fn test_non_integer_counts() {
        for (n, y) in [("ten", "30"), ("12", "3.5"), ("", "30")] {
            let rejection = form("Adele", n, y, "fan@example.com").into_request().unwrap_err();
            assert_eq!(rejection, RequestRejection::NotInteger, "n={n:?} y={y:?}");
        }
    }

    #[test]
    fn test_boundaries() {
        let too_few = form("Adele", "10", "30", "fan@example.com").into_request().unwrap_err();
        assert_eq!(too_few.to_string(), "N must be > 10.");

        let too_short = form("Adele", "11", "20", "fan@example.com").into_request().unwrap_err();
        assert_eq!(too_short.to_string(), "Y must be > 20 seconds.");

        let ok = form("Adele", "11", "21", "fan@example.com").into_request().unwrap();
        assert_eq!((ok.video_count, ok.clip_seconds), (11, 21));
    }

    #[test]
    fn test_negative_n_is_too_few() {
        let rejection = form("Adele", "-5", "30", "fan@example.com").into_request().unwrap_err();
        assert_eq!(rejection, RequestRejection::TooFewVideos);
    }

    #[test]
    fn test_job_record_hides_email() {
        let request = MashupRequest::new("Adele", 11, 25, "fan@example.com");
        let record = JobRecord::queued(JobId::new(), &request);
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"status\":\"queued\""));
        assert!(!json.contains("fan@example.com"));
    }

    #[test]
    fn test_audio_track_title_from_stem() {
        let track = AudioTrack::from_path(PathBuf::from("/tmp/x/Hello - Adele.mp3"));
        assert_eq!(track.title, "Hello - Adele");
    }
}
