// Adapters layer: concrete implementations for external systems (media tools, email, storage).

pub mod ffmpeg;
pub mod process;
pub mod sendgrid;
pub mod storage;
pub mod ytdlp;

pub use ffmpeg::FfmpegProcessor;
pub use sendgrid::SendGridMailer;
pub use storage::{LocalDelivery, LocalStorage};
pub use ytdlp::YtDlpSource;

use crate::config::MediaConfig;

/// Binaries from `media` that cannot be executed on this host.
pub async fn check_binaries(media: &MediaConfig) -> Vec<String> {
    process::missing_binaries(&[
        (media.ytdlp_bin.as_str(), "--version"),
        (media.ffmpeg_bin.as_str(), "-version"),
        (media.ffprobe_bin.as_str(), "-version"),
    ])
    .await
}
