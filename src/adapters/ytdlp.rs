use crate::adapters::process::{run_tool, stderr_tail};
use crate::config::MediaConfig;
use crate::domain::model::AudioTrack;
use crate::domain::ports::AudioSource;
use crate::utils::error::{MashupError, Result};
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Searches YouTube through yt-dlp and extracts each hit to MP3.
#[derive(Debug, Clone)]
pub struct YtDlpSource {
    binary: String,
    search_suffix: String,
    audio_quality: String,
}

impl YtDlpSource {
    pub fn new(binary: impl Into<String>, search_suffix: impl Into<String>, bitrate: &str) -> Self {
        Self {
            binary: binary.into(),
            search_suffix: search_suffix.into(),
            // yt-dlp spells bitrates as "192K"
            audio_quality: bitrate.to_uppercase(),
        }
    }

    pub fn from_config(media: &MediaConfig) -> Self {
        Self::new(&media.ytdlp_bin, &media.search_suffix, &media.audio_bitrate)
    }

    pub fn search_query(&self, singer: &str, count: u32) -> String {
        let suffix = self.search_suffix.trim();
        if suffix.is_empty() {
            format!("ytsearch{}:{}", count, singer)
        } else {
            format!("ytsearch{}:{} {}", count, singer, suffix)
        }
    }

    pub fn build_args(&self, query: &str, dir: &Path) -> Vec<OsString> {
        let template = dir.join("%(title).80s.%(ext)s");
        vec![
            "--quiet".into(),
            "--no-warnings".into(),
            "--no-playlist".into(),
            "--format".into(),
            "bestaudio/best".into(),
            "--extract-audio".into(),
            "--audio-format".into(),
            "mp3".into(),
            "--audio-quality".into(),
            self.audio_quality.clone().into(),
            "--output".into(),
            template.into_os_string(),
            query.into(),
        ]
    }
}

pub(crate) async fn list_mp3_files(dir: &Path) -> Result<BTreeSet<PathBuf>> {
    let mut files = BTreeSet::new();
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let is_mp3 = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("mp3"))
            .unwrap_or(false);
        if is_mp3 && entry.file_type().await?.is_file() {
            files.insert(path);
        }
    }
    Ok(files)
}

/// Files present after the download that were not there before, in path order.
pub(crate) fn new_files(before: &BTreeSet<PathBuf>, after: BTreeSet<PathBuf>) -> Vec<PathBuf> {
    after.into_iter().filter(|p| !before.contains(p)).collect()
}

#[async_trait]
impl AudioSource for YtDlpSource {
    async fn fetch(&self, singer: &str, count: u32, dir: &Path) -> Result<Vec<AudioTrack>> {
        let query = self.search_query(singer, count);
        tracing::info!("🔎 Searching: {}", query);

        let before = list_mp3_files(dir).await?;
        let output = run_tool(&self.binary, &self.build_args(&query, dir)).await?;
        let downloaded = new_files(&before, list_mp3_files(dir).await?);

        if !output.status.success() {
            let stderr = stderr_tail(&output.stderr);
            if downloaded.is_empty() {
                return Err(MashupError::DownloadError {
                    message: format!(
                        "yt-dlp exited with code {}: {}",
                        output.status.code().unwrap_or(-1),
                        stderr
                    ),
                });
            }
            tracing::warn!(
                "⚠️ yt-dlp reported errors but {} files were downloaded: {}",
                downloaded.len(),
                stderr
            );
        }

        tracing::info!("📥 Downloaded {}/{} audio files", downloaded.len(), count);
        Ok(downloaded.into_iter().map(AudioTrack::from_path).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_query() {
        let source = YtDlpSource::new("yt-dlp", "official song", "192k");
        assert_eq!(
            source.search_query("Sharry Maan", 12),
            "ytsearch12:Sharry Maan official song"
        );

        let bare = YtDlpSource::new("yt-dlp", "  ", "192k");
        assert_eq!(bare.search_query("Adele", 11), "ytsearch11:Adele");
    }

    #[test]
    fn test_build_args() {
        let source = YtDlpSource::new("yt-dlp", "official song", "192k");
        let args = source.build_args("ytsearch11:Adele official song", Path::new("/work/downloads"));
        let args: Vec<String> = args.iter().map(|a| a.to_string_lossy().into_owned()).collect();

        assert_eq!(args.last().unwrap(), "ytsearch11:Adele official song");
        assert!(args.contains(&"192K".to_string()));
        assert!(args.contains(&"/work/downloads/%(title).80s.%(ext)s".to_string()));
        let idx = args.iter().position(|a| a == "--audio-format").unwrap();
        assert_eq!(args[idx + 1], "mp3");
    }

    #[tokio::test]
    async fn test_new_files_ignores_existing_and_other_extensions() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(dir.path().join("old.mp3"), b"old").await.unwrap();
        let before = list_mp3_files(dir.path()).await.unwrap();

        tokio::fs::write(dir.path().join("b.mp3"), b"b").await.unwrap();
        tokio::fs::write(dir.path().join("a.MP3"), b"a").await.unwrap();
        tokio::fs::write(dir.path().join("c.webm"), b"c").await.unwrap();
        let after = list_mp3_files(dir.path()).await.unwrap();

        let fresh = new_files(&before, after);
        let names: Vec<_> = fresh
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.MP3", "b.mp3"]);
    }

    #[tokio::test]
    async fn test_missing_binary_is_processing_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = YtDlpSource::new("mashup-no-such-yt-dlp", "", "192k");
        let err = source.fetch("Adele", 11, dir.path()).await.unwrap_err();
        assert!(matches!(err, MashupError::ProcessingError { .. }));
    }
}
