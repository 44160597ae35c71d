use crate::adapters::process::{ensure_success, run_tool};
use crate::config::MediaConfig;
use crate::domain::model::AudioTrack;
use crate::domain::ports::AudioProcessor;
use crate::utils::error::{MashupError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONCAT_LIST_FILE: &str = "concat_list.txt";

/// Trims and joins MP3s by shelling out to ffmpeg/ffprobe.
#[derive(Debug, Clone)]
pub struct FfmpegProcessor {
    ffmpeg: String,
    ffprobe: String,
    bitrate: String,
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: FfprobeFormat,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

impl FfmpegProcessor {
    pub fn new(ffmpeg: impl Into<String>, ffprobe: impl Into<String>, bitrate: impl Into<String>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
            bitrate: bitrate.into(),
        }
    }

    pub fn from_config(media: &MediaConfig) -> Self {
        Self::new(&media.ffmpeg_bin, &media.ffprobe_bin, &media.audio_bitrate)
    }

    fn encode_args(&self) -> Vec<OsString> {
        vec![
            "-vn".into(),
            "-codec:a".into(),
            "libmp3lame".into(),
            "-b:a".into(),
            self.bitrate.clone().into(),
        ]
    }

    pub fn trim_args(&self, input: &Path, seconds: u32, output: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "-hide_banner".into(),
            "-loglevel".into(),
            "error".into(),
            "-y".into(),
            "-i".into(),
            input.into(),
            "-t".into(),
            seconds.to_string().into(),
        ];
        args.extend(self.encode_args());
        args.push(output.into());
        args
    }

    pub fn merge_args(&self, list_file: &Path, output: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "-hide_banner".into(),
            "-loglevel".into(),
            "error".into(),
            "-y".into(),
            "-f".into(),
            "concat".into(),
            "-safe".into(),
            "0".into(),
            "-i".into(),
            list_file.into(),
        ];
        args.extend(self.encode_args());
        args.push(output.into());
        args
    }
}

pub fn trimmed_path(track: &Path, out_dir: &Path) -> PathBuf {
    let stem = track
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "clip".to_string());
    out_dir.join(format!("trim_{}.mp3", stem))
}

/// Concat demuxer script; single quotes are closed, escaped and reopened.
pub fn concat_list(tracks: &[AudioTrack]) -> String {
    tracks
        .iter()
        .map(|t| {
            let path = t.path.to_string_lossy().replace('\'', r"'\''");
            format!("file '{}'\n", path)
        })
        .collect()
}

fn parse_duration(stdout: &[u8]) -> Result<Duration> {
    let probe: FfprobeOutput = serde_json::from_slice(stdout)?;
    probe
        .format
        .duration
        .and_then(|d| d.trim().parse::<f64>().ok())
        .filter(|secs| secs.is_finite() && *secs >= 0.0)
        .map(Duration::from_secs_f64)
        .ok_or_else(|| MashupError::ProcessingError {
            message: "ffprobe reported no duration".to_string(),
        })
}

#[async_trait]
impl AudioProcessor for FfmpegProcessor {
    async fn trim(&self, track: &AudioTrack, seconds: u32, out_dir: &Path) -> Result<AudioTrack> {
        let output = trimmed_path(&track.path, out_dir);
        let result = run_tool(&self.ffmpeg, &self.trim_args(&track.path, seconds, &output)).await?;
        ensure_success("ffmpeg", &result)?;
        tracing::debug!("✂️ Trimmed '{}' to {}s", track.title, seconds);
        Ok(AudioTrack::from_path(output))
    }

    async fn merge(&self, tracks: &[AudioTrack], output: &Path) -> Result<AudioTrack> {
        if tracks.is_empty() {
            return Err(MashupError::ProcessingError {
                message: "nothing to merge".to_string(),
            });
        }

        let list_dir = output.parent().unwrap_or_else(|| Path::new("."));
        let list_file = list_dir.join(CONCAT_LIST_FILE);
        tokio::fs::write(&list_file, concat_list(tracks)).await?;

        let result = run_tool(&self.ffmpeg, &self.merge_args(&list_file, output)).await;
        // 清理清單檔
        let _ = tokio::fs::remove_file(&list_file).await;
        ensure_success("ffmpeg", &result?)?;

        Ok(AudioTrack::from_path(output.to_path_buf()))
    }

    async fn duration(&self, path: &Path) -> Result<Duration> {
        let args: Vec<OsString> = vec![
            "-v".into(),
            "quiet".into(),
            "-print_format".into(),
            "json".into(),
            "-show_format".into(),
            path.into(),
        ];
        let output = run_tool(&self.ffprobe, &args).await?;
        ensure_success("ffprobe", &output)?;
        parse_duration(&output.stdout)
    }
}
