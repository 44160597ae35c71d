#![allow(dead_code)]

use async_trait::async_trait;
use mashup::core::{AudioProcessor, AudioSource, AudioTrack};
use mashup::{MashupError, Result};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Writes `available` fake songs (capped at the requested count).
pub struct FakeSource {
    pub available: u32,
    pub calls: AtomicUsize,
}

impl FakeSource {
    pub fn new(available: u32) -> Self {
        Self {
            available,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl AudioSource for FakeSource {
    async fn fetch(&self, singer: &str, count: u32, dir: &Path) -> Result<Vec<AudioTrack>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut tracks = Vec::new();
        for i in 0..count.min(self.available) {
            let path = dir.join(format!("{:02} {}.mp3", i, singer));
            tokio::fs::write(&path, format!("[song{}]", i)).await?;
            tracks.push(AudioTrack::from_path(path));
        }
        Ok(tracks)
    }
}

/// "Trims" by keeping the first `seconds` bytes and merges by concatenation.
pub struct FakeProcessor {
    pub fail_trim: bool,
    pub stall_trim: bool,
}

impl FakeProcessor {
    pub fn new() -> Self {
        Self {
            fail_trim: false,
            stall_trim: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            fail_trim: true,
            ..Self::new()
        }
    }

    /// Trim never finishes within a test's lifetime.
    pub fn stalled() -> Self {
        Self {
            stall_trim: true,
            ..Self::new()
        }
    }
}

#[async_trait]
impl AudioProcessor for FakeProcessor {
    async fn trim(&self, track: &AudioTrack, seconds: u32, out_dir: &Path) -> Result<AudioTrack> {
        if self.fail_trim {
            return Err(MashupError::ToolFailed {
                tool: "ffmpeg".to_string(),
                code: 1,
                stderr: "Invalid data found when processing input".to_string(),
            });
        }
        if self.stall_trim {
            tokio::time::sleep(Duration::from_secs(30)).await;
        }
        let data = tokio::fs::read(&track.path).await?;
        let keep = data.len().min(seconds as usize);
        let out = out_dir.join(format!("trim_{}.mp3", track.title));
        tokio::fs::write(&out, &data[..keep]).await?;
        Ok(AudioTrack::from_path(out))
    }

    async fn merge(&self, tracks: &[AudioTrack], output: &Path) -> Result<AudioTrack> {
        let mut merged = Vec::new();
        for track in tracks {
            merged.extend(tokio::fs::read(&track.path).await?);
        }
        tokio::fs::write(output, merged).await?;
        Ok(AudioTrack::from_path(output.to_path_buf()))
    }

    async fn duration(&self, path: &Path) -> Result<Duration> {
        let len = tokio::fs::metadata(path).await?.len();
        Ok(Duration::from_secs(len))
    }
}

pub fn read_zip_entry(zip_path: &Path, name: &str) -> Vec<u8> {
    use std::io::Read;
    let file = std::fs::File::open(zip_path).unwrap();
    let mut archive = zip::ZipArchive::new(file).unwrap();
    let mut entry = archive.by_name(name).unwrap();
    let mut content = Vec::new();
    entry.read_to_end(&mut content).unwrap();
    content
}

pub fn dir_is_empty(dir: &Path) -> bool {
    std::fs::read_dir(dir).unwrap().next().is_none()
}
