use crate::domain::model::{Archive, AudioTrack, MashupRequest, TransformResult};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<String>> + Send;
}

/// Finds and downloads songs, leaving one audio file per song in `dir`.
#[async_trait]
pub trait AudioSource: Send + Sync {
    async fn fetch(&self, singer: &str, count: u32, dir: &Path) -> Result<Vec<AudioTrack>>;
}

#[async_trait]
pub trait AudioProcessor: Send + Sync {
    /// Keeps the first `seconds` of `track`, writing the clip into `out_dir`.
    async fn trim(&self, track: &AudioTrack, seconds: u32, out_dir: &Path) -> Result<AudioTrack>;

    /// Concatenates `tracks` in order into `output`.
    async fn merge(&self, tracks: &[AudioTrack], output: &Path) -> Result<AudioTrack>;

    async fn duration(&self, path: &Path) -> Result<Duration>;
}

/// Hands a finished archive to the requester and returns a short receipt.
#[async_trait]
pub trait Delivery: Send + Sync {
    async fn deliver(&self, request: &MashupRequest, archive: &Archive) -> Result<String>;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Vec<AudioTrack>>;
    async fn transform(&self, tracks: Vec<AudioTrack>) -> Result<TransformResult>;
    async fn load(&self, result: TransformResult) -> Result<String>;
}

/// Executes one queued request end to end.
#[async_trait]
pub trait JobRunner: Send + Sync + 'static {
    async fn run(&self, request: &MashupRequest) -> Result<String>;
}
