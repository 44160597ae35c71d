use crate::core::{
    Archive, AudioProcessor, AudioSource, AudioTrack, Delivery, MashupRequest, Pipeline,
    TransformResult,
};
use crate::utils::error::{MashupError, Result};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use zip::write::{SimpleFileOptions, ZipWriter};
use zip::CompressionMethod;

pub const MASHUP_FILE_NAME: &str = "mashup-output.mp3";
pub const ARCHIVE_FILE_NAME: &str = "mashup-output.zip";

/// Per-job scratch directories. Removal is the owner's job.
#[derive(Debug, Clone)]
pub struct Workspace {
    pub root: PathBuf,
    pub downloads: PathBuf,
    pub trims: PathBuf,
}

impl Workspace {
    pub async fn create(root: &Path) -> Result<Self> {
        let workspace = Self {
            root: root.to_path_buf(),
            downloads: root.join("downloads"),
            trims: root.join("trims"),
        };
        tokio::fs::create_dir_all(&workspace.downloads).await?;
        tokio::fs::create_dir_all(&workspace.trims).await?;
        Ok(workspace)
    }
}

/// Download → trim/merge → zip/deliver for a single request.
pub struct MashupPipeline {
    source: Arc<dyn AudioSource>,
    processor: Arc<dyn AudioProcessor>,
    delivery: Arc<dyn Delivery>,
    request: MashupRequest,
    workspace: Workspace,
}

impl MashupPipeline {
    pub fn new(
        source: Arc<dyn AudioSource>,
        processor: Arc<dyn AudioProcessor>,
        delivery: Arc<dyn Delivery>,
        request: MashupRequest,
        workspace: Workspace,
    ) -> Self {
        Self {
            source,
            processor,
            delivery,
            request,
            workspace,
        }
    }
}

/// Writes `file` into a new deflated zip at `zip_path` under its bare file name.
pub fn zip_single_file(file: &Path, zip_path: &Path) -> Result<u64> {
    let entry_name = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| MashupError::ProcessingError {
            message: format!("{} has no file name", file.display()),
        })?;

    let mut zip = ZipWriter::new(File::create(zip_path)?);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    zip.start_file(entry_name, options)?;
    let mut source = File::open(file)?;
    std::io::copy(&mut source, &mut zip)?;
    zip.finish()?;

    Ok(std::fs::metadata(zip_path)?.len())
}

#[async_trait::async_trait]
impl Pipeline for MashupPipeline {
    async fn extract(&self) -> Result<Vec<AudioTrack>> {
        tracing::info!(
            "🚀 Fetching {} songs for '{}'",
            self.request.video_count,
            self.request.singer
        );

        let tracks = self
            .source
            .fetch(
                &self.request.singer,
                self.request.video_count,
                &self.workspace.downloads,
            )
            .await?;

        if tracks.is_empty() {
            return Err(MashupError::NoAudioDownloaded);
        }

        tracing::info!("📊 Extracted {} tracks", tracks.len());
        Ok(tracks)
    }

    async fn transform(&self, tracks: Vec<AudioTrack>) -> Result<TransformResult> {
        tracing::info!(
            "🔧 Trimming {} tracks to {}s",
            tracks.len(),
            self.request.clip_seconds
        );

        let mut clips = Vec::with_capacity(tracks.len());
        for track in &tracks {
            let clip = self
                .processor
                .trim(track, self.request.clip_seconds, &self.workspace.trims)
                .await?;
            clips.push(clip);
        }

        let output = self.workspace.root.join(MASHUP_FILE_NAME);
        let mashup = self.processor.merge(&clips, &output).await?;

        // 長度僅供記錄，探測失敗不影響結果
        let duration = match self.processor.duration(&mashup.path).await {
            Ok(duration) => Some(duration),
            Err(e) => {
                tracing::warn!("⚠️ Could not probe mashup duration: {}", e);
                None
            }
        };

        tracing::info!(
            "✅ Merged {} clips into {} ({:?})",
            clips.len(),
            MASHUP_FILE_NAME,
            duration
        );
        Ok(TransformResult {
            clips,
            mashup,
            duration,
        })
    }

    async fn load(&self, result: TransformResult) -> Result<String> {
        let zip_path = self.workspace.root.join(ARCHIVE_FILE_NAME);
        let mashup_path = result.mashup.path.clone();
        let target = zip_path.clone();

        let size_bytes = tokio::task::spawn_blocking(move || zip_single_file(&mashup_path, &target))
            .await
            .map_err(|e| MashupError::ProcessingError {
                message: format!("zip task failed: {}", e),
            })??;

        tracing::info!("📦 Archive ready: {} ({} bytes)", ARCHIVE_FILE_NAME, size_bytes);

        let archive = Archive {
            path: zip_path,
            file_name: ARCHIVE_FILE_NAME.to_string(),
            size_bytes,
        };
        self.delivery.deliver(&self.request, &archive).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[tokio::test]
    async fn test_workspace_layout() {
        let temp = tempfile::tempdir().unwrap();
        let workspace = Workspace::create(temp.path()).await.unwrap();
        assert!(workspace.downloads.is_dir());
        assert!(workspace.trims.is_dir());
        assert_eq!(workspace.downloads, temp.path().join("downloads"));
    }

    #[test]
    fn test_zip_single_file_uses_bare_name() {
        let temp = tempfile::tempdir().unwrap();
        let mp3 = temp.path().join(MASHUP_FILE_NAME);
        std::fs::write(&mp3, b"ID3 fake audio").unwrap();
        let zip_path = temp.path().join(ARCHIVE_FILE_NAME);

        let size = zip_single_file(&mp3, &zip_path).unwrap();
        assert!(size > 0);

        let mut archive = zip::ZipArchive::new(File::open(&zip_path).unwrap()).unwrap();
        assert_eq!(archive.len(), 1);
        let mut entry = archive.by_index(0).unwrap();
        assert_eq!(entry.name(), MASHUP_FILE_NAME);
        assert_eq!(entry.compression(), CompressionMethod::Deflated);
        let mut content = Vec::new();
        entry.read_to_end(&mut content).unwrap();
        assert_eq!(content, b"ID3 fake audio");
    }
}
