use crate::core::engine::MashupEngine;
use crate::core::pipeline::{MashupPipeline, Workspace};
use crate::core::{AudioProcessor, AudioSource, Delivery, JobRunner, MashupRequest};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

pub const WORKSPACE_PREFIX: &str = "mashup_";

/// Runs each request in a fresh temp workspace that is removed afterwards.
#[derive(Clone)]
pub struct MashupRunner {
    source: Arc<dyn AudioSource>,
    processor: Arc<dyn AudioProcessor>,
    delivery: Arc<dyn Delivery>,
    work_dir: Option<PathBuf>,
}

impl MashupRunner {
    pub fn new(
        source: Arc<dyn AudioSource>,
        processor: Arc<dyn AudioProcessor>,
        delivery: Arc<dyn Delivery>,
    ) -> Self {
        Self {
            source,
            processor,
            delivery,
            work_dir: None,
        }
    }

    pub fn with_work_dir(mut self, work_dir: Option<PathBuf>) -> Self {
        self.work_dir = work_dir;
        self
    }

    async fn temp_workspace(&self) -> Result<TempDir> {
        let builder = {
            let mut builder = tempfile::Builder::new();
            builder.prefix(WORKSPACE_PREFIX);
            builder
        };
        let dir = match &self.work_dir {
            Some(parent) => {
                tokio::fs::create_dir_all(parent).await?;
                builder.tempdir_in(parent)?
            }
            None => builder.tempdir()?,
        };
        Ok(dir)
    }
}

#[async_trait]
impl JobRunner for MashupRunner {
    async fn run(&self, request: &MashupRequest) -> Result<String> {
        // Dropping `temp` removes the workspace, including on cancellation.
        let temp = self.temp_workspace().await?;
        tracing::debug!("Workspace: {}", temp.path().display());

        let workspace = Workspace::create(temp.path()).await?;
        let pipeline = MashupPipeline::new(
            Arc::clone(&self.source),
            Arc::clone(&self.processor),
            Arc::clone(&self.delivery),
            request.clone(),
            workspace,
        );

        let result = MashupEngine::new(pipeline).run().await;

        if let Err(e) = temp.close() {
            tracing::warn!("⚠️ Failed to remove workspace: {}", e);
        }
        result
    }
}
