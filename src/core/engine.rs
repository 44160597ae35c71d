use crate::core::Pipeline;
use crate::utils::error::Result;
use std::time::Instant;

pub struct MashupEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> MashupEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    /// Runs extract, transform and load in order and returns the delivery receipt.
    pub async fn run(&self) -> Result<String> {
        let started = Instant::now();
        tracing::info!("Starting mashup process...");

        // Extract
        let phase = Instant::now();
        let tracks = self.pipeline.extract().await?;
        tracing::info!("Extracted {} tracks in {:?}", tracks.len(), phase.elapsed());

        // Transform
        let phase = Instant::now();
        let result = self.pipeline.transform(tracks).await?;
        tracing::info!("Merged {} clips in {:?}", result.clips.len(), phase.elapsed());

        // Load
        let phase = Instant::now();
        let receipt = self.pipeline.load(result).await?;
        tracing::info!("Delivered ({}) in {:?}", receipt, phase.elapsed());

        tracing::info!("Mashup finished in {:?}", started.elapsed());
        Ok(receipt)
    }
}
