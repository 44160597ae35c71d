pub mod engine;
pub mod pipeline;
pub mod queue;
pub mod runner;
pub mod worker;

pub use crate::domain::model::{
    Archive, AudioTrack, Job, JobId, JobRecord, JobStatus, MashupRequest, TransformResult,
};
pub use crate::domain::ports::{
    AudioProcessor, AudioSource, Delivery, JobRunner, Pipeline, Storage,
};
pub use crate::utils::error::Result;
