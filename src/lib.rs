pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod server;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::AppConfig;

pub use adapters::{FfmpegProcessor, LocalDelivery, LocalStorage, SendGridMailer, YtDlpSource};
pub use crate::core::{
    engine::MashupEngine, pipeline::MashupPipeline, queue::JobQueue, runner::MashupRunner,
    worker::Worker,
};
pub use utils::error::{MashupError, Result};
