use clap::Parser;
use mashup::core::JobRunner;
use mashup::domain::model::MashupRequest;
use mashup::utils::{logger, validation::Validate};
use mashup::{
    AppConfig, FfmpegProcessor, LocalDelivery, LocalStorage, MashupError, MashupRunner,
    YtDlpSource,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "mashup-local")]
#[command(about = "Build one mashup on this machine and save the ZIP locally")]
struct Args {
    /// Singer to search for
    singer: String,

    /// Number of songs to download
    #[arg(short = 'n', long, default_value = "11")]
    videos: u32,

    /// Seconds kept from the start of each song
    #[arg(short = 'y', long, default_value = "21")]
    seconds: u32,

    /// Directory that receives the ZIP
    #[arg(short, long, default_value = "./output")]
    output_path: String,

    /// Optional TOML configuration file (media section is used)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn exit_with(e: &MashupError) -> ! {
    tracing::error!(
        "❌ Mashup failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 建議: {}", e.recovery_suggestion());
    std::process::exit(e.exit_code());
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    logger::init_cli_logger(args.verbose);

    let config = match AppConfig::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => exit_with(&e),
    };
    if let Err(e) = config.validate() {
        exit_with(&e);
    }

    if args.videos == 0 || args.seconds == 0 {
        eprintln!("❌ --videos and --seconds must be at least 1");
        std::process::exit(1);
    }

    tracing::info!(
        "🚀 Local mashup: '{}' N={} Y={} → {}",
        args.singer,
        args.videos,
        args.seconds,
        args.output_path
    );

    let delivery = LocalDelivery::new(LocalStorage::new(args.output_path.clone()));
    let runner = MashupRunner::new(
        Arc::new(YtDlpSource::from_config(&config.media)),
        Arc::new(FfmpegProcessor::from_config(&config.media)),
        Arc::new(delivery),
    )
    .with_work_dir(config.media.work_dir.clone());

    let request = MashupRequest::new(args.singer, args.videos, args.seconds, "");

    match runner.run(&request).await {
        Ok(path) => {
            tracing::info!("✅ Mashup completed successfully!");
            println!("✅ Mashup completed successfully!");
            println!("📁 Output saved to: {}", path);
        }
        Err(e) => exit_with(&e),
    }
}
