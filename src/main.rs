use clap::Parser;
use mashup::adapters::check_binaries;
use mashup::utils::{logger, validation::Validate};
use mashup::{
    server, CliConfig, FfmpegProcessor, JobQueue, MashupError, MashupRunner, SendGridMailer,
    Worker, YtDlpSource,
};
use std::sync::Arc;
use tokio::net::TcpListener;

fn exit_with(e: &MashupError) -> ! {
    tracing::error!(
        "❌ {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
    eprintln!("❌ {}", e.user_friendly_message());
    std::process::exit(e.exit_code());
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("🛑 Shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CliConfig::parse();

    // 初始化日誌
    logger::init_logger(cli.verbose, cli.json_logs);
    tracing::info!("Starting mashup service");

    let config = match cli.resolve() {
        Ok(config) => config,
        Err(e) => exit_with(&e),
    };
    if cli.verbose {
        tracing::debug!("Resolved config: {:?}", config);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        exit_with(&e);
    }

    if !config.email.has_credentials() {
        tracing::warn!("⚠️ SENDGRID_API_KEY or FROM_EMAIL is not set; jobs will fail at the email step");
    }

    for binary in check_binaries(&config.media).await {
        tracing::warn!("⚠️ '{}' is not available; mashup jobs will fail until it is installed", binary);
    }

    let runner = MashupRunner::new(
        Arc::new(YtDlpSource::from_config(&config.media)),
        Arc::new(FfmpegProcessor::from_config(&config.media)),
        Arc::new(SendGridMailer::from_config(&config.email)),
    )
    .with_work_dir(config.media.work_dir.clone());

    let (queue, jobs) = JobQueue::new(config.worker.queue_capacity, config.worker.max_tracked_jobs);
    let worker = Worker::new(
        jobs,
        Arc::new(runner),
        config.worker.concurrency,
        config.worker.job_timeout(),
    );
    let worker_handle = tokio::spawn(worker.run());

    let listener = match TcpListener::bind(config.bind_address()).await {
        Ok(listener) => listener,
        Err(e) => exit_with(&MashupError::IoError(e)),
    };

    // `serve` owns the last queue handle; once it returns the worker drains and stops.
    if let Err(e) = server::serve(listener, queue, shutdown_signal()).await {
        exit_with(&e);
    }

    let grace = config.worker.shutdown_grace();
    match tokio::time::timeout(grace, worker_handle).await {
        Ok(Ok(())) => tracing::info!("✅ All queued jobs finished"),
        Ok(Err(e)) => tracing::error!("❌ Worker stopped abnormally: {}", e),
        Err(_) => tracing::warn!(
            "⚠️ Worker still busy after {:?}; abandoning remaining jobs",
            grace
        ),
    }

    Ok(())
}
