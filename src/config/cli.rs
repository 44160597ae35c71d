use crate::config::AppConfig;
use crate::utils::error::Result;
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "mashup")]
#[command(about = "Web service that builds song mashups and emails them as ZIP files")]
pub struct CliConfig {
    /// Optional TOML configuration file
    #[arg(short, long, env = "MASHUP_CONFIG")]
    pub config: Option<PathBuf>,

    #[arg(long)]
    pub host: Option<String>,

    /// Overrides $PORT
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Jobs processed in parallel
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Per-job timeout in seconds
    #[arg(long)]
    pub job_timeout: Option<u64>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,
}

impl CliConfig {
    /// Defaults, then the config file, then the environment, then flags.
    pub fn resolve(&self) -> Result<AppConfig> {
        let mut config = AppConfig::load(self.config.as_deref())?;
        self.apply_overrides(&mut config);
        Ok(config)
    }

    pub fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(workers) = self.workers {
            config.worker.concurrency = workers;
        }
        if let Some(timeout) = self.job_timeout {
            config.worker.job_timeout_secs = timeout;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let cli = CliConfig::parse_from(["mashup", "--port", "9000", "-w", "3", "--job-timeout", "60"]);
        let mut config = AppConfig::default();
        cli.apply_overrides(&mut config);
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.worker.concurrency, 3);
        assert_eq!(config.worker.job_timeout_secs, 60);
    }

    #[test]
    fn test_no_flags_keep_config() {
        let cli = CliConfig::parse_from(["mashup"]);
        let mut config = AppConfig::default();
        cli.apply_overrides(&mut config);
        assert_eq!(config.server.port, 10000);
        assert!(!cli.verbose);
    }
}
