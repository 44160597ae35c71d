use crate::config::AppConfig;
use crate::utils::error::{MashupError, Result};
use regex::{Captures, Regex};
use std::path::Path;
use std::sync::LazyLock;

static ENV_PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("placeholder regex is valid"));

impl AppConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(|e| MashupError::ConfigError {
            message: format!("cannot read {}: {}", path.as_ref().display(), e),
        })?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = substitute_env_vars(content, |name| std::env::var(name).ok());

        let mut config: AppConfig =
            toml::from_str(&processed_content).map_err(|e| MashupError::ConfigValidationError {
                field: "toml_parsing".to_string(),
                message: format!("TOML parsing error: {}", e),
            })?;
        config.normalize();
        Ok(config)
    }
}

/// 替換環境變數 (例如 ${SENDGRID_API_KEY})，未設定的保持原樣
pub fn substitute_env_vars<F>(content: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    ENV_PLACEHOLDER
        .replace_all(content, |caps: &Captures| {
            let var_name = &caps[1];
            lookup(var_name).unwrap_or_else(|| format!("${{{}}}", var_name))
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::validation::Validate;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = AppConfig::from_toml_str(
            r#"
[server]
port = 8080

[worker]
job_timeout_secs = 120
"#,
        )
        .unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.worker.job_timeout_secs, 120);
        assert_eq!(config.worker.concurrency, 1);
        assert_eq!(config.media.ffmpeg_bin, "ffmpeg");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_substitute_env_vars() {
        let out = substitute_env_vars("key = \"${API}\"\nother = \"${MISSING}\"", |name| {
            (name == "API").then(|| "SG.secret".to_string())
        });
        assert_eq!(out, "key = \"SG.secret\"\nother = \"${MISSING}\"");
    }

    #[test]
    fn test_unresolved_secret_is_unset() {
        let config = AppConfig::from_toml_str(
            r#"
[email]
sendgrid_api_key = "${MASHUP_TEST_SURELY_UNSET_KEY}"
from_email = ""
"#,
        )
        .unwrap();
        assert!(config.email.sendgrid_api_key.is_none());
        assert!(config.email.from_email.is_none());
    }

    #[test]
    fn test_malformed_toml() {
        let err = AppConfig::from_toml_str("[server\nport = 1").unwrap_err();
        assert!(matches!(err, MashupError::ConfigValidationError { .. }));
    }
}
