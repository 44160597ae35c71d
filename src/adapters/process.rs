use crate::utils::error::{MashupError, Result};
use std::ffi::OsString;
use std::process::{Output, Stdio};
use tokio::process::Command;

const STDERR_TAIL_CHARS: usize = 600;

/// Spawns `program` and waits for it. The child is killed if the future is dropped.
pub async fn run_tool(program: &str, args: &[OsString]) -> Result<Output> {
    tracing::debug!("▶️ {} {:?}", program, args);

    Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                MashupError::ProcessingError {
                    message: format!("{} not found on PATH", program),
                }
            } else {
                MashupError::IoError(e)
            }
        })
}

pub fn ensure_success(tool: &str, output: &Output) -> Result<()> {
    if output.status.success() {
        return Ok(());
    }
    Err(MashupError::ToolFailed {
        tool: tool.to_string(),
        code: output.status.code().unwrap_or(-1),
        stderr: stderr_tail(&output.stderr),
    })
}

pub fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let text = text.trim();
    let count = text.chars().count();
    if count <= STDERR_TAIL_CHARS {
        return text.to_string();
    }
    let tail: String = text.chars().skip(count - STDERR_TAIL_CHARS).collect();
    format!("…{}", tail)
}

/// Returns the binaries from `checks` that cannot be executed.
pub async fn missing_binaries(checks: &[(&str, &str)]) -> Vec<String> {
    let mut missing = Vec::new();
    for (binary, version_flag) in checks {
        let ok = match run_tool(binary, &[OsString::from(*version_flag)]).await {
            Ok(output) => output.status.success(),
            Err(_) => false,
        };
        if !ok {
            missing.push(binary.to_string());
        }
    }
    missing
}
