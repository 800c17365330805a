use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::Arc;

use super::{Hook, HookPayload};
use crate::env::store::EnvAccess;
use crate::error::PostscriptError;
use crate::state::response_state::{PostscriptReport, ResponseRecord};

/// An external program. It reads the response as JSON on stdin and writes
/// `NAME=value` lines to the file named by `HTTUI_ENV_FILE`.
pub struct ProcessHook {
    path: PathBuf,
}

impl ProcessHook {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    fn spawn_error(&self, source: std::io::Error) -> PostscriptReport {
        PostscriptReport {
            error: Some(PostscriptError::Spawn {
                path: self.path.clone(),
                source,
            }),
            ..Default::default()
        }
    }
}

impl Hook for ProcessHook {
    fn run(&self, response: &ResponseRecord, env: Arc<dyn EnvAccess>) -> PostscriptReport {
        let env_file = match tempfile::NamedTempFile::new() {
            Ok(file) => file,
            Err(err) => return self.spawn_error(err),
        };
        let payload = serde_json::to_vec(&HookPayload::new(response)).unwrap_or_default();
        let status = response.status.map(|s| s.to_string()).unwrap_or_default();

        let child = Command::new(&self.path)
            .envs(env.overrides())
            .env("HTTUI_STATUS", status)
            .env("HTTUI_ENV_FILE", env_file.path())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn();
        let mut child = match child {
            Ok(child) => child,
            Err(err) => return self.spawn_error(err),
        };

        // Written from a separate thread so a hook that never reads stdin
        // cannot stall on a full pipe.
        if let Some(mut stdin) = child.stdin.take() {
            std::thread::spawn(move || {
                if let Err(err) = stdin.write_all(&payload) {
                    if is_unexpected_write_error(&err) {
                        tracing::debug!(error = %err, "Writing postscript payload failed");
                    }
                }
            });
        }

        let output = match child.wait_with_output() {
            Ok(output) => output,
            Err(err) => return self.spawn_error(err),
        };

        let updated = match std::fs::read_to_string(env_file.path()) {
            Ok(text) => apply_env_lines(&text, env.as_ref()),
            Err(_) => Vec::new(),
        };

        let error = (!output.status.success()).then(|| PostscriptError::Exit {
            path: self.path.clone(),
            code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });

        PostscriptReport {
            output: String::from_utf8_lossy(&output.stdout)
                .lines()
                .map(str::to_string)
                .collect(),
            updated,
            error,
        }
    }
}

/// Apply `NAME=value` / `export NAME=value` lines, returning the names set.
pub fn apply_env_lines(text: &str, env: &dyn EnvAccess) -> Vec<String> {
    let mut updated = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = line.strip_prefix("export ").unwrap_or(line);
        let Some((name, value)) = line.split_once('=') else {
            continue;
        };
        let name = name.trim();
        if name.is_empty() {
            continue;
        }
        env.set(name, value);
        updated.push(name.to_string());
    }
    updated
}

/// A hook that exits without reading stdin closes the pipe early.
fn is_unexpected_write_error(err: &std::io::Error) -> bool {
    err.kind() != std::io::ErrorKind::BrokenPipe
}
