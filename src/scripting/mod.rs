//! Postscript hooks: programs run after a successful send that may update
//! the environment later `$env.NAME$` placeholders read from.

pub mod process_hook;
pub mod rhai_hook;

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;

use crate::env::store::EnvAccess;
use crate::state::response_state::{PostscriptReport, ResponseRecord};
use process_hook::ProcessHook;
use rhai_hook::RhaiHook;

pub trait Hook {
    fn run(&self, response: &ResponseRecord, env: Arc<dyn EnvAccess>) -> PostscriptReport;
}

/// The response as hooks see it.
#[derive(Debug, Serialize)]
pub struct HookPayload<'a> {
    pub status: Option<u16>,
    pub status_text: &'a str,
    pub headers: BTreeMap<String, String>,
    pub body: &'a str,
    pub elapsed_ms: u64,
}

impl<'a> HookPayload<'a> {
    pub fn new(response: &'a ResponseRecord) -> Self {
        let mut headers: BTreeMap<String, String> = BTreeMap::new();
        for (name, value) in &response.headers {
            headers
                .entry(name.to_ascii_lowercase())
                .and_modify(|existing| {
                    existing.push_str(", ");
                    existing.push_str(value);
                })
                .or_insert_with(|| value.clone());
        }
        Self {
            status: response.status,
            status_text: &response.status_text,
            headers,
            body: &response.body,
            elapsed_ms: response.elapsed.as_millis() as u64,
        }
    }
}

/// Run the hook at `path`: `*.rhai` in-process, anything else as a program.
pub fn run_postscript(path: &Path, response: &ResponseRecord, env: Arc<dyn EnvAccess>) -> PostscriptReport {
    let is_rhai = path.extension().and_then(|e| e.to_str()) == Some("rhai");
    let report = if is_rhai {
        RhaiHook::new(path).run(response, env)
    } else {
        ProcessHook::new(path).run(response, env)
    };

    match &report.error {
        Some(err) => tracing::warn!(path = %path.display(), error = %err, "Postscript failed"),
        None => tracing::info!(
            path = %path.display(),
            updated = ?report.updated,
            "Postscript finished"
        ),
    }
    report
}
