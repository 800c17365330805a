use std::path::{Path, PathBuf};

use crate::document::{Document, parser::parse_document};
use crate::error::StartupError;

/// A document that was found but skipped.
#[derive(Debug, Clone)]
pub struct LoadFailure {
    pub path: PathBuf,
    pub reason: String,
}

impl LoadFailure {
    pub fn describe(&self) -> String {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string());
        format!("{name}: {}", self.reason)
    }
}

#[derive(Debug, Default)]
pub struct LoadReport {
    pub documents: Vec<Document>,
    pub failures: Vec<LoadFailure>,
}

/// Load a single `.http` file, or every `*.http` file directly inside a
/// directory sorted by file name. Malformed documents are skipped and
/// reported; an unreadable path is fatal.
pub fn load_documents(path: &Path) -> Result<LoadReport, StartupError> {
    let startup = |source| StartupError::Documents {
        path: path.to_path_buf(),
        source,
    };

    let metadata = std::fs::metadata(path).map_err(startup)?;
    if metadata.is_file() {
        let text = std::fs::read_to_string(path).map_err(startup)?;
        let mut report = LoadReport::default();
        load_one(path.to_path_buf(), &text, &mut report);
        return Ok(report);
    }

    let entries = std::fs::read_dir(path).map_err(startup)?;
    let mut files: Vec<PathBuf> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.is_file() && p.extension().and_then(|e| e.to_str()) == Some("http"))
        .collect();
    files.sort();

    let mut report = LoadReport::default();
    for file in files {
        match std::fs::read_to_string(&file) {
            Ok(text) => load_one(file, &text, &mut report),
            Err(err) => {
                tracing::warn!(path = %file.display(), error = %err, "Skipping unreadable document");
                report.failures.push(LoadFailure {
                    path: file,
                    reason: err.to_string(),
                });
            }
        }
    }
    Ok(report)
}

fn load_one(path: PathBuf, text: &str, report: &mut LoadReport) {
    match parse_document(text) {
        Ok(blocks) => {
            tracing::info!(path = %path.display(), blocks = blocks.len(), "Loaded document");
            report.documents.push(Document { path, blocks });
        }
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "Skipping malformed document");
            report.failures.push(LoadFailure {
                path,
                reason: err.to_string(),
            });
        }
    }
}
