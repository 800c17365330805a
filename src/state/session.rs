use std::path::PathBuf;

use crate::document::loader::{LoadFailure, LoadReport};
use crate::document::{Document, RequestBlock};
use crate::env::binder::{ResolvedRequest, bind};
use crate::env::resolver::resolve_blocks;
use crate::env::store::EnvAccess;
use crate::error::{ResolutionError, SendRejected};
use crate::state::request_state::RequestTemplate;
use crate::state::response_state::{PostscriptReport, ResponseRecord};

/// One request block of one document, with its latest outcome.
#[derive(Debug)]
pub struct SessionEntry {
    pub document: usize,
    pub block: usize,
    pub template: Result<RequestTemplate, ResolutionError>,
    pub response: Option<ResponseRecord>,
    pub postscript: Option<PostscriptReport>,
    pub in_flight: bool,
}

impl SessionEntry {
    pub fn is_sendable(&self) -> bool {
        self.template.is_ok()
    }
}

/// Everything a send task needs, detached from the session.
#[derive(Debug)]
pub struct PreparedSend {
    pub index: usize,
    pub request: ResolvedRequest,
    pub postscript: Option<PathBuf>,
}

/// Loaded documents and the outcome of every template. The main loop is
/// the only writer.
#[derive(Debug, Default)]
pub struct Session {
    pub documents: Vec<Document>,
    pub entries: Vec<SessionEntry>,
    pub load_failures: Vec<LoadFailure>,
}

impl Session {
    pub fn from_report(report: LoadReport) -> Self {
        let mut entries = Vec::new();
        for (doc_index, document) in report.documents.iter().enumerate() {
            let _span = tracing::info_span!("resolve", document = %document.path.display()).entered();
            let resolution = resolve_blocks(&document.blocks);
            for (block_index, template) in resolution.templates.into_iter().enumerate() {
                entries.push(SessionEntry {
                    document: doc_index,
                    block: block_index,
                    template,
                    response: None,
                    postscript: None,
                    in_flight: false,
                });
            }
        }

        Self {
            documents: report.documents,
            entries,
            load_failures: report.failures,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entry(&self, index: usize) -> Option<&SessionEntry> {
        self.entries.get(index)
    }

    pub fn document_of(&self, entry: &SessionEntry) -> Option<&Document> {
        self.documents.get(entry.document)
    }

    pub fn block_of(&self, entry: &SessionEntry) -> Option<&RequestBlock> {
        self.document_of(entry).and_then(|doc| doc.blocks.get(entry.block))
    }

    /// List label: the template's name, falling back to the raw block.
    pub fn label(&self, index: usize) -> String {
        let Some(entry) = self.entry(index) else {
            return String::new();
        };
        match &entry.template {
            Ok(template) => template.label(),
            Err(_) => self.block_of(entry).map(RequestBlock::label).unwrap_or_default(),
        }
    }

    /// Bind `$env.NAME$` tokens against the current environment and mark
    /// the entry in flight. A second call before [`Session::complete_send`]
    /// is rejected.
    pub fn begin_send(&mut self, index: usize, env: &dyn EnvAccess) -> Result<PreparedSend, SendRejected> {
        let label = self.label(index);
        let base_dir = match self.entries.get(index) {
            Some(entry) => self.document_of(entry).map(|doc| doc.base_dir().to_path_buf()),
            None => return Err(SendRejected::NoSelection),
        };
        let Some(entry) = self.entries.get_mut(index) else {
            return Err(SendRejected::NoSelection);
        };
        let template = match &entry.template {
            Ok(template) => template,
            Err(err) => return Err(SendRejected::Unsendable(err.to_string())),
        };
        if entry.in_flight {
            return Err(SendRejected::InFlight(label));
        }

        let request = bind(template, env);
        let postscript = template.postscript.as_ref().map(|path| match &base_dir {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path.clone(),
        });
        entry.in_flight = true;

        Ok(PreparedSend {
            index,
            request,
            postscript,
        })
    }

    /// Store the outcome of a send, replacing the previous one.
    pub fn complete_send(&mut self, index: usize, response: ResponseRecord, postscript: Option<PostscriptReport>) {
        if let Some(entry) = self.entries.get_mut(index) {
            entry.response = Some(response);
            entry.postscript = postscript;
            entry.in_flight = false;
        }
    }
}
