pub mod loader;
pub mod parser;

use std::path::{Path, PathBuf};

use crate::state::request_state::{Header, HttpMethod, HttpVersion};

/// `@name=value`, recorded in the order it appeared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableDef {
    pub line: usize,
    pub name: String,
    pub value: String,
}

/// One request as written in a document, before any substitution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestBlock {
    /// 1-based line number of the request line.
    pub line: usize,
    /// Definitions that appeared between the previous block and this one.
    pub variables: Vec<VariableDef>,
    pub name: Option<String>,
    pub method: HttpMethod,
    pub url: String,
    pub version: HttpVersion,
    pub headers: Vec<Header>,
    pub body: Option<String>,
    pub postscript: Option<PathBuf>,
}

impl RequestBlock {
    /// Label used in error messages before the block is resolved.
    pub fn label(&self) -> String {
        match &self.name {
            Some(name) => format!("'{name}'"),
            None => format!("{} {} (line {})", self.method, self.url, self.line),
        }
    }

    /// Write the block back out in document syntax.
    pub fn to_http(&self) -> String {
        let mut out = String::new();
        for var in &self.variables {
            out.push_str(&format!("@{}={}\n", var.name, var.value));
        }
        if let Some(name) = &self.name {
            out.push_str(&format!("&{name}\n"));
        }
        out.push_str(&format!("{} {} {}\n", self.method, self.url, self.version.as_str()));
        for header in &self.headers {
            out.push_str(&format!("{}: {}\n", header.name, header.value));
        }
        if let Some(body) = &self.body {
            out.push('\n');
            out.push_str(body);
            out.push('\n');
        }
        if let Some(path) = &self.postscript {
            out.push_str(&format!("@postscript {}\n", path.display()));
        }
        out
    }
}

/// A parsed source file.
#[derive(Debug, Clone)]
pub struct Document {
    pub path: PathBuf,
    pub blocks: Vec<RequestBlock>,
}

impl Document {
    /// Directory that relative postscript paths are resolved against.
    pub fn base_dir(&self) -> &Path {
        self.path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."))
    }

    pub fn display_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}
