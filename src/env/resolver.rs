use std::collections::HashMap;

use crate::document::RequestBlock;
use crate::env::interpolator::{parse_env_tokens, parse_vars, substitute};
use crate::error::ResolutionError;
use crate::state::request_state::{BodyKind, Header, RequestTemplate};

/// Cumulative `@name=value` scope of one document, in definition order.
#[derive(Debug, Default)]
pub struct VariableTable {
    order: Vec<String>,
    values: HashMap<String, String>,
}

impl VariableTable {
    /// Define or redefine; a redefinition keeps the original position.
    pub fn define(&mut self, name: &str, value: &str) {
        if self.values.insert(name.to_string(), value.to_string()).is_none() {
            self.order.push(name.to_string());
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.order
            .iter()
            .map(|name| (name.as_str(), self.values[name].as_str()))
    }
}

/// Templates of one document plus the variable table as it stood after the
/// last block.
#[derive(Debug)]
pub struct Resolution {
    pub templates: Vec<Result<RequestTemplate, ResolutionError>>,
    pub variables: VariableTable,
}

/// Walk a document's blocks top to bottom, growing the variable table and
/// emitting one template (or resolution failure) per block.
pub fn resolve_blocks(blocks: &[RequestBlock]) -> Resolution {
    let mut table = VariableTable::default();
    let templates = blocks
        .iter()
        .map(|block| {
            for var in &block.variables {
                table.define(&var.name, &var.value);
            }
            let result = resolve_block(block, &table);
            if let Err(err) = &result {
                tracing::warn!(line = block.line, error = %err, "Template is unsendable");
            }
            result
        })
        .collect();
    Resolution {
        templates,
        variables: table,
    }
}

pub fn resolve_block(block: &RequestBlock, table: &VariableTable) -> Result<RequestTemplate, ResolutionError> {
    let label = block.label();
    let expand = |text: &str| -> Result<String, ResolutionError> {
        let spans = parse_vars(text);
        if let Some((_, _, missing)) = spans.iter().find(|(_, _, name)| table.get(name).is_none()) {
            return Err(ResolutionError::UndefinedVariable {
                variable: missing.clone(),
                request: label.clone(),
            });
        }
        Ok(substitute(text, &spans, |name| table.get(name).map(str::to_string)))
    };

    let url = expand(&block.url)?;
    let headers = block
        .headers
        .iter()
        .map(|h| Ok(Header::new(expand(&h.name)?, expand(&h.value)?)))
        .collect::<Result<Vec<_>, ResolutionError>>()?;
    let body = block.body.as_deref().map(expand).transpose()?;
    let body_kind = BodyKind::from_headers(&headers);

    if let Some(text) = &body {
        // Bodies still waiting on the environment are checked at send time.
        if parse_env_tokens(text).is_empty() {
            validate_body(&body_kind, text).map_err(|reason| ResolutionError::InvalidBody {
                request: label.clone(),
                reason,
            })?;
        }
    }

    Ok(RequestTemplate {
        name: block.name.clone(),
        method: block.method,
        url,
        version: block.version,
        headers,
        body,
        body_kind,
        postscript: block.postscript.clone(),
    })
}

/// Check a body against the encoding its content type promises.
pub fn validate_body(kind: &BodyKind, body: &str) -> Result<(), String> {
    match kind {
        BodyKind::Json => serde_json::from_str::<serde_json::Value>(body)
            .map(|_| ())
            .map_err(|e| format!("malformed JSON: {e}")),
        BodyKind::Form => {
            for pair in body.trim().split('&') {
                if !pair.contains('=') {
                    return Err(format!("form field '{pair}' is not key=value"));
                }
            }
            Ok(())
        }
        BodyKind::Multipart => multipart_fields(body).map(|_| ()),
        BodyKind::Text | BodyKind::Other(_) => Ok(()),
    }
}

/// `name=value` per line; file parts (`name=@path`) are not supported.
pub fn multipart_fields(body: &str) -> Result<Vec<(String, String)>, String> {
    body.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            let (name, value) = line
                .split_once('=')
                .ok_or_else(|| format!("multipart field '{}' is not name=value", line.trim()))?;
            let value = value.trim();
            if value.starts_with('@') {
                return Err(format!("file part '{}' is not supported", name.trim()));
            }
            Ok((name.trim().to_string(), value.to_string()))
        })
        .collect()
}
