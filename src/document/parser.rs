//! Line-oriented state machine turning `.http` text into [`RequestBlock`]s.
//!
//! A block is: variable definitions and an optional `&name`, the request
//! line, headers up to a blank line, then body lines up to the next blank
//! line. A `@postscript <path>` line may appear anywhere in the block.

use std::path::PathBuf;

use crate::document::{RequestBlock, VariableDef};
use crate::error::{ParseError, ParseErrorKind};
use crate::state::request_state::{Header, HttpMethod, HttpVersion};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Preamble,
    Headers,
    Body,
}

enum LineKind<'a> {
    Blank,
    Comment,
    Variable(&'a str),
    Name(&'a str),
    Postscript(&'a str),
    Other,
}

fn classify(trimmed: &str) -> LineKind<'_> {
    if trimmed.is_empty() {
        return LineKind::Blank;
    }
    if trimmed.starts_with('#') || trimmed.starts_with("//") {
        return LineKind::Comment;
    }
    if let Some(rest) = trimmed.strip_prefix("@postscript") {
        if rest.is_empty() || rest.starts_with(char::is_whitespace) {
            return LineKind::Postscript(rest.trim());
        }
    }
    if let Some(rest) = trimmed.strip_prefix('@') {
        return LineKind::Variable(rest);
    }
    if let Some(rest) = trimmed.strip_prefix('&') {
        return LineKind::Name(rest);
    }
    LineKind::Other
}

/// Everything collected before a request line opens the block.
#[derive(Default)]
struct Preamble {
    variables: Vec<VariableDef>,
    name: Option<String>,
    postscript: Option<PathBuf>,
    /// Line of the first name/postscript, for dangling-block errors.
    anchor: Option<usize>,
}

struct Parser {
    blocks: Vec<RequestBlock>,
    preamble: Preamble,
    current: Option<RequestBlock>,
    body: Vec<String>,
    section: Section,
}

pub fn parse_document(text: &str) -> Result<Vec<RequestBlock>, ParseError> {
    let mut parser = Parser {
        blocks: Vec::new(),
        preamble: Preamble::default(),
        current: None,
        body: Vec::new(),
        section: Section::Preamble,
    };
    for (idx, raw) in text.lines().enumerate() {
        parser.feed(idx + 1, raw.trim_end())?;
    }
    parser.finish()
}

impl Parser {
    fn feed(&mut self, line_no: usize, line: &str) -> Result<(), ParseError> {
        let trimmed = line.trim_start();
        let kind = classify(trimmed);
        if matches!(kind, LineKind::Comment) {
            return Ok(());
        }
        match self.section {
            Section::Preamble => self.feed_preamble(line_no, trimmed, kind),
            Section::Headers => self.feed_header(line_no, trimmed, kind),
            Section::Body => self.feed_body(line_no, line, trimmed, kind),
        }
    }

    fn feed_preamble(&mut self, line_no: usize, trimmed: &str, kind: LineKind<'_>) -> Result<(), ParseError> {
        match kind {
            LineKind::Blank | LineKind::Comment => Ok(()),
            LineKind::Variable(rest) => {
                let var = parse_variable(line_no, rest)?;
                self.preamble.variables.push(var);
                Ok(())
            }
            LineKind::Name(rest) => {
                if self.preamble.name.is_some() {
                    return Err(ParseError::new(line_no, ParseErrorKind::DuplicateName));
                }
                let name = rest.trim();
                if name.is_empty() {
                    return Err(ParseError::new(line_no, ParseErrorKind::EmptyName));
                }
                self.preamble.name = Some(name.to_string());
                self.preamble.anchor.get_or_insert(line_no);
                Ok(())
            }
            LineKind::Postscript(path) => {
                let path = parse_postscript(line_no, path, self.preamble.postscript.is_some())?;
                self.preamble.postscript = Some(path);
                self.preamble.anchor.get_or_insert(line_no);
                Ok(())
            }
            LineKind::Other => self.open_block(line_no, trimmed),
        }
    }

    fn feed_header(&mut self, line_no: usize, trimmed: &str, kind: LineKind<'_>) -> Result<(), ParseError> {
        match kind {
            LineKind::Blank => {
                let has_body = self
                    .current
                    .as_ref()
                    .is_some_and(|block| method_takes_body(block.method));
                if has_body {
                    self.section = Section::Body;
                } else {
                    self.close_block();
                }
                Ok(())
            }
            LineKind::Comment => Ok(()),
            // Definitions after the request line belong to the next block.
            LineKind::Variable(_) | LineKind::Name(_) => {
                self.close_block();
                self.feed_preamble(line_no, trimmed, kind)
            }
            LineKind::Postscript(path) => self.set_postscript(line_no, path),
            LineKind::Other => {
                let header = parse_header(line_no, trimmed)?;
                if let Some(block) = self.current.as_mut() {
                    block.headers.push(header);
                }
                Ok(())
            }
        }
    }

    fn feed_body(
        &mut self,
        line_no: usize,
        line: &str,
        trimmed: &str,
        kind: LineKind<'_>,
    ) -> Result<(), ParseError> {
        match kind {
            LineKind::Blank => {
                self.close_block();
                Ok(())
            }
            LineKind::Comment => Ok(()),
            LineKind::Variable(_) | LineKind::Name(_) => {
                self.close_block();
                self.feed_preamble(line_no, trimmed, kind)
            }
            LineKind::Postscript(path) => {
                self.set_postscript(line_no, path)?;
                self.close_block();
                Ok(())
            }
            LineKind::Other if self.body.is_empty() && looks_like_request_line(trimmed) => {
                self.close_block();
                self.open_block(line_no, trimmed)
            }
            LineKind::Other => {
                self.body.push(line.to_string());
                Ok(())
            }
        }
    }

    fn open_block(&mut self, line_no: usize, trimmed: &str) -> Result<(), ParseError> {
        let (method, url, version) = parse_request_line(line_no, trimmed)?;
        let preamble = std::mem::take(&mut self.preamble);
        self.current = Some(RequestBlock {
            line: line_no,
            variables: preamble.variables,
            name: preamble.name,
            method,
            url,
            version,
            headers: Vec::new(),
            body: None,
            postscript: preamble.postscript,
        });
        self.section = Section::Headers;
        Ok(())
    }

    fn set_postscript(&mut self, line_no: usize, path: &str) -> Result<(), ParseError> {
        let Some(block) = self.current.as_mut() else {
            return Ok(());
        };
        let path = parse_postscript(line_no, path, block.postscript.is_some())?;
        block.postscript = Some(path);
        Ok(())
    }

    fn close_block(&mut self) {
        if let Some(mut block) = self.current.take() {
            if !self.body.is_empty() {
                block.body = Some(self.body.join("\n"));
            }
            self.blocks.push(block);
        }
        self.body.clear();
        self.section = Section::Preamble;
    }

    fn finish(mut self) -> Result<Vec<RequestBlock>, ParseError> {
        self.close_block();
        if let Some(line) = self.preamble.anchor {
            return Err(ParseError::new(line, ParseErrorKind::DanglingBlock));
        }
        Ok(self.blocks)
    }
}

/// Methods whose blank line after the headers ends the block outright.
fn method_takes_body(method: HttpMethod) -> bool {
    matches!(method, HttpMethod::Post | HttpMethod::Put | HttpMethod::Patch)
}

/// `POST https://...` as the first line after a blank starts a new block
/// rather than a body.
fn looks_like_request_line(trimmed: &str) -> bool {
    let mut tokens = trimmed.split_whitespace();
    let Some(method) = tokens.next() else {
        return false;
    };
    method.chars().all(|c| c.is_ascii_uppercase())
        && HttpMethod::parse(method).is_some()
        && tokens.next().is_some()
}

fn parse_request_line(line_no: usize, trimmed: &str) -> Result<(HttpMethod, String, HttpVersion), ParseError> {
    let mut tokens = trimmed.split_whitespace();
    let method_token = tokens.next().unwrap_or_default();
    let method = HttpMethod::parse(method_token).ok_or_else(|| {
        ParseError::new(line_no, ParseErrorKind::UnknownMethod(method_token.to_string()))
    })?;
    let url = tokens
        .next()
        .ok_or_else(|| ParseError::new(line_no, ParseErrorKind::MissingUrl))?
        .to_string();
    let version = match tokens.next() {
        Some(token) => HttpVersion::parse(token).ok_or_else(|| {
            ParseError::new(line_no, ParseErrorKind::UnsupportedVersion(token.to_string()))
        })?,
        None => HttpVersion::default(),
    };
    if let Some(extra) = tokens.next() {
        return Err(ParseError::new(line_no, ParseErrorKind::TrailingToken(extra.to_string())));
    }
    Ok((method, url, version))
}

fn parse_header(line_no: usize, trimmed: &str) -> Result<Header, ParseError> {
    let invalid = || ParseError::new(line_no, ParseErrorKind::InvalidHeader(trimmed.to_string()));
    let (name, value) = trimmed.split_once(':').ok_or_else(invalid)?;
    let name = name.trim();
    if name.is_empty() || name.contains(char::is_whitespace) {
        return Err(invalid());
    }
    let value = value.trim();
    if value.is_empty() {
        return Err(ParseError::new(line_no, ParseErrorKind::HeaderWithoutValue(name.to_string())));
    }
    Ok(Header::new(name, value))
}

fn parse_variable(line_no: usize, rest: &str) -> Result<VariableDef, ParseError> {
    let (name, value) = rest
        .split_once('=')
        .ok_or_else(|| ParseError::new(line_no, ParseErrorKind::MalformedVariable))?;
    let name = name.trim();
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
    if !valid {
        return Err(ParseError::new(line_no, ParseErrorKind::InvalidVariableName(name.to_string())));
    }
    Ok(VariableDef {
        line: line_no,
        name: name.to_string(),
        value: value.trim().to_string(),
    })
}

fn parse_postscript(line_no: usize, path: &str, already_set: bool) -> Result<PathBuf, ParseError> {
    if path.is_empty() {
        return Err(ParseError::new(line_no, ParseErrorKind::EmptyPostscript));
    }
    if already_set {
        return Err(ParseError::new(line_no, ParseErrorKind::DuplicatePostscript));
    }
    Ok(PathBuf::from(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_get() {
        let blocks = parse_document("GET https://example.com/ping HTTP/1.1\n").unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].method, HttpMethod::Get);
        assert_eq!(blocks[0].url, "https://example.com/ping");
        assert_eq!(blocks[0].version, HttpVersion::Http11);
        assert_eq!(blocks[0].line, 1);
        assert!(blocks[0].body.is_none());
    }

    #[test]
    fn test_parse_full_block() {
        let text = "\
# create an item
@host=example.com
&Create item
POST https://{{host}}/items
Content-Type: application/json
Authorization: Bearer $env.TOKEN$

{\"a\":1}
@postscript hooks/save.rhai
";
        let blocks = parse_document(text).unwrap();
        assert_eq!(blocks.len(), 1);
        let block = &blocks[0];
        assert_eq!(block.variables.len(), 1);
        assert_eq!(block.variables[0].name, "host");
        assert_eq!(block.variables[0].value, "example.com");
        assert_eq!(block.name.as_deref(), Some("Create item"));
        assert_eq!(block.method, HttpMethod::Post);
        assert_eq!(block.line, 4);
        assert_eq!(block.headers.len(), 2);
        assert_eq!(block.headers[1], Header::new("Authorization", "Bearer $env.TOKEN$"));
        assert_eq!(block.body.as_deref(), Some("{\"a\":1}"));
        assert_eq!(block.postscript, Some(PathBuf::from("hooks/save.rhai")));
    }

    #[test]
    fn test_multiline_body_keeps_indentation() {
        let text = "PUT https://x/1\nContent-Type: application/json\n\n{\n  \"a\": 1\n}\n";
        let blocks = parse_document(text).unwrap();
        assert_eq!(blocks[0].body.as_deref(), Some("{\n  \"a\": 1\n}"));
    }

    #[test]
    fn test_blocks_separated_by_blank_lines_and_comments() {
        let text = "\
GET https://x/1

// second
GET https://x/2
Accept: text/plain


POST https://x/3

DELETE https://x/4
";
        let blocks = parse_document(text).unwrap();
        let urls: Vec<&str> = blocks.iter().map(|b| b.url.as_str()).collect();
        assert_eq!(urls, ["https://x/1", "https://x/2", "https://x/3", "https://x/4"]);
        assert!(blocks[2].body.is_none());
    }

    #[test]
    fn test_method_case_insensitive() {
        let blocks = parse_document("patch https://x/1\n").unwrap();
        assert_eq!(blocks[0].method, HttpMethod::Patch);
    }

    #[test]
    fn test_unknown_method_names_line() {
        let err = parse_document("# c\nTRACE https://x\n").unwrap_err();
        assert_eq!(err.line, 2);
        assert_eq!(err.kind, ParseErrorKind::UnknownMethod("TRACE".into()));
    }

    #[test]
    fn test_header_without_value() {
        let err = parse_document("GET https://x\nAccept:\n").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::HeaderWithoutValue("Accept".into()));
        assert_eq!(err.line, 2);
    }

    #[test]
    fn test_header_without_colon() {
        let err = parse_document("GET https://x\nnot a header\n").unwrap_err();
        assert!(matches!(err.kind, ParseErrorKind::InvalidHeader(_)));
    }

    #[test]
    fn test_unsupported_version() {
        let err = parse_document("GET https://x HTTP/2\n").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnsupportedVersion("HTTP/2".into()));
    }

    #[test]
    fn test_missing_url() {
        let err = parse_document("GET\n").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::MissingUrl);
    }

    #[test]
    fn test_variable_after_request_line_belongs_to_next_block() {
        let text = "\
@a=1
GET https://x/{{a}}
@a=2
&second
GET https://x/{{a}}
";
        let blocks = parse_document(text).unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].variables.len(), 1);
        assert_eq!(blocks[0].name, None);
        assert_eq!(blocks[1].variables[0].value, "2");
        assert_eq!(blocks[1].name.as_deref(), Some("second"));
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let err = parse_document("&one\n&two\nGET https://x\n").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::DuplicateName);
        assert_eq!(err.line, 2);
    }

    #[test]
    fn test_duplicate_postscript_rejected() {
        let text = "@postscript a.sh\nGET https://x\n@postscript b.sh\n";
        let err = parse_document(text).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::DuplicatePostscript);
        assert_eq!(err.line, 3);
    }

    #[test]
    fn test_dangling_name_rejected() {
        let err = parse_document("GET https://x\n\n&orphan\n").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::DanglingBlock);
        assert_eq!(err.line, 3);
    }

    #[test]
    fn test_trailing_variables_are_ignored() {
        let blocks = parse_document("GET https://x\n\n@unused=1\n").unwrap();
        assert_eq!(blocks.len(), 1);
    }

    #[test]
    fn test_malformed_variable() {
        let err = parse_document("@novalue\nGET https://x\n").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::MalformedVariable);
    }

    #[test]
    fn test_postscript_equals_is_a_variable() {
        let blocks = parse_document("@postscript=x\nGET https://x\n").unwrap();
        assert_eq!(blocks[0].variables[0].name, "postscript");
        assert!(blocks[0].postscript.is_none());
    }

    #[test]
    fn test_round_trip_structure() {
        let text = "\
@base=https://api.test
&List
GET {{base}}/items HTTP/1.0
Accept: application/json

&Create
POST {{base}}/items
Content-Type: application/x-www-form-urlencoded

a=1&b=2
@postscript hook.sh
";
        let blocks = parse_document(text).unwrap();
        let written: String = blocks
            .iter()
            .map(|b| b.to_http())
            .collect::<Vec<_>>()
            .join("\n");
        let reparsed = parse_document(&written).unwrap();
        assert_eq!(shape(&blocks), shape(&reparsed));
    }

    /// Everything but line numbers.
    fn shape(blocks: &[RequestBlock]) -> Vec<String> {
        blocks
            .iter()
            .map(|b| {
                let vars: Vec<String> =
                    b.variables.iter().map(|v| format!("{}={}", v.name, v.value)).collect();
                format!(
                    "{vars:?} {:?} {} {} {:?} {:?} {:?} {:?}",
                    b.name, b.method, b.url, b.version, b.headers, b.body, b.postscript
                )
            })
            .collect()
    }

    #[test]
    fn test_serialized_block_snapshot() {
        let text = "POST https://x/items\nContent-Type: application/json\n\n{\"a\":1}\n";
        let blocks = parse_document(text).unwrap();
        insta::assert_snapshot!(blocks[0].to_http().trim_end(), @r#"
        POST https://x/items HTTP/1.1
        Content-Type: application/json

        {"a":1}
        "#);
    }
}
