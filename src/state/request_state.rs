use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HttpMethod {
    #[default]
    Get,
    Put,
    Post,
    Head,
    Patch,
    Delete,
    Options,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Put => "PUT",
            HttpMethod::Post => "POST",
            HttpMethod::Head => "HEAD",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Options => "OPTIONS",
        }
    }

    /// Case-insensitive lookup of a request-line method token.
    pub fn parse(token: &str) -> Option<HttpMethod> {
        let method = match token.to_ascii_uppercase().as_str() {
            "GET" => HttpMethod::Get,
            "PUT" => HttpMethod::Put,
            "POST" => HttpMethod::Post,
            "HEAD" => HttpMethod::Head,
            "PATCH" => HttpMethod::Patch,
            "DELETE" => HttpMethod::Delete,
            "OPTIONS" => HttpMethod::Options,
            _ => return None,
        };
        Some(method)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HttpVersion {
    Http10,
    #[default]
    Http11,
}

impl HttpVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpVersion::Http10 => "HTTP/1.0",
            HttpVersion::Http11 => "HTTP/1.1",
        }
    }

    pub fn parse(token: &str) -> Option<HttpVersion> {
        let bare = token
            .strip_prefix("HTTP/")
            .or_else(|| token.strip_prefix("http/"))
            .unwrap_or(token);
        match bare {
            "1.0" => Some(HttpVersion::Http10),
            "1.1" => Some(HttpVersion::Http11),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub name: String,
    pub value: String,
}

impl Header {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// How a body is encoded on the wire, inferred from the `Content-Type` header.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum BodyKind {
    #[default]
    Text,
    Json,
    Form,
    Multipart,
    /// Any other content type; sent verbatim with the declared header.
    Other(String),
}

impl BodyKind {
    pub fn from_headers(headers: &[Header]) -> BodyKind {
        let Some(value) = find_header(headers, "content-type") else {
            return BodyKind::Text;
        };
        let Ok(parsed) = value.trim().parse::<mime::Mime>() else {
            return BodyKind::Other(value.trim().to_string());
        };
        match parsed.essence_str() {
            "text/plain" => BodyKind::Text,
            "application/json" => BodyKind::Json,
            "application/x-www-form-urlencoded" => BodyKind::Form,
            "multipart/form-data" => BodyKind::Multipart,
            other => BodyKind::Other(other.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            BodyKind::Text => "text/plain",
            BodyKind::Json => "application/json",
            BodyKind::Form => "application/x-www-form-urlencoded",
            BodyKind::Multipart => "multipart/form-data",
            BodyKind::Other(mime) => mime,
        }
    }
}

/// Case-insensitive header lookup, first match wins.
pub fn find_header<'a>(headers: &'a [Header], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|h| h.name.eq_ignore_ascii_case(name))
        .map(|h| h.value.as_str())
}

/// A request whose `{{name}}` variables are substituted but whose
/// `$env.NAME$` placeholders are still literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTemplate {
    pub name: Option<String>,
    pub method: HttpMethod,
    pub url: String,
    pub version: HttpVersion,
    pub headers: Vec<Header>,
    pub body: Option<String>,
    pub body_kind: BodyKind,
    pub postscript: Option<PathBuf>,
}

impl RequestTemplate {
    /// What the request list shows for this template.
    pub fn label(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => format!("{} {}", self.method, self.url),
        }
    }

    /// Request line, headers, blank line, body.
    pub fn to_http(&self) -> String {
        let mut out = format!("{} {} {}\n", self.method, self.url, self.version.as_str());
        for header in &self.headers {
            out.push_str(&format!("{}: {}\n", header.name, header.value));
        }
        if let Some(body) = &self.body {
            out.push('\n');
            out.push_str(body);
            out.push('\n');
        }
        out
    }
}
