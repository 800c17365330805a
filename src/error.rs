use std::path::PathBuf;

/// A malformed block in a `.http` document. Fatal to that document only.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("line {line}: {kind}")]
pub struct ParseError {
    pub line: usize,
    pub kind: ParseErrorKind,
}

impl ParseError {
    pub fn new(line: usize, kind: ParseErrorKind) -> Self {
        Self { line, kind }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseErrorKind {
    #[error("unsupported method '{0}'")]
    UnknownMethod(String),
    #[error("request line has no URL")]
    MissingUrl,
    #[error("unsupported HTTP version '{0}'")]
    UnsupportedVersion(String),
    #[error("unexpected trailing token '{0}' on request line")]
    TrailingToken(String),
    #[error("variable definition must look like '@name=value'")]
    MalformedVariable,
    #[error("invalid variable name '{0}'")]
    InvalidVariableName(String),
    #[error("empty display name")]
    EmptyName,
    #[error("block already has a display name")]
    DuplicateName,
    #[error("invalid header line '{0}'")]
    InvalidHeader(String),
    #[error("header '{0}' has no value")]
    HeaderWithoutValue(String),
    #[error("postscript line has no path")]
    EmptyPostscript,
    #[error("block already has a postscript")]
    DuplicatePostscript,
    #[error("display name or postscript is not followed by a request line")]
    DanglingBlock,
}

/// A request template that could not be resolved. Fatal to that template only.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolutionError {
    #[error("undefined variable '{variable}' in {request}")]
    UndefinedVariable { variable: String, request: String },
    #[error("invalid body in {request}: {reason}")]
    InvalidBody { request: String, reason: String },
}

/// Transport-level failure of one send. Recorded on the response, never fatal.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("invalid header '{0}'")]
    InvalidHeader(String),
    #[error("invalid body: {0}")]
    InvalidBody(String),
    #[error("request timed out")]
    Timeout,
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("{0}")]
    Transport(String),
}

impl From<reqwest::Error> for DispatchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            DispatchError::Timeout
        } else if err.is_connect() {
            DispatchError::Connect(describe_chain(&err))
        } else {
            DispatchError::Transport(describe_chain(&err))
        }
    }
}

/// Join an error with all of its sources, `outer: inner: root`.
fn describe_chain(err: &dyn std::error::Error) -> String {
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !text.contains(&cause_text) {
            text.push_str(": ");
            text.push_str(&cause_text);
        }
        source = cause.source();
    }
    text
}

/// A postscript hook that failed to start, failed while running, or exited non-zero.
#[derive(Debug, thiserror::Error)]
pub enum PostscriptError {
    #[error("postscript {} failed to start: {source}", path.display())]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("postscript {} exited with {}: {stderr}", path.display(), describe_exit(*code))]
    Exit {
        path: PathBuf,
        code: Option<i32>,
        stderr: String,
    },
    #[error("postscript {} failed: {message}", path.display())]
    Script { path: PathBuf, message: String },
}

fn describe_exit(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "a signal".to_string(),
    }
}

/// Anything that prevents the workbench from starting at all.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("cannot read documents at {}: {source}", path.display())]
    Documents {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot read theme file {}: {source}", path.display())]
    ThemeRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed theme file {}: {source}", path.display())]
    ThemeParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid color '{value}' for '{key}'")]
    InvalidColor { key: String, value: String },
    #[error("HTTP client setup failed: {0}")]
    Client(#[from] reqwest::Error),
    #[error("terminal initialization failed: {0}")]
    Terminal(#[from] std::io::Error),
}

/// Why a send request was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SendRejected {
    #[error("{0} is already in flight")]
    InFlight(String),
    #[error("cannot send: {0}")]
    Unsendable(String),
    #[error("sending is disabled in expanded mode")]
    Expanded,
    #[error("no request selected")]
    NoSelection,
}
