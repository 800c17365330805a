use std::time::Duration;

use chrono::{DateTime, Local};

use crate::error::{DispatchError, PostscriptError};

/// Outcome of one send. A transport failure leaves `status` empty and fills
/// `error` instead.
#[derive(Debug, Clone)]
pub struct ResponseRecord {
    pub status: Option<u16>,
    pub status_text: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
    pub size_bytes: usize,
    pub elapsed: Duration,
    pub received_at: DateTime<Local>,
    pub error: Option<String>,
}

impl ResponseRecord {
    pub fn from_error(err: &DispatchError, elapsed: Duration) -> Self {
        Self {
            status: None,
            status_text: String::new(),
            headers: Vec::new(),
            body: String::new(),
            size_bytes: 0,
            elapsed,
            received_at: Local::now(),
            error: Some(err.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Body re-indented for display when it is JSON, verbatim otherwise.
    pub fn display_body(&self) -> String {
        let is_json = self
            .header("content-type")
            .is_some_and(|ct| ct.contains("json"));
        if is_json {
            if let Ok(value) = serde_json::from_str::<serde_json::Value>(&self.body) {
                if let Ok(pretty) = serde_json::to_string_pretty(&value) {
                    return pretty;
                }
            }
        }
        self.body.clone()
    }
}

/// What a postscript run left behind: its informational output and, if it
/// went wrong, the warning to show next to the response.
#[derive(Debug, Default)]
pub struct PostscriptReport {
    pub output: Vec<String>,
    pub updated: Vec<String>,
    pub error: Option<PostscriptError>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(content_type: &str, body: &str) -> ResponseRecord {
        ResponseRecord {
            status: Some(200),
            status_text: "OK".into(),
            headers: vec![("Content-Type".into(), content_type.into())],
            body: body.into(),
            size_bytes: body.len(),
            elapsed: Duration::from_millis(5),
            received_at: Local::now(),
            error: None,
        }
    }

    #[test]
    fn test_display_body_pretty_prints_json() {
        let rec = record("application/json", "{\"a\":1}");
        assert_eq!(rec.display_body(), "{\n  \"a\": 1\n}");
    }

    #[test]
    fn test_display_body_leaves_text_alone() {
        let rec = record("text/plain", "{\"a\":1}");
        assert_eq!(rec.display_body(), "{\"a\":1}");
    }

    #[test]
    fn test_from_error_has_no_status() {
        let rec = ResponseRecord::from_error(&DispatchError::Timeout, Duration::from_secs(1));
        assert_eq!(rec.status, None);
        assert!(!rec.is_success());
        assert_eq!(rec.error.as_deref(), Some("request timed out"));
    }
}
