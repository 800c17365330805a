use std::time::Instant;

use chrono::Local;
use reqwest::Client;

use super::builder::build_request;
use crate::env::binder::ResolvedRequest;
use crate::error::DispatchError;
use crate::state::response_state::ResponseRecord;

/// Send a fully resolved request. Any failure, including one that happens
/// while reading the body, comes back as a [`DispatchError`].
pub async fn execute(client: &Client, request: &ResolvedRequest) -> Result<ResponseRecord, DispatchError> {
    let start = Instant::now();

    let builder = build_request(client, request)?;
    let response = builder.send().await?;

    let status = response.status();
    let headers: Vec<(String, String)> = response
        .headers()
        .iter()
        .map(|(k, v)| (k.to_string(), String::from_utf8_lossy(v.as_bytes()).into_owned()))
        .collect();

    let bytes = response.bytes().await?;
    let elapsed = start.elapsed();

    tracing::info!(
        method = %request.method,
        url = %request.url,
        status = status.as_u16(),
        elapsed_ms = elapsed.as_millis() as u64,
        "Request completed"
    );

    Ok(ResponseRecord {
        status: Some(status.as_u16()),
        status_text: status.canonical_reason().unwrap_or("Unknown").to_string(),
        headers,
        body: String::from_utf8_lossy(&bytes).into_owned(),
        size_bytes: bytes.len(),
        elapsed,
        received_at: Local::now(),
        error: None,
    })
}

/// Like [`execute`], but a transport failure becomes a record carrying the
/// error description instead of a status.
pub async fn dispatch(client: &Client, request: &ResolvedRequest) -> ResponseRecord {
    let start = Instant::now();
    match execute(client, request).await {
        Ok(record) => record,
        Err(err) => {
            tracing::warn!(method = %request.method, url = %request.url, error = %err, "Request failed");
            ResponseRecord::from_error(&err, start.elapsed())
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use wiremock::matchers::{body_string, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::http::client::build_client;
    use crate::state::request_state::{BodyKind, Header, HttpMethod, HttpVersion};

    fn json_post(url: String) -> ResolvedRequest {
        ResolvedRequest {
            method: HttpMethod::Post,
            url,
            version: HttpVersion::Http11,
            headers: vec![Header::new("Content-Type", "application/json")],
            body: Some("{\"a\":1}".into()),
            body_kind: BodyKind::Json,
        }
    }

    #[tokio::test]
    async fn test_json_body_sent_unchanged() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/items"))
            .and(header("content-type", "application/json"))
            .and(body_string("{\"a\":1}"))
            .respond_with(
                ResponseTemplate::new(201)
                    .insert_header("x-request-id", "r-1")
                    .set_body_string("{\"id\":7}"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = build_client(Duration::from_secs(5)).unwrap();
        let record = execute(&client, &json_post(format!("{}/items", server.uri())))
            .await
            .unwrap();

        assert_eq!(record.status, Some(201));
        assert_eq!(record.status_text, "Created");
        assert_eq!(record.header("x-request-id"), Some("r-1"));
        assert_eq!(record.body, "{\"id\":7}");
        assert_eq!(record.size_bytes, 8);
    }

    #[tokio::test]
    async fn test_form_body() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(header("content-type", "application/x-www-form-urlencoded"))
            .and(body_string("a=1&b=2"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let client = build_client(Duration::from_secs(5)).unwrap();
        let request = ResolvedRequest {
            method: HttpMethod::Put,
            url: server.uri(),
            version: HttpVersion::Http11,
            headers: vec![Header::new("Content-Type", "application/x-www-form-urlencoded")],
            body: Some("a=1&b=2".into()),
            body_kind: BodyKind::Form,
        };
        let record = execute(&client, &request).await.unwrap();
        assert_eq!(record.status, Some(204));
        assert!(record.body.is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_host_yields_error_record() {
        let client = build_client(Duration::from_secs(5)).unwrap();
        let record = dispatch(&client, &json_post("http://127.0.0.1:1/items".into())).await;
        assert_eq!(record.status, None);
        assert!(record.error.as_deref().is_some_and(|e| !e.is_empty()));
    }

    #[tokio::test]
    async fn test_timeout_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .mount(&server)
            .await;

        let client = build_client(Duration::from_millis(200)).unwrap();
        let request = ResolvedRequest {
            method: HttpMethod::Get,
            url: server.uri(),
            version: HttpVersion::Http11,
            headers: vec![],
            body: None,
            body_kind: BodyKind::Text,
        };
        let err = execute(&client, &request).await.unwrap_err();
        assert!(matches!(err, DispatchError::Timeout));
    }
}
