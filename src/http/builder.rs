use reqwest::header::{CONTENT_TYPE, HeaderName, HeaderValue};
use reqwest::multipart::Form;
use reqwest::{Client, Method, RequestBuilder, Version};

use crate::env::binder::ResolvedRequest;
use crate::env::resolver::{multipart_fields, validate_body};
use crate::error::DispatchError;
use crate::state::request_state::{BodyKind, HttpMethod, HttpVersion};

pub fn build_request(client: &Client, request: &ResolvedRequest) -> Result<RequestBuilder, DispatchError> {
    let method = match request.method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Post => Method::POST,
        HttpMethod::Head => Method::HEAD,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
        HttpMethod::Options => Method::OPTIONS,
    };
    let url = url::Url::parse(&request.url).map_err(|source| DispatchError::InvalidUrl {
        url: request.url.clone(),
        source,
    })?;
    let version = match request.version {
        HttpVersion::Http10 => Version::HTTP_10,
        HttpVersion::Http11 => Version::HTTP_11,
    };

    let mut builder = client.request(method, url).version(version);

    let multipart = request.body.is_some() && request.body_kind == BodyKind::Multipart;
    let mut has_content_type = false;
    for header in &request.headers {
        let name = HeaderName::from_bytes(header.name.as_bytes())
            .map_err(|_| DispatchError::InvalidHeader(header.name.clone()))?;
        let value = HeaderValue::from_str(&header.value)
            .map_err(|_| DispatchError::InvalidHeader(format!("{}: {}", header.name, header.value)))?;
        if name == CONTENT_TYPE {
            has_content_type = true;
            // reqwest writes its own multipart header with the boundary.
            if multipart {
                continue;
            }
        }
        builder = builder.header(name, value);
    }

    let Some(body) = &request.body else {
        return Ok(builder);
    };
    validate_body(&request.body_kind, body).map_err(DispatchError::InvalidBody)?;

    builder = match &request.body_kind {
        BodyKind::Multipart => {
            let fields = multipart_fields(body).map_err(DispatchError::InvalidBody)?;
            let form = fields
                .into_iter()
                .fold(Form::new(), |form, (name, value)| form.text(name, value));
            builder.multipart(form)
        }
        BodyKind::Text if !has_content_type => builder
            .header(CONTENT_TYPE, "text/plain")
            .body(body.clone()),
        _ => builder.body(body.clone()),
    };

    Ok(builder)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::request_state::Header;

    fn request(kind: BodyKind, headers: Vec<Header>, body: Option<&str>) -> ResolvedRequest {
        ResolvedRequest {
            method: HttpMethod::Post,
            url: "https://api.test/items".into(),
            version: HttpVersion::Http11,
            headers,
            body: body.map(str::to_string),
            body_kind: kind,
        }
    }

    #[test]
    fn test_text_body_defaults_content_type() {
        let client = Client::new();
        let built = build_request(&client, &request(BodyKind::Text, vec![], Some("hello")))
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(built.headers()[CONTENT_TYPE], "text/plain");
        assert_eq!(built.version(), Version::HTTP_11);
    }

    #[test]
    fn test_multipart_replaces_declared_content_type() {
        let client = Client::new();
        let headers = vec![Header::new("Content-Type", "multipart/form-data")];
        let built = build_request(&client, &request(BodyKind::Multipart, headers, Some("a=1\nb=2")))
            .unwrap()
            .build()
            .unwrap();
        let content_type = built.headers()[CONTENT_TYPE].to_str().unwrap();
        assert!(content_type.starts_with("multipart/form-data; boundary="));
        assert_eq!(built.headers().get_all(CONTENT_TYPE).iter().count(), 1);
    }

    #[test]
    fn test_invalid_url_is_reported() {
        let client = Client::new();
        let mut req = request(BodyKind::Text, vec![], None);
        req.url = "not a url".into();
        assert!(matches!(
            build_request(&client, &req),
            Err(DispatchError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn test_invalid_header_name_is_reported() {
        let client = Client::new();
        let req = request(BodyKind::Text, vec![Header::new("Bad Header", "x")], None);
        assert!(matches!(
            build_request(&client, &req),
            Err(DispatchError::InvalidHeader(_))
        ));
    }

    #[test]
    fn test_deferred_json_validation() {
        let client = Client::new();
        let headers = vec![Header::new("Content-Type", "application/json")];
        let req = request(BodyKind::Json, headers, Some("{\"n\": }"));
        assert!(matches!(
            build_request(&client, &req),
            Err(DispatchError::InvalidBody(_))
        ));
    }
}
