use crate::env::interpolator::{parse_env_tokens, substitute};
use crate::env::store::EnvAccess;
use crate::state::request_state::{BodyKind, Header, HttpMethod, HttpVersion, RequestTemplate};

/// A template with every placeholder replaced, ready for the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRequest {
    pub method: HttpMethod,
    pub url: String,
    pub version: HttpVersion,
    pub headers: Vec<Header>,
    pub body: Option<String>,
    pub body_kind: BodyKind,
}

/// Replace `$env.NAME$` with the environment's current value. Unset names
/// become empty strings, and a header left with an empty value is dropped.
pub fn bind(template: &RequestTemplate, env: &dyn EnvAccess) -> ResolvedRequest {
    let expand = |text: &str| {
        let spans = parse_env_tokens(text);
        substitute(text, &spans, |name| Some(env.get(name).unwrap_or_default()))
    };

    let headers = template
        .headers
        .iter()
        .map(|h| Header::new(expand(&h.name), expand(&h.value)))
        .filter(|h| !h.value.trim().is_empty())
        .collect();

    ResolvedRequest {
        method: template.method,
        url: expand(&template.url),
        version: template.version,
        headers,
        body: template.body.as_deref().map(expand),
        body_kind: template.body_kind.clone(),
    }
}
