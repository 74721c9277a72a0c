//! Registry call helper
//!
//! Every registry exchange is reduced to a [`RegistryReply`] so callers can
//! match on the outcome kind instead of inspecting raw status codes.

use reqwest::header::HeaderMap;
use reqwest::{Method, StatusCode};
use thiserror::Error;
use tracing::debug;

use crate::connection::RequestTarget;

/// Classified registry response
#[derive(Debug, Clone, PartialEq)]
pub enum RegistryReply {
    /// 2xx, body parsed as JSON (`Null` when empty)
    Ok(serde_json::Value),
    /// 404
    NotFound,
    /// 422, the registry could not process the submitted schema
    Unprocessable(String),
    /// Any other status
    Rejected { status: StatusCode, body: String },
}

impl RegistryReply {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Ok(_) => None,
            Self::NotFound => Some(StatusCode::NOT_FOUND),
            Self::Unprocessable(_) => Some(StatusCode::UNPROCESSABLE_ENTITY),
            Self::Rejected { status, .. } => Some(*status),
        }
    }
}

/// Failures that prevented a registry reply from being classified
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("failed to send {method} {url} request: {source}")]
    Send {
        method: Method,
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to read response body from {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to parse JSON response from {url}: {source}")]
    Json {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Send one request to the registry and classify the reply.
pub async fn exchange(
    target: &RequestTarget,
    method: Method,
    headers: HeaderMap,
    body: Option<&serde_json::Value>,
) -> Result<RegistryReply, TransportError> {
    let mut request = target
        .client
        .request(method.clone(), &target.url)
        .headers(headers);
    if let Some(body) = body {
        request = request.json(body);
    }

    let response = request.send().await.map_err(|source| TransportError::Send {
        method: method.clone(),
        url: target.url.clone(),
        source,
    })?;

    let status = response.status();
    let text = response.text().await.map_err(|source| TransportError::Body {
        url: target.url.clone(),
        source,
    })?;

    debug!(%method, url = %target.url, status = status.as_u16(), "Registry replied");

    let reply = match status {
        s if s.is_success() => {
            if text.trim().is_empty() {
                RegistryReply::Ok(serde_json::Value::Null)
            } else {
                let value = serde_json::from_str(&text).map_err(|source| TransportError::Json {
                    url: target.url.clone(),
                    source,
                })?;
                RegistryReply::Ok(value)
            }
        }
        StatusCode::NOT_FOUND => RegistryReply::NotFound,
        StatusCode::UNPROCESSABLE_ENTITY => RegistryReply::Unprocessable(text),
        status => RegistryReply::Rejected { status, body: text },
    };

    Ok(reply)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn target(server: &MockServer, endpoint: &str) -> RequestTarget {
        RequestTarget::new(format!("{}/{}", server.uri(), endpoint), reqwest::Client::new())
    }

    #[tokio::test]
    async fn test_success_parses_json() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/subjects/topic-value/versions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([1, 2])))
            .expect(1)
            .mount(&server)
            .await;

        let reply = exchange(
            &target(&server, "subjects/topic-value/versions"),
            Method::GET,
            HeaderMap::new(),
            None,
        )
        .await
        .unwrap();

        assert_eq!(reply, RegistryReply::Ok(serde_json::json!([1, 2])));
        assert_eq!(reply.status(), None);
    }

    #[tokio::test]
    async fn test_empty_success_body_is_null() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let reply = exchange(
            &target(&server, "subjects/topic-value"),
            Method::DELETE,
            HeaderMap::new(),
            None,
        )
        .await
        .unwrap();

        assert_eq!(reply, RegistryReply::Ok(serde_json::Value::Null));
    }

    #[tokio::test]
    async fn test_status_classification() {
        let server = MockServer::start().await;
        Mock::given(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(path("/invalid"))
            .respond_with(ResponseTemplate::new(422).set_body_string("bad schema"))
            .mount(&server)
            .await;
        Mock::given(path("/broken"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let missing = exchange(&target(&server, "missing"), Method::GET, HeaderMap::new(), None)
            .await
            .unwrap();
        assert_eq!(missing, RegistryReply::NotFound);

        let invalid = exchange(&target(&server, "invalid"), Method::POST, HeaderMap::new(), None)
            .await
            .unwrap();
        assert_eq!(invalid, RegistryReply::Unprocessable("bad schema".to_string()));

        let broken = exchange(&target(&server, "broken"), Method::GET, HeaderMap::new(), None)
            .await
            .unwrap();
        assert_eq!(
            broken,
            RegistryReply::Rejected {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                body: "boom".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_sends_body_and_headers() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("authorization", "Basic abc"))
            .and(body_json(serde_json::json!({"schema": "schema: {}"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": 1})))
            .expect(1)
            .mount(&server)
            .await;

        let mut headers = HeaderMap::new();
        headers.insert("authorization", "Basic abc".parse().unwrap());
        let body = serde_json::json!({"schema": "schema: {}"});

        let reply = exchange(&target(&server, "subjects/x/versions"), Method::POST, headers, Some(&body))
            .await
            .unwrap();
        assert_eq!(reply, RegistryReply::Ok(serde_json::json!({"id": 1})));
    }

    #[tokio::test]
    async fn test_malformed_json_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = exchange(&target(&server, "config"), Method::GET, HeaderMap::new(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Json { .. }));
    }

    #[tokio::test]
    async fn test_unreachable_registry_is_send_error() {
        let target = RequestTarget::new("http://127.0.0.1:1/config", reqwest::Client::new());
        let err = exchange(&target, Method::GET, HeaderMap::new(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Send { .. }));
    }
}
