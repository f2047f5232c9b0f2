//! `Jet9Client`: one POST per action call.

use std::time::Duration;

use jet9_core::{decode_response, encode_request, RequestEnvelope, ResponseEnvelope};
use jet9_settings::ClientSettings;
use reqwest::header::CONTENT_TYPE;
use serde_json::{Map, Value};
use tracing::{debug, instrument};

use crate::errors::ClientError;

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Client bound to one server.
#[derive(Clone, Debug)]
pub struct Jet9Client {
    host: String,
    authtoken: Option<String>,
    tls: bool,
    http: reqwest::Client,
}

impl Jet9Client {
    /// Client for `host` (`http://…` or `https://…`) sending `authtoken`.
    pub fn new(host: &str, authtoken: impl Into<String>) -> Result<Self, ClientError> {
        Self::build(host, Some(authtoken.into()), DEFAULT_TIMEOUT)
    }

    /// Client configured from settings.
    pub fn from_settings(settings: &ClientSettings) -> Result<Self, ClientError> {
        Self::build(
            &settings.host,
            settings.authtoken.clone(),
            Duration::from_secs(settings.timeout_secs),
        )
    }

    /// Replace the request timeout.
    pub fn with_timeout(self, timeout: Duration) -> Result<Self, ClientError> {
        Self::build(&self.host, self.authtoken, timeout)
    }

    fn build(host: &str, authtoken: Option<String>, timeout: Duration) -> Result<Self, ClientError> {
        let tls = if host.starts_with("https://") {
            true
        } else if host.starts_with("http://") {
            false
        } else {
            return Err(ClientError::InvalidHost {
                host: host.to_owned(),
            });
        };
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            host: host.trim_end_matches('/').to_owned(),
            authtoken,
            tls,
            http,
        })
    }

    /// Base URL without a trailing slash.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Whether the host uses `https://`.
    pub fn is_tls(&self) -> bool {
        self.tls
    }

    /// Invoke `action` on `subsystem` with `params`.
    ///
    /// A reply that decodes as an envelope is returned as-is, whatever its
    /// HTTP status or protocol code; check [`ResponseEnvelope::is_error`].
    #[instrument(skip(self, params), fields(host = %self.host))]
    pub async fn request(
        &self,
        subsystem: &str,
        action: &str,
        params: Map<String, Value>,
    ) -> Result<ResponseEnvelope, ClientError> {
        let mut envelope = RequestEnvelope::new(action, params);
        if let Some(token) = &self.authtoken {
            envelope = envelope.with_authtoken(token.as_str());
        }

        let url = format!("{}/{subsystem}", self.host);
        let resp = self
            .http
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .body(encode_request(&envelope))
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;
        debug!(status = status.as_u16(), bytes = text.len(), "response received");

        match decode_response(&text) {
            Ok(response) => Ok(response),
            Err(source) if !status.is_success() => Err(ClientError::UnexpectedStatus {
                status: status.as_u16(),
                source,
            }),
            Err(err) => Err(ClientError::Envelope(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use jet9_core::EnvelopeError;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn envelope(code: u16, result: Value, error: Value) -> Value {
        json!({
            "version": "1.0",
            "uuid": "0191b2c4-0000-7000-8000-000000000000",
            "timestamp": "2024-09-01T10:00:00.000Z",
            "code": code,
            "result": result,
            "error": error
        })
    }

    fn params() -> Map<String, Value> {
        let mut params = Map::new();
        let _ = params.insert("domain".into(), json!("orfiq.com"));
        let _ = params.insert("limit".into(), json!(20));
        params
    }

    #[test]
    fn host_scheme_is_checked() {
        assert_eq!(
            Jet9Client::new("http://127.0.0.1:8888", "t").unwrap().host(),
            "http://127.0.0.1:8888"
        );
        assert!(Jet9Client::new("https://api.example.com/", "t").unwrap().is_tls());
        assert!(!Jet9Client::new("http://api.example.com", "t").unwrap().is_tls());
        assert_matches!(
            Jet9Client::new("api.example.com", "t"),
            Err(ClientError::InvalidHost { .. })
        );
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let client = Jet9Client::new("https://api.example.com/", "t").unwrap();
        assert_eq!(client.host(), "https://api.example.com");
    }

    #[test]
    fn from_settings_without_token() {
        let client = Jet9Client::from_settings(&ClientSettings::default()).unwrap();
        assert_eq!(client.host(), "http://127.0.0.1:8888");
        assert!(!client.is_tls());
    }

    #[tokio::test]
    async fn request_sends_full_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/dns"))
            .and(header("content-type", "application/json"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(envelope(210, json!({"ok": true}), Value::Null)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = Jet9Client::new(&server.uri(), "AUTHTOKEN").unwrap();
        let resp = client.request("dns", "list", params()).await.unwrap();
        assert_eq!(resp.code, 210);
        assert!(!resp.is_error());
        assert_eq!(resp.result.as_ref().unwrap()["ok"], true);

        let received = server.received_requests().await.unwrap();
        let body: Value = serde_json::from_slice(&received[0].body).unwrap();
        assert_eq!(body["action"], "list");
        assert_eq!(body["authtoken"], "AUTHTOKEN");
        assert_eq!(body["params"]["domain"], "orfiq.com");
        assert!(body["uuid"].is_string());
        assert!(body["timestamp"].is_string());
    }

    #[tokio::test]
    async fn error_envelope_is_returned() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/dns"))
            .respond_with(ResponseTemplate::new(200).set_body_json(envelope(
                400,
                Value::Null,
                json!({"message": "ERROR: some error here"}),
            )))
            .mount(&server)
            .await;

        let client = Jet9Client::new(&server.uri(), "AUTHTOKEN").unwrap();
        let resp = client.request("dns", "error_list", params()).await.unwrap();
        assert!(resp.is_error());
        assert_eq!(resp.error_message(), Some("ERROR: some error here"));
        // Display prints the raw reply.
        assert!(resp.to_string().contains("ERROR: some error here"));
    }

    #[tokio::test]
    async fn malformed_success_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let client = Jet9Client::new(&server.uri(), "t").unwrap();
        let err = client.request("dns", "list", Map::new()).await.unwrap_err();
        assert_matches!(err, ClientError::Envelope(EnvelopeError::MalformedPayload { .. }));
        assert!(!err.is_transport());
    }

    #[tokio::test]
    async fn missing_key_in_reply() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"code": 200})))
            .mount(&server)
            .await;

        let client = Jet9Client::new(&server.uri(), "t").unwrap();
        let err = client.request("dns", "list", Map::new()).await.unwrap_err();
        assert_matches!(
            err,
            ClientError::Envelope(EnvelopeError::MissingField { key: "version" })
        );
    }

    #[tokio::test]
    async fn non_2xx_without_envelope_is_transport() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
            .mount(&server)
            .await;

        let client = Jet9Client::new(&server.uri(), "t").unwrap();
        let err = client.request("dns", "list", Map::new()).await.unwrap_err();
        assert_matches!(err, ClientError::UnexpectedStatus { status: 500, .. });
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn non_2xx_with_envelope_is_decoded() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_json(envelope(
                500,
                Value::Null,
                json!({"message": "upstream"}),
            )))
            .mount(&server)
            .await;

        let client = Jet9Client::new(&server.uri(), "t").unwrap();
        let resp = client.request("dns", "list", Map::new()).await.unwrap();
        assert_eq!(resp.code, 500);
        assert!(resp.is_error());
    }

    #[tokio::test]
    async fn connection_refused_is_transport() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let client = Jet9Client::new(&format!("http://127.0.0.1:{port}"), "t").unwrap();
        let err = client.request("dns", "list", Map::new()).await.unwrap_err();
        assert_matches!(err, ClientError::Transport(_));
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn slow_server_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(envelope(200, json!({}), Value::Null))
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let client = Jet9Client::new(&server.uri(), "t")
            .unwrap()
            .with_timeout(Duration::from_millis(100))
            .unwrap();
        let err = client.request("dns", "list", Map::new()).await.unwrap_err();
        assert!(err.is_timeout());
        assert!(err.is_transport());
    }
}
