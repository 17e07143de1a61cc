//! HTTP transport backed by a blocking `ureq` agent.
//!
//! Requests carry the session token obtained from [`HttpTransport::login`]
//! in the `x-redlock-auth` header. Non-200 responses are classified from the
//! `X-Redlock-Status` header (see [`crate::error::classify`]).

use crate::error::{Error, REDLOCK_STATUS_HEADER, Result, classify};
use crate::transport::Transport;
use crate::types::{Credentials, Method, Query, render_path, render_uri};
use serde_json::{Map, Value};
use std::time::Duration;

/// Default Prisma Cloud API endpoint.
pub const DEFAULT_API_URL: &str = "https://api.prismacloud.io";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const AUTH_HEADER: &str = "x-redlock-auth";

/// Transport that talks to a Prisma Cloud tenant.
///
/// # Example
///
/// ```no_run
/// use prismakit::transport::http::HttpTransport;
/// use prismakit::transport::Transport;
/// use prismakit::Credentials;
///
/// let mut transport = HttpTransport::new("https://api.prismacloud.io");
/// transport.login(&Credentials::new("access-key", "secret-key")).unwrap();
/// let groups = transport.get(&["cloud".to_string(), "group".to_string()]).unwrap();
/// println!("{groups}");
/// ```
pub struct HttpTransport {
    agent: ureq::Agent,
    base_url: String,
    token: Option<String>,
}

impl HttpTransport {
    /// Create a transport with the default timeout.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    /// Create a transport with a custom timeout.
    #[must_use]
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(timeout))
            .build()
            .into();
        Self {
            agent,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        }
    }

    /// Get the API base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Log in and keep the returned session token for later requests.
    pub fn login(&mut self, credentials: &Credentials) -> Result<()> {
        log::debug!(
            "(prismacloud) login as {} at {}",
            credentials.username,
            self.base_url
        );
        let body = serde_json::to_value(credentials)?;
        let answer = self
            .request(Method::Post, &["login".to_string()], None, Some(&body))
            .map_err(login_rejected)?;
        self.token = Some(session_token(&answer)?);
        Ok(())
    }

    /// Build the full URL for a path.
    fn url(&self, path: &[String]) -> String {
        format!("{}{}", self.base_url, render_path(path))
    }

    /// Add the JSON and auth headers plus query parameters.
    fn decorate<B>(
        &self,
        mut request: ureq::RequestBuilder<B>,
        query: Option<&Query>,
    ) -> ureq::RequestBuilder<B> {
        request = request
            .header("Content-Type", "application/json")
            .header("Accept", "application/json");
        if let Some(token) = &self.token {
            request = request.header(AUTH_HEADER, token.as_str());
        }
        if let Some(query) = query {
            for (key, value) in query {
                request = request.query(key.as_str(), value.as_str());
            }
        }
        request
    }

    /// Read status, `X-Redlock-Status` and body off a ureq response.
    fn read_response(
        uri: &str,
        response: std::result::Result<ureq::http::Response<ureq::Body>, ureq::Error>,
    ) -> Result<Value> {
        let mut response = response?;
        let status = response.status().as_u16();
        let redlock_status = response
            .headers()
            .get(REDLOCK_STATUS_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string);
        let body = response.body_mut().read_to_string()?;
        decode_response(status, redlock_status.as_deref(), &body, uri)
    }
}

/// Decode a response body. Only a 200 is a success; anything else is
/// classified. An empty body decodes to `{}`.
fn decode_response(
    status: u16,
    redlock_status: Option<&str>,
    body: &str,
    uri: &str,
) -> Result<Value> {
    if status != 200 {
        return Err(classify(status, redlock_status, body, uri));
    }

    if body.trim().is_empty() {
        return Ok(Value::Object(Map::new()));
    }

    serde_json::from_str(body)
        .map_err(|e| Error::MalformedResponse(format!("response wasn't JSON ({e}): {body}")))
}

/// Session token from a login answer
fn session_token(answer: &Value) -> Result<String> {
    answer
        .get("token")
        .and_then(Value::as_str)
        .filter(|token| !token.is_empty())
        .map(ToString::to_string)
        .ok_or_else(|| {
            Error::AuthenticationFailure("invalid authentication credentials".to_string())
        })
}

/// A generic API error on `/login` means the credentials were refused
fn login_rejected(err: Error) -> Error {
    match err {
        Error::Api { status, .. } => {
            Error::AuthenticationFailure(format!("login rejected (HTTP {status})"))
        }
        other => other,
    }
}

impl Transport for HttpTransport {
    fn request(
        &self,
        method: Method,
        path: &[String],
        query: Option<&Query>,
        body: Option<&Value>,
    ) -> Result<Value> {
        let uri = render_uri(path, query);
        log::debug!("(prismacloud): {} {}{}", method, self.base_url, uri);

        let url = self.url(path);
        let response = match method {
            Method::Get => self.decorate(self.agent.get(&url), query).call(),
            Method::Delete => self.decorate(self.agent.delete(&url), query).call(),
            Method::Post => {
                let request = self.decorate(self.agent.post(&url), query);
                match body {
                    Some(body) => request.send_json(body),
                    None => request.send_empty(),
                }
            }
            Method::Put => {
                let request = self.decorate(self.agent.put(&url), query);
                match body {
                    Some(body) => request.send_json(body),
                    None => request.send_empty(),
                }
            }
        };

        let result = Self::read_response(&uri, response);
        if let Err(e) = &result {
            log::debug!("(prismacloud) error: {method} {uri}: {e}");
        }
        result
    }
}
