//! Core request types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Query parameters, kept in a stable order for logging and mock routing.
pub type Query = BTreeMap<String, String>;

/// HTTP methods used by the Prisma Cloud API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    /// Read a listing or a single object.
    Get,
    /// Create an object.
    Post,
    /// Replace an object.
    Put,
    /// Remove an object.
    Delete,
}

impl Method {
    /// Whether this method changes remote state.
    #[must_use]
    pub fn is_mutation(&self) -> bool {
        !matches!(self, Self::Get)
    }

    /// The verb as sent on the wire.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Login credentials.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    /// Access key or user name.
    pub username: String,
    /// Secret key or password.
    pub password: String,
    /// Tenant name, only needed for multi-tenant logins.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
}

impl Credentials {
    /// Create credentials without a customer name.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            customer_name: None,
        }
    }

    /// Set the customer name.
    #[must_use]
    pub fn customer_name(mut self, name: impl Into<String>) -> Self {
        self.customer_name = Some(name.into());
        self
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("customer_name", &self.customer_name)
            .finish()
    }
}

/// Render path segments as a URL path (`["cloud", "aws"]` becomes `/cloud/aws`).
#[must_use]
pub fn render_path<S: AsRef<str>>(path: &[S]) -> String {
    let mut out = String::new();
    for segment in path {
        out.push('/');
        out.push_str(segment.as_ref());
    }
    if out.is_empty() {
        out.push('/');
    }
    out
}

/// Render a path plus query string, for diagnostics.
#[must_use]
pub fn render_uri<S: AsRef<str>>(path: &[S], query: Option<&Query>) -> String {
    let prefix = render_path(path);
    match query {
        Some(q) if !q.is_empty() => {
            let suffix = q
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join("&");
            format!("{prefix}?{suffix}")
        }
        _ => prefix,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_path() {
        assert_eq!(render_path(&["cloud", "aws", "123"]), "/cloud/aws/123");
        assert_eq!(render_path::<&str>(&[]), "/");
    }

    #[test]
    fn test_render_uri_with_query() {
        let mut query = Query::new();
        query.insert("cloudType".to_string(), "aws".to_string());
        assert_eq!(
            render_uri(&["cloud", "name"], Some(&query)),
            "/cloud/name?cloudType=aws"
        );
        assert_eq!(render_uri(&["policy"], None), "/policy");
    }

    #[test]
    fn test_method_mutation() {
        assert!(!Method::Get.is_mutation());
        assert!(Method::Post.is_mutation());
        assert!(Method::Put.is_mutation());
        assert!(Method::Delete.is_mutation());
        assert_eq!(Method::Delete.to_string(), "DELETE");
    }

    #[test]
    fn test_credentials_debug_redacts_password() {
        let creds = Credentials::new("alice", "hunter2").customer_name("acme");
        let debug = format!("{creds:?}");
        assert!(debug.contains("alice"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_credentials_login_body() {
        let body = serde_json::to_value(Credentials::new("alice", "pw")).unwrap();
        assert_eq!(body["username"], "alice");
        assert!(body.get("customerName").is_none());

        let body = serde_json::to_value(Credentials::new("alice", "pw").customer_name("acme"))
            .unwrap();
        assert_eq!(body["customerName"], "acme");
    }
}
