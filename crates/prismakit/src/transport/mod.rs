//! Transport trait and implementations.
//!
//! [`Transport`] is the only surface the resource engines see: a method, a
//! path of segments, an optional query and an optional JSON body in, decoded
//! JSON (or a classified [`Error`]) out. [`http::HttpTransport`] talks to a
//! real tenant; [`MockTransport`] serves canned responses for tests.
//!
//! # Testing
//!
//! ```
//! use prismakit::transport::{MockTransport, Transport};
//! use prismakit::Method;
//! use serde_json::json;
//!
//! let mock = MockTransport::new();
//! mock.on(Method::Get, &["cloud", "group"], json!([{"id": "g1", "name": "prod"}]));
//!
//! let listing = mock.get(&["cloud".to_string(), "group".to_string()]).unwrap();
//! assert_eq!(listing[0]["name"], "prod");
//! assert_eq!(mock.mutation_count(), 0);
//! ```

pub mod http;

use crate::error::{Error, Result};
use crate::types::{Method, Query, render_uri};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Request transport for the Prisma Cloud API.
///
/// Implementations own authentication, connection reuse and timeouts;
/// callers only see decoded JSON or a classified error.
pub trait Transport: Send + Sync {
    /// Issue a single request.
    fn request(
        &self,
        method: Method,
        path: &[String],
        query: Option<&Query>,
        body: Option<&Value>,
    ) -> Result<Value>;

    /// GET without query parameters.
    fn get(&self, path: &[String]) -> Result<Value> {
        self.request(Method::Get, path, None, None)
    }

    /// GET with query parameters.
    fn get_with_query(&self, path: &[String], query: &Query) -> Result<Value> {
        self.request(Method::Get, path, Some(query), None)
    }

    /// POST a JSON body.
    fn post(&self, path: &[String], body: &Value) -> Result<Value> {
        self.request(Method::Post, path, None, Some(body))
    }

    /// PUT a JSON body.
    fn put(&self, path: &[String], body: &Value) -> Result<Value> {
        self.request(Method::Put, path, None, Some(body))
    }

    /// DELETE an object.
    fn delete(&self, path: &[String]) -> Result<Value> {
        self.request(Method::Delete, path, None, None)
    }
}

impl<T: Transport + ?Sized> Transport for &T {
    fn request(
        &self,
        method: Method,
        path: &[String],
        query: Option<&Query>,
        body: Option<&Value>,
    ) -> Result<Value> {
        (**self).request(method, path, query, body)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn request(
        &self,
        method: Method,
        path: &[String],
        query: Option<&Query>,
        body: Option<&Value>,
    ) -> Result<Value> {
        (**self).request(method, path, query, body)
    }
}

/// A request observed by [`MockTransport`].
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    /// Request method.
    pub method: Method,
    /// Rendered path including the query string.
    pub uri: String,
    /// Request body, if any.
    pub body: Option<Value>,
}

/// Mock transport for testing without network access.
///
/// Routes are keyed by method and rendered URI (path plus query string).
/// Unrouted requests fail with [`Error::NotFound`], which is also how the
/// real API answers unknown IDs.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    routes: Arc<Mutex<HashMap<(Method, String), Result<Value>>>>,
    calls: Arc<Mutex<Vec<Call>>>,
}

impl MockTransport {
    /// Create a new empty mock transport.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `method path` with `response`.
    pub fn on(&self, method: Method, path: &[&str], response: Value) {
        self.route(method, render_uri(path, None), Ok(response));
    }

    /// Answer `method path?query` with `response`.
    pub fn on_query(&self, method: Method, path: &[&str], query: &Query, response: Value) {
        self.route(method, render_uri(path, Some(query)), Ok(response));
    }

    /// Fail `method path` with `error`.
    pub fn on_error(&self, method: Method, path: &[&str], error: Error) {
        self.route(method, render_uri(path, None), Err(error));
    }

    fn route(&self, method: Method, uri: String, response: Result<Value>) {
        let mut routes = self.routes.lock().unwrap();
        routes.insert((method, uri), response);
    }

    /// All calls received so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of calls made with `method`.
    #[must_use]
    pub fn call_count(&self, method: Method) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.method == method)
            .count()
    }

    /// Number of POST, PUT and DELETE calls.
    #[must_use]
    pub fn mutation_count(&self) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.method.is_mutation())
            .count()
    }
}

impl Transport for MockTransport {
    fn request(
        &self,
        method: Method,
        path: &[String],
        query: Option<&Query>,
        body: Option<&Value>,
    ) -> Result<Value> {
        let uri = render_uri(path, query);
        self.calls.lock().unwrap().push(Call {
            method,
            uri: uri.clone(),
            body: body.cloned(),
        });

        let routes = self.routes.lock().unwrap();
        match routes.get(&(method, uri.clone())) {
            Some(response) => response.clone(),
            None if method.is_mutation() => Ok(Value::Object(serde_json::Map::new())),
            None => Err(Error::NotFound { path: uri }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn path(segments: &[&str]) -> Vec<String> {
        segments.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_mock_transport_new() {
        let mock = MockTransport::new();
        assert!(mock.calls().is_empty());
        assert_eq!(mock.mutation_count(), 0);
    }

    #[test]
    fn test_mock_transport_routes_get() {
        let mock = MockTransport::new();
        mock.on(Method::Get, &["policy"], json!([{"policyId": "p1"}]));

        let listing = mock.get(&path(&["policy"])).unwrap();
        assert_eq!(listing, json!([{"policyId": "p1"}]));
        assert_eq!(mock.call_count(Method::Get), 1);
    }

    #[test]
    fn test_mock_transport_routes_query() {
        let mock = MockTransport::new();
        let mut query = Query::new();
        query.insert("cloudType".into(), "aws".into());
        mock.on_query(Method::Get, &["cloud", "name"], &query, json!([]));

        assert_eq!(
            mock.get_with_query(&path(&["cloud", "name"]), &query).unwrap(),
            json!([])
        );
        // Same path without the query is a different route.
        assert!(mock.get(&path(&["cloud", "name"])).is_err());
    }

    #[test]
    fn test_mock_transport_unrouted_get_is_not_found() {
        let mock = MockTransport::new();
        let err = mock.get(&path(&["cloud", "aws", "missing"])).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_mock_transport_records_mutations() {
        let mock = MockTransport::new();
        mock.post(&path(&["cloud", "aws"]), &json!({"name": "x"}))
            .unwrap();
        mock.put(&path(&["cloud", "aws", "1"]), &json!({"name": "y"}))
            .unwrap();
        mock.delete(&path(&["cloud", "aws", "1"])).unwrap();

        assert_eq!(mock.mutation_count(), 3);
        let calls = mock.calls();
        assert_eq!(calls[0].method, Method::Post);
        assert_eq!(calls[0].body, Some(json!({"name": "x"})));
        assert_eq!(calls[2].uri, "/cloud/aws/1");
    }

    #[test]
    fn test_mock_transport_error_route() {
        let mock = MockTransport::new();
        mock.on_error(
            Method::Post,
            &["cloud", "aws"],
            Error::AlreadyExists {
                path: "/cloud/aws".into(),
            },
        );
        let err = mock.post(&path(&["cloud", "aws"]), &json!({})).unwrap_err();
        assert!(matches!(err, Error::AlreadyExists { .. }));
    }
}
