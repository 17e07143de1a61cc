//! # prismakit
//!
//! Blocking client plumbing for the Prisma Cloud REST API.
//!
//! This crate provides:
//! - [`Transport`]: the request surface (`GET`/`POST`/`PUT`/`DELETE` against a
//!   path of segments) consumed by higher-level engines
//! - [`HttpTransport`]: a `ureq`-backed implementation with login and
//!   session-token handling
//! - [`MockTransport`]: an in-memory implementation for tests
//! - [`Error`]: classified failures (not found, already exists,
//!   authentication, malformed response, API error, transport)
//!
//! ## Example
//!
//! ```no_run
//! use prismakit::{Credentials, HttpTransport, Transport};
//!
//! let mut transport = HttpTransport::new("https://api.prismacloud.io");
//! transport
//!     .login(&Credentials::new("access-key", "secret-key").customer_name("acme"))
//!     .expect("login failed");
//!
//! let policies = transport.get(&["policy".to_string()]).expect("request failed");
//! println!("{} policies", policies.as_array().map_or(0, Vec::len));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod transport;
pub mod types;

pub use error::{Error, ErrorCategory, Result, classify};
pub use transport::http::{DEFAULT_API_URL, DEFAULT_TIMEOUT, HttpTransport};
pub use transport::{Call, MockTransport, Transport};
pub use types::{Credentials, Method, Query, render_path, render_uri};
