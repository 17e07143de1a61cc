//! # Declarative
//!
//! Generic query and reconcile engines for Prisma Cloud resources.
//!
//! Each resource type is described by a [`ResourceAdapter`] value: listing
//! path, primary search field, detail path template, request body skeleton.
//! The engines never hard-code a resource type.
//!
//! ## Core Concepts
//!
//! - **Filter engine** ([`filter::query`]): narrows a listing with ANDed
//!   [`Predicate`]s and optionally expands each match into its detail record
//! - **Reconcile engine** ([`Reconciler`]): locates one object by ID or name
//!   and creates, updates or deletes it to match a [`DesiredState`]
//! - **Catalog** ([`catalog`]): the built-in adapters
//!
//! ## Example
//!
//! ```no_run
//! use declarative::{catalog, reconcile, Identity, ReconcileOptions};
//! use prismakit::{Credentials, HttpTransport};
//! use serde_json::json;
//!
//! let mut transport = HttpTransport::new("https://api.prismacloud.io");
//! transport.login(&Credentials::new("access-key", "secret-key"))?;
//!
//! let adapter = catalog::aws_cloud_account();
//! let desired = json!({
//!     "name": "prod",
//!     "enabled": true,
//!     "externalId": "ext",
//!     "groupIds": [],
//!     "roleArn": "arn:aws:iam::123456789012:role/prisma",
//! });
//! let desired = desired.as_object().cloned().unwrap_or_default();
//!
//! let identity = Identity::from_desired(&adapter, &desired);
//! let result = reconcile(
//!     &transport,
//!     &adapter,
//!     &desired,
//!     &identity,
//!     ReconcileOptions::present().dry_run(true),
//! )?;
//! println!("changed: {}", result.changed);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod adapter;
pub mod catalog;
pub mod diff;
pub mod error;
pub mod filter;
pub mod reconcile;
pub mod types;

// Re-export main types at crate root
pub use adapter::{FieldPath, PathTemplate, ResourceAdapter, Segment};
pub use diff::{FieldChange, compared_fields, first_difference};
pub use error::{Error, ErrorKind, Result};
pub use filter::{
    Expansion, FilterCriteria, MatchMode, Predicate, fetch_and_query, fetch_listing, query,
};
pub use reconcile::{Located, ReconcileOptions, Reconciler, merge, reconcile};
pub use types::{
    Action, DesiredState, Identity, Mode, Operation, QueryResult, ReconcileResult,
    ResourceRecord, scalar_text,
};
