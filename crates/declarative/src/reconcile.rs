//! State reconciliation engine
//!
//! Converges one remote object towards a desired state: locate it by ID or
//! name, then create, update or delete it. Every invocation fetches fresh
//! state; nothing is cached between calls.

use crate::adapter::ResourceAdapter;
use crate::diff::{compared_fields, first_difference};
use crate::error::{Error, Result};
use crate::filter::{FilterCriteria, MatchMode, into_record, list_records, query};
use crate::types::{
    Action, DesiredState, Identity, Mode, Operation, ReconcileResult, ResourceRecord, scalar_text,
};
use prismakit::Transport;
use serde_json::Value;

/// Options controlling a reconcile
#[derive(Debug, Clone, Copy, Default)]
pub struct ReconcileOptions {
    /// Whether the object should exist
    pub mode: Mode,
    /// Decide but skip the create, update or delete call
    pub dry_run: bool,
}

impl ReconcileOptions {
    pub fn present() -> Self {
        Self::default()
    }

    pub fn absent() -> Self {
        Self {
            mode: Mode::Absent,
            ..Self::default()
        }
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

/// An existing object and the ID it is addressed by
#[derive(Debug, Clone, PartialEq)]
pub struct Located {
    pub id: String,
    pub record: ResourceRecord,
}

impl Identity {
    /// Read the identity a desired state carries through the adapter's
    /// identity and name paths. Blank values count as unset.
    pub fn from_desired(adapter: &ResourceAdapter, desired: &DesiredState) -> Self {
        Self {
            by_id: adapter.identity_path.text(desired),
            by_name: adapter.name_path.text(desired),
        }
    }
}

/// Reconciles objects of one adapter over a transport
pub struct Reconciler<'a, T: Transport + ?Sized> {
    transport: &'a T,
    adapter: &'a ResourceAdapter,
}

impl<'a, T: Transport + ?Sized> Reconciler<'a, T> {
    pub fn new(transport: &'a T, adapter: &'a ResourceAdapter) -> Self {
        Self { transport, adapter }
    }

    fn object_path(&self) -> Result<&'a [String]> {
        self.adapter
            .object_path
            .as_deref()
            .ok_or_else(|| Error::Unsupported {
                kind: self.adapter.kind.clone(),
                operation: "reconcile",
            })
    }

    fn item_path(&self, id: &str) -> Result<Vec<String>> {
        self.adapter.item_path(id).ok_or_else(|| Error::Unsupported {
            kind: self.adapter.kind.clone(),
            operation: "reconcile",
        })
    }

    /// Resolve a name to an ID through the listing (exact primary match).
    ///
    /// `Ok(None)` when nothing matches.
    pub fn resolve_id(&self, name: &str) -> Result<Option<String>> {
        let listing = list_records(
            self.transport,
            self.adapter,
            &ResourceRecord::new(),
            Operation::Lookup,
        )?;
        let criteria = FilterCriteria::new().primary(name, MatchMode::Exact);
        let matches = query(self.transport, &listing, &criteria, self.adapter)?;
        Ok(matches
            .listing
            .first()
            .and_then(|record| record.get(&self.adapter.id_field))
            .and_then(scalar_text)
            .map(|id| id.into_owned()))
    }

    /// Fetch one object by ID
    pub fn fetch(&self, id: &str) -> Result<ResourceRecord> {
        let path = self.item_path(id)?;
        let record = self
            .transport
            .get(&path)
            .map_err(Error::remote(Operation::Fetch, &self.adapter.kind))?;
        into_record(record, &self.adapter.kind)
    }

    /// Find the existing object.
    ///
    /// An unknown ID and an unmatched name both mean "does not exist".
    /// A name that resolves but whose object then cannot be fetched is an
    /// error.
    pub fn locate(&self, identity: &Identity) -> Result<Option<Located>> {
        if let Some(id) = &identity.by_id {
            return match self.fetch(id) {
                Ok(record) => Ok(Some(Located {
                    id: id.clone(),
                    record,
                })),
                Err(e) if e.is_not_found() => {
                    log::debug!("(reconcile) {} {id} not found", self.adapter.kind);
                    Ok(None)
                }
                Err(e) => Err(e),
            };
        }

        let Some(name) = &identity.by_name else {
            return Err(Error::AmbiguousIdentity {
                kind: self.adapter.kind.clone(),
            });
        };
        match self.resolve_id(name)? {
            Some(id) => {
                let record = self.fetch(&id)?;
                Ok(Some(Located { id, record }))
            }
            None => {
                log::debug!("(reconcile) no {} named '{name}'", self.adapter.kind);
                Ok(None)
            }
        }
    }

    /// Converge the object towards `desired`
    pub fn reconcile(
        &self,
        desired: &DesiredState,
        identity: &Identity,
        opts: ReconcileOptions,
    ) -> Result<ReconcileResult> {
        if identity.is_empty() {
            return Err(Error::AmbiguousIdentity {
                kind: self.adapter.kind.clone(),
            });
        }
        self.object_path()?;

        let located = self.locate(identity)?;
        let result = match opts.mode {
            Mode::Present => self.ensure_present(desired, located, opts.dry_run)?,
            Mode::Absent => self.ensure_absent(located, opts.dry_run)?,
        };

        if result.changed {
            log::info!(
                "(reconcile) {} {}{}",
                result.action,
                self.adapter.kind,
                if opts.dry_run { " (dry run)" } else { "" }
            );
        } else {
            log::info!("(reconcile) {} already {}", self.adapter.kind, opts.mode);
        }
        Ok(result)
    }

    fn ensure_present(
        &self,
        desired: &DesiredState,
        located: Option<Located>,
        dry_run: bool,
    ) -> Result<ReconcileResult> {
        let mut body = self.adapter.default_field_values.clone();
        merge(&mut body, desired);

        let Some(located) = located else {
            return self.create(desired, body, dry_run);
        };

        if self.adapter.identity_path.text(&body).is_none() {
            let id = self
                .adapter
                .identity_path
                .text(&located.record)
                .unwrap_or_else(|| located.id.clone());
            self.adapter.identity_path.set(&mut body, Value::String(id));
        }

        let fields = compared_fields(self.adapter, desired);
        let Some(change) = first_difference(&located.record, &body, &fields) else {
            return Ok(ReconcileResult {
                changed: false,
                action: Action::None,
                before: Some(located.record),
                after: Some(body),
            });
        };

        log::debug!(
            "(reconcile) {} {}: '{}' differs ({} -> {})",
            self.adapter.kind,
            located.id,
            change.field,
            change.current,
            change.desired
        );
        if !dry_run {
            self.transport
                .put(&self.item_path(&located.id)?, &Value::Object(body.clone()))
                .map_err(Error::remote(Operation::Update, &self.adapter.kind))?;
        }
        Ok(ReconcileResult {
            changed: true,
            action: Action::Update,
            before: Some(located.record),
            after: Some(body),
        })
    }

    fn create(
        &self,
        desired: &DesiredState,
        mut body: ResourceRecord,
        dry_run: bool,
    ) -> Result<ReconcileResult> {
        // A boolean skeleton default is a real value; blank strings are not
        for field in &self.adapter.required_fields {
            let has_default = self
                .adapter
                .default_field_values
                .get(field)
                .is_some_and(Value::is_boolean);
            if !has_default && desired.get(field).is_none_or(Value::is_null) {
                return Err(Error::MissingField {
                    kind: self.adapter.kind.clone(),
                    field: field.clone(),
                });
            }
        }
        let Some(name) = self.adapter.name_path.text(&body) else {
            return Err(Error::MissingField {
                kind: self.adapter.kind.clone(),
                field: self.adapter.name_path.to_string(),
            });
        };

        if !dry_run {
            self.transport
                .post(self.object_path()?, &Value::Object(body.clone()))
                .map_err(Error::remote(Operation::Create, &self.adapter.kind))?;

            // The create response does not carry the new ID
            match self.resolve_id(&name)? {
                Some(id) => self.adapter.identity_path.set(&mut body, Value::String(id)),
                None => log::warn!(
                    "(reconcile) created {} '{name}' but could not find it by name",
                    self.adapter.kind
                ),
            }
        }

        Ok(ReconcileResult {
            changed: true,
            action: Action::Create,
            before: None,
            after: Some(body),
        })
    }

    fn ensure_absent(&self, located: Option<Located>, dry_run: bool) -> Result<ReconcileResult> {
        let Some(located) = located else {
            return Ok(ReconcileResult::default());
        };

        if !dry_run {
            self.transport
                .delete(&self.item_path(&located.id)?)
                .map_err(Error::remote(Operation::Delete, &self.adapter.kind))?;
        }
        Ok(ReconcileResult {
            changed: true,
            action: Action::Delete,
            before: Some(located.record),
            after: None,
        })
    }
}

/// Reconcile one object of `adapter` towards `desired`
pub fn reconcile<T: Transport + ?Sized>(
    transport: &T,
    adapter: &ResourceAdapter,
    desired: &DesiredState,
    identity: &Identity,
    opts: ReconcileOptions,
) -> Result<ReconcileResult> {
    Reconciler::new(transport, adapter).reconcile(desired, identity, opts)
}

/// Merge `overlay` into `base` field by field.
///
/// Nested objects merge recursively; null overlay values leave the base
/// value in place.
pub fn merge(base: &mut ResourceRecord, overlay: &ResourceRecord) {
    for (field, value) in overlay {
        if value.is_null() {
            continue;
        }
        match (base.get_mut(field), value) {
            (Some(Value::Object(inner)), Value::Object(nested)) => merge(inner, nested),
            _ => {
                base.insert(field.clone(), value.clone());
            }
        }
    }
}
