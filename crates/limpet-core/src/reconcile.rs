use crate::codec::{self, CodecError};
use crate::desired::{DesiredState, RegistryDescriptor};
use crate::tree::{self, Kind, StructuralError};
use crate::version;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

// Manifest member names
pub const SCOPED_REGISTRIES: &str = "scopedRegistries";
pub const DEPENDENCIES: &str = "dependencies";
pub const NAME: &str = "name";
pub const URL: &str = "url";
pub const SCOPES: &str = "scopes";

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    Structure(#[from] StructuralError),
}

/// Outcome of one reconciliation pass over manifest text.
///
/// When `changed` is false, `text` is the input byte-for-byte; callers should
/// skip the write entirely to avoid timestamp and diff churn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciled {
    pub text: String,
    pub changed: bool,
}

/// Patch manifest text toward `desired`: parse, merge, and re-render with the
/// given indent width only when something actually changed.
///
/// The pass is idempotent: feeding the output back in with the same desired
/// state reports no change. Errors abort before any output text is produced.
pub fn reconcile(
    text: &str,
    desired: &DesiredState,
    indent: usize,
) -> Result<Reconciled, ReconcileError> {
    let mut root = codec::parse(text)?;
    let changed = reconcile_value(&mut root, desired)?;
    if !changed {
        return Ok(Reconciled {
            text: text.to_owned(),
            changed: false,
        });
    }
    let rendered = codec::serialize(&root, indent)?;
    Ok(Reconciled {
        text: rendered,
        changed: true,
    })
}

/// Merge `desired` into an already-parsed manifest tree, in place.
///
/// Returns whether any mutation occurred. Pre-existing registries, scopes,
/// and dependencies are never removed, reordered, or rewritten wholesale; a
/// same-named registry with a different url is left alone by design.
pub fn reconcile_value(root: &mut Value, desired: &DesiredState) -> Result<bool, StructuralError> {
    let manifest = tree::root_object_mut(root)?;
    let mut changed = ensure_registries(manifest, &desired.registries)?;
    changed |= ensure_dependency(manifest, desired)?;
    Ok(changed)
}

fn ensure_registries(
    manifest: &mut Map<String, Value>,
    registries: &[RegistryDescriptor],
) -> Result<bool, StructuralError> {
    let (entries, mut changed) =
        tree::ensure_array_entry(manifest, SCOPED_REGISTRIES, SCOPED_REGISTRIES)?;

    for descriptor in registries {
        let index = match find_registry(entries, &descriptor.name) {
            Some(index) => index,
            None => {
                let mut registry = Map::new();
                registry.insert(NAME.to_owned(), Value::String(descriptor.name.clone()));
                registry.insert(URL.to_owned(), Value::String(descriptor.url.clone()));
                registry.insert(SCOPES.to_owned(), Value::Array(Vec::new()));
                entries.push(Value::Object(registry));
                changed = true;
                debug!(name = %descriptor.name, "added scoped registry");
                entries.len() - 1
            }
        };
        let Value::Object(registry) = &mut entries[index] else {
            // find_registry only yields object elements
            continue;
        };

        let scopes_path = format!("{SCOPED_REGISTRIES}[{}].{SCOPES}", descriptor.name);
        let (scopes, scopes_created) = tree::ensure_array_entry(registry, SCOPES, &scopes_path)?;
        changed |= scopes_created;

        for scope in &descriptor.scopes {
            let present = scopes.iter().any(|s| s.as_str() == Some(scope.as_str()));
            if !present {
                scopes.push(Value::String(scope.clone()));
                changed = true;
                debug!(registry = %descriptor.name, scope = %scope, "added registry scope");
            }
        }
    }
    Ok(changed)
}

/// First array element that is an object whose `name` member equals `name`.
/// Non-object elements are skipped, not rejected.
fn find_registry(entries: &[Value], name: &str) -> Option<usize> {
    entries.iter().position(|entry| {
        entry
            .as_object()
            .and_then(|obj| obj.get(NAME))
            .and_then(Value::as_str)
            == Some(name)
    })
}

fn ensure_dependency(
    manifest: &mut Map<String, Value>,
    desired: &DesiredState,
) -> Result<bool, StructuralError> {
    let (dependencies, mut changed) =
        tree::ensure_object_entry(manifest, DEPENDENCIES, DEPENDENCIES)?;

    let pin = &desired.dependency;
    let current = match dependencies.get(&pin.package) {
        None | Some(Value::Null) => None,
        Some(Value::String(v)) => Some(v.as_str()),
        Some(other) => {
            return Err(StructuralError::WrongKind {
                path: format!("{DEPENDENCIES}.{}", pin.package),
                expected: Kind::String,
                found: tree::kind_of(other),
            });
        }
    };

    if version::should_update(current, &pin.version) && current != Some(pin.version.as_str()) {
        dependencies.insert(pin.package.clone(), Value::String(pin.version.clone()));
        changed = true;
        debug!(package = %pin.package, version = %pin.version, "pinned dependency version");
    }
    Ok(changed)
}
