//! Deterministic, idempotent patching of UPM `Packages/manifest.json` files.
//!
//! This crate is the pure engine: given manifest text and a desired state
//! (scoped registries to ensure, scopes to ensure under them, one dependency
//! version pin), it produces possibly-modified text plus a changed flag. It
//! never touches the filesystem; persistence and locking belong to callers.
//!
//! Layers, leaves first: `codec` (tolerant parse and stable rendering),
//! `tree` (kind-checked access to the parsed document), `version`
//! (dot-numeric comparison with a defined ordinal fallback), `desired`
//! (the desired-state model and its TOML form), and `reconcile` (the merge
//! pass with the anti-downgrade policy).

pub mod codec;
pub mod desired;
pub mod reconcile;
pub mod tree;
pub mod version;

pub use codec::{normalize_empty_containers, parse, serialize, CodecError, DEFAULT_INDENT};
pub use desired::{
    parse_desired_file, parse_desired_str, DependencyPin, DesiredError, DesiredState,
    RegistryDescriptor, OPENUPM_REGISTRY_NAME, OPENUPM_REGISTRY_URL,
};
pub use reconcile::{reconcile, reconcile_value, Reconciled, ReconcileError};
pub use tree::{kind_of, Kind, StructuralError};
pub use version::{compare, should_update};
