use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Registry name the OpenUPM convenience constructor installs.
pub const OPENUPM_REGISTRY_NAME: &str = "package.openupm.com";
/// Registry url the OpenUPM convenience constructor installs.
pub const OPENUPM_REGISTRY_URL: &str = "https://package.openupm.com";

#[derive(Debug, Error)]
pub enum DesiredError {
    #[error("failed to read desired-state file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse desired state: {0}")]
    ParseToml(#[from] toml::de::Error),
    #[error("registry name must not be empty")]
    EmptyRegistryName,
    #[error("registry '{0}' has an empty url")]
    EmptyRegistryUrl(String),
    #[error("registry '{registry}' contains an empty scope")]
    EmptyScope { registry: String },
    #[error("dependency package id must not be empty")]
    EmptyPackageId,
}

/// One scoped package source to ensure present. Matched against existing
/// manifest entries by `name` only; url and scopes of a pre-existing
/// same-named registry are never rewritten.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RegistryDescriptor {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub scopes: Vec<String>,
}

/// The required version for one package id.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct DependencyPin {
    pub package: String,
    pub version: String,
}

/// Everything one reconciliation pass must ensure: registries (each with its
/// ordered scopes) and a single dependency pin. Immutable for the duration of
/// a pass.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct DesiredState {
    #[serde(default)]
    pub registries: Vec<RegistryDescriptor>,
    pub dependency: DependencyPin,
}

impl DesiredState {
    /// Desired state for one package served from the OpenUPM registry.
    pub fn openupm(
        scopes: Vec<String>,
        package: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            registries: vec![RegistryDescriptor {
                name: OPENUPM_REGISTRY_NAME.to_owned(),
                url: OPENUPM_REGISTRY_URL.to_owned(),
                scopes,
            }],
            dependency: DependencyPin {
                package: package.into(),
                version: version.into(),
            },
        }
    }

    /// Reject descriptors the reconciler could not act on meaningfully.
    ///
    /// An empty dependency version is allowed: it means "never touch an
    /// existing pin", which is a defined policy rather than a mistake.
    pub fn validate(&self) -> Result<(), DesiredError> {
        for registry in &self.registries {
            if registry.name.trim().is_empty() {
                return Err(DesiredError::EmptyRegistryName);
            }
            if registry.url.trim().is_empty() {
                return Err(DesiredError::EmptyRegistryUrl(registry.name.clone()));
            }
            if registry.scopes.iter().any(|s| s.trim().is_empty()) {
                return Err(DesiredError::EmptyScope {
                    registry: registry.name.clone(),
                });
            }
        }
        if self.dependency.package.trim().is_empty() {
            return Err(DesiredError::EmptyPackageId);
        }
        Ok(())
    }
}

pub fn parse_desired_str(input: &str) -> Result<DesiredState, DesiredError> {
    let desired: DesiredState = toml::from_str(input)?;
    desired.validate()?;
    Ok(desired)
}

pub fn parse_desired_file(path: impl AsRef<Path>) -> Result<DesiredState, DesiredError> {
    let content = fs::read_to_string(path)?;
    parse_desired_str(&content)
}
