//! Loading of JSON fixtures and alternative registries.

use std::path::Path;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;

use kyc_core::ClientResponse;
use kyc_fields::FieldRegistry;
use kyc_schema::SchemaRegistry;

/// Read and parse a JSON file.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("cannot parse {}", path.display()))
}

/// A client response fixture, as returned by `GET /clients/{id}`.
pub fn load_client(path: &Path) -> Result<ClientResponse> {
    read_json(path)
}

/// The registry at `path`, or the built-in one.
pub fn load_registry(path: Option<&Path>) -> Result<FieldRegistry> {
    match path {
        Some(path) => FieldRegistry::load(path)
            .with_context(|| format!("cannot load field registry {}", path.display())),
        None => FieldRegistry::builtin().context("built-in field registry is invalid"),
    }
}

/// The schemas in `dir`, or the built-in set.
pub fn load_schemas(dir: Option<&Path>) -> Result<SchemaRegistry> {
    match dir {
        Some(dir) => SchemaRegistry::load_dir(dir)
            .with_context(|| format!("cannot load schemas from {}", dir.display())),
        None => SchemaRegistry::builtin().context("built-in schemas are invalid"),
    }
}
