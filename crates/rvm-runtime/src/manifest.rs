//! Manifest fetching and parsing.
//!
//! A manifest is a JSON document describing which runtime an application
//! needs. Only two fields matter here:
//!
//! ```json
//! { "runtime": { "version": "30.118.78.12", "arguments": "--v=1" } }
//! ```
//!
//! `runtime.version` is required. `runtime.arguments` is optional and
//! defaults to an empty string. Everything else in the document is ignored.

use serde_json::Value;
use tracing::debug;

use crate::error::{ManifestError, ManifestResult};

/// The parts of a manifest needed to provision and launch a runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestConfig {
    /// URL the manifest was fetched from.
    pub url: String,
    /// Required runtime version.
    pub runtime_version: String,
    /// Extra runtime command-line arguments, passed as one string.
    pub runtime_arguments: String,
}

impl ManifestConfig {
    /// Parse a manifest body.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::InvalidJson`] when `body` is not JSON, and
    /// [`ManifestError::Schema`] when `runtime.version` is missing, empty or
    /// not a string, or when `runtime.arguments` is present but not a string.
    pub fn parse(url: &str, body: &[u8]) -> ManifestResult<Self> {
        let doc: Value = serde_json::from_slice(body).map_err(|e| ManifestError::InvalidJson {
            url: url.to_owned(),
            source: e,
        })?;

        let runtime_version = match doc.pointer("/runtime/version") {
            Some(Value::String(v)) if !v.is_empty() => v.clone(),
            Some(Value::String(_)) => {
                return Err(schema(url, "runtime.version", "is empty"));
            },
            Some(other) => {
                return Err(schema(
                    url,
                    "runtime.version",
                    format!("must be a string, found {}", kind_of(other)),
                ));
            },
            None => return Err(schema(url, "runtime.version", "is missing")),
        };

        let runtime_arguments = match doc.pointer("/runtime/arguments") {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(a)) => a.clone(),
            Some(other) => {
                return Err(schema(
                    url,
                    "runtime.arguments",
                    format!("must be a string, found {}", kind_of(other)),
                ));
            },
        };

        Ok(Self {
            url: url.to_owned(),
            runtime_version,
            runtime_arguments,
        })
    }
}

fn schema(url: &str, field: &'static str, message: impl Into<String>) -> ManifestError {
    ManifestError::Schema {
        url: url.to_owned(),
        field,
        message: message.into(),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Fetches and parses manifests over HTTP.
#[derive(Debug, Clone)]
pub struct ManifestResolver {
    client: reqwest::Client,
}

impl ManifestResolver {
    /// Create a resolver using the given client.
    #[must_use]
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Fetch `url` and extract the runtime requirements.
    ///
    /// Any 2xx status counts as success.
    ///
    /// # Errors
    ///
    /// See [`ManifestError`] for the failure classes.
    pub async fn resolve(&self, url: &str) -> ManifestResult<ManifestConfig> {
        debug!(url, "fetching manifest");

        let transfer = |e| ManifestError::Transfer {
            url: url.to_owned(),
            source: e,
        };

        let response = self.client.get(url).send().await.map_err(transfer)?;
        let status = response.status();
        if !status.is_success() {
            return Err(ManifestError::HttpStatus {
                url: url.to_owned(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(transfer)?;
        let manifest = ManifestConfig::parse(url, &body)?;

        debug!(
            url,
            version = %manifest.runtime_version,
            "manifest resolved"
        );
        Ok(manifest)
    }
}
