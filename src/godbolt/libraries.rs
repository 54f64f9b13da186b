//! Library metadata lookup and the per-run include flag cache.

use anyhow::Result;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use super::CompileService;

/// `(library, version)` pairs whose headers every submission can include.
pub const REQUIRED_LIBRARIES: &[(&str, &str)] = &[("range-v3", "trunk"), ("cppcoro", "trunk")];

#[derive(Debug, Clone, Deserialize)]
pub struct Library {
    pub name: String,
    #[serde(default)]
    pub versions: Vec<LibraryVersion>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LibraryVersion {
    pub version: String,
    #[serde(default)]
    pub path: Vec<String>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LookupError {
    #[error("library '{0}' is not offered by the compiler service")]
    LibraryNotFound(String),
    #[error("library '{library}' has no version '{version}'")]
    VersionNotFound { library: String, version: String },
    #[error("library '{library}' version '{version}' lists no include path")]
    MissingPath { library: String, version: String },
    #[error("library '{library}' version '{version}' lists {count} include paths, expected exactly one")]
    AmbiguousPath { library: String, version: String, count: usize },
}

/// Find `library`/`version` in the catalog and format its single path as `-I<path>`.
pub fn include_flag(catalog: &[Library], library: &str, version: &str) -> Result<String, LookupError> {
    let entry = catalog
        .iter()
        .find(|l| l.name == library)
        .ok_or_else(|| LookupError::LibraryNotFound(library.to_string()))?;
    let found = entry
        .versions
        .iter()
        .find(|v| v.version == version)
        .ok_or_else(|| LookupError::VersionNotFound {
            library: library.to_string(),
            version: version.to_string(),
        })?;
    match found.path.as_slice() {
        [path] => Ok(format!("-I{}", path)),
        [] => Err(LookupError::MissingPath {
            library: library.to_string(),
            version: version.to_string(),
        }),
        paths => Err(LookupError::AmbiguousPath {
            library: library.to_string(),
            version: version.to_string(),
            count: paths.len(),
        }),
    }
}

/// Include flags for [`REQUIRED_LIBRARIES`], fetched on first use and kept for the run.
#[derive(Debug, Default)]
pub struct IncludePaths {
    flags: Option<Vec<String>>,
}

impl IncludePaths {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn resolve<S: CompileService>(&mut self, service: &S) -> Result<&[String]> {
        if self.flags.is_none() {
            let catalog = service.libraries().await?;
            let flags = REQUIRED_LIBRARIES
                .iter()
                .map(|(name, version)| include_flag(&catalog, name, version))
                .collect::<Result<Vec<_>, _>>()?;
            debug!(?flags, "resolved include flags");
            self.flags = Some(flags);
        }
        Ok(self.flags.as_deref().unwrap_or_default())
    }
}
