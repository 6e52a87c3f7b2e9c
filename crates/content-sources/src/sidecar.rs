// FILE: crates/content-sources/src/sidecar.rs

use crate::{parse_response, MetadataResolver, ResolverQuery, SourceError, SourceResult};
use shelfsort_core::Metadata;
use std::fs;
use std::io::ErrorKind;

/// File name of the metadata snapshot written next to placed books
pub const SIDECAR_FILE_NAME: &str = "metadata.json";

/// Resolves metadata from a `metadata.json` in the unit's folder
#[derive(Debug, Clone)]
pub struct SidecarSource {
    file_name: String,
}

impl SidecarSource {
    pub fn new() -> Self {
        Self {
            file_name: SIDECAR_FILE_NAME.to_string(),
        }
    }

    /// Reads a differently named sidecar file
    pub fn with_file_name(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
        }
    }
}

impl Default for SidecarSource {
    fn default() -> Self {
        Self::new()
    }
}

impl MetadataResolver for SidecarSource {
    fn name(&self) -> &str {
        "sidecar"
    }

    fn resolve(&self, query: &ResolverQuery) -> SourceResult<Option<Metadata>> {
        let Some(folder) = &query.folder else {
            return Ok(None);
        };

        let path = folder.join(&self.file_name);
        let body = match fs::read_to_string(&path) {
            Ok(body) => body,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(SourceError::Io(format!("{}: {}", path.display(), e))),
        };

        let meta = parse_response(&body);
        if meta.is_none() {
            log::warn!("Ignoring unusable sidecar {}", path.display());
        }
        Ok(meta)
    }
}
