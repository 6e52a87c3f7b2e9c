// FILE: crates/content-sources/src/lib.rs
//! Metadata resolvers
//!
//! A resolver turns a best-guess query into finalized [`Metadata`]. Provider
//! responses are parsed leniently: malformed or missing fields are treated as
//! absent and "no results" is `Ok(None)`, never an error.

mod parse;
mod sidecar;
mod traits;

pub use parse::{metadata_from_value, parse_response};
pub use sidecar::{SidecarSource, SIDECAR_FILE_NAME};
pub use shelfsort_core::Metadata;
pub use traits::{MetadataResolver, ResolverQuery};

use thiserror::Error;

/// Result type for resolver operations
pub type SourceResult<T> = Result<T, SourceError>;

/// Errors from metadata resolvers
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SourceError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("Source unavailable: {0}")]
    Unavailable(String),
}
