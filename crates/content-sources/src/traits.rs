// FILE: crates/content-sources/src/traits.rs

use crate::SourceResult;
use shelfsort_core::Metadata;
use std::path::PathBuf;

/// Something that can turn a guess into finalized metadata
///
/// Implementations may block; callers run them off the async runtime and
/// under a timeout.
pub trait MetadataResolver: Send + Sync {
    /// Short identifier used in logs
    fn name(&self) -> &str;

    /// Looks up metadata; `Ok(None)` when nothing matched
    fn resolve(&self, query: &ResolverQuery) -> SourceResult<Option<Metadata>>;

    /// Whether the resolver can currently be used
    fn is_available(&self) -> bool {
        true
    }
}

/// Lookup request: free text, split fields, or a direct catalog identifier
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolverQuery {
    pub text: String,
    pub title: Option<String>,
    pub author: Option<String>,
    pub asin: Option<String>,
    /// Folder holding the unit's files, for resolvers that read local hints
    pub folder: Option<PathBuf>,
}

impl ResolverQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    /// Builds a query from a title/author guess; blank parts are left out
    pub fn from_guess(title: &str, author: &str) -> Self {
        let non_blank = |s: &str| {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        };

        let text = [title.trim(), author.trim()]
            .iter()
            .filter(|s| !s.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(" ");

        Self {
            text,
            title: non_blank(title),
            author: non_blank(author),
            ..Default::default()
        }
    }

    pub fn with_asin(mut self, asin: impl Into<String>) -> Self {
        self.asin = Some(asin.into());
        self
    }

    pub fn with_folder(mut self, folder: impl Into<PathBuf>) -> Self {
        self.folder = Some(folder.into());
        self
    }

    /// True when there is nothing to search for
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty() && self.asin.is_none() && self.folder.is_none()
    }
}
