use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::mode::Mode;

const TRUNCATION_MARKER: &str = "... [truncated]";

pub const SCHEMA_FILE: &str = "schema.txt";
pub const EXAMPLES_FILE: &str = "examples.txt";
pub const PACKAGES_FILE: &str = "packages.txt";

/// Optional knowledge injected into the instruction block.
///
/// An empty string means "not supplied"; the assembler renders an explicit notice
/// for it instead of dropping the section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceMaterial {
    #[serde(default)]
    pub schema: String,
    #[serde(default)]
    pub examples: String,
    #[serde(default)]
    pub packages: String,
}

impl ReferenceMaterial {
    pub fn is_empty(&self) -> bool {
        self.schema.trim().is_empty()
            && self.examples.trim().is_empty()
            && self.packages.trim().is_empty()
    }

    /// Clip every section to at most `max_chars` characters.
    pub fn truncated(&self, max_chars: usize) -> Self {
        Self {
            schema: truncate_chars(&self.schema, max_chars),
            examples: truncate_chars(&self.examples, max_chars),
            packages: truncate_chars(&self.packages, max_chars),
        }
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        None => text.to_string(),
        Some((byte_idx, _)) => format!("{}{}", &text[..byte_idx], TRUNCATION_MARKER),
    }
}

/// Where reference material for a mode comes from.
///
/// Retrieval-backed sources (live schema introspection, document indexes) plug in
/// here; loading never fails, a missing source yields an empty bundle.
#[async_trait]
pub trait ReferenceSource: Send + Sync {
    async fn load(&self, mode: Mode) -> ReferenceMaterial;
}

/// Never supplies anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyReferenceSource;

#[async_trait]
impl ReferenceSource for EmptyReferenceSource {
    async fn load(&self, _mode: Mode) -> ReferenceMaterial {
        ReferenceMaterial::default()
    }
}

/// Reads `schema.txt`, `examples.txt` and `packages.txt` from a directory for modes
/// that use reference material.
#[derive(Debug, Clone)]
pub struct DirectoryReferenceSource {
    dir: PathBuf,
}

impl DirectoryReferenceSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    async fn read_or_empty(&self, file_name: &str) -> String {
        let path = self.dir.join(file_name);
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) => {
                log::warn!("Reference file {:?} not loaded: {}", path, e);
                String::new()
            }
        }
    }
}

#[async_trait]
impl ReferenceSource for DirectoryReferenceSource {
    async fn load(&self, mode: Mode) -> ReferenceMaterial {
        if !mode.uses_reference_material() {
            return ReferenceMaterial::default();
        }

        let (schema, examples, packages) = tokio::join!(
            self.read_or_empty(SCHEMA_FILE),
            self.read_or_empty(EXAMPLES_FILE),
            self.read_or_empty(PACKAGES_FILE),
        );

        ReferenceMaterial {
            schema,
            examples,
            packages,
        }
    }
}
