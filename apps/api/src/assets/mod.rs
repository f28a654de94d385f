//! Static asset reader: prompt definitions and social-post sets stored as JSON on disk.
//!
//! Files are read and parsed on every call; nothing is cached.

pub mod handlers;

use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    PersonaPrompt,
    ContentPrompt,
    SocialPosts,
}

impl AssetKind {
    pub fn file_name(self) -> &'static str {
        match self {
            AssetKind::PersonaPrompt => "persona_extraction_prompt.json",
            AssetKind::ContentPrompt => "content_generation_prompt.json",
            AssetKind::SocialPosts => "social_media_outputs.json",
        }
    }
}

#[derive(Debug, Clone)]
pub struct AssetStore {
    root: PathBuf,
}

impl AssetStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, kind: AssetKind) -> PathBuf {
        self.root.join(kind.file_name())
    }

    /// Reads and parses the document for `kind`.
    pub async fn load(&self, kind: AssetKind) -> Result<Value, AssetError> {
        let path = self.path_for(kind);
        let raw = tokio::fs::read(&path)
            .await
            .map_err(|source| AssetError::Read {
                path: path.clone(),
                source,
            })?;

        debug!("Loaded {} ({} bytes)", path.display(), raw.len());

        serde_json::from_slice(&raw).map_err(|source| AssetError::Parse { path, source })
    }
}
