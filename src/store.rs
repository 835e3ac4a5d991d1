//! JSON Document Store
//!
//! Flat-file persistence for the three bot documents. Every write replaces
//! the whole document; there is no merging and no versioning.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, error};

/// Named documents kept by the bot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Document {
    Config,
    Counters,
    Reactions,
}

impl Document {
    pub fn file_name(&self) -> &'static str {
        match self {
            Self::Config => "config.json",
            Self::Counters => "counters.json",
            Self::Reactions => "reactions.json",
        }
    }
}

/// Persistence failures
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Document {0} does not exist")]
    Missing(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed JSON in {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Directory-backed document store
#[derive(Debug, Clone)]
pub struct JsonStore {
    dir: PathBuf,
}

impl JsonStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_of(&self, doc: Document) -> PathBuf {
        self.dir.join(doc.file_name())
    }

    /// Read and deserialize a whole document
    pub async fn read_json<T: DeserializeOwned>(&self, doc: Document) -> Result<T, StoreError> {
        let path = self.path_of(doc);
        let raw = match tokio::fs::read(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::Missing(path.display().to_string()));
            }
            Err(source) => {
                return Err(StoreError::Io {
                    path: path.display().to_string(),
                    source,
                })
            }
        };

        serde_json::from_slice(&raw).map_err(|source| StoreError::Json {
            path: path.display().to_string(),
            source,
        })
    }

    /// Read a document, falling back to `T::default()` when it does not exist yet
    pub async fn read_or_default<T: DeserializeOwned + Default>(
        &self,
        doc: Document,
    ) -> Result<T, StoreError> {
        match self.read_json(doc).await {
            Ok(value) => Ok(value),
            Err(StoreError::Missing(path)) => {
                tracing::warn!("{} not found, starting empty", path);
                Ok(T::default())
            }
            Err(e) => Err(e),
        }
    }

    /// Like [`read_or_default`](Self::read_or_default), but a document that no
    /// longer parses is moved aside to `<name>.corrupt` and replaced by
    /// `T::default()`. Only I/O failures are returned.
    pub async fn read_or_recover<T: DeserializeOwned + Default>(
        &self,
        doc: Document,
    ) -> Result<T, StoreError> {
        match self.read_or_default(doc).await {
            Err(StoreError::Json { path, source }) => {
                let aside = self.path_of(doc).with_extension("json.corrupt");
                error!("{} is malformed ({}), moving it to {}", path, source, aside.display());
                tokio::fs::rename(self.path_of(doc), &aside)
                    .await
                    .map_err(|source| StoreError::Io {
                        path: aside.display().to_string(),
                        source,
                    })?;
                Ok(T::default())
            }
            other => other,
        }
    }

    /// Serialize and replace a whole document
    pub async fn write_json<T: Serialize>(&self, doc: Document, value: &T) -> Result<(), StoreError> {
        let path = self.path_of(doc);
        let body = serde_json::to_vec_pretty(value).map_err(|source| StoreError::Json {
            path: path.display().to_string(),
            source,
        })?;

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| StoreError::Io {
                path: self.dir.display().to_string(),
                source,
            })?;

        // Write beside the target and rename so a crash never leaves half a document
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &body)
            .await
            .map_err(|source| StoreError::Io {
                path: tmp.display().to_string(),
                source,
            })?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|source| StoreError::Io {
                path: path.display().to_string(),
                source,
            })?;

        debug!("Wrote {} ({} bytes)", path.display(), body.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_then_read() {
        let temp = TempDir::new().unwrap();
        let store = JsonStore::new(temp.path());

        let mut doc = BTreeMap::new();
        doc.insert("a".to_string(), 1u64);
        store.write_json(Document::Counters, &doc).await.unwrap();

        let back: BTreeMap<String, u64> = store.read_json(Document::Counters).await.unwrap();
        assert_eq!(back, doc);
    }

    #[tokio::test]
    async fn test_missing_document() {
        let temp = TempDir::new().unwrap();
        let store = JsonStore::new(temp.path());

        let err = store
            .read_json::<BTreeMap<String, u64>>(Document::Reactions)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Missing(_)));

        let empty: BTreeMap<String, u64> = store.read_or_default(Document::Reactions).await.unwrap();
        assert!(empty.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_document() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("config.json"), "{not json").unwrap();
        let store = JsonStore::new(temp.path());

        let err = store
            .read_or_default::<BTreeMap<String, u64>>(Document::Config)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Json { .. }));
    }

    #[tokio::test]
    async fn test_malformed_document_moved_aside() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("counters.json"), "{not json").unwrap();
        let store = JsonStore::new(temp.path());

        let recovered: BTreeMap<String, u64> = store.read_or_recover(Document::Counters).await.unwrap();
        assert!(recovered.is_empty());
        assert!(!temp.path().join("counters.json").exists());
        assert_eq!(
            std::fs::read_to_string(temp.path().join("counters.json.corrupt")).unwrap(),
            "{not json"
        );
    }
}
