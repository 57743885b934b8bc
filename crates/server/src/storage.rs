//! Local document storage.
//!
//! Documents are stored in a single directory and named after the hex-encoded
//! [`blake2`](common::hash::blake2) hash of their contents, so identical uploads
//! share one file.

use std::{
    io,
    path::{Path, PathBuf},
};

use common::{config, hash};
use db::patent_document;
use tracing::warn;

/// Document stored on disk.
pub(crate) struct StoredDocument {
    pub content_hash: String,
    pub path: PathBuf,
}

impl From<patent_document::Model> for StoredDocument {
    fn from(document: patent_document::Model) -> Self {
        Self {
            content_hash: document.content_hash,
            path: PathBuf::from(document.storage_path),
        }
    }
}

pub(crate) struct DocumentStorage<'a> {
    root: &'a Path,
}

impl<'a> DocumentStorage<'a> {
    pub(crate) fn new(config: &'a config::Storage) -> Self {
        Self {
            root: &config.uploads_path,
        }
    }

    /// Store document contents, skipping the write if identical contents are already stored.
    pub(crate) async fn store(&self, contents: &[u8]) -> Result<StoredDocument, io::Error> {
        let content_hash = hash::blake2_hex(contents);
        let path = self.root.join(&content_hash);

        if tokio::fs::metadata(&path).await.is_err() {
            tokio::fs::create_dir_all(self.root).await?;
            tokio::fs::write(&path, contents).await?;
        }

        Ok(StoredDocument { content_hash, path })
    }

    /// Remove a stored document file.
    ///
    /// Failures are logged and otherwise ignored.
    pub(crate) async fn remove(&self, path: &Path) {
        if let Err(err) = tokio::fs::remove_file(path).await {
            if err.kind() != io::ErrorKind::NotFound {
                warn!(%err, path = %path.display(), "unable to remove stored document");
            }
        }
    }
}
