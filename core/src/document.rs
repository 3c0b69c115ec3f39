use std::{
    io,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde_json::Value as JsonValue;
use tokio::fs;
use tracing::warn;

use crate::backup::BackupStore;

/// Placeholder served for a document that has never been written.
pub const EMPTY_DOCUMENT: &[u8] = b"{}";

/// One logical dataset served by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentKind {
    /// Logical name; doubles as the backup-grouping key.
    pub name: &'static str,
    /// Whether updates copy the prior content into the backup store.
    pub keeps_backups: bool,
}

/// Every document the service knows about. Requests for names outside
/// this table are rejected before touching the filesystem.
pub const DOCUMENTS: &[DocumentKind] = &[
    DocumentKind {
        name: "employees",
        keeps_backups: false,
    },
    DocumentKind {
        name: "daysOff",
        keeps_backups: true,
    },
    DocumentKind {
        name: "holidays",
        keeps_backups: true,
    },
];

impl DocumentKind {
    pub fn lookup(name: &str) -> Option<DocumentKind> {
        DOCUMENTS.iter().copied().find(|kind| kind.name == name)
    }
}

/// Reads and overwrites the live JSON documents, delegating snapshots of
/// prior content to the [`BackupStore`] during updates.
#[derive(Clone)]
pub struct DocumentStore {
    data_dir: PathBuf,
    backups: BackupStore,
}

impl DocumentStore {
    /// Opens the store, creating the data directory if it is missing.
    pub fn open(data_dir: impl AsRef<Path>, backups: BackupStore) -> Result<Self> {
        let data_dir = data_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;

        Ok(Self { data_dir, backups })
    }

    pub fn backups(&self) -> &BackupStore {
        &self.backups
    }

    /// Returns the document's current JSON bytes, or the `{}` placeholder
    /// when it has never been written.
    pub async fn read(&self, name: &str) -> Result<Vec<u8>> {
        match self.read_existing(name).await? {
            Some(bytes) => Ok(bytes),
            None => Ok(EMPTY_DOCUMENT.to_vec()),
        }
    }

    /// Validates and canonically reformats `body`, then overwrites the
    /// document without backing up the prior content.
    pub async fn update(&self, name: &str, body: &[u8]) -> Result<()> {
        let canonical = canonical_json(body)?;
        self.write_document(name, &canonical).await
    }

    /// Validates and canonically reformats `body`, copies the prior
    /// content (if any) into the backup store, prunes that document's
    /// backups down to `max_backups`, then overwrites the live document.
    ///
    /// Backup and prune failures never abort the write; the update fails
    /// only when the body is not JSON or the final write fails.
    pub async fn update_with_backup(
        &self,
        name: &str,
        body: &[u8],
        max_backups: usize,
    ) -> Result<()> {
        let canonical = canonical_json(body)?;

        match self.read_existing(name).await {
            Ok(Some(previous)) => match self.backups.create(name, &previous).await {
                Ok(_) => {
                    if let Err(error) = self.backups.prune(name, max_backups).await {
                        warn!(document = name, ?error, "failed to prune old backups");
                    }
                }
                Err(error) => {
                    warn!(document = name, ?error, "failed to back up previous document");
                }
            },
            Ok(None) => {}
            Err(error) => {
                warn!(
                    document = name,
                    ?error,
                    "failed to read previous document for backup"
                );
            }
        }

        self.write_document(name, &canonical).await
    }

    fn document_path(&self, name: &str) -> PathBuf {
        self.data_dir.join(format!("{name}.json"))
    }

    async fn read_existing(&self, name: &str) -> Result<Option<Vec<u8>>> {
        let path = self.document_path(name);
        match fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err)
                .with_context(|| format!("failed to read document {}", path.display())),
        }
    }

    async fn write_document(&self, name: &str, canonical: &[u8]) -> Result<()> {
        let path = self.document_path(name);
        // Direct overwrite rather than write-to-temp-and-rename; a crash
        // mid-write can leave a partially written document.
        fs::write(&path, canonical)
            .await
            .with_context(|| format!("failed to write document {}", path.display()))
    }
}

/// Parses `body` as JSON and re-serializes it with stable two-space
/// indentation.
fn canonical_json(body: &[u8]) -> Result<Vec<u8>> {
    let value: JsonValue =
        serde_json::from_slice(body).context("request body is not valid JSON")?;
    serde_json::to_vec_pretty(&value).context("failed to reserialize JSON document")
}
