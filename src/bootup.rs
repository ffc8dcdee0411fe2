//! Bootup record sources.
//!
//! [`JsonBootupStore`] persists records in a single JSON file under the
//! node's work directory:
//!
//! ```text
//! {work_dir}/
//! └── bootup.json      { "records": [ { "address": "<hex>", ... }, ... ] }
//! ```
//!
//! [`StaticBootupSource`] serves a fixed in-memory list.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::RegistryError;
use crate::registry::contracts::{BootupSource, FetchFuture};
use crate::registry::types::BootupRecord;

/// On-disk shape of `bootup.json`.
#[derive(Debug, Default, Serialize, Deserialize)]
struct BootupFile {
    #[serde(default)]
    records: Vec<BootupRecord>,
}

/// File-backed bootup store.
#[derive(Debug, Clone)]
pub struct JsonBootupStore {
    path: PathBuf,
}

impl JsonBootupStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read all records. A missing file is a fresh node with no records.
    pub async fn load(&self) -> Result<Vec<BootupRecord>, RegistryError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no bootup file, starting empty");
                return Ok(Vec::new());
            }
            Err(e) => {
                return Err(RegistryError::BootupLoad(format!(
                    "cannot read {}: {e}",
                    self.path.display()
                )));
            }
        };

        let file: BootupFile = serde_json::from_str(&raw).map_err(|e| {
            RegistryError::BootupLoad(format!("parse error in {}: {e}", self.path.display()))
        })?;
        Ok(file.records)
    }

    /// Replace the stored records. Written to a sibling temp file, then renamed.
    pub async fn save(&self, records: &[BootupRecord]) -> Result<(), RegistryError> {
        let file = BootupFile { records: records.to_vec() };
        let data = serde_json::to_string_pretty(&file)
            .map_err(|e| RegistryError::BootupSave(format!("serialise bootup records: {e}")))?;

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                RegistryError::BootupSave(format!("cannot create {}: {e}", parent.display()))
            })?;
        }

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, data)
            .await
            .map_err(|e| RegistryError::BootupSave(format!("cannot write {}: {e}", tmp.display())))?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(|e| {
            RegistryError::BootupSave(format!("cannot replace {}: {e}", self.path.display()))
        })?;

        info!(path = %self.path.display(), count = records.len(), "bootup records saved");
        Ok(())
    }
}

impl BootupSource for JsonBootupStore {
    fn fetch(&self) -> FetchFuture<'_> {
        Box::pin(self.load())
    }
}

/// Fixed list of records, returned in order on every fetch.
#[derive(Debug, Clone, Default)]
pub struct StaticBootupSource {
    records: Vec<BootupRecord>,
}

impl StaticBootupSource {
    pub fn new(records: Vec<BootupRecord>) -> Self {
        Self { records }
    }
}

impl BootupSource for StaticBootupSource {
    fn fetch(&self) -> FetchFuture<'_> {
        let records = self.records.clone();
        Box::pin(async move { Ok(records) })
    }
}
