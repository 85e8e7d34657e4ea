use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::info;
use serde::{Deserialize, Serialize};

use crate::config;
use crate::error::ScalperError;
use crate::pacing::Pacing;

/// Record of a single search operation. All fields are required on disk;
/// a document missing any of them is corrupt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRecord {
    pub search_str: String,
    pub datetime: String,
    pub file_name: String,
    pub amount: u64,
}

impl SearchRecord {
    pub fn now(search_str: &str, file_name: &str, amount: u64) -> Self {
        SearchRecord {
            search_str: search_str.to_string(),
            datetime: chrono::Local::now()
                .format("%Y-%m-%dT%H:%M:%S%.6f")
                .to_string(),
            file_name: file_name.to_string(),
            amount,
        }
    }
}

/// Ordered list of search records for one resource kind. Append-only,
/// insertion order is chronological order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchHistory {
    pub search: Vec<SearchRecord>,
}

/// Top-level persisted structure. `kernels` is the established on-disk
/// format and stays required; histories for kinds added later must carry
/// #[serde(default)] so files written before the kind existed keep loading.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Memory {
    pub kernels: SearchHistory,
}

impl Memory {
    pub fn append(&mut self, kind: ResourceKind, record: SearchRecord) {
        self.history_mut(kind).search.push(record);
    }

    pub fn history(&self, kind: ResourceKind) -> &SearchHistory {
        match kind {
            ResourceKind::Kernels => &self.kernels,
        }
    }

    fn history_mut(&mut self, kind: ResourceKind) -> &mut SearchHistory {
        match kind {
            ResourceKind::Kernels => &mut self.kernels,
        }
    }

    /// Structural checks beyond what deserialization enforces.
    fn validate(&self) -> Result<(), String> {
        for (i, record) in self.kernels.search.iter().enumerate() {
            if record.search_str.is_empty() {
                return Err(format!("kernels.search[{}] has an empty search_str", i));
            }
        }
        Ok(())
    }
}

/// Searchable resource kinds. Owns the per-kind file-name stem and pacing
/// interval so adding a kind is a matter of extending this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Kernels,
}

impl ResourceKind {
    pub fn label(&self) -> &'static str {
        match self {
            ResourceKind::Kernels => "kernels",
        }
    }

    pub fn pacing(&self) -> Pacing {
        match self {
            ResourceKind::Kernels => {
                Pacing::new(Duration::from_millis(500), Duration::from_millis(1500))
            }
        }
    }
}

/// Loads and persists the search history at `<out_dir>/memory.json`.
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    pub fn new<P: AsRef<Path>>(out_dir: P) -> Self {
        HistoryStore {
            path: out_dir.as_ref().join(config::MEMORY_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the history, bootstrapping a fresh one when the file is missing
    /// or empty. A non-empty file that fails to parse or validate is fatal.
    pub fn load(&self) -> Result<Memory, ScalperError> {
        if !self.path.exists() {
            let memory = Memory::default();
            self.persist(&memory)?;
            info!("Created new memory JSON");
            return Ok(memory);
        }

        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            let memory = Memory::default();
            self.persist(&memory)?;
            info!("Memory file was empty, created new memory JSON");
            return Ok(memory);
        }

        let memory: Memory =
            serde_json::from_str(&content).map_err(|e| ScalperError::CorruptHistory {
                path: self.path.clone(),
                reason: e.to_string(),
            })?;
        memory
            .validate()
            .map_err(|reason| ScalperError::CorruptHistory {
                path: self.path.clone(),
                reason,
            })?;
        Ok(memory)
    }

    /// Write the full memory back, pretty-printed, replacing prior content.
    pub fn persist(&self, memory: &Memory) -> Result<(), ScalperError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(memory)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}
