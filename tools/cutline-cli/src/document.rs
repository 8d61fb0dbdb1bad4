//! The edit document: a JSON file holding a source description and the
//! operations committed against it.

use std::path::Path;

use serde::{Deserialize, Serialize};

use cutline_project_model::log::OperationLog;
use cutline_project_model::operation::{EditError, Operation, OperationId};
use cutline_project_model::source::VideoSource;

/// Current document format version.
pub const DOCUMENT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditDocument {
    pub version: u32,
    pub source: VideoSource,
    #[serde(default)]
    pub operations: Vec<Operation>,
}

/// An operation that failed validation during replay.
#[derive(Debug, Clone)]
pub struct InvalidEntry {
    pub index: usize,
    pub id: OperationId,
    pub error: EditError,
}

impl EditDocument {
    pub fn new(source: VideoSource) -> Self {
        Self {
            version: DOCUMENT_VERSION,
            source,
            operations: Vec::new(),
        }
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read {}: {e}", path.display()))?;
        let doc: Self = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse {}: {e}", path.display()))?;
        if doc.version > DOCUMENT_VERSION {
            anyhow::bail!(
                "Document version {} is newer than supported version {DOCUMENT_VERSION}",
                doc.version
            );
        }
        Ok(doc)
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Replay the operations into a log. Fails on the first invalid one.
    pub fn to_log(&self) -> Result<OperationLog, EditError> {
        OperationLog::from_operations(self.operations.iter().cloned())
    }

    /// Every operation that would be rejected on commit against this source.
    pub fn invalid_entries(&self) -> Vec<InvalidEntry> {
        self.operations
            .iter()
            .enumerate()
            .filter_map(|(index, op)| {
                let checked = op.edit.validate_within(self.source.duration_secs);
                checked.err().map(|error| InvalidEntry {
                    index,
                    id: op.id,
                    error,
                })
            })
            .collect()
    }
}
