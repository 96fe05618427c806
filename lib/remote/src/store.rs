//! JSON-file workflow store.
//!
//! Each workflow is one pretty-printed JSON document named after the
//! workflow, e.g. `onboarding.json`. Bytes outside `[A-Za-z0-9-]` are written
//! as `_XX` hex escapes, so distinct names never share a file. Writes go to a
//! temporary file that is renamed into place, so readers never see a partial
//! document.

use async_trait::async_trait;
use flowdeck_workflow::store::ensure_valid;
use flowdeck_workflow::{StoreError, Workflow, WorkflowStore, WorkflowSummary};
use rootcause::prelude::Report;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

const EXTENSION: &str = "json";

/// Stores workflows as JSON files in one directory.
#[derive(Debug, Clone)]
pub struct FileWorkflowStore {
    directory: PathBuf,
}

impl FileWorkflowStore {
    /// Creates a store rooted at `directory`. The directory is created on
    /// first save.
    #[must_use]
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Returns the document path for a workflow name.
    #[must_use]
    pub fn path_for(&self, name: &str) -> PathBuf {
        let mut stem = String::with_capacity(name.len());
        for byte in name.bytes() {
            if byte.is_ascii_alphanumeric() || byte == b'-' {
                stem.push(char::from(byte));
            } else {
                stem.push_str(&format!("_{byte:02X}"));
            }
        }
        self.directory.join(format!("{stem}.{EXTENSION}"))
    }

    async fn read_document(&self, name: &str, path: &Path) -> Result<Workflow, StoreError> {
        let contents = tokio::fs::read(path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => StoreError::NotFound {
                name: name.to_string(),
            },
            _ => StoreError::Io {
                name: name.to_string(),
                details: e.to_string(),
            },
        })?;
        let workflow: Workflow =
            serde_json::from_slice(&contents).map_err(|e| StoreError::Serialization {
                name: name.to_string(),
                details: e.to_string(),
            })?;
        workflow.validate().map_err(|e| StoreError::InvalidGraph {
            name: name.to_string(),
            details: e.to_string(),
        })?;
        Ok(workflow)
    }
}

#[async_trait]
impl WorkflowStore for FileWorkflowStore {
    #[instrument(skip(self))]
    async fn load(&self, name: &str) -> Result<Workflow, Report<StoreError>> {
        let workflow = self.read_document(name, &self.path_for(name)).await?;
        if workflow.name() != name {
            return Err(StoreError::NameMismatch {
                name: name.to_string(),
                found: workflow.name().to_string(),
            }
            .into());
        }
        debug!(nodes = workflow.graph.node_count(), "loaded workflow");
        Ok(workflow)
    }

    #[instrument(skip(self, workflow), fields(name = %workflow.name()))]
    async fn save(&self, workflow: &Workflow) -> Result<(), Report<StoreError>> {
        ensure_valid(workflow)?;
        let name = workflow.name();
        let io_error = |e: std::io::Error| StoreError::Io {
            name: name.to_string(),
            details: e.to_string(),
        };

        let contents =
            serde_json::to_vec_pretty(workflow).map_err(|e| StoreError::Serialization {
                name: name.to_string(),
                details: e.to_string(),
            })?;

        tokio::fs::create_dir_all(&self.directory)
            .await
            .map_err(io_error)?;
        let path = self.path_for(name);
        let staging = path.with_extension(format!("{EXTENSION}.tmp"));
        tokio::fs::write(&staging, &contents)
            .await
            .map_err(io_error)?;
        tokio::fs::rename(&staging, &path)
            .await
            .map_err(io_error)?;

        info!(path = %path.display(), nodes = workflow.graph.node_count(), "saved workflow");
        Ok(())
    }

    async fn list(&self) -> Result<Vec<WorkflowSummary>, Report<StoreError>> {
        let io_error = |e: std::io::Error| StoreError::Io {
            name: self.directory.display().to_string(),
            details: e.to_string(),
        };

        let mut entries = match tokio::fs::read_dir(&self.directory).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_error(e).into()),
        };

        let mut summaries = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(io_error)? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            let label = path.display().to_string();
            match self.read_document(&label, &path).await {
                Ok(workflow) => summaries.push(WorkflowSummary::from(&workflow)),
                Err(err) => warn!(error = %err, "skipping unreadable workflow document"),
            }
        }
        summaries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(summaries)
    }

    #[instrument(skip(self))]
    async fn delete(&self, name: &str) -> Result<(), Report<StoreError>> {
        tokio::fs::remove_file(self.path_for(name))
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => StoreError::NotFound {
                    name: name.to_string(),
                },
                _ => StoreError::Io {
                    name: name.to_string(),
                    details: e.to_string(),
                },
            })?;
        Ok(())
    }
}
