//! Result store for finished explanation jobs.
//!
//! The artifact for a deck lives at a path derived from the deck's own path:
//! same file stem, `.json` extension, either next to the deck or inside a
//! dedicated output directory. Existence of that file is the only job state
//! anyone can observe; a job is "done" exactly when its artifact exists.
//!
//! Writes go to a temporary file in the target directory followed by a
//! rename, so a reader never sees a partially written artifact.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::jobs::JobOutcome;

pub const ARTIFACT_EXTENSION: &str = "json";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Source path has no file name: {0}")]
    InvalidSource(PathBuf),

    #[error("Failed to write artifact {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read artifact {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Artifact {path} is not valid: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Lifecycle of a job as seen from the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum JobStatus {
    /// No artifact yet
    Pending,
    /// Artifact written
    Done { outcome: JobOutcome },
}

impl JobStatus {
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done { .. })
    }
}

/// Where artifacts are written relative to their source decks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultStore {
    output_dir: Option<PathBuf>,
}

impl ResultStore {
    /// Store artifacts next to their source deck.
    pub fn alongside() -> Self {
        Self { output_dir: None }
    }

    /// Store artifacts in `dir`, keyed by the source deck's file stem.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: Some(dir.into()),
        }
    }

    /// Artifact path for a source deck.
    pub fn artifact_path(&self, source: &Path) -> StoreResult<PathBuf> {
        let stem = source
            .file_stem()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| StoreError::InvalidSource(source.to_path_buf()))?;

        let mut file_name = stem.to_os_string();
        file_name.push(".");
        file_name.push(ARTIFACT_EXTENSION);

        let dir = match &self.output_dir {
            Some(dir) => dir.clone(),
            None => source.parent().map(Path::to_path_buf).unwrap_or_default(),
        };
        Ok(dir.join(file_name))
    }

    /// Write the whole outcome, replacing any earlier artifact.
    pub fn persist(&self, source: &Path, outcome: &JobOutcome) -> StoreResult<PathBuf> {
        let path = self.artifact_path(source)?;
        let write_err = |source: std::io::Error| StoreError::Write {
            path: path.clone(),
            source,
        };

        let json = serde_json::to_vec_pretty(outcome).map_err(|e| write_err(e.into()))?;

        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir).map_err(write_err)?;

        let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(write_err)?;
        tmp.write_all(&json).map_err(write_err)?;
        tmp.as_file().sync_all().map_err(write_err)?;
        tmp.persist(&path).map_err(|e| write_err(e.error))?;

        tracing::info!(
            artifact = %path.display(),
            entries = outcome.len(),
            failed = outcome.failed_count(),
            "Saved explanations"
        );
        Ok(path)
    }

    /// Whether the artifact for `source` has been written.
    pub fn exists(&self, source: &Path) -> bool {
        self.artifact_path(source)
            .map(|p| p.is_file())
            .unwrap_or(false)
    }

    /// Read a previously persisted outcome.
    pub fn read(&self, source: &Path) -> StoreResult<JobOutcome> {
        let path = self.artifact_path(source)?;
        let bytes = std::fs::read(&path).map_err(|source| StoreError::Read {
            path: path.clone(),
            source,
        })?;
        serde_json::from_slice(&bytes).map_err(|source| StoreError::Corrupt { path, source })
    }

    /// Pending until the artifact exists, then done with its contents.
    pub fn status(&self, source: &Path) -> StoreResult<JobStatus> {
        if !self.exists(source) {
            return Ok(JobStatus::Pending);
        }
        Ok(JobStatus::Done {
            outcome: self.read(source)?,
        })
    }
}
