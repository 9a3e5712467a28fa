//! Upload directory convention.
//!
//! Each upload is stored as `{stem}_{timestamp}_{uid}{ext}`. The uid is a v4
//! UUID handed back to the uploader; everything about the job (original name,
//! upload time, artifact location) is recovered from that file name later.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use serde::Serialize;
use uuid::Uuid;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H-%M-%S";

/// An upload recovered from its stored file name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadRecord {
    pub uid: String,
    /// Sanitized name the file was uploaded as
    pub original_name: String,
    /// Upload time, `YYYY-MM-DDTHH-MM-SS` local time
    pub timestamp: String,
    /// Where the deck is stored
    pub path: PathBuf,
}

/// Strip directories and replace anything outside `[A-Za-z0-9._-]`.
///
/// Returns `None` when nothing usable is left.
pub fn sanitize_file_name(name: &str) -> Option<String> {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.').to_string();

    let has_stem = Path::new(&cleaned)
        .file_stem()
        .is_some_and(|s| !s.is_empty());
    has_stem.then_some(cleaned)
}

/// Stored name for an upload.
pub fn unique_file_name(original: &str, uploaded_at: DateTime<Local>, uid: Uuid) -> String {
    let path = Path::new(original);
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("upload");
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{e}"))
        .unwrap_or_default();
    format!(
        "{stem}_{}_{uid}{ext}",
        uploaded_at.format(TIMESTAMP_FORMAT)
    )
}

/// Recover an upload record from a stored path.
pub fn parse_stored_path(path: &Path) -> Option<UploadRecord> {
    let stem = path.file_stem()?.to_str()?;
    let mut parts = stem.rsplitn(3, '_');
    let uid = parts.next()?;
    let timestamp = parts.next()?;
    let original_stem = parts.next()?;

    Uuid::parse_str(uid).ok()?;

    let original_name = match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{original_stem}.{ext}"),
        None => original_stem.to_string(),
    };

    Some(UploadRecord {
        uid: uid.to_string(),
        original_name,
        timestamp: timestamp.to_string(),
        path: path.to_path_buf(),
    })
}

/// Directory holding uploaded decks.
#[derive(Debug, Clone)]
pub struct UploadDir {
    root: PathBuf,
}

impl UploadDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Save an upload under a fresh uid.
    ///
    /// `original_name` must already be sanitized.
    pub fn store(&self, original_name: &str, bytes: &[u8]) -> Result<UploadRecord> {
        std::fs::create_dir_all(&self.root).context("Failed to create uploads directory")?;

        let uid = Uuid::new_v4();
        let path = self
            .root
            .join(unique_file_name(original_name, Local::now(), uid));
        std::fs::write(&path, bytes)
            .with_context(|| format!("Failed to save upload {}", path.display()))?;

        tracing::debug!(path = %path.display(), size = bytes.len(), "Stored upload");

        parse_stored_path(&path).context("Stored upload name could not be parsed back")
    }

    /// Find the upload for `uid`.
    pub fn find(&self, uid: &str) -> Result<Option<UploadRecord>> {
        if Uuid::parse_str(uid).is_err() {
            return Ok(None);
        }

        let entries = match std::fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e).context("Failed to list uploads"),
        };

        for entry in entries {
            let path = entry.context("Failed to read uploads entry")?.path();
            if let Some(record) = parse_stored_path(&path) {
                if record.uid == uid {
                    return Ok(Some(record));
                }
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("talk.pptx").as_deref(), Some("talk.pptx"));
        assert_eq!(
            sanitize_file_name("../../etc/my deck (v2).pptx").as_deref(),
            Some("my_deck__v2_.pptx")
        );
        assert_eq!(
            sanitize_file_name(r"C:\Users\me\slides.pdf").as_deref(),
            Some("slides.pdf")
        );
        assert_eq!(sanitize_file_name("..."), None);
        assert_eq!(sanitize_file_name(""), None);
    }

    #[test]
    fn test_unique_name_round_trips() {
        let uid = Uuid::new_v4();
        let at = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();

        let name = unique_file_name("my_talk.v2.pptx", at, uid);
        assert_eq!(name, format!("my_talk.v2_2024-03-09T14-05-07_{uid}.pptx"));

        let record = parse_stored_path(&PathBuf::from("/uploads").join(&name)).unwrap();
        assert_eq!(record.uid, uid.to_string());
        assert_eq!(record.original_name, "my_talk.v2.pptx");
        assert_eq!(record.timestamp, "2024-03-09T14-05-07");
    }

    #[test]
    fn test_parse_rejects_foreign_files() {
        assert!(parse_stored_path(Path::new("/uploads/readme.txt")).is_none());
        assert!(parse_stored_path(Path::new("/uploads/a_b_not-a-uuid.pptx")).is_none());
    }

    #[test]
    fn test_store_and_find() {
        let temp_dir = tempfile::tempdir().unwrap();
        let uploads = UploadDir::new(temp_dir.path().join("uploads"));

        let record = uploads.store("deck.pptx", b"bytes").unwrap();

        assert!(record.path.starts_with(uploads.root()));
        assert_eq!(std::fs::read(&record.path).unwrap(), b"bytes");
        assert_eq!(record.original_name, "deck.pptx");
        assert_eq!(uploads.find(&record.uid).unwrap(), Some(record));
    }

    #[test]
    fn test_find_unknown_uid() {
        let temp_dir = tempfile::tempdir().unwrap();
        let uploads = UploadDir::new(temp_dir.path());
        uploads.store("deck.pptx", b"bytes").unwrap();

        assert_eq!(uploads.find(&Uuid::new_v4().to_string()).unwrap(), None);
        assert_eq!(uploads.find("deck").unwrap(), None);
    }

    #[test]
    fn test_find_in_missing_dir() {
        let uploads = UploadDir::new("/nonexistent/uploads");
        assert_eq!(uploads.find(&Uuid::new_v4().to_string()).unwrap(), None);
    }
}
