use std::fs;
use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::{Result, ThoughtChainError};
use crate::models::ThoughtRecord;

/// Repository trait for thought storage operations
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ThoughtRepository: Send + Sync {
    /// Durably replace the stored record for its id
    async fn save_thought(&self, thought: &ThoughtRecord) -> Result<()>;

    /// Get a thought by id; `None` when no record exists for the id
    async fn get_thought(&self, thought_id: &str) -> Result<Option<ThoughtRecord>>;

    /// All known thought ids, unordered; callers sort by recency
    async fn list_thought_ids(&self) -> Result<Vec<String>>;
}

/// File-backed implementation storing one `<id>.json` document per thought.
/// Writes go to a temp file first and are renamed into place, so a reader
/// never observes a half-written record.
pub struct FileThoughtRepository {
    root: PathBuf,
}

impl FileThoughtRepository {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.exists() {
            fs::create_dir_all(&root)?;
        }
        if !root.is_dir() {
            return Err(ThoughtChainError::validation(
                "storage.root_path",
                format!("not a directory: {}", root.display()),
            ));
        }
        tracing::info!("Thought store opened at {}", root.display());
        Ok(Self { root })
    }

    fn thought_path(&self, thought_id: &str) -> PathBuf {
        self.root.join(format!("{}.json", thought_id))
    }
}

#[async_trait]
impl ThoughtRepository for FileThoughtRepository {
    async fn save_thought(&self, thought: &ThoughtRecord) -> Result<()> {
        thought.validate()?;
        let path = self.thought_path(&thought.id);
        let tmp = path.with_extension("json.tmp");
        let body = serde_json::to_string_pretty(thought)?;
        fs::write(&tmp, body)?;
        if let Err(err) = fs::rename(&tmp, &path) {
            let _ = fs::remove_file(&tmp);
            return Err(err.into());
        }
        tracing::debug!("Persisted thought {}", thought.id);
        Ok(())
    }

    async fn get_thought(&self, thought_id: &str) -> Result<Option<ThoughtRecord>> {
        let path = self.thought_path(thought_id);
        let body = match fs::read_to_string(&path) {
            Ok(body) => body,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let record: ThoughtRecord = serde_json::from_str(&body)?;
        record.validate()?;
        Ok(Some(record))
    }

    async fn list_thought_ids(&self) -> Result<Vec<String>> {
        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if stem.starts_with('.') {
                    continue;
                }
                ids.push(stem.to_string());
            }
        }
        Ok(ids)
    }
}
