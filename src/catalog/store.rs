use std::{
    path::{Path, PathBuf},
    sync::atomic::{AtomicU64, Ordering},
    time::{SystemTime, UNIX_EPOCH},
};

use crate::{
    catalog::model::{Collection, Minifig, SelectedPart},
    foundation::error::{FigError, FigResult},
};

/// Result of a persistence write.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SaveOutcome {
    /// Whether the write happened.
    pub success: bool,
    /// Id of the written collection, if any.
    pub id: Option<String>,
    /// Failure reason, or an informational note on success.
    pub message: Option<String>,
}

impl SaveOutcome {
    fn ok(id: Option<String>, message: impl Into<String>) -> Self {
        Self {
            success: true,
            id,
            message: Some(message.into()),
        }
    }

    fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            id: None,
            message: Some(message.into()),
        }
    }
}

/// Persistence for saved compositions.
///
/// Writes report failures through [`SaveOutcome`] rather than errors; they never touch the
/// in-memory composition.
pub trait CollectionStore {
    /// Save the current selection under `title`.
    fn save(&self, title: &str, parts: &[SelectedPart], minifigs: &[Minifig]) -> SaveOutcome;

    /// Load a collection by id.
    fn load(&self, id: &str) -> FigResult<Option<Collection>>;

    /// All collections, newest first.
    fn list(&self) -> FigResult<Vec<Collection>>;

    /// Delete a collection by id.
    fn delete(&self, id: &str) -> SaveOutcome;
}

/// One pretty-printed JSON file per collection inside a directory.
#[derive(Debug)]
pub struct JsonCollectionStore {
    dir: PathBuf,
    seq: AtomicU64,
}

impl JsonCollectionStore {
    /// Store rooted at `dir`; the directory is created on first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            seq: AtomicU64::new(0),
        }
    }

    /// Directory holding the collection files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &str) -> FigResult<PathBuf> {
        if id.is_empty() || !id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(FigError::validation(format!("invalid collection id '{id}'")));
        }
        Ok(self.dir.join(format!("{id}.json")))
    }

    fn next_id(&self, now_ms: u64) -> String {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        format!("col-{now_ms:x}-{seq}")
    }

    fn write(&self, collection: &Collection) -> FigResult<PathBuf> {
        std::fs::create_dir_all(&self.dir).map_err(|e| {
            FigError::persistence(format!(
                "create collection dir '{}': {e}",
                self.dir.display()
            ))
        })?;
        let path = self.path_for(&collection.id)?;
        let json = serde_json::to_vec_pretty(collection).map_err(|e| {
            FigError::serde(format!("serialize collection '{}': {e}", collection.id))
        })?;
        std::fs::write(&path, json).map_err(|e| {
            FigError::persistence(format!("write collection '{}': {e}", path.display()))
        })?;
        Ok(path)
    }
}

fn read_collection(path: &Path) -> FigResult<Collection> {
    let bytes = std::fs::read(path).map_err(|e| {
        FigError::persistence(format!("read collection '{}': {e}", path.display()))
    })?;
    serde_json::from_slice(&bytes)
        .map_err(|e| FigError::serde(format!("parse collection '{}': {e}", path.display())))
}

impl CollectionStore for JsonCollectionStore {
    #[tracing::instrument(skip(self, parts, minifigs), fields(count = parts.len()))]
    fn save(&self, title: &str, parts: &[SelectedPart], minifigs: &[Minifig]) -> SaveOutcome {
        let title = title.trim();
        if title.is_empty() {
            return SaveOutcome::failed("collection title must be non-empty");
        }

        let now = now_ms();
        let collection = Collection {
            id: self.next_id(now),
            title: title.to_string(),
            source_minifigs: minifigs.to_vec(),
            parts: parts.to_vec(),
            created_at_ms: now,
            updated_at_ms: now,
        };
        match self.write(&collection) {
            Ok(path) => SaveOutcome::ok(
                Some(collection.id),
                format!("saved locally to {}", path.display()),
            ),
            Err(err) => {
                tracing::warn!(error = %err, "saving collection failed");
                SaveOutcome::failed(format!("failed to save collection: {err}"))
            }
        }
    }

    fn load(&self, id: &str) -> FigResult<Option<Collection>> {
        let path = self.path_for(id)?;
        if !path.is_file() {
            return Ok(None);
        }
        read_collection(&path).map(Some)
    }

    fn list(&self) -> FigResult<Vec<Collection>> {
        let Ok(rd) = std::fs::read_dir(&self.dir) else {
            return Ok(Vec::new());
        };

        let mut out = Vec::new();
        for entry in rd.flatten() {
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }
            match read_collection(&path) {
                Ok(c) => out.push(c),
                Err(err) => tracing::warn!(error = %err, "skipping unreadable collection"),
            }
        }
        out.sort_by(|a, b| {
            b.created_at_ms
                .cmp(&a.created_at_ms)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(out)
    }

    fn delete(&self, id: &str) -> SaveOutcome {
        let path = match self.path_for(id) {
            Ok(p) => p,
            Err(err) => return SaveOutcome::failed(err.to_string()),
        };
        if !path.is_file() {
            return SaveOutcome::failed("collection not found");
        }
        match std::fs::remove_file(&path) {
            Ok(()) => SaveOutcome::ok(Some(id.to_string()), "deleted"),
            Err(e) => SaveOutcome::failed(format!("failed to delete collection: {e}")),
        }
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
#[path = "../../tests/unit/catalog/store.rs"]
mod tests;
