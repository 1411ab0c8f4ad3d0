//! Model loader
//!
//! Reads a decision model document from disk and publishes it as an
//! immutable [`ModelSnapshot`]. Evaluations hold an `Arc` to the snapshot they
//! started with, so a reload never changes a table under a running
//! evaluation.
//!
//! [`ModelLoader::snapshot`] re-reads the document when its modification time
//! or the configured path changes. A new generation is published only when
//! the content hash differs from the current snapshot.

use crate::alias::AliasTable;
use crate::error::{Error, Result};
use crate::table::DecisionModel;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::SystemTime;
use tracing::{debug, info};

/// An immutable, versioned decision model
#[derive(Debug)]
pub struct ModelSnapshot {
    /// Increases by one with every published snapshot
    pub generation: u64,
    pub loaded_at: DateTime<Utc>,
    /// SHA256 of the document, hex encoded
    pub content_hash: String,
    pub path: PathBuf,
    pub model: DecisionModel,
}

impl ModelSnapshot {
    /// Read and compile a model document
    pub fn read(path: &Path, aliases: Arc<AliasTable>, generation: u64) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|e| Error::loader(path, e))?;
        let content_hash = compute_hash(&bytes);
        let text = std::str::from_utf8(&bytes).map_err(|e| Error::loader(path, e))?;
        let model = DecisionModel::from_json(text, aliases).map_err(|e| Error::loader(path, e))?;

        Ok(Self {
            generation,
            loaded_at: Utc::now(),
            content_hash,
            path: path.to_path_buf(),
            model,
        })
    }
}

#[derive(Debug)]
struct Published {
    snapshot: Arc<ModelSnapshot>,
    mtime: Option<SystemTime>,
}

#[derive(Debug)]
struct LoaderState {
    path: PathBuf,
    published: Option<Published>,
}

/// Publishes snapshots of a model document, reloading it when it changes
#[derive(Debug)]
pub struct ModelLoader {
    aliases: Arc<AliasTable>,
    state: RwLock<LoaderState>,
}

impl ModelLoader {
    pub fn new(path: impl Into<PathBuf>, aliases: Arc<AliasTable>) -> Self {
        Self {
            aliases,
            state: RwLock::new(LoaderState {
                path: path.into(),
                published: None,
            }),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .path
            .clone()
    }

    /// Point the loader at another document; the next snapshot reads it
    pub fn set_path(&self, path: impl Into<PathBuf>) {
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .path = path.into();
    }

    /// Last published snapshot, without checking the document
    pub fn current(&self) -> Option<Arc<ModelSnapshot>> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .published
            .as_ref()
            .map(|p| p.snapshot.clone())
    }

    /// Current snapshot, reloading the document first if it changed
    pub fn snapshot(&self) -> Result<Arc<ModelSnapshot>> {
        {
            let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(published) = fresh(&state) {
                return Ok(published.snapshot.clone());
            }
        }

        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        // another caller may have reloaded while we waited
        if let Some(published) = fresh(&state) {
            return Ok(published.snapshot.clone());
        }
        self.publish(&mut state)
    }

    /// Re-read the document unconditionally
    pub fn reload(&self) -> Result<Arc<ModelSnapshot>> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        self.publish(&mut state)
    }

    fn publish(&self, state: &mut LoaderState) -> Result<Arc<ModelSnapshot>> {
        let mtime = modified(&state.path);
        let generation = state
            .published
            .as_ref()
            .map_or(1, |p| p.snapshot.generation + 1);
        let snapshot = ModelSnapshot::read(&state.path, self.aliases.clone(), generation)?;

        if let Some(published) = state.published.as_mut() {
            let current = &published.snapshot;
            if current.path == snapshot.path && current.content_hash == snapshot.content_hash {
                debug!(path = %state.path.display(), "model unchanged");
                published.mtime = mtime;
                return Ok(current.clone());
            }
        }

        info!(
            path = %snapshot.path.display(),
            generation = snapshot.generation,
            hash = %&snapshot.content_hash[..12],
            tables = snapshot.model.tables().len(),
            "model snapshot published"
        );

        let snapshot = Arc::new(snapshot);
        state.published = Some(Published {
            snapshot: snapshot.clone(),
            mtime,
        });
        Ok(snapshot)
    }
}

/// The published snapshot, if it still reflects the document on disk
fn fresh(state: &LoaderState) -> Option<&Published> {
    let published = state.published.as_ref()?;
    if published.snapshot.path != state.path {
        return None;
    }
    // a document that cannot be stat'ed keeps serving the last snapshot
    match (published.mtime, modified(&state.path)) {
        (Some(seen), Some(now)) if seen != now => None,
        _ => Some(published),
    }
}

fn modified(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

fn compute_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}
