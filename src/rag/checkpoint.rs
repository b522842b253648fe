// SPDX-License-Identifier: MIT

//! Checkpoint stores: last saved workflow state per conversation thread

use crate::adk::error::{RagError, Result};
use crate::rag::state::ConversationState;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

/// A persisted snapshot of one thread
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub thread_id: String,
    pub values: ConversationState,
    /// Number of completed runs on this thread
    pub step: u64,
    pub saved_at: DateTime<Utc>,
}

impl Checkpoint {
    /// Checkpoint following `previous` (or the first one for the thread)
    pub fn next(
        thread_id: impl Into<String>,
        values: ConversationState,
        previous: Option<&Checkpoint>,
    ) -> Self {
        Self {
            thread_id: thread_id.into(),
            values,
            step: previous.map_or(1, |p| p.step + 1),
            saved_at: Utc::now(),
        }
    }
}

/// Persistence for workflow state keyed by thread id
///
/// Implementations own their consistency guarantees; the workflow adds no
/// locking on top.
#[async_trait]
pub trait Checkpointer: Send + Sync {
    async fn get(&self, thread_id: &str) -> Result<Option<Checkpoint>>;

    async fn put(&self, checkpoint: Checkpoint) -> Result<()>;

    /// Values of the last checkpoint, if any
    async fn get_state(&self, thread_id: &str) -> Result<Option<ConversationState>> {
        Ok(self.get(thread_id).await?.map(|c| c.values))
    }
}

/// Process-local store, lost on exit
#[derive(Default)]
pub struct MemoryCheckpointer {
    threads: RwLock<HashMap<String, Checkpoint>>,
}

impl MemoryCheckpointer {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.threads.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.threads.read().await.is_empty()
    }
}

#[async_trait]
impl Checkpointer for MemoryCheckpointer {
    async fn get(&self, thread_id: &str) -> Result<Option<Checkpoint>> {
        Ok(self.threads.read().await.get(thread_id).cloned())
    }

    async fn put(&self, checkpoint: Checkpoint) -> Result<()> {
        let mut threads = self.threads.write().await;
        threads.insert(checkpoint.thread_id.clone(), checkpoint);
        Ok(())
    }
}

/// One pretty-printed JSON file per thread inside a directory
pub struct FileCheckpointer {
    dir: PathBuf,
}

impl FileCheckpointer {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, thread_id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", sanitize_thread_id(thread_id)))
    }
}

/// Map a thread id onto a safe file stem
fn sanitize_thread_id(thread_id: &str) -> String {
    let stem: String = thread_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if stem.is_empty() {
        "_".to_string()
    } else {
        stem
    }
}

#[async_trait]
impl Checkpointer for FileCheckpointer {
    async fn get(&self, thread_id: &str) -> Result<Option<Checkpoint>> {
        let path = self.path_for(thread_id);
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let checkpoint: Checkpoint = serde_json::from_str(&raw).map_err(|e| {
            RagError::Checkpoint(format!("corrupt checkpoint {}: {}", path.display(), e))
        })?;
        // Sanitizing can collide; never hand one thread another's state
        if checkpoint.thread_id != thread_id {
            log::warn!(
                "Checkpoint {} belongs to thread '{}', not '{}'",
                path.display(),
                checkpoint.thread_id,
                thread_id
            );
            return Ok(None);
        }
        Ok(Some(checkpoint))
    }

    async fn put(&self, checkpoint: Checkpoint) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.path_for(&checkpoint.thread_id);
        let tmp = path.with_extension("json.tmp");
        let body = serde_json::to_string_pretty(&checkpoint)?;
        tokio::fs::write(&tmp, body).await?;
        tokio::fs::rename(&tmp, &path).await?;
        log::debug!(
            "Saved checkpoint step {} for thread '{}' to {}",
            checkpoint.step,
            checkpoint.thread_id,
            path.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::state::Document;

    fn state(question: &str) -> ConversationState {
        ConversationState::new(question)
            .with_docs(vec![Document::new("d1"), Document::new("d2")])
            .with_answer("a")
    }

    #[test]
    fn test_checkpoint_step_increments() {
        let first = Checkpoint::next("t", state("q1"), None);
        let second = Checkpoint::next("t", state("q2"), Some(&first));
        assert_eq!(first.step, 1);
        assert_eq!(second.step, 2);
    }

    #[test]
    fn test_sanitize_thread_id() {
        assert_eq!(sanitize_thread_id("user-1_a"), "user-1_a");
        assert_eq!(sanitize_thread_id("../etc/passwd"), "___etc_passwd");
        assert_eq!(sanitize_thread_id(""), "_");
    }

    #[tokio::test]
    async fn test_memory_checkpointer() {
        let store = MemoryCheckpointer::new();
        assert!(store.get_state("t").await.unwrap().is_none());

        store
            .put(Checkpoint::next("t", state("q"), None))
            .await
            .unwrap();

        let restored = store.get_state("t").await.unwrap().unwrap();
        assert_eq!(restored, state("q"));
        assert_eq!(store.len().await, 1);
        assert!(store.get("other").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_file_checkpointer_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCheckpointer::new(dir.path().join("threads"));

        assert!(store.get("t/1").await.unwrap().is_none());

        let checkpoint = Checkpoint::next("t/1", state("q"), None);
        store.put(checkpoint.clone()).await.unwrap();

        assert!(dir.path().join("threads").join("t_1.json").exists());
        let restored = store.get("t/1").await.unwrap().unwrap();
        assert_eq!(restored, checkpoint);
    }

    #[tokio::test]
    async fn test_file_checkpointer_colliding_ids_stay_separate() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCheckpointer::new(dir.path());

        store
            .put(Checkpoint::next("a/b", state("q"), None))
            .await
            .unwrap();
        assert!(store.get("a_b").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_file_checkpointer_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("t.json"), "not json").unwrap();
        let store = FileCheckpointer::new(dir.path());

        let err = store.get("t").await.unwrap_err();
        assert!(matches!(err, RagError::Checkpoint(_)));
    }
}
