//! Session-oriented backend abstraction
//!
//! Counterpart of the SQL data-source layer for backends that expose a
//! unit-of-work session instead of statement execution. The session backend
//! itself is an external collaborator; this module defines the seam plus an
//! embedded in-memory implementation configured from a flat properties table.

use crate::errors::StoreError;
use async_trait::async_trait;
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Property selecting the entry capacity of the embedded session source.
pub const CAPACITY_PROPERTY: &str = "store.capacity";

/// Provider of backend sessions; safe for concurrent `open_session` calls.
#[async_trait]
pub trait SessionSource: Send + Sync + 'static {
    /// Downcasting hook used to verify wiring in integration tests.
    fn as_any(&self) -> &dyn Any;

    /// Open a fresh unit-of-work session.
    async fn open_session(&self) -> Result<Box<dyn Session>, StoreError>;
}

/// Unit-of-work over blob entries.
///
/// Mutations are staged until [`commit`](Session::commit); a dropped or
/// rolled-back session leaves the backend untouched.
#[async_trait]
pub trait Session: Send {
    async fn get(&mut self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError>;

    async fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), StoreError>;

    /// Stage a removal; returns whether the key was visible to this session.
    async fn remove(&mut self, key: &[u8]) -> Result<bool, StoreError>;

    async fn commit(self: Box<Self>) -> Result<(), StoreError>;

    async fn rollback(self: Box<Self>) -> Result<(), StoreError>;
}

/// Embedded in-memory session source.
///
/// Stands in for an external session backend during development and tests,
/// the way an in-memory engine stands in for a database server. Configured
/// through string properties so it can be selected from a transmittable
/// factory.
pub struct LocalSessionSource {
    entries: Arc<RwLock<HashMap<Vec<u8>, Vec<u8>>>>,
    capacity: Option<usize>,
}

impl LocalSessionSource {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            capacity: None,
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            capacity: Some(capacity),
        }
    }

    /// Build from a flat properties table; unknown keys are ignored the way
    /// a session backend ignores properties addressed to other components.
    pub fn from_properties(properties: &HashMap<String, String>) -> Result<Self, StoreError> {
        let capacity = match properties.get(CAPACITY_PROPERTY) {
            Some(raw) => Some(raw.parse::<usize>().map_err(|_| {
                StoreError::Configuration(format!(
                    "Invalid value '{}' for property '{}'",
                    raw, CAPACITY_PROPERTY
                ))
            })?),
            None => None,
        };

        Ok(Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            capacity,
        })
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

impl Default for LocalSessionSource {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for LocalSessionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalSessionSource")
            .field("capacity", &self.capacity)
            .finish()
    }
}

#[async_trait]
impl SessionSource for LocalSessionSource {
    fn as_any(&self) -> &dyn Any {
        self
    }

    async fn open_session(&self) -> Result<Box<dyn Session>, StoreError> {
        Ok(Box::new(LocalSession {
            entries: Arc::clone(&self.entries),
            capacity: self.capacity,
            staged: Vec::new(),
        }))
    }
}

enum StagedOp {
    Put(Vec<u8>, Vec<u8>),
    Remove(Vec<u8>),
}

struct LocalSession {
    entries: Arc<RwLock<HashMap<Vec<u8>, Vec<u8>>>>,
    capacity: Option<usize>,
    staged: Vec<StagedOp>,
}

#[async_trait]
impl Session for LocalSession {
    async fn get(&mut self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        // Staged operations shadow committed state, latest first
        for op in self.staged.iter().rev() {
            match op {
                StagedOp::Put(staged_key, value) if staged_key == key => {
                    return Ok(Some(value.clone()))
                }
                StagedOp::Remove(staged_key) if staged_key == key => return Ok(None),
                _ => {}
            }
        }

        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        self.staged.push(StagedOp::Put(key.to_vec(), value.to_vec()));
        Ok(())
    }

    async fn remove(&mut self, key: &[u8]) -> Result<bool, StoreError> {
        let existed = self.get(key).await?.is_some();
        self.staged.push(StagedOp::Remove(key.to_vec()));
        Ok(existed)
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let LocalSession {
            entries,
            capacity,
            staged,
        } = *self;

        // Net effect per key; a later op on the same key wins
        let mut net: HashMap<Vec<u8>, Option<Vec<u8>>> = HashMap::new();
        for op in staged {
            match op {
                StagedOp::Put(key, value) => {
                    net.insert(key, Some(value));
                }
                StagedOp::Remove(key) => {
                    net.insert(key, None);
                }
            }
        }

        let mut map = entries.write().await;

        // Capacity is checked against the projected size so a rejected
        // commit applies none of its operations
        if let Some(capacity) = capacity {
            let mut projected = map.len();
            for (key, value) in &net {
                match (map.contains_key(key), value.is_some()) {
                    (false, true) => projected += 1,
                    (true, false) => projected -= 1,
                    _ => {}
                }
            }
            if projected > capacity {
                return Err(StoreError::Session(format!(
                    "Session store is full (capacity {})",
                    capacity
                )));
            }
        }

        for (key, value) in net {
            match value {
                Some(value) => {
                    map.insert(key, value);
                }
                None => {
                    map.remove(&key);
                }
            }
        }

        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        // Staged operations are simply dropped
        Ok(())
    }
}
