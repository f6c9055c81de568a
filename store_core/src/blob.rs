//! Session-backed blob store
//!
//! Persists cache entries as opaque key/value blobs through a
//! [`SessionSource`](crate::session::SessionSource). Each operation runs in
//! its own session, committed on success and rolled back on failure, so a
//! failed call leaves both the backend and the store state untouched.

use crate::errors::StoreError;
use crate::session::SessionSource;
use crate::store::StoreState;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

const STATE_CONFIGURED: u8 = 0;
const STATE_ACTIVE: u8 = 1;

/// Blob store for cache entries of key type `K` and value type `V`
pub struct BlobStore<K, V> {
    source: Arc<dyn SessionSource>,
    state: AtomicU8,
    _entry: PhantomData<fn() -> (K, V)>,
}

impl<K, V> std::fmt::Debug for BlobStore<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlobStore")
            .field("state", &self.state())
            .finish()
    }
}

impl<K, V> BlobStore<K, V> {
    pub(crate) fn new(source: Arc<dyn SessionSource>) -> Self {
        Self {
            source,
            state: AtomicU8::new(STATE_CONFIGURED),
            _entry: PhantomData,
        }
    }

    pub fn state(&self) -> StoreState {
        match self.state.load(Ordering::Relaxed) {
            STATE_CONFIGURED => StoreState::Configured,
            _ => StoreState::Active,
        }
    }

    fn mark_active(&self) {
        self.state.store(STATE_ACTIVE, Ordering::Relaxed);
    }

    /// The injected session source
    pub fn session_source(&self) -> &Arc<dyn SessionSource> {
        &self.source
    }
}

impl<K, V> BlobStore<K, V>
where
    K: Serialize + DeserializeOwned + Send + Sync,
    V: Serialize + DeserializeOwned + Send + Sync,
{
    fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, StoreError> {
        Ok(serde_json::to_vec(value)?)
    }

    fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, StoreError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Load the value stored under `key`
    pub async fn load(&self, key: &K) -> Result<Option<V>, StoreError> {
        let key_bytes = Self::encode(key)?;

        let mut session = self.source.open_session().await?;
        match session.get(&key_bytes).await {
            Ok(found) => {
                session.commit().await?;
                self.mark_active();
                match found {
                    Some(bytes) => Ok(Some(Self::decode(&bytes)?)),
                    None => Ok(None),
                }
            }
            Err(err) => {
                let _ = session.rollback().await;
                Err(err)
            }
        }
    }

    /// Load all present entries for `keys` within a single session
    pub async fn load_all(&self, keys: &[K]) -> Result<Vec<(K, V)>, StoreError>
    where
        K: Clone,
    {
        let mut session = self.source.open_session().await?;
        let mut entries = Vec::with_capacity(keys.len());

        for key in keys {
            let key_bytes = match Self::encode(key) {
                Ok(bytes) => bytes,
                Err(err) => {
                    let _ = session.rollback().await;
                    return Err(err);
                }
            };
            match session.get(&key_bytes).await {
                Ok(Some(bytes)) => entries.push((key.clone(), Self::decode(&bytes)?)),
                Ok(None) => {}
                Err(err) => {
                    let _ = session.rollback().await;
                    return Err(err);
                }
            }
        }

        session.commit().await?;
        self.mark_active();
        Ok(entries)
    }

    /// Write one entry
    pub async fn write(&self, key: &K, value: &V) -> Result<(), StoreError> {
        let entry = (Self::encode(key)?, Self::encode(value)?);
        self.write_all(std::slice::from_ref(&entry)).await
    }

    /// Write typed entries within a single session
    pub async fn write_entries(&self, entries: &[(K, V)]) -> Result<(), StoreError> {
        let mut encoded = Vec::with_capacity(entries.len());
        for (key, value) in entries {
            encoded.push((Self::encode(key)?, Self::encode(value)?));
        }
        self.write_all(&encoded).await
    }

    async fn write_all(&self, entries: &[(Vec<u8>, Vec<u8>)]) -> Result<(), StoreError> {
        let mut session = self.source.open_session().await?;

        for (key_bytes, value_bytes) in entries {
            if let Err(err) = session.put(key_bytes, value_bytes).await {
                let _ = session.rollback().await;
                return Err(err);
            }
        }

        session.commit().await?;
        self.mark_active();
        Ok(())
    }

    /// Delete the entry stored under `key`; returns whether it existed
    pub async fn delete(&self, key: &K) -> Result<bool, StoreError> {
        let key_bytes = Self::encode(key)?;

        let mut session = self.source.open_session().await?;
        match session.remove(&key_bytes).await {
            Ok(existed) => {
                session.commit().await?;
                self.mark_active();
                Ok(existed)
            }
            Err(err) => {
                let _ = session.rollback().await;
                Err(err)
            }
        }
    }

    /// Delete entries for `keys` within a single session; returns the number
    /// of entries that existed
    pub async fn delete_all(&self, keys: &[K]) -> Result<u64, StoreError> {
        let mut session = self.source.open_session().await?;

        let mut removed = 0;
        for key in keys {
            let key_bytes = match Self::encode(key) {
                Ok(bytes) => bytes,
                Err(err) => {
                    let _ = session.rollback().await;
                    return Err(err);
                }
            };
            match session.remove(&key_bytes).await {
                Ok(true) => removed += 1,
                Ok(false) => {}
                Err(err) => {
                    let _ = session.rollback().await;
                    return Err(err);
                }
            }
        }

        session.commit().await?;
        self.mark_active();
        Ok(removed)
    }
}
