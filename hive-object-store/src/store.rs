// Copyright 2026 The Hive Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//  http://www.apache.org/licenses/LICENSE-2.0

//! Plasma client trait and the in-memory store implementation.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use parking_lot::Mutex;
use tokio::sync::Notify;

use hive_common::id::ObjectId;

/// Errors surfaced by the plasma store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PlasmaError {
    #[error("object already exists")]
    ObjectExists,
    #[error("object does not exist")]
    ObjectNonexistent,
    #[error("object already sealed")]
    ObjectSealed,
    #[error("object not sealed yet")]
    ObjectNotSealed,
    #[error("object store is full")]
    StoreFull,
    #[error("store client disconnected")]
    Disconnected,
}

/// A writable buffer handed out by `create` and made immutable by `seal`.
///
/// The buffer is shared: the store retains a handle, so bytes written by the
/// client are visible once the object is sealed.
#[derive(Clone)]
pub struct PlasmaBuffer {
    inner: Arc<Mutex<Vec<u8>>>,
}

impl PlasmaBuffer {
    pub fn new(size: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(vec![0u8; size])),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Copy `data` into the buffer starting at `offset`. Panics if the write
    /// would run past the allocation, mirroring an out-of-bounds store write.
    pub fn write_at(&self, offset: usize, data: &[u8]) {
        let mut buf = self.inner.lock();
        buf[offset..offset + data.len()].copy_from_slice(data);
    }

    /// Snapshot the buffer contents.
    pub fn to_bytes(&self) -> Bytes {
        Bytes::copy_from_slice(&self.inner.lock())
    }
}

/// Client interface to the shared-memory object store.
///
/// `timeout_ms` follows the worker-wide convention: negative = unbounded,
/// zero = non-blocking probe.
#[async_trait::async_trait]
pub trait PlasmaClient: Send + Sync {
    /// Create, fill, and seal an object in one step.
    async fn put(
        &self,
        object_id: ObjectId,
        data: Bytes,
        metadata: Bytes,
    ) -> Result<(), PlasmaError>;

    /// First half of two-phase construction: allocate a writable buffer.
    async fn create(
        &self,
        object_id: ObjectId,
        metadata: Bytes,
        data_size: usize,
    ) -> Result<PlasmaBuffer, PlasmaError>;

    /// Second half: make the object immutable and visible to readers.
    async fn seal(&self, object_id: ObjectId) -> Result<(), PlasmaError>;

    /// Fetch sealed objects, waiting up to `timeout_ms` for each to appear.
    /// Result slots are `(data, metadata)` in input order, `None` on timeout.
    async fn get(
        &self,
        object_ids: &[ObjectId],
        timeout_ms: i64,
    ) -> Result<Vec<Option<(Bytes, Bytes)>>, PlasmaError>;

    /// Wait until at least `num_returns` of the given objects are sealed or
    /// the timeout expires. Returns the ready subset.
    async fn wait(
        &self,
        object_ids: &[ObjectId],
        num_returns: usize,
        timeout_ms: i64,
    ) -> Result<Vec<ObjectId>, PlasmaError>;

    async fn contains(&self, object_id: ObjectId) -> Result<bool, PlasmaError>;

    async fn delete(
        &self,
        object_ids: &[ObjectId],
        local_only: bool,
        delete_creating_tasks: bool,
    ) -> Result<(), PlasmaError>;

    async fn set_client_options(&self, name: &str, limit_bytes: i64) -> Result<(), PlasmaError>;

    async fn memory_usage_string(&self) -> String;

    /// Best-effort goodbye; errors are ignored by callers during shutdown.
    fn disconnect(&self);
}

// ─── In-memory implementation ───────────────────────────────────────────────

enum ObjectState {
    /// Two-phase construction in progress; the buffer is still writable.
    Created { buffer: PlasmaBuffer, metadata: Bytes },
    /// Immutable and readable.
    Sealed { data: Bytes, metadata: Bytes },
}

struct StoreInner {
    objects: HashMap<ObjectId, ObjectState>,
    client_name: String,
    limit_bytes: i64,
    cumulative_created_bytes: u64,
}

/// A process-local plasma store.
///
/// Implements the full client contract against a heap-backed table, with
/// the same create/seal state machine the shared-memory store enforces.
pub struct InMemoryPlasmaStore {
    inner: Mutex<StoreInner>,
    notify: Notify,
}

impl Default for InMemoryPlasmaStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryPlasmaStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(StoreInner {
                objects: HashMap::new(),
                client_name: String::new(),
                limit_bytes: -1,
                cumulative_created_bytes: 0,
            }),
            notify: Notify::new(),
        }
    }

    fn sealed_entry(&self, object_id: &ObjectId) -> Option<(Bytes, Bytes)> {
        let inner = self.inner.lock();
        match inner.objects.get(object_id) {
            Some(ObjectState::Sealed { data, metadata }) => {
                Some((data.clone(), metadata.clone()))
            }
            _ => None,
        }
    }

    fn num_sealed_bytes(&self) -> u64 {
        let inner = self.inner.lock();
        inner
            .objects
            .values()
            .map(|s| match s {
                ObjectState::Sealed { data, metadata } => (data.len() + metadata.len()) as u64,
                ObjectState::Created { buffer, metadata } => {
                    (buffer.len() + metadata.len()) as u64
                }
            })
            .sum()
    }

    /// Block until `deadline_check` yields a value or the timeout expires.
    async fn wait_until<T>(
        &self,
        timeout_ms: i64,
        mut check: impl FnMut() -> Option<T>,
    ) -> Option<T> {
        if let Some(v) = check() {
            return Some(v);
        }
        if timeout_ms == 0 {
            return None;
        }
        let deadline = if timeout_ms < 0 {
            None
        } else {
            Some(tokio::time::Instant::now() + Duration::from_millis(timeout_ms as u64))
        };
        loop {
            // Register interest before re-checking so a concurrent seal
            // cannot slip between the check and the wait.
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(v) = check() {
                return Some(v);
            }
            match deadline {
                Some(d) => {
                    let remaining = d.saturating_duration_since(tokio::time::Instant::now());
                    if remaining.is_zero() {
                        return check();
                    }
                    if tokio::time::timeout(remaining, notified).await.is_err() {
                        return check();
                    }
                }
                None => notified.await,
            }
        }
    }
}

#[async_trait::async_trait]
impl PlasmaClient for InMemoryPlasmaStore {
    async fn put(
        &self,
        object_id: ObjectId,
        data: Bytes,
        metadata: Bytes,
    ) -> Result<(), PlasmaError> {
        {
            let mut inner = self.inner.lock();
            if inner.objects.contains_key(&object_id) {
                return Err(PlasmaError::ObjectExists);
            }
            inner.cumulative_created_bytes += (data.len() + metadata.len()) as u64;
            inner
                .objects
                .insert(object_id, ObjectState::Sealed { data, metadata });
        }
        self.notify.notify_waiters();
        Ok(())
    }

    async fn create(
        &self,
        object_id: ObjectId,
        metadata: Bytes,
        data_size: usize,
    ) -> Result<PlasmaBuffer, PlasmaError> {
        let mut inner = self.inner.lock();
        if inner.objects.contains_key(&object_id) {
            return Err(PlasmaError::ObjectExists);
        }
        let buffer = PlasmaBuffer::new(data_size);
        inner.cumulative_created_bytes += (data_size + metadata.len()) as u64;
        inner.objects.insert(
            object_id,
            ObjectState::Created {
                buffer: buffer.clone(),
                metadata,
            },
        );
        Ok(buffer)
    }

    async fn seal(&self, object_id: ObjectId) -> Result<(), PlasmaError> {
        {
            let mut inner = self.inner.lock();
            let state = inner
                .objects
                .get_mut(&object_id)
                .ok_or(PlasmaError::ObjectNonexistent)?;
            match state {
                ObjectState::Sealed { .. } => return Err(PlasmaError::ObjectSealed),
                ObjectState::Created { buffer, metadata } => {
                    let sealed = ObjectState::Sealed {
                        data: buffer.to_bytes(),
                        metadata: metadata.clone(),
                    };
                    *state = sealed;
                }
            }
        }
        self.notify.notify_waiters();
        Ok(())
    }

    async fn get(
        &self,
        object_ids: &[ObjectId],
        timeout_ms: i64,
    ) -> Result<Vec<Option<(Bytes, Bytes)>>, PlasmaError> {
        let deadline = if timeout_ms < 0 {
            None
        } else {
            Some(tokio::time::Instant::now() + Duration::from_millis(timeout_ms as u64))
        };
        let mut results = Vec::with_capacity(object_ids.len());
        for object_id in object_ids {
            let remaining_ms = match deadline {
                None => -1,
                Some(d) => d
                    .saturating_duration_since(tokio::time::Instant::now())
                    .as_millis() as i64,
            };
            let found = self
                .wait_until(remaining_ms, || self.sealed_entry(object_id))
                .await;
            results.push(found);
        }
        Ok(results)
    }

    async fn wait(
        &self,
        object_ids: &[ObjectId],
        num_returns: usize,
        timeout_ms: i64,
    ) -> Result<Vec<ObjectId>, PlasmaError> {
        let ready_set = |store: &Self| -> Vec<ObjectId> {
            object_ids
                .iter()
                .filter(|id| store.sealed_entry(id).is_some())
                .copied()
                .collect()
        };
        let result = self
            .wait_until(timeout_ms, || {
                let ready = ready_set(self);
                if ready.len() >= num_returns {
                    Some(ready)
                } else {
                    None
                }
            })
            .await;
        // On timeout, report whatever became ready.
        Ok(result.unwrap_or_else(|| ready_set(self)))
    }

    async fn contains(&self, object_id: ObjectId) -> Result<bool, PlasmaError> {
        Ok(self.sealed_entry(&object_id).is_some())
    }

    async fn delete(
        &self,
        object_ids: &[ObjectId],
        _local_only: bool,
        _delete_creating_tasks: bool,
    ) -> Result<(), PlasmaError> {
        let mut inner = self.inner.lock();
        for object_id in object_ids {
            inner.objects.remove(object_id);
        }
        Ok(())
    }

    async fn set_client_options(&self, name: &str, limit_bytes: i64) -> Result<(), PlasmaError> {
        let mut inner = self.inner.lock();
        inner.client_name = name.to_string();
        inner.limit_bytes = limit_bytes;
        Ok(())
    }

    async fn memory_usage_string(&self) -> String {
        let (num_objects, client_name, cumulative) = {
            let inner = self.inner.lock();
            (
                inner.objects.len(),
                inner.client_name.clone(),
                inner.cumulative_created_bytes,
            )
        };
        format!(
            "plasma[client={}]: {} objects, {} bytes in use, {} bytes created",
            client_name,
            num_objects,
            self.num_sealed_bytes(),
            cumulative
        )
    }

    fn disconnect(&self) {}
}
