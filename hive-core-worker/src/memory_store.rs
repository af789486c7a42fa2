// Copyright 2026 The Hive Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//  http://www.apache.org/licenses/LICENSE-2.0

//! In-process object store for direct-call objects.
//!
//! Small direct-call values live here until a reader arrives. A value that
//! crosses a process boundary, or grows past the direct-call threshold, is
//! promoted to plasma and replaced by the `InPlasmaError` sentinel so later
//! readers retry against the plasma tier.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::Notify;

use hive_common::id::ObjectId;
use hive_proto::rpc::ErrorType;

use crate::common::RayObject;
use crate::error::{CoreWorkerError, CoreWorkerResult};

/// Runs on the reactor when the object arrives; must not block.
pub type GetAsyncCallback = Box<dyn FnOnce(RayObject) + Send>;

/// Statistics snapshot for worker stats reporting.
#[derive(Debug, Clone, Copy, Default)]
pub struct MemoryStoreStats {
    pub num_local_objects: usize,
    pub used_object_store_memory: usize,
}

struct StoreInner {
    objects: HashMap<ObjectId, RayObject>,
    get_async_waiters: HashMap<ObjectId, Vec<GetAsyncCallback>>,
}

/// Thread-safe keyed wait-set of in-process objects.
pub struct CoreWorkerMemoryStore {
    inner: Mutex<StoreInner>,
    notify: Notify,
}

impl Default for CoreWorkerMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CoreWorkerMemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(StoreInner {
                objects: HashMap::new(),
                get_async_waiters: HashMap::new(),
            }),
            notify: Notify::new(),
        }
    }

    /// Insert an object, waking waiters and firing `get_async` callbacks.
    ///
    /// A promotion sentinel always wins: it overwrites a resident value and
    /// is never itself overwritten, so readers that raced the promotion are
    /// routed to plasma.
    pub fn put(&self, object_id: ObjectId, object: RayObject) -> CoreWorkerResult<()> {
        let (stored, waiters) = {
            let mut inner = self.inner.lock();
            let stored = if object.is_in_plasma_error() {
                inner.objects.insert(object_id, object.clone());
                object
            } else {
                let resident_sentinel = match inner.objects.get(&object_id) {
                    Some(existing) if existing.is_in_plasma_error() => Some(existing.clone()),
                    Some(_) => {
                        return Err(CoreWorkerError::ObjectAlreadyExists(object_id.hex()));
                    }
                    None => None,
                };
                match resident_sentinel {
                    Some(sentinel) => sentinel,
                    None => {
                        inner.objects.insert(object_id, object.clone());
                        object
                    }
                }
            };
            let waiters = inner.get_async_waiters.remove(&object_id).unwrap_or_default();
            (stored, waiters)
        };
        for waiter in waiters {
            waiter(stored.clone());
        }
        self.notify.notify_waiters();
        Ok(())
    }

    /// Fetch a snapshot of one object.
    pub fn get_one(&self, object_id: &ObjectId) -> Option<RayObject> {
        self.inner.lock().objects.get(object_id).cloned()
    }

    /// Fetch the requested objects, waiting up to `timeout_ms` for all of
    /// them. Negative timeout waits forever, zero probes. On timeout the
    /// partial result is returned, not an error.
    ///
    /// The second tuple element reports whether any fetched object carries a
    /// user-visible exception sentinel (the plasma routing sentinel does not
    /// count).
    pub async fn get(
        &self,
        object_ids: &HashSet<ObjectId>,
        timeout_ms: i64,
    ) -> CoreWorkerResult<(HashMap<ObjectId, RayObject>, bool)> {
        let collect = |inner: &StoreInner| -> HashMap<ObjectId, RayObject> {
            object_ids
                .iter()
                .filter_map(|id| inner.objects.get(id).map(|obj| (*id, obj.clone())))
                .collect()
        };

        let deadline = if timeout_ms < 0 {
            None
        } else {
            Some(tokio::time::Instant::now() + Duration::from_millis(timeout_ms as u64))
        };

        let results = loop {
            // Register interest before checking so a concurrent put cannot
            // slip between the check and the wait.
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            let found = collect(&self.inner.lock());
            if found.len() == object_ids.len() || timeout_ms == 0 {
                break found;
            }
            match deadline {
                None => notified.await,
                Some(d) => {
                    let remaining = d.saturating_duration_since(tokio::time::Instant::now());
                    if remaining.is_zero()
                        || tokio::time::timeout(remaining, notified).await.is_err()
                    {
                        break collect(&self.inner.lock());
                    }
                }
            }
        };

        let got_exception = results.values().any(|obj| obj.is_user_exception());
        Ok((results, got_exception))
    }

    /// Wait until at least `num_objects` of the given ids are present, or
    /// the timeout expires. Returns the ready subset.
    pub async fn wait(
        &self,
        object_ids: &HashSet<ObjectId>,
        num_objects: usize,
        timeout_ms: i64,
    ) -> CoreWorkerResult<HashSet<ObjectId>> {
        let collect = |inner: &StoreInner| -> HashSet<ObjectId> {
            object_ids
                .iter()
                .filter(|id| inner.objects.contains_key(id))
                .copied()
                .collect()
        };

        let deadline = if timeout_ms < 0 {
            None
        } else {
            Some(tokio::time::Instant::now() + Duration::from_millis(timeout_ms as u64))
        };

        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            let ready = collect(&self.inner.lock());
            if ready.len() >= num_objects || timeout_ms == 0 {
                return Ok(ready);
            }
            match deadline {
                None => notified.await,
                Some(d) => {
                    let remaining = d.saturating_duration_since(tokio::time::Instant::now());
                    if remaining.is_zero()
                        || tokio::time::timeout(remaining, notified).await.is_err()
                    {
                        return Ok(collect(&self.inner.lock()));
                    }
                }
            }
        }
    }

    /// Invoke `callback` with the object as soon as it is available.
    /// Callbacks run on whichever thread performs the `put`.
    pub fn get_async(&self, object_id: ObjectId, callback: GetAsyncCallback) {
        let resident = {
            let mut inner = self.inner.lock();
            if let Some(obj) = inner.objects.get(&object_id).cloned() {
                Some((callback, obj))
            } else {
                inner
                    .get_async_waiters
                    .entry(object_id)
                    .or_default()
                    .push(callback);
                None
            }
        };
        if let Some((cb, obj)) = resident {
            cb(obj);
        }
    }

    /// Atomically fetch the value for out-of-process serialization, or mark
    /// the object as promoted. `Some(value)` means the caller must write the
    /// value to plasma; `None` means the object is already plasma-resident
    /// (or marked as such).
    pub fn get_or_promote_to_plasma(&self, object_id: ObjectId) -> Option<RayObject> {
        let mut inner = self.inner.lock();
        match inner.objects.get(&object_id) {
            Some(existing) if existing.is_in_plasma_error() => None,
            Some(existing) => Some(existing.clone()),
            None => {
                inner
                    .objects
                    .insert(object_id, RayObject::from_error(ErrorType::ObjectInPlasma));
                None
            }
        }
    }

    /// Remove the given ids. Ids whose record is the promotion sentinel are
    /// added to `plasma_object_ids` so the caller also deletes the plasma
    /// copy.
    pub fn delete(
        &self,
        object_ids: &HashSet<ObjectId>,
        plasma_object_ids: &mut HashSet<ObjectId>,
    ) {
        let mut inner = self.inner.lock();
        for object_id in object_ids {
            if let Some(obj) = inner.objects.get(object_id) {
                if obj.is_in_plasma_error() {
                    plasma_object_ids.insert(*object_id);
                }
                inner.objects.remove(object_id);
            }
        }
    }

    /// Presence probe: `None` when absent, otherwise whether the record is
    /// the promotion sentinel.
    pub fn contains(&self, object_id: &ObjectId) -> Option<bool> {
        self.inner
            .lock()
            .objects
            .get(object_id)
            .map(|obj| obj.is_in_plasma_error())
    }

    pub fn stats(&self) -> MemoryStoreStats {
        let inner = self.inner.lock();
        MemoryStoreStats {
            num_local_objects: inner.objects.len(),
            used_object_store_memory: inner.objects.values().map(|o| o.size()).sum(),
        }
    }
}
