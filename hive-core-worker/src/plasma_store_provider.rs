// Copyright 2026 The Hive Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//  http://www.apache.org/licenses/LICENSE-2.0

//! Semantic wrapper around the shared-memory store client.
//!
//! Translates between `RayObject` values and the raw byte-pair interface of
//! the plasma client, and keeps put/create idempotent for retried tasks.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use bytes::Bytes;

use hive_common::id::ObjectId;
use hive_object_store::{PlasmaBuffer, PlasmaClient, PlasmaError};

use crate::common::RayObject;
use crate::error::CoreWorkerResult;

pub struct CoreWorkerPlasmaStoreProvider {
    store: Arc<dyn PlasmaClient>,
}

impl CoreWorkerPlasmaStoreProvider {
    pub fn new(store: Arc<dyn PlasmaClient>) -> Self {
        Self { store }
    }

    /// Store a full object under `object_id`. Re-putting an existing object
    /// is a no-op: retried tasks and promotion races produce identical
    /// bytes.
    pub async fn put(&self, object: &RayObject, object_id: ObjectId) -> CoreWorkerResult<()> {
        let data = object.data().unwrap_or_else(Bytes::new);
        let metadata = object.metadata().unwrap_or_else(Bytes::new);
        match self.store.put(object_id, data, metadata).await {
            Ok(()) | Err(PlasmaError::ObjectExists) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// First half of two-phase construction. `Ok(None)` means the object
    /// already exists and the caller must not write it again.
    pub async fn create(
        &self,
        metadata: Option<Bytes>,
        data_size: usize,
        object_id: ObjectId,
    ) -> CoreWorkerResult<Option<PlasmaBuffer>> {
        match self
            .store
            .create(object_id, metadata.unwrap_or_else(Bytes::new), data_size)
            .await
        {
            Ok(buffer) => Ok(Some(buffer)),
            Err(PlasmaError::ObjectExists) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn seal(&self, object_id: ObjectId) -> CoreWorkerResult<()> {
        self.store.seal(object_id).await?;
        Ok(())
    }

    /// Fetch the requested objects. On timeout the partial result is
    /// returned; the second tuple element reports whether any fetched
    /// object carries a user-visible exception sentinel.
    pub async fn get(
        &self,
        object_ids: &HashSet<ObjectId>,
        timeout_ms: i64,
    ) -> CoreWorkerResult<(HashMap<ObjectId, RayObject>, bool)> {
        let ids: Vec<ObjectId> = object_ids.iter().copied().collect();
        let fetched = self.store.get(&ids, timeout_ms).await?;

        let mut results = HashMap::new();
        let mut got_exception = false;
        for (id, slot) in ids.iter().zip(fetched) {
            if let Some((data, metadata)) = slot {
                let object = RayObject::new(
                    (!data.is_empty()).then_some(data),
                    (!metadata.is_empty()).then_some(metadata),
                    Vec::new(),
                );
                if object.is_user_exception() {
                    got_exception = true;
                }
                results.insert(*id, object);
            }
        }
        Ok((results, got_exception))
    }

    /// Wait for up to `num_objects` of the given ids, merging the ready
    /// subset into `ready`.
    pub async fn wait(
        &self,
        object_ids: &HashSet<ObjectId>,
        num_objects: usize,
        timeout_ms: i64,
        ready: &mut HashSet<ObjectId>,
    ) -> CoreWorkerResult<()> {
        let ids: Vec<ObjectId> = object_ids.iter().copied().collect();
        let got = self.store.wait(&ids, num_objects, timeout_ms).await?;
        ready.extend(got);
        Ok(())
    }

    pub async fn contains(&self, object_id: ObjectId) -> CoreWorkerResult<bool> {
        Ok(self.store.contains(object_id).await?)
    }

    pub async fn delete(
        &self,
        object_ids: &HashSet<ObjectId>,
        local_only: bool,
        delete_creating_tasks: bool,
    ) -> CoreWorkerResult<()> {
        let ids: Vec<ObjectId> = object_ids.iter().copied().collect();
        self.store
            .delete(&ids, local_only, delete_creating_tasks)
            .await?;
        Ok(())
    }

    pub async fn set_client_options(&self, name: &str, limit_bytes: i64) -> CoreWorkerResult<()> {
        self.store.set_client_options(name, limit_bytes).await?;
        Ok(())
    }

    pub async fn memory_usage_string(&self) -> String {
        self.store.memory_usage_string().await
    }
}
