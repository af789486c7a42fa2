// Copyright 2026 The Hive Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//  http://www.apache.org/licenses/LICENSE-2.0

//! Value types shared across the worker runtime: objects, functions,
//! arguments, and submission options.

use std::collections::HashMap;

use bytes::Bytes;

use hive_common::id::ObjectId;
use hive_object_store::PlasmaBuffer;
use hive_proto::rpc::{ErrorType, Language, TaskType};

use crate::error::CoreWorkerResult;

/// An object value as seen by the worker runtime.
///
/// Error sentinels travel in the metadata field as the decimal `ErrorType`
/// code, so every store tier and every language binding recognizes them the
/// same way.
#[derive(Clone)]
pub struct RayObject {
    data: Option<Bytes>,
    metadata: Option<Bytes>,
    /// Set when the data lives in a plasma allocation created ahead of
    /// sealing (two-phase return-object construction).
    plasma_data: Option<PlasmaBuffer>,
    /// Set when the data lives in a writable process-local allocation
    /// handed to the executor to fill in.
    local_data: Option<PlasmaBuffer>,
    /// ObjectIds referenced by this object's payload.
    nested_ids: Vec<ObjectId>,
}

impl std::fmt::Debug for RayObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RayObject")
            .field("data_size", &self.data.as_ref().map(|d| d.len()))
            .field("metadata_size", &self.metadata.as_ref().map(|m| m.len()))
            .field("in_plasma", &self.plasma_data.is_some())
            .field("nested_ids", &self.nested_ids.len())
            .finish()
    }
}

impl RayObject {
    pub fn new(data: Option<Bytes>, metadata: Option<Bytes>, nested_ids: Vec<ObjectId>) -> Self {
        Self {
            data,
            metadata,
            plasma_data: None,
            local_data: None,
            nested_ids,
        }
    }

    /// A plain data object with no metadata.
    pub fn from_data(data: Bytes) -> Self {
        Self::new(Some(data), None, Vec::new())
    }

    /// An error object carrying the given sentinel in its metadata.
    pub fn from_error(error_type: ErrorType) -> Self {
        let metadata = Bytes::from(format!("{}", error_type as i32));
        Self::new(None, Some(metadata), Vec::new())
    }

    /// An object whose data buffer is a not-yet-sealed plasma allocation.
    pub fn from_plasma_buffer(
        buffer: PlasmaBuffer,
        metadata: Option<Bytes>,
        nested_ids: Vec<ObjectId>,
    ) -> Self {
        Self {
            data: None,
            metadata,
            plasma_data: Some(buffer),
            local_data: None,
            nested_ids,
        }
    }

    /// An object whose data buffer is a writable process-local allocation.
    pub fn from_local_buffer(
        buffer: PlasmaBuffer,
        metadata: Option<Bytes>,
        nested_ids: Vec<ObjectId>,
    ) -> Self {
        Self {
            data: None,
            metadata,
            plasma_data: None,
            local_data: Some(buffer),
            nested_ids,
        }
    }

    /// The data payload, snapshotting a buffer-backed allocation if
    /// necessary.
    pub fn data(&self) -> Option<Bytes> {
        match (&self.plasma_data, &self.local_data) {
            (Some(buffer), _) => Some(buffer.to_bytes()),
            (None, Some(buffer)) => Some(buffer.to_bytes()),
            (None, None) => self.data.clone(),
        }
    }

    pub fn metadata(&self) -> Option<Bytes> {
        self.metadata.clone()
    }

    pub fn nested_ids(&self) -> &[ObjectId] {
        &self.nested_ids
    }

    /// Whether the data buffer is a plasma allocation (sealed by the
    /// executor instead of shipped inline).
    pub fn data_in_plasma(&self) -> bool {
        self.plasma_data.is_some()
    }

    /// Total payload size in bytes.
    pub fn size(&self) -> usize {
        let data_len = match (&self.plasma_data, &self.local_data) {
            (Some(buffer), _) => buffer.len(),
            (None, Some(buffer)) => buffer.len(),
            (None, None) => self.data.as_ref().map_or(0, |d| d.len()),
        };
        data_len + self.metadata.as_ref().map_or(0, |m| m.len())
    }

    fn error_code(&self) -> Option<i32> {
        let metadata = self.metadata.as_ref()?;
        std::str::from_utf8(metadata).ok()?.parse::<i32>().ok()
    }

    /// True for any error-sentinel object.
    pub fn is_exception(&self) -> bool {
        self.error_code().is_some()
    }

    /// True for the internal promoted-to-plasma sentinel. Never surfaced to
    /// callers; triggers a retry against the plasma tier.
    pub fn is_in_plasma_error(&self) -> bool {
        self.error_code() == Some(ErrorType::ObjectInPlasma as i32)
    }

    /// True for exceptions that the language binding should raise (the
    /// plasma sentinel is excluded — it is a routing mark, not a failure).
    pub fn is_user_exception(&self) -> bool {
        self.is_exception() && !self.is_in_plasma_error()
    }

    /// The sentinel this object carries, when it carries one.
    pub fn exception_type(&self) -> Option<ErrorType> {
        self.error_code().and_then(|code| ErrorType::try_from(code).ok())
    }
}

/// A remote function: language plus a language-specific descriptor.
#[derive(Debug, Clone)]
pub struct RayFunction {
    pub language: Language,
    pub function_descriptor: Vec<String>,
}

impl RayFunction {
    pub fn new(language: Language, function_descriptor: Vec<String>) -> Self {
        Self {
            language,
            function_descriptor,
        }
    }
}

/// A task argument: a reference to an object or an inline value.
#[derive(Debug, Clone)]
pub enum TaskArg {
    ByReference(ObjectId),
    ByValue(RayObject),
}

/// Options for submitting a normal task.
#[derive(Debug, Clone)]
pub struct TaskOptions {
    pub num_returns: u64,
    pub resources: HashMap<String, f64>,
    pub is_direct_call: bool,
}

impl Default for TaskOptions {
    fn default() -> Self {
        Self {
            num_returns: 1,
            resources: HashMap::new(),
            is_direct_call: false,
        }
    }
}

/// Options for creating an actor.
#[derive(Debug, Clone, Default)]
pub struct ActorCreationOptions {
    pub max_reconstructions: u64,
    pub is_direct_call: bool,
    pub max_concurrency: i32,
    pub resources: HashMap<String, f64>,
    pub placement_resources: HashMap<String, f64>,
    pub dynamic_worker_options: Vec<String>,
    pub is_detached: bool,
    pub is_asyncio: bool,
}

/// Language-side task execution hook.
///
/// Invoked on the task execution thread with materialized arguments; the
/// returned vector holds one slot per return id (`None` means the executor
/// already stored, or chose not to store, that output).
pub type TaskExecutionCallback = std::sync::Arc<
    dyn Fn(
            TaskType,
            RayFunction,
            HashMap<String, f64>,
            Vec<RayObject>,
            Vec<ObjectId>,
            Vec<ObjectId>,
        ) -> CoreWorkerResult<Vec<Option<RayObject>>>
        + Send
        + Sync,
>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_object_is_not_exception() {
        let obj = RayObject::from_data(Bytes::from("payload"));
        assert!(!obj.is_exception());
        assert!(!obj.is_in_plasma_error());
        assert_eq!(obj.size(), 7);
    }

    #[test]
    fn test_error_sentinels() {
        let plasma = RayObject::from_error(ErrorType::ObjectInPlasma);
        assert!(plasma.is_exception());
        assert!(plasma.is_in_plasma_error());
        assert!(!plasma.is_user_exception());

        let died = RayObject::from_error(ErrorType::ActorDied);
        assert!(died.is_exception());
        assert!(!died.is_in_plasma_error());
        assert!(died.is_user_exception());
    }

    #[test]
    fn test_metadata_that_is_not_a_code() {
        let obj = RayObject::new(None, Some(Bytes::from("schema-v1")), Vec::new());
        assert!(!obj.is_exception());
    }

    #[test]
    fn test_plasma_buffer_snapshot() {
        let buffer = PlasmaBuffer::new(3);
        buffer.write_at(0, b"abc");
        let obj = RayObject::from_plasma_buffer(buffer, None, Vec::new());
        assert!(obj.data_in_plasma());
        assert_eq!(obj.data().unwrap().as_ref(), b"abc");
        assert_eq!(obj.size(), 3);
    }

    #[test]
    fn test_local_buffer_is_not_plasma() {
        let buffer = PlasmaBuffer::new(2);
        buffer.write_at(0, b"ok");
        let obj = RayObject::from_local_buffer(buffer, None, Vec::new());
        assert!(!obj.data_in_plasma());
        assert_eq!(obj.data().unwrap().as_ref(), b"ok");
    }
}
