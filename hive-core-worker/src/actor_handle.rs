// Copyright 2026 The Hive Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//  http://www.apache.org/licenses/LICENSE-2.0

//! A handle to a remote actor.
//!
//! The handle owns the per-submitter ordering state: a monotonically
//! increasing sequence counter and the cursor object id chained through
//! consecutive actor tasks. Serialization emits a stable byte string so
//! handles can travel between processes.

use parking_lot::Mutex;
use prost::Message;

use hive_common::id::{ActorId, JobId, ObjectId, TaskId, TaskTransportType};
use hive_proto::rpc::{self, ActorState, Language};

use crate::error::{CoreWorkerError, CoreWorkerResult};
use crate::task_spec_builder::TaskSpecBuilder;

struct HandleState {
    /// Cursor chained into the next actor task as its control dependency.
    cursor: ObjectId,
    /// Sequence number assigned to the next actor task.
    task_counter: u64,
    state: ActorState,
}

pub struct ActorHandle {
    inner: rpc::ActorHandleData,
    state: Mutex<HandleState>,
}

impl ActorHandle {
    pub fn new(
        actor_id: ActorId,
        creation_job_id: JobId,
        actor_cursor: ObjectId,
        language: Language,
        is_direct_call: bool,
        function_descriptor: Vec<String>,
    ) -> Self {
        Self {
            inner: rpc::ActorHandleData {
                actor_id: actor_id.binary(),
                creation_job_id: creation_job_id.binary(),
                actor_cursor: actor_cursor.binary(),
                actor_language: language as i32,
                is_direct_call,
                function_descriptor,
            },
            state: Mutex::new(HandleState {
                cursor: actor_cursor,
                task_counter: 0,
                state: ActorState::Alive,
            }),
        }
    }

    pub fn actor_id(&self) -> ActorId {
        ActorId::from_binary(&self.inner.actor_id)
    }

    pub fn creation_job_id(&self) -> JobId {
        JobId::from_binary(&self.inner.creation_job_id)
    }

    pub fn is_direct_call_actor(&self) -> bool {
        self.inner.is_direct_call
    }

    pub fn language(&self) -> Language {
        Language::try_from(self.inner.actor_language).unwrap_or(Language::Python)
    }

    pub fn function_descriptor(&self) -> &[String] {
        &self.inner.function_descriptor
    }

    /// The cursor returned by the actor creation task; every actor task
    /// names it so the receiver can associate the task with its actor.
    pub fn actor_creation_dummy_object_id(&self) -> ObjectId {
        ObjectId::from_binary(&self.inner.actor_cursor)
    }

    pub fn actor_state(&self) -> ActorState {
        self.state.lock().state
    }

    pub fn is_dead(&self) -> bool {
        self.state.lock().state == ActorState::Dead
    }

    pub fn mark_dead(&self) {
        self.state.lock().state = ActorState::Dead;
    }

    pub fn mark_reconstructing(&self) {
        self.state.lock().state = ActorState::Reconstructing;
    }

    pub fn mark_alive(&self) {
        self.state.lock().state = ActorState::Alive;
    }

    /// Assign the next sequence number to an actor task, set the previous
    /// cursor as its control dependency, and rotate the cursor.
    pub fn set_actor_task_spec(
        &self,
        builder: &mut TaskSpecBuilder,
        _transport: TaskTransportType,
        new_cursor: ObjectId,
    ) {
        let mut state = self.state.lock();
        let counter = state.task_counter;
        state.task_counter += 1;
        builder.set_actor_task_spec(
            &self.actor_id(),
            &self.actor_creation_dummy_object_id(),
            &state.cursor,
            counter,
        );
        state.cursor = new_cursor;
    }

    /// Clear the sequence state. The next incarnation of the actor does not
    /// know the sequence numbers of a previous connection, so submissions
    /// after a restart begin again at zero with the creation cursor.
    pub fn reset(&self) {
        let mut state = self.state.lock();
        state.task_counter = 0;
        state.cursor = self.actor_creation_dummy_object_id();
    }

    /// Serialize to a stable byte string.
    pub fn serialize(&self) -> Vec<u8> {
        self.inner.encode_to_vec()
    }

    /// Reconstruct a handle from serialized bytes. The cursor and counter
    /// start fresh from the embedded creation cursor.
    pub fn deserialize(data: &[u8]) -> CoreWorkerResult<Self> {
        let inner = rpc::ActorHandleData::decode(data).map_err(|e| {
            CoreWorkerError::Internal(format!("failed to decode actor handle: {e}"))
        })?;
        if inner.actor_id.len() != ActorId::SIZE {
            return Err(CoreWorkerError::InvalidArgument(
                "serialized actor handle has malformed actor id".to_string(),
            ));
        }
        let cursor = ObjectId::from_binary(&inner.actor_cursor);
        Ok(Self {
            state: Mutex::new(HandleState {
                cursor,
                task_counter: 0,
                state: ActorState::Alive,
            }),
            inner,
        })
    }
}
