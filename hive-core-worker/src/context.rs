// Copyright 2026 The Hive Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//  http://www.apache.org/licenses/LICENSE-2.0

//! Per-worker context: current task/actor/job identity and index counters.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use parking_lot::Mutex;

use hive_common::id::{ActorId, JobId, TaskId, WorkerId};
use hive_proto::rpc::{TaskSpec, TaskType};

use crate::options::WorkerType;

/// Mutable per-worker context tracking the task currently being executed
/// and the monotonic counters used to derive deterministic ids.
pub struct WorkerContext {
    worker_type: WorkerType,
    worker_id: WorkerId,
    current_job_id: Mutex<JobId>,
    current_task_id: Mutex<TaskId>,
    current_actor_id: Mutex<ActorId>,
    task_index: AtomicU32,
    put_index: AtomicU32,
    current_task_is_direct_call: AtomicBool,
    current_actor_is_direct_call: AtomicBool,
    current_actor_is_async: AtomicBool,
}

impl WorkerContext {
    pub fn new(worker_type: WorkerType, worker_id: WorkerId, job_id: JobId) -> Self {
        Self {
            worker_type,
            worker_id,
            current_job_id: Mutex::new(job_id),
            current_task_id: Mutex::new(TaskId::nil()),
            current_actor_id: Mutex::new(ActorId::nil()),
            task_index: AtomicU32::new(0),
            put_index: AtomicU32::new(0),
            current_task_is_direct_call: AtomicBool::new(false),
            current_actor_is_direct_call: AtomicBool::new(false),
            current_actor_is_async: AtomicBool::new(false),
        }
    }

    pub fn worker_type(&self) -> WorkerType {
        self.worker_type
    }

    pub fn worker_id(&self) -> WorkerId {
        self.worker_id
    }

    pub fn current_job_id(&self) -> JobId {
        *self.current_job_id.lock()
    }

    pub fn current_task_id(&self) -> TaskId {
        *self.current_task_id.lock()
    }

    /// Install a new current task id. Index counters restart so object ids
    /// derived from this task are deterministic across retries.
    pub fn set_current_task_id(&self, task_id: TaskId) {
        *self.current_task_id.lock() = task_id;
        self.task_index.store(0, Ordering::Relaxed);
        self.put_index.store(0, Ordering::Relaxed);
    }

    /// Record the spec of the task about to execute.
    pub fn set_current_task(&self, spec: &TaskSpec) {
        self.current_task_is_direct_call
            .store(spec.is_direct_call, Ordering::Relaxed);
        if spec.r#type == TaskType::ActorCreationTask as i32 {
            if let Some(creation) = &spec.actor_creation_task_spec {
                self.current_actor_is_direct_call
                    .store(creation.is_direct_call, Ordering::Relaxed);
                self.current_actor_is_async
                    .store(creation.is_asyncio, Ordering::Relaxed);
            }
        }
    }

    pub fn current_task_is_direct_call(&self) -> bool {
        self.current_task_is_direct_call.load(Ordering::Relaxed)
    }

    pub fn current_actor_is_direct_call(&self) -> bool {
        self.current_actor_is_direct_call.load(Ordering::Relaxed)
    }

    pub fn current_actor_is_async(&self) -> bool {
        self.current_actor_is_async.load(Ordering::Relaxed)
    }

    pub fn current_actor_id(&self) -> ActorId {
        *self.current_actor_id.lock()
    }

    pub fn set_current_actor_id(&self, actor_id: ActorId) {
        *self.current_actor_id.lock() = actor_id;
    }

    /// Next task submission index (atomically incremented).
    pub fn get_next_task_index(&self) -> u32 {
        self.task_index.fetch_add(1, Ordering::Relaxed)
    }

    /// Next put index (atomically incremented, 1-based so put ids never
    /// collide with the 0 slot).
    pub fn get_next_put_index(&self) -> u32 {
        self.put_index.fetch_add(1, Ordering::Relaxed) + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hive_proto::rpc::ActorCreationTaskSpec;

    fn make_ctx() -> WorkerContext {
        WorkerContext::new(WorkerType::Worker, WorkerId::from_random(), JobId::from_int(1))
    }

    #[test]
    fn test_context_basic() {
        let ctx = make_ctx();
        assert_eq!(ctx.worker_type(), WorkerType::Worker);
        assert_eq!(ctx.current_job_id(), JobId::from_int(1));
        assert!(ctx.current_task_id().is_nil());
        assert!(ctx.current_actor_id().is_nil());
    }

    #[test]
    fn test_set_current_task_resets_counters() {
        let ctx = make_ctx();
        assert_eq!(ctx.get_next_task_index(), 0);
        assert_eq!(ctx.get_next_task_index(), 1);
        assert_eq!(ctx.get_next_put_index(), 1);
        ctx.set_current_task_id(TaskId::from_random());
        assert_eq!(ctx.get_next_task_index(), 0);
        assert_eq!(ctx.get_next_put_index(), 1);
    }

    #[test]
    fn test_put_index_is_one_based() {
        let ctx = make_ctx();
        assert_eq!(ctx.get_next_put_index(), 1);
        assert_eq!(ctx.get_next_put_index(), 2);
    }

    #[test]
    fn test_actor_flags_from_creation_spec() {
        let ctx = make_ctx();
        let spec = TaskSpec {
            r#type: TaskType::ActorCreationTask as i32,
            is_direct_call: true,
            actor_creation_task_spec: Some(ActorCreationTaskSpec {
                is_direct_call: true,
                is_asyncio: true,
                ..Default::default()
            }),
            ..Default::default()
        };
        ctx.set_current_task(&spec);
        assert!(ctx.current_task_is_direct_call());
        assert!(ctx.current_actor_is_direct_call());
        assert!(ctx.current_actor_is_async());
    }

    #[test]
    fn test_set_current_actor_id() {
        let ctx = make_ctx();
        let aid = ActorId::from_random();
        ctx.set_current_actor_id(aid);
        assert_eq!(ctx.current_actor_id(), aid);
    }
}
