// Copyright 2026 The Hive Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//  http://www.apache.org/licenses/LICENSE-2.0

//! Pending-task registry and failure/retry policy.
//!
//! A task is pending from `add_pending_task` until either completion or a
//! failure that exhausts its retries. Return values are written to the
//! memory store before the pending record is removed, so a `get` that
//! observes completion always finds the returns.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::Mutex;

use hive_common::id::TaskId;
use hive_proto::rpc::{self, Address, ErrorType, TaskSpec};

use crate::common::RayObject;
use crate::memory_store::CoreWorkerMemoryStore;
use crate::reference_counter::ReferenceCounter;
use crate::task_spec_builder;

/// Receives specs whose failure left retries; the worker binds this to the
/// delayed resubmission queue.
pub type RetrySink = Box<dyn Fn(TaskSpec) + Send + Sync>;

struct PendingTask {
    spec: TaskSpec,
    caller_id: TaskId,
    caller_address: Address,
    num_retries_left: u64,
}

struct TaskManagerState {
    pending: HashMap<TaskId, PendingTask>,
    shutdown_hook: Option<Box<dyn FnOnce() + Send>>,
}

pub struct TaskManager {
    memory_store: Arc<CoreWorkerMemoryStore>,
    reference_counter: Arc<ReferenceCounter>,
    retry_sink: RetrySink,
    state: Mutex<TaskManagerState>,
}

impl TaskManager {
    pub fn new(
        memory_store: Arc<CoreWorkerMemoryStore>,
        reference_counter: Arc<ReferenceCounter>,
        retry_sink: RetrySink,
    ) -> Self {
        Self {
            memory_store,
            reference_counter,
            retry_sink,
            state: Mutex::new(TaskManagerState {
                pending: HashMap::new(),
                shutdown_hook: None,
            }),
        }
    }

    /// Register a task before handing it to a submitter. The submitting
    /// worker owns every return object from the moment its id is assigned.
    pub fn add_pending_task(
        &self,
        caller_id: TaskId,
        caller_address: Address,
        spec: TaskSpec,
        max_retries: u64,
    ) {
        for return_id in task_spec_builder::return_ids(&spec) {
            self.reference_counter
                .add_owned_object(return_id, caller_id, caller_address.clone());
        }
        let task_id = task_spec_builder::task_id(&spec);
        self.state.lock().pending.insert(
            task_id,
            PendingTask {
                spec,
                caller_id,
                caller_address,
                num_retries_left: max_retries,
            },
        );
    }

    pub fn is_task_pending(&self, task_id: &TaskId) -> bool {
        self.state.lock().pending.contains_key(task_id)
    }

    pub fn num_pending_tasks(&self) -> usize {
        self.state.lock().pending.len()
    }

    /// Record successful completion: write the returns into the memory
    /// store, then retire the pending record.
    pub fn complete_pending_task(&self, task_id: TaskId, return_objects: &[rpc::ReturnObject]) {
        for ret in return_objects {
            let object_id = hive_common::id::ObjectId::from_binary(&ret.object_id);
            let object = if ret.in_plasma {
                RayObject::from_error(ErrorType::ObjectInPlasma)
            } else {
                RayObject::new(
                    (!ret.data.is_empty()).then(|| Bytes::copy_from_slice(&ret.data)),
                    (!ret.metadata.is_empty()).then(|| Bytes::copy_from_slice(&ret.metadata)),
                    Vec::new(),
                )
            };
            // Retried attempts re-deliver identical returns; duplicates are
            // expected and dropped.
            if let Err(e) = self.memory_store.put(object_id, object) {
                tracing::debug!(object_id = %object_id, error = %e, "return already stored");
            }
        }

        let hook = {
            let mut state = self.state.lock();
            state.pending.remove(&task_id);
            if state.pending.is_empty() {
                state.shutdown_hook.take()
            } else {
                None
            }
        };
        if let Some(hook) = hook {
            hook();
        }
    }

    /// Record a failure. If retries remain the spec goes to the retry sink
    /// and the task stays pending (same task id, same return ids).
    /// Otherwise every return id is resolved to an error object carrying
    /// `error_type`.
    pub fn pending_task_failed(&self, task_id: TaskId, error_type: ErrorType) {
        enum Outcome {
            Retry(TaskSpec),
            Fail(TaskSpec, TaskId, Address),
            Unknown,
        }

        let outcome = {
            let mut state = self.state.lock();
            match state.pending.get_mut(&task_id) {
                Some(pending) if pending.num_retries_left > 0 => {
                    pending.num_retries_left -= 1;
                    Outcome::Retry(pending.spec.clone())
                }
                Some(pending) => Outcome::Fail(
                    pending.spec.clone(),
                    pending.caller_id,
                    pending.caller_address.clone(),
                ),
                None => Outcome::Unknown,
            }
        };

        match outcome {
            Outcome::Retry(spec) => {
                tracing::error!(
                    task_id = %task_id,
                    error = ?error_type,
                    "task failed, scheduling resubmission"
                );
                (self.retry_sink)(spec);
            }
            Outcome::Fail(spec, caller_id, caller_address) => {
                tracing::warn!(
                    task_id = %task_id,
                    caller_id = %caller_id,
                    caller = %caller_address.ip_address,
                    error = ?error_type,
                    "task failed, no retries left"
                );
                for return_id in task_spec_builder::return_ids(&spec) {
                    if let Err(e) = self
                        .memory_store
                        .put(return_id, RayObject::from_error(error_type))
                    {
                        tracing::debug!(object_id = %return_id, error = %e, "error already stored");
                    }
                }
                tracing::debug!(
                    in_scope = self.reference_counter.num_object_ids_in_scope(),
                    "object ids in scope after task failure"
                );
                let hook = {
                    let mut state = self.state.lock();
                    state.pending.remove(&task_id);
                    if state.pending.is_empty() {
                        state.shutdown_hook.take()
                    } else {
                        None
                    }
                };
                if let Some(hook) = hook {
                    hook();
                }
            }
            Outcome::Unknown => {
                tracing::debug!(task_id = %task_id, "failure reported for unknown task");
            }
        }
    }

    /// Invoke `hook` once every pending task has resolved. Runs immediately
    /// when nothing is pending.
    pub fn drain_and_shutdown(&self, hook: Box<dyn FnOnce() + Send>) {
        let run_now = {
            let mut state = self.state.lock();
            if state.pending.is_empty() {
                true
            } else {
                state.shutdown_hook = Some(hook);
                return;
            }
        };
        if run_now {
            hook();
        }
    }
}
