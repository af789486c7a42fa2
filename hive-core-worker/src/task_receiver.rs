// Copyright 2026 The Hive Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//  http://www.apache.org/licenses/LICENSE-2.0

//! Task receivers: decode incoming task RPCs and feed the execution thread.
//!
//! The supervisor-mediated path (`AssignTask`) and the worker-to-worker
//! path (`PushTask`) share an executor hook but differ in ordering: direct
//! pushes carry per-caller sequence numbers, and out-of-order arrivals are
//! parked until their turn.

use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::oneshot;

use hive_common::id::{ObjectId, TaskId, WorkerId};
use hive_proto::rpc::{self, TaskSpec};

use crate::error::{CoreWorkerError, CoreWorkerResult};
use crate::task_execution_service::TaskExecutionService;
use crate::task_spec_builder;

/// Runs one task on the execution thread and yields its return objects.
pub type TaskExecutor = Arc<
    dyn Fn(TaskSpec) -> Pin<Box<dyn Future<Output = CoreWorkerResult<Vec<rpc::ReturnObject>>> + Send>>
        + Send
        + Sync,
>;

/// Reports which of the given by-reference argument ids are not yet
/// fetchable, so the task can be deferred until the supervisor signals
/// readiness.
pub type DependencyProbe = Arc<
    dyn Fn(Vec<ObjectId>) -> Pin<Box<dyn Future<Output = Vec<ObjectId>> + Send>> + Send + Sync,
>;

fn caller_id(spec: &TaskSpec) -> TaskId {
    if spec.caller_id.len() == TaskId::SIZE {
        TaskId::from_binary(&spec.caller_id)
    } else {
        TaskId::nil()
    }
}

fn check_recipient(worker_id: &WorkerId, intended: &[u8]) -> CoreWorkerResult<()> {
    if intended.len() == WorkerId::SIZE {
        let intended = WorkerId::from_binary(intended);
        if !intended.is_nil() && intended != *worker_id {
            return Err(CoreWorkerError::InvalidArgument(format!(
                "task intended for worker {} but received by {}",
                intended.hex(),
                worker_id.hex()
            )));
        }
    }
    Ok(())
}

// ─── Supervisor-mediated path ───────────────────────────────────────────────

pub struct CoreWorkerRayletTaskReceiver {
    worker_id: WorkerId,
    execution_service: Arc<TaskExecutionService>,
    executor: TaskExecutor,
}

impl CoreWorkerRayletTaskReceiver {
    pub fn new(
        worker_id: WorkerId,
        execution_service: Arc<TaskExecutionService>,
        executor: TaskExecutor,
    ) -> Self {
        Self {
            worker_id,
            execution_service,
            executor,
        }
    }

    /// Execute a supervisor-assigned task. Return values land in plasma, so
    /// the reply carries no payloads.
    pub async fn handle_assign_task(
        &self,
        request: rpc::AssignTaskRequest,
    ) -> CoreWorkerResult<rpc::AssignTaskReply> {
        check_recipient(&self.worker_id, &request.intended_worker_id)?;
        let spec = request
            .task_spec
            .ok_or_else(|| CoreWorkerError::InvalidArgument("missing task spec".to_string()))?;

        let executor = self.executor.clone();
        let (tx, rx) = oneshot::channel();
        let posted = self.execution_service.post(async move {
            let result = (executor)(spec).await;
            let _ = tx.send(result);
        });
        if !posted {
            return Err(CoreWorkerError::Internal(
                "execution service stopped".to_string(),
            ));
        }
        rx.await
            .map_err(|_| CoreWorkerError::Internal("execution dropped".to_string()))??;
        Ok(rpc::AssignTaskReply {})
    }
}

// ─── Worker-to-worker path ──────────────────────────────────────────────────

#[derive(Default)]
struct SchedulingQueue {
    next_seq: i64,
    waiters: BTreeMap<i64, oneshot::Sender<()>>,
}

pub struct CoreWorkerDirectTaskReceiver {
    worker_id: WorkerId,
    execution_service: Arc<TaskExecutionService>,
    executor: TaskExecutor,
    dependency_probe: DependencyProbe,
    /// Per-caller delivery gates keyed by the submitting task.
    scheduling_queues: Mutex<HashMap<TaskId, SchedulingQueue>>,
    /// Tasks parked on not-yet-ready arguments, keyed by wait tag.
    arg_waiters: Mutex<HashMap<i64, Vec<oneshot::Sender<()>>>>,
    next_wait_tag: AtomicI64,
    /// Set once the resident actor declares itself async; tasks then run as
    /// interleaving fibers instead of serially.
    async_mode: AtomicBool,
}

impl CoreWorkerDirectTaskReceiver {
    pub fn new(
        worker_id: WorkerId,
        execution_service: Arc<TaskExecutionService>,
        executor: TaskExecutor,
        dependency_probe: DependencyProbe,
    ) -> Self {
        Self {
            worker_id,
            execution_service,
            executor,
            dependency_probe,
            scheduling_queues: Mutex::new(HashMap::new()),
            arg_waiters: Mutex::new(HashMap::new()),
            next_wait_tag: AtomicI64::new(0),
            async_mode: AtomicBool::new(false),
        }
    }

    pub fn set_async_mode(&self, enabled: bool) {
        self.async_mode.store(enabled, Ordering::Relaxed);
    }

    /// Execute a directly pushed task and ship its return objects back in
    /// the reply (plasma-resident returns travel as markers).
    pub async fn handle_push_task(
        &self,
        request: rpc::PushTaskRequest,
    ) -> CoreWorkerResult<rpc::PushTaskReply> {
        check_recipient(&self.worker_id, &request.intended_worker_id)?;
        let spec = request
            .task_spec
            .ok_or_else(|| CoreWorkerError::InvalidArgument("missing task spec".to_string()))?;
        let caller = caller_id(&spec);
        let seq = request.sequence_number;

        // Park until every by-reference argument is fetchable. The
        // supervisor wakes us with DirectActorCallArgWaitComplete.
        let by_ref = task_spec_builder::by_ref_arg_ids(&spec);
        if !by_ref.is_empty() {
            let missing = (self.dependency_probe)(by_ref).await;
            if !missing.is_empty() {
                let tag = self.next_wait_tag.fetch_add(1, Ordering::Relaxed);
                let (tx, rx) = oneshot::channel();
                self.arg_waiters.lock().entry(tag).or_default().push(tx);
                tracing::debug!(
                    task_id = %task_spec_builder::task_id(&spec),
                    tag,
                    missing = missing.len(),
                    "deferring task until arguments are ready"
                );
                let _ = rx.await;
            }
        }

        if seq >= 0 {
            self.wait_for_turn(caller, seq).await;
        }

        let executor = self.executor.clone();
        let (tx, rx) = oneshot::channel();
        let job = async move {
            let result = (executor)(spec).await;
            let _ = tx.send(result);
        };
        let posted = if self.async_mode.load(Ordering::Relaxed) {
            self.execution_service.post_concurrent(job)
        } else {
            self.execution_service.post(job)
        };
        // Delivery order is fixed once the job is queued; release the next
        // sequence number without waiting for execution to finish.
        if seq >= 0 {
            self.advance_turn(caller, seq);
        }
        if !posted {
            return Err(CoreWorkerError::Internal(
                "execution service stopped".to_string(),
            ));
        }

        let return_objects = rx
            .await
            .map_err(|_| CoreWorkerError::Internal("execution dropped".to_string()))??;
        Ok(rpc::PushTaskReply {
            return_objects,
            worker_exiting: false,
        })
    }

    /// A previously deferred argument is now ready; wake every task parked
    /// on `tag`.
    pub fn handle_arg_wait_complete(&self, tag: i64) {
        let waiters = self.arg_waiters.lock().remove(&tag).unwrap_or_default();
        for waiter in waiters {
            let _ = waiter.send(());
        }
    }

    async fn wait_for_turn(&self, caller: TaskId, seq: i64) {
        let rx = {
            let mut queues = self.scheduling_queues.lock();
            let queue = queues.entry(caller).or_default();
            if seq <= queue.next_seq {
                None
            } else {
                let (tx, rx) = oneshot::channel();
                queue.waiters.insert(seq, tx);
                Some(rx)
            }
        };
        if let Some(rx) = rx {
            let _ = rx.await;
        }
    }

    fn advance_turn(&self, caller: TaskId, seq: i64) {
        let released = {
            let mut queues = self.scheduling_queues.lock();
            let queue = queues.entry(caller).or_default();
            if seq + 1 > queue.next_seq {
                queue.next_seq = seq + 1;
            }
            queue.waiters.remove(&queue.next_seq)
        };
        if let Some(tx) = released {
            let _ = tx.send(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn recording_executor(log: Arc<Mutex<Vec<Vec<u8>>>>) -> TaskExecutor {
        Arc::new(move |spec: TaskSpec| {
            let log = log.clone();
            Box::pin(async move {
                log.lock().push(spec.task_id.clone());
                Ok(vec![rpc::ReturnObject {
                    object_id: spec.task_id,
                    data: b"out".to_vec(),
                    ..Default::default()
                }])
            })
        })
    }

    fn no_missing_probe() -> DependencyProbe {
        Arc::new(|_ids| Box::pin(async { Vec::new() }))
    }

    fn make_spec(task_byte: u8, caller: &TaskId) -> TaskSpec {
        let mut task_id = vec![0u8; TaskId::SIZE];
        task_id[0] = task_byte;
        TaskSpec {
            task_id,
            caller_id: caller.binary(),
            is_direct_call: true,
            ..Default::default()
        }
    }

    fn push_request(worker_id: &WorkerId, spec: TaskSpec, seq: i64) -> rpc::PushTaskRequest {
        rpc::PushTaskRequest {
            intended_worker_id: worker_id.binary(),
            task_spec: Some(spec),
            sequence_number: seq,
        }
    }

    #[tokio::test]
    async fn test_push_task_executes_and_replies() {
        let worker_id = WorkerId::from_random();
        let log = Arc::new(Mutex::new(Vec::new()));
        let receiver = CoreWorkerDirectTaskReceiver::new(
            worker_id,
            Arc::new(TaskExecutionService::start()),
            recording_executor(log.clone()),
            no_missing_probe(),
        );

        let caller = TaskId::from_random();
        let reply = receiver
            .handle_push_task(push_request(&worker_id, make_spec(1, &caller), 0))
            .await
            .unwrap();
        assert_eq!(reply.return_objects.len(), 1);
        assert_eq!(reply.return_objects[0].data, b"out");
        assert_eq!(log.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_wrong_recipient_rejected() {
        let worker_id = WorkerId::from_random();
        let other = WorkerId::from_random();
        let receiver = CoreWorkerDirectTaskReceiver::new(
            worker_id,
            Arc::new(TaskExecutionService::start()),
            recording_executor(Arc::new(Mutex::new(Vec::new()))),
            no_missing_probe(),
        );

        let caller = TaskId::from_random();
        let err = receiver
            .handle_push_task(push_request(&other, make_spec(1, &caller), 0))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreWorkerError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_out_of_order_pushes_execute_in_sequence() {
        let worker_id = WorkerId::from_random();
        let log = Arc::new(Mutex::new(Vec::new()));
        let receiver = Arc::new(CoreWorkerDirectTaskReceiver::new(
            worker_id,
            Arc::new(TaskExecutionService::start()),
            recording_executor(log.clone()),
            no_missing_probe(),
        ));

        let caller = TaskId::from_random();
        // Deliver sequence numbers 2, 1, 0 in reverse arrival order.
        let mut handles = Vec::new();
        for seq in [2i64, 1, 0] {
            let receiver = receiver.clone();
            let request = push_request(&worker_id, make_spec(seq as u8 + 1, &caller), seq);
            handles.push(tokio::spawn(async move {
                receiver.handle_push_task(request).await
            }));
            // Let the out-of-order arrivals park first.
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let executed: Vec<u8> = log.lock().iter().map(|id| id[0]).collect();
        assert_eq!(executed, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_unordered_pushes_skip_the_gate() {
        let worker_id = WorkerId::from_random();
        let log = Arc::new(Mutex::new(Vec::new()));
        let receiver = CoreWorkerDirectTaskReceiver::new(
            worker_id,
            Arc::new(TaskExecutionService::start()),
            recording_executor(log.clone()),
            no_missing_probe(),
        );

        let caller = TaskId::from_random();
        receiver
            .handle_push_task(push_request(&worker_id, make_spec(9, &caller), -1))
            .await
            .unwrap();
        assert_eq!(log.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_deferred_argument_released_by_wait_complete() {
        let worker_id = WorkerId::from_random();
        let log = Arc::new(Mutex::new(Vec::new()));
        // Every dependency reports missing until the tag fires.
        let probe: DependencyProbe = Arc::new(|ids| Box::pin(async move { ids }));
        let receiver = Arc::new(CoreWorkerDirectTaskReceiver::new(
            worker_id,
            Arc::new(TaskExecutionService::start()),
            recording_executor(log.clone()),
            probe,
        ));

        let caller = TaskId::from_random();
        let mut spec = make_spec(1, &caller);
        spec.args.push(rpc::TaskArg {
            object_ids: vec![vec![3u8; ObjectId::SIZE]],
            ..Default::default()
        });

        let receiver2 = receiver.clone();
        let request = push_request(&worker_id, spec, 0);
        let handle = tokio::spawn(async move { receiver2.handle_push_task(request).await });

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(log.lock().is_empty());

        receiver.handle_arg_wait_complete(0);
        handle.await.unwrap().unwrap();
        assert_eq!(log.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_assign_task_executes() {
        let worker_id = WorkerId::from_random();
        let log = Arc::new(Mutex::new(Vec::new()));
        let receiver = CoreWorkerRayletTaskReceiver::new(
            worker_id,
            Arc::new(TaskExecutionService::start()),
            recording_executor(log.clone()),
        );

        let caller = TaskId::from_random();
        let reply = receiver
            .handle_assign_task(rpc::AssignTaskRequest {
                intended_worker_id: worker_id.binary(),
                task_spec: Some(make_spec(1, &caller)),
            })
            .await;
        assert!(reply.is_ok());
        assert_eq!(log.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_assign_task_missing_spec() {
        let worker_id = WorkerId::from_random();
        let receiver = CoreWorkerRayletTaskReceiver::new(
            worker_id,
            Arc::new(TaskExecutionService::start()),
            recording_executor(Arc::new(Mutex::new(Vec::new()))),
        );

        let err = receiver
            .handle_assign_task(rpc::AssignTaskRequest {
                intended_worker_id: worker_id.binary(),
                task_spec: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, CoreWorkerError::InvalidArgument(_)));
    }
}
