// Copyright 2026 The Hive Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//  http://www.apache.org/licenses/LICENSE-2.0

//! RPC handlers exposed by the worker.
//!
//! Every handler first rejects requests intended for a different worker.
//! Replies may be deferred: `GetObjectStatus` answers when the producing
//! task completes, and `WaitForObjectEviction` answers when the local
//! reference record dies.

use std::sync::Arc;

use tonic::Status;

use hive_common::id::{ActorId, ObjectId, TaskId, WorkerId};
use hive_proto::rpc::{self, ObjectStatus};

use crate::core_worker::CoreWorker;
use crate::error::CoreWorkerError;

/// The RPC service surface wrapping the worker runtime.
pub struct CoreWorkerGrpcService {
    pub core_worker: Arc<CoreWorker>,
}

// tonic::Status is large by design; all RPC surfaces return it.
#[allow(clippy::result_large_err)]
impl CoreWorkerGrpcService {
    pub fn new(core_worker: Arc<CoreWorker>) -> Self {
        Self { core_worker }
    }

    fn check_recipient(&self, intended_worker_id: &[u8]) -> Result<(), Status> {
        if intended_worker_id.len() == WorkerId::SIZE {
            let intended = WorkerId::from_binary(intended_worker_id);
            if !intended.is_nil() && intended != self.core_worker.worker_id() {
                return Err(Status::invalid_argument(format!(
                    "request intended for worker {}, this is {}",
                    intended.hex(),
                    self.core_worker.worker_id().hex()
                )));
            }
        }
        Ok(())
    }

    fn to_status(error: CoreWorkerError) -> Status {
        match error {
            CoreWorkerError::InvalidArgument(message) => Status::invalid_argument(message),
            other => Status::internal(other.to_string()),
        }
    }

    fn parse_object_id(bytes: &[u8]) -> Result<ObjectId, Status> {
        if bytes.len() != ObjectId::SIZE {
            return Err(Status::invalid_argument("malformed object id"));
        }
        Ok(ObjectId::from_binary(bytes))
    }

    /// Supervisor-mediated task delivery.
    pub async fn handle_assign_task(
        &self,
        request: rpc::AssignTaskRequest,
    ) -> Result<rpc::AssignTaskReply, Status> {
        self.check_recipient(&request.intended_worker_id)?;
        if self.core_worker.worker_context().current_actor_is_direct_call() {
            return Err(Status::invalid_argument(
                "this actor only accepts direct calls",
            ));
        }
        let receiver = self
            .core_worker
            .raylet_task_receiver()
            .ok_or_else(|| Status::failed_precondition("not a task-executing worker"))?;
        self.core_worker.increment_task_queue_length();
        receiver
            .handle_assign_task(request)
            .await
            .map_err(Self::to_status)
    }

    /// Worker-to-worker task delivery.
    pub async fn handle_push_task(
        &self,
        request: rpc::PushTaskRequest,
    ) -> Result<rpc::PushTaskReply, Status> {
        self.check_recipient(&request.intended_worker_id)?;
        let receiver = self
            .core_worker
            .direct_task_receiver()
            .ok_or_else(|| Status::failed_precondition("not a task-executing worker"))?
            .clone();
        self.core_worker.increment_task_queue_length();
        receiver
            .handle_push_task(request)
            .await
            .map_err(Self::to_status)
    }

    /// A deferred argument became ready.
    pub async fn handle_direct_actor_call_arg_wait_complete(
        &self,
        request: rpc::DirectActorCallArgWaitCompleteRequest,
    ) -> Result<rpc::DirectActorCallArgWaitCompleteReply, Status> {
        self.check_recipient(&request.intended_worker_id)?;
        let receiver = self
            .core_worker
            .direct_task_receiver()
            .ok_or_else(|| Status::failed_precondition("not a task-executing worker"))?;
        receiver.handle_arg_wait_complete(request.tag);
        Ok(rpc::DirectActorCallArgWaitCompleteReply {})
    }

    /// A borrower asks about an object this worker owns. Replies `Created`
    /// once the producing task has completed, parking until then.
    pub async fn handle_get_object_status(
        &self,
        request: rpc::GetObjectStatusRequest,
    ) -> Result<rpc::GetObjectStatusReply, Status> {
        let object_id = Self::parse_object_id(&request.object_id)?;
        if request.owner_id.len() == TaskId::SIZE {
            let owner_id = TaskId::from_binary(&request.owner_id);
            if owner_id != self.core_worker.get_caller_id() {
                tracing::info!(
                    owner_id = %owner_id,
                    "handling status request for object produced by a previous task"
                );
            }
        }

        if self
            .core_worker
            .task_manager()
            .is_task_pending(&object_id.task_id())
        {
            // Hold a reference so the object cannot be evicted out from
            // under the pending reply.
            self.core_worker.add_local_reference(object_id);
            if self
                .core_worker
                .task_manager()
                .is_task_pending(&object_id.task_id())
            {
                let (tx, rx) = tokio::sync::oneshot::channel();
                self.core_worker.memory_store().get_async(
                    object_id,
                    Box::new(move |_obj| {
                        let _ = tx.send(());
                    }),
                );
                self.core_worker.remove_local_reference(&object_id);
                let _ = rx.await;
            } else {
                // Lost the race; the task finished while we registered.
                self.core_worker.remove_local_reference(&object_id);
            }
        }

        Ok(rpc::GetObjectStatusReply {
            status: ObjectStatus::Created as i32,
        })
    }

    /// The supervisor parks this reply until the local reference record
    /// for the pinned object is deleted; an absent record answers at once.
    pub async fn handle_wait_for_object_eviction(
        &self,
        request: rpc::WaitForObjectEvictionRequest,
    ) -> Result<rpc::WaitForObjectEvictionReply, Status> {
        self.check_recipient(&request.intended_worker_id)?;
        let object_id = Self::parse_object_id(&request.object_id)?;

        let (tx, rx) = tokio::sync::oneshot::channel();
        let registered = self.core_worker.reference_counter().set_delete_callback(
            &object_id,
            Box::new(move |_| {
                let _ = tx.send(());
            }),
        );
        if registered {
            let _ = rx.await;
        } else {
            tracing::debug!(object_id = %object_id, "reference already gone, unpinning now");
        }
        Ok(rpc::WaitForObjectEvictionReply {})
    }

    /// Terminal: validates the target actor, then exits the process.
    pub async fn handle_kill_actor(
        &self,
        request: rpc::KillActorRequest,
    ) -> Result<rpc::KillActorReply, Status> {
        if request.intended_actor_id.len() != ActorId::SIZE {
            return Err(Status::invalid_argument("malformed actor id"));
        }
        let intended_actor_id = ActorId::from_binary(&request.intended_actor_id);
        let current_actor_id = self.core_worker.current_actor_id();
        if intended_actor_id != current_actor_id {
            let message = format!(
                "mismatched actor id: ignoring kill for previous actor {intended_actor_id}, \
                 current actor id: {current_actor_id}"
            );
            tracing::error!("{message}");
            return Err(Status::invalid_argument(message));
        }
        tracing::info!("got kill request, exiting immediately");
        self.core_worker.shutdown();
        std::process::exit(1);
    }

    /// Snapshot of runtime state.
    pub async fn handle_get_core_worker_stats(
        &self,
        request: rpc::GetCoreWorkerStatsRequest,
    ) -> Result<rpc::GetCoreWorkerStatsReply, Status> {
        self.check_recipient(&request.intended_worker_id)?;
        Ok(rpc::GetCoreWorkerStatsReply {
            core_worker_stats: Some(self.core_worker.stats()),
        })
    }
}
