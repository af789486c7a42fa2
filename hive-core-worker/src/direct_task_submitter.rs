// Copyright 2026 The Hive Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//  http://www.apache.org/licenses/LICENSE-2.0

//! Direct normal-task submission.
//!
//! Leases a worker from the supervisor (following spillback redirects),
//! pushes the task to the leased worker over RPC, and reports the outcome
//! to the TaskManager. Transient failures route through the TaskManager's
//! retry path rather than surfacing to the submitting caller.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use hive_common::id::NodeId;
use hive_proto::rpc::{self, ErrorType, TaskSpec};
use hive_raylet_rpc_client::RayletClient;
use hive_worker_rpc_client::ClientFactory;

use crate::error::CoreWorkerResult;
use crate::options::RayletClientFactory;
use crate::task_manager::TaskManager;
use crate::task_spec_builder;

pub struct CoreWorkerDirectTaskSubmitter {
    local_raylet_client: Arc<dyn RayletClient>,
    raylet_client_factory: Option<RayletClientFactory>,
    client_factory: ClientFactory,
    task_manager: Arc<TaskManager>,
    local_raylet_id: NodeId,
    lease_timeout_ms: u64,
    num_in_flight: AtomicUsize,
}

impl CoreWorkerDirectTaskSubmitter {
    pub fn new(
        local_raylet_client: Arc<dyn RayletClient>,
        raylet_client_factory: Option<RayletClientFactory>,
        client_factory: ClientFactory,
        task_manager: Arc<TaskManager>,
        local_raylet_id: NodeId,
        lease_timeout_ms: u64,
    ) -> Self {
        Self {
            local_raylet_client,
            raylet_client_factory,
            client_factory,
            task_manager,
            local_raylet_id,
            lease_timeout_ms,
            num_in_flight: AtomicUsize::new(0),
        }
    }

    /// Submit a task. Returns as soon as the work is queued; the outcome is
    /// reported to the TaskManager (completion, or failure with retry).
    pub fn submit_task(self: &Arc<Self>, spec: TaskSpec) -> CoreWorkerResult<()> {
        self.num_in_flight.fetch_add(1, Ordering::Relaxed);
        let this = self.clone();
        tokio::spawn(async move {
            this.submit_inner(spec).await;
            this.num_in_flight.fetch_sub(1, Ordering::Relaxed);
        });
        Ok(())
    }

    pub fn num_in_flight(&self) -> usize {
        self.num_in_flight.load(Ordering::Relaxed)
    }

    async fn submit_inner(&self, spec: TaskSpec) {
        let task_id = task_spec_builder::task_id(&spec);

        let worker_address = match self.lease_worker(&spec).await {
            Ok(address) => address,
            Err(message) => {
                tracing::warn!(task_id = %task_id, error = %message, "worker lease failed");
                self.task_manager
                    .pending_task_failed(task_id, ErrorType::WorkerDied);
                return;
            }
        };

        let client = (self.client_factory)(&worker_address);
        let req = rpc::PushTaskRequest {
            intended_worker_id: worker_address.worker_id.clone(),
            task_spec: Some(spec),
            sequence_number: -1,
        };
        match client.push_task(req).await {
            Ok(reply) => {
                self.task_manager
                    .complete_pending_task(task_id, &reply.return_objects);
            }
            Err(e) => {
                tracing::warn!(task_id = %task_id, error = %e, "push task failed");
                self.task_manager
                    .pending_task_failed(task_id, ErrorType::WorkerDied);
            }
        }
    }

    /// Request a worker lease, following spillback redirects to remote
    /// supervisors. Each hop is bounded by the lease timeout.
    async fn lease_worker(&self, spec: &TaskSpec) -> Result<rpc::Address, String> {
        let mut raylet_client = self.local_raylet_client.clone();
        let mut raylet_id = self.local_raylet_id;
        loop {
            let req = rpc::RequestWorkerLeaseRequest {
                task_spec: Some(spec.clone()),
            };
            let reply = tokio::time::timeout(
                Duration::from_millis(self.lease_timeout_ms),
                raylet_client.request_worker_lease(req),
            )
            .await
            .map_err(|_| format!("lease timed out after {} ms", self.lease_timeout_ms))?
            .map_err(|e| format!("lease rpc failed: {e}"))?;

            if let Some(worker_address) = reply.worker_address {
                return Ok(worker_address);
            }
            if let Some(retry_at) = reply.retry_at_raylet_address {
                tracing::debug!(
                    from = %raylet_id,
                    to = %hex_of(&retry_at.raylet_id),
                    "lease spilled back to remote node"
                );
                raylet_id = NodeId::from_binary(&retry_at.raylet_id);
                raylet_client = match &self.raylet_client_factory {
                    Some(factory) => factory(&retry_at),
                    None => self.local_raylet_client.clone(),
                };
                continue;
            }
            return Err("lease reply carried neither a worker nor a redirect".to_string());
        }
    }
}

fn hex_of(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory_store::CoreWorkerMemoryStore;
    use crate::reference_counter::ReferenceCounter;
    use hive_common::id::{ObjectId, TaskId, TaskTransportType};
    use hive_proto::rpc::Address;
    use hive_worker_rpc_client::CoreWorkerClient;
    use parking_lot::Mutex;
    use std::sync::atomic::AtomicU32;
    use tonic::Status;

    struct MockRaylet {
        replies: Mutex<Vec<Result<rpc::RequestWorkerLeaseReply, ()>>>,
        lease_requests: AtomicU32,
    }

    impl MockRaylet {
        fn new(replies: Vec<Result<rpc::RequestWorkerLeaseReply, ()>>) -> Self {
            Self {
                replies: Mutex::new(replies),
                lease_requests: AtomicU32::new(0),
            }
        }
    }

    #[async_trait::async_trait]
    impl RayletClient for MockRaylet {
        async fn request_worker_lease(
            &self,
            _req: rpc::RequestWorkerLeaseRequest,
        ) -> Result<rpc::RequestWorkerLeaseReply, Status> {
            self.lease_requests.fetch_add(1, Ordering::Relaxed);
            let mut replies = self.replies.lock();
            if replies.is_empty() {
                return Err(Status::unavailable("no reply scripted"));
            }
            replies
                .remove(0)
                .map_err(|_| Status::unavailable("lease refused"))
        }

        async fn cancel_worker_lease(
            &self,
            _req: rpc::CancelWorkerLeaseRequest,
        ) -> Result<rpc::CancelWorkerLeaseReply, Status> {
            Ok(rpc::CancelWorkerLeaseReply::default())
        }

        async fn submit_task(
            &self,
            _req: rpc::SubmitTaskRequest,
        ) -> Result<rpc::SubmitTaskReply, Status> {
            Ok(rpc::SubmitTaskReply::default())
        }

        async fn pin_object_ids(
            &self,
            _req: rpc::PinObjectIdsRequest,
        ) -> Result<rpc::PinObjectIdsReply, Status> {
            Ok(rpc::PinObjectIdsReply::default())
        }

        async fn notify_direct_call_task_blocked(
            &self,
            _req: rpc::NotifyDirectCallTaskBlockedRequest,
        ) -> Result<rpc::NotifyDirectCallTaskBlockedReply, Status> {
            Ok(rpc::NotifyDirectCallTaskBlockedReply::default())
        }

        async fn push_error(
            &self,
            _req: rpc::PushErrorRequest,
        ) -> Result<rpc::PushErrorReply, Status> {
            Ok(rpc::PushErrorReply::default())
        }

        async fn set_resource(
            &self,
            _req: rpc::SetResourceRequest,
        ) -> Result<rpc::SetResourceReply, Status> {
            Ok(rpc::SetResourceReply::default())
        }

        async fn prepare_actor_checkpoint(
            &self,
            _req: rpc::PrepareActorCheckpointRequest,
        ) -> Result<rpc::PrepareActorCheckpointReply, Status> {
            Ok(rpc::PrepareActorCheckpointReply::default())
        }

        async fn notify_actor_resumed_from_checkpoint(
            &self,
            _req: rpc::NotifyActorResumedFromCheckpointRequest,
        ) -> Result<rpc::NotifyActorResumedFromCheckpointReply, Status> {
            Ok(rpc::NotifyActorResumedFromCheckpointReply::default())
        }

        fn disconnect(&self) {}
    }

    struct MockWorker {
        pushed: AtomicU32,
        fail: bool,
    }

    #[async_trait::async_trait]
    impl CoreWorkerClient for MockWorker {
        async fn push_task(
            &self,
            _req: rpc::PushTaskRequest,
        ) -> Result<rpc::PushTaskReply, Status> {
            if self.fail {
                return Err(Status::unavailable("worker gone"));
            }
            self.pushed.fetch_add(1, Ordering::Relaxed);
            Ok(rpc::PushTaskReply::default())
        }

        async fn get_object_status(
            &self,
            _req: rpc::GetObjectStatusRequest,
        ) -> Result<rpc::GetObjectStatusReply, Status> {
            Ok(rpc::GetObjectStatusReply::default())
        }

        async fn kill_actor(
            &self,
            _req: rpc::KillActorRequest,
        ) -> Result<rpc::KillActorReply, Status> {
            Ok(rpc::KillActorReply::default())
        }

        async fn direct_actor_call_arg_wait_complete(
            &self,
            _req: rpc::DirectActorCallArgWaitCompleteRequest,
        ) -> Result<rpc::DirectActorCallArgWaitCompleteReply, Status> {
            Ok(rpc::DirectActorCallArgWaitCompleteReply::default())
        }
    }

    fn granted_lease() -> rpc::RequestWorkerLeaseReply {
        rpc::RequestWorkerLeaseReply {
            worker_address: Some(Address {
                ip_address: "10.0.0.1".to_string(),
                port: 7000,
                worker_id: vec![2u8; 16],
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    struct Fixture {
        submitter: Arc<CoreWorkerDirectTaskSubmitter>,
        task_manager: Arc<TaskManager>,
        memory_store: Arc<CoreWorkerMemoryStore>,
        worker: Arc<MockWorker>,
        raylet: Arc<MockRaylet>,
        retries: Arc<Mutex<Vec<TaskSpec>>>,
    }

    fn make_fixture(
        replies: Vec<Result<rpc::RequestWorkerLeaseReply, ()>>,
        fail_push: bool,
    ) -> Fixture {
        let memory_store = Arc::new(CoreWorkerMemoryStore::new());
        let retries = Arc::new(Mutex::new(Vec::new()));
        let retries2 = retries.clone();
        let task_manager = Arc::new(TaskManager::new(
            memory_store.clone(),
            Arc::new(ReferenceCounter::new()),
            Box::new(move |spec| retries2.lock().push(spec)),
        ));
        let worker = Arc::new(MockWorker {
            pushed: AtomicU32::new(0),
            fail: fail_push,
        });
        let worker2 = worker.clone();
        let client_factory: ClientFactory = Arc::new(move |_addr| worker2.clone() as Arc<dyn CoreWorkerClient>);
        let raylet = Arc::new(MockRaylet::new(replies));
        let submitter = Arc::new(CoreWorkerDirectTaskSubmitter::new(
            raylet.clone(),
            None,
            client_factory,
            task_manager.clone(),
            NodeId::from_random(),
            1_000,
        ));
        Fixture {
            submitter,
            task_manager,
            memory_store,
            worker,
            raylet,
            retries,
        }
    }

    fn make_spec() -> TaskSpec {
        TaskSpec {
            task_id: TaskId::from_random().binary(),
            num_returns: 1,
            is_direct_call: true,
            ..Default::default()
        }
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    #[tokio::test]
    async fn test_lease_then_push_then_complete() {
        let fx = make_fixture(vec![Ok(granted_lease())], false);
        let spec = make_spec();
        let task_id = task_spec_builder::task_id(&spec);
        fx.task_manager
            .add_pending_task(TaskId::nil(), Address::default(), spec.clone(), 0);

        fx.submitter.submit_task(spec).unwrap();
        settle().await;

        assert_eq!(fx.worker.pushed.load(Ordering::Relaxed), 1);
        assert!(!fx.task_manager.is_task_pending(&task_id));
        assert_eq!(fx.submitter.num_in_flight(), 0);
    }

    #[tokio::test]
    async fn test_spillback_follows_redirect() {
        let redirect = rpc::RequestWorkerLeaseReply {
            retry_at_raylet_address: Some(Address {
                raylet_id: vec![9u8; 16],
                ip_address: "10.0.0.9".to_string(),
                port: 6000,
                ..Default::default()
            }),
            ..Default::default()
        };
        let fx = make_fixture(vec![Ok(redirect), Ok(granted_lease())], false);
        let spec = make_spec();
        fx.task_manager
            .add_pending_task(TaskId::nil(), Address::default(), spec.clone(), 0);

        fx.submitter.submit_task(spec).unwrap();
        settle().await;

        assert_eq!(fx.raylet.lease_requests.load(Ordering::Relaxed), 2);
        assert_eq!(fx.worker.pushed.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_transient_lease_failure_routes_to_retry() {
        let fx = make_fixture(vec![Err(())], false);
        let spec = make_spec();
        let task_id = task_spec_builder::task_id(&spec);
        fx.task_manager
            .add_pending_task(TaskId::nil(), Address::default(), spec.clone(), 1);

        fx.submitter.submit_task(spec.clone()).unwrap();
        settle().await;

        // One retry budgeted: the spec landed in the retry sink with the
        // same task id, and the task is still pending.
        assert_eq!(fx.retries.lock().len(), 1);
        assert_eq!(fx.retries.lock()[0].task_id, spec.task_id);
        assert!(fx.task_manager.is_task_pending(&task_id));
    }

    #[tokio::test]
    async fn test_push_failure_without_retries_writes_error_object() {
        let fx = make_fixture(vec![Ok(granted_lease())], true);
        let spec = make_spec();
        let task_id = task_spec_builder::task_id(&spec);
        let return_id = ObjectId::for_task_return(&task_id, 1, TaskTransportType::Direct);
        fx.task_manager
            .add_pending_task(TaskId::nil(), Address::default(), spec.clone(), 0);

        fx.submitter.submit_task(spec).unwrap();
        settle().await;

        assert!(fx.memory_store.get_one(&return_id).unwrap().is_user_exception());
        assert!(fx.retries.lock().is_empty());
    }
}
