// Copyright 2026 The Hive Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//  http://www.apache.org/licenses/LICENSE-2.0

//! Actor handle registry with lifecycle subscriptions.
//!
//! The first registration of a handle subscribes to the metadata service's
//! notifications for that actor; the subscription callback drives the
//! submitter's connect/disconnect state machine. Dead actors keep their
//! handle so later submissions fail synchronously instead of resubscribing.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use hive_common::id::ActorId;
use hive_gcs_rpc_client::{ActorNotificationCallback, GcsClient};
use hive_proto::rpc::{ActorState, ActorTableData};

use crate::actor_handle::ActorHandle;
use crate::direct_actor_submitter::CoreWorkerDirectActorTaskSubmitter;
use crate::error::{CoreWorkerError, CoreWorkerResult};

pub struct ActorManager {
    handles: Mutex<HashMap<ActorId, Arc<ActorHandle>>>,
    gcs_client: Arc<dyn GcsClient>,
    direct_actor_submitter: Arc<CoreWorkerDirectActorTaskSubmitter>,
}

impl ActorManager {
    pub fn new(
        gcs_client: Arc<dyn GcsClient>,
        direct_actor_submitter: Arc<CoreWorkerDirectActorTaskSubmitter>,
    ) -> Self {
        Self {
            handles: Mutex::new(HashMap::new()),
            gcs_client,
            direct_actor_submitter,
        }
    }

    /// Register a handle. Returns false (silent success) when a handle for
    /// the actor already exists; the first insertion subscribes to the
    /// actor's lifecycle notifications.
    pub async fn add_actor_handle(
        self: &Arc<Self>,
        handle: ActorHandle,
    ) -> CoreWorkerResult<bool> {
        let actor_id = handle.actor_id();
        let inserted = {
            let mut handles = self.handles.lock();
            if handles.contains_key(&actor_id) {
                false
            } else {
                handles.insert(actor_id, Arc::new(handle));
                true
            }
        };

        if inserted {
            let weak = Arc::downgrade(self);
            let callback: ActorNotificationCallback = Arc::new(move |actor_id, data| {
                if let Some(manager) = weak.upgrade() {
                    manager.handle_actor_notification(actor_id, data);
                }
            });
            self.gcs_client
                .subscribe_actor(actor_id, callback)
                .await
                .map_err(|e| CoreWorkerError::Rpc(e.to_string()))?;
        }
        Ok(inserted)
    }

    pub fn get_actor_handle(&self, actor_id: &ActorId) -> CoreWorkerResult<Arc<ActorHandle>> {
        self.handles
            .lock()
            .get(actor_id)
            .cloned()
            .ok_or_else(|| CoreWorkerError::ActorNotFound(actor_id.hex()))
    }

    pub fn num_handles(&self) -> usize {
        self.handles.lock().len()
    }

    /// Emit the stable serialized form of a registered handle.
    pub fn serialize_actor_handle(&self, actor_id: &ActorId) -> CoreWorkerResult<Vec<u8>> {
        Ok(self.get_actor_handle(actor_id)?.serialize())
    }

    /// Reconstruct and register a handle received from another process.
    /// Duplicate registration is a silent success.
    pub async fn deserialize_and_register_actor_handle(
        self: &Arc<Self>,
        serialized: &[u8],
    ) -> CoreWorkerResult<ActorId> {
        let handle = ActorHandle::deserialize(serialized)?;
        let actor_id = handle.actor_id();
        self.add_actor_handle(handle).await?;
        Ok(actor_id)
    }

    /// Drop every handle and its subscription. Called at the end of each
    /// non-actor task.
    pub fn clear_all(&self) {
        let actor_ids: Vec<ActorId> = {
            let mut handles = self.handles.lock();
            let ids = handles.keys().copied().collect();
            handles.clear();
            ids
        };
        if actor_ids.is_empty() {
            return;
        }
        let gcs_client = self.gcs_client.clone();
        tokio::spawn(async move {
            for actor_id in actor_ids {
                if let Err(e) = gcs_client.unsubscribe_actor(actor_id).await {
                    tracing::debug!(actor_id = %actor_id, error = %e, "unsubscribe failed");
                }
            }
        });
    }

    /// The lifecycle state machine driven by metadata-service notifications.
    fn handle_actor_notification(&self, actor_id: ActorId, data: ActorTableData) {
        let state = ActorState::try_from(data.state).unwrap_or(ActorState::Alive);
        let handle = self.handles.lock().get(&actor_id).cloned();

        match state {
            ActorState::Reconstructing => {
                if let Some(handle) = &handle {
                    if handle.is_direct_call_actor() {
                        // The next incarnation will not know the sequence
                        // numbers sent to the previous one.
                        handle.reset();
                    }
                    handle.mark_reconstructing();
                }
                self.direct_actor_submitter.disconnect_actor(actor_id, false);
            }
            ActorState::Dead => {
                self.direct_actor_submitter.disconnect_actor(actor_id, true);
                if let Some(handle) = &handle {
                    handle.mark_dead();
                }
                // The handle stays registered: clients may still submit,
                // which must fail synchronously, and unsubscription is
                // deferred to process exit.
            }
            ActorState::Alive => {
                if let Some(handle) = &handle {
                    handle.mark_alive();
                }
                if let Some(address) = data.address {
                    self.direct_actor_submitter.connect_actor(actor_id, address);
                }
            }
        }

        tracing::info!(
            actor_id = %actor_id,
            state = ?state,
            "received actor lifecycle notification"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory_store::CoreWorkerMemoryStore;
    use crate::reference_counter::ReferenceCounter;
    use crate::task_manager::TaskManager;
    use hive_common::id::{JobId, ObjectId, TaskId, TaskTransportType};
    use hive_proto::rpc::{self, Address, Language};
    use hive_worker_rpc_client::{ClientFactory, CoreWorkerClient};
    use tonic::Status;

    #[derive(Default)]
    struct MockGcsClient {
        subscriptions: Mutex<HashMap<ActorId, ActorNotificationCallback>>,
        unsubscribed: Mutex<Vec<ActorId>>,
    }

    impl MockGcsClient {
        fn publish(&self, actor_id: ActorId, data: ActorTableData) {
            let callback = self.subscriptions.lock().get(&actor_id).cloned();
            if let Some(callback) = callback {
                callback(actor_id, data);
            }
        }
    }

    #[async_trait::async_trait]
    impl GcsClient for MockGcsClient {
        async fn connect(&self) -> Result<(), Status> {
            Ok(())
        }

        async fn subscribe_actor(
            &self,
            actor_id: ActorId,
            callback: ActorNotificationCallback,
        ) -> Result<(), Status> {
            self.subscriptions.lock().insert(actor_id, callback);
            Ok(())
        }

        async fn unsubscribe_actor(&self, actor_id: ActorId) -> Result<(), Status> {
            self.unsubscribed.lock().push(actor_id);
            self.subscriptions.lock().remove(&actor_id);
            Ok(())
        }

        async fn add_task_data(&self, _task_spec: rpc::TaskSpec) -> Result<(), Status> {
            Ok(())
        }

        fn disconnect(&self) {}
    }

    struct NullWorkerClient;

    #[async_trait::async_trait]
    impl CoreWorkerClient for NullWorkerClient {
        async fn push_task(
            &self,
            _req: rpc::PushTaskRequest,
        ) -> Result<rpc::PushTaskReply, Status> {
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

    struct Fixture {
        manager: Arc<ActorManager>,
        gcs: Arc<MockGcsClient>,
        submitter: Arc<CoreWorkerDirectActorTaskSubmitter>,
    }

    fn make_fixture() -> Fixture {
        let gcs = Arc::new(MockGcsClient::default());
        let task_manager = Arc::new(TaskManager::new(
            Arc::new(CoreWorkerMemoryStore::new()),
            Arc::new(ReferenceCounter::new()),
            Box::new(|_| {}),
        ));
        let factory: ClientFactory = Arc::new(|_addr| Arc::new(NullWorkerClient) as Arc<dyn CoreWorkerClient>);
        let submitter = Arc::new(CoreWorkerDirectActorTaskSubmitter::new(
            factory,
            task_manager,
        ));
        let manager = Arc::new(ActorManager::new(gcs.clone(), submitter.clone()));
        Fixture {
            manager,
            gcs,
            submitter,
        }
    }

    fn make_handle() -> ActorHandle {
        let actor_id = ActorId::from_random();
        let creation_task = TaskId::for_actor_creation_task(&actor_id);
        ActorHandle::new(
            actor_id,
            JobId::from_int(1),
            ObjectId::for_task_return(&creation_task, 1, TaskTransportType::Direct),
            Language::Rust,
            true,
            vec!["Actor".into()],
        )
    }

    #[tokio::test]
    async fn test_first_insert_subscribes() {
        let fx = make_fixture();
        let handle = make_handle();
        let actor_id = handle.actor_id();

        assert!(fx.manager.add_actor_handle(handle).await.unwrap());
        assert!(fx.gcs.subscriptions.lock().contains_key(&actor_id));
        assert_eq!(fx.manager.num_handles(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_insert_is_silent() {
        let fx = make_fixture();
        let handle = make_handle();
        let serialized = handle.serialize();

        assert!(fx.manager.add_actor_handle(handle).await.unwrap());
        let dup = ActorHandle::deserialize(&serialized).unwrap();
        assert!(!fx.manager.add_actor_handle(dup).await.unwrap());
        assert_eq!(fx.manager.num_handles(), 1);
    }

    #[tokio::test]
    async fn test_reconstructing_resets_handle() {
        let fx = make_fixture();
        let handle = make_handle();
        let actor_id = handle.actor_id();
        fx.manager.add_actor_handle(handle).await.unwrap();

        // Burn a sequence number so reset is observable.
        let handle = fx.manager.get_actor_handle(&actor_id).unwrap();
        let mut builder = crate::task_spec_builder::TaskSpecBuilder::new();
        handle.set_actor_task_spec(
            &mut builder,
            TaskTransportType::Direct,
            ObjectId::for_task_return(&TaskId::from_random(), 1, TaskTransportType::Direct),
        );
        assert_eq!(builder.build().actor_task_spec.unwrap().actor_counter, 0);

        fx.gcs.publish(
            actor_id,
            ActorTableData {
                actor_id: actor_id.binary(),
                state: ActorState::Reconstructing as i32,
                address: None,
            },
        );

        assert_eq!(handle.actor_state(), ActorState::Reconstructing);
        let mut builder = crate::task_spec_builder::TaskSpecBuilder::new();
        handle.set_actor_task_spec(
            &mut builder,
            TaskTransportType::Direct,
            ObjectId::for_task_return(&TaskId::from_random(), 1, TaskTransportType::Direct),
        );
        // Sequence restarted from zero.
        assert_eq!(builder.build().actor_task_spec.unwrap().actor_counter, 0);
    }

    #[tokio::test]
    async fn test_dead_marks_handle_but_keeps_it() {
        let fx = make_fixture();
        let handle = make_handle();
        let actor_id = handle.actor_id();
        fx.manager.add_actor_handle(handle).await.unwrap();

        fx.gcs.publish(
            actor_id,
            ActorTableData {
                actor_id: actor_id.binary(),
                state: ActorState::Dead as i32,
                address: None,
            },
        );

        let handle = fx.manager.get_actor_handle(&actor_id).unwrap();
        assert!(handle.is_dead());
        assert_eq!(fx.manager.num_handles(), 1);
    }

    #[tokio::test]
    async fn test_alive_connects_submitter() {
        let fx = make_fixture();
        let handle = make_handle();
        let actor_id = handle.actor_id();
        fx.manager.add_actor_handle(handle).await.unwrap();

        fx.gcs.publish(
            actor_id,
            ActorTableData {
                actor_id: actor_id.binary(),
                state: ActorState::Alive as i32,
                address: Some(Address {
                    ip_address: "10.0.0.2".to_string(),
                    port: 7000,
                    ..Default::default()
                }),
            },
        );

        // A task submitted now goes straight out instead of queueing.
        let spec = rpc::TaskSpec {
            task_id: TaskId::from_random().binary(),
            num_returns: 1,
            is_direct_call: true,
            actor_task_spec: Some(rpc::ActorTaskSpec {
                actor_id: actor_id.binary(),
                actor_counter: 0,
                ..Default::default()
            }),
            ..Default::default()
        };
        fx.submitter.submit_task(spec).unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert_eq!(fx.submitter.num_pending_tasks(&actor_id), 0);
    }

    #[tokio::test]
    async fn test_clear_all_unsubscribes() {
        let fx = make_fixture();
        let handle = make_handle();
        let actor_id = handle.actor_id();
        fx.manager.add_actor_handle(handle).await.unwrap();

        fx.manager.clear_all();
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert_eq!(fx.manager.num_handles(), 0);
        assert_eq!(fx.gcs.unsubscribed.lock().as_slice(), &[actor_id]);
    }

    #[tokio::test]
    async fn test_serialize_registered_handle() {
        let fx = make_fixture();
        let handle = make_handle();
        let actor_id = handle.actor_id();
        fx.manager.add_actor_handle(handle).await.unwrap();

        let serialized = fx.manager.serialize_actor_handle(&actor_id).unwrap();
        let restored = ActorHandle::deserialize(&serialized).unwrap();
        assert_eq!(restored.actor_id(), actor_id);
    }
}
