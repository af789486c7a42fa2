// Copyright 2026 The Hive Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//  http://www.apache.org/licenses/LICENSE-2.0

//! Direct actor task submission.
//!
//! Each actor gets an ordered queue keyed by the handle-assigned sequence
//! number. Tasks wait in the queue until the metadata service publishes an
//! address; a single drain loop per actor then delivers them in order. A
//! soft disconnect (restart in progress) keeps the queue for reissue on
//! reconnect; a hard disconnect (actor dead) fails everything queued.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use parking_lot::Mutex;

use hive_common::id::ActorId;
use hive_proto::rpc::{self, Address, ErrorType, TaskSpec};
use hive_worker_rpc_client::{ClientFactory, CoreWorkerClient};

use crate::error::{CoreWorkerError, CoreWorkerResult};
use crate::task_manager::TaskManager;
use crate::task_spec_builder;

enum ConnectionState {
    /// No published address (initial state, or restart in progress).
    Disconnected,
    Connected(Arc<dyn CoreWorkerClient>),
    Dead,
}

struct ActorSubmitState {
    connection: ConnectionState,
    address: Option<Address>,
    /// Queued tasks keyed by sequence number. Entries are removed only on
    /// acknowledgement, so a reconnect reissues everything unacked.
    pending_requests: BTreeMap<u64, TaskSpec>,
    /// Sequence numbers sent on the current connection.
    sent: HashSet<u64>,
    draining: bool,
    pending_kill: bool,
}

impl Default for ActorSubmitState {
    fn default() -> Self {
        Self {
            connection: ConnectionState::Disconnected,
            address: None,
            pending_requests: BTreeMap::new(),
            sent: HashSet::new(),
            draining: false,
            pending_kill: false,
        }
    }
}

pub struct CoreWorkerDirectActorTaskSubmitter {
    client_factory: ClientFactory,
    task_manager: Arc<TaskManager>,
    states: Mutex<HashMap<ActorId, ActorSubmitState>>,
}

impl CoreWorkerDirectActorTaskSubmitter {
    pub fn new(client_factory: ClientFactory, task_manager: Arc<TaskManager>) -> Self {
        Self {
            client_factory,
            task_manager,
            states: Mutex::new(HashMap::new()),
        }
    }

    /// Queue an actor task for ordered delivery. Tasks submitted to a dead
    /// actor resolve immediately to `ActorDied` error objects.
    pub fn submit_task(self: &Arc<Self>, spec: TaskSpec) -> CoreWorkerResult<()> {
        let actor_spec = spec.actor_task_spec.as_ref().ok_or_else(|| {
            CoreWorkerError::InvalidArgument("actor task spec missing".to_string())
        })?;
        let actor_id = ActorId::from_binary(&actor_spec.actor_id);
        let counter = actor_spec.actor_counter;
        let task_id = task_spec_builder::task_id(&spec);

        let dead = {
            let mut states = self.states.lock();
            let entry = states.entry(actor_id).or_default();
            if matches!(entry.connection, ConnectionState::Dead) {
                true
            } else {
                entry.pending_requests.insert(counter, spec);
                false
            }
        };

        if dead {
            self.task_manager
                .pending_task_failed(task_id, ErrorType::ActorDied);
            return Ok(());
        }

        self.maybe_drain(actor_id);
        Ok(())
    }

    /// Install a connection to the actor's published address and flush the
    /// queue in sequence order.
    pub fn connect_actor(self: &Arc<Self>, actor_id: ActorId, address: Address) {
        let kill_client = {
            let mut states = self.states.lock();
            let entry = states.entry(actor_id).or_default();
            let client = (self.client_factory)(&address);
            entry.connection = ConnectionState::Connected(client.clone());
            entry.address = Some(address);
            entry.sent.clear();
            entry.pending_kill.then_some(client)
        };

        if let Some(client) = kill_client {
            let req = rpc::KillActorRequest {
                intended_actor_id: actor_id.binary(),
            };
            tokio::spawn(async move {
                if let Err(e) = client.kill_actor(req).await {
                    tracing::warn!(actor_id = %actor_id, error = %e, "deferred kill failed");
                }
            });
        }

        self.maybe_drain(actor_id);
    }

    /// Drop the connection. `dead` distinguishes a hard disconnect (fail
    /// everything queued) from a soft one (queue survives for reissue).
    pub fn disconnect_actor(&self, actor_id: ActorId, dead: bool) {
        let failed: Vec<TaskSpec> = {
            let mut states = self.states.lock();
            let entry = states.entry(actor_id).or_default();
            entry.sent.clear();
            if dead {
                entry.connection = ConnectionState::Dead;
                let drained = std::mem::take(&mut entry.pending_requests);
                drained.into_values().collect()
            } else {
                entry.connection = ConnectionState::Disconnected;
                Vec::new()
            }
        };

        for spec in failed {
            self.task_manager
                .pending_task_failed(task_spec_builder::task_id(&spec), ErrorType::ActorDied);
        }
    }

    /// Send an out-of-band kill. Deferred until connect when the actor has
    /// no published address yet.
    pub fn kill_actor(self: &Arc<Self>, actor_id: ActorId) -> CoreWorkerResult<()> {
        let client = {
            let mut states = self.states.lock();
            let entry = states.entry(actor_id).or_default();
            match &entry.connection {
                ConnectionState::Connected(client) => Some(client.clone()),
                ConnectionState::Dead => None,
                ConnectionState::Disconnected => {
                    entry.pending_kill = true;
                    None
                }
            }
        };

        if let Some(client) = client {
            let req = rpc::KillActorRequest {
                intended_actor_id: actor_id.binary(),
            };
            tokio::spawn(async move {
                if let Err(e) = client.kill_actor(req).await {
                    tracing::warn!(actor_id = %actor_id, error = %e, "kill actor rpc failed");
                }
            });
        }
        Ok(())
    }

    pub fn num_pending_tasks(&self, actor_id: &ActorId) -> usize {
        self.states
            .lock()
            .get(actor_id)
            .map_or(0, |s| s.pending_requests.len())
    }

    /// Start the per-actor drain loop unless one is already running.
    fn maybe_drain(self: &Arc<Self>, actor_id: ActorId) {
        {
            let mut states = self.states.lock();
            let entry = states.entry(actor_id).or_default();
            if entry.draining || !matches!(entry.connection, ConnectionState::Connected(_)) {
                return;
            }
            entry.draining = true;
        }
        let this = self.clone();
        tokio::spawn(async move {
            this.drain_loop(actor_id).await;
        });
    }

    /// Deliver queued tasks one at a time, lowest sequence number first.
    /// Sequential awaits keep per-actor ordering.
    async fn drain_loop(self: Arc<Self>, actor_id: ActorId) {
        loop {
            let next = {
                let mut states = self.states.lock();
                let entry = states.entry(actor_id).or_default();
                let client = match &entry.connection {
                    ConnectionState::Connected(client) => client.clone(),
                    _ => {
                        entry.draining = false;
                        return;
                    }
                };
                let unsent = entry
                    .pending_requests
                    .iter()
                    .find(|(counter, _)| !entry.sent.contains(counter))
                    .map(|(counter, spec)| (*counter, spec.clone()));
                match unsent {
                    Some((counter, spec)) => {
                        entry.sent.insert(counter);
                        let worker_id = entry
                            .address
                            .as_ref()
                            .map(|a| a.worker_id.clone())
                            .unwrap_or_default();
                        Some((client, counter, spec, worker_id))
                    }
                    None => {
                        entry.draining = false;
                        return;
                    }
                }
            };

            let (client, counter, spec, worker_id) = match next {
                Some(item) => item,
                None => return,
            };
            let task_id = task_spec_builder::task_id(&spec);
            let req = rpc::PushTaskRequest {
                intended_worker_id: worker_id,
                task_spec: Some(spec),
                sequence_number: counter as i64,
            };

            match client.push_task(req).await {
                Ok(reply) => {
                    {
                        let mut states = self.states.lock();
                        let entry = states.entry(actor_id).or_default();
                        entry.pending_requests.remove(&counter);
                        entry.sent.remove(&counter);
                    }
                    self.task_manager
                        .complete_pending_task(task_id, &reply.return_objects);
                }
                Err(e) => {
                    tracing::warn!(
                        actor_id = %actor_id,
                        seq = counter,
                        error = %e,
                        "actor push failed, waiting for reconnect"
                    );
                    let mut states = self.states.lock();
                    let entry = states.entry(actor_id).or_default();
                    if matches!(entry.connection, ConnectionState::Connected(_)) {
                        entry.connection = ConnectionState::Disconnected;
                    }
                    entry.sent.remove(&counter);
                    entry.draining = false;
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory_store::CoreWorkerMemoryStore;
    use crate::reference_counter::ReferenceCounter;
    use hive_common::id::{ObjectId, TaskId, TaskTransportType};
    use std::time::Duration;
    use tonic::Status;

    struct MockWorkerClient {
        pushed: Mutex<Vec<(i64, Vec<u8>)>>,
        kills: Mutex<Vec<Vec<u8>>>,
        fail_pushes: std::sync::atomic::AtomicBool,
    }

    impl MockWorkerClient {
        fn new() -> Self {
            Self {
                pushed: Mutex::new(Vec::new()),
                kills: Mutex::new(Vec::new()),
                fail_pushes: std::sync::atomic::AtomicBool::new(false),
            }
        }

        fn pushed_sequence(&self) -> Vec<i64> {
            self.pushed.lock().iter().map(|(seq, _)| *seq).collect()
        }
    }

    #[async_trait::async_trait]
    impl CoreWorkerClient for MockWorkerClient {
        async fn push_task(
            &self,
            req: rpc::PushTaskRequest,
        ) -> Result<rpc::PushTaskReply, Status> {
            if self.fail_pushes.load(std::sync::atomic::Ordering::Relaxed) {
                return Err(Status::unavailable("connection lost"));
            }
            let spec = req.task_spec.unwrap();
            self.pushed.lock().push((req.sequence_number, spec.task_id));
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
            req: rpc::KillActorRequest,
        ) -> Result<rpc::KillActorReply, Status> {
            self.kills.lock().push(req.intended_actor_id);
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
        submitter: Arc<CoreWorkerDirectActorTaskSubmitter>,
        task_manager: Arc<TaskManager>,
        memory_store: Arc<CoreWorkerMemoryStore>,
        client: Arc<MockWorkerClient>,
    }

    fn make_fixture() -> Fixture {
        let memory_store = Arc::new(CoreWorkerMemoryStore::new());
        let task_manager = Arc::new(TaskManager::new(
            memory_store.clone(),
            Arc::new(ReferenceCounter::new()),
            Box::new(|_| {}),
        ));
        let client = Arc::new(MockWorkerClient::new());
        let client2 = client.clone();
        let factory: ClientFactory = Arc::new(move |_addr| client2.clone() as Arc<dyn CoreWorkerClient>);
        let submitter = Arc::new(CoreWorkerDirectActorTaskSubmitter::new(
            factory,
            task_manager.clone(),
        ));
        Fixture {
            submitter,
            task_manager,
            memory_store,
            client,
        }
    }

    fn make_actor_task(actor_id: &ActorId, counter: u64) -> TaskSpec {
        TaskSpec {
            task_id: TaskId::from_random().binary(),
            num_returns: 1,
            is_direct_call: true,
            actor_task_spec: Some(rpc::ActorTaskSpec {
                actor_id: actor_id.binary(),
                actor_counter: counter,
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    #[tokio::test]
    async fn test_tasks_queue_until_connect_then_flush_in_order() {
        let fx = make_fixture();
        let actor_id = ActorId::from_random();

        for counter in 0..3 {
            fx.submitter
                .submit_task(make_actor_task(&actor_id, counter))
                .unwrap();
        }
        settle().await;
        assert!(fx.client.pushed_sequence().is_empty());
        assert_eq!(fx.submitter.num_pending_tasks(&actor_id), 3);

        fx.submitter.connect_actor(actor_id, Address::default());
        settle().await;
        assert_eq!(fx.client.pushed_sequence(), vec![0, 1, 2]);
        assert_eq!(fx.submitter.num_pending_tasks(&actor_id), 0);
    }

    #[tokio::test]
    async fn test_submit_while_connected_sends_immediately() {
        let fx = make_fixture();
        let actor_id = ActorId::from_random();
        fx.submitter.connect_actor(actor_id, Address::default());

        fx.submitter
            .submit_task(make_actor_task(&actor_id, 0))
            .unwrap();
        settle().await;
        assert_eq!(fx.client.pushed_sequence(), vec![0]);
    }

    #[tokio::test]
    async fn test_completion_reported_to_task_manager() {
        let fx = make_fixture();
        let actor_id = ActorId::from_random();
        let spec = make_actor_task(&actor_id, 0);
        let task_id = task_spec_builder::task_id(&spec);
        fx.task_manager
            .add_pending_task(TaskId::nil(), Address::default(), spec.clone(), 0);

        fx.submitter.connect_actor(actor_id, Address::default());
        fx.submitter.submit_task(spec).unwrap();
        settle().await;
        assert!(!fx.task_manager.is_task_pending(&task_id));
    }

    #[tokio::test]
    async fn test_hard_disconnect_fails_pending_tasks() {
        let fx = make_fixture();
        let actor_id = ActorId::from_random();
        let spec = make_actor_task(&actor_id, 0);
        let task_id = task_spec_builder::task_id(&spec);
        let return_id = ObjectId::for_task_return(&task_id, 1, TaskTransportType::Direct);
        fx.task_manager
            .add_pending_task(TaskId::nil(), Address::default(), spec.clone(), 0);
        fx.submitter.submit_task(spec).unwrap();

        fx.submitter.disconnect_actor(actor_id, true);
        settle().await;

        let obj = fx.memory_store.get_one(&return_id).unwrap();
        assert!(obj.is_user_exception());
        assert_eq!(fx.submitter.num_pending_tasks(&actor_id), 0);
    }

    #[tokio::test]
    async fn test_submit_to_dead_actor_fails_immediately() {
        let fx = make_fixture();
        let actor_id = ActorId::from_random();
        fx.submitter.disconnect_actor(actor_id, true);

        let spec = make_actor_task(&actor_id, 0);
        let task_id = task_spec_builder::task_id(&spec);
        let return_id = ObjectId::for_task_return(&task_id, 1, TaskTransportType::Direct);
        fx.task_manager
            .add_pending_task(TaskId::nil(), Address::default(), spec.clone(), 0);

        fx.submitter.submit_task(spec).unwrap();
        settle().await;
        assert!(fx.memory_store.get_one(&return_id).unwrap().is_user_exception());
        assert!(fx.client.pushed_sequence().is_empty());
    }

    #[tokio::test]
    async fn test_soft_disconnect_keeps_queue_for_reissue() {
        let fx = make_fixture();
        let actor_id = ActorId::from_random();
        fx.client
            .fail_pushes
            .store(true, std::sync::atomic::Ordering::Relaxed);
        fx.submitter.connect_actor(actor_id, Address::default());
        fx.submitter
            .submit_task(make_actor_task(&actor_id, 0))
            .unwrap();
        settle().await;
        // Push failed; the task is still queued.
        assert_eq!(fx.submitter.num_pending_tasks(&actor_id), 1);

        fx.client
            .fail_pushes
            .store(false, std::sync::atomic::Ordering::Relaxed);
        fx.submitter.connect_actor(actor_id, Address::default());
        settle().await;
        assert_eq!(fx.client.pushed_sequence(), vec![0]);
        assert_eq!(fx.submitter.num_pending_tasks(&actor_id), 0);
    }

    #[tokio::test]
    async fn test_kill_actor_sends_rpc_when_connected() {
        let fx = make_fixture();
        let actor_id = ActorId::from_random();
        fx.submitter.connect_actor(actor_id, Address::default());
        fx.submitter.kill_actor(actor_id).unwrap();
        settle().await;
        assert_eq!(fx.client.kills.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_kill_actor_deferred_until_connect() {
        let fx = make_fixture();
        let actor_id = ActorId::from_random();
        fx.submitter.kill_actor(actor_id).unwrap();
        settle().await;
        assert!(fx.client.kills.lock().is_empty());

        fx.submitter.connect_actor(actor_id, Address::default());
        settle().await;
        assert_eq!(fx.client.kills.lock().len(), 1);
    }
}
