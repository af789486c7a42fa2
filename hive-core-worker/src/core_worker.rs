// Copyright 2026 The Hive Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//  http://www.apache.org/licenses/LICENSE-2.0

//! The worker runtime façade.
//!
//! Owns every subsystem of the runtime: identity, the dual object store,
//! reference counting, submitters, receivers, and the periodic timers that
//! drive resubmission and supervisor liveness checks. One instance exists
//! per worker process, with explicit construct/shutdown.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use bytes::Bytes;
use parking_lot::Mutex;

use hive_common::config::hive_config;
use hive_common::constants::INTERNAL_HEARTBEAT_MILLIS;
use hive_common::id::{ActorId, JobId, ObjectId, TaskId, TaskTransportType, WorkerId};
use hive_common::runtime::PeriodicalRunner;
use hive_common::status::RayError;
use hive_gcs_rpc_client::GcsClient;
use hive_object_store::PlasmaBuffer;
use hive_proto::rpc::{self, Address, ErrorType, Language, TaskSpec, TaskType};
use hive_raylet_rpc_client::RayletClient;
use hive_util::time::current_time_ms;

use crate::actor_handle::ActorHandle;
use crate::actor_manager::ActorManager;
use crate::common::{
    ActorCreationOptions, RayFunction, RayObject, TaskArg, TaskExecutionCallback, TaskOptions,
};
use crate::context::WorkerContext;
use crate::direct_actor_submitter::CoreWorkerDirectActorTaskSubmitter;
use crate::direct_task_submitter::CoreWorkerDirectTaskSubmitter;
use crate::error::{CoreWorkerError, CoreWorkerResult};
use crate::future_resolver::FutureResolver;
use crate::memory_store::CoreWorkerMemoryStore;
use crate::options::{CoreWorkerOptions, WorkerType};
use crate::plasma_store_provider::CoreWorkerPlasmaStoreProvider;
use crate::reference_counter::ReferenceCounter;
use crate::task_execution_service::{FiberEvent, TaskExecutionService};
use crate::task_manager::TaskManager;
use crate::task_receiver::{
    CoreWorkerDirectTaskReceiver, CoreWorkerRayletTaskReceiver, DependencyProbe, TaskExecutor,
};
use crate::task_spec_builder::{self, build_common_task_spec, TaskSpecBuilder};

/// Partition input ids by the store tier their transport flag names.
/// Returns `(plasma_ids, memory_ids)`.
fn group_object_ids_by_store_provider(
    object_ids: &[ObjectId],
) -> (HashSet<ObjectId>, HashSet<ObjectId>) {
    let mut plasma_ids = HashSet::new();
    let mut memory_ids = HashSet::new();
    for object_id in object_ids {
        if object_id.is_direct_call_type() {
            memory_ids.insert(*object_id);
        } else {
            plasma_ids.insert(*object_id);
        }
    }
    (plasma_ids, memory_ids)
}

pub struct CoreWorker {
    worker_type: WorkerType,
    language: Language,
    context: WorkerContext,
    rpc_address: Address,

    gcs_client: Arc<dyn GcsClient>,
    raylet_client: Arc<dyn RayletClient>,

    memory_store: Arc<CoreWorkerMemoryStore>,
    plasma_store_provider: Arc<CoreWorkerPlasmaStoreProvider>,
    reference_counter: Arc<ReferenceCounter>,
    task_manager: Arc<TaskManager>,
    actor_manager: Arc<ActorManager>,
    direct_actor_submitter: Arc<CoreWorkerDirectActorTaskSubmitter>,
    direct_task_submitter: Arc<CoreWorkerDirectTaskSubmitter>,
    future_resolver: FutureResolver,
    raylet_task_receiver: Option<CoreWorkerRayletTaskReceiver>,
    direct_task_receiver: Option<Arc<CoreWorkerDirectTaskReceiver>>,
    task_execution_service: Arc<TaskExecutionService>,
    task_execution_callback: Option<TaskExecutionCallback>,

    /// Tasks awaiting delayed resubmission, drained by the heartbeat in
    /// nondecreasing timestamp order.
    to_resubmit: Mutex<VecDeque<(u64, TaskSpec)>>,

    main_thread_task_id: Mutex<TaskId>,
    current_task: Mutex<Option<TaskSpec>>,
    actor_id: Mutex<ActorId>,
    actor_title: Mutex<String>,
    webui_display: Mutex<HashMap<String, String>>,
    used_resources: Mutex<HashMap<String, f64>>,

    task_queue_length: AtomicI64,
    num_executed_tasks: AtomicU64,

    timers: Mutex<Vec<PeriodicalRunner>>,
    shut_down: AtomicBool,
    connected: AtomicBool,
}

impl CoreWorker {
    /// Construct the runtime, connect to the metadata service, and start
    /// the reactor timers. A Driver additionally registers its synthetic
    /// root task; a Worker constructs the task receivers.
    pub async fn new(options: CoreWorkerOptions) -> CoreWorkerResult<Arc<Self>> {
        if options.worker_type == WorkerType::Worker && options.task_execution_callback.is_none() {
            return Err(CoreWorkerError::InvalidArgument(
                "workers require a task execution callback".to_string(),
            ));
        }
        let config = hive_config();
        let rpc_address = options.rpc_address();
        tracing::info!(worker_id = %options.worker_id, "initializing worker");

        let worker = Arc::new_cyclic(|weak: &Weak<CoreWorker>| {
            let context =
                WorkerContext::new(options.worker_type, options.worker_id, options.job_id);
            let memory_store = Arc::new(CoreWorkerMemoryStore::new());
            let reference_counter = Arc::new(ReferenceCounter::new());
            let plasma_store_provider = Arc::new(CoreWorkerPlasmaStoreProvider::new(
                options.plasma_client.clone(),
            ));

            // Failed-but-retriable tasks re-enter through the resubmission
            // queue after a fixed delay.
            let retry_weak = weak.clone();
            let task_manager = Arc::new(TaskManager::new(
                memory_store.clone(),
                reference_counter.clone(),
                Box::new(move |spec| {
                    if let Some(worker) = retry_weak.upgrade() {
                        let not_before = current_time_ms() + hive_config().task_retry_delay_ms;
                        tracing::error!(
                            task_id = %task_spec_builder::task_id(&spec),
                            delay_ms = hive_config().task_retry_delay_ms,
                            "will resubmit task after delay"
                        );
                        worker.to_resubmit.lock().push_back((not_before, spec));
                    }
                }),
            ));

            let direct_actor_submitter = Arc::new(CoreWorkerDirectActorTaskSubmitter::new(
                options.client_factory.clone(),
                task_manager.clone(),
            ));
            let actor_manager = Arc::new(ActorManager::new(
                options.gcs_client.clone(),
                direct_actor_submitter.clone(),
            ));
            let direct_task_submitter = Arc::new(CoreWorkerDirectTaskSubmitter::new(
                options.raylet_client.clone(),
                options.raylet_client_factory.clone(),
                options.client_factory.clone(),
                task_manager.clone(),
                options.raylet_id,
                config.worker_lease_timeout_ms,
            ));
            let future_resolver =
                FutureResolver::new(memory_store.clone(), options.client_factory.clone());
            let task_execution_service = Arc::new(TaskExecutionService::start());

            let (raylet_task_receiver, direct_task_receiver) =
                if options.worker_type == WorkerType::Worker {
                    let executor: TaskExecutor = {
                        let weak = weak.clone();
                        Arc::new(move |spec| {
                            let weak = weak.clone();
                            Box::pin(async move {
                                match weak.upgrade() {
                                    Some(worker) => worker.execute_task(spec).await,
                                    None => Err(CoreWorkerError::NotInitialized),
                                }
                            })
                        })
                    };
                    let dependency_probe: DependencyProbe = {
                        let plasma = plasma_store_provider.clone();
                        Arc::new(move |ids| {
                            let plasma = plasma.clone();
                            Box::pin(async move {
                                let mut missing = Vec::new();
                                for id in ids {
                                    if !matches!(plasma.contains(id).await, Ok(true)) {
                                        missing.push(id);
                                    }
                                }
                                missing
                            })
                        })
                    };
                    (
                        Some(CoreWorkerRayletTaskReceiver::new(
                            options.worker_id,
                            task_execution_service.clone(),
                            executor.clone(),
                        )),
                        Some(Arc::new(CoreWorkerDirectTaskReceiver::new(
                            options.worker_id,
                            task_execution_service.clone(),
                            executor,
                            dependency_probe,
                        ))),
                    )
                } else {
                    (None, None)
                };

            CoreWorker {
                worker_type: options.worker_type,
                language: options.language,
                context,
                rpc_address: rpc_address.clone(),
                gcs_client: options.gcs_client.clone(),
                raylet_client: options.raylet_client.clone(),
                memory_store,
                plasma_store_provider,
                reference_counter,
                task_manager,
                actor_manager,
                direct_actor_submitter,
                direct_task_submitter,
                future_resolver,
                raylet_task_receiver,
                direct_task_receiver,
                task_execution_service,
                task_execution_callback: options.task_execution_callback.clone(),
                to_resubmit: Mutex::new(VecDeque::new()),
                main_thread_task_id: Mutex::new(TaskId::nil()),
                current_task: Mutex::new(None),
                actor_id: Mutex::new(ActorId::nil()),
                actor_title: Mutex::new(String::new()),
                webui_display: Mutex::new(HashMap::new()),
                used_resources: Mutex::new(HashMap::new()),
                task_queue_length: AtomicI64::new(0),
                num_executed_tasks: AtomicU64::new(0),
                timers: Mutex::new(Vec::new()),
                shut_down: AtomicBool::new(false),
                connected: AtomicBool::new(false),
            }
        });

        worker
            .gcs_client
            .connect()
            .await
            .map_err(|e| CoreWorkerError::Rpc(format!("metadata service connect failed: {e}")))?;
        worker.connected.store(true, Ordering::SeqCst);

        // Register the driver's synthetic root task so failures attributable
        // to the driver are reportable against a task table entry.
        if options.worker_type == WorkerType::Driver {
            let driver_task_id = TaskId::for_driver_task(&options.job_id);
            let mut builder = TaskSpecBuilder::new();
            builder.set_common_task_spec(
                &driver_task_id,
                options.language,
                Vec::new(),
                &options.job_id,
                &TaskId::nil(),
                0,
                &driver_task_id,
                rpc_address,
                0,
                false,
                HashMap::new(),
                HashMap::new(),
            );
            worker
                .gcs_client
                .add_task_data(builder.build())
                .await
                .map_err(|e| CoreWorkerError::Rpc(format!("driver task registration: {e}")))?;
            worker.set_current_task_id(driver_task_id);
        }

        worker.start_timers();
        Ok(worker)
    }

    fn start_timers(self: &Arc<Self>) {
        let config = hive_config();
        let mut timers = Vec::new();

        if self.worker_type == WorkerType::Worker {
            let weak = Arc::downgrade(self);
            timers.push(PeriodicalRunner::start(
                Duration::from_millis(config.raylet_death_check_interval_ms),
                move || {
                    if let Some(worker) = weak.upgrade() {
                        worker.check_for_raylet_failure();
                    }
                },
            ));
        }

        let weak = Arc::downgrade(self);
        timers.push(PeriodicalRunner::start(
            Duration::from_millis(INTERNAL_HEARTBEAT_MILLIS),
            move || {
                if let Some(worker) = weak.upgrade() {
                    worker.internal_heartbeat();
                }
            },
        ));

        *self.timers.lock() = timers;
    }

    /// If the supervisor dies, this process is reparented to init; there is
    /// nothing left to lease from, so shut down.
    fn check_for_raylet_failure(&self) {
        #[cfg(unix)]
        if unsafe { libc::getppid() } == 1 {
            tracing::error!("supervisor failed, shutting down");
            self.shutdown();
        }
    }

    /// Drain due entries of the resubmission queue back into the direct
    /// submitter. Resubmissions keep their original task id.
    fn internal_heartbeat(&self) {
        let due: Vec<TaskSpec> = {
            let mut queue = self.to_resubmit.lock();
            let now = current_time_ms();
            let mut due = Vec::new();
            while queue.front().is_some_and(|(not_before, _)| now > *not_before) {
                if let Some((_, spec)) = queue.pop_front() {
                    due.push(spec);
                }
            }
            due
        };
        for spec in due {
            if let Err(e) = self.direct_task_submitter.submit_task(spec) {
                tracing::error!(error = %e, "resubmission failed");
            }
        }
    }

    /// Idempotent: stops timers and the execution thread.
    pub fn shutdown(&self) {
        if self.shut_down.swap(true, Ordering::SeqCst) {
            return;
        }
        self.timers.lock().clear();
        self.task_execution_service.stop();
    }

    /// Best-effort goodbye to the metadata service and supervisor.
    pub fn disconnect(&self) {
        if self.connected.swap(false, Ordering::SeqCst) {
            self.gcs_client.disconnect();
            self.raylet_client.disconnect();
        }
    }

    /// Release resources, wait for pending tasks to resolve, then shut down
    /// from the execution thread so teardown is serialized with user code.
    pub fn initiate_exit(self: &Arc<Self>, intentional: bool) {
        let raylet_client = self.raylet_client.clone();
        tokio::spawn(async move {
            if let Err(e) = raylet_client
                .notify_direct_call_task_blocked(rpc::NotifyDirectCallTaskBlockedRequest {})
                .await
            {
                tracing::debug!(error = %e, "blocked notification failed during exit");
            }
        });

        let weak = Arc::downgrade(self);
        self.task_manager.drain_and_shutdown(Box::new(move || {
            if let Some(worker) = weak.upgrade() {
                let inner = worker.clone();
                worker.task_execution_service.post(async move {
                    if intentional {
                        inner.disconnect();
                    }
                    inner.shutdown();
                });
            }
        }));
    }

    // ─── Identity ────────────────────────────────────────────────────

    pub fn worker_type(&self) -> WorkerType {
        self.worker_type
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn worker_id(&self) -> WorkerId {
        self.context.worker_id()
    }

    pub fn rpc_address(&self) -> &Address {
        &self.rpc_address
    }

    pub fn worker_context(&self) -> &WorkerContext {
        &self.context
    }

    /// The identity tasks submitted by this worker carry: the actor
    /// creation task when running as an actor, else the main-thread task.
    pub fn get_caller_id(&self) -> TaskId {
        let actor_id = *self.actor_id.lock();
        if !actor_id.is_nil() {
            TaskId::for_actor_creation_task(&actor_id)
        } else {
            *self.main_thread_task_id.lock()
        }
    }

    /// Install the current task id. Clearing it outside an actor drops all
    /// actor handles and their subscriptions.
    pub fn set_current_task_id(&self, task_id: TaskId) {
        self.context.set_current_task_id(task_id);
        *self.main_thread_task_id.lock() = task_id;
        let not_actor_task = self.actor_id.lock().is_nil();
        if not_actor_task && task_id.is_nil() {
            self.actor_manager.clear_all();
        }
    }

    pub fn set_actor_id(&self, actor_id: ActorId) {
        let mut current = self.actor_id.lock();
        if current.is_nil() {
            *current = actor_id;
            self.context.set_current_actor_id(actor_id);
        } else {
            tracing::warn!(actor_id = %actor_id, "actor id already assigned");
        }
    }

    pub fn set_webui_display(&self, key: String, message: String) {
        self.webui_display.lock().insert(key, message);
    }

    pub fn set_actor_title(&self, title: String) {
        *self.actor_title.lock() = title;
    }

    // ─── Object API ──────────────────────────────────────────────────

    /// Store an object in plasma under a fresh id, register ownership, and
    /// have the supervisor pin it until the local reference dies.
    pub async fn put(
        &self,
        object: &RayObject,
        contained_object_ids: &[ObjectId],
    ) -> CoreWorkerResult<ObjectId> {
        let object_id = ObjectId::for_put(
            &self.context.current_task_id(),
            self.context.get_next_put_index(),
            TaskTransportType::Raylet,
        );
        self.reference_counter.add_owned_object(
            object_id,
            self.get_caller_id(),
            self.rpc_address.clone(),
        );
        self.put_with_id(object, contained_object_ids, object_id)
            .await?;
        // Pin after creation; a pin failure fails the call but the object
        // remains in plasma.
        self.pin_objects(&[object_id]).await?;
        Ok(object_id)
    }

    /// Store an object under a caller-chosen plasma-tier id.
    pub async fn put_with_id(
        &self,
        object: &RayObject,
        contained_object_ids: &[ObjectId],
        object_id: ObjectId,
    ) -> CoreWorkerResult<()> {
        if object_id.is_direct_call_type() {
            return Err(CoreWorkerError::InvalidArgument(format!(
                "invalid transport flag in object id: {}",
                object_id.transport_type()
            )));
        }
        self.add_contained_object_ids(object_id, contained_object_ids);
        self.plasma_store_provider.put(object, object_id).await
    }

    /// Two-phase construction, first half: allocate a writable buffer in
    /// plasma. `None` buffer means the object already exists.
    pub async fn create(
        &self,
        metadata: Option<Bytes>,
        data_size: usize,
        contained_object_ids: &[ObjectId],
    ) -> CoreWorkerResult<(ObjectId, Option<PlasmaBuffer>)> {
        let object_id = ObjectId::for_put(
            &self.context.current_task_id(),
            self.context.get_next_put_index(),
            TaskTransportType::Raylet,
        );
        let buffer = self
            .plasma_store_provider
            .create(metadata, data_size, object_id)
            .await?;
        if buffer.is_some() {
            self.reference_counter.add_owned_object(
                object_id,
                self.get_caller_id(),
                self.rpc_address.clone(),
            );
            self.add_contained_object_ids(object_id, contained_object_ids);
        }
        Ok((object_id, buffer))
    }

    /// Two-phase construction, second half.
    pub async fn seal(&self, object_id: ObjectId, pin_object: bool) -> CoreWorkerResult<()> {
        self.plasma_store_provider.seal(object_id).await?;
        if pin_object {
            self.pin_objects(&[object_id]).await?;
        }
        Ok(())
    }

    /// Fetch objects from both tiers, retrying promoted direct-call ids
    /// against plasma with the remaining timeout budget. Result slots keep
    /// the caller's order; duplicate ids fill all matching slots.
    pub async fn get(
        &self,
        object_ids: &[ObjectId],
        timeout_ms: i64,
    ) -> CoreWorkerResult<Vec<Option<RayObject>>> {
        let mut results = vec![None; object_ids.len()];
        let (mut plasma_ids, memory_ids) = group_object_ids_by_store_provider(object_ids);

        let mut result_map: HashMap<ObjectId, RayObject> = HashMap::new();
        let mut got_exception = false;
        let start_time = current_time_ms();

        if !memory_ids.is_empty() {
            let (found, exception) = self.memory_store.get(&memory_ids, timeout_ms).await?;
            got_exception |= exception;
            result_map.extend(found);
        }

        if !got_exception {
            // Promoted direct-call ids retry against plasma.
            for (object_id, object) in &result_map {
                if object.is_in_plasma_error() {
                    tracing::info!(object_id = %object_id, "in plasma, doing fetch-and-get");
                    plasma_ids.insert(*object_id);
                }
            }
            let mut local_timeout_ms = timeout_ms;
            if timeout_ms >= 0 {
                local_timeout_ms =
                    std::cmp::max(0, timeout_ms - (current_time_ms() - start_time) as i64);
            }
            if !plasma_ids.is_empty() {
                let (found, exception) = self
                    .plasma_store_provider
                    .get(&plasma_ids, local_timeout_ms)
                    .await?;
                got_exception |= exception;
                result_map.extend(found);
            }
        }

        let mut missing_result = false;
        let mut will_throw_exception = false;
        for (i, object_id) in object_ids.iter().enumerate() {
            match result_map.get(object_id) {
                Some(object) if !object.is_in_plasma_error() => {
                    if object.is_user_exception() {
                        will_throw_exception = true;
                    }
                    results[i] = Some(object.clone());
                }
                _ => missing_result = true,
            }
        }
        // With no timeout and nothing raising, every slot must be filled.
        if timeout_ms < 0 && !will_throw_exception {
            assert!(
                !missing_result,
                "unbounded get returned incomplete results"
            );
        }

        Ok(results)
    }

    /// Wait for at least `num_objects` of `object_ids`, across both tiers.
    /// The first phase drains both tiers with a zero timeout so one tier
    /// cannot starve the other's quota.
    pub async fn wait(
        &self,
        object_ids: &[ObjectId],
        num_objects: usize,
        timeout_ms: i64,
    ) -> CoreWorkerResult<Vec<bool>> {
        if num_objects == 0 || num_objects > object_ids.len() {
            return Err(RayError::invalid(
                "Number of objects to wait for must be between 1 and the number of ids.",
            )
            .into());
        }

        let (mut plasma_ids, mut memory_ids) = group_object_ids_by_store_provider(object_ids);
        if plasma_ids.len() + memory_ids.len() != object_ids.len() {
            return Err(RayError::invalid("Duplicate object ids not supported in wait.").into());
        }

        let mut ready: HashSet<ObjectId> = HashSet::new();

        if !memory_ids.is_empty() {
            let found = self
                .memory_store
                .wait(
                    &memory_ids,
                    std::cmp::min(memory_ids.len(), num_objects),
                    0,
                )
                .await?;
            ready.extend(found);
            self.retry_object_in_plasma_errors(&mut memory_ids, &mut plasma_ids, &mut ready);
        }
        if ready.len() < num_objects && !plasma_ids.is_empty() {
            self.plasma_store_provider
                .wait(
                    &plasma_ids,
                    std::cmp::min(plasma_ids.len(), num_objects - ready.len()),
                    0,
                    &mut ready,
                )
                .await?;
        }

        if timeout_ms != 0 && ready.len() < num_objects {
            // Clear and rerun with the real timeout split across tiers.
            ready.clear();
            let start_time = current_time_ms();
            if !memory_ids.is_empty() {
                let found = self
                    .memory_store
                    .wait(
                        &memory_ids,
                        std::cmp::min(memory_ids.len(), num_objects),
                        timeout_ms,
                    )
                    .await?;
                ready.extend(found);
                self.retry_object_in_plasma_errors(&mut memory_ids, &mut plasma_ids, &mut ready);
            }
            let mut remaining_timeout_ms = timeout_ms;
            if timeout_ms > 0 {
                remaining_timeout_ms =
                    std::cmp::max(0, timeout_ms - (current_time_ms() - start_time) as i64);
            }
            if ready.len() < num_objects && !plasma_ids.is_empty() {
                self.plasma_store_provider
                    .wait(
                        &plasma_ids,
                        std::cmp::min(plasma_ids.len(), num_objects - ready.len()),
                        remaining_timeout_ms,
                        &mut ready,
                    )
                    .await?;
            }
        }

        Ok(object_ids.iter().map(|id| ready.contains(id)).collect())
    }

    /// Ids that became "ready" in the memory tier but resolve to the
    /// promotion sentinel actually live in plasma; move them over and drop
    /// them from the ready set.
    fn retry_object_in_plasma_errors(
        &self,
        memory_ids: &mut HashSet<ObjectId>,
        plasma_ids: &mut HashSet<ObjectId>,
        ready: &mut HashSet<ObjectId>,
    ) {
        let promoted: Vec<ObjectId> = memory_ids
            .iter()
            .filter(|id| {
                ready.contains(id)
                    && self
                        .memory_store
                        .get_one(id)
                        .is_some_and(|obj| obj.is_in_plasma_error())
            })
            .copied()
            .collect();
        for object_id in promoted {
            memory_ids.remove(&object_id);
            ready.remove(&object_id);
            plasma_ids.insert(object_id);
        }
    }

    /// Tier-aware presence check. Direct-call ids consult the memory tier
    /// first and fall through to plasma only when promoted.
    pub async fn contains(&self, object_id: ObjectId) -> CoreWorkerResult<bool> {
        if object_id.is_direct_call_type() {
            match self.memory_store.contains(&object_id) {
                Some(false) => Ok(true),
                Some(true) => self.plasma_store_provider.contains(object_id).await,
                None => Ok(false),
            }
        } else {
            self.plasma_store_provider.contains(object_id).await
        }
    }

    /// Drop references and delete from both tiers.
    pub async fn delete(
        &self,
        object_ids: &[ObjectId],
        local_only: bool,
        delete_creating_tasks: bool,
    ) -> CoreWorkerResult<()> {
        let (mut plasma_ids, memory_ids) = group_object_ids_by_store_provider(object_ids);
        // Deleting from a non-owner is local-only by policy; see the
        // local_only flag for the plasma tier's scope.
        self.reference_counter.delete_references(object_ids);
        self.memory_store.delete(&memory_ids, &mut plasma_ids);
        self.plasma_store_provider
            .delete(&plasma_ids, local_only, delete_creating_tasks)
            .await
    }

    /// Force an in-memory direct-call object into plasma and return its
    /// owner identity, for serializing the id out of this process. Fails
    /// when the id has no recorded owner.
    pub async fn promote_to_plasma_and_get_ownership_info(
        &self,
        object_id: ObjectId,
    ) -> CoreWorkerResult<(TaskId, Address)> {
        if !object_id.is_direct_call_type() {
            return Err(CoreWorkerError::InvalidArgument(
                "only direct-call objects can be promoted".to_string(),
            ));
        }
        if let Some(value) = self.memory_store.get_or_promote_to_plasma(object_id) {
            self.plasma_store_provider.put(&value, object_id).await?;
        }
        self.reference_counter
            .get_owner(&object_id)
            .ok_or_else(|| CoreWorkerError::ObjectUnknownOwner(object_id.hex()))
    }

    /// Borrower-side counterpart: record the owner and start resolving the
    /// object's status so local futures unblock.
    pub fn register_ownership_info_and_resolve_future(
        &self,
        object_id: ObjectId,
        owner_id: TaskId,
        owner_address: Address,
    ) -> CoreWorkerResult<()> {
        self.reference_counter
            .add_borrowed_object(object_id, owner_id, owner_address.clone());
        if owner_id.is_nil() {
            return Err(CoreWorkerError::InvalidArgument(
                "owner id must not be nil".to_string(),
            ));
        }
        self.future_resolver
            .resolve_future_async(object_id, owner_id, owner_address);
        Ok(())
    }

    pub fn add_contained_object_ids(&self, object_id: ObjectId, contained: &[ObjectId]) {
        if !contained.is_empty() {
            self.reference_counter
                .add_contained_object_ids(object_id, contained);
        }
    }

    pub fn add_local_reference(&self, object_id: ObjectId) {
        self.reference_counter.add_local_reference(object_id);
    }

    pub fn remove_local_reference(&self, object_id: &ObjectId) -> Vec<ObjectId> {
        self.reference_counter.remove_local_reference(object_id)
    }

    /// Async get for direct-call objects: `success` fires with the value,
    /// `fallback` fires with the promotion marker when the value lives in
    /// plasma.
    pub fn get_async(
        &self,
        object_id: ObjectId,
        success: Box<dyn FnOnce(RayObject) + Send>,
        fallback: Box<dyn FnOnce(RayObject) + Send>,
    ) -> CoreWorkerResult<()> {
        if !object_id.is_direct_call_type() {
            return Err(CoreWorkerError::InvalidArgument(
                "async get only supports direct-call objects".to_string(),
            ));
        }
        self.memory_store.get_async(
            object_id,
            Box::new(move |object| {
                if object.is_in_plasma_error() {
                    fallback(object);
                } else {
                    success(object);
                }
            }),
        );
        Ok(())
    }

    pub async fn set_client_options(&self, name: String, limit_bytes: i64) -> CoreWorkerResult<()> {
        self.plasma_store_provider
            .set_client_options(&name, limit_bytes)
            .await
    }

    pub async fn memory_usage_string(&self) -> String {
        self.plasma_store_provider.memory_usage_string().await
    }

    async fn pin_objects(&self, object_ids: &[ObjectId]) -> CoreWorkerResult<()> {
        let req = rpc::PinObjectIdsRequest {
            owner_address: Some(self.rpc_address.clone()),
            object_ids: object_ids.iter().map(|id| id.binary()).collect(),
        };
        self.raylet_client
            .pin_object_ids(req)
            .await
            .map_err(|e| CoreWorkerError::Rpc(format!("pin failed: {e}")))?;
        Ok(())
    }

    // ─── Supervisor forwards ─────────────────────────────────────────

    pub async fn push_error(
        &self,
        job_id: JobId,
        error_type: String,
        error_message: String,
        timestamp: f64,
    ) -> CoreWorkerResult<()> {
        self.raylet_client
            .push_error(rpc::PushErrorRequest {
                job_id: job_id.binary(),
                r#type: error_type,
                error_message,
                timestamp,
            })
            .await
            .map_err(|e| CoreWorkerError::Rpc(e.to_string()))?;
        Ok(())
    }

    pub async fn prepare_actor_checkpoint(
        &self,
        actor_id: ActorId,
    ) -> CoreWorkerResult<Vec<u8>> {
        let reply = self
            .raylet_client
            .prepare_actor_checkpoint(rpc::PrepareActorCheckpointRequest {
                actor_id: actor_id.binary(),
            })
            .await
            .map_err(|e| CoreWorkerError::Rpc(e.to_string()))?;
        Ok(reply.checkpoint_id)
    }

    pub async fn notify_actor_resumed_from_checkpoint(
        &self,
        actor_id: ActorId,
        checkpoint_id: Vec<u8>,
    ) -> CoreWorkerResult<()> {
        self.raylet_client
            .notify_actor_resumed_from_checkpoint(rpc::NotifyActorResumedFromCheckpointRequest {
                actor_id: actor_id.binary(),
                checkpoint_id,
            })
            .await
            .map_err(|e| CoreWorkerError::Rpc(e.to_string()))?;
        Ok(())
    }

    pub async fn set_resource(
        &self,
        resource_name: String,
        capacity: f64,
        node_id: Vec<u8>,
    ) -> CoreWorkerResult<()> {
        self.raylet_client
            .set_resource(rpc::SetResourceRequest {
                resource_name,
                capacity,
                node_id,
            })
            .await
            .map_err(|e| CoreWorkerError::Rpc(e.to_string()))?;
        Ok(())
    }

    // ─── Task submission ─────────────────────────────────────────────

    /// Submit a normal task and return its return object ids.
    pub async fn submit_task(
        &self,
        function: &RayFunction,
        args: &[TaskArg],
        task_options: &TaskOptions,
        max_retries: u64,
    ) -> CoreWorkerResult<Vec<ObjectId>> {
        let task_index = self.context.get_next_task_index() as u64;
        let job_id = self.context.current_job_id();
        let current_task_id = self.context.current_task_id();
        let task_id = TaskId::for_normal_task(&job_id, &current_task_id, task_index);
        let transport = if task_options.is_direct_call {
            TaskTransportType::Direct
        } else {
            TaskTransportType::Raylet
        };

        let mut builder = TaskSpecBuilder::new();
        let return_ids = build_common_task_spec(
            &mut builder,
            &job_id,
            &task_id,
            &current_task_id,
            task_index,
            &self.get_caller_id(),
            self.rpc_address.clone(),
            function,
            args,
            task_options.num_returns,
            task_options.resources.clone(),
            HashMap::new(),
            transport,
        );
        let spec = builder.build();

        if task_options.is_direct_call {
            self.task_manager.add_pending_task(
                self.get_caller_id(),
                self.rpc_address.clone(),
                spec.clone(),
                max_retries,
            );
            self.direct_task_submitter.submit_task(spec)?;
        } else {
            self.raylet_client
                .submit_task(rpc::SubmitTaskRequest {
                    task_spec: Some(spec),
                })
                .await
                .map_err(|e| CoreWorkerError::Rpc(e.to_string()))?;
        }
        Ok(return_ids)
    }

    /// Create an actor: register its handle, subscribe to its lifecycle,
    /// and submit the creation task.
    pub async fn create_actor(
        &self,
        function: &RayFunction,
        args: &[TaskArg],
        actor_creation_options: &ActorCreationOptions,
    ) -> CoreWorkerResult<ActorId> {
        let task_index = self.context.get_next_task_index() as u64;
        let job_id = self.context.current_job_id();
        let current_task_id = self.context.current_task_id();
        let actor_id = ActorId::of(&job_id, &current_task_id, task_index);
        let actor_creation_task_id = TaskId::for_actor_creation_task(&actor_id);
        let transport = if actor_creation_options.is_direct_call {
            TaskTransportType::Direct
        } else {
            TaskTransportType::Raylet
        };

        let mut builder = TaskSpecBuilder::new();
        let return_ids = build_common_task_spec(
            &mut builder,
            &job_id,
            &actor_creation_task_id,
            &current_task_id,
            task_index,
            &self.get_caller_id(),
            self.rpc_address.clone(),
            function,
            args,
            1,
            actor_creation_options.resources.clone(),
            actor_creation_options.placement_resources.clone(),
            transport,
        );
        builder.set_actor_creation_task_spec(
            &actor_id,
            actor_creation_options.max_reconstructions,
            actor_creation_options.dynamic_worker_options.clone(),
            actor_creation_options.is_direct_call,
            actor_creation_options.max_concurrency,
            actor_creation_options.is_detached,
            actor_creation_options.is_asyncio,
        );

        let handle = ActorHandle::new(
            actor_id,
            job_id,
            return_ids[0],
            function.language,
            actor_creation_options.is_direct_call,
            function.function_descriptor.clone(),
        );
        if !self.actor_manager.add_actor_handle(handle).await? {
            return Err(CoreWorkerError::Internal(format!(
                "actor {actor_id} already exists"
            )));
        }

        let spec = builder.build();
        if actor_creation_options.is_direct_call {
            let max_retries = std::cmp::max(
                hive_config().actor_creation_min_retries,
                actor_creation_options.max_reconstructions,
            );
            self.task_manager.add_pending_task(
                self.get_caller_id(),
                self.rpc_address.clone(),
                spec.clone(),
                max_retries,
            );
            self.direct_task_submitter.submit_task(spec)?;
        } else {
            self.raylet_client
                .submit_task(rpc::SubmitTaskRequest {
                    task_spec: Some(spec),
                })
                .await
                .map_err(|e| CoreWorkerError::Rpc(e.to_string()))?;
        }
        Ok(actor_id)
    }

    /// Submit an actor method task on a registered handle. The extra
    /// cursor return id is consumed internally; callers see only their
    /// requested returns.
    pub async fn submit_actor_task(
        &self,
        actor_id: &ActorId,
        function: &RayFunction,
        args: &[TaskArg],
        task_options: &TaskOptions,
    ) -> CoreWorkerResult<Vec<ObjectId>> {
        let handle = self.actor_manager.get_actor_handle(actor_id)?;

        // One extra return carries the actor cursor.
        let num_returns = task_options.num_returns + 1;
        let is_direct_call = handle.is_direct_call_actor();
        let transport = if is_direct_call {
            TaskTransportType::Direct
        } else {
            TaskTransportType::Raylet
        };

        let task_index = self.context.get_next_task_index() as u64;
        let current_task_id = self.context.current_task_id();
        let actor_task_id = TaskId::for_actor_task(
            &self.context.current_job_id(),
            &current_task_id,
            task_index,
            actor_id,
        );

        let mut builder = TaskSpecBuilder::new();
        let mut return_ids = build_common_task_spec(
            &mut builder,
            &handle.creation_job_id(),
            &actor_task_id,
            &current_task_id,
            task_index,
            &self.get_caller_id(),
            self.rpc_address.clone(),
            function,
            args,
            num_returns,
            task_options.resources.clone(),
            HashMap::new(),
            transport,
        );

        let new_cursor = match return_ids.pop() {
            Some(cursor) => cursor,
            None => {
                return Err(CoreWorkerError::Internal(
                    "actor task has no cursor slot".to_string(),
                ))
            }
        };
        handle.set_actor_task_spec(&mut builder, transport, new_cursor);

        let spec = builder.build();
        if is_direct_call {
            self.task_manager.add_pending_task(
                self.get_caller_id(),
                self.rpc_address.clone(),
                spec.clone(),
                0,
            );
            if handle.is_dead() {
                self.task_manager.pending_task_failed(
                    task_spec_builder::task_id(&spec),
                    ErrorType::ActorDied,
                );
                return Err(CoreWorkerError::ActorDead(return_ids));
            }
            self.direct_actor_submitter.submit_task(spec)?;
        } else {
            self.raylet_client
                .submit_task(rpc::SubmitTaskRequest {
                    task_spec: Some(spec),
                })
                .await
                .map_err(|e| CoreWorkerError::Rpc(e.to_string()))?;
        }
        Ok(return_ids)
    }

    /// Kill a direct-call actor with an out-of-band RPC. The local handle
    /// transitions to Dead only on the metadata service's notification.
    pub fn kill_actor(&self, actor_id: &ActorId) -> CoreWorkerResult<()> {
        let handle = self.actor_manager.get_actor_handle(actor_id)?;
        if !handle.is_direct_call_actor() {
            return Err(CoreWorkerError::InvalidArgument(
                "kill is only supported for direct-call actors".to_string(),
            ));
        }
        self.direct_actor_submitter.kill_actor(*actor_id)
    }

    pub fn serialize_actor_handle(&self, actor_id: &ActorId) -> CoreWorkerResult<Vec<u8>> {
        self.actor_manager.serialize_actor_handle(actor_id)
    }

    pub async fn deserialize_and_register_actor_handle(
        &self,
        serialized: &[u8],
    ) -> CoreWorkerResult<ActorId> {
        self.actor_manager
            .deserialize_and_register_actor_handle(serialized)
            .await
    }

    // ─── Task execution ──────────────────────────────────────────────

    /// Allocate return objects ahead of execution. Direct-call returns
    /// below the size threshold with no contained ids get a local buffer;
    /// everything else is created in plasma.
    pub async fn allocate_return_objects(
        &self,
        object_ids: &[ObjectId],
        data_sizes: &[usize],
        metadatas: &[Option<Bytes>],
        contained_object_ids: &[Vec<ObjectId>],
    ) -> CoreWorkerResult<Vec<Option<RayObject>>> {
        if object_ids.len() != data_sizes.len()
            || object_ids.len() != metadatas.len()
            || object_ids.len() != contained_object_ids.len()
        {
            return Err(CoreWorkerError::InvalidArgument(
                "return allocation inputs must have equal lengths".to_string(),
            ));
        }
        let max_direct_size = hive_config().max_direct_call_object_size;

        let mut return_objects = Vec::with_capacity(object_ids.len());
        for i in 0..object_ids.len() {
            let mut object_already_exists = false;
            let mut allocated = None;
            if data_sizes[i] > 0 {
                if self.context.current_task_is_direct_call()
                    && (data_sizes[i] as u64) < max_direct_size
                    && contained_object_ids[i].is_empty()
                {
                    allocated = Some(RayObject::from_local_buffer(
                        PlasmaBuffer::new(data_sizes[i]),
                        metadatas[i].clone(),
                        contained_object_ids[i].clone(),
                    ));
                } else {
                    match self
                        .plasma_store_provider
                        .create(metadatas[i].clone(), data_sizes[i], object_ids[i])
                        .await?
                    {
                        Some(buffer) => {
                            allocated = Some(RayObject::from_plasma_buffer(
                                buffer,
                                metadatas[i].clone(),
                                contained_object_ids[i].clone(),
                            ));
                        }
                        None => object_already_exists = true,
                    }
                }
            } else if metadatas[i].is_some() {
                allocated = Some(RayObject::new(
                    None,
                    metadatas[i].clone(),
                    contained_object_ids[i].clone(),
                ));
            }
            // A slot stays empty when the object already exists or there is
            // neither data nor metadata, letting the executor skip storing
            // that output.
            if object_already_exists {
                allocated = None;
            }
            return_objects.push(allocated);
        }
        Ok(return_objects)
    }

    /// Run one task on the execution thread: materialize arguments, invoke
    /// the language callback, and write back return objects.
    pub async fn execute_task(&self, spec: TaskSpec) -> CoreWorkerResult<Vec<rpc::ReturnObject>> {
        self.task_queue_length.fetch_sub(1, Ordering::Relaxed);
        self.num_executed_tasks.fetch_add(1, Ordering::Relaxed);

        *self.used_resources.lock() = spec.required_resources.clone();
        self.context.set_current_task(&spec);
        let task_id = task_spec_builder::task_id(&spec);
        self.set_current_task_id(task_id);
        *self.current_task.lock() = Some(spec.clone());

        let function = RayFunction::new(
            Language::try_from(spec.language).unwrap_or(Language::Python),
            spec.function_descriptor.clone(),
        );
        let (args, arg_reference_ids) = self.build_args_for_executor(&spec).await?;

        let transport = task_spec_builder::transport_type(&spec);
        let mut return_ids = task_spec_builder::return_ids(&spec);
        let mut task_type = TaskType::NormalTask;
        if spec.r#type == TaskType::ActorCreationTask as i32 {
            // The trailing cursor id is runtime-internal.
            return_ids.pop();
            task_type = TaskType::ActorCreationTask;
            if let Some(creation) = &spec.actor_creation_task_spec {
                let actor_id = ActorId::from_binary(&creation.actor_id);
                self.set_actor_id(actor_id);
                if creation.is_asyncio {
                    if let Some(receiver) = &self.direct_task_receiver {
                        receiver.set_async_mode(true);
                    }
                }
                tracing::info!(actor_id = %actor_id, "creating actor");
            }
        } else if spec.r#type == TaskType::ActorTask as i32 {
            return_ids.pop();
            task_type = TaskType::ActorTask;
        }

        let callback = self
            .task_execution_callback
            .clone()
            .ok_or(CoreWorkerError::NotInitialized)?;
        let execution_result = callback(
            task_type,
            function,
            spec.required_resources.clone(),
            args,
            arg_reference_ids,
            return_ids.clone(),
        );

        let mut reply_returns = Vec::new();
        if let Ok(return_objects) = &execution_result {
            for (object, object_id) in return_objects.iter().zip(return_ids.iter()) {
                let Some(object) = object else {
                    // Already stored, or intentionally not stored.
                    continue;
                };
                reply_returns.push(self.store_task_return(object, *object_id, transport).await);
            }
        }

        if spec.r#type == TaskType::NormalTask as i32 {
            let in_scope = self.reference_counter.num_object_ids_in_scope();
            if in_scope != 0 {
                tracing::debug!(
                    task_id = %task_id,
                    in_scope,
                    "object ids still in scope after task; references may be leaking"
                );
            }
        }

        self.set_current_task_id(TaskId::nil());
        *self.current_task.lock() = None;
        *self.used_resources.lock() = HashMap::new();

        execution_result.map(|_| reply_returns)
    }

    /// Place one return value in the right tier and emit its wire form.
    /// Storage failures here are unrecoverable mid-execution.
    async fn store_task_return(
        &self,
        object: &RayObject,
        object_id: ObjectId,
        transport: TaskTransportType,
    ) -> rpc::ReturnObject {
        let max_direct_size = hive_config().max_direct_call_object_size;
        if object.data_in_plasma() {
            // The executor already wrote into a plasma allocation; seal it.
            // The supervisor knows the return ids, so no extra pin.
            if let Err(e) = self.seal(object_id, false).await {
                panic!("failed to seal return object {object_id}: {e}");
            }
            return rpc::ReturnObject {
                object_id: object_id.binary(),
                in_plasma: true,
                ..Default::default()
            };
        }

        let promote = transport == TaskTransportType::Direct
            && (object.size() as u64 > max_direct_size || !object.nested_ids().is_empty());
        if transport == TaskTransportType::Raylet || promote {
            if let Err(e) = self.plasma_store_provider.put(object, object_id).await {
                panic!("failed to store return object {object_id}: {e}");
            }
            self.add_contained_object_ids(object_id, object.nested_ids());
            return rpc::ReturnObject {
                object_id: object_id.binary(),
                in_plasma: true,
                ..Default::default()
            };
        }

        // Small direct-call return: travels inline in the reply and lands
        // in the caller's memory store.
        rpc::ReturnObject {
            object_id: object_id.binary(),
            in_plasma: false,
            data: object.data().map(|d| d.to_vec()).unwrap_or_default(),
            metadata: object.metadata().map(|m| m.to_vec()).unwrap_or_default(),
        }
    }

    /// Materialize task arguments. By-reference args are always fetched
    /// from plasma (direct-call args were promoted by the submitter); the
    /// local promotion marker makes later reads of those ids consistent.
    async fn build_args_for_executor(
        &self,
        spec: &TaskSpec,
    ) -> CoreWorkerResult<(Vec<RayObject>, Vec<ObjectId>)> {
        let num_args = spec.args.len();
        let mut args: Vec<Option<RayObject>> = (0..num_args).map(|_| None).collect();
        let mut arg_reference_ids = vec![ObjectId::nil(); num_args];

        let mut by_ref_ids = HashSet::new();
        let mut by_ref_indices: HashMap<ObjectId, Vec<usize>> = HashMap::new();

        for (i, arg) in spec.args.iter().enumerate() {
            if let Some(id_bytes) = arg.object_ids.first() {
                let object_id = ObjectId::from_binary(id_bytes);
                if object_id.is_direct_call_type() {
                    // The value was promoted to plasma before submission;
                    // route any local read there.
                    let _ = self
                        .memory_store
                        .put(object_id, RayObject::from_error(ErrorType::ObjectInPlasma));
                }
                by_ref_ids.insert(object_id);
                by_ref_indices.entry(object_id).or_default().push(i);
                arg_reference_ids[i] = object_id;
            } else {
                let data = (!arg.data.is_empty()).then(|| Bytes::copy_from_slice(&arg.data));
                let metadata =
                    (!arg.metadata.is_empty()).then(|| Bytes::copy_from_slice(&arg.metadata));
                args[i] = Some(RayObject::new(data, metadata, Vec::new()));
            }
        }

        if !by_ref_ids.is_empty() {
            let (found, _) = self.plasma_store_provider.get(&by_ref_ids, -1).await?;
            for (object_id, object) in found {
                if let Some(indices) = by_ref_indices.get(&object_id) {
                    for &i in indices {
                        args[i] = Some(object.clone());
                    }
                }
            }
        }

        let args = args
            .into_iter()
            .map(|arg| arg.unwrap_or_else(|| RayObject::new(None, None, Vec::new())))
            .collect();
        Ok((args, arg_reference_ids))
    }

    /// Suspend the current async-actor fiber until `event` fires.
    pub async fn yield_current_fiber(&self, event: &FiberEvent) {
        crate::task_execution_service::yield_current_fiber(event).await;
    }

    // ─── Introspection ───────────────────────────────────────────────

    pub fn memory_store(&self) -> &Arc<CoreWorkerMemoryStore> {
        &self.memory_store
    }

    pub fn plasma_store_provider(&self) -> &Arc<CoreWorkerPlasmaStoreProvider> {
        &self.plasma_store_provider
    }

    pub fn reference_counter(&self) -> &Arc<ReferenceCounter> {
        &self.reference_counter
    }

    pub fn task_manager(&self) -> &Arc<TaskManager> {
        &self.task_manager
    }

    pub fn actor_manager(&self) -> &Arc<ActorManager> {
        &self.actor_manager
    }

    pub fn direct_actor_submitter(&self) -> &Arc<CoreWorkerDirectActorTaskSubmitter> {
        &self.direct_actor_submitter
    }

    pub fn direct_task_submitter(&self) -> &Arc<CoreWorkerDirectTaskSubmitter> {
        &self.direct_task_submitter
    }

    pub fn raylet_task_receiver(&self) -> Option<&CoreWorkerRayletTaskReceiver> {
        self.raylet_task_receiver.as_ref()
    }

    pub fn direct_task_receiver(&self) -> Option<&Arc<CoreWorkerDirectTaskReceiver>> {
        self.direct_task_receiver.as_ref()
    }

    pub fn current_actor_id(&self) -> ActorId {
        *self.actor_id.lock()
    }

    pub(crate) fn increment_task_queue_length(&self) {
        self.task_queue_length.fetch_add(1, Ordering::Relaxed);
    }

    /// Diagnostic: number of tasks awaiting delayed resubmission.
    pub fn num_resubmit_queued(&self) -> usize {
        self.to_resubmit.lock().len()
    }

    /// Snapshot of the runtime's state for the stats RPC.
    pub fn stats(&self) -> rpc::CoreWorkerStats {
        let memory_stats = self.memory_store.stats();
        let current_task = self.current_task.lock().clone();
        rpc::CoreWorkerStats {
            num_pending_tasks: self.task_manager.num_pending_tasks() as u64,
            task_queue_length: self.task_queue_length.load(Ordering::Relaxed).max(0) as u64,
            num_executed_tasks: self.num_executed_tasks.load(Ordering::Relaxed),
            num_object_ids_in_scope: self.reference_counter.num_object_ids_in_scope() as u64,
            current_task_desc: current_task
                .as_ref()
                .map(|spec| {
                    format!(
                        "{}:{}",
                        task_spec_builder::task_id(spec),
                        spec.function_descriptor.join(".")
                    )
                })
                .unwrap_or_default(),
            current_task_func_desc: current_task
                .map(|spec| spec.function_descriptor)
                .unwrap_or_default(),
            ip_address: self.rpc_address.ip_address.clone(),
            port: self.rpc_address.port,
            actor_id: self.actor_id.lock().binary(),
            used_resources: self.used_resources.lock().clone(),
            webui_display: self.webui_display.lock().clone(),
            actor_title: self.actor_title.lock().clone(),
            num_local_objects: memory_stats.num_local_objects as u64,
            used_object_store_memory: memory_stats.used_object_store_memory as u64,
        }
    }
}

impl Drop for CoreWorker {
    fn drop(&mut self) {
        self.timers.lock().clear();
        self.task_execution_service.stop();
    }
}
