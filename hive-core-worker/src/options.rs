// Copyright 2026 The Hive Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//  http://www.apache.org/licenses/LICENSE-2.0

//! Worker construction options.

use std::sync::Arc;

use hive_common::id::{JobId, NodeId, WorkerId};
use hive_gcs_rpc_client::GcsClient;
use hive_object_store::PlasmaClient;
use hive_proto::rpc::{Address, Language};
use hive_raylet_rpc_client::RayletClient;
use hive_worker_rpc_client::ClientFactory;

use crate::common::TaskExecutionCallback;

/// The two modes a worker runtime can be constructed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkerType {
    /// Initiates computations and runs the user program.
    Driver,
    /// Executes tasks and actor methods delivered over RPC.
    Worker,
}

/// Produces a supervisor client for a remote node (spillback path).
pub type RayletClientFactory = Arc<dyn Fn(&Address) -> Arc<dyn RayletClient> + Send + Sync>;

/// Everything a `CoreWorker` needs at construction: identity, collaborator
/// interfaces, and the language-side execution hook.
#[derive(Clone)]
pub struct CoreWorkerOptions {
    pub worker_type: WorkerType,
    pub language: Language,
    pub job_id: JobId,
    pub worker_id: WorkerId,
    pub raylet_id: NodeId,
    pub node_ip_address: String,
    pub rpc_port: i32,

    pub gcs_client: Arc<dyn GcsClient>,
    pub raylet_client: Arc<dyn RayletClient>,
    pub plasma_client: Arc<dyn PlasmaClient>,
    pub client_factory: ClientFactory,
    /// Supervisor clients for remote nodes; `None` means spillback replies
    /// reuse the local supervisor client.
    pub raylet_client_factory: Option<RayletClientFactory>,

    /// Required for `WorkerType::Worker`; drivers may omit it.
    pub task_execution_callback: Option<TaskExecutionCallback>,
}

impl CoreWorkerOptions {
    /// The worker's own network identity.
    pub fn rpc_address(&self) -> Address {
        Address {
            raylet_id: self.raylet_id.binary(),
            ip_address: self.node_ip_address.clone(),
            port: self.rpc_port,
            worker_id: self.worker_id.binary(),
        }
    }
}
