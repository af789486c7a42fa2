// Copyright 2026 The Hive Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//  http://www.apache.org/licenses/LICENSE-2.0

//! Async trait for peer worker RPC operations.

use std::sync::Arc;

use hive_proto::rpc;
use tonic::Status;

/// Async trait for worker-to-worker RPC operations.
#[async_trait::async_trait]
pub trait CoreWorkerClient: Send + Sync {
    async fn push_task(&self, req: rpc::PushTaskRequest) -> Result<rpc::PushTaskReply, Status>;

    async fn get_object_status(
        &self,
        req: rpc::GetObjectStatusRequest,
    ) -> Result<rpc::GetObjectStatusReply, Status>;

    async fn kill_actor(&self, req: rpc::KillActorRequest) -> Result<rpc::KillActorReply, Status>;

    async fn direct_actor_call_arg_wait_complete(
        &self,
        req: rpc::DirectActorCallArgWaitCompleteRequest,
    ) -> Result<rpc::DirectActorCallArgWaitCompleteReply, Status>;
}

/// Produces a client for the worker at the given address. Connections are
/// the factory's concern; callers treat the result as ready to use.
pub type ClientFactory = Arc<dyn Fn(&rpc::Address) -> Arc<dyn CoreWorkerClient> + Send + Sync>;
