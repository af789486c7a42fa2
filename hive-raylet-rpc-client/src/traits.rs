// Copyright 2026 The Hive Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//  http://www.apache.org/licenses/LICENSE-2.0

//! Async trait for supervisor (raylet) RPC operations.

use hive_proto::rpc;
use tonic::Status;

/// Async trait for supervisor RPC operations.
///
/// Implement this for real gRPC transports and for test mocks. All methods
/// return `Result<Reply, Status>`.
#[async_trait::async_trait]
pub trait RayletClient: Send + Sync {
    // ── Lease Management ──────────────────────────────────────────
    async fn request_worker_lease(
        &self,
        req: rpc::RequestWorkerLeaseRequest,
    ) -> Result<rpc::RequestWorkerLeaseReply, Status>;
    async fn cancel_worker_lease(
        &self,
        req: rpc::CancelWorkerLeaseRequest,
    ) -> Result<rpc::CancelWorkerLeaseReply, Status>;

    // ── Task Submission (supervisor-mediated path) ────────────────
    async fn submit_task(
        &self,
        req: rpc::SubmitTaskRequest,
    ) -> Result<rpc::SubmitTaskReply, Status>;

    // ── Object Pinning ────────────────────────────────────────────
    async fn pin_object_ids(
        &self,
        req: rpc::PinObjectIdsRequest,
    ) -> Result<rpc::PinObjectIdsReply, Status>;

    // ── Worker State ──────────────────────────────────────────────
    async fn notify_direct_call_task_blocked(
        &self,
        req: rpc::NotifyDirectCallTaskBlockedRequest,
    ) -> Result<rpc::NotifyDirectCallTaskBlockedReply, Status>;
    async fn push_error(&self, req: rpc::PushErrorRequest) -> Result<rpc::PushErrorReply, Status>;
    async fn set_resource(
        &self,
        req: rpc::SetResourceRequest,
    ) -> Result<rpc::SetResourceReply, Status>;

    // ── Actor Checkpointing ───────────────────────────────────────
    async fn prepare_actor_checkpoint(
        &self,
        req: rpc::PrepareActorCheckpointRequest,
    ) -> Result<rpc::PrepareActorCheckpointReply, Status>;
    async fn notify_actor_resumed_from_checkpoint(
        &self,
        req: rpc::NotifyActorResumedFromCheckpointRequest,
    ) -> Result<rpc::NotifyActorResumedFromCheckpointReply, Status>;

    // ── Lifecycle ─────────────────────────────────────────────────
    /// Best-effort goodbye; errors are ignored by callers during shutdown.
    fn disconnect(&self);
}
