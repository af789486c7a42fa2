// Copyright 2026 The Hive Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//  http://www.apache.org/licenses/LICENSE-2.0

//! Async trait for metadata-service (GCS) operations.

use std::sync::Arc;

use hive_common::id::ActorId;
use hive_proto::rpc;
use tonic::Status;

/// Callback invoked on the reactor whenever the metadata service publishes
/// a new state for a subscribed actor. Must not block.
pub type ActorNotificationCallback = Arc<dyn Fn(ActorId, rpc::ActorTableData) + Send + Sync>;

/// Async trait for metadata-service RPC operations.
#[async_trait::async_trait]
pub trait GcsClient: Send + Sync {
    /// Establish the connection. Called once during worker construction.
    async fn connect(&self) -> Result<(), Status>;

    /// Subscribe to lifecycle notifications for one actor. The callback
    /// fires for every state transition until unsubscribed.
    async fn subscribe_actor(
        &self,
        actor_id: ActorId,
        callback: ActorNotificationCallback,
    ) -> Result<(), Status>;

    /// Drop the subscription for one actor.
    async fn unsubscribe_actor(&self, actor_id: ActorId) -> Result<(), Status>;

    /// Add a task record to the task table (driver registration path).
    async fn add_task_data(&self, task_spec: rpc::TaskSpec) -> Result<(), Status>;

    /// Best-effort goodbye; errors are ignored by callers during shutdown.
    fn disconnect(&self);
}
