// Copyright 2026 The Hive Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//  http://www.apache.org/licenses/LICENSE-2.0

//! Borrower-side ownership resolution.
//!
//! When a worker deserializes an object id it does not own, the resolver
//! asks the owner for the object's status. Once the owner reports the
//! object created, the borrower records the promoted-to-plasma sentinel
//! locally so its `get` calls fall through to the shared store.

use std::sync::Arc;
use std::time::Duration;

use hive_common::id::{ObjectId, TaskId};
use hive_proto::rpc::{self, Address, ErrorType, ObjectStatus};
use hive_util::backoff::ExponentialBackoff;
use hive_worker_rpc_client::ClientFactory;

use crate::common::RayObject;
use crate::memory_store::CoreWorkerMemoryStore;

/// Attempts against an owner before its object is declared lost.
const MAX_STATUS_ATTEMPTS: u32 = 3;

pub struct FutureResolver {
    memory_store: Arc<CoreWorkerMemoryStore>,
    client_factory: ClientFactory,
}

impl FutureResolver {
    pub fn new(memory_store: Arc<CoreWorkerMemoryStore>, client_factory: ClientFactory) -> Self {
        Self {
            memory_store,
            client_factory,
        }
    }

    /// Ask the owner about `object_id` and unblock local waiters when it
    /// answers. Runs in the background; completion is observed through the
    /// memory store.
    pub fn resolve_future_async(
        &self,
        object_id: ObjectId,
        owner_id: TaskId,
        owner_address: Address,
    ) {
        let client = (self.client_factory)(&owner_address);
        let memory_store = self.memory_store.clone();
        tokio::spawn(async move {
            // Keep asking the owner until the object is created or the
            // owner stops answering.
            let mut backoff = ExponentialBackoff::new(
                Duration::from_millis(100),
                2.0,
                Duration::from_secs(1),
            );
            let mut marker = RayObject::from_error(ErrorType::WorkerDied);
            for attempt in 1..=MAX_STATUS_ATTEMPTS {
                let req = rpc::GetObjectStatusRequest {
                    object_id: object_id.binary(),
                    owner_id: owner_id.binary(),
                };
                match client.get_object_status(req).await {
                    Ok(reply) if reply.status == ObjectStatus::Created as i32 => {
                        marker = RayObject::from_error(ErrorType::ObjectInPlasma);
                        break;
                    }
                    Ok(_) => {
                        tracing::warn!(object_id = %object_id, "object out of scope at owner");
                        marker = RayObject::from_error(ErrorType::ObjectUnreconstructable);
                        break;
                    }
                    Err(e) if attempt < MAX_STATUS_ATTEMPTS => {
                        tracing::debug!(
                            object_id = %object_id,
                            attempt,
                            error = %e,
                            "owner status request failed, backing off"
                        );
                        tokio::time::sleep(backoff.next_delay()).await;
                    }
                    Err(e) => {
                        // Owner unreachable: resolve waiters with an error
                        // object rather than leaving them blocked forever.
                        tracing::warn!(object_id = %object_id, error = %e, "owner unreachable");
                    }
                }
            }
            if let Err(e) = memory_store.put(object_id, marker) {
                tracing::debug!(object_id = %object_id, error = %e, "object resolved concurrently");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hive_proto::rpc::GetObjectStatusReply;
    use hive_worker_rpc_client::CoreWorkerClient;
    use std::time::Duration;
    use tonic::Status;

    struct StatusClient {
        status: Result<i32, ()>,
    }

    #[async_trait::async_trait]
    impl CoreWorkerClient for StatusClient {
        async fn push_task(
            &self,
            _req: rpc::PushTaskRequest,
        ) -> Result<rpc::PushTaskReply, Status> {
            Ok(rpc::PushTaskReply::default())
        }

        async fn get_object_status(
            &self,
            _req: rpc::GetObjectStatusRequest,
        ) -> Result<GetObjectStatusReply, Status> {
            match self.status {
                Ok(status) => Ok(GetObjectStatusReply { status }),
                Err(()) => Err(Status::unavailable("owner gone")),
            }
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

    fn make_resolver(status: Result<i32, ()>) -> (FutureResolver, Arc<CoreWorkerMemoryStore>) {
        let memory_store = Arc::new(CoreWorkerMemoryStore::new());
        let factory: ClientFactory =
            Arc::new(move |_addr| Arc::new(StatusClient { status }) as Arc<dyn CoreWorkerClient>);
        (
            FutureResolver::new(memory_store.clone(), factory),
            memory_store,
        )
    }

    fn make_id(v: u8) -> ObjectId {
        let mut data = [0u8; ObjectId::SIZE];
        data[0] = v;
        ObjectId::from_binary(&data)
    }

    #[tokio::test]
    async fn test_created_object_resolves_to_plasma_marker() {
        let (resolver, store) = make_resolver(Ok(ObjectStatus::Created as i32));
        let oid = make_id(1);
        resolver.resolve_future_async(oid, TaskId::from_random(), Address::default());

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(store.get_one(&oid).unwrap().is_in_plasma_error());
    }

    #[tokio::test]
    async fn test_unreachable_owner_resolves_to_error() {
        let (resolver, store) = make_resolver(Err(()));
        let oid = make_id(2);
        resolver.resolve_future_async(oid, TaskId::from_random(), Address::default());

        // The resolver retries with backoff before giving up.
        let obj = tokio::time::timeout(Duration::from_secs(3), async {
            loop {
                if let Some(obj) = store.get_one(&oid) {
                    break obj;
                }
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
        })
        .await
        .expect("resolver never gave up");
        assert!(obj.is_user_exception());
    }
}
