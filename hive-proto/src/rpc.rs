// Copyright 2026 The Hive Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//  http://www.apache.org/licenses/LICENSE-2.0

//! RPC message definitions (package `hive.rpc`).

use std::collections::HashMap;

// ─── Enums ──────────────────────────────────────────────────────────────────

/// The programming language of a worker or function.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum Language {
    Python = 0,
    Java = 1,
    Cpp = 2,
    Rust = 3,
}

/// Discriminator for the three task variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum TaskType {
    NormalTask = 0,
    ActorCreationTask = 1,
    ActorTask = 2,
}

/// Error sentinels stored inside object metadata. Downstream `get` callers
/// observe failures uniformly as error objects carrying one of these codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum ErrorType {
    WorkerDied = 0,
    ActorDied = 1,
    ObjectUnreconstructable = 2,
    TaskExecutionException = 3,
    ObjectInPlasma = 4,
}

/// Actor lifecycle states published by the metadata service.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum ActorState {
    Alive = 0,
    Reconstructing = 1,
    Dead = 2,
}

/// Status of an owned object, as reported to borrowers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum ObjectStatus {
    Created = 0,
    OutOfScope = 1,
}

// ─── Core structures ────────────────────────────────────────────────────────

/// The network identity of a worker process.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Address {
    #[prost(bytes = "vec", tag = "1")]
    pub raylet_id: Vec<u8>,
    #[prost(string, tag = "2")]
    pub ip_address: String,
    #[prost(int32, tag = "3")]
    pub port: i32,
    #[prost(bytes = "vec", tag = "4")]
    pub worker_id: Vec<u8>,
}

/// A single task argument: either a list of object references or inline
/// value bytes.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TaskArg {
    #[prost(bytes = "vec", repeated, tag = "1")]
    pub object_ids: Vec<Vec<u8>>,
    #[prost(bytes = "vec", tag = "2")]
    pub data: Vec<u8>,
    #[prost(bytes = "vec", tag = "3")]
    pub metadata: Vec<u8>,
}

/// Fields specific to actor creation tasks.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ActorCreationTaskSpec {
    #[prost(bytes = "vec", tag = "1")]
    pub actor_id: Vec<u8>,
    #[prost(uint64, tag = "2")]
    pub max_actor_reconstructions: u64,
    #[prost(string, repeated, tag = "3")]
    pub dynamic_worker_options: Vec<String>,
    #[prost(bool, tag = "4")]
    pub is_direct_call: bool,
    #[prost(int32, tag = "5")]
    pub max_concurrency: i32,
    #[prost(bool, tag = "6")]
    pub is_detached: bool,
    #[prost(bool, tag = "7")]
    pub is_asyncio: bool,
}

/// Fields specific to actor method tasks. The cursor chain (dummy object
/// ids) imposes submission order on the receiving actor.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ActorTaskSpec {
    #[prost(bytes = "vec", tag = "1")]
    pub actor_id: Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub actor_creation_dummy_object_id: Vec<u8>,
    #[prost(bytes = "vec", tag = "3")]
    pub previous_actor_task_dummy_object_id: Vec<u8>,
    #[prost(uint64, tag = "4")]
    pub actor_counter: u64,
}

/// The immutable description of a task.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TaskSpec {
    #[prost(enumeration = "TaskType", tag = "1")]
    pub r#type: i32,
    #[prost(enumeration = "Language", tag = "2")]
    pub language: i32,
    #[prost(string, repeated, tag = "3")]
    pub function_descriptor: Vec<String>,
    #[prost(bytes = "vec", tag = "4")]
    pub job_id: Vec<u8>,
    #[prost(bytes = "vec", tag = "5")]
    pub task_id: Vec<u8>,
    #[prost(bytes = "vec", tag = "6")]
    pub parent_task_id: Vec<u8>,
    #[prost(uint64, tag = "7")]
    pub parent_counter: u64,
    #[prost(bytes = "vec", tag = "8")]
    pub caller_id: Vec<u8>,
    #[prost(message, optional, tag = "9")]
    pub caller_address: Option<Address>,
    #[prost(message, repeated, tag = "10")]
    pub args: Vec<TaskArg>,
    #[prost(uint64, tag = "11")]
    pub num_returns: u64,
    #[prost(map = "string, double", tag = "12")]
    pub required_resources: HashMap<String, f64>,
    #[prost(map = "string, double", tag = "13")]
    pub required_placement_resources: HashMap<String, f64>,
    /// Whether the task travels the worker-to-worker direct path.
    #[prost(bool, tag = "14")]
    pub is_direct_call: bool,
    #[prost(message, optional, tag = "15")]
    pub actor_creation_task_spec: Option<ActorCreationTaskSpec>,
    #[prost(message, optional, tag = "16")]
    pub actor_task_spec: Option<ActorTaskSpec>,
}

/// The serialized form of an actor handle, stable across processes.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ActorHandleData {
    #[prost(bytes = "vec", tag = "1")]
    pub actor_id: Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub creation_job_id: Vec<u8>,
    #[prost(bytes = "vec", tag = "3")]
    pub actor_cursor: Vec<u8>,
    #[prost(enumeration = "Language", tag = "4")]
    pub actor_language: i32,
    #[prost(bool, tag = "5")]
    pub is_direct_call: bool,
    #[prost(string, repeated, tag = "6")]
    pub function_descriptor: Vec<String>,
}

/// Actor state record published by the metadata service.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ActorTableData {
    #[prost(bytes = "vec", tag = "1")]
    pub actor_id: Vec<u8>,
    #[prost(enumeration = "ActorState", tag = "2")]
    pub state: i32,
    #[prost(message, optional, tag = "3")]
    pub address: Option<Address>,
}

/// A return value shipped back in a task reply. Large values stay in plasma
/// and only the `in_plasma` marker travels.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ReturnObject {
    #[prost(bytes = "vec", tag = "1")]
    pub object_id: Vec<u8>,
    #[prost(bool, tag = "2")]
    pub in_plasma: bool,
    #[prost(bytes = "vec", tag = "3")]
    pub data: Vec<u8>,
    #[prost(bytes = "vec", tag = "4")]
    pub metadata: Vec<u8>,
}

// ─── Worker service messages ────────────────────────────────────────────────

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AssignTaskRequest {
    #[prost(bytes = "vec", tag = "1")]
    pub intended_worker_id: Vec<u8>,
    #[prost(message, optional, tag = "2")]
    pub task_spec: Option<TaskSpec>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AssignTaskReply {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PushTaskRequest {
    #[prost(bytes = "vec", tag = "1")]
    pub intended_worker_id: Vec<u8>,
    #[prost(message, optional, tag = "2")]
    pub task_spec: Option<TaskSpec>,
    /// Submission-order sequence number for actor tasks; -1 for tasks with
    /// no ordering requirement.
    #[prost(int64, tag = "3")]
    pub sequence_number: i64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PushTaskReply {
    #[prost(message, repeated, tag = "1")]
    pub return_objects: Vec<ReturnObject>,
    #[prost(bool, tag = "2")]
    pub worker_exiting: bool,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DirectActorCallArgWaitCompleteRequest {
    #[prost(bytes = "vec", tag = "1")]
    pub intended_worker_id: Vec<u8>,
    #[prost(int64, tag = "2")]
    pub tag: i64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DirectActorCallArgWaitCompleteReply {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetObjectStatusRequest {
    #[prost(bytes = "vec", tag = "1")]
    pub object_id: Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub owner_id: Vec<u8>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetObjectStatusReply {
    #[prost(enumeration = "ObjectStatus", tag = "1")]
    pub status: i32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct WaitForObjectEvictionRequest {
    #[prost(bytes = "vec", tag = "1")]
    pub intended_worker_id: Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub object_id: Vec<u8>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct WaitForObjectEvictionReply {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct KillActorRequest {
    #[prost(bytes = "vec", tag = "1")]
    pub intended_actor_id: Vec<u8>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct KillActorReply {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetCoreWorkerStatsRequest {
    #[prost(bytes = "vec", tag = "1")]
    pub intended_worker_id: Vec<u8>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CoreWorkerStats {
    #[prost(uint64, tag = "1")]
    pub num_pending_tasks: u64,
    #[prost(uint64, tag = "2")]
    pub task_queue_length: u64,
    #[prost(uint64, tag = "3")]
    pub num_executed_tasks: u64,
    #[prost(uint64, tag = "4")]
    pub num_object_ids_in_scope: u64,
    #[prost(string, tag = "5")]
    pub current_task_desc: String,
    #[prost(string, repeated, tag = "6")]
    pub current_task_func_desc: Vec<String>,
    #[prost(string, tag = "7")]
    pub ip_address: String,
    #[prost(int32, tag = "8")]
    pub port: i32,
    #[prost(bytes = "vec", tag = "9")]
    pub actor_id: Vec<u8>,
    #[prost(map = "string, double", tag = "10")]
    pub used_resources: HashMap<String, f64>,
    #[prost(map = "string, string", tag = "11")]
    pub webui_display: HashMap<String, String>,
    #[prost(string, tag = "12")]
    pub actor_title: String,
    #[prost(uint64, tag = "13")]
    pub num_local_objects: u64,
    #[prost(uint64, tag = "14")]
    pub used_object_store_memory: u64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetCoreWorkerStatsReply {
    #[prost(message, optional, tag = "1")]
    pub core_worker_stats: Option<CoreWorkerStats>,
}

// ─── Supervisor (raylet) service messages ───────────────────────────────────

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RequestWorkerLeaseRequest {
    #[prost(message, optional, tag = "1")]
    pub task_spec: Option<TaskSpec>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RequestWorkerLeaseReply {
    /// The leased worker, when the local node could satisfy the request.
    #[prost(message, optional, tag = "1")]
    pub worker_address: Option<Address>,
    /// Set when the lease was spilled back to another node's supervisor.
    #[prost(message, optional, tag = "2")]
    pub retry_at_raylet_address: Option<Address>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CancelWorkerLeaseRequest {
    #[prost(bytes = "vec", tag = "1")]
    pub task_id: Vec<u8>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CancelWorkerLeaseReply {
    #[prost(bool, tag = "1")]
    pub success: bool,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SubmitTaskRequest {
    #[prost(message, optional, tag = "1")]
    pub task_spec: Option<TaskSpec>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SubmitTaskReply {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PinObjectIdsRequest {
    #[prost(message, optional, tag = "1")]
    pub owner_address: Option<Address>,
    #[prost(bytes = "vec", repeated, tag = "2")]
    pub object_ids: Vec<Vec<u8>>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PinObjectIdsReply {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct NotifyDirectCallTaskBlockedRequest {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct NotifyDirectCallTaskBlockedReply {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PushErrorRequest {
    #[prost(bytes = "vec", tag = "1")]
    pub job_id: Vec<u8>,
    #[prost(string, tag = "2")]
    pub r#type: String,
    #[prost(string, tag = "3")]
    pub error_message: String,
    #[prost(double, tag = "4")]
    pub timestamp: f64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PushErrorReply {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PrepareActorCheckpointRequest {
    #[prost(bytes = "vec", tag = "1")]
    pub actor_id: Vec<u8>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PrepareActorCheckpointReply {
    #[prost(bytes = "vec", tag = "1")]
    pub checkpoint_id: Vec<u8>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct NotifyActorResumedFromCheckpointRequest {
    #[prost(bytes = "vec", tag = "1")]
    pub actor_id: Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub checkpoint_id: Vec<u8>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct NotifyActorResumedFromCheckpointReply {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SetResourceRequest {
    #[prost(string, tag = "1")]
    pub resource_name: String,
    #[prost(double, tag = "2")]
    pub capacity: f64,
    #[prost(bytes = "vec", tag = "3")]
    pub node_id: Vec<u8>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SetResourceReply {}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use prost::Message;

    #[test]
    fn test_task_spec_roundtrip() {
        let spec = TaskSpec {
            r#type: TaskType::ActorTask as i32,
            language: Language::Rust as i32,
            function_descriptor: vec!["pkg".into(), "Actor.method".into()],
            task_id: vec![7u8; 15],
            num_returns: 2,
            required_resources: HashMap::from([("CPU".to_string(), 1.5)]),
            actor_task_spec: Some(ActorTaskSpec {
                actor_id: vec![1u8; 10],
                actor_counter: 42,
                ..Default::default()
            }),
            ..Default::default()
        };
        let decoded = TaskSpec::decode(spec.encode_to_vec().as_slice()).unwrap();
        assert_eq!(decoded, spec);
        assert_eq!(decoded.actor_task_spec.unwrap().actor_counter, 42);
    }

    #[test]
    fn test_enum_values_stable() {
        // Values are part of the wire contract; never renumber.
        assert_eq!(ErrorType::ActorDied as i32, 1);
        assert_eq!(ErrorType::ObjectInPlasma as i32, 4);
        assert_eq!(ActorState::Alive as i32, 0);
        assert_eq!(ActorState::Reconstructing as i32, 1);
        assert_eq!(ActorState::Dead as i32, 2);
        assert_eq!(TaskType::NormalTask as i32, 0);
    }

    #[test]
    fn test_return_object_defaults() {
        let obj = ReturnObject::default();
        assert!(!obj.in_plasma);
        assert!(obj.data.is_empty());
    }
}
