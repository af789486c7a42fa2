// Copyright 2026 The Hive Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//  http://www.apache.org/licenses/LICENSE-2.0

//! Builder for `TaskSpec` messages plus the shared spec-assembly helper
//! used by every submit variant.

use std::collections::HashMap;

use bytes::Bytes;

use hive_common::id::{ActorId, JobId, ObjectId, TaskId, TaskTransportType};
use hive_proto::rpc::{
    self, ActorCreationTaskSpec, ActorTaskSpec, Address, TaskSpec, TaskType,
};

use crate::common::{RayFunction, RayObject, TaskArg};

/// Builder for constructing a `TaskSpec` message.
pub struct TaskSpecBuilder {
    spec: TaskSpec,
}

impl Default for TaskSpecBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskSpecBuilder {
    pub fn new() -> Self {
        Self {
            spec: TaskSpec::default(),
        }
    }

    /// Set the fields shared by all task variants.
    #[allow(clippy::too_many_arguments)]
    pub fn set_common_task_spec(
        &mut self,
        task_id: &TaskId,
        language: rpc::Language,
        function_descriptor: Vec<String>,
        job_id: &JobId,
        parent_task_id: &TaskId,
        parent_counter: u64,
        caller_id: &TaskId,
        caller_address: Address,
        num_returns: u64,
        is_direct_call: bool,
        required_resources: HashMap<String, f64>,
        required_placement_resources: HashMap<String, f64>,
    ) -> &mut Self {
        self.spec.r#type = TaskType::NormalTask as i32;
        self.spec.language = language as i32;
        self.spec.function_descriptor = function_descriptor;
        self.spec.job_id = job_id.binary();
        self.spec.task_id = task_id.binary();
        self.spec.parent_task_id = parent_task_id.binary();
        self.spec.parent_counter = parent_counter;
        self.spec.caller_id = caller_id.binary();
        self.spec.caller_address = Some(caller_address);
        self.spec.num_returns = num_returns;
        self.spec.is_direct_call = is_direct_call;
        self.spec.required_resources = required_resources;
        self.spec.required_placement_resources = required_placement_resources;
        self
    }

    /// Add a pass-by-reference argument.
    pub fn add_by_ref_arg(&mut self, object_id: ObjectId) -> &mut Self {
        self.spec.args.push(rpc::TaskArg {
            object_ids: vec![object_id.binary()],
            data: Vec::new(),
            metadata: Vec::new(),
        });
        self
    }

    /// Add a pass-by-value argument.
    pub fn add_by_value_arg(&mut self, value: &RayObject) -> &mut Self {
        self.spec.args.push(rpc::TaskArg {
            object_ids: Vec::new(),
            data: value.data().unwrap_or_else(Bytes::new).to_vec(),
            metadata: value.metadata().unwrap_or_else(Bytes::new).to_vec(),
        });
        self
    }

    /// Mark as an actor creation task and set its variant fields.
    #[allow(clippy::too_many_arguments)]
    pub fn set_actor_creation_task_spec(
        &mut self,
        actor_id: &ActorId,
        max_reconstructions: u64,
        dynamic_worker_options: Vec<String>,
        is_direct_call: bool,
        max_concurrency: i32,
        is_detached: bool,
        is_asyncio: bool,
    ) -> &mut Self {
        self.spec.r#type = TaskType::ActorCreationTask as i32;
        self.spec.actor_creation_task_spec = Some(ActorCreationTaskSpec {
            actor_id: actor_id.binary(),
            max_actor_reconstructions: max_reconstructions,
            dynamic_worker_options,
            is_direct_call,
            max_concurrency,
            is_detached,
            is_asyncio,
        });
        self
    }

    /// Mark as an actor task, chaining it behind `previous_cursor`.
    pub fn set_actor_task_spec(
        &mut self,
        actor_id: &ActorId,
        actor_creation_dummy_object_id: &ObjectId,
        previous_cursor: &ObjectId,
        actor_counter: u64,
    ) -> &mut Self {
        self.spec.r#type = TaskType::ActorTask as i32;
        self.spec.actor_task_spec = Some(ActorTaskSpec {
            actor_id: actor_id.binary(),
            actor_creation_dummy_object_id: actor_creation_dummy_object_id.binary(),
            previous_actor_task_dummy_object_id: previous_cursor.binary(),
            actor_counter,
        });
        self
    }

    pub fn build(self) -> TaskSpec {
        self.spec
    }
}

// ─── Spec accessors ─────────────────────────────────────────────────────────

pub fn task_id(spec: &TaskSpec) -> TaskId {
    TaskId::from_binary(&spec.task_id)
}

pub fn transport_type(spec: &TaskSpec) -> TaskTransportType {
    if spec.is_direct_call {
        TaskTransportType::Direct
    } else {
        TaskTransportType::Raylet
    }
}

/// All return ids of a task, in return-index order (1-based indices).
pub fn return_ids(spec: &TaskSpec) -> Vec<ObjectId> {
    let tid = task_id(spec);
    let transport = transport_type(spec);
    (0..spec.num_returns)
        .map(|i| ObjectId::for_task_return(&tid, i as u32 + 1, transport))
        .collect()
}

/// By-reference argument ids, in argument order.
pub fn by_ref_arg_ids(spec: &TaskSpec) -> Vec<ObjectId> {
    spec.args
        .iter()
        .flat_map(|arg| arg.object_ids.iter())
        .map(|bytes| ObjectId::from_binary(bytes))
        .collect()
}

/// Assemble the shared prefix of every task spec and compute its return
/// object ids.
#[allow(clippy::too_many_arguments)]
pub fn build_common_task_spec(
    builder: &mut TaskSpecBuilder,
    job_id: &JobId,
    task_id: &TaskId,
    current_task_id: &TaskId,
    task_index: u64,
    caller_id: &TaskId,
    caller_address: Address,
    function: &RayFunction,
    args: &[TaskArg],
    num_returns: u64,
    required_resources: HashMap<String, f64>,
    required_placement_resources: HashMap<String, f64>,
    transport_type: TaskTransportType,
) -> Vec<ObjectId> {
    builder.set_common_task_spec(
        task_id,
        function.language,
        function.function_descriptor.clone(),
        job_id,
        current_task_id,
        task_index,
        caller_id,
        caller_address,
        num_returns,
        transport_type == TaskTransportType::Direct,
        required_resources,
        required_placement_resources,
    );
    for arg in args {
        match arg {
            TaskArg::ByReference(id) => {
                builder.add_by_ref_arg(*id);
            }
            TaskArg::ByValue(value) => {
                builder.add_by_value_arg(value);
            }
        }
    }

    (0..num_returns)
        .map(|i| ObjectId::for_task_return(task_id, i as u32 + 1, transport_type))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use hive_proto::rpc::Language;

    #[test]
    fn test_build_normal_task() {
        let tid = TaskId::from_random();
        let jid = JobId::from_int(1);
        let mut builder = TaskSpecBuilder::new();
        let ids = build_common_task_spec(
            &mut builder,
            &jid,
            &tid,
            &TaskId::nil(),
            0,
            &TaskId::nil(),
            Address::default(),
            &RayFunction::new(Language::Rust, vec!["pkg".into(), "f".into()]),
            &[TaskArg::ByValue(RayObject::from_data(Bytes::from("v")))],
            2,
            HashMap::new(),
            HashMap::new(),
            TaskTransportType::Direct,
        );
        let spec = builder.build();

        assert_eq!(spec.r#type, TaskType::NormalTask as i32);
        assert_eq!(task_id(&spec), tid);
        assert!(spec.is_direct_call);
        assert_eq!(spec.num_returns, 2);
        assert_eq!(spec.args.len(), 1);
        assert_eq!(spec.args[0].data, b"v");

        assert_eq!(ids.len(), 2);
        assert_eq!(ids[0], ObjectId::for_task_return(&tid, 1, TaskTransportType::Direct));
        assert_eq!(ids, return_ids(&spec));
    }

    #[test]
    fn test_by_ref_args_round_trip() {
        let mut builder = TaskSpecBuilder::new();
        let arg_id = ObjectId::for_put(&TaskId::from_random(), 1, TaskTransportType::Raylet);
        builder.add_by_ref_arg(arg_id);
        let spec = builder.build();
        assert_eq!(by_ref_arg_ids(&spec), vec![arg_id]);
    }

    #[test]
    fn test_actor_creation_task_spec() {
        let aid = ActorId::from_random();
        let mut builder = TaskSpecBuilder::new();
        builder
            .set_common_task_spec(
                &TaskId::for_actor_creation_task(&aid),
                Language::Rust,
                vec!["Actor".into()],
                &JobId::from_int(2),
                &TaskId::nil(),
                0,
                &TaskId::nil(),
                Address::default(),
                1,
                true,
                HashMap::new(),
                HashMap::new(),
            )
            .set_actor_creation_task_spec(&aid, 3, vec![], true, 1, false, false);
        let spec = builder.build();

        assert_eq!(spec.r#type, TaskType::ActorCreationTask as i32);
        let creation = spec.actor_creation_task_spec.unwrap();
        assert_eq!(creation.actor_id, aid.binary());
        assert_eq!(creation.max_actor_reconstructions, 3);
    }

    #[test]
    fn test_actor_task_cursor_chain() {
        let aid = ActorId::from_random();
        let creation_task = TaskId::for_actor_creation_task(&aid);
        let creation_dummy =
            ObjectId::for_task_return(&creation_task, 1, TaskTransportType::Direct);
        let prev_cursor =
            ObjectId::for_task_return(&TaskId::from_random(), 2, TaskTransportType::Direct);

        let mut builder = TaskSpecBuilder::new();
        builder.set_actor_task_spec(&aid, &creation_dummy, &prev_cursor, 7);
        let spec = builder.build();

        assert_eq!(spec.r#type, TaskType::ActorTask as i32);
        let actor_spec = spec.actor_task_spec.unwrap();
        assert_eq!(actor_spec.actor_counter, 7);
        assert_eq!(
            actor_spec.previous_actor_task_dummy_object_id,
            prev_cursor.binary()
        );
    }
}
