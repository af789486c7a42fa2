// Copyright 2026 The Hive Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//  http://www.apache.org/licenses/LICENSE-2.0

//! The per-process worker runtime.
//!
//! Linked into every worker and driver: owns the worker's identity, submits
//! tasks, executes tasks, tracks distributed object references, and mediates
//! between the in-process memory store and the shared-memory plasma store.

pub mod actor_handle;
pub mod actor_manager;
pub mod common;
pub mod context;
pub mod core_worker;
pub mod direct_actor_submitter;
pub mod direct_task_submitter;
pub mod error;
pub mod future_resolver;
pub mod grpc_service;
pub mod memory_store;
pub mod options;
pub mod plasma_store_provider;
pub mod reference_counter;
pub mod task_execution_service;
pub mod task_manager;
pub mod task_receiver;
pub mod task_spec_builder;

pub use common::{RayFunction, RayObject, TaskArg, TaskExecutionCallback};
pub use core_worker::CoreWorker;
pub use error::{CoreWorkerError, CoreWorkerResult};
pub use options::{CoreWorkerOptions, WorkerType};
