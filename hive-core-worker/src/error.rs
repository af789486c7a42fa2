// Copyright 2026 The Hive Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//  http://www.apache.org/licenses/LICENSE-2.0

//! Worker runtime error types.

use hive_common::id::ObjectId;
use hive_common::status::RayError;
use hive_object_store::PlasmaError;

/// Errors specific to the worker runtime.
#[derive(Debug, thiserror::Error)]
pub enum CoreWorkerError {
    #[error("object not found: {0}")]
    ObjectNotFound(String),

    #[error("object already exists: {0}")]
    ObjectAlreadyExists(String),

    #[error("actor not found: {0}")]
    ActorNotFound(String),

    /// The actor was dead at submission time. Carries the task's return
    /// ids, which resolve to `ActorDied` error objects.
    #[error("sent task to dead actor")]
    ActorDead(Vec<ObjectId>),

    #[error("task submission failed: {0}")]
    TaskSubmissionFailed(String),

    #[error("core worker not initialized")]
    NotInitialized,

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("operation timed out: {0}")]
    TimedOut(String),

    #[error(
        "object {0} has no known owner. Object ids generated randomly or \
         from out-of-band bytes cannot be serialized because the runtime \
         does not know which task will create them."
    )]
    ObjectUnknownOwner(String),

    #[error("plasma store error: {0}")]
    Plasma(#[from] PlasmaError),

    #[error("status error: {0}")]
    RayStatus(#[from] RayError),

    #[error("rpc error: {0}")]
    Rpc(String),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type alias for worker runtime operations.
pub type CoreWorkerResult<T> = Result<T, CoreWorkerError>;
