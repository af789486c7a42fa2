// Copyright 2026 The Hive Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//  http://www.apache.org/licenses/LICENSE-2.0

//! Workspace-wide constants.

/// Length of full-width unique IDs (WorkerId, NodeId, checkpoint ids) in bytes.
pub const UNIQUE_ID_SIZE: usize = 16;

/// Length of a JobId in bytes.
pub const JOB_ID_SIZE: usize = 4;

/// Length of an ActorId in bytes (unique bytes + embedded JobId).
pub const ACTOR_ID_SIZE: usize = 10;

/// Length of a TaskId in bytes (unique bytes + embedded ActorId).
pub const TASK_ID_SIZE: usize = 15;

/// Length of an ObjectId in bytes: TaskId, a big-endian u32 index, and a
/// one-byte transport flag.
pub const OBJECT_ID_SIZE: usize = TASK_ID_SIZE + 4 + 1;

/// Duration between internal book-keeping heartbeats, in milliseconds.
pub const INTERNAL_HEARTBEAT_MILLIS: u64 = 1000;

/// Environment variable naming the job a worker was launched for.
pub const ENV_VAR_KEY_JOB_ID: &str = "HIVE_JOB_ID";

/// Environment variable carrying the supervisor's PID.
pub const ENV_VAR_KEY_RAYLET_PID: &str = "HIVE_RAYLET_PID";
