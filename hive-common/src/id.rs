// Copyright 2026 The Hive Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//  http://www.apache.org/licenses/LICENSE-2.0

//! Hive ID types.
//!
//! ID hierarchy:
//! - `JobId` (4 bytes)
//! - `ActorId` (10 bytes = 6 unique + 4 JobId)
//! - `TaskId` (15 bytes = 5 unique + 10 ActorId)
//! - `ObjectId` (20 bytes = 15 TaskId + 4 index + 1 transport flag)
//! - `WorkerId` / `NodeId` / `ActorCheckpointId` (16 bytes)
//!
//! The ObjectId layout is the wire contract for every object reference that
//! crosses a process boundary: two ObjectIds are equal iff their bytes match.

use std::fmt;
use std::hash::{Hash, Hasher};

use crate::constants::{
    ACTOR_ID_SIZE, JOB_ID_SIZE, OBJECT_ID_SIZE, TASK_ID_SIZE, UNIQUE_ID_SIZE,
};

// ─── MurmurHash64A ──────────────────────────────────────────────────────────
// Stable across processes so IDs hash identically on every worker.

fn murmur_hash_64a(key: &[u8], seed: u64) -> u64 {
    const M: u64 = 0xc6a4a7935bd1e995;
    const R: i32 = 47;

    let len = key.len();
    let mut h: u64 = seed ^ ((len as u64).wrapping_mul(M));

    let n_blocks = len / 8;
    for i in 0..n_blocks {
        let offset = i * 8;
        let mut k = u64::from_le_bytes(key[offset..offset + 8].try_into().unwrap());

        k = k.wrapping_mul(M);
        k ^= k >> R;
        k = k.wrapping_mul(M);

        h ^= k;
        h = h.wrapping_mul(M);
    }

    let tail = &key[n_blocks * 8..];
    let remaining = len & 7;
    if remaining >= 7 {
        h ^= (tail[6] as u64) << 48;
    }
    if remaining >= 6 {
        h ^= (tail[5] as u64) << 40;
    }
    if remaining >= 5 {
        h ^= (tail[4] as u64) << 32;
    }
    if remaining >= 4 {
        h ^= (tail[3] as u64) << 24;
    }
    if remaining >= 3 {
        h ^= (tail[2] as u64) << 16;
    }
    if remaining >= 2 {
        h ^= (tail[1] as u64) << 8;
    }
    if remaining >= 1 {
        h ^= tail[0] as u64;
        h = h.wrapping_mul(M);
    }

    h ^= h >> R;
    h = h.wrapping_mul(M);
    h ^= h >> R;

    h
}

// ─── ID Macro ────────────────────────────────────────────────────────────────

/// Generates a fixed-size Hive ID type.
///
/// Each ID is a `[u8; N]` newtype with:
/// - `from_binary` / `from_hex` / `from_random` constructors
/// - `binary()` / `hex()` / `data()` accessors
/// - `Hash`, `Eq`, `PartialEq`, `Clone`, `Copy`, `Debug`, `Display`
/// - `nil` default (all 0xFF bytes)
macro_rules! define_hive_id {
    ($name:ident, $size:expr) => {
        #[derive(Clone, Copy)]
        #[repr(C)]
        pub struct $name {
            data: [u8; $size],
        }

        impl $name {
            /// The fixed byte size of this ID type.
            pub const SIZE: usize = $size;

            /// Create a nil ID (all 0xFF bytes).
            pub const fn nil() -> Self {
                Self {
                    data: [0xFF; $size],
                }
            }

            /// Create an ID from raw bytes. Panics if `bytes.len() != SIZE`.
            pub fn from_binary(bytes: &[u8]) -> Self {
                assert_eq!(
                    bytes.len(),
                    $size,
                    "expected {} bytes for {}, got {}",
                    $size,
                    stringify!($name),
                    bytes.len()
                );
                let mut data = [0u8; $size];
                data.copy_from_slice(bytes);
                Self { data }
            }

            /// Create an ID from a hex string. Returns `nil` on invalid input.
            pub fn from_hex(hex_str: &str) -> Self {
                if hex_str.len() != $size * 2 {
                    tracing::error!(
                        "incorrect hex string length for {}: expected {}, got {}",
                        stringify!($name),
                        $size * 2,
                        hex_str.len()
                    );
                    return Self::nil();
                }
                match hex::decode(hex_str) {
                    Ok(bytes) => Self::from_binary(&bytes),
                    Err(_) => {
                        tracing::error!("invalid hex string for {}", stringify!($name));
                        Self::nil()
                    }
                }
            }

            /// Create a random ID.
            pub fn from_random() -> Self {
                let mut data = [0u8; $size];
                hive_util::random::fill_random(&mut data);
                Self { data }
            }

            /// Returns true if this is the nil ID (all 0xFF).
            pub fn is_nil(&self) -> bool {
                self.data == [0xFF; $size]
            }

            /// Raw byte array reference.
            pub fn data(&self) -> &[u8; $size] {
                &self.data
            }

            /// Raw bytes as `&[u8]`.
            pub fn as_bytes(&self) -> &[u8] {
                &self.data
            }

            /// Binary string (owned copy of the bytes).
            pub fn binary(&self) -> Vec<u8> {
                self.data.to_vec()
            }

            /// Hex-encoded string (lowercase).
            pub fn hex(&self) -> String {
                hex::encode(self.data)
            }

            /// Compute the stable MurmurHash64A of the ID bytes.
            pub fn murmur_hash(&self) -> u64 {
                murmur_hash_64a(&self.data, 0)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::nil()
            }
        }

        impl PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                self.data == other.data
            }
        }

        impl Eq for $name {}

        impl Hash for $name {
            fn hash<H: Hasher>(&self, state: &mut H) {
                self.murmur_hash().hash(state);
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.hex())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.hex())
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.data
            }
        }
    };
}

// ─── ID Type Definitions ────────────────────────────────────────────────────

define_hive_id!(JobId, JOB_ID_SIZE);
define_hive_id!(ActorId, ACTOR_ID_SIZE);
define_hive_id!(TaskId, TASK_ID_SIZE);
define_hive_id!(ObjectId, OBJECT_ID_SIZE);

// Full-width unique IDs (all 16 bytes).
define_hive_id!(UniqueId, UNIQUE_ID_SIZE);
define_hive_id!(WorkerId, UNIQUE_ID_SIZE);
define_hive_id!(NodeId, UNIQUE_ID_SIZE);
define_hive_id!(ActorCheckpointId, UNIQUE_ID_SIZE);

// ─── Transport flag ─────────────────────────────────────────────────────────

/// Which transport initially owns an object: the supervisor-mediated path
/// (plasma-resident) or the worker-to-worker direct path (memory-store
/// resident, promotable to plasma).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TaskTransportType {
    Raylet = 0,
    Direct = 1,
}

impl TaskTransportType {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(TaskTransportType::Raylet),
            1 => Some(TaskTransportType::Direct),
            _ => None,
        }
    }
}

// ─── JobId extras ───────────────────────────────────────────────────────────

impl JobId {
    /// Create a JobId from a u32 integer.
    pub fn from_int(value: u32) -> Self {
        Self {
            data: value.to_be_bytes(),
        }
    }

    /// Convert to a u32 integer.
    pub fn to_int(&self) -> u32 {
        u32::from_be_bytes(self.data)
    }
}

// ─── ActorId extras ─────────────────────────────────────────────────────────

impl ActorId {
    const UNIQUE_BYTES_LENGTH: usize = ACTOR_ID_SIZE - JOB_ID_SIZE;

    /// Create an ActorId deterministically from the submitting task.
    pub fn of(job_id: &JobId, parent_task_id: &TaskId, parent_task_counter: u64) -> Self {
        let mut data = [0u8; ACTOR_ID_SIZE];

        let mut hash_input = Vec::with_capacity(TaskId::SIZE + 8);
        hash_input.extend_from_slice(parent_task_id.as_bytes());
        hash_input.extend_from_slice(&parent_task_counter.to_le_bytes());
        let hash = murmur_hash_64a(&hash_input, 0);

        data[..Self::UNIQUE_BYTES_LENGTH]
            .copy_from_slice(&hash.to_le_bytes()[..Self::UNIQUE_BYTES_LENGTH]);
        data[Self::UNIQUE_BYTES_LENGTH..].copy_from_slice(job_id.data());

        Self { data }
    }

    /// Extract the embedded JobId (last 4 bytes).
    pub fn job_id(&self) -> JobId {
        JobId::from_binary(&self.data[Self::UNIQUE_BYTES_LENGTH..])
    }
}

// ─── TaskId extras ──────────────────────────────────────────────────────────

impl TaskId {
    const UNIQUE_BYTES_LENGTH: usize = TASK_ID_SIZE - ACTOR_ID_SIZE;

    /// Create a TaskId for an actor creation task. The unique bytes are all
    /// zeros so the creation task of an actor is derivable from its id alone.
    pub fn for_actor_creation_task(actor_id: &ActorId) -> Self {
        let mut data = [0u8; TASK_ID_SIZE];
        data[Self::UNIQUE_BYTES_LENGTH..].copy_from_slice(actor_id.data());
        Self { data }
    }

    /// Create a TaskId for a normal task.
    pub fn for_normal_task(
        job_id: &JobId,
        parent_task_id: &TaskId,
        parent_task_counter: u64,
    ) -> Self {
        Self::for_actor_task(job_id, parent_task_id, parent_task_counter, &ActorId::nil())
    }

    /// Create a TaskId for an actor task.
    pub fn for_actor_task(
        _job_id: &JobId,
        parent_task_id: &TaskId,
        parent_task_counter: u64,
        actor_id: &ActorId,
    ) -> Self {
        let mut data = [0u8; TASK_ID_SIZE];

        let mut hash_input = Vec::with_capacity(TaskId::SIZE + 8);
        hash_input.extend_from_slice(parent_task_id.as_bytes());
        hash_input.extend_from_slice(&parent_task_counter.to_le_bytes());
        let hash = murmur_hash_64a(&hash_input, 0);

        data[..Self::UNIQUE_BYTES_LENGTH]
            .copy_from_slice(&hash.to_le_bytes()[..Self::UNIQUE_BYTES_LENGTH]);
        data[Self::UNIQUE_BYTES_LENGTH..].copy_from_slice(actor_id.data());

        Self { data }
    }

    /// Create the synthetic root TaskId for the driver of a given job.
    pub fn for_driver_task(job_id: &JobId) -> Self {
        let actor_id = ActorId::of(job_id, &TaskId::nil(), 0);
        Self::for_actor_creation_task(&actor_id)
    }

    /// Extract the embedded ActorId (last 10 bytes).
    pub fn actor_id(&self) -> ActorId {
        ActorId::from_binary(&self.data[Self::UNIQUE_BYTES_LENGTH..])
    }

    /// Extract the embedded JobId (via the ActorId).
    pub fn job_id(&self) -> JobId {
        self.actor_id().job_id()
    }

    /// Check if this is an actor creation task (unique bytes are all zeros).
    pub fn is_for_actor_creation_task(&self) -> bool {
        self.data[..Self::UNIQUE_BYTES_LENGTH]
            .iter()
            .all(|&b| b == 0)
    }
}

// ─── ObjectId extras ────────────────────────────────────────────────────────

impl ObjectId {
    const INDEX_OFFSET: usize = TASK_ID_SIZE;
    const FLAG_OFFSET: usize = TASK_ID_SIZE + 4;

    /// Build an ObjectId from its parts. Layout: 15 TaskId bytes, a
    /// big-endian u32 index, then the one-byte transport flag.
    fn of(task_id: &TaskId, index: u32, transport_type: TaskTransportType) -> Self {
        let mut data = [0u8; OBJECT_ID_SIZE];
        data[..TASK_ID_SIZE].copy_from_slice(task_id.data());
        data[Self::INDEX_OFFSET..Self::FLAG_OFFSET].copy_from_slice(&index.to_be_bytes());
        data[Self::FLAG_OFFSET] = transport_type as u8;
        Self { data }
    }

    /// Create an ObjectId for an object put by a task.
    pub fn for_put(task_id: &TaskId, put_index: u32, transport_type: TaskTransportType) -> Self {
        Self::of(task_id, put_index, transport_type)
    }

    /// Create an ObjectId for the `return_index`-th return value of a task.
    /// Return indices are 1-based: index 0 is reserved for puts.
    pub fn for_task_return(
        task_id: &TaskId,
        return_index: u32,
        transport_type: TaskTransportType,
    ) -> Self {
        Self::of(task_id, return_index, transport_type)
    }

    /// Extract the embedded TaskId (first 15 bytes).
    pub fn task_id(&self) -> TaskId {
        TaskId::from_binary(&self.data[..TASK_ID_SIZE])
    }

    /// The return/put index (big-endian u32).
    pub fn object_index(&self) -> u32 {
        u32::from_be_bytes(
            self.data[Self::INDEX_OFFSET..Self::FLAG_OFFSET]
                .try_into()
                .unwrap(),
        )
    }

    /// The raw transport flag byte.
    pub fn transport_type(&self) -> u8 {
        self.data[Self::FLAG_OFFSET]
    }

    /// True if this object travels the worker-to-worker direct path and so
    /// lives in the memory tier until promoted.
    pub fn is_direct_call_type(&self) -> bool {
        self.data[Self::FLAG_OFFSET] == TaskTransportType::Direct as u8
    }
}

// ─── WorkerId extras ────────────────────────────────────────────────────────

impl WorkerId {
    /// Compute a deterministic driver WorkerId from a JobId.
    pub fn compute_driver_id_from_job(job_id: &JobId) -> Self {
        let mut data = [0u8; UNIQUE_ID_SIZE];
        data[..JobId::SIZE].copy_from_slice(job_id.data());
        Self { data }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
