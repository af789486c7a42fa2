// Copyright 2026 The Hive Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//  http://www.apache.org/licenses/LICENSE-2.0

//! Wire message types for Hive.
//!
//! The messages are hand-maintained prost structs with explicit field tags,
//! wire-compatible with a proto3 schema. Keeping them in Rust avoids a
//! protoc build-time dependency while preserving the encoding contract.

pub mod rpc;
