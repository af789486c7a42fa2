// Copyright 2026 The Hive Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//  http://www.apache.org/licenses/LICENSE-2.0

//! Client interface for the per-node supervisor daemon (the raylet).
//!
//! The worker runtime only depends on this trait; concrete transports live
//! with the deployment.

mod traits;

pub use traits::RayletClient;
