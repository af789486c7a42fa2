// Copyright 2026 The Hive Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//  http://www.apache.org/licenses/LICENSE-2.0

//! Client interface for the cluster metadata service (GCS).
//!
//! A pub/sub + KV facade over cluster state. The worker runtime subscribes
//! to actor lifecycle notifications and registers driver tasks through it.

mod traits;

pub use traits::{ActorNotificationCallback, GcsClient};
