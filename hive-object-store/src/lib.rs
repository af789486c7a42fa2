// Copyright 2026 The Hive Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//  http://www.apache.org/licenses/LICENSE-2.0

//! Shared-memory object store client interface.
//!
//! Objects live in the node-local plasma store until their pinning
//! references are released. Workers talk to the store through the
//! [`PlasmaClient`] trait; [`InMemoryPlasmaStore`] is the reference
//! implementation used by embedded and test deployments.

mod store;

pub use store::{InMemoryPlasmaStore, PlasmaBuffer, PlasmaClient, PlasmaError};
