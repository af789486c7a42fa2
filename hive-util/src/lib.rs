// Copyright 2026 The Hive Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//  http://www.apache.org/licenses/LICENSE-2.0

//! Utility library for Hive.
//!
//! Provides logging bootstrap, randomness, time helpers, and backoff
//! calculators shared by every other crate in the workspace.

pub mod backoff;
pub mod logging;
pub mod random;
pub mod time;
