// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

#![allow(dead_code)]

use holdfast_access::AssetAccess;
use holdfast_core::engine::MemoryEngine;
use holdfast_core::AccessConfig;
use std::sync::Arc;

/// A prefab asset as stored by the test catalog.
#[derive(Debug, PartialEq)]
pub struct Prefab {
    pub name: &'static str,
}

impl holdfast_core::Asset for Prefab {}

/// An access layer over a fresh in-process engine, logging to the test output.
pub fn setup() -> (Arc<MemoryEngine>, AssetAccess) {
    holdfast_telemetry::logging::init_test_logger();
    let engine = Arc::new(MemoryEngine::new());
    let access = AssetAccess::new(engine.clone(), AccessConfig::default())
        .expect("metrics registration on a fresh registry");
    (engine, access)
}
