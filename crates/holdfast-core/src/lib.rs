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

//! # Holdfast Core
//!
//! Foundational crate containing the contracts and data types of the
//! reference-counted asset loading layer.
//!
//! Nothing in here decides *when* an asset is loaded or released; that is the
//! job of `holdfast-access`. This crate only defines the vocabulary:
//! - keys and references that name assets,
//! - the [`AssetEngine`](engine::AssetEngine) contract implemented by the
//!   underlying asset-addressing engine,
//! - operation handles and the cancellation tokens used to race them,
//! - the [`Owner`](owner::Owner) registry that holds one handle per key.

#![warn(missing_docs)]

pub mod asset;
pub mod cancel;
pub mod config;
pub mod engine;
pub mod error;
pub mod owner;
pub mod telemetry;

pub use asset::{Asset, AssetGuid, AssetKey, AssetReference};
pub use cancel::CancelToken;
pub use config::{AccessConfig, ConfigError, LogLevel};
pub use engine::{AnyAsset, AssetEngine, LoadHandle, OperationCompleter, OperationStatus};
pub use error::{AccessError, EngineError};
pub use owner::{HandleTable, Owner, OwnerId};
