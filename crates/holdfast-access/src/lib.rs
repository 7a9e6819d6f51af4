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

//! # Holdfast Access
//!
//! Owner-scoped, deduplicated asset loading on top of an
//! [`AssetEngine`](holdfast_core::AssetEngine).
//!
//! An [`Owner`](holdfast_core::Owner) holds at most one handle per key. The
//! first load of a key creates the handle; later loads, concurrent or not,
//! share it. Failures, cancellations and timeouts evict the key so the next
//! load retries. Destroying the owner releases everything it still holds.
//!
//! ```ignore
//! let access = AssetAccess::new(engine, AccessConfig::default())?;
//! let hud = Owner::new("hud");
//! let font = access
//!     .load_asset_async::<Font>(&hud, "ui/font.ttf", LoadOptions::new().timeout_ms(500))
//!     .await?;
//! hud.destroy();
//! ```

#![warn(missing_docs)]

pub mod access;

pub use access::{AssetAccess, Callbacks, LoadOptions, OutcomeCallback, ProgressFn};
