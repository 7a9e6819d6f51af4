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

//! Provides the primitive types used to name and categorize assets.
//!
//! An asset is always requested through an [`AssetKey`]: an opaque string that
//! the underlying engine knows how to resolve. Keys come from three places:
//! - a plain addressable path such as `"char/hero.prefab"`,
//! - an [`AssetReference`], whose key is the GUID of the referenced asset,
//! - a derived sub-asset key, e.g. one sprite inside a sprite sheet
//!   (see [`sprite_key`] and [`named_sprite_key`]).
//!
//! Identical logical requests always produce identical keys, which is what
//! lets an owner's handle table deduplicate loads.

mod key;
mod reference;
mod sprite;

pub use key::*;
pub use reference::*;
pub use sprite::*;

/// A marker trait for types that can be produced by the asset engine.
///
/// The supertraits enforce the guarantees the access layer relies on:
/// - `Send` + `Sync`: a resolved asset is shared between every owner that
///   requested it, potentially across threads.
/// - `'static`: results are type-erased while cached and downcast on access.
///
/// # Examples
///
/// ```
/// use holdfast_core::asset::Asset;
///
/// struct Texture {
///     width: u32,
/// }
///
/// impl Asset for Texture {}
/// ```
pub trait Asset: Send + Sync + 'static {}

impl Asset for String {}
impl Asset for Vec<u8> {}
