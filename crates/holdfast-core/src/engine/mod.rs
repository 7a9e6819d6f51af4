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

//! The contract of the underlying asset-addressing engine.
//!
//! The access layer never loads bytes itself. It asks an [`AssetEngine`] for
//! an operation, waits on the returned [`LoadHandle`], and tells the engine
//! when it no longer needs the result. Each handle returned by a load call
//! represents exactly one increment of the engine's reference count for that
//! key; [`AssetEngine::release`] decrements it once.

mod memory;
mod operation;

pub use memory::*;
pub use operation::*;

use crate::asset::{Asset, AssetKey};
use crate::error::EngineError;
use std::fmt;

/// Identifies an instantiated prefab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(pub u64);

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "instance#{}", self.0)
    }
}

/// Identifies a loaded scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SceneId(pub u64);

impl fmt::Display for SceneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scene#{}", self.0)
    }
}

/// An object instantiated from a prefab and parented into the scene graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instance {
    /// The engine-assigned id.
    pub id: InstanceId,
    /// The prefab key the instance was created from.
    pub key: AssetKey,
    /// The parent the instance was attached to, if any.
    pub parent: Option<InstanceId>,
}

impl Asset for Instance {}

/// How a scene load interacts with the scenes already loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SceneLoadMode {
    /// Unloads every loaded scene before activating the new one.
    #[default]
    Single,
    /// Keeps the loaded scenes alongside the new one.
    Additive,
}

/// A scene loaded through the engine, holding its reference-counted dependencies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneInstance {
    /// The engine-assigned id.
    pub id: SceneId,
    /// The scene key.
    pub key: AssetKey,
    /// The mode the scene was loaded with.
    pub mode: SceneLoadMode,
    /// Whether the scene was activated as soon as it loaded.
    pub activated: bool,
}

impl Asset for SceneInstance {}

/// The capabilities consumed from the underlying asset engine.
///
/// Implementations must support overlapping, independent reference holders
/// for the same key: two owners loading `"a"` each receive their own handle
/// and each release it once.
pub trait AssetEngine: Send + Sync {
    /// Begins loading `key`. Never blocks; the returned handle resolves later.
    fn load(&self, key: &AssetKey) -> LoadHandle;

    /// Drives `handle` to a terminal state, blocking the caller.
    ///
    /// The default waits for the producer; engines that complete work on the
    /// calling thread should pump it here instead.
    fn force_complete(&self, handle: &LoadHandle) -> Result<AnyAsset, EngineError> {
        handle.wait_blocking()
    }

    /// Decrements the reference count held by `handle`. Valid once per handle.
    fn release(&self, handle: &LoadHandle) -> Result<(), EngineError>;

    /// Loads the prefab `key` and instantiates it under `parent`.
    ///
    /// The handle resolves to an [`Instance`].
    fn instantiate(&self, key: &AssetKey, parent: Option<InstanceId>) -> LoadHandle;

    /// Releases the reference count held by an instance.
    ///
    /// Returns `false` if the instance was not created by this engine.
    fn release_instance(&self, instance: &Instance) -> Result<bool, EngineError>;

    /// Removes an instance from the scene graph.
    fn destroy_instance(&self, instance: &Instance);

    /// Loads the scene `key`. The handle resolves to a [`SceneInstance`].
    fn load_scene(&self, key: &AssetKey, mode: SceneLoadMode, activate_on_load: bool)
        -> LoadHandle;

    /// Unloads a scene and releases its dependencies.
    ///
    /// The returned handle resolves once the unload finished.
    fn unload_scene(&self, scene: &SceneInstance) -> LoadHandle;
}
