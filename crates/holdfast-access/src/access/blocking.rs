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

//! The synchronous path: block until the handle is terminal.
//!
//! There is no suspension point to interrupt, so cancellation and timeout do
//! not exist here. Every failure, a release observed while blocked included,
//! surfaces as [`AccessError::OperationFailed`].

use super::{AssetAccess, Callbacks, Holder};
use holdfast_core::engine::{Instance, InstanceId, SceneInstance, SceneLoadMode};
use holdfast_core::{AccessError, Asset, AssetKey, LoadHandle, Owner};
use holdfast_telemetry::ObjectKind;
use std::sync::Arc;

impl AssetAccess {
    /// Loads `key` for `owner`, blocking until it resolves.
    ///
    /// The handle stays cached on success, so the next call for the same key
    /// returns the same asset without touching the engine.
    pub fn load_asset<T: Asset>(
        &self,
        owner: &Owner,
        key: impl Into<AssetKey>,
    ) -> Result<Arc<T>, AccessError> {
        self.load_asset_with(owner, key, Callbacks::new())
    }

    /// [`load_asset`](Self::load_asset) with outcome callbacks.
    pub fn load_asset_with<T: Asset>(
        &self,
        owner: &Owner,
        key: impl Into<AssetKey>,
        callbacks: Callbacks,
    ) -> Result<Arc<T>, AccessError> {
        let key = key.into();
        let handle = match self.acquire_asset(owner, &key) {
            Ok(handle) => handle,
            Err(error) => return Err(self.inner.reject(ObjectKind::Asset, error, callbacks)),
        };
        self.complete_blocking(ObjectKind::Asset, Holder::Owner(owner), handle, callbacks)
    }

    /// Instantiates the prefab `key` under `parent`, blocking until done.
    ///
    /// Instances are not cached; release them with
    /// [`release_instance`](Self::release_instance).
    pub fn instantiate(
        &self,
        key: impl Into<AssetKey>,
        parent: Option<InstanceId>,
        callbacks: Callbacks,
    ) -> Result<Arc<Instance>, AccessError> {
        let handle = self.inner.engine.instantiate(&key.into(), parent);
        self.complete_blocking(ObjectKind::Prefab, Holder::Caller, handle, callbacks)
    }

    /// Loads the scene `key`, blocking until done.
    pub fn load_scene(
        &self,
        key: impl Into<AssetKey>,
        mode: SceneLoadMode,
        activate_on_load: bool,
        callbacks: Callbacks,
    ) -> Result<Arc<SceneInstance>, AccessError> {
        let handle = self
            .inner
            .engine
            .load_scene(&key.into(), mode, activate_on_load);
        self.complete_blocking(ObjectKind::SceneInstance, Holder::Caller, handle, callbacks)
    }

    fn complete_blocking<T: Asset>(
        &self,
        kind: ObjectKind,
        holder: Holder<'_>,
        handle: LoadHandle,
        callbacks: Callbacks,
    ) -> Result<Arc<T>, AccessError> {
        let key = handle.key().clone();
        match self.inner.engine.force_complete(&handle) {
            Ok(asset) => self.inner.finish(kind, holder, &handle, asset, callbacks),
            Err(source) => Err(self.inner.abandon(
                kind,
                holder,
                &handle,
                AccessError::OperationFailed { key, source },
                callbacks,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use holdfast_core::engine::MemoryEngine;
    use holdfast_core::{AccessConfig, AnyAsset, AssetEngine, EngineError};
    use holdfast_telemetry::Outcome;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn setup() -> (Arc<MemoryEngine>, AssetAccess) {
        let engine = Arc::new(MemoryEngine::new());
        let access = AssetAccess::new(engine.clone(), AccessConfig::silent()).unwrap();
        (engine, access)
    }

    #[test]
    fn failure_evicts_and_runs_failed_callback() {
        let (engine, access) = setup();
        engine.insert_failing("broken.png", "corrupt header");
        let owner = Owner::new("hud");
        let failed = Arc::new(AtomicBool::new(false));
        let flag = failed.clone();

        let err = access
            .load_asset_with::<String>(
                &owner,
                "broken.png",
                Callbacks::new().on_failed(move |_| flag.store(true, Ordering::SeqCst)),
            )
            .unwrap_err();

        assert!(matches!(
            err,
            AccessError::OperationFailed {
                source: EngineError::LoadFailed { .. },
                ..
            }
        ));
        assert!(failed.load(Ordering::SeqCst));
        assert!(!owner.holds("broken.png"));
        assert_eq!(engine.total_refs(), 0);
        assert_eq!(access.reporter().count(Outcome::Failed), 1);
    }

    #[test]
    fn type_mismatch_keeps_handle_cached() {
        let (engine, access) = setup();
        engine.insert("a", String::from("A"));
        let owner = Owner::new("hud");

        let err = access.load_asset::<Vec<u8>>(&owner, "a").unwrap_err();
        assert!(matches!(err, AccessError::TypeMismatch { .. }));
        assert!(owner.holds("a"));

        let text = access.load_asset::<String>(&owner, "a").unwrap();
        assert_eq!(text.as_str(), "A");
        assert_eq!(engine.load_count("a"), 1);
    }

    #[test]
    fn deferred_load_is_pumped_to_completion() {
        let (engine, access) = setup();
        engine.insert_deferred("slow.bin", vec![1u8, 2, 3]);
        let owner = Owner::new("hud");

        let bytes = access.load_asset::<Vec<u8>>(&owner, "slow.bin").unwrap();
        assert_eq!(bytes.as_slice(), &[1, 2, 3]);
    }

    #[test]
    fn stalled_load_fails_without_leaking() {
        let (engine, access) = setup();
        engine.insert_hanging("stuck.bin", vec![0u8]);
        let owner = Owner::new("hud");

        let err = access.load_asset::<Vec<u8>>(&owner, "stuck.bin").unwrap_err();
        assert!(matches!(
            err,
            AccessError::OperationFailed {
                source: EngineError::Stalled { .. },
                ..
            }
        ));
        assert_eq!(engine.total_refs(), 0);
        assert_eq!(engine.pending_count("stuck.bin"), 0);
    }

    #[test]
    fn instantiate_and_scene_are_not_cached() {
        let (engine, access) = setup();
        engine.insert("char/hero.prefab", String::from("prefab"));
        engine.insert("levels/one.scene", String::from("scene"));

        let first = access
            .instantiate("char/hero.prefab", None, Callbacks::new())
            .unwrap();
        let second = access
            .instantiate("char/hero.prefab", Some(first.id), Callbacks::new())
            .unwrap();
        assert_ne!(first.id, second.id);
        assert_eq!(second.parent, Some(first.id));
        assert_eq!(engine.ref_count("char/hero.prefab"), 2);

        let scene = access
            .load_scene("levels/one.scene", SceneLoadMode::Single, true, Callbacks::new())
            .unwrap();
        assert!(scene.activated);
        assert_eq!(access.reporter().count(Outcome::Succeeded), 3);
    }

    #[test]
    fn failed_instantiate_releases_its_reference() {
        let (engine, access) = setup();
        let err = access
            .instantiate("missing.prefab", None, Callbacks::new())
            .unwrap_err();
        assert!(matches!(
            err,
            AccessError::OperationFailed {
                source: EngineError::NotFound { .. },
                ..
            }
        ));
        assert_eq!(engine.total_refs(), 0);
    }

    /// Resolves instantiations and scene loads to the catalog asset instead
    /// of an instance, as a misbehaving engine would.
    struct MisroutedEngine(Arc<MemoryEngine>);

    impl AssetEngine for MisroutedEngine {
        fn load(&self, key: &AssetKey) -> LoadHandle {
            self.0.load(key)
        }

        fn force_complete(&self, handle: &LoadHandle) -> Result<AnyAsset, EngineError> {
            self.0.force_complete(handle)
        }

        fn release(&self, handle: &LoadHandle) -> Result<(), EngineError> {
            self.0.release(handle)
        }

        fn instantiate(&self, key: &AssetKey, _parent: Option<InstanceId>) -> LoadHandle {
            self.0.load(key)
        }

        fn release_instance(&self, instance: &Instance) -> Result<bool, EngineError> {
            self.0.release_instance(instance)
        }

        fn destroy_instance(&self, instance: &Instance) {
            self.0.destroy_instance(instance)
        }

        fn load_scene(&self, key: &AssetKey, _: SceneLoadMode, _: bool) -> LoadHandle {
            self.0.load(key)
        }

        fn unload_scene(&self, scene: &SceneInstance) -> LoadHandle {
            self.0.unload_scene(scene)
        }
    }

    #[test]
    fn mistyped_instance_is_released() {
        let engine = Arc::new(MemoryEngine::new());
        engine.insert("char/hero.prefab", String::from("not an instance"));
        engine.insert("levels/one.scene", String::from("not a scene"));
        let access = AssetAccess::new(
            Arc::new(MisroutedEngine(engine.clone())),
            AccessConfig::silent(),
        )
        .unwrap();
        let failed = Arc::new(AtomicBool::new(false));
        let flag = failed.clone();

        let err = access
            .instantiate(
                "char/hero.prefab",
                None,
                Callbacks::new().on_failed(move |_| flag.store(true, Ordering::SeqCst)),
            )
            .unwrap_err();
        assert!(matches!(err, AccessError::TypeMismatch { .. }));
        assert!(failed.load(Ordering::SeqCst));

        let err = access
            .load_scene("levels/one.scene", SceneLoadMode::Single, true, Callbacks::new())
            .unwrap_err();
        assert!(matches!(err, AccessError::TypeMismatch { .. }));

        assert_eq!(engine.total_refs(), 0);
        assert_eq!(access.reporter().count(Outcome::Failed), 2);
    }
}
