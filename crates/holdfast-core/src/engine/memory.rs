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

//! An in-process [`AssetEngine`] backed by a scripted catalog.
//!
//! Every catalog entry chooses how its operations resolve: immediately,
//! when the host calls [`MemoryEngine::complete_pending`], never, or with a
//! failure. The engine keeps per-key load counters and reference counts so
//! tools and tests can observe exactly what the access layer asked for.

use super::{
    AnyAsset, AssetEngine, Instance, InstanceId, LoadHandle, OperationCompleter, OperationId,
    SceneId, SceneInstance, SceneLoadMode,
};
use crate::asset::{Asset, AssetKey};
use crate::error::EngineError;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Behavior {
    Ready,
    Deferred,
    Hanging,
    Failing(String),
}

#[derive(Clone)]
struct Entry {
    asset: AnyAsset,
    behavior: Behavior,
}

enum Produce {
    Asset(AnyAsset),
    Instance(Option<InstanceId>),
    Scene(SceneLoadMode, bool),
}

struct PendingOp {
    key: AssetKey,
    behavior: Behavior,
    produce: Produce,
    completer: OperationCompleter,
}

#[derive(Default)]
struct State {
    catalog: HashMap<AssetKey, Entry>,
    load_calls: HashMap<AssetKey, usize>,
    ref_counts: HashMap<AssetKey, usize>,
    live: HashMap<OperationId, AssetKey>,
    pending: Vec<PendingOp>,
    instances: HashMap<InstanceId, Instance>,
    instance_refs: HashMap<InstanceId, OperationId>,
    scenes: Vec<(SceneInstance, OperationId)>,
    refuse_release: HashSet<AssetKey>,
    next_object_id: u64,
}

impl State {
    fn retain(&mut self, key: &AssetKey, id: OperationId) {
        *self.ref_counts.entry(key.clone()).or_default() += 1;
        self.live.insert(id, key.clone());
    }

    fn drop_ref(&mut self, id: OperationId) -> bool {
        let Some(key) = self.live.remove(&id) else {
            return false;
        };
        if let Some(count) = self.ref_counts.get_mut(&key) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                self.ref_counts.remove(&key);
            }
        }
        true
    }

    fn next_id(&mut self) -> u64 {
        self.next_object_id += 1;
        self.next_object_id
    }

    fn produce(&mut self, op: PendingOp) {
        let PendingOp {
            key,
            produce,
            completer,
            ..
        } = op;
        match produce {
            Produce::Asset(asset) => completer.succeed_shared(asset),
            Produce::Instance(parent) => {
                let instance = Instance {
                    id: InstanceId(self.next_id()),
                    key,
                    parent,
                };
                self.instances.insert(instance.id, instance.clone());
                self.instance_refs.insert(instance.id, completer.id());
                completer.succeed(instance);
            }
            Produce::Scene(mode, activated) => {
                if mode == SceneLoadMode::Single {
                    for (scene, op) in std::mem::take(&mut self.scenes) {
                        log::debug!("MemoryEngine: {} replaced by single-mode load", scene.id);
                        self.drop_ref(op);
                    }
                }
                let scene = SceneInstance {
                    id: SceneId(self.next_id()),
                    key,
                    mode,
                    activated,
                };
                self.scenes.push((scene.clone(), completer.id()));
                completer.succeed(scene);
            }
        }
    }

    /// Starts one operation for `key`, resolving it now when the entry allows.
    fn start(&mut self, key: &AssetKey, produce: impl FnOnce(AnyAsset) -> Produce) -> LoadHandle {
        let (handle, completer) = LoadHandle::pending(key.clone());
        self.retain(key, handle.id());

        let Some(entry) = self.catalog.get(key).cloned() else {
            completer.fail(EngineError::NotFound { key: key.clone() });
            return handle;
        };

        let op = PendingOp {
            key: key.clone(),
            behavior: entry.behavior.clone(),
            produce: produce(entry.asset),
            completer,
        };
        match entry.behavior {
            Behavior::Ready => self.produce(op),
            Behavior::Failing(reason) => op.completer.fail(EngineError::LoadFailed {
                key: key.clone(),
                reason,
            }),
            Behavior::Deferred | Behavior::Hanging => self.pending.push(op),
        }
        handle
    }

    fn take_pending(&mut self, key: &AssetKey) -> Vec<PendingOp> {
        let (taken, kept) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|op| &op.key == key);
        self.pending = kept;
        taken
    }
}

/// An in-process asset engine with a scripted catalog.
#[derive(Default)]
pub struct MemoryEngine {
    state: Mutex<State>,
}

impl MemoryEngine {
    /// Creates an engine with an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn insert_entry(&self, key: AssetKey, asset: AnyAsset, behavior: Behavior) {
        self.state().catalog.insert(key, Entry { asset, behavior });
    }

    /// Registers an asset whose operations resolve immediately.
    pub fn insert<A: Asset>(&self, key: impl Into<AssetKey>, asset: A) {
        self.insert_entry(key.into(), Arc::new(asset), Behavior::Ready);
    }

    /// Registers an asset whose operations stay pending until
    /// [`complete_pending`](Self::complete_pending) or a synchronous
    /// [`force_complete`](AssetEngine::force_complete).
    pub fn insert_deferred<A: Asset>(&self, key: impl Into<AssetKey>, asset: A) {
        self.insert_entry(key.into(), Arc::new(asset), Behavior::Deferred);
    }

    /// Registers an asset whose operations only resolve through an explicit
    /// [`complete_pending`](Self::complete_pending); synchronous completion stalls.
    pub fn insert_hanging<A: Asset>(&self, key: impl Into<AssetKey>, asset: A) {
        self.insert_entry(key.into(), Arc::new(asset), Behavior::Hanging);
    }

    /// Registers a key whose operations always fail with `reason`.
    pub fn insert_failing(&self, key: impl Into<AssetKey>, reason: impl Into<String>) {
        self.insert_entry(
            key.into(),
            Arc::new(()),
            Behavior::Failing(reason.into()),
        );
    }

    /// Removes a key from the catalog. Operations already started are unaffected.
    pub fn remove(&self, key: impl Into<AssetKey>) {
        self.state().catalog.remove(&key.into());
    }

    /// Resolves every pending operation for `key`. Returns how many resolved.
    pub fn complete_pending(&self, key: impl Into<AssetKey>) -> usize {
        let key = key.into();
        let mut state = self.state();
        let ops = state.take_pending(&key);
        let count = ops.len();
        for op in ops {
            state.produce(op);
        }
        count
    }

    /// Fails every pending operation for `key`. Returns how many failed.
    pub fn fail_pending(&self, key: impl Into<AssetKey>, reason: impl Into<String>) -> usize {
        let key = key.into();
        let reason = reason.into();
        let ops = self.state().take_pending(&key);
        let count = ops.len();
        for op in ops {
            op.completer.fail(EngineError::LoadFailed {
                key: key.clone(),
                reason: reason.clone(),
            });
        }
        count
    }

    /// Publishes a progress update on every pending operation for `key`.
    pub fn report_progress(&self, key: impl Into<AssetKey>, progress: f32) {
        let key = key.into();
        for op in self.state().pending.iter().filter(|op| op.key == key) {
            op.completer.report_progress(progress);
        }
    }

    /// Makes every release of `key` fail until [`allow_release`](Self::allow_release).
    pub fn refuse_release(&self, key: impl Into<AssetKey>) {
        self.state().refuse_release.insert(key.into());
    }

    /// Undoes [`refuse_release`](Self::refuse_release).
    pub fn allow_release(&self, key: impl Into<AssetKey>) {
        self.state().refuse_release.remove(&key.into());
    }

    /// Number of [`AssetEngine::load`] calls made for `key`.
    pub fn load_count(&self, key: impl Into<AssetKey>) -> usize {
        self.state()
            .load_calls
            .get(&key.into())
            .copied()
            .unwrap_or(0)
    }

    /// Outstanding references on `key` across every holder.
    pub fn ref_count(&self, key: impl Into<AssetKey>) -> usize {
        self.state()
            .ref_counts
            .get(&key.into())
            .copied()
            .unwrap_or(0)
    }

    /// Total outstanding references across all keys.
    pub fn total_refs(&self) -> usize {
        self.state().live.len()
    }

    /// Number of operations for `key` still waiting to be resolved.
    pub fn pending_count(&self, key: impl Into<AssetKey>) -> usize {
        let key = key.into();
        self.state()
            .pending
            .iter()
            .filter(|op| op.key == key)
            .count()
    }

    /// Instances currently alive in the scene graph.
    pub fn instances(&self) -> Vec<Instance> {
        let mut instances: Vec<_> = self.state().instances.values().cloned().collect();
        instances.sort_by_key(|instance| instance.id);
        instances
    }

    /// Scenes currently loaded, in load order.
    pub fn loaded_scenes(&self) -> Vec<SceneInstance> {
        self.state()
            .scenes
            .iter()
            .map(|(scene, _)| scene.clone())
            .collect()
    }
}

impl AssetEngine for MemoryEngine {
    fn load(&self, key: &AssetKey) -> LoadHandle {
        let mut state = self.state();
        *state.load_calls.entry(key.clone()).or_default() += 1;
        log::trace!("MemoryEngine: load '{key}'");
        state.start(key, Produce::Asset)
    }

    fn force_complete(&self, handle: &LoadHandle) -> Result<AnyAsset, EngineError> {
        if !handle.is_done() && !handle.is_released() {
            let mut state = self.state();
            if let Some(index) = state
                .pending
                .iter()
                .position(|op| op.completer.id() == handle.id())
            {
                if state.pending[index].behavior == Behavior::Hanging {
                    return Err(EngineError::Stalled {
                        key: handle.key().clone(),
                    });
                }
                let op = state.pending.swap_remove(index);
                state.produce(op);
            }
        }
        handle.wait_blocking()
    }

    fn release(&self, handle: &LoadHandle) -> Result<(), EngineError> {
        let abandoned = {
            let mut state = self.state();
            if state.refuse_release.contains(handle.key()) {
                return Err(EngineError::ReleaseFailed {
                    key: handle.key().clone(),
                });
            }
            if !state.drop_ref(handle.id()) {
                return Err(EngineError::AlreadyReleased);
            }
            handle.mark_released();
            let (abandoned, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut state.pending)
                .into_iter()
                .partition(|op| op.completer.id() == handle.id());
            state.pending = kept;
            abandoned
        };
        drop(abandoned);
        Ok(())
    }

    fn instantiate(&self, key: &AssetKey, parent: Option<InstanceId>) -> LoadHandle {
        self.state().start(key, |_| Produce::Instance(parent))
    }

    fn release_instance(&self, instance: &Instance) -> Result<bool, EngineError> {
        let mut state = self.state();
        let Some(op) = state.instance_refs.remove(&instance.id) else {
            return Ok(false);
        };
        Ok(state.drop_ref(op))
    }

    fn destroy_instance(&self, instance: &Instance) {
        self.state().instances.remove(&instance.id);
    }

    fn load_scene(
        &self,
        key: &AssetKey,
        mode: SceneLoadMode,
        activate_on_load: bool,
    ) -> LoadHandle {
        self.state()
            .start(key, |_| Produce::Scene(mode, activate_on_load))
    }

    fn unload_scene(&self, scene: &SceneInstance) -> LoadHandle {
        let mut state = self.state();
        let Some(index) = state.scenes.iter().position(|(s, _)| s.id == scene.id) else {
            return LoadHandle::failed(scene.key.clone(), EngineError::UnknownScene(scene.id.0));
        };
        let (unloaded, op) = state.scenes.remove(index);
        state.drop_ref(op);
        LoadHandle::succeeded(unloaded.key.clone(), unloaded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ready_entry_resolves_and_counts_references() {
        let engine = MemoryEngine::new();
        engine.insert("a", String::from("A"));

        let first = engine.load(&AssetKey::from("a"));
        let second = engine.load(&AssetKey::from("a"));
        assert!(first.is_done());
        assert_eq!(engine.load_count("a"), 2);
        assert_eq!(engine.ref_count("a"), 2);

        engine.release(&first).unwrap();
        assert_eq!(engine.ref_count("a"), 1);
        assert_eq!(engine.release(&first), Err(EngineError::AlreadyReleased));

        engine.release(&second).unwrap();
        assert_eq!(engine.ref_count("a"), 0);
    }

    #[test]
    fn missing_key_fails_but_still_holds_a_reference() {
        let engine = MemoryEngine::new();
        let handle = engine.load(&AssetKey::from("missing"));
        assert!(matches!(
            handle.result(),
            Some(Err(EngineError::NotFound { .. }))
        ));
        assert_eq!(engine.ref_count("missing"), 1);
        engine.release(&handle).unwrap();
        assert_eq!(engine.total_refs(), 0);
    }

    #[test]
    fn force_complete_pumps_deferred_but_not_hanging() {
        let engine = MemoryEngine::new();
        engine.insert_deferred("slow", String::from("S"));
        engine.insert_hanging("stuck", String::from("X"));

        let slow = engine.load(&AssetKey::from("slow"));
        assert!(!slow.is_done());
        assert!(engine.force_complete(&slow).is_ok());

        let stuck = engine.load(&AssetKey::from("stuck"));
        assert!(matches!(
            engine.force_complete(&stuck),
            Err(EngineError::Stalled { .. })
        ));
        assert_eq!(engine.complete_pending("stuck"), 1);
        assert!(stuck.is_done());
    }

    #[test]
    fn releasing_pending_operation_marks_it_released() {
        let engine = MemoryEngine::new();
        engine.insert_deferred("slow", String::from("S"));
        let handle = engine.load(&AssetKey::from("slow"));

        engine.release(&handle).unwrap();
        assert!(handle.is_released());
        assert_eq!(engine.pending_count("slow"), 0);
        assert_eq!(handle.wait_blocking().unwrap_err(), EngineError::Released);
    }

    #[test]
    fn refused_release_keeps_reference() {
        let engine = MemoryEngine::new();
        engine.insert("a", String::from("A"));
        engine.refuse_release("a");
        let handle = engine.load(&AssetKey::from("a"));

        assert!(matches!(
            engine.release(&handle),
            Err(EngineError::ReleaseFailed { .. })
        ));
        assert_eq!(engine.ref_count("a"), 1);

        engine.allow_release("a");
        engine.release(&handle).unwrap();
        assert_eq!(engine.ref_count("a"), 0);
    }

    #[test]
    fn instances_and_scenes_track_references() {
        let engine = MemoryEngine::new();
        engine.insert("char/hero.prefab", String::from("prefab"));
        engine.insert("levels/one.scene", String::from("scene"));
        engine.insert("levels/two.scene", String::from("scene"));

        let handle = engine.instantiate(&AssetKey::from("char/hero.prefab"), None);
        let instance = handle
            .result()
            .unwrap()
            .unwrap()
            .downcast::<Instance>()
            .unwrap();
        assert_eq!(engine.instances().len(), 1);
        assert!(engine.release_instance(&instance).unwrap());
        engine.destroy_instance(&instance);
        assert!(engine.instances().is_empty());
        assert_eq!(engine.ref_count("char/hero.prefab"), 0);

        engine.load_scene(&AssetKey::from("levels/one.scene"), SceneLoadMode::Single, true);
        engine.load_scene(&AssetKey::from("levels/two.scene"), SceneLoadMode::Additive, false);
        assert_eq!(engine.loaded_scenes().len(), 2);

        let third = engine.load_scene(&AssetKey::from("levels/one.scene"), SceneLoadMode::Single, true);
        assert_eq!(engine.loaded_scenes().len(), 1);
        let scene = third
            .result()
            .unwrap()
            .unwrap()
            .downcast::<SceneInstance>()
            .unwrap();
        assert!(engine.unload_scene(&scene).result().unwrap().is_ok());
        assert!(engine.loaded_scenes().is_empty());
        assert_eq!(engine.total_refs(), 0);
    }
}
