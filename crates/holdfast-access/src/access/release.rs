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

//! Pass-through release of instances and scenes. No cache is involved.

use super::{AssetAccess, ProgressFn};
use holdfast_core::engine::{Instance, SceneInstance};
use holdfast_core::EngineError;

impl AssetAccess {
    /// Releases the reference count held by `instance`, then destroys it.
    ///
    /// Returns whether the engine knew the instance. The instance is destroyed
    /// either way.
    pub fn release_instance(&self, instance: &Instance) -> Result<bool, EngineError> {
        let released = self.inner.engine.release_instance(instance);
        self.inner.engine.destroy_instance(instance);
        match &released {
            Ok(true) => log::debug!("AssetAccess: released {} ({})", instance.id, instance.key),
            Ok(false) => log::warn!(
                "AssetAccess: {} ({}) was not created by the engine",
                instance.id,
                instance.key
            ),
            Err(e) => log::warn!("AssetAccess: releasing {} failed: {e}", instance.id),
        }
        released
    }

    /// Unloads `scene` and waits for its dependencies to be released.
    pub async fn release_scene(
        &self,
        scene: &SceneInstance,
        progress: Option<ProgressFn>,
    ) -> Result<(), EngineError> {
        let handle = self.inner.engine.unload_scene(scene);
        handle.wait(progress.as_deref()).await?;
        log::debug!("AssetAccess: unloaded {} ({})", scene.id, scene.key);
        Ok(())
    }
}
