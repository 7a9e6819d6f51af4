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

//! Sprite helpers: derive the sub-asset key, then load it like any asset.
//!
//! Batches load one sprite after the other so progress only ever grows.

use super::{AssetAccess, LoadOptions};
use holdfast_core::asset::{sprite_key, SpriteSelector};
use holdfast_core::{AccessError, Asset, AssetKey, Owner};
use holdfast_telemetry::ObjectKind;
use std::sync::Arc;

impl AssetAccess {
    /// Loads one sprite of the sheet at `base`, blocking until it resolves.
    pub fn load_sprite<T: Asset>(
        &self,
        owner: &Owner,
        base: &str,
        selector: impl Into<SpriteSelector>,
    ) -> Result<Arc<T>, AccessError> {
        self.load_asset(owner, selector.into().key(base))
    }

    /// Loads one sprite of the sheet at `base` without blocking.
    pub async fn load_sprite_async<T: Asset>(
        &self,
        owner: &Owner,
        base: &str,
        selector: impl Into<SpriteSelector>,
        options: LoadOptions,
    ) -> Result<Arc<T>, AccessError> {
        self.load_asset_async(owner, selector.into().key(base), options)
            .await
    }

    /// Loads the sprites `0..count` of the sheet at `base`, in order.
    ///
    /// Stops at the first failure; sprites loaded before it stay cached.
    pub fn load_sprites<T: Asset>(
        &self,
        owner: &Owner,
        base: &str,
        count: usize,
    ) -> Result<Vec<Arc<T>>, AccessError> {
        (0..count)
            .map(|index| self.load_asset(owner, sprite_key(base, Some(index))))
            .collect()
    }

    /// Loads the sprites `0..count` of the sheet at `base` without blocking.
    ///
    /// Progress reports `index / count` before each load and `1.0` once every
    /// sprite is loaded. The cancellation token and timeout apply to each
    /// sprite; the callbacks run once, with the error that stopped the batch.
    pub async fn load_sprites_async<T: Asset>(
        &self,
        owner: &Owner,
        base: &str,
        count: usize,
        options: LoadOptions,
    ) -> Result<Vec<Arc<T>>, AccessError> {
        let LoadOptions {
            progress,
            cancel,
            timeout,
            callbacks,
        } = options;

        if cancel.as_ref().is_some_and(|token| token.is_canceled()) {
            let error = AccessError::AlreadyCanceled {
                key: AssetKey::from(base),
            };
            return Err(self.inner.reject(ObjectKind::Asset, error, callbacks));
        }

        let report = |fraction: f32| {
            if let Some(progress) = progress.as_deref() {
                progress(fraction);
            }
        };

        let mut sprites = Vec::with_capacity(count);
        for index in 0..count {
            report(index as f32 / count as f32);
            let mut step = LoadOptions::new();
            step.cancel = cancel.clone();
            step.timeout = timeout;

            match self
                .load_asset_async(owner, sprite_key(base, Some(index)), step)
                .await
            {
                Ok(sprite) => sprites.push(sprite),
                Err(error) => {
                    log::debug!("AssetAccess: sprite batch '{base}' stopped at {index}/{count}");
                    callbacks.fire(&error);
                    return Err(error);
                }
            }
        }
        report(1.0);
        Ok(sprites)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use holdfast_core::engine::MemoryEngine;
    use holdfast_core::{AccessConfig, CancelToken};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn setup() -> (Arc<MemoryEngine>, AssetAccess) {
        let engine = Arc::new(MemoryEngine::new());
        let access = AssetAccess::new(engine.clone(), AccessConfig::silent()).unwrap();
        (engine, access)
    }

    fn sheet(engine: &MemoryEngine, base: &str, count: usize) {
        for index in 0..count {
            engine.insert(sprite_key(base, Some(index)), format!("frame {index}"));
        }
    }

    #[test]
    fn sprite_selectors_address_distinct_keys() {
        let (engine, access) = setup();
        engine.insert("tex/sheet.png[sheet]", String::from("whole"));
        engine.insert("tex/sheet.png[sheet_2]", String::from("third"));
        engine.insert("tex/sheet.png[idle]", String::from("idle"));
        let owner = Owner::new("hud");

        let whole = access
            .load_sprite::<String>(&owner, "tex/sheet.png", SpriteSelector::Whole)
            .unwrap();
        let third = access.load_sprite::<String>(&owner, "tex/sheet.png", 2usize).unwrap();
        let idle = access
            .load_sprite::<String>(&owner, "tex/sheet.png", "idle")
            .unwrap();

        assert_eq!(whole.as_str(), "whole");
        assert_eq!(third.as_str(), "third");
        assert_eq!(idle.as_str(), "idle");
        assert!(owner.holds("tex/sheet.png[sheet_2]"));
    }

    #[test]
    fn batch_loads_in_order_and_dedups_against_singles() {
        let (engine, access) = setup();
        sheet(&engine, "ui/walk.png", 3);
        let owner = Owner::new("hud");

        access.load_sprite::<String>(&owner, "ui/walk.png", 1usize).unwrap();
        let frames = access.load_sprites::<String>(&owner, "ui/walk.png", 3).unwrap();

        let texts: Vec<_> = frames.iter().map(|frame| frame.as_str()).collect();
        assert_eq!(texts, ["frame 0", "frame 1", "frame 2"]);
        assert_eq!(engine.load_count("ui/walk.png[walk_1]"), 1);
    }

    #[tokio::test]
    async fn async_batch_reports_monotonic_progress() {
        let (engine, access) = setup();
        sheet(&engine, "ui/walk.png", 4);
        let owner = Owner::new("hud");
        let reports = Arc::new(Mutex::new(Vec::new()));
        let sink = reports.clone();

        let frames = access
            .load_sprites_async::<String>(
                &owner,
                "ui/walk.png",
                4,
                LoadOptions::new().progress(move |p| sink.lock().unwrap().push(p)),
            )
            .await
            .unwrap();

        assert_eq!(frames.len(), 4);
        assert_eq!(*reports.lock().unwrap(), vec![0.0, 0.25, 0.5, 0.75, 1.0]);
    }

    #[tokio::test]
    async fn empty_batch_completes_immediately() {
        let (engine, access) = setup();
        let owner = Owner::new("hud");
        let reports = Arc::new(Mutex::new(Vec::new()));
        let sink = reports.clone();

        let frames = access
            .load_sprites_async::<String>(
                &owner,
                "ui/none.png",
                0,
                LoadOptions::new().progress(move |p| sink.lock().unwrap().push(p)),
            )
            .await
            .unwrap();

        assert!(frames.is_empty());
        assert_eq!(*reports.lock().unwrap(), vec![1.0]);
        assert_eq!(engine.total_refs(), 0);
    }

    #[tokio::test]
    async fn failing_sprite_stops_the_batch_and_fires_once() {
        let (engine, access) = setup();
        sheet(&engine, "ui/walk.png", 3);
        engine.insert_failing("ui/walk.png[walk_1]", "missing slice");
        let owner = Owner::new("hud");
        let failures = Arc::new(AtomicUsize::new(0));
        let counter = failures.clone();

        let err = access
            .load_sprites_async::<String>(
                &owner,
                "ui/walk.png",
                3,
                LoadOptions::new().on_failed(move |_| {
                    counter.fetch_add(1, Ordering::SeqCst);
                }),
            )
            .await
            .unwrap_err();

        assert_eq!(err.key().as_str(), "ui/walk.png[walk_1]");
        assert_eq!(failures.load(Ordering::SeqCst), 1);
        assert!(owner.holds("ui/walk.png[walk_0]"));
        assert!(!owner.holds("ui/walk.png[walk_1]"));
        assert_eq!(engine.load_count("ui/walk.png[walk_2]"), 0);
    }

    #[tokio::test]
    async fn canceled_batch_loads_nothing() {
        let (engine, access) = setup();
        sheet(&engine, "ui/walk.png", 2);
        let owner = Owner::new("hud");

        let err = access
            .load_sprites_async::<String>(
                &owner,
                "ui/walk.png",
                2,
                LoadOptions::new().cancel_token(CancelToken::canceled_token()),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AccessError::AlreadyCanceled { .. }));
        assert!(!owner.has_handle_table());
        assert_eq!(engine.total_refs(), 0);
    }
}
