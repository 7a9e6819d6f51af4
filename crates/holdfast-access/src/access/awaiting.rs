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

//! The asynchronous path: race resolution against cancellation and a timeout.
//!
//! The caller's task suspends on three competing conditions, polled in a
//! fixed order: the timeout first, then cancellation, then resolution. When
//! several are ready at the same instant the earlier one wins, so a timeout
//! and a cancellation firing together end as [`AccessError::Timeout`].

use super::{AssetAccess, Callbacks, Holder, LoadOptions};
use holdfast_core::engine::{Instance, InstanceId, SceneInstance, SceneLoadMode};
use holdfast_core::{
    AccessError, AnyAsset, Asset, AssetKey, CancelToken, EngineError, LoadHandle,
    OperationStatus, Owner,
};
use holdfast_telemetry::{ObjectKind, ScopedMetricTimer};
use std::future;
use std::sync::Arc;
use std::time::Duration;

/// How a race ended.
enum RaceEnd {
    TimedOut(Duration),
    Canceled,
    Resolved(Result<AnyAsset, EngineError>),
}

impl AssetAccess {
    /// Loads `key` for `owner` without blocking the caller's thread.
    ///
    /// The caller's token (if any) and the owner's lifetime are linked: either
    /// firing cancels the wait. A token already canceled on entry fails fast
    /// with [`AccessError::AlreadyCanceled`] and leaves the cache untouched.
    /// A handle already resolved in the cache is returned without waiting.
    pub async fn load_asset_async<T: Asset>(
        &self,
        owner: &Owner,
        key: impl Into<AssetKey>,
        options: LoadOptions,
    ) -> Result<Arc<T>, AccessError> {
        let key = key.into();
        let LoadOptions {
            progress,
            cancel,
            timeout,
            callbacks,
        } = options;

        let token = CancelToken::linked(cancel.iter().chain([owner.lifetime()]));
        if token.is_canceled() {
            let error = AccessError::AlreadyCanceled { key };
            return Err(self.inner.reject(ObjectKind::Asset, error, callbacks));
        }

        let handle = match self.acquire_asset(owner, &key) {
            Ok(handle) => handle,
            Err(error) => return Err(self.inner.reject(ObjectKind::Asset, error, callbacks)),
        };

        if handle.status() == OperationStatus::Succeeded && !handle.is_released() {
            if let Some(Ok(asset)) = handle.result() {
                if let Some(report) = progress.as_deref() {
                    report(1.0);
                }
                return self.inner.finish(
                    ObjectKind::Asset,
                    Holder::Owner(owner),
                    &handle,
                    asset,
                    callbacks,
                );
            }
        }

        let end = self
            .race(&handle, progress.as_deref(), &token, timeout)
            .await;
        drop(token);
        self.settle(ObjectKind::Asset, Holder::Owner(owner), &handle, end, callbacks)
    }

    /// Instantiates the prefab `key` under `parent` without blocking.
    ///
    /// Only the caller's token is checked: instances are not bound to an owner.
    pub async fn instantiate_async(
        &self,
        key: impl Into<AssetKey>,
        parent: Option<InstanceId>,
        options: LoadOptions,
    ) -> Result<Arc<Instance>, AccessError> {
        let key = key.into();
        let engine = Arc::clone(&self.inner.engine);
        self.run_transient(ObjectKind::Prefab, key, options, move |key| {
            engine.instantiate(key, parent)
        })
        .await
    }

    /// Loads the scene `key` without blocking.
    pub async fn load_scene_async(
        &self,
        key: impl Into<AssetKey>,
        mode: SceneLoadMode,
        activate_on_load: bool,
        options: LoadOptions,
    ) -> Result<Arc<SceneInstance>, AccessError> {
        let key = key.into();
        let engine = Arc::clone(&self.inner.engine);
        self.run_transient(ObjectKind::SceneInstance, key, options, move |key| {
            engine.load_scene(key, mode, activate_on_load)
        })
        .await
    }

    /// Starts and awaits an operation the caller holds alone.
    async fn run_transient<T: Asset>(
        &self,
        kind: ObjectKind,
        key: AssetKey,
        options: LoadOptions,
        start: impl FnOnce(&AssetKey) -> LoadHandle,
    ) -> Result<Arc<T>, AccessError> {
        let LoadOptions {
            progress,
            cancel,
            timeout,
            callbacks,
        } = options;
        let token = cancel.unwrap_or_default();
        if token.is_canceled() {
            let error = AccessError::AlreadyCanceled { key };
            return Err(self.inner.reject(kind, error, callbacks));
        }

        let handle = start(&key);
        let end = self
            .race(&handle, progress.as_deref(), &token, timeout)
            .await;
        self.settle(kind, Holder::Caller, &handle, end, callbacks)
    }

    async fn race(
        &self,
        handle: &LoadHandle,
        progress: Option<&(dyn Fn(f32) + Send + Sync)>,
        cancel: &CancelToken,
        timeout: Option<Duration>,
    ) -> RaceEnd {
        let _timer = ScopedMetricTimer::new(&self.inner.wait_time);
        let deadline = async {
            match timeout {
                Some(after) => tokio::time::sleep(after).await,
                None => future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = deadline => RaceEnd::TimedOut(timeout.unwrap_or_default()),
            _ = cancel.canceled() => RaceEnd::Canceled,
            result = handle.wait(progress) => RaceEnd::Resolved(result),
        }
    }

    /// Maps how a race ended onto the caller's result, cleaning up on failure.
    fn settle<T: Asset>(
        &self,
        kind: ObjectKind,
        holder: Holder<'_>,
        handle: &LoadHandle,
        end: RaceEnd,
        callbacks: Callbacks,
    ) -> Result<Arc<T>, AccessError> {
        let key = handle.key().clone();
        let error = match end {
            RaceEnd::Resolved(Ok(asset)) => {
                return self.inner.finish(kind, holder, handle, asset, callbacks);
            }
            RaceEnd::TimedOut(after) => AccessError::Timeout { key, after },
            // A handle released under us is a cancellation, not a failure.
            RaceEnd::Canceled | RaceEnd::Resolved(Err(EngineError::Released)) => {
                AccessError::Canceled { key }
            }
            RaceEnd::Resolved(Err(source)) => AccessError::OperationFailed { key, source },
        };
        Err(self.inner.abandon(kind, holder, handle, error, callbacks))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use holdfast_core::engine::MemoryEngine;
    use holdfast_core::AccessConfig;
    use holdfast_telemetry::Outcome;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    fn setup() -> (Arc<MemoryEngine>, AssetAccess) {
        let engine = Arc::new(MemoryEngine::new());
        let access = AssetAccess::new(engine.clone(), AccessConfig::silent()).unwrap();
        (engine, access)
    }

    #[tokio::test]
    async fn already_canceled_token_never_touches_the_cache() {
        let (engine, access) = setup();
        engine.insert("a", String::from("A"));
        let owner = Owner::new("hud");
        let canceled = Arc::new(AtomicBool::new(false));
        let flag = canceled.clone();

        let err = access
            .load_asset_async::<String>(
                &owner,
                "a",
                LoadOptions::new()
                    .cancel_token(CancelToken::canceled_token())
                    .on_canceled(move |_| flag.store(true, Ordering::SeqCst)),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AccessError::AlreadyCanceled { .. }));
        assert!(canceled.load(Ordering::SeqCst));
        assert!(!owner.has_handle_table());
        assert_eq!(engine.load_count("a"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_mid_wait_releases_and_evicts() {
        let (engine, access) = setup();
        engine.insert_hanging("slow", String::from("S"));
        let owner = Owner::new("hud");
        let token = CancelToken::new();
        let trigger = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            trigger.cancel();
        });

        let err = access
            .load_asset_async::<String>(&owner, "slow", LoadOptions::new().cancel_token(token))
            .await
            .unwrap_err();

        assert!(matches!(err, AccessError::Canceled { .. }));
        assert!(!owner.holds("slow"));
        assert_eq!(engine.total_refs(), 0);
        assert_eq!(access.reporter().count(Outcome::Canceled), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn resolved_cache_entry_returns_without_waiting() {
        let (engine, access) = setup();
        engine.insert("a", String::from("A"));
        let owner = Owner::new("hud");
        let reports = Arc::new(Mutex::new(Vec::new()));
        let sink = reports.clone();

        access.load_asset::<String>(&owner, "a").unwrap();
        let asset = access
            .load_asset_async::<String>(
                &owner,
                "a",
                LoadOptions::new().progress(move |p| sink.lock().unwrap().push(p)),
            )
            .await
            .unwrap();

        assert_eq!(asset.as_str(), "A");
        assert_eq!(*reports.lock().unwrap(), vec![1.0]);
        assert_eq!(engine.load_count("a"), 1);
    }

    #[tokio::test]
    async fn progress_is_forwarded_while_waiting() {
        let (engine, access) = setup();
        engine.insert_hanging("big.bin", vec![0u8; 4]);
        let owner = Arc::new(Owner::new("hud"));
        let reports = Arc::new(Mutex::new(Vec::new()));
        let sink = reports.clone();

        let task = {
            let access = access.clone();
            let owner = owner.clone();
            tokio::spawn(async move {
                access
                    .load_asset_async::<Vec<u8>>(
                        &owner,
                        "big.bin",
                        LoadOptions::new().progress(move |p| sink.lock().unwrap().push(p)),
                    )
                    .await
            })
        };

        while engine.pending_count("big.bin") == 0 {
            tokio::task::yield_now().await;
        }
        engine.report_progress("big.bin", 0.5);
        tokio::task::yield_now().await;
        engine.complete_pending("big.bin");

        assert!(task.await.unwrap().is_ok());
        let reports = reports.lock().unwrap();
        assert_eq!(reports.first(), Some(&0.0));
        assert_eq!(reports.last(), Some(&1.0));
    }

    #[tokio::test(start_paused = true)]
    async fn transient_timeout_releases_the_operation() {
        let (engine, access) = setup();
        engine.insert_hanging("levels/big.scene", String::from("scene"));

        let err = access
            .load_scene_async(
                "levels/big.scene",
                SceneLoadMode::Additive,
                false,
                LoadOptions::new().timeout_ms(50),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AccessError::Timeout { .. }));
        assert_eq!(engine.total_refs(), 0);
        assert_eq!(engine.pending_count("levels/big.scene"), 0);
    }

    #[tokio::test]
    async fn instantiate_async_resolves_instances() {
        let (engine, access) = setup();
        engine.insert("char/hero.prefab", String::from("prefab"));

        let instance = access
            .instantiate_async("char/hero.prefab", None, LoadOptions::new())
            .await
            .unwrap();
        assert_eq!(instance.key.as_str(), "char/hero.prefab");
        assert_eq!(engine.instances().len(), 1);
    }
}
