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

//! The Asset Access Engine.
//!
//! Every operation follows the same shape: get or create a handle, wait for
//! it under a policy (blocking or racing cancellation and a timeout), then
//! clean up on every exit path. On success an owner-bound handle stays cached
//! for the next caller. On any failure it is evicted and released, the
//! matching callback runs, and the outcome is reported.

mod awaiting;
mod blocking;
mod cache;
mod options;
mod release;
mod sprites;

pub use options::{Callbacks, LoadOptions, OutcomeCallback, ProgressFn};

use holdfast_core::telemetry::{MetricId, MetricsResult};
use holdfast_core::{
    AccessConfig, AccessError, AnyAsset, Asset, AssetEngine, AssetKey, LoadHandle, Owner,
};
use holdfast_telemetry::report::NAMESPACE;
use holdfast_telemetry::{
    CounterHandle, GaugeHandle, HistogramHandle, MetricsRegistry, ObjectKind, Outcome,
    OutcomeReporter,
};
use std::fmt;
use std::sync::Arc;

/// Bucket bounds, in milliseconds, of the asynchronous wait histogram.
const WAIT_BUCKETS_MS: [f64; 8] = [1.0, 5.0, 10.0, 50.0, 100.0, 500.0, 1_000.0, 5_000.0];

/// Who holds the engine reference of an operation.
#[derive(Clone, Copy)]
enum Holder<'a> {
    /// The owner's handle table; failures evict the entry.
    Owner(&'a Owner),
    /// The call itself; failures release the handle directly.
    Caller,
}

struct Inner {
    engine: Arc<dyn AssetEngine>,
    reporter: OutcomeReporter,
    registry: MetricsRegistry,
    loads_issued: CounterHandle,
    live_handles: GaugeHandle,
    wait_time: HistogramHandle,
}

/// Owner-scoped, deduplicated access to an [`AssetEngine`].
///
/// Cloning is cheap; clones share the engine, configuration and metrics.
#[derive(Clone)]
pub struct AssetAccess {
    inner: Arc<Inner>,
}

impl AssetAccess {
    /// Creates the access layer over `engine`, with a private metrics registry.
    pub fn new(engine: Arc<dyn AssetEngine>, config: AccessConfig) -> MetricsResult<Self> {
        Self::with_registry(engine, config, MetricsRegistry::new())
    }

    /// Creates the access layer, registering its metrics in `registry`.
    pub fn with_registry(
        engine: Arc<dyn AssetEngine>,
        config: AccessConfig,
        registry: MetricsRegistry,
    ) -> MetricsResult<Self> {
        let reporter = OutcomeReporter::new(config, &registry)?;
        let loads_issued = registry.register_counter(
            MetricId::new(NAMESPACE, "loads_issued"),
            "Load calls issued to the asset engine",
        )?;
        let live_handles = registry.register_gauge(
            MetricId::new(NAMESPACE, "live_handles"),
            "Handles currently cached in owner tables",
            "handles",
        )?;
        let wait_time = registry.register_histogram(
            MetricId::new(NAMESPACE, "wait_time"),
            "Time spent awaiting asynchronous loads",
            "ms",
            WAIT_BUCKETS_MS.to_vec(),
        )?;
        Ok(Self {
            inner: Arc::new(Inner {
                engine,
                reporter,
                registry,
                loads_issued,
                live_handles,
                wait_time,
            }),
        })
    }

    /// The underlying engine.
    pub fn engine(&self) -> &Arc<dyn AssetEngine> {
        &self.inner.engine
    }

    /// The outcome reporter, with its per-outcome counts.
    pub fn reporter(&self) -> &OutcomeReporter {
        &self.inner.reporter
    }

    /// The registry holding the `assets` metrics.
    pub fn metrics(&self) -> &MetricsRegistry {
        &self.inner.registry
    }

    /// Starts a load of `key` and hands the raw handle to the caller.
    ///
    /// Nothing is cached: the caller owns the reference and must release it
    /// through [`AssetEngine::release`].
    pub fn load_handle(&self, key: impl Into<AssetKey>) -> LoadHandle {
        self.inner.issue_load(&key.into())
    }
}

impl fmt::Debug for AssetAccess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssetAccess")
            .field("config", self.inner.reporter.config())
            .finish_non_exhaustive()
    }
}

impl Inner {
    fn issue_load(&self, key: &AssetKey) -> LoadHandle {
        if let Err(e) = self.loads_issued.increment() {
            log::warn!("AssetAccess: failed to count load of '{key}': {e}");
        }
        self.engine.load(key)
    }

    fn adjust_live_handles(&self, delta: f64) {
        if let Err(e) = self.live_handles.add(delta) {
            log::warn!("AssetAccess: failed to update live handle gauge: {e}");
        }
    }

    /// Releases a handle nobody else references. Errors are logged only.
    fn release_quietly(&self, handle: &LoadHandle) {
        if let Err(e) = self.engine.release(handle) {
            log::warn!(
                "AssetAccess: releasing '{}' ({}) failed: {e}",
                handle.key(),
                handle.id()
            );
        }
    }

    /// Turns a successfully resolved asset into the requested type.
    ///
    /// On a type mismatch an owner keeps its handle: the asset is valid, only
    /// this caller asked for the wrong type. A handle held by the call itself
    /// has no other user and is released.
    fn finish<T: Asset>(
        &self,
        kind: ObjectKind,
        holder: Holder<'_>,
        handle: &LoadHandle,
        asset: AnyAsset,
        callbacks: Callbacks,
    ) -> Result<Arc<T>, AccessError> {
        let key = handle.key();
        match asset.downcast::<T>() {
            Ok(asset) => {
                self.reporter.report(kind, key, Outcome::Succeeded);
                Ok(asset)
            }
            Err(_) => {
                let error = AccessError::TypeMismatch {
                    key: key.clone(),
                    expected: std::any::type_name::<T>(),
                };
                Err(match holder {
                    Holder::Owner(_) => self.reject(kind, error, callbacks),
                    Holder::Caller => self.abandon(kind, holder, handle, error, callbacks),
                })
            }
        }
    }

    /// Reports `error` and runs its callback, without touching any handle.
    fn reject(&self, kind: ObjectKind, error: AccessError, callbacks: Callbacks) -> AccessError {
        self.reporter.report(kind, error.key(), outcome_of(&error));
        callbacks.fire(&error);
        error
    }

    /// Gives up on `handle`: drops the holder's reference, then reports.
    fn abandon(
        &self,
        kind: ObjectKind,
        holder: Holder<'_>,
        handle: &LoadHandle,
        error: AccessError,
        callbacks: Callbacks,
    ) -> AccessError {
        match holder {
            Holder::Owner(owner) => self.evict(owner, handle),
            Holder::Caller => self.release_quietly(handle),
        }
        self.reject(kind, error, callbacks)
    }
}

fn outcome_of(error: &AccessError) -> Outcome {
    match error {
        AccessError::Timeout { .. } => Outcome::Timeout,
        AccessError::AlreadyCanceled { .. }
        | AccessError::Canceled { .. }
        | AccessError::OwnerDestroyed { .. } => Outcome::Canceled,
        AccessError::OperationFailed { .. } | AccessError::TypeMismatch { .. } => {
            Outcome::Failed
        }
    }
}
