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

//! Operation handles: the ownership token for one in-flight or completed load.

use crate::asset::{Asset, AssetKey};
use crate::error::EngineError;
use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;

/// A type-erased, shared asset produced by an operation.
pub type AnyAsset = Arc<dyn Any + Send + Sync>;

/// A process-unique identifier for one engine operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OperationId(u64);

impl OperationId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw numeric id.
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "op#{}", self.0)
    }
}

/// The resolution status of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationStatus {
    /// Still running.
    Pending,
    /// Resolved with a result.
    Succeeded,
    /// Resolved with an error.
    Failed,
}

impl OperationStatus {
    /// Returns `true` for `Succeeded` and `Failed`.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, OperationStatus::Pending)
    }
}

/// Snapshot of an operation broadcast to async waiters.
#[derive(Debug, Clone, Copy)]
struct Snapshot {
    status: OperationStatus,
    progress: f32,
    released: bool,
}

#[derive(Default)]
struct Slot {
    result: Option<Result<AnyAsset, EngineError>>,
    released: bool,
}

struct Shared {
    id: OperationId,
    key: AssetKey,
    slot: Mutex<Slot>,
    settled: Condvar,
    snapshot: watch::Sender<Snapshot>,
}

impl Shared {
    fn slot(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn resolve(&self, result: Result<AnyAsset, EngineError>) -> bool {
        let status = if result.is_ok() {
            OperationStatus::Succeeded
        } else {
            OperationStatus::Failed
        };
        {
            let mut slot = self.slot();
            if slot.result.is_some() {
                return false;
            }
            slot.result = Some(result);
        }
        self.settled.notify_all();
        self.snapshot.send_modify(|snapshot| {
            snapshot.status = status;
            if status == OperationStatus::Succeeded {
                snapshot.progress = 1.0;
            }
        });
        true
    }
}

/// A cloneable handle on one engine operation.
///
/// Clones refer to the same operation. The handle itself does not release
/// anything when dropped: releasing is an explicit engine call
/// ([`AssetEngine::release`](super::AssetEngine::release)), made exactly once
/// by whoever holds the reference count.
#[derive(Clone)]
pub struct LoadHandle {
    shared: Arc<Shared>,
}

impl LoadHandle {
    /// Creates a pending operation for `key` along with the completer that
    /// resolves it.
    pub fn pending(key: impl Into<AssetKey>) -> (LoadHandle, OperationCompleter) {
        let (snapshot, _) = watch::channel(Snapshot {
            status: OperationStatus::Pending,
            progress: 0.0,
            released: false,
        });
        let shared = Arc::new(Shared {
            id: OperationId::next(),
            key: key.into(),
            slot: Mutex::new(Slot::default()),
            settled: Condvar::new(),
            snapshot,
        });
        (
            LoadHandle {
                shared: shared.clone(),
            },
            OperationCompleter {
                shared,
                finished: false,
            },
        )
    }

    /// Creates an operation that already succeeded with `asset`.
    pub fn succeeded<A: Asset>(key: impl Into<AssetKey>, asset: A) -> LoadHandle {
        let (handle, completer) = Self::pending(key);
        completer.succeed(asset);
        handle
    }

    /// Creates an operation that already failed with `error`.
    pub fn failed(key: impl Into<AssetKey>, error: EngineError) -> LoadHandle {
        let (handle, completer) = Self::pending(key);
        completer.fail(error);
        handle
    }

    /// Returns the operation's unique id.
    pub fn id(&self) -> OperationId {
        self.shared.id
    }

    /// Returns the key this operation loads.
    pub fn key(&self) -> &AssetKey {
        &self.shared.key
    }

    /// Returns the current status.
    pub fn status(&self) -> OperationStatus {
        self.shared.snapshot.borrow().status
    }

    /// Returns the last reported progress in `[0, 1]`.
    pub fn progress(&self) -> f32 {
        self.shared.snapshot.borrow().progress
    }

    /// Returns `true` once the operation resolved either way.
    pub fn is_done(&self) -> bool {
        self.status().is_terminal()
    }

    /// Returns `true` once the engine released this operation.
    pub fn is_released(&self) -> bool {
        self.shared.slot().released
    }

    /// Returns the result if the operation resolved.
    pub fn result(&self) -> Option<Result<AnyAsset, EngineError>> {
        self.shared.slot().result.clone()
    }

    /// Marks the operation as released and wakes every waiter.
    ///
    /// Called by engines from their release primitive. Returns `false` if the
    /// operation was already released.
    pub fn mark_released(&self) -> bool {
        {
            let mut slot = self.shared.slot();
            if slot.released {
                return false;
            }
            slot.released = true;
        }
        self.shared.settled.notify_all();
        self.shared
            .snapshot
            .send_modify(|snapshot| snapshot.released = true);
        true
    }

    /// Blocks the calling thread until the operation resolves or is released.
    ///
    /// A released operation yields [`EngineError::Released`] even if it had
    /// resolved before the release.
    ///
    /// Must not be called from inside an async task: it parks the thread.
    pub fn wait_blocking(&self) -> Result<AnyAsset, EngineError> {
        let mut slot = self.shared.slot();
        loop {
            if slot.released {
                return Err(EngineError::Released);
            }
            if let Some(result) = &slot.result {
                return result.clone();
            }
            slot = self
                .shared
                .settled
                .wait(slot)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Suspends until the operation resolves or is released.
    ///
    /// `progress` is invoked with each progress update observed while waiting.
    /// A release observed before resolution yields [`EngineError::Released`].
    pub async fn wait(
        &self,
        progress: Option<&(dyn Fn(f32) + Send + Sync)>,
    ) -> Result<AnyAsset, EngineError> {
        let mut receiver = self.shared.snapshot.subscribe();
        loop {
            let snapshot = *receiver.borrow_and_update();
            if let Some(report) = progress {
                report(snapshot.progress);
            }
            if snapshot.released {
                return Err(EngineError::Released);
            }
            if snapshot.status.is_terminal() {
                break;
            }
            if receiver.changed().await.is_err() {
                break;
            }
        }
        self.result().unwrap_or(Err(EngineError::Abandoned))
    }
}

impl fmt::Debug for LoadHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadHandle")
            .field("id", &self.shared.id)
            .field("key", &self.shared.key)
            .field("status", &self.status())
            .finish()
    }
}

/// The producer side of an operation, held by the engine.
///
/// Dropping a completer without resolving it fails the operation with
/// [`EngineError::Abandoned`].
pub struct OperationCompleter {
    shared: Arc<Shared>,
    finished: bool,
}

impl OperationCompleter {
    /// Returns the id of the operation this completer resolves.
    pub fn id(&self) -> OperationId {
        self.shared.id
    }

    /// Returns the key of the operation this completer resolves.
    pub fn key(&self) -> &AssetKey {
        &self.shared.key
    }

    /// Publishes a progress update, clamped to `[0, 1]`.
    pub fn report_progress(&self, progress: f32) {
        let progress = progress.clamp(0.0, 1.0);
        self.shared
            .snapshot
            .send_modify(|snapshot| snapshot.progress = progress);
    }

    /// Resolves the operation successfully.
    pub fn succeed<A: Asset>(self, asset: A) {
        self.succeed_shared(Arc::new(asset));
    }

    /// Resolves the operation with an already shared asset.
    pub fn succeed_shared(mut self, asset: AnyAsset) {
        self.finished = true;
        self.shared.resolve(Ok(asset));
    }

    /// Resolves the operation with an error.
    pub fn fail(mut self, error: EngineError) {
        self.finished = true;
        self.shared.resolve(Err(error));
    }
}

impl Drop for OperationCompleter {
    fn drop(&mut self) {
        if !self.finished {
            self.shared.resolve(Err(EngineError::Abandoned));
        }
    }
}

impl fmt::Debug for OperationCompleter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationCompleter")
            .field("id", &self.shared.id)
            .field("key", &self.shared.key)
            .finish()
    }
}
