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

//! The owner registry contract.
//!
//! An [`Owner`] is any entity that holds interest in assets. It exposes two
//! capabilities to the access layer:
//! - a lazily created [`HandleTable`] mapping keys to the handles it holds,
//! - a single-shot destruction notification that callbacks can subscribe to.
//!
//! The owner itself never talks to the engine. It only stores handles and
//! fires its callbacks once when torn down.

mod table;

pub use table::*;

use crate::cancel::CancelToken;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A callback run once when its owner is destroyed.
///
/// The owner passes itself; `None` means the notification arrived without a
/// recognizable owner.
pub type DestroyCallback = Box<dyn FnOnce(Option<&Owner>) + Send>;

/// A process-unique identifier for an owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OwnerId(u64);

impl OwnerId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "owner#{}", self.0)
    }
}

/// An entity holding asset handles, released together when it is destroyed.
///
/// The handle table is absent until the first load, and is created together
/// with the destruction subscription that will release it.
pub struct Owner {
    id: OwnerId,
    name: String,
    handles: Mutex<Option<HandleTable>>,
    on_destroy: Mutex<Vec<DestroyCallback>>,
    lifetime: CancelToken,
    destroyed: AtomicBool,
}

impl Owner {
    /// Creates a live owner with a human-readable name used in logs.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: OwnerId::next(),
            name: name.into(),
            handles: Mutex::new(None),
            on_destroy: Mutex::new(Vec::new()),
            lifetime: CancelToken::new(),
            destroyed: AtomicBool::new(false),
        }
    }

    /// Returns the owner's id.
    pub fn id(&self) -> OwnerId {
        self.id
    }

    /// Returns the owner's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// A token canceled when the owner is destroyed.
    pub fn lifetime(&self) -> &CancelToken {
        &self.lifetime
    }

    /// Returns `true` once the destruction notification fired.
    pub fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::Acquire)
    }

    /// Locks the handle table slot.
    ///
    /// `None` means no load ever happened through this owner. Do not hold the
    /// guard across an `.await`.
    pub fn lock_handles(&self) -> MutexGuard<'_, Option<HandleTable>> {
        self.handles.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns `true` if the handle table exists.
    pub fn has_handle_table(&self) -> bool {
        self.lock_handles().is_some()
    }

    /// Number of handles currently held.
    pub fn handle_count(&self) -> usize {
        self.lock_handles().as_ref().map_or(0, HandleTable::len)
    }

    /// Returns `true` if a handle is held for `key`.
    pub fn holds(&self, key: &str) -> bool {
        self.lock_handles()
            .as_ref()
            .is_some_and(|table| table.contains(key))
    }

    /// Subscribes `callback` to the destruction notification.
    ///
    /// Returns `false`, without keeping the callback, if the owner was
    /// already destroyed.
    pub fn subscribe_destroy(&self, callback: DestroyCallback) -> bool {
        let mut callbacks = self
            .on_destroy
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if self.is_destroyed() {
            return false;
        }
        callbacks.push(callback);
        true
    }

    /// Fires the destruction notification.
    ///
    /// Only the first call has an effect: it cancels the lifetime token and
    /// runs every subscribed callback once, in subscription order.
    pub fn destroy(&self) {
        let callbacks = {
            let mut callbacks = self
                .on_destroy
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if self.destroyed.swap(true, Ordering::AcqRel) {
                return;
            }
            std::mem::take(&mut *callbacks)
        };
        log::debug!(
            "Owner '{}' ({}) destroyed, notifying {} subscriber(s)",
            self.name,
            self.id,
            callbacks.len()
        );
        self.lifetime.cancel();
        for callback in callbacks {
            callback(Some(self));
        }
    }
}

impl Drop for Owner {
    fn drop(&mut self) {
        self.destroy();
    }
}

impl fmt::Debug for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Owner")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("handles", &self.handle_count())
            .field("destroyed", &self.is_destroyed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    #[test]
    fn handle_table_is_absent_until_created() {
        let owner = Owner::new("hero");
        assert!(!owner.has_handle_table());
        assert_eq!(owner.handle_count(), 0);

        owner.lock_handles().get_or_insert_with(HandleTable::default);
        assert!(owner.has_handle_table());
    }

    #[test]
    fn destroy_fires_callbacks_once() {
        let owner = Owner::new("hero");
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();
        assert!(owner.subscribe_destroy(Box::new(move |sender: Option<&Owner>| {
            assert!(sender.is_some());
            counter.fetch_add(1, Ordering::SeqCst);
        })));

        owner.destroy();
        owner.destroy();

        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(owner.lifetime().is_canceled());
    }

    #[test]
    fn subscribe_after_destroy_is_rejected() {
        let owner = Owner::new("hero");
        owner.destroy();
        assert!(!owner.subscribe_destroy(Box::new(|_: Option<&Owner>| {})));
    }

    #[test]
    fn dropping_owner_fires_notification() {
        let fired = Arc::new(AtomicUsize::new(0));
        {
            let owner = Owner::new("temp");
            let counter = fired.clone();
            owner.subscribe_destroy(Box::new(move |_: Option<&Owner>| {
                counter.fetch_add(1, Ordering::SeqCst);
            }));
        }
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }
}
