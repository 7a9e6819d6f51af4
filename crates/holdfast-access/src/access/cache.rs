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

//! The per-owner handle cache and the destruction cascade.

use super::{AssetAccess, Inner};
use holdfast_core::{AccessError, AssetKey, HandleTable, LoadHandle, Owner};
use std::sync::Arc;

impl AssetAccess {
    /// Returns the handle `owner` holds for `key`, creating it with `loader`
    /// if there is none.
    ///
    /// The first call on an owner creates its handle table and subscribes the
    /// destruction cascade, both under the table lock, so the table is never
    /// observable without the subscription. A cached handle is returned as is,
    /// pending or not: callers wait on it instead of loading again.
    ///
    /// `loader` runs with no lock held and may use the owner freely. If the
    /// key was cached or the owner destroyed while it ran, the fresh handle is
    /// released and the table keeps at most one handle per key.
    pub fn acquire(
        &self,
        owner: &Owner,
        key: &AssetKey,
        loader: impl FnOnce(&AssetKey) -> LoadHandle,
    ) -> Result<LoadHandle, AccessError> {
        {
            let mut slot = owner.lock_handles();
            if owner.is_destroyed() {
                return Err(AccessError::OwnerDestroyed { key: key.clone() });
            }

            if slot.is_none() {
                let inner = Arc::clone(&self.inner);
                let subscribed =
                    owner.subscribe_destroy(Box::new(move |sender: Option<&Owner>| {
                        inner.release_owner(sender)
                    }));
                if !subscribed {
                    return Err(AccessError::OwnerDestroyed { key: key.clone() });
                }
                log::trace!("AssetAccess: created handle table for '{}'", owner.name());
            }
            let table = slot.get_or_insert_with(HandleTable::new);

            if let Some(handle) = table.get(key.as_str()) {
                log::trace!("AssetAccess: '{key}' served from the cache of '{}'", owner.name());
                return Ok(handle.clone());
            }
        }

        let fresh = loader(key);

        let cached = {
            let mut slot = owner.lock_handles();
            match slot.as_mut() {
                Some(table) if !owner.is_destroyed() => match table.get(key.as_str()) {
                    Some(existing) => Some(existing.clone()),
                    None => {
                        table.insert(fresh.clone());
                        self.inner.adjust_live_handles(1.0);
                        return Ok(fresh);
                    }
                },
                _ => None,
            }
        };

        self.inner.release_quietly(&fresh);
        match cached {
            Some(existing) => {
                log::trace!("AssetAccess: '{key}' was cached while loading, keeping the first");
                Ok(existing)
            }
            None => Err(AccessError::OwnerDestroyed { key: key.clone() }),
        }
    }

    /// [`acquire`](Self::acquire) with the engine's plain load as loader.
    pub(crate) fn acquire_asset(
        &self,
        owner: &Owner,
        key: &AssetKey,
    ) -> Result<LoadHandle, AccessError> {
        self.acquire(owner, key, |key| self.inner.issue_load(key))
    }

    /// Releases every handle `owner` holds and empties its table.
    ///
    /// This is what the destruction notification runs. Calling it by hand is
    /// safe: the table is emptied, so the later notification finds nothing to
    /// release. `None` is reported and ignored.
    pub fn release_owner(&self, owner: Option<&Owner>) {
        self.inner.release_owner(owner);
    }
}

impl Inner {
    pub(super) fn release_owner(&self, owner: Option<&Owner>) {
        let Some(owner) = owner else {
            self.reporter.report_null_owner();
            return;
        };

        let handles = owner
            .lock_handles()
            .as_mut()
            .map(HandleTable::drain)
            .unwrap_or_default();
        if handles.is_empty() {
            return;
        }

        log::debug!(
            "AssetAccess: releasing {} handle(s) held by '{}'",
            handles.len(),
            owner.name()
        );
        self.adjust_live_handles(-(handles.len() as f64));
        for handle in &handles {
            self.release_quietly(handle);
        }
    }

    /// Evicts `handle` from `owner`'s table and releases it, but only if the
    /// table still holds this very handle.
    ///
    /// Whoever removes the entry owns the release, so a handle shared by
    /// several waiters is released once no matter how many of them fail.
    pub(super) fn evict(&self, owner: &Owner, handle: &LoadHandle) {
        let evicted = owner
            .lock_handles()
            .as_mut()
            .and_then(|table| table.evict_if(handle.key().as_str(), handle.id()));
        if let Some(handle) = evicted {
            log::trace!("AssetAccess: evicted '{}' from '{}'", handle.key(), owner.name());
            self.adjust_live_handles(-1.0);
            self.release_quietly(&handle);
        }
    }
}
