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

use crate::asset::AssetKey;
use crate::engine::{LoadHandle, OperationId};
use std::collections::HashMap;

/// Maps each key an owner loaded to the one handle it holds for that key.
///
/// At most one handle per key; the handle table is the owner's sole record
/// of the references it must release.
#[derive(Debug, Default)]
pub struct HandleTable {
    entries: HashMap<AssetKey, LoadHandle>,
}

impl HandleTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the handle held for `key`.
    pub fn get(&self, key: &str) -> Option<&LoadHandle> {
        self.entries.get(key)
    }

    /// Records `handle` for its key.
    ///
    /// Returns the handle previously held for that key, which the caller now
    /// owns and must release.
    pub fn insert(&mut self, handle: LoadHandle) -> Option<LoadHandle> {
        self.entries.insert(handle.key().clone(), handle)
    }

    /// Removes the entry for `key` only if it still holds operation `id`.
    ///
    /// Returns the removed handle. A caller that got `None` does not own the
    /// reference and must not release it.
    pub fn evict_if(&mut self, key: &str, id: OperationId) -> Option<LoadHandle> {
        if self.entries.get(key).map(LoadHandle::id) != Some(id) {
            return None;
        }
        self.entries.remove(key)
    }

    /// Removes and returns every handle, leaving the table empty.
    pub fn drain(&mut self) -> Vec<LoadHandle> {
        self.entries.drain().map(|(_, handle)| handle).collect()
    }

    /// Number of handles held.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no handle is held.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns `true` if a handle is held for `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Iterates over the keys held.
    pub fn keys(&self) -> impl Iterator<Item = &AssetKey> {
        self.entries.keys()
    }
}
