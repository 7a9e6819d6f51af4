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

use super::AssetKey;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A globally unique, persistent identifier for an addressable asset.
///
/// The GUID names the "idea" of an asset independently of its path, so a
/// reference keeps working after the asset is moved or renamed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetGuid(Uuid);

impl AssetGuid {
    /// Creates a new, random (version 4) `AssetGuid`.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a deterministic (version 5) `AssetGuid` from an asset path.
    ///
    /// The same path always yields the same GUID.
    pub fn from_path(path: &str) -> Self {
        Self(Uuid::new_v5(&Uuid::NAMESPACE_URL, path.as_bytes()))
    }

    /// Wraps an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for AssetGuid {
    /// Creates a new, random (version 4) `AssetGuid`.
    fn default() -> Self {
        Self::new()
    }
}

/// Renders as 32 lowercase hex digits without hyphens.
impl fmt::Display for AssetGuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

/// A serializable pointer to an addressable asset, resolved by GUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetReference {
    /// The GUID of the referenced asset.
    pub guid: AssetGuid,
}

impl AssetReference {
    /// Creates a reference to the asset with the given GUID.
    pub fn new(guid: AssetGuid) -> Self {
        Self { guid }
    }

    /// Returns the key under which this reference is loaded and cached.
    pub fn key(&self) -> AssetKey {
        AssetKey::from(self.guid.to_string())
    }
}

impl From<AssetReference> for AssetKey {
    fn from(value: AssetReference) -> Self {
        value.key()
    }
}

impl From<&AssetReference> for AssetKey {
    fn from(value: &AssetReference) -> Self {
        value.key()
    }
}
