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

//! Defines the error types of the asset engine contract and of the access layer.

use crate::asset::AssetKey;
use std::time::Duration;
use thiserror::Error;

/// A failure reported by the underlying asset engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// No asset is registered under the requested key.
    #[error("no asset is addressable as '{key}'")]
    NotFound {
        /// The key that could not be resolved.
        key: AssetKey,
    },
    /// The asset exists but could not be loaded (missing data, corrupt content).
    #[error("loading '{key}' failed: {reason}")]
    LoadFailed {
        /// The key being loaded.
        key: AssetKey,
        /// Engine-provided description of the failure.
        reason: String,
    },
    /// The operation was released while it was still being awaited.
    #[error("the operation was released before it completed")]
    Released,
    /// The producer of the operation went away without completing it.
    #[error("the operation was abandoned by the engine")]
    Abandoned,
    /// The operation cannot be driven to completion synchronously.
    #[error("'{key}' cannot be completed synchronously")]
    Stalled {
        /// The key being loaded.
        key: AssetKey,
    },
    /// A handle was released more than once.
    #[error("the handle was already released")]
    AlreadyReleased,
    /// The engine refused to release a handle.
    #[error("releasing '{key}' failed")]
    ReleaseFailed {
        /// The key whose release failed.
        key: AssetKey,
    },
    /// The instance is not tracked by the engine.
    #[error("unknown instance {0}")]
    UnknownInstance(u64),
    /// The scene is not loaded.
    #[error("unknown scene {0}")]
    UnknownScene(u64),
}

/// A failure surfaced to a caller of the access layer.
///
/// Every variant except [`AccessError::TypeMismatch`] leaves the requested key
/// absent from the owner's handle table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessError {
    /// The cancellation was signaled before the call began. No handle was created.
    #[error("loading '{key}' was canceled before it started")]
    AlreadyCanceled {
        /// The requested key.
        key: AssetKey,
    },
    /// Cancellation (caller token or owner destruction) was observed mid-wait.
    #[error("loading '{key}' was canceled")]
    Canceled {
        /// The requested key.
        key: AssetKey,
    },
    /// The wait exceeded the caller-specified duration.
    #[error("loading '{key}' timed out after {after:?}")]
    Timeout {
        /// The requested key.
        key: AssetKey,
        /// The timeout that elapsed.
        after: Duration,
    },
    /// The underlying engine reported a failure.
    #[error("loading '{key}' failed")]
    OperationFailed {
        /// The requested key.
        key: AssetKey,
        /// What the engine reported.
        #[source]
        source: EngineError,
    },
    /// The cached asset is not of the requested type.
    #[error("'{key}' is not a {expected}")]
    TypeMismatch {
        /// The requested key.
        key: AssetKey,
        /// The name of the requested type.
        expected: &'static str,
    },
    /// The owner's destruction already fired; it can no longer hold handles.
    #[error("cannot load '{key}': the owner was destroyed")]
    OwnerDestroyed {
        /// The requested key.
        key: AssetKey,
    },
}

impl AccessError {
    /// Returns the key of the request that failed.
    pub fn key(&self) -> &AssetKey {
        match self {
            AccessError::AlreadyCanceled { key }
            | AccessError::Canceled { key }
            | AccessError::Timeout { key, .. }
            | AccessError::OperationFailed { key, .. }
            | AccessError::TypeMismatch { key, .. }
            | AccessError::OwnerDestroyed { key } => key,
        }
    }

    /// Returns `true` for the outcomes that interrupt a wait rather than fail it.
    pub fn is_canceled(&self) -> bool {
        matches!(
            self,
            AccessError::AlreadyCanceled { .. }
                | AccessError::Canceled { .. }
                | AccessError::Timeout { .. }
        )
    }
}
