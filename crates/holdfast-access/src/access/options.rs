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

//! Per-call options: outcome callbacks, progress, cancellation and timeout.

use holdfast_core::{AccessError, CancelToken};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Receives progress updates in `[0, 1]`.
pub type ProgressFn = Arc<dyn Fn(f32) + Send + Sync>;

/// Invoked once with the error a call is about to return.
pub type OutcomeCallback = Box<dyn FnOnce(&AccessError) + Send>;

/// Optional callbacks for the failure outcomes of one call.
///
/// At most one of them runs, right before the call returns its error.
#[derive(Default)]
pub struct Callbacks {
    on_failed: Option<OutcomeCallback>,
    on_timeout: Option<OutcomeCallback>,
    on_canceled: Option<OutcomeCallback>,
}

impl Callbacks {
    /// No callbacks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `callback` when the engine reports a failure or the asset has the
    /// wrong type.
    pub fn on_failed(mut self, callback: impl FnOnce(&AccessError) + Send + 'static) -> Self {
        self.on_failed = Some(Box::new(callback));
        self
    }

    /// Runs `callback` when the wait times out.
    pub fn on_timeout(mut self, callback: impl FnOnce(&AccessError) + Send + 'static) -> Self {
        self.on_timeout = Some(Box::new(callback));
        self
    }

    /// Runs `callback` when the call is canceled, before or during the wait.
    pub fn on_canceled(mut self, callback: impl FnOnce(&AccessError) + Send + 'static) -> Self {
        self.on_canceled = Some(Box::new(callback));
        self
    }

    /// Runs the callback matching `error`, if one was set.
    pub(crate) fn fire(self, error: &AccessError) {
        let callback = match error {
            AccessError::Timeout { .. } => self.on_timeout,
            AccessError::AlreadyCanceled { .. }
            | AccessError::Canceled { .. }
            | AccessError::OwnerDestroyed { .. } => self.on_canceled,
            AccessError::OperationFailed { .. } | AccessError::TypeMismatch { .. } => {
                self.on_failed
            }
        };
        if let Some(callback) = callback {
            callback(error);
        }
    }
}

impl fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callbacks")
            .field("on_failed", &self.on_failed.is_some())
            .field("on_timeout", &self.on_timeout.is_some())
            .field("on_canceled", &self.on_canceled.is_some())
            .finish()
    }
}

/// Options of an asynchronous load.
///
/// ```ignore
/// let options = LoadOptions::new()
///     .timeout(Duration::from_millis(100))
///     .cancel_token(token.clone())
///     .on_timeout(|err| log::warn!("{err}"));
/// ```
#[derive(Default)]
pub struct LoadOptions {
    pub(crate) progress: Option<ProgressFn>,
    pub(crate) cancel: Option<CancelToken>,
    pub(crate) timeout: Option<Duration>,
    pub(crate) callbacks: Callbacks,
}

impl LoadOptions {
    /// No progress, no cancellation, no timeout, no callbacks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reports progress while waiting.
    pub fn progress(mut self, progress: impl Fn(f32) + Send + Sync + 'static) -> Self {
        self.progress = Some(Arc::new(progress));
        self
    }

    /// Reports progress to an already shared callback.
    pub fn progress_shared(mut self, progress: ProgressFn) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Cancels the wait when `token` fires.
    pub fn cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Gives up after `after`. A zero duration means no timeout.
    pub fn timeout(mut self, after: Duration) -> Self {
        self.timeout = (!after.is_zero()).then_some(after);
        self
    }

    /// Gives up after `millis` milliseconds. Zero means no timeout.
    pub fn timeout_ms(self, millis: u64) -> Self {
        self.timeout(Duration::from_millis(millis))
    }

    /// Replaces every callback.
    pub fn callbacks(mut self, callbacks: Callbacks) -> Self {
        self.callbacks = callbacks;
        self
    }

    /// See [`Callbacks::on_failed`].
    pub fn on_failed(mut self, callback: impl FnOnce(&AccessError) + Send + 'static) -> Self {
        self.callbacks = self.callbacks.on_failed(callback);
        self
    }

    /// See [`Callbacks::on_timeout`].
    pub fn on_timeout(mut self, callback: impl FnOnce(&AccessError) + Send + 'static) -> Self {
        self.callbacks = self.callbacks.on_timeout(callback);
        self
    }

    /// See [`Callbacks::on_canceled`].
    pub fn on_canceled(mut self, callback: impl FnOnce(&AccessError) + Send + 'static) -> Self {
        self.callbacks = self.callbacks.on_canceled(callback);
        self
    }

    /// The caller's cancellation token, if any.
    pub fn token(&self) -> Option<&CancelToken> {
        self.cancel.as_ref()
    }

    /// The configured timeout, if any.
    pub fn timeout_duration(&self) -> Option<Duration> {
        self.timeout
    }
}

impl fmt::Debug for LoadOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadOptions")
            .field("progress", &self.progress.is_some())
            .field("cancel", &self.cancel)
            .field("timeout", &self.timeout)
            .field("callbacks", &self.callbacks)
            .finish()
    }
}
