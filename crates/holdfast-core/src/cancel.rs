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

//! Cooperative cancellation signals.
//!
//! A [`CancelToken`] is a one-way latch: once canceled it stays canceled.
//! Tokens can be linked, so that a single observable signal fires when any of
//! several sources (e.g. a caller's token and an owner's lifetime) fires.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError, Weak};
use tokio::sync::watch;

struct Inner {
    state: watch::Sender<bool>,
    children: Mutex<Vec<Weak<Inner>>>,
}

impl Inner {
    fn cancel(&self) {
        if self.state.send_replace(true) {
            return;
        }
        let children = std::mem::take(
            &mut *self
                .children
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );
        for child in children.iter().filter_map(Weak::upgrade) {
            child.cancel();
        }
    }

    fn is_canceled(&self) -> bool {
        *self.state.borrow()
    }
}

/// A cloneable, thread-safe cancellation signal.
///
/// Clones observe and control the same signal.
#[derive(Clone)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

impl CancelToken {
    /// Creates a token that is not canceled.
    pub fn new() -> Self {
        let (state, _) = watch::channel(false);
        Self {
            inner: Arc::new(Inner {
                state,
                children: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Creates a token that is already canceled.
    pub fn canceled_token() -> Self {
        let token = Self::new();
        token.cancel();
        token
    }

    /// Creates a token that fires as soon as any of `sources` fires.
    ///
    /// The returned token can also be canceled on its own without affecting
    /// the sources. Dropping it unlinks it.
    pub fn linked<'a>(sources: impl IntoIterator<Item = &'a CancelToken>) -> Self {
        let token = Self::new();
        for source in sources {
            source.attach(&token);
        }
        token
    }

    /// Creates a token canceled whenever this one is.
    pub fn child_token(&self) -> Self {
        Self::linked([self])
    }

    /// Signals cancellation. Idempotent.
    pub fn cancel(&self) {
        self.inner.cancel();
    }

    /// Returns `true` once the token has been canceled.
    pub fn is_canceled(&self) -> bool {
        self.inner.is_canceled()
    }

    /// Resolves once the token is canceled.
    ///
    /// Resolves immediately if it already is.
    pub async fn canceled(&self) {
        let mut receiver = self.inner.state.subscribe();
        let _ = receiver.wait_for(|canceled| *canceled).await;
    }

    fn attach(&self, child: &CancelToken) {
        {
            let mut children = self
                .inner
                .children
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if !self.is_canceled() {
                children.retain(|weak| weak.strong_count() > 0);
                children.push(Arc::downgrade(&child.inner));
                return;
            }
        }
        child.cancel();
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelToken")
            .field("canceled", &self.is_canceled())
            .finish()
    }
}
