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

//! Reporting of terminal load outcomes.
//!
//! Every load ends in exactly one [`Outcome`]. The reporter logs it at the
//! level the [`AccessConfig`] assigns to that outcome and bumps the matching
//! `assets:outcomes[outcome=...]` counter. Counting happens even when the
//! configured level suppresses the log record.

use crate::metrics::registry::{CounterHandle, MetricsRegistry};
use holdfast_core::config::AccessConfig;
use holdfast_core::telemetry::{MetricId, MetricsResult};
use holdfast_core::{AssetKey, LogLevel};
use std::fmt;

/// Namespace of every metric registered by the access layer.
pub const NAMESPACE: &str = "assets";

/// What kind of object an outcome is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    /// A plain asset (texture, sprite, data file, ...).
    Asset,
    /// An instantiated prefab.
    Prefab,
    /// A loaded scene.
    SceneInstance,
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ObjectKind::Asset => "Asset",
            ObjectKind::Prefab => "Prefab",
            ObjectKind::SceneInstance => "SceneInstance",
        })
    }
}

/// The terminal outcome of one load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// The load resolved with an asset.
    Succeeded,
    /// Cancellation was observed, before or during the wait.
    Canceled,
    /// The wait exceeded its timeout.
    Timeout,
    /// The engine reported a failure.
    Failed,
}

impl Outcome {
    /// Every outcome, in reporting order.
    pub const ALL: [Outcome; 4] = [
        Outcome::Succeeded,
        Outcome::Canceled,
        Outcome::Timeout,
        Outcome::Failed,
    ];

    /// The metric label of this outcome.
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Succeeded => "succeeded",
            Outcome::Canceled => "canceled",
            Outcome::Timeout => "timeout",
            Outcome::Failed => "failed",
        }
    }

    fn level(self, config: &AccessConfig) -> LogLevel {
        match self {
            Outcome::Succeeded => config.succeeded,
            Outcome::Canceled => config.canceled,
            Outcome::Timeout => config.timeout,
            Outcome::Failed => config.failed,
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Logs and counts terminal outcomes according to an [`AccessConfig`].
#[derive(Debug)]
pub struct OutcomeReporter {
    config: AccessConfig,
    counters: [CounterHandle; 4],
    null_owner: CounterHandle,
}

impl OutcomeReporter {
    /// Creates a reporter and registers its counters in `registry`.
    pub fn new(config: AccessConfig, registry: &MetricsRegistry) -> MetricsResult<Self> {
        let register = |label: &str| {
            registry.register_counter(
                MetricId::new(NAMESPACE, "outcomes").with_label("outcome", label),
                format!("Loads that ended as {label}"),
            )
        };
        let [succeeded, canceled, timeout, failed] = Outcome::ALL.map(|o| register(o.as_str()));
        Ok(Self {
            counters: [succeeded?, canceled?, timeout?, failed?],
            null_owner: register("null_owner")?,
            config,
        })
    }

    /// The configuration in use.
    pub fn config(&self) -> &AccessConfig {
        &self.config
    }

    /// Reports that a load of `key` ended with `outcome`.
    pub fn report(&self, kind: ObjectKind, key: &AssetKey, outcome: Outcome) {
        if let Some(level) = outcome.level(&self.config).as_level() {
            log::log!(level, "{kind} in [{key}] loaded {outcome}");
        }
        self.bump(&self.counters[outcome.index()]);
    }

    /// Reports a destruction cascade that fired without an owner.
    pub fn report_null_owner(&self) {
        if let Some(level) = self.config.null_owner.as_level() {
            log::log!(level, "Destruction notification fired without an owner");
        }
        self.bump(&self.null_owner);
    }

    /// How many loads ended with `outcome` so far.
    pub fn count(&self, outcome: Outcome) -> u64 {
        self.counters[outcome.index()].get().unwrap_or(0)
    }

    /// How many cascades fired without an owner so far.
    pub fn null_owner_count(&self) -> u64 {
        self.null_owner.get().unwrap_or(0)
    }

    fn bump(&self, counter: &CounterHandle) {
        if let Err(e) = counter.increment() {
            log::warn!("OutcomeReporter: failed to count {}: {e}", counter.id());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcomes_are_counted_even_when_silent() {
        let registry = MetricsRegistry::new();
        let reporter = OutcomeReporter::new(AccessConfig::silent(), &registry).unwrap();
        let key = AssetKey::from("char/hero.prefab");

        reporter.report(ObjectKind::Prefab, &key, Outcome::Succeeded);
        reporter.report(ObjectKind::Prefab, &key, Outcome::Timeout);
        reporter.report(ObjectKind::Asset, &key, Outcome::Timeout);
        reporter.report_null_owner();

        assert_eq!(reporter.count(Outcome::Succeeded), 1);
        assert_eq!(reporter.count(Outcome::Timeout), 2);
        assert_eq!(reporter.count(Outcome::Failed), 0);
        assert_eq!(reporter.null_owner_count(), 1);
    }

    #[test]
    fn counters_live_under_the_assets_namespace() {
        let registry = MetricsRegistry::new();
        OutcomeReporter::new(AccessConfig::default(), &registry).unwrap();

        let labels: Vec<_> = registry
            .namespace_metrics(NAMESPACE)
            .into_iter()
            .filter_map(|metric| metric.id.label("outcome").map(str::to_string))
            .collect();
        assert_eq!(
            labels,
            vec!["canceled", "failed", "null_owner", "succeeded", "timeout"]
        );
    }

    #[test]
    fn kinds_display_like_object_types() {
        assert_eq!(ObjectKind::SceneInstance.to_string(), "SceneInstance");
        assert_eq!(Outcome::Canceled.to_string(), "canceled");
    }
}
