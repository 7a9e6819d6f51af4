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

//! # Holdfast Telemetry
//!
//! Observability for the asset access layer: where load outcomes go once they
//! happen. It provides
//! - a metrics registry over a pluggable storage backend,
//! - the [`OutcomeReporter`](report::OutcomeReporter) that turns every terminal
//!   outcome into a log record at its configured level and a counter bump,
//! - logger initialisation for binaries.

#![warn(missing_docs)]

pub mod logging;
pub mod metrics;
pub mod report;
pub mod storage;
pub mod utils;

pub use metrics::registry::{CounterHandle, GaugeHandle, HistogramHandle, MetricsRegistry};
pub use report::{ObjectKind, Outcome, OutcomeReporter};
pub use storage::{backend::MetricsBackend, memory_backend::InMemoryBackend};
pub use utils::timer::ScopedMetricTimer;
