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

use crate::storage::backend::MetricsBackend;
use holdfast_core::telemetry::{Metric, MetricId, MetricValue, MetricsError, MetricsResult};
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// In-process metrics storage behind a `RwLock<HashMap>`.
///
/// Reads (snapshots, lookups) run concurrently; updates take the write lock
/// for the duration of one metric change.
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    storage: RwLock<HashMap<MetricId, Metric>>,
}

impl InMemoryBackend {
    /// Creates an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> MetricsResult<RwLockReadGuard<'_, HashMap<MetricId, Metric>>> {
        self.storage
            .read()
            .map_err(|_| MetricsError::StorageError("Failed to acquire read lock".to_string()))
    }

    fn write(&self) -> MetricsResult<RwLockWriteGuard<'_, HashMap<MetricId, Metric>>> {
        self.storage
            .write()
            .map_err(|_| MetricsError::StorageError("Failed to acquire write lock".to_string()))
    }

    /// Returns every metric of `namespace`, sorted by id.
    pub fn metrics_in_namespace(&self, namespace: &str) -> Vec<Metric> {
        let Ok(storage) = self.read() else {
            return Vec::new();
        };
        let mut metrics: Vec<_> = storage
            .values()
            .filter(|metric| metric.id.namespace == namespace)
            .cloned()
            .collect();
        metrics.sort_by(|a, b| a.id.cmp(&b.id));
        metrics
    }
}

impl MetricsBackend for InMemoryBackend {
    fn put_metric(&self, metric: Metric) -> MetricsResult<()> {
        self.write()?.insert(metric.id.clone(), metric);
        Ok(())
    }

    fn get_metric(&self, id: &MetricId) -> MetricsResult<Metric> {
        self.read()?
            .get(id)
            .cloned()
            .ok_or_else(|| MetricsError::MetricNotFound(id.clone()))
    }

    fn update_metric(
        &self,
        id: &MetricId,
        update: &mut dyn FnMut(&mut MetricValue) -> MetricsResult<()>,
    ) -> MetricsResult<()> {
        let mut storage = self.write()?;
        let metric = storage
            .get_mut(id)
            .ok_or_else(|| MetricsError::MetricNotFound(id.clone()))?;
        update(&mut metric.value)
    }

    fn contains_metric(&self, id: &MetricId) -> bool {
        self.read().is_ok_and(|storage| storage.contains_key(id))
    }

    fn remove_metric(&self, id: &MetricId) -> MetricsResult<()> {
        self.write()?
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| MetricsError::MetricNotFound(id.clone()))
    }

    fn list_all_metrics(&self) -> Vec<Metric> {
        self.read()
            .map(|storage| storage.values().cloned().collect())
            .unwrap_or_default()
    }

    fn metric_count(&self) -> usize {
        self.read().map_or(0, |storage| storage.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_get_remove() {
        let backend = InMemoryBackend::new();
        let id = MetricId::new("assets", "loads_issued");
        backend
            .put_metric(Metric::counter(id.clone(), "Engine loads"))
            .unwrap();

        assert!(backend.contains_metric(&id));
        assert_eq!(backend.increment_counter(&id, 3).unwrap(), 3);
        assert_eq!(backend.get_metric(&id).unwrap().value.as_counter(), Some(3));

        backend.remove_metric(&id).unwrap();
        assert!(!backend.contains_metric(&id));
        assert_eq!(
            backend.remove_metric(&id),
            Err(MetricsError::MetricNotFound(id))
        );
    }

    #[test]
    fn update_of_missing_metric_fails() {
        let backend = InMemoryBackend::new();
        let id = MetricId::new("assets", "missing");
        assert!(matches!(
            backend.set_gauge(&id, 1.0),
            Err(MetricsError::MetricNotFound(_))
        ));
    }

    #[test]
    fn namespace_listing_is_filtered_and_sorted() {
        let backend = InMemoryBackend::new();
        for name in ["wait_time", "loads_issued"] {
            backend
                .put_metric(Metric::counter(MetricId::new("assets", name), name))
                .unwrap();
        }
        backend
            .put_metric(Metric::counter(MetricId::new("other", "x"), "x"))
            .unwrap();

        let names: Vec<_> = backend
            .metrics_in_namespace("assets")
            .into_iter()
            .map(|metric| metric.id.name)
            .collect();
        assert_eq!(names, vec!["loads_issued", "wait_time"]);
        assert_eq!(backend.metric_count(), 3);
    }
}
