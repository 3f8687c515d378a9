// Peed - Rolling-baseline anomaly detection
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Per-device sliding windows of recent temperatures.
//!
//! The store is plain owned data with no interior locking: exactly one
//! analysis worker mutates it, and input from other tasks reaches that
//! worker through the ingestion queue.

use crate::baseline::Baseline;
use crate::config::DetectionConfig;
use std::collections::{HashMap, VecDeque};

/// Fixed-capacity FIFO window for one device.
#[derive(Debug, Clone)]
pub struct Window {
    values: VecDeque<f64>,
    capacity: usize,
}

impl Window {
    pub fn new(capacity: usize) -> Self {
        Self {
            values: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a value, evicting the oldest entries beyond capacity.
    pub fn push(&mut self, value: f64) {
        self.values.push_back(value);
        while self.values.len() > self.capacity {
            self.values.pop_front();
        }
    }

    /// Values from oldest to newest.
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Compute the baseline of the current contents.
    pub fn baseline(&self, min_samples: usize, epsilon: f64) -> Option<Baseline> {
        Baseline::from_samples(self.values.iter().copied(), min_samples, epsilon)
    }
}

/// Windowed statistics engine: one window per device.
#[derive(Debug)]
pub struct WindowStore {
    windows: HashMap<String, Window>,
    window_size: usize,
    min_samples: usize,
    epsilon: f64,
}

impl WindowStore {
    pub fn new(config: &DetectionConfig) -> Self {
        Self {
            windows: HashMap::new(),
            window_size: config.window_size,
            min_samples: config.min_samples,
            epsilon: config.stdev_epsilon,
        }
    }

    /// Append a reading to a device's window, creating it on first use.
    pub fn observe(&mut self, device_id: &str, temperature: f64) -> &Window {
        let window_size = self.window_size;
        let window = self
            .windows
            .entry(device_id.to_string())
            .or_insert_with(|| Window::new(window_size));
        window.push(temperature);
        window
    }

    /// Baseline for a device, `None` while it is warming up.
    pub fn baseline(&self, device_id: &str) -> Option<Baseline> {
        self.windows
            .get(device_id)
            .and_then(|w| w.baseline(self.min_samples, self.epsilon))
    }

    pub fn window(&self, device_id: &str) -> Option<&Window> {
        self.windows.get(device_id)
    }

    pub fn device_count(&self) -> usize {
        self.windows.len()
    }

    /// Device identities with a window.
    pub fn device_ids(&self) -> impl Iterator<Item = &String> {
        self.windows.keys()
    }
}
