// Metric samples and the bounded history series behind the sparklines

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Number of points kept per history series unless configured otherwise.
pub const DEFAULT_HISTORY_CAPACITY: usize = 20;

/// One scalar sample labelled with a wall-clock time (`HH:MM:SS`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricPoint {
    pub time: String,
    pub value: f64,
}

impl MetricPoint {
    pub fn new(time: impl Into<String>, value: f64) -> Self {
        Self {
            time: time.into(),
            value,
        }
    }
}

/// CPU and RAM sample series, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricHistory {
    pub cpu: VecDeque<MetricPoint>,
    pub ram: VecDeque<MetricPoint>,
}

impl MetricHistory {
    pub fn push_cpu(&mut self, point: MetricPoint, capacity: usize) {
        push_bounded(&mut self.cpu, point, capacity);
    }

    pub fn push_ram(&mut self, point: MetricPoint, capacity: usize) {
        push_bounded(&mut self.ram, point, capacity);
    }
}

/// Appends `point`, then evicts from the front until `series.len() <= capacity`.
pub fn push_bounded(series: &mut VecDeque<MetricPoint>, point: MetricPoint, capacity: usize) {
    series.push_back(point);
    while series.len() > capacity {
        series.pop_front();
    }
}
