// Bounded per-axis time series
use super::axis::TimeSeriesPoint;
use std::collections::VecDeque;

/// Fixed-capacity window of the most recent points for one axis.
///
/// Appending to a full series evicts the oldest point first, so the buffer
/// always holds the latest `capacity` points in arrival order.
#[derive(Debug, Clone)]
pub struct AxisSeries {
    name: String,
    points: VecDeque<TimeSeriesPoint>,
    capacity: usize,
}

/// Read-only copy of a series taken for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesSnapshot {
    pub name: String,
    pub visible: bool,
    pub points: Vec<TimeSeriesPoint>,
}

impl SeriesSnapshot {
    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    pub fn latest(&self) -> Option<&TimeSeriesPoint> {
        self.points.last()
    }
}

impl AxisSeries {
    pub fn new(name: impl Into<String>, capacity: usize) -> Self {
        Self {
            name: name.into(),
            points: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Value is stored as given; NaN and infinities are not filtered here.
    pub fn append(&mut self, time_ms: i64, value: f64) {
        if self.capacity == 0 {
            return;
        }
        if self.points.len() == self.capacity {
            self.points.pop_front();
        }
        self.points.push_back(TimeSeriesPoint::new(time_ms, value));
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    pub fn points(&self) -> impl Iterator<Item = &TimeSeriesPoint> {
        self.points.iter()
    }

    pub fn snapshot(&self, visible: bool) -> SeriesSnapshot {
        SeriesSnapshot {
            name: self.name.clone(),
            visible,
            points: self.points.iter().copied().collect(),
        }
    }
}
