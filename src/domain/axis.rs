// Axis domain models
use super::error::IngestError;
use std::collections::HashSet;

/// A single point in an axis series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeSeriesPoint {
    pub time_ms: i64,
    pub value: f64,
}

impl TimeSeriesPoint {
    pub fn new(time_ms: i64, value: f64) -> Self {
        Self { time_ms, value }
    }
}

/// Ordered list of axis names declared by a recording or fixed for socket mode.
///
/// Names are non-empty and unique; the order is the order values appear in
/// every sample.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AxisManifest {
    names: Vec<String>,
}

impl AxisManifest {
    pub fn new<I, S>(names: I) -> Result<Self, IngestError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();

        if names.is_empty() {
            return Err(IngestError::InvalidManifest(
                "manifest declares no axes".to_string(),
            ));
        }

        let mut seen = HashSet::with_capacity(names.len());
        for name in &names {
            if name.trim().is_empty() {
                return Err(IngestError::InvalidManifest(
                    "axis names must not be empty".to_string(),
                ));
            }
            if !seen.insert(name.as_str()) {
                return Err(IngestError::InvalidManifest(format!(
                    "duplicate axis name '{}'",
                    name
                )));
            }
        }

        Ok(Self { names })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }
}

/// Display range hint for the value axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisRange {
    pub min: f64,
    pub max: f64,
}

impl AxisRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }
}

impl Default for AxisRange {
    fn default() -> Self {
        Self::new(-15.0, 15.0)
    }
}
