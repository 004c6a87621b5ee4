// Ordered collection of axis series built from a manifest
use super::axis::{AxisManifest, AxisRange};
use super::error::IngestError;
use super::sample::Sample;
use super::series::{AxisSeries, SeriesSnapshot};

/// One series per manifest axis, plus a visibility flag for each.
///
/// A set is built whole from a manifest and replaced, never re-shaped, when a
/// different recording is loaded.
#[derive(Debug, Clone)]
pub struct SeriesSet {
    manifest: AxisManifest,
    series: Vec<AxisSeries>,
    visibility: Vec<bool>,
}

/// Everything a renderer needs to draw one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSnapshot {
    pub revision: u64,
    pub y_range: AxisRange,
    pub axes: Vec<SeriesSnapshot>,
}

impl ChartSnapshot {
    pub fn axis(&self, name: &str) -> Option<&SeriesSnapshot> {
        self.axes.iter().find(|a| a.name == name)
    }

    pub fn visible_axes(&self) -> impl Iterator<Item = &SeriesSnapshot> {
        self.axes.iter().filter(|a| a.visible)
    }
}

impl SeriesSet {
    pub fn from_manifest(manifest: AxisManifest, capacity: usize) -> Result<Self, IngestError> {
        if manifest.is_empty() {
            return Err(IngestError::InvalidManifest(
                "manifest declares no axes".to_string(),
            ));
        }
        if capacity == 0 {
            return Err(IngestError::InvalidCapacity(capacity));
        }

        let series = manifest
            .names()
            .iter()
            .map(|name| AxisSeries::new(name.clone(), capacity))
            .collect();
        let visibility = vec![true; manifest.len()];

        Ok(Self {
            manifest,
            series,
            visibility,
        })
    }

    pub fn manifest(&self) -> &AxisManifest {
        &self.manifest
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn series(&self, name: &str) -> Option<&AxisSeries> {
        self.manifest.position(name).map(|idx| &self.series[idx])
    }

    pub fn is_visible(&self, name: &str) -> Option<bool> {
        self.manifest.position(name).map(|idx| self.visibility[idx])
    }

    /// Returns false and changes nothing when the axis is not in the manifest.
    pub fn set_visibility(&mut self, axis_name: &str, visible: bool) -> bool {
        match self.manifest.position(axis_name) {
            Some(idx) => {
                self.visibility[idx] = visible;
                true
            }
            None => {
                tracing::debug!("Ignoring visibility change for unknown axis '{}'", axis_name);
                false
            }
        }
    }

    pub fn reset_all(&mut self) {
        for series in &mut self.series {
            series.clear();
        }
    }

    /// Appends one value to every series, or to none of them.
    pub fn append_sample(&mut self, sample: &Sample) -> Result<(), IngestError> {
        if sample.arity() != self.series.len() {
            return Err(IngestError::ArityMismatch {
                expected: self.series.len(),
                actual: sample.arity(),
            });
        }

        let time_ms = sample.time_ms();
        for (series, value) in self.series.iter_mut().zip(&sample.values) {
            series.append(time_ms, *value);
        }
        Ok(())
    }

    pub fn snapshot(&self) -> Vec<SeriesSnapshot> {
        self.series
            .iter()
            .zip(&self.visibility)
            .map(|(series, visible)| series.snapshot(*visible))
            .collect()
    }
}
