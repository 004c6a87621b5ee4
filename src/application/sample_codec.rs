// Codec trait for manifest and sample lines
use crate::domain::axis::AxisManifest;
use crate::domain::error::IngestError;
use crate::domain::sample::Sample;

pub trait SampleCodec: Send + Sync {
    /// Decode the manifest declaration that opens a recording.
    fn decode_manifest(&self, line: &str) -> Result<AxisManifest, IngestError>;

    /// Decode one data line into a sample with exactly `manifest.len()` values.
    fn decode_sample(&self, line: &str, manifest: &AxisManifest) -> Result<Sample, IngestError>;
}
