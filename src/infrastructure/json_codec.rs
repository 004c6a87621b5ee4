// JSON line codec for recordings and socket streams
use crate::application::sample_codec::SampleCodec;
use crate::domain::axis::AxisManifest;
use crate::domain::error::IngestError;
use crate::domain::sample::Sample;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct ManifestRecord {
    names: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct AxesRecord {
    axes: Vec<f64>,
    #[serde(default)]
    timestamp: Option<i64>,
}

/// Recordings wrap each tick in `{"value": ...}`; sockets send it bare.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DataRecord {
    Wrapped { value: AxesRecord },
    Bare(AxesRecord),
}

impl DataRecord {
    fn into_axes(self) -> AxesRecord {
        match self {
            DataRecord::Wrapped { value } => value,
            DataRecord::Bare(record) => record,
        }
    }
}

/// Decodes newline-delimited JSON records.
///
/// Manifest: `{"names": ["x", "y", "z"]}`.
/// Sample: `{"value": {"axes": [1.0, 2.0, 3.0], "timestamp": 1645871234000}}`
/// or the bare inner object. `timestamp` is optional.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonLineCodec;

impl JsonLineCodec {
    pub fn new() -> Self {
        Self
    }
}

impl SampleCodec for JsonLineCodec {
    fn decode_manifest(&self, line: &str) -> Result<AxisManifest, IngestError> {
        let record: ManifestRecord = serde_json::from_str(line.trim())
            .map_err(|e| IngestError::MalformedManifest(e.to_string()))?;
        AxisManifest::new(record.names)
    }

    fn decode_sample(&self, line: &str, manifest: &AxisManifest) -> Result<Sample, IngestError> {
        let record = serde_json::from_str::<DataRecord>(line.trim())
            .map_err(|e| IngestError::MalformedSample(e.to_string()))?
            .into_axes();

        if record.axes.len() != manifest.len() {
            return Err(IngestError::MalformedSample(format!(
                "expected {} axis values, got {}",
                manifest.len(),
                record.axes.len()
            )));
        }
        if let Some(idx) = record.axes.iter().position(|v| !v.is_finite()) {
            return Err(IngestError::MalformedSample(format!(
                "non-finite value for axis '{}'",
                manifest.names()[idx]
            )));
        }

        let sample = Sample::new(record.axes);
        Ok(match record.timestamp {
            Some(ts) => sample.with_timestamp(ts),
            None => sample,
        })
    }
}
