// Decoded sample tick

/// One tick of decoded values, one per axis in manifest order.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// Arrival order within the session, starting at zero.
    pub sequence: u64,
    /// Epoch milliseconds carried by the record, if any.
    pub timestamp_ms: Option<i64>,
    pub values: Vec<f64>,
}

impl Sample {
    pub fn new(values: Vec<f64>) -> Self {
        Self {
            sequence: 0,
            timestamp_ms: None,
            values,
        }
    }

    pub fn with_timestamp(mut self, timestamp_ms: i64) -> Self {
        self.timestamp_ms = Some(timestamp_ms);
        self
    }

    pub fn with_sequence(mut self, sequence: u64) -> Self {
        self.sequence = sequence;
        self
    }

    pub fn arity(&self) -> usize {
        self.values.len()
    }

    /// Record timestamp, or the current wall-clock time when the record had none.
    pub fn time_ms(&self) -> i64 {
        self.timestamp_ms
            .unwrap_or_else(|| chrono::Utc::now().timestamp_millis())
    }
}
