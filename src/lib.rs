//! Bounded-window multi-axis time-series ingestion.
//!
//! Newline-delimited JSON samples arrive from a recording file (paced replay)
//! or a TCP connection and are appended to fixed-capacity per-axis buffers
//! that a renderer reads through snapshots.
pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod presentation;

pub use application::ingestion_session::{IngestionSession, SessionReport, SessionState};
pub use application::series_store::SeriesStore;
pub use domain::axis::{AxisManifest, AxisRange, TimeSeriesPoint};
pub use domain::error::IngestError;
pub use domain::sample::Sample;
pub use domain::series::{AxisSeries, SeriesSnapshot};
pub use domain::series_set::{ChartSnapshot, SeriesSet};
pub use infrastructure::json_codec::JsonLineCodec;
pub use presentation::chart_controller::{ChartController, ControllerSettings, ControllerStatus};
pub use presentation::commands::{ChartCommand, CommandOutcome};
