// Domain layer - Axis series, manifests and samples
pub mod axis;
pub mod error;
pub mod sample;
pub mod series;
pub mod series_set;
