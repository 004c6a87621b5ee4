// Application layer - Sessions, shared state and source traits
pub mod ingestion_session;
pub mod line_source;
pub mod listener;
pub mod sample_codec;
pub mod series_store;
