// Infrastructure layer - File, socket and configuration adapters
pub mod config;
pub mod file_source;
pub mod json_codec;
pub mod socket_source;
