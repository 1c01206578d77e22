pub mod config;
pub mod error;
pub mod logging;
pub mod api_client;
pub mod pacing;
pub mod store;
pub mod records;
pub mod payload;
pub mod sample_pool;
pub mod dedup;
pub mod match_fetcher;
pub mod telemetry_reader;
pub mod weapon_meta;
pub mod pipeline;
pub mod jobs;
