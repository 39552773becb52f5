pub mod api;
pub mod config;
pub mod cost;
pub mod court;
pub mod db;
pub mod error;
pub mod llms_txt;
pub mod metrics;
pub mod rate_limit;
pub mod rofl;
