//! Core data types for Throttl

pub mod api_config;
pub mod record;
pub mod status;
pub mod timestamp;
pub mod usage_event;
