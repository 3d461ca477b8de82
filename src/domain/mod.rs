//! Core domain types and analytics.

pub mod ohlcv;
pub mod series;
pub mod time_series;
pub mod duration;
pub mod rolling;
pub mod stats;
pub mod metrics;
pub mod strategy;
pub mod portfolio;
pub mod universe;
pub mod config;
pub mod config_validation;
pub mod error;
