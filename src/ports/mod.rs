//! Traits at the I/O boundaries of the analytics core.

pub mod config_port;
pub mod data_port;
