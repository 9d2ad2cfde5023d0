//! Internal modules for the Stockroom terminal client.
//!
//! This library provides command parsing, configuration, logging and the
//! console app used by the stockroom_client binary.

pub mod app;
pub mod commands;
pub mod config;
pub mod logging;
