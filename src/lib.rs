//! Boiler node firmware library.
//!
//! Exposes the control core and adapters for integration testing and the
//! ESP-IDF binary.  All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod control;
pub mod error;
pub mod node;
pub mod pins;
pub mod scheduler;
pub mod supervisor;
pub mod update;

pub mod adapters;
