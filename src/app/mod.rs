//! Application core: pure domain logic, zero I/O.
//!
//! This module contains the business rules of the boiler node: the control
//! cycle, operator requests, telemetry and status.  All interaction with
//! the boiler, storage and network happens through **port traits** defined
//! in [`ports`], keeping this layer fully testable without real peripherals.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
pub mod state;
