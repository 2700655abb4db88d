//! CEC Simulation Library
//!
//! This crate provides a scriptable in-memory implementation of the
//! [`cec_adapter::CecEngine`] boundary for testing adapter control
//! without CEC hardware:
//!
//! - **SimEngine**: a configurable engine with an adapter list, a
//!   per-address device table, and recorded transmissions
//! - **Notification injection**: `notify_*` methods drive the installed
//!   sink exactly as a hardware engine's callback threads would, and
//!   return the dispatch result so tests observe handler-failure
//!   propagation
//!
//! # Example
//!
//! ```rust
//! use cec_adapter::CecEngine;
//! use cec_protocol::LogicalAddress;
//! use cec_sim::{SimDeviceConfig, SimEngine};
//!
//! let engine = SimEngine::with_adapter("/dev/fake0");
//! engine.set_device(
//!     LogicalAddress::TV,
//!     SimDeviceConfig {
//!         osd_name: "Living Room TV".to_string(),
//!         ..Default::default()
//!     },
//! );
//!
//! assert!(engine.open("/dev/fake0"));
//! assert_eq!(engine.device_osd_name(LogicalAddress::TV), "Living Room TV");
//! ```

pub mod engine;

pub use engine::{SimDeviceConfig, SimEngine, SimOp};
