//! CEC Adapter Control
//!
//! This crate provides the event dispatch and command-marshaling layer
//! between a low-level CEC engine and application handler code.
//!
//! # Architecture
//!
//! The engine (hardware library or [`cec-sim`](https://docs.rs/cec-sim)
//! simulator) sits behind the [`CecEngine`] trait. On top of it:
//!
//! - [`CallbackRegistry`] holds an ordered, concurrently editable list of
//!   (event mask, handler) subscriptions
//! - [`Dispatcher`] bridges the engine's notification threads into
//!   handler invocations, in registration order, stopping on the first
//!   handler failure
//! - [`Adapter`] owns the open connection and the registry, and exposes
//!   lifecycle, discovery, transmit, and property queries
//! - [`Device`] is a point-in-time snapshot of one logical address with
//!   device-scoped convenience commands
//!
//! Notifications arrive on threads the engine owns. The dispatcher
//! serializes handler invocation, snapshots the registry before running
//! handlers, and contains handler panics, so a misbehaving subscriber can
//! stop one event's delivery but never corrupt the registry or unwind
//! into the engine.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use cec_adapter::{Adapter, AdapterConfig, Handler};
//! use cec_protocol::{models::opcode, CecEvent, EventSet, LogicalAddress};
//! use cec_sim::SimEngine;
//!
//! let engine = Arc::new(SimEngine::with_adapter("/dev/cec0"));
//!
//! // No explicit path: discovery selects /dev/cec0
//! let adapter = Adapter::open(engine, None, AdapterConfig::default()).unwrap();
//!
//! adapter
//!     .add_callback(
//!         EventSet::KEYPRESS,
//!         Handler::from_fn(|event| {
//!             if let CecEvent::KeyPress { keycode, .. } = event {
//!                 println!("key {keycode:#04x}");
//!             }
//!             Ok(())
//!         }),
//!     )
//!     .unwrap();
//!
//! // Put the TV into standby; false means the bus rejected the frame
//! let acked = adapter
//!     .transmit(LogicalAddress::TV, opcode::STANDBY, vec![], None)
//!     .unwrap();
//! assert!(acked);
//! ```

pub mod adapter;
pub mod device;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod registry;

pub use adapter::{list_adapters, Adapter, AdapterConfig, StreamPath};
pub use device::Device;
pub use dispatch::Dispatcher;
pub use engine::{
    AdapterDescriptor, CecEngine, Discovery, EngineConfig, LogicalAddresses, NotificationSink,
};
pub use error::{CecError, DispatchError, HandlerError};
pub use registry::{CallbackRegistry, Handler, HandlerResult};
