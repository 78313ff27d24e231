//! # magbridge-protocol
//!
//! Bridge protocol message types and codec.
//!
//! This crate defines the WebSocket frame formats exchanged between a
//! device and its peer.

pub mod codec;
pub mod messages;

pub use codec::*;
pub use messages::*;
