//! Ports layer for the Poll Registry.
//!
//! Defines the hexagonal architecture port traits:
//! - Inbound (Driving) ports: the registry API offered to callers
//! - Outbound (Driven) ports: clock and event sink supplied by the host

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
