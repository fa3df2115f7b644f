//! Domain layer - Replication model and port definitions
//!
//! This module defines the entities the workflows pass around and the traits
//! (ports) that control-plane adapters implement, following hexagonal
//! architecture principles.

pub mod model;
pub mod ports;

pub use model::*;
pub use ports::*;
