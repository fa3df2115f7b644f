//! Control Plane Client
//!
//! Provides the HTTP transport, the shared access-token cache and the typed
//! wire payloads of every endpoint the workflows consume.

pub mod http;
pub mod token;
pub mod wire;

pub use http::*;
pub use token::*;
