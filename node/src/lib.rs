//! Synod Node Implementation
//!
//! Service boundary around the consensus engine:
//! - Node runtime owning the coordinator and acceptor set
//! - HTTP API translating outcomes into responses

mod api;
mod node;
mod runtime;

pub use api::*;
pub use node::*;
pub use runtime::*;
