//! Tool catalog and outbound HTTP for GenAIL scripts.
//!
//! Provides the egress policy, the metered [`registry::ToolRegistry`] over the
//! record service, content gateway and JSON-RPC endpoint, the text-generation
//! client, and the [`transport::Transport`] seam they all share.

pub mod egress;
pub mod generation;
pub mod ipfs;
pub mod registry;
pub mod request;
pub mod shaping;
pub mod transport;
