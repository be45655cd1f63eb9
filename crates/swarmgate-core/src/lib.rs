//! Core domain model for the Swarmgate workspace.
//!
//! Interaction requests and responses, approval artifacts, the shared error
//! type, the transport abstraction and the repository traits. No I/O lives
//! here; implementations sit in `swarmgate-infrastructure`.

pub mod artifact;
pub mod config;
pub mod error;
pub mod interaction;
pub mod transport;

// Re-export common error type
pub use error::{Result, SwarmError};
