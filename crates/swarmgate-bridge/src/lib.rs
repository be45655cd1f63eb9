//! UI-side approval surface.
//!
//! The bridge is the counterpart of the coordinator on the other side of
//! the process boundary: it receives interaction requests, materializes
//! them as durable approval artifacts, surfaces them to the host UI, and
//! submits the user's decisions back.

pub mod bridge;
pub mod decision;

pub use bridge::{ApprovalBridge, InteractionNotifier, InteractionPhase};
pub use decision::Decision;
