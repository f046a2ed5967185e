//! Cluster Command Module
//!
//! Commands observe and control the fleet. Every command knows the endpoint
//! it targets and how to decode one node's answer; the `FleetController`
//! runs it against one node or fans it out to the whole cluster and folds
//! the answers into a single aggregate.
//!
//! ## Submodules
//! - **`types`**: `Command`, `AggregateResponse` and `Reporter` traits.
//! - **`agents`** / **`control`**: the concrete commands.
//! - **`controller`**: fan-out, aggregation and the monitor loop.
//! - **`peers`**: peer discovery.
//! - **`node`**: node addressing.
//! - **`client`**: HTTP client configuration and request helpers.
//! - **`error`**: command and peer-list errors.

pub mod agents;
pub mod client;
pub mod control;
pub mod controller;
pub mod error;
pub mod node;
pub mod peers;
pub mod types;

#[cfg(test)]
mod tests;
