//! Content-Processing Fleet Library
//!
//! This library crate defines the modules shared by the node binary
//! (`fleet-node`, `main.rs`) and the cluster control tool (`fleetctl`).
//!
//! ## Architecture Modules
//! The system is composed of four loosely coupled subsystems:
//!
//! - **`pipeline`**: The unit of work. `WorkItem` carries content, current forms,
//!   transform history and parameters; the lineage functions derive children
//!   from a parent and copy the state they must inherit.
//! - **`agents`**: The node-local processing agents. A fixed pool of workers routes
//!   work items to processing places by their current form, honoring pause and
//!   graceful shutdown.
//! - **`server`**: The node control surface. HTTP endpoints for listing agents and
//!   peers, pausing, unpausing, shutting down and submitting work.
//! - **`command`**: The cluster commands. Issues a command against one node or fans
//!   it out to every peer, aggregates the answers, and repeats on an interval in
//!   monitor mode.

pub mod agents;
pub mod command;
pub mod pipeline;
pub mod server;
