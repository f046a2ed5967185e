//! Processing Agents Module
//!
//! The node-local side of the fleet: agents that pull work items off a local
//! queue and run them through processing places.
//!
//! ## Submodules
//! - **`place`**: the `Place` trait and the `DelayPlace` sample stage.
//! - **`registry`**: maps current forms to places.
//! - **`pool`**: the agent worker pool (pause, shutdown, sprouting).
//! - **`types`**: agent status snapshots served to the cluster.

pub mod place;
pub mod pool;
pub mod registry;
pub mod types;
