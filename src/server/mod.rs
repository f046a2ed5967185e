//! Node Control Surface
//!
//! The HTTP endpoints every node serves: agent listing and peer list for
//! the cluster commands, pause/unpause/shutdown control, and work submission.
//!
//! ## Components
//! - **`state`**: `NodeServer`, the node's lifecycle state.
//! - **`handlers`**: axum handlers and the router.
//! - **`protocol`**: endpoint paths, response messages and DTOs.

pub mod handlers;
pub mod protocol;
pub mod state;
