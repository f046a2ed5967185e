//! Work Item Pipeline Module
//!
//! Defines the unit of content that flows between processing stages and the
//! rules for duplicating it and deriving children from it.
//!
//! ## Core Concepts
//! - **Current forms**: a stack of routing labels; the top one picks the next stage.
//! - **Transform history**: append-only audit trail; children start from the
//!   parent's history plus one sprout entry.
//! - **Lineage**: clone and child derivation keep classification, parameters,
//!   hash identity and sibling numbering consistent.
//!
//! ## Submodules
//! - **`item`**: the `WorkItem` type.
//! - **`history`**: transform history entries.
//! - **`content`**: payload factories.
//! - **`hashing`**: hash-identity collaborator and known-file markers.
//! - **`lineage`**: `clone_item` and `derive_children`.
//! - **`form`**: well-known form values.

pub mod content;
pub mod form;
pub mod hashing;
pub mod history;
pub mod item;
pub mod lineage;
