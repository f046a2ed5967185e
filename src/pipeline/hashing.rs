//! Content hashing and known-file markers.
//!
//! Hash results are attached to a work item as `HASH_<ALGORITHM>` parameters.
//! A known-content hit on an item is recorded under [`KFF_HIT_KEY`]; when a
//! child is derived, that marker is demoted to [`KFF_PARENT_HIT_KEY`] so the
//! child is not mistaken for the parent's hit.

use super::content::read_all;
use super::item::WorkItem;

use sha2::{Digest, Sha256, Sha512};
use std::io;

pub const HASH_PARAM_PREFIX: &str = "HASH_";
pub const KFF_HIT_KEY: &str = "KFF_HIT";
pub const KFF_PARENT_HIT_KEY: &str = "KFF_PARENT_HIT";

#[derive(Debug, thiserror::Error)]
pub enum HashError {
    #[error("unsupported digest algorithm: {0}")]
    Algorithm(String),

    #[error("failed to read content: {0}")]
    Io(#[from] io::Error),
}

/// Computes hash-identity parameters for a work item's content.
pub trait ContentHasher: Send + Sync {
    /// Returns `(parameter name, value)` pairs. An item without content
    /// yields no parameters.
    fn hash(&self, item: &WorkItem) -> Result<Vec<(String, String)>, HashError>;
}

/// SHA-2 family digests, hex encoded.
#[derive(Debug, Clone)]
pub struct Sha2Hasher {
    algorithms: Vec<String>,
}

impl Default for Sha2Hasher {
    fn default() -> Self {
        Self {
            algorithms: vec!["SHA-256".to_string(), "SHA-512".to_string()],
        }
    }
}

impl Sha2Hasher {
    pub fn with_algorithms(algorithms: Vec<String>) -> Self {
        Self { algorithms }
    }

    fn digest(algorithm: &str, data: &[u8]) -> Result<String, HashError> {
        match algorithm {
            "SHA-256" => Ok(format!("{:x}", Sha256::digest(data))),
            "SHA-512" => Ok(format!("{:x}", Sha512::digest(data))),
            other => Err(HashError::Algorithm(other.to_string())),
        }
    }
}

impl ContentHasher for Sha2Hasher {
    fn hash(&self, item: &WorkItem) -> Result<Vec<(String, String)>, HashError> {
        let Some(factory) = item.content() else {
            return Ok(Vec::new());
        };
        let data = read_all(factory.as_ref())?;

        self.algorithms
            .iter()
            .map(|algorithm| {
                Self::digest(algorithm, &data)
                    .map(|value| (format!("{}{}", HASH_PARAM_PREFIX, algorithm), value))
            })
            .collect()
    }
}

/// Clears inherited hash identity from a freshly derived child.
///
/// A `KFF_HIT` marker moves to `KFF_PARENT_HIT`; inherited `HASH_*`
/// parameters are dropped so they cannot be confused with the child's own.
pub fn parent_to_child(child: &mut WorkItem) {
    if let Some(hits) = child.delete_parameter(KFF_HIT_KEY) {
        child.set_parameter(KFF_PARENT_HIT_KEY, hits);
    }

    let inherited: Vec<String> = child
        .parameters()
        .keys()
        .filter(|key| key.starts_with(HASH_PARAM_PREFIX))
        .cloned()
        .collect();
    for key in inherited {
        child.delete_parameter(&key);
    }
}
