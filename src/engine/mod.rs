//! Interface to the external HNSW engine
//!
//! The graph itself (insertion, search, deletion) lives in an engine this crate
//! treats as opaque. Everything here talks to it through [`AnnEngine`], which
//! lets the safety layer run against [`MockEngine`] in tests and tools.

pub mod types;
pub mod mock;

pub use types::*;
pub use mock::MockEngine;

use crate::error::Result;
use crate::types::Label;

/// Handle to a live HNSW engine instance
pub trait AnnEngine: Send + Sync {
    /// (Re)construct the engine with the given parameters
    fn init(&self, options: &InitOptions) -> Result<()>;

    /// Current sizing facts. Must be safe to call mid-construction.
    fn metadata(&self) -> Result<EngineMetadata>;

    /// Total bytes one node occupies when it lives on `level` upper layers
    fn node_bytes(&self, meta: &EngineMetadata, vector_bytes: usize, level: usize) -> usize {
        meta.node_head_bytes
            + meta.neighbors_base_bytes
            + meta.neighbors_bytes * level
            + vector_bytes
    }

    /// Add one vector under `label`
    fn add(&self, label: Label, vector: &[f32]) -> Result<()>;

    /// Up to `k` nearest labels with their distances
    fn search(&self, query: &[f32], k: usize) -> Result<Vec<(Label, f32)>>;

    /// Number of nodes in the graph
    fn size(&self) -> usize;
}
