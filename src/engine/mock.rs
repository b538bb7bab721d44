//! In-process stand-in for the HNSW engine
//!
//! Records what it is asked to do and reports metadata, without building a
//! graph or computing distances. Searches return stored labels in insertion
//! order with a distance of zero.

use super::types::{EngineMetadata, InitOptions};
use super::AnnEngine;
use crate::error::{LdbError, Result};
use crate::types::Label;

use parking_lot::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Default)]
struct MockState {
    options: Option<InitOptions>,
    nodes: Vec<(Label, Vec<f32>)>,
}

/// Recording engine for tests and offline tooling
#[derive(Default)]
pub struct MockEngine {
    state: RwLock<MockState>,
    /// Overrides the metadata derived from the init options
    metadata_override: Option<EngineMetadata>,
    init_calls: AtomicUsize,
    metadata_calls: AtomicUsize,
}

impl MockEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine that always reports `meta`, initialized or not
    pub fn with_metadata(meta: EngineMetadata) -> Self {
        Self {
            metadata_override: Some(meta),
            ..Default::default()
        }
    }

    /// Options from the most recent `init` call
    pub fn options(&self) -> Option<InitOptions> {
        self.state.read().options
    }

    pub fn init_calls(&self) -> usize {
        self.init_calls.load(Ordering::SeqCst)
    }

    pub fn metadata_calls(&self) -> usize {
        self.metadata_calls.load(Ordering::SeqCst)
    }

    /// Stored vector for `label`, if it was added
    pub fn get(&self, label: Label) -> Option<Vec<f32>> {
        self.state
            .read()
            .nodes
            .iter()
            .find(|(l, _)| *l == label)
            .map(|(_, v)| v.clone())
    }
}

impl AnnEngine for MockEngine {
    fn init(&self, options: &InitOptions) -> Result<()> {
        self.init_calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.write();
        state.options = Some(*options);
        state.nodes.clear();
        Ok(())
    }

    fn metadata(&self) -> Result<EngineMetadata> {
        self.metadata_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(meta) = self.metadata_override {
            return Ok(meta);
        }
        self.state
            .read()
            .options
            .as_ref()
            .map(EngineMetadata::for_options)
            .ok_or_else(|| LdbError::Engine("engine is not initialized".to_string()))
    }

    fn add(&self, label: Label, vector: &[f32]) -> Result<()> {
        let mut state = self.state.write();
        let dimensions = match state.options {
            Some(options) => options.dimensions,
            None => return Err(LdbError::Engine("engine is not initialized".to_string())),
        };
        if dimensions != 0 && vector.len() != dimensions {
            return Err(LdbError::DimensionMismatch {
                expected: dimensions,
                actual: vector.len(),
            });
        }
        if state.nodes.iter().any(|(l, _)| *l == label) {
            return Err(LdbError::Engine(format!("duplicate label {}", label)));
        }
        state.nodes.push((label, vector.to_vec()));
        Ok(())
    }

    fn search(&self, _query: &[f32], k: usize) -> Result<Vec<(Label, f32)>> {
        let state = self.state.read();
        Ok(state.nodes.iter().take(k).map(|(l, _)| (*l, 0.0)).collect())
    }

    fn size(&self) -> usize {
        self.state.read().nodes.len()
    }
}
