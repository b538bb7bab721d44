//! Safety and compatibility layer around an embedded HNSW engine
//!
//! The graph algorithm lives in an external engine (see [`engine::AnnEngine`]).
//! This crate provides what an index access method needs around it:
//!
//! - projecting index options onto engine init options
//! - estimating memory use before a batch of insertions
//! - encoding row identifiers as node labels
//! - gating index use on binary / schema version agreement
//! - normalizing input arrays to `f32`
//!
//! # Example
//!
//! ```ignore
//! use ldb_hnsw::{Config, HnswAccess, HnswOptions, Session};
//! use ldb_hnsw::engine::MockEngine;
//!
//! let mut session = Session::new(Config::default())?;
//! let options = HnswOptions::parse("m=16, ef_construction=128, ef=64, dim=3")?;
//! let mut index = HnswAccess::open(&mut session, &mut catalog, options, MockEngine::new())?;
//! index.insert(&tid, &ArrayData::Int4(&[1, 2, 3]))?;
//! ```

pub mod error;
pub mod types;
pub mod engine;
pub mod hnsw;
pub mod version;
pub mod vector;
pub mod access;

#[cfg(test)]
mod test_util;

pub use access::{HnswAccess, Session};
pub use error::{LdbError, Result};
pub use hnsw::{HnswOptions, IndexRelation};
pub use types::{Config, ItemPointer, Label};
pub use vector::ArrayData;
pub use version::{SchemaCatalog, VersionGate, VersionState};
