//! Memory budget estimation
//!
//! Before a batch of insertions the projected footprint of the graph is
//! compared against a budget. Per-node size comes from the engine's node
//! formula evaluated at the expected layer count for the index's `M`:
//! nodes are assigned a level from a geometric distribution with
//! normalization factor `mL = 1 / ln(M)`, so a node is expected to appear on
//! `mL + 1` layers counting the base layer. This is a guess, but a
//! reasonably good one, and it avoids asking the engine to measure itself.
//!
//! Exceeding the budget is advisory: a warning is logged and the caller
//! continues.

use super::options::{IndexRelation, HNSW_MIN_M};
use crate::engine::AnnEngine;

use parking_lot::Mutex;
use sysinfo::{Pid, System};
use tracing::{debug, warn};

/// Source of the process's currently attributed memory
pub trait MemoryAccounting {
    /// Allocated bytes, or `None` when the host cannot report it
    fn allocated_bytes(&self) -> Option<u64>;
}

/// Host without allocation accounting; counts as zero
#[derive(Debug, Default, Clone, Copy)]
pub struct Unaccounted;

impl MemoryAccounting for Unaccounted {
    fn allocated_bytes(&self) -> Option<u64> {
        None
    }
}

/// Constant allocation figure
#[derive(Debug, Clone, Copy)]
pub struct FixedAccounting(pub u64);

impl MemoryAccounting for FixedAccounting {
    fn allocated_bytes(&self) -> Option<u64> {
        Some(self.0)
    }
}

/// Resident memory of the current process
pub struct ProcessMemory {
    system: Mutex<System>,
    pid: Option<Pid>,
}

impl ProcessMemory {
    pub fn new() -> Self {
        Self {
            system: Mutex::new(System::new()),
            pid: sysinfo::get_current_pid().ok(),
        }
    }
}

impl Default for ProcessMemory {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryAccounting for ProcessMemory {
    fn allocated_bytes(&self) -> Option<u64> {
        let pid = self.pid?;
        let mut system = self.system.lock();
        if !system.refresh_process(pid) {
            return None;
        }
        system.process(pid).map(|p| p.memory())
    }
}

/// Expected number of layers a new node is linked into, rounded to a whole layer
pub fn mean_layers(m: usize) -> usize {
    let m = m.max(HNSW_MIN_M) as f64;
    let ml = 1.0 / m.ln();
    (ml + 1.0).round() as usize
}

/// Outcome of one budget check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryProjection {
    pub node_bytes: u64,
    /// `node_bytes * n_nodes`
    pub added_bytes: u64,
    pub allocated_bytes: u64,
    pub budget_bytes: u64,
    pub exceeded: bool,
}

impl MemoryProjection {
    pub fn total_bytes(&self) -> u64 {
        self.allocated_bytes.saturating_add(self.added_bytes)
    }
}

/// Per-node byte cost projected for `index` on `engine`.
///
/// Reads fresh engine metadata on every call. A failed metadata read counts
/// as zero since the check must never fail the caller.
pub fn projected_node_bytes(index: &dyn IndexRelation, engine: &dyn AnnEngine) -> u64 {
    let level = mean_layers(index.m());
    match engine.metadata() {
        Ok(meta) => engine.node_bytes(&meta, meta.vector_bytes(), level) as u64,
        Err(e) => {
            debug!("engine metadata unavailable, assuming zero node size: {}", e);
            0
        }
    }
}

/// Warn with `msg` if adding `n_nodes` would push memory use past `limit_kib`.
///
/// Without an index there is nothing to size nodes from, so only the
/// already-allocated memory is compared against the budget.
pub fn check_mem(
    limit_kib: u32,
    index: Option<&dyn IndexRelation>,
    engine: &dyn AnnEngine,
    n_nodes: u64,
    msg: &str,
    accounting: &dyn MemoryAccounting,
) -> MemoryProjection {
    let node_bytes = index
        .map(|index| projected_node_bytes(index, engine))
        .unwrap_or(0);
    let added_bytes = node_bytes.saturating_mul(n_nodes);
    let allocated_bytes = accounting.allocated_bytes().unwrap_or(0);
    let budget_bytes = limit_kib as u64 * 1024;

    let projection = MemoryProjection {
        node_bytes,
        added_bytes,
        allocated_bytes,
        budget_bytes,
        exceeded: allocated_bytes.saturating_add(added_bytes) > budget_bytes,
    };

    debug!(
        node_bytes,
        n_nodes,
        allocated_bytes,
        budget_bytes,
        "projected memory for insertion"
    );

    if projection.exceeded {
        warn!("{}", msg);
    }

    projection
}
