//! Engine-facing option and metadata types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Bytes in a node header: label + dimension count + level.
pub const NODE_HEAD_BYTES: usize = 8 + 4 + 4;

/// Bytes of one neighbor slot (a 32-bit node slot id).
const NEIGHBOR_SLOT_BYTES: usize = 4;

/// Distance metric understood by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    /// Squared Euclidean distance
    #[default]
    L2sq,
    /// Cosine distance
    Cos,
    /// Inner product
    Ip,
    /// Hamming distance over bit vectors
    Hamming,
}

impl MetricKind {
    pub fn name(&self) -> &'static str {
        match self {
            MetricKind::L2sq => "l2sq",
            MetricKind::Cos => "cos",
            MetricKind::Ip => "ip",
            MetricKind::Hamming => "hamming",
        }
    }

    /// Resolve a metric from its short name or from an operator class
    /// name such as `dist_cos_ops`.
    pub fn from_name(name: &str) -> Option<Self> {
        let lowered = name.trim().to_ascii_lowercase();
        let short = lowered
            .strip_prefix("dist_")
            .and_then(|s| s.strip_suffix("_ops"))
            .unwrap_or(&lowered);
        match short {
            "l2sq" | "l2" => Some(MetricKind::L2sq),
            "cos" | "cosine" => Some(MetricKind::Cos),
            "ip" => Some(MetricKind::Ip),
            "hamming" => Some(MetricKind::Hamming),
            _ => None,
        }
    }
}

/// Scalar layout the engine stores vector components in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ScalarKind {
    #[default]
    F32,
    F64,
    F16,
    I8,
    B1,
}

impl ScalarKind {
    pub fn name(&self) -> &'static str {
        match self {
            ScalarKind::F32 => "f32",
            ScalarKind::F64 => "f64",
            ScalarKind::F16 => "f16",
            ScalarKind::I8 => "i8",
            ScalarKind::B1 => "b1",
        }
    }

    /// Bytes needed to store a vector of `dimensions` components
    pub fn vector_bytes(&self, dimensions: usize) -> usize {
        match self {
            ScalarKind::F64 => dimensions * 8,
            ScalarKind::F32 => dimensions * 4,
            ScalarKind::F16 => dimensions * 2,
            ScalarKind::I8 => dimensions,
            ScalarKind::B1 => dimensions.div_ceil(8),
        }
    }
}

/// Custom distance callback handed to the engine
pub type MetricFn = fn(&[f32], &[f32]) -> f32;

/// Parameters the engine is constructed with
#[derive(Debug, Clone, Copy)]
pub struct InitOptions {
    pub metric_kind: MetricKind,
    /// `None` selects the engine's built-in implementation of `metric_kind`
    pub metric: Option<MetricFn>,
    pub quantization: ScalarKind,
    pub dimensions: usize,
    pub connectivity: usize,
    pub expansion_add: usize,
    pub expansion_search: usize,
}

impl fmt::Display for InitOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let metric = match self.metric {
            Some(func) => format!("{:p}", func as *const ()),
            None => "unset".to_string(),
        };
        write!(
            f,
            "init options: metric_kind: {}, metric: {}, quantization: {}, dimensions: {}, \
             connectivity: {}, expansion_add: {}, expansion_search: {}",
            self.metric_kind.name(),
            metric,
            self.quantization.name(),
            self.dimensions,
            self.connectivity,
            self.expansion_add,
            self.expansion_search,
        )
    }
}

/// Sizing facts reported by a live engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineMetadata {
    pub dimensions: usize,
    pub scalar_kind: ScalarKind,
    pub connectivity: usize,
    /// Fixed per-node header
    pub node_head_bytes: usize,
    /// Neighbor list size for each upper layer
    pub neighbors_bytes: usize,
    /// Neighbor list size for the base layer (twice the connectivity)
    pub neighbors_base_bytes: usize,
}

impl EngineMetadata {
    /// Metadata an engine reports after being initialized with `options`
    pub fn for_options(options: &InitOptions) -> Self {
        let m = options.connectivity;
        Self {
            dimensions: options.dimensions,
            scalar_kind: options.quantization,
            connectivity: m,
            node_head_bytes: NODE_HEAD_BYTES,
            neighbors_bytes: NEIGHBOR_SLOT_BYTES + NEIGHBOR_SLOT_BYTES * m,
            neighbors_base_bytes: NEIGHBOR_SLOT_BYTES + NEIGHBOR_SLOT_BYTES * m * 2,
        }
    }

    /// Bytes of one vector payload in the engine's scalar layout
    pub fn vector_bytes(&self) -> usize {
        self.scalar_kind.vector_bytes(self.dimensions)
    }
}
