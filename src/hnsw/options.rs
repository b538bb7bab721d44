//! Index options and their projection onto engine init options

use crate::engine::{InitOptions, MetricKind, ScalarKind};
use crate::error::{LdbError, Result};

use serde::{Deserialize, Serialize};
use tracing::info;

pub const HNSW_DEFAULT_M: usize = 16;
pub const HNSW_MIN_M: usize = 2;
pub const HNSW_MAX_M: usize = 128;

pub const HNSW_DEFAULT_EF_CONSTRUCTION: usize = 128;
pub const HNSW_MAX_EF_CONSTRUCTION: usize = 400;

pub const HNSW_DEFAULT_EF: usize = 64;
pub const HNSW_MAX_EF: usize = 400;

pub const HNSW_MAX_DIM: usize = 2000;

/// Read access to the options of one open index
pub trait IndexRelation {
    fn m(&self) -> usize;
    fn ef_construction(&self) -> usize;
    fn ef(&self) -> usize;
    fn metric_kind(&self) -> MetricKind;
    /// Declared dimension; 0 when it is inferred from the first vector
    fn dimensions(&self) -> usize;
}

/// Persisted options of an HNSW index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HnswOptions {
    /// Max neighbor links per node per layer. Default: 16
    #[serde(default = "default_m")]
    pub m: usize,

    /// Candidate list size while building. Default: 128
    #[serde(default = "default_ef_construction")]
    pub ef_construction: usize,

    /// Candidate list size while searching. Default: 64
    #[serde(default = "default_ef")]
    pub ef: usize,

    #[serde(default)]
    pub dim: usize,

    #[serde(default)]
    pub metric: MetricKind,
}

fn default_m() -> usize { HNSW_DEFAULT_M }
fn default_ef_construction() -> usize { HNSW_DEFAULT_EF_CONSTRUCTION }
fn default_ef() -> usize { HNSW_DEFAULT_EF }

impl Default for HnswOptions {
    fn default() -> Self {
        Self {
            m: HNSW_DEFAULT_M,
            ef_construction: HNSW_DEFAULT_EF_CONSTRUCTION,
            ef: HNSW_DEFAULT_EF,
            dim: 0,
            metric: MetricKind::default(),
        }
    }
}

impl HnswOptions {
    /// Parse a reloptions list such as `m=16, ef_construction=128, ef=64, dim=3`.
    ///
    /// Keys are case-insensitive and missing keys keep their defaults.
    pub fn parse(reloptions: &str) -> Result<Self> {
        let mut options = Self::default();

        for item in reloptions.split(',') {
            let item = item.trim();
            if item.is_empty() {
                continue;
            }
            let (key, value) = item.split_once('=').ok_or_else(|| {
                LdbError::InvalidOption(format!("expected key=value, got {:?}", item))
            })?;
            let key = key.trim().to_ascii_lowercase();
            let value = value.trim();

            match key.as_str() {
                "m" => options.m = parse_usize(&key, value)?,
                "ef_construction" => options.ef_construction = parse_usize(&key, value)?,
                "ef" => options.ef = parse_usize(&key, value)?,
                "dim" => options.dim = parse_usize(&key, value)?,
                "metric" | "opclass" => {
                    options.metric = MetricKind::from_name(value).ok_or_else(|| {
                        LdbError::InvalidOption(format!("unknown metric {:?}", value))
                    })?
                }
                _ => {
                    return Err(LdbError::InvalidOption(format!(
                        "unrecognized parameter {:?}",
                        key
                    )))
                }
            }
        }

        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> Result<()> {
        check_range("m", self.m, HNSW_MIN_M, HNSW_MAX_M)?;
        check_range("ef_construction", self.ef_construction, 1, HNSW_MAX_EF_CONSTRUCTION)?;
        check_range("ef", self.ef, 1, HNSW_MAX_EF)?;
        check_range("dim", self.dim, 0, HNSW_MAX_DIM)?;
        Ok(())
    }
}

fn parse_usize(key: &str, value: &str) -> Result<usize> {
    value.parse().map_err(|_| {
        LdbError::InvalidOption(format!("invalid value for {}: {:?}", key, value))
    })
}

fn check_range(key: &str, value: usize, min: usize, max: usize) -> Result<()> {
    if value < min || value > max {
        return Err(LdbError::InvalidOption(format!(
            "value {} out of bounds for option {}: valid values are between {} and {}",
            value, key, min, max
        )));
    }
    Ok(())
}

impl IndexRelation for HnswOptions {
    fn m(&self) -> usize {
        self.m
    }

    fn ef_construction(&self) -> usize {
        self.ef_construction
    }

    fn ef(&self) -> usize {
        self.ef
    }

    fn metric_kind(&self) -> MetricKind {
        self.metric
    }

    fn dimensions(&self) -> usize {
        self.dim
    }
}

/// Engine init options for an open index.
///
/// Quantization is always `f32` and the metric callback is left unset so the
/// engine uses its built-in implementation of the declared metric.
pub fn populate_init_options(index: &dyn IndexRelation) -> InitOptions {
    InitOptions {
        metric_kind: index.metric_kind(),
        metric: None,
        quantization: ScalarKind::F32,
        dimensions: index.dimensions(),
        connectivity: index.m(),
        expansion_add: index.ef_construction(),
        expansion_search: index.ef(),
    }
}

pub fn log_init_options(options: &InitOptions) {
    info!("{}", options);
}
