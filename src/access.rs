//! Access-method glue
//!
//! [`HnswAccess`] wraps one open index: it checks versions on open, projects
//! the index options onto the engine, normalizes every incoming vector,
//! derives node labels from row identifiers and checks the memory budget
//! before inserting.

use crate::engine::{AnnEngine, InitOptions};
use crate::error::{LdbError, Result};
use crate::hnsw::{
    check_mem, get_label, label_to_item_pointer, log_init_options, populate_init_options,
    HnswOptions, MemoryAccounting, MemoryProjection, ProcessMemory,
};
use crate::types::{Config, ItemPointer};
use crate::vector::{to_float4_array_with_dims, ArrayData};
use crate::version::{SchemaCatalog, VersionGate};

use tracing::debug;

pub const BUILD_MEMORY_WARNING: &str =
    "index size exceeded maintenance_work_mem during index construction";
pub const INSERT_MEMORY_WARNING: &str =
    "index size exceeded work_mem during insert, consider increasing work_mem";

/// Per-connection state: configuration plus the cached version check
#[derive(Debug, Clone)]
pub struct Session {
    config: Config,
    gate: VersionGate,
}

impl Session {
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let gate = VersionGate::from_config(&config)?;
        Ok(Self { config, gate })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn gate(&self) -> &VersionGate {
        &self.gate
    }

    pub fn versions_match(&mut self, catalog: &mut dyn SchemaCatalog) -> Result<bool> {
        self.gate.versions_match(catalog)
    }
}

/// One open HNSW index backed by engine `E`
pub struct HnswAccess<E: AnnEngine> {
    config: Config,
    options: HnswOptions,
    init_options: InitOptions,
    engine: E,
    accounting: Box<dyn MemoryAccounting + Send + Sync>,
    compatible: bool,
}

impl<E: AnnEngine> HnswAccess<E> {
    /// Open an index: check versions, then initialize `engine` from `options`.
    ///
    /// A version mismatch has already been warned about by the gate and does
    /// not stop the open; see [`HnswAccess::compatible`].
    pub fn open(
        session: &mut Session,
        catalog: &mut dyn SchemaCatalog,
        options: HnswOptions,
        engine: E,
    ) -> Result<Self> {
        options.validate()?;
        let compatible = session.versions_match(catalog)?;

        let init_options = populate_init_options(&options);
        if session.config.log_init_options {
            log_init_options(&init_options);
        }
        engine.init(&init_options)?;

        Ok(Self {
            config: session.config.clone(),
            options,
            init_options,
            engine,
            accounting: Box::new(ProcessMemory::new()),
            compatible,
        })
    }

    pub fn with_accounting(mut self, accounting: Box<dyn MemoryAccounting + Send + Sync>) -> Self {
        self.accounting = accounting;
        self
    }

    /// Whether the version gate reported a match when the index was opened
    pub fn compatible(&self) -> bool {
        self.compatible
    }

    pub fn init_options(&self) -> &InitOptions {
        &self.init_options
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Fix the index dimension from the first vector it sees.
    ///
    /// Only an empty engine is re-initialized; once any node exists the
    /// dimension is already pinned.
    fn pin_dimensions(&mut self, dimensions: usize) -> Result<()> {
        if self.init_options.dimensions != 0 {
            return Ok(());
        }
        if self.engine.size() != 0 {
            return Err(LdbError::Engine(
                "index holds nodes but has no dimension".to_string(),
            ));
        }
        self.init_options.dimensions = dimensions;
        self.engine.init(&self.init_options)?;
        debug!(dimensions, "inferred index dimensions");
        Ok(())
    }

    fn check_dimensions(&self, vector: &[f32]) -> Result<()> {
        let expected = self.init_options.dimensions;
        if vector.len() != expected {
            return Err(LdbError::DimensionMismatch {
                expected,
                actual: vector.len(),
            });
        }
        Ok(())
    }

    /// Insert a batch of rows, checking the build budget once up front.
    ///
    /// An index declared without a dimension takes it from the first row.
    pub fn build(&mut self, rows: &[(ItemPointer, ArrayData<'_>)]) -> Result<MemoryProjection> {
        // convert everything first so a bad row leaves the engine untouched
        let vectors = rows
            .iter()
            .map(|(tid, arr)| {
                to_float4_array_with_dims(arr, self.init_options.dimensions)
                    .map(|v| (get_label(tid), v))
            })
            .collect::<Result<Vec<_>>>()?;

        if let Some((_, first)) = vectors.first() {
            self.pin_dimensions(first.len())?;
        }
        for (_, vector) in &vectors {
            self.check_dimensions(vector)?;
        }

        let projection = check_mem(
            self.config.maintenance_work_mem_kib,
            Some(&self.options),
            &self.engine,
            vectors.len() as u64,
            BUILD_MEMORY_WARNING,
            self.accounting.as_ref(),
        );

        for (label, vector) in &vectors {
            self.engine.add(*label, vector)?;
        }
        debug!(rows = vectors.len(), size = self.engine.size(), "index built");

        Ok(projection)
    }

    /// Insert a single row
    pub fn insert(&mut self, tid: &ItemPointer, arr: &ArrayData<'_>) -> Result<MemoryProjection> {
        let vector = to_float4_array_with_dims(arr, self.init_options.dimensions)?;
        self.pin_dimensions(vector.len())?;
        self.check_dimensions(&vector)?;

        let projection = check_mem(
            self.config.work_mem_kib,
            Some(&self.options),
            &self.engine,
            1,
            INSERT_MEMORY_WARNING,
            self.accounting.as_ref(),
        );

        self.engine.add(get_label(tid), &vector)?;
        Ok(projection)
    }

    /// Nearest `k` rows to `query`
    pub fn search(&self, query: &ArrayData<'_>, k: usize) -> Result<Vec<(ItemPointer, f32)>> {
        let query = to_float4_array_with_dims(query, self.init_options.dimensions)?;
        let hits = self.engine.search(&query, k)?;
        Ok(hits
            .into_iter()
            .map(|(label, distance)| (label_to_item_pointer(label), distance))
            .collect())
    }
}
