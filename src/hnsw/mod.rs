//! HNSW index plumbing around the external engine
//!
//! - **options**: index options and their projection onto engine init options
//! - **memory**: projected memory use against a budget
//! - **label**: row identifier to node label codec

pub mod options;
pub mod memory;
pub mod label;

pub use options::{populate_init_options, log_init_options, HnswOptions, IndexRelation};
pub use memory::{
    check_mem, mean_layers, FixedAccounting, MemoryAccounting, MemoryProjection, ProcessMemory,
    Unaccounted,
};
pub use label::{get_label, label_to_item_pointer};
