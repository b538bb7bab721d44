use clap::{Parser, Subcommand};
use ldb_hnsw::engine::{EngineMetadata, MockEngine};
use ldb_hnsw::hnsw::{
    check_mem, get_label, label_to_item_pointer, mean_layers, populate_init_options,
    FixedAccounting, HnswOptions, MemoryAccounting, ProcessMemory,
};
use ldb_hnsw::{Config, ItemPointer};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ldb-hnsw")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Diagnostics for the HNSW index safety layer", long_about = None)]
struct Cli {
    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Project memory use of adding nodes to an index
    Estimate {
        /// Index options, e.g. "m=16, ef_construction=128, dim=128"
        #[arg(long, default_value = "")]
        options: String,

        /// Vector dimensions when the options do not declare them
        #[arg(long, default_value_t = 128)]
        dims: usize,

        /// Number of nodes about to be added
        #[arg(long)]
        nodes: u64,

        /// Budget in KiB (defaults to maintenance_work_mem)
        #[arg(long)]
        budget_kib: Option<u32>,

        /// Count this process's resident memory toward the budget
        #[arg(long)]
        process_memory: bool,
    },

    /// Encode a row identifier as a node label and decode it back
    Label {
        block: u32,
        offset: u16,
    },

    /// Parse index options and print the engine init options
    Options {
        options: String,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    match cli.command {
        Commands::Estimate { options, dims, nodes, budget_kib, process_memory } => {
            let mut index = HnswOptions::parse(&options)?;
            if index.dim == 0 {
                index.dim = dims;
            }
            let engine = MockEngine::with_metadata(EngineMetadata::for_options(
                &populate_init_options(&index),
            ));
            let accounting: Box<dyn MemoryAccounting> = if process_memory {
                Box::new(ProcessMemory::new())
            } else {
                Box::new(FixedAccounting(0))
            };
            let budget = budget_kib.unwrap_or(config.maintenance_work_mem_kib);

            let projection = check_mem(
                budget,
                Some(&index),
                &engine,
                nodes,
                "projected index size exceeds the budget",
                accounting.as_ref(),
            );

            println!("Mean layers:     {}", mean_layers(index.m));
            println!("Bytes per node:  {}", projection.node_bytes);
            println!("Added bytes:     {}", projection.added_bytes);
            println!("Allocated bytes: {}", projection.allocated_bytes);
            println!("Budget bytes:    {}", projection.budget_bytes);
            println!("Exceeded:        {}", projection.exceeded);
        }

        Commands::Label { block, offset } => {
            let tid = ItemPointer::new(block, offset);
            let label = get_label(&tid);
            let decoded = label_to_item_pointer(label);
            println!("Label:   {} (0x{:012x})", label, label);
            println!("Decoded: block {}, offset {}", decoded.block(), decoded.offset);
        }

        Commands::Options { options } => {
            let index = HnswOptions::parse(&options)?;
            println!("{}", populate_init_options(&index));
        }
    }

    Ok(())
}
