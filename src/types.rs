use crate::error::{LdbError, Result};
use crate::version::validate_extension_name;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Engine-side node label. Only the low 48 bits are ever populated.
pub type Label = u64;

/// Width in bytes of an on-disk row identifier.
pub const ITEM_POINTER_BYTES: usize = 6;

/// Row identifier of a heap tuple: a block number split into two 16-bit
/// halves plus a line-pointer offset within that block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemPointer {
    pub block_hi: u16,
    pub block_lo: u16,
    pub offset: u16,
}

impl ItemPointer {
    pub fn new(block: u32, offset: u16) -> Self {
        Self {
            block_hi: (block >> 16) as u16,
            block_lo: (block & 0xffff) as u16,
            offset,
        }
    }

    pub fn block(&self) -> u32 {
        ((self.block_hi as u32) << 16) | self.block_lo as u32
    }

    /// The identifier's raw bytes in storage order.
    pub fn to_bytes(&self) -> [u8; ITEM_POINTER_BYTES] {
        let mut bytes = [0u8; ITEM_POINTER_BYTES];
        bytes[0..2].copy_from_slice(&self.block_hi.to_le_bytes());
        bytes[2..4].copy_from_slice(&self.block_lo.to_le_bytes());
        bytes[4..6].copy_from_slice(&self.offset.to_le_bytes());
        bytes
    }

    pub fn from_bytes(bytes: [u8; ITEM_POINTER_BYTES]) -> Self {
        Self {
            block_hi: u16::from_le_bytes([bytes[0], bytes[1]]),
            block_lo: u16::from_le_bytes([bytes[2], bytes[3]]),
            offset: u16::from_le_bytes([bytes[4], bytes[5]]),
        }
    }
}

/// Runtime configuration for the access-method layer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Memory budget applied while building an index, in KiB
    pub maintenance_work_mem_kib: u32,

    /// Memory budget applied to single-tuple inserts, in KiB
    pub work_mem_kib: u32,

    /// Name of the installed extension in the schema catalog
    pub extension_name: String,

    /// Version string the binary was compiled as
    pub binary_version: String,

    /// Log the engine init options every time an index is opened
    pub log_init_options: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            maintenance_work_mem_kib: 65536, // 64MB
            work_mem_kib: 4096,              // 4MB
            extension_name: "lantern".to_string(),
            binary_version: env!("CARGO_PKG_VERSION").to_string(),
            log_init_options: false,
        }
    }
}

impl Config {
    /// Parse and validate a JSON configuration document
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn validate(&self) -> Result<()> {
        validate_extension_name(&self.extension_name)?;
        if self.binary_version.is_empty() {
            return Err(LdbError::InvalidConfig(
                "binary version must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
