#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Logical identifier for a page within a single page store file.
/// Examples:
/// - `let freelist_page = PageId(0);`
/// - `let leaf_page = PageId(42);`
/// - `let root_page = PageId(1);`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PageId(pub u32);

impl PageId {
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

/// Token identifier an inverted index collection is keyed by.
/// Examples:
/// - `let token: Token = 7;`
/// - `let token: Token = hash_word("quick");`
pub type Token = u64;

/// Canonical error type shared across the index's crates.
#[derive(Error, Debug)]
pub enum IndexError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("composed iterator requires at least one operand")]
    EmptyOperandList,
    #[error("generalized intersection requires at least one non-negated operand")]
    MissingPositiveOperand,
    #[error("row shape does not support this operation: {0}")]
    InvalidRowShape(String),
    #[error("page store: {0}")]
    Codec(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Result alias that carries an `IndexError`.
pub type IndexResult<T> = Result<T, IndexError>;

/// Runtime configuration for an index's on-disk layout and tuning knobs.
///
/// # Example
/// ```
/// use common::Config;
/// use std::path::PathBuf;
///
/// let config = Config::builder()
///     .data_dir(PathBuf::from("./my_index"))
///     .page_size(8192)
///     .rare_threshold(100)
///     .build();
/// ```
#[derive(Clone, Debug, Serialize, Deserialize, bon::Builder)]
pub struct Config {
    /// Directory where the header, rare, and per-token page files live.
    #[builder(default = PathBuf::from("./index_data"))]
    pub data_dir: PathBuf,
    /// Fixed-size page allocation in bytes.
    #[builder(default = 4096)]
    pub page_size: usize,
    /// Token occurrence count at or below which rows share the rare tree.
    #[builder(default = 50)]
    pub rare_threshold: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./index_data"),
            page_size: 4096,
            rare_threshold: 50,
        }
    }
}

/// Convenient re-exports for downstream crates.
pub mod prelude {
    pub use crate::{Config, IndexError, IndexResult, PageId, Token};
}
