//! Persistence of the cleaned dataset.
//!
//! ```text
//!   CleanedDataset ──▶ <name>.parquet   (Arrow columns)
//!                 ├──▶ <name>.pkl       (bincode object dump)
//!                 ├──▶ <name>.csv       (optional, UTF-8, no index)
//!                 └──▶ <name>_meta.json (row count + paths)
//! ```

pub mod parquet_io;
pub mod persist;

pub use persist::{load_pickle, save_processed, Metadata, PersistOptions};
pub use parquet_io::load_parquet;
