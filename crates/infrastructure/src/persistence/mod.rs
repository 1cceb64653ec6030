//! Token persistence implementations.
//!
//! - `FileTokenPersistence`: JSON file on disk, survives restarts
//! - `MemoryTokenPersistence`: in-process only

mod file_tokens;
mod memory_tokens;

pub use file_tokens::FileTokenPersistence;
pub use memory_tokens::MemoryTokenPersistence;
