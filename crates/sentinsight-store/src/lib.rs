//! Storage layer: the work repository contract and its document stores.

mod error;
mod memory;
mod repository;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use repository::WorkRepository;

#[cfg(feature = "duckdb")]
mod duck;
#[cfg(feature = "duckdb")]
pub use duck::DuckStore;
