//! Infrastructure layer - Storage adapters
//!
//! Multiple storage backends for the WeightStore trait

pub mod memory_store;
pub use memory_store::InMemoryWeightStore;

#[cfg(feature = "sqlite")]
pub mod sqlite_store;
#[cfg(feature = "sqlite")]
pub use sqlite_store::SqliteWeightStore;
