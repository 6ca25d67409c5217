//! Core memory engine: cleaning, noise policy, storage backends, the
//! [`store::MemoryStore`] itself, and helpers around recall.

pub mod backend;
pub mod clean;
pub mod context;
pub mod error;
pub mod noise;
pub mod stats;
pub mod store;
pub mod types;
pub mod vector;

pub use error::MemoryError;
pub use store::MemoryStore;
pub use types::{Recalled, Role};
