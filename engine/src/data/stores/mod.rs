//! Collaborator stores
//!
//! Named filter metadata and network snapshots come from remote servers over
//! HTTP, from memory (tests, local files) or through a moka cache wrapping
//! either.

mod cached;
mod http;
mod memory;
mod provider;

pub use cached::{CachedFilterStore, CachedNetworkStore};
pub use http::{HttpFilterStore, HttpNetworkStore};
pub use memory::{MemoryFilterStore, MemoryNetworkStore, NetworkDocument};
pub use provider::{FilterStore, NetworkStore};
