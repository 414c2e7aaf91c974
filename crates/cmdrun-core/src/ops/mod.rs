pub mod command_ops;
pub mod store;

pub use store::{CommandStore, ListOptions, MemoryStore, StoreResult};
