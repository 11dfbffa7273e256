pub mod loader;

pub use loader::{IrChunk, read_chunk};
