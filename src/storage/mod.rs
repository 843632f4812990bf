//! Persistence hand-off.
//!
//! [`EdgeSink`] is the boundary to the external graph store; the in-memory
//! backend implements the same upsert contract for embedded use and tests.

mod memory;
mod traits;

pub use memory::InMemoryEdgeSink;
pub use traits::{EdgeSink, SinkError};
