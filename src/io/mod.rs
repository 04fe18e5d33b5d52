//! Input/output helpers.
//!
//! - panel CSV ingest + validation (`ingest`)
//! - registry JSON (`registry`)
//! - result exports: CSV table (`export`), JSON run file (`snapshot`)

pub mod export;
pub mod ingest;
pub mod registry;
pub mod snapshot;

pub use export::*;
pub use ingest::*;
pub use registry::*;
pub use snapshot::*;
