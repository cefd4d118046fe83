// Public modules
pub mod assets;
pub mod error;
pub mod json_patch;
pub mod mapping;
pub mod naming;
pub mod output;
pub mod pipeline;
pub mod refactor;
pub mod walk;

// Public modules for CLI access
pub mod defaults;
pub mod paths;

// Re-export common types for convenience
pub use error::{Error, ErrorCode, Result};
pub use mapping::{LoadedMapping, MappingStore};
pub use naming::{NameGenerator, NamingMode};
pub use output::{ItemFailure, PhaseSummary, SkippedItem};
