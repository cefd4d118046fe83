//! Source propagation: rewrite image-name literals across a codebase.
//!
//! Walks source files, finds every quoted reference to a renamed image
//! (idiom-aware for Objective-C and Swift), generates edits, and optionally
//! applies them.

mod references;

pub use references::{
    CodeReport, Dialect, FileEdit, Reference, ReferenceRewriter, Replacement,
};
