//! CLI command implementations
//!
//! - `analyze` - Analyze a local PDF and print the extracted order
//! - `filter` - JSON tree filter and path search
//! - `serve` - Web server command

pub mod analyze;
pub mod filter;
pub mod serve;

// Re-export command functions for main.rs
pub use analyze::*;
pub use filter::*;
pub use serve::*;
