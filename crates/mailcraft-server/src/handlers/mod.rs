//! HTTP request handlers organized by domain
//!
//! Each submodule contains handlers for a specific API area.

pub mod analyze;
pub mod catalog;
pub mod email;
pub mod health;

// Re-export all handlers for use in router
pub use analyze::*;
pub use catalog::*;
pub use email::*;
pub use health::*;
