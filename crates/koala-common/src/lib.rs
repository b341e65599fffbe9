//! Common utilities for the Koala browser.
//!
//! This crate provides shared infrastructure used by all browser components:
//! - **Warning System** - deduplicated notices for unsupported features
//! - **URL helpers** - fragment comparison for history traversal
//! - **Nesting counters** - scoped increment/decrement guards

pub mod nesting;
pub mod url;
pub mod warning;
