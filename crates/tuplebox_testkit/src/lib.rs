//! # Tuplebox Testkit
//!
//! Test utilities for the tuplebox workspace.
//!
//! This crate provides:
//! - Space fixtures with the standard three-index shape
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tuplebox_testkit::prelude::*;
//!
//! #[test]
//! fn test_with_space() {
//!     let fixture = populated_space(16);
//!     // ... test operations against fixture.space
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
}

pub use fixtures::*;
pub use generators::*;
