//! # NetPaste Testkit
//!
//! Test utilities for NetPaste.
//!
//! This crate provides:
//! - Repository fixtures over in-memory and file backends
//! - Property-based test generators using proptest
//! - Thread-based stress harnesses for the commit protocol
//!
//! ## Usage
//!
//! ```rust
//! use netpaste_testkit::prelude::*;
//!
//! let fixture = TestRepository::memory();
//! let note = fixture.fetch("x");
//! assert_eq!(note.read_count, 1);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod stress;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::stress::*;
}

pub use fixtures::*;
pub use generators::*;
pub use stress::*;
