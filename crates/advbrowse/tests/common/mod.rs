//! Test infrastructure for the search engine.
//!
//! Fixtures build an in-memory SQLite store with known sort values and
//! group layouts.

#![allow(dead_code)]

pub mod fixtures;

pub use fixtures::*;
