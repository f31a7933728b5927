//! Integration test crate for the SpatialInk claim core.
//!
//! This crate has no library code — it only contains integration tests
//! that exercise end-to-end save flows across multiple workspace crates.
//!
//! Run all integration tests:
//! ```sh
//! cargo test -p spatialink-integration-tests
//! ```
