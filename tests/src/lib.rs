//! # Asset-Ledger Test Suite
//!
//! Unified test crate for flows that cross the client crates.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── scenarios.rs   # Deploy, assign, query and concurrent assign flows
//!     ├── properties.rs  # Signature layout, txid uniqueness, immutability
//!     └── runtime.rs     # Config file to interactive commands
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p asset-tests
//!
//! # By category
//! cargo test -p asset-tests integration::scenarios::
//! cargo test -p asset-tests integration::properties::
//! ```

pub mod integration;
