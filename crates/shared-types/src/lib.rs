//! # Shared Types Crate
//!
//! This crate contains the ledger wire schema used by every client crate:
//! program specs, the transaction envelope, responses and certificates.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: All wire types are defined here.
//! - **Canonical Bytes**: Messages are `prost` encoded; what an invoker signs is the
//!   exact encoding a validator recomputes, so tags are frozen.
//! - **Opaque Program Semantics**: Arguments are positional byte strings; nothing here
//!   interprets them.

pub mod entities;
pub mod envelope;

pub use entities::*;
pub use envelope::*;
