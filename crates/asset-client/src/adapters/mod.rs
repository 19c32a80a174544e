//! # Adapters Module
//!
//! In-process implementations of the outbound ports.

pub mod membership;
pub mod packaging;
pub mod transport;
