//! # Domain Layer
//!
//! Transaction construction logic with no I/O dependencies.
//! This is the inner layer of the hexagonal architecture.

pub mod assets;
pub mod entities;
pub mod errors;
pub mod registry;
pub mod session;
pub mod spec;
