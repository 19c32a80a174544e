//! # Asset App Runtime
//!
//! Wiring for the interactive asset-management client.
//!
//! ## Modules
//!
//! - `config/` - Layered TOML, environment and flag configuration
//! - `runtime/` - Registers identities and drives the client service
//! - `commands/` - Line-oriented command parser and executor

pub mod commands;
pub mod config;
pub mod runtime;

pub use commands::{execute, Command, CommandError, Outcome, HELP};
pub use config::{
    AppConfig, AssetsConfig, ChaincodeConfig, ChaincodeMode, ConfigError, IdentityConfig,
    PeerConfig, SecurityConfig,
};
pub use runtime::{AppRuntime, AppService, Owner, RuntimeError};
