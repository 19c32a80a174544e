//! # Interactive Commands
//!
//! One command per input line:
//!
//! ```text
//! deploy
//! assign <lot> <role>
//! transfer <lot> <role>
//! owner <lot>
//! assets
//! confidentiality on|off
//! whoami
//! help
//! exit
//! ```

use std::fmt::Write as _;
use std::str::FromStr;

use thiserror::Error;

use crate::config::parse_flag;
use crate::runtime::{AppRuntime, Owner, RuntimeError};

pub const HELP: &str = "\
Commands:
  deploy                      deploy the asset management program
  assign <lot> <role>         assign an unowned asset to a role
  transfer <lot> <role>       transfer an owned asset to a role
  owner <lot>                 show the current owner of an asset
  assets                      list the asset catalog
  confidentiality on|off      toggle confidential transactions
  whoami                      show the acting role
  help                        show this help
  exit                        quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Deploy,
    Assign { lot: String, role: String },
    Transfer { lot: String, role: String },
    Owner { lot: String },
    Assets,
    Confidentiality(bool),
    WhoAmI,
    Help,
    Exit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("Empty command")]
    Empty,

    #[error("Unknown command: {0} (try 'help')")]
    Unknown(String),

    #[error("Usage: {0}")]
    Usage(&'static str),
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let words: Vec<&str> = line.split_whitespace().collect();
        let Some((&name, args)) = words.split_first() else {
            return Err(CommandError::Empty);
        };
        let owned = |word: &str| word.to_string();

        match (name.to_ascii_lowercase().as_str(), args) {
            ("deploy", []) => Ok(Self::Deploy),
            ("assign", [lot, role]) => Ok(Self::Assign {
                lot: owned(lot),
                role: owned(role),
            }),
            ("assign", _) => Err(CommandError::Usage("assign <lot> <role>")),
            ("transfer", [lot, role]) => Ok(Self::Transfer {
                lot: owned(lot),
                role: owned(role),
            }),
            ("transfer", _) => Err(CommandError::Usage("transfer <lot> <role>")),
            ("owner", [lot]) => Ok(Self::Owner { lot: owned(lot) }),
            ("owner", _) => Err(CommandError::Usage("owner <lot>")),
            ("assets", []) => Ok(Self::Assets),
            ("confidentiality", [flag]) => parse_flag(flag)
                .map(Self::Confidentiality)
                .ok_or(CommandError::Usage("confidentiality on|off")),
            ("confidentiality", _) => Err(CommandError::Usage("confidentiality on|off")),
            ("whoami", []) => Ok(Self::WhoAmI),
            ("help", _) => Ok(Self::Help),
            ("exit" | "quit", _) => Ok(Self::Exit),
            _ => Err(CommandError::Unknown(name.to_string())),
        }
    }
}

/// Result of one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Output(String),
    Exit,
}

/// Run one command against the runtime.
pub async fn execute(runtime: &AppRuntime, command: Command) -> Result<Outcome, RuntimeError> {
    let output = match command {
        Command::Deploy => {
            let program = runtime.deploy().await?;
            format!("Deployed program {program}")
        }
        Command::Assign { lot, role } => {
            let txid = runtime.assign(&lot, &role).await?;
            format!("Assigned {lot} to {role} (tx {txid})")
        }
        Command::Transfer { lot, role } => {
            let txid = runtime.transfer(&lot, &role).await?;
            format!("Transferred {lot} to {role} (tx {txid})")
        }
        Command::Owner { lot } => match runtime.owner(&lot).await? {
            Owner::Unassigned => format!("{lot} has no owner"),
            Owner::Role(role) => format!("{lot} is owned by {role}"),
            Owner::Unknown(cert) => format!(
                "{lot} is owned by an unknown identity ({})",
                hex::encode(&cert[..cert.len().min(8)])
            ),
        },
        Command::Assets => {
            let catalog = runtime.catalog();
            let mut listing = String::new();
            for lot in catalog.lot_numbers() {
                let _ = writeln!(listing, "{lot}  {}", catalog.name(lot).unwrap_or_default());
            }
            listing.trim_end().to_string()
        }
        Command::Confidentiality(enabled) => {
            runtime.set_confidentiality(enabled)?;
            format!("Confidentiality {}", if enabled { "on" } else { "off" })
        }
        Command::WhoAmI => format!(
            "{} ({})",
            runtime.user().role(),
            runtime.user().identity().username()
        ),
        Command::Help => HELP.to_string(),
        Command::Exit => return Ok(Outcome::Exit),
    };
    Ok(Outcome::Output(output))
}
