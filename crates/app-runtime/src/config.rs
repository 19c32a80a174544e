//! # Application Configuration
//!
//! Loaded in three layers, later layers winning:
//!
//! 1. TOML file (every section optional, see [`AppConfig::default`])
//! 2. Environment: `ASSET_PEER_ADDRESS`, `ASSET_CHAINCODE_MODE`,
//!    `ASSET_CONFIDENTIALITY`, `ASSET_USER`
//! 3. Command line flags
//!
//! ## Identities
//!
//! `[[identities]]` are the credentials this client presents when it
//! registers. `[[membership.users]]` is the user table of the local
//! membership service. A client secret that does not match the table fails
//! registration at startup.
//!
//! ## Security Requirements
//!
//! - `security.chain_key` must be 32 bytes of hex when set
//! - Starting in confidential mode requires a chain key

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use asset_client::{DeployMode, DeploymentTarget};
use serde::{Deserialize, Serialize};
use shared_crypto::SecretKey;
use shared_types::ChaincodeType;
use thiserror::Error;

/// Configuration errors. All are fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read config file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file")]
    Parse(#[from] toml::de::Error),

    #[error("No identities configured")]
    NoIdentities,

    #[error("User '{0}' is not among the configured identities")]
    UnknownUser(String),

    #[error("Development mode requires chaincode.name")]
    MissingProgramName,

    #[error("Unknown chaincode platform: {0}")]
    UnknownPlatform(String),

    #[error("security.chain_key must be 32 bytes of hex: {0}")]
    InvalidChainKey(String),

    #[error("Confidential mode requires security.chain_key")]
    MissingChainKey,

    #[error("Invalid value for {var}: {value:?}")]
    InvalidEnv { var: &'static str, value: String },
}

/// Complete application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub peer: PeerConfig,
    pub chaincode: ChaincodeConfig,
    pub security: SecurityConfig,
    pub assets: AssetsConfig,
    pub membership: MembershipConfig,
    pub identities: Vec<IdentityConfig>,
    /// Role this process acts as.
    pub user: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            peer: PeerConfig::default(),
            chaincode: ChaincodeConfig::default(),
            security: SecurityConfig::default(),
            assets: AssetsConfig::default(),
            membership: MembershipConfig::default(),
            identities: vec![
                IdentityConfig::new("charlie", "diego", "DRJ23pEQl16a"),
                IdentityConfig::new("dave", "binhn", "7avZQLwcUe9q"),
                IdentityConfig::new("edwina", "test_user0", "MS9qrN8hFjlE"),
            ],
            user: "charlie".to_string(),
        }
    }
}

/// Validating peer connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeerConfig {
    pub address: String,
    pub request_timeout_secs: u64,
}

impl Default for PeerConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:7051".to_string(),
            request_timeout_secs: 30,
        }
    }
}

impl PeerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// `net` packages and deploys; `dev` assumes the program is already running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChaincodeMode {
    #[default]
    Net,
    Dev,
}

impl FromStr for ChaincodeMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "net" => Ok(Self::Net),
            "dev" => Ok(Self::Dev),
            _ => Err(()),
        }
    }
}

/// Program to deploy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChaincodeConfig {
    pub mode: ChaincodeMode,
    pub platform: String,
    pub path: String,
    /// Name of the already running program (dev mode).
    pub name: Option<String>,
    /// Directory the program path is resolved against when packaging.
    pub source_root: Option<PathBuf>,
}

impl Default for ChaincodeConfig {
    fn default() -> Self {
        Self {
            mode: ChaincodeMode::Net,
            platform: "golang".to_string(),
            path: "github.com/hyperledger/fabric/examples/chaincode/go/asset_management"
                .to_string(),
            name: None,
            source_root: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Start in CONFIDENTIAL mode.
    pub confidentiality: bool,
    /// Hex-encoded 32-byte key for confidential payloads.
    pub chain_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetsConfig {
    pub seed_file: PathBuf,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            seed_file: PathBuf::from("assets.txt"),
        }
    }
}

/// User table of the local membership service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MembershipConfig {
    pub users: Vec<MemberConfig>,
}

impl Default for MembershipConfig {
    fn default() -> Self {
        Self {
            users: vec![
                MemberConfig::new("diego", "DRJ23pEQl16a"),
                MemberConfig::new("binhn", "7avZQLwcUe9q"),
                MemberConfig::new("test_user0", "MS9qrN8hFjlE"),
            ],
        }
    }
}

/// One enrollable user as the membership service knows it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemberConfig {
    pub username: String,
    pub secret: String,
}

impl MemberConfig {
    pub fn new(username: &str, secret: &str) -> Self {
        Self {
            username: username.to_string(),
            secret: secret.to_string(),
        }
    }
}

/// A role and the membership credentials it registers with.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    pub role: String,
    pub username: String,
    pub secret: String,
}

impl IdentityConfig {
    pub fn new(role: &str, username: &str, secret: &str) -> Self {
        Self {
            role: role.to_string(),
            username: username.to_string(),
            secret: secret.to_string(),
        }
    }
}

impl AppConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(document: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(document)?)
    }

    /// Read and parse a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let document = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&document)
    }

    /// Apply `ASSET_*` overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|var| std::env::var(var).ok())
    }

    /// Apply `ASSET_*` overrides from `lookup`.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(address) = lookup("ASSET_PEER_ADDRESS") {
            self.peer.address = address;
        }
        if let Some(mode) = lookup("ASSET_CHAINCODE_MODE") {
            self.chaincode.mode = mode.parse().map_err(|_| ConfigError::InvalidEnv {
                var: "ASSET_CHAINCODE_MODE",
                value: mode.clone(),
            })?;
        }
        if let Some(value) = lookup("ASSET_CONFIDENTIALITY") {
            self.security.confidentiality =
                parse_flag(&value).ok_or_else(|| ConfigError::InvalidEnv {
                    var: "ASSET_CONFIDENTIALITY",
                    value: value.clone(),
                })?;
        }
        if let Some(user) = lookup("ASSET_USER") {
            self.user = user;
        }
        Ok(())
    }

    /// Check cross-field constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.identities.is_empty() {
            return Err(ConfigError::NoIdentities);
        }
        if !self.identities.iter().any(|id| id.role == self.user) {
            return Err(ConfigError::UnknownUser(self.user.clone()));
        }
        if self.chaincode.mode == ChaincodeMode::Dev
            && self.chaincode.name.as_deref().map_or(true, str::is_empty)
        {
            return Err(ConfigError::MissingProgramName);
        }
        self.chaincode_type()?;
        if self.chain_key()?.is_none() && self.security.confidentiality {
            return Err(ConfigError::MissingChainKey);
        }
        Ok(())
    }

    pub fn chaincode_type(&self) -> Result<ChaincodeType, ConfigError> {
        ChaincodeType::from_name(&self.chaincode.platform)
            .ok_or_else(|| ConfigError::UnknownPlatform(self.chaincode.platform.clone()))
    }

    /// Decoded chain key, if configured.
    pub fn chain_key(&self) -> Result<Option<SecretKey>, ConfigError> {
        let Some(encoded) = &self.security.chain_key else {
            return Ok(None);
        };
        let bytes =
            hex::decode(encoded).map_err(|e| ConfigError::InvalidChainKey(e.to_string()))?;
        SecretKey::from_slice(&bytes)
            .map(Some)
            .map_err(|e| ConfigError::InvalidChainKey(e.to_string()))
    }

    /// What `deploy` targets.
    pub fn deployment_target(&self) -> Result<DeploymentTarget, ConfigError> {
        let mode = match self.chaincode.mode {
            ChaincodeMode::Net => DeployMode::Network,
            ChaincodeMode::Dev => DeployMode::Development {
                name: self
                    .chaincode
                    .name
                    .clone()
                    .ok_or(ConfigError::MissingProgramName)?,
            },
        };
        Ok(DeploymentTarget {
            chaincode_type: self.chaincode_type()?,
            path: self.chaincode.path.clone(),
            mode,
        })
    }
}

/// `true`/`false`, `on`/`off`, `1`/`0`.
pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "on" | "1" | "yes" => Some(true),
        "false" | "off" | "0" | "no" => Some(false),
        _ => None,
    }
}
