//! # Domain Entities
//!
//! Value types for program addressing, operations, and the one-time binding.

use std::fmt;

use shared_types::{ChaincodeId, ChaincodeType};

/// Network-assigned program identifier, returned by a successful deploy.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProgramId(String);

impl ProgramId {
    /// Wrap a non-empty program name.
    pub fn new(name: impl Into<String>) -> Option<Self> {
        let name = name.into();
        if name.is_empty() {
            None
        } else {
            Some(Self(name))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProgramId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How a transaction addresses its target program.
///
/// Initial deploys address the source by path; every later operation uses
/// the name the network assigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgramAddress {
    Path(String),
    Name(ProgramId),
}

impl ProgramAddress {
    pub fn to_chaincode_id(&self) -> ChaincodeId {
        match self {
            Self::Path(path) => ChaincodeId::by_path(path.clone()),
            Self::Name(id) => ChaincodeId::by_name(id.as_str()),
        }
    }
}

/// Whether the program must be packaged or is already running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployMode {
    /// Validate the platform and package the program source.
    Network,
    /// The program was started by hand under `name`; nothing is packaged.
    Development { name: String },
}

/// Everything the deployment builder needs besides the deployer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentTarget {
    pub chaincode_type: ChaincodeType,
    pub path: String,
    pub mode: DeployMode,
}

impl DeploymentTarget {
    /// Address used in the deploy spec.
    pub fn chaincode_id(&self) -> ChaincodeId {
        match &self.mode {
            DeployMode::Network => ProgramAddress::Path(self.path.clone()).to_chaincode_id(),
            DeployMode::Development { name } => ChaincodeId {
                path: self.path.clone(),
                name: name.clone(),
            },
        }
    }
}

/// Operation names understood by the asset-management program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Init,
    Assign,
    Transfer,
    Query,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Assign => "assign",
            Self::Transfer => "transfer",
            Self::Query => "query",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The authenticated, state-changing operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OwnershipOperation {
    Assign,
    Transfer,
}

impl From<OwnershipOperation> for OperationKind {
    fn from(op: OwnershipOperation) -> Self {
        match op {
            OwnershipOperation::Assign => OperationKind::Assign,
            OwnershipOperation::Transfer => OperationKind::Transfer,
        }
    }
}

/// One-time value tying a signature to a single submission.
///
/// Not `Clone`: it is produced once by a transaction handler and consumed
/// by [`compose_signature_input`](crate::domain::spec::compose_signature_input).
#[derive(Debug, PartialEq, Eq)]
pub struct Binding(Vec<u8>);

impl Binding {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

/// Bytes an invoker signs: `serialized input ‖ binding`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureInput(Vec<u8>);

impl SignatureInput {
    pub(crate) fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}
