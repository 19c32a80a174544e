//! # Program Specification Entities
//!
//! Defines the program (chaincode) schema exchanged with the validating network.
//!
//! ## Clusters
//!
//! - **Addressing**: `ChaincodeId`, `ChaincodeType`
//! - **Invocation**: `ChaincodeInput`, `ChaincodeSpec`, `ChaincodeInvocationSpec`
//! - **Deployment**: `ChaincodeDeploymentSpec`, `CodePackage`
//! - **Identity**: `Certificate`, `CertificateKind`
//!
//! Field tags are part of the wire contract. The canonical byte form of
//! `ChaincodeInput` is what invokers sign, so tags and field order MUST NOT change.

// =============================================================================
// CLUSTER A: ADDRESSING
// =============================================================================

/// Runtime platform a program is written for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum ChaincodeType {
    Undefined = 0,
    Golang = 1,
    Node = 2,
    Car = 3,
    Java = 4,
}

impl ChaincodeType {
    /// Parse a platform name as used in configuration files.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "golang" | "go" => Some(Self::Golang),
            "node" => Some(Self::Node),
            "car" => Some(Self::Car),
            "java" => Some(Self::Java),
            _ => None,
        }
    }
}

/// Program address. `path` locates the source for the initial deploy,
/// `name` is the network-assigned identifier used afterwards.
#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct ChaincodeId {
    #[prost(string, tag = "1")]
    pub path: String,
    #[prost(string, tag = "2")]
    pub name: String,
}

impl ChaincodeId {
    /// Address a program by source path.
    pub fn by_path(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: String::new(),
        }
    }

    /// Address a program by its network-assigned name.
    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            path: String::new(),
            name: name.into(),
        }
    }
}

// =============================================================================
// CLUSTER B: INVOCATION
// =============================================================================

/// Positional program arguments. The first argument is the operation name.
#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct ChaincodeInput {
    #[prost(bytes = "vec", repeated, tag = "1")]
    pub args: Vec<Vec<u8>>,
}

impl ChaincodeInput {
    /// Build an input from string arguments, preserving order.
    pub fn from_args(args: &[&str]) -> Self {
        Self {
            args: to_chaincode_args(args),
        }
    }
}

/// Visibility of transaction contents to validators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum ConfidentialityLevel {
    Public = 0,
    Confidential = 1,
}

/// Full description of one program operation.
///
/// `metadata` carries the deployer's certificate for deploys and the
/// invoker's signature for authenticated invocations. Queries leave it empty.
#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct ChaincodeSpec {
    #[prost(enumeration = "ChaincodeType", tag = "1")]
    pub r#type: i32,
    #[prost(message, optional, tag = "2")]
    pub chaincode_id: Option<ChaincodeId>,
    #[prost(message, optional, tag = "3")]
    pub input: Option<ChaincodeInput>,
    #[prost(int32, tag = "4")]
    pub timeout: i32,
    #[prost(string, tag = "5")]
    pub secure_context: String,
    #[prost(enumeration = "ConfidentialityLevel", tag = "6")]
    pub confidentiality_level: i32,
    #[prost(bytes = "vec", tag = "7")]
    pub metadata: Vec<u8>,
    #[prost(string, repeated, tag = "8")]
    pub attributes: Vec<String>,
}

impl ChaincodeSpec {
    /// Network-assigned program name, empty when not yet assigned.
    pub fn chaincode_name(&self) -> &str {
        self.chaincode_id
            .as_ref()
            .map(|id| id.name.as_str())
            .unwrap_or_default()
    }

    /// Operation name (first argument), if any.
    pub fn operation(&self) -> Option<String> {
        self.input
            .as_ref()
            .and_then(|input| input.args.first())
            .map(|arg| String::from_utf8_lossy(arg).into_owned())
    }
}

/// Wrapper submitted for invoke and query transactions.
#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct ChaincodeInvocationSpec {
    #[prost(message, optional, tag = "1")]
    pub chaincode_spec: Option<ChaincodeSpec>,
    #[prost(string, tag = "2")]
    pub id_generation_alg: String,
}

// =============================================================================
// CLUSTER C: DEPLOYMENT
// =============================================================================

/// Execution environment for a deployed program.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum ExecutionEnvironment {
    Docker = 0,
    System = 1,
}

/// Spec plus packaged program bytes. `code_package` is empty when the
/// program is already running (development mode).
#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct ChaincodeDeploymentSpec {
    #[prost(message, optional, tag = "1")]
    pub chaincode_spec: Option<ChaincodeSpec>,
    #[prost(uint64, tag = "2")]
    pub effective_date: u64,
    #[prost(bytes = "vec", tag = "3")]
    pub code_package: Vec<u8>,
    #[prost(enumeration = "ExecutionEnvironment", tag = "4")]
    pub exec_env: i32,
}

/// One source file inside a code package.
#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct PackagedFile {
    #[prost(string, tag = "1")]
    pub path: String,
    #[prost(bytes = "vec", tag = "2")]
    pub contents: Vec<u8>,
}

/// Packaged program source, files sorted by relative path.
#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct CodePackage {
    #[prost(string, tag = "1")]
    pub root: String,
    #[prost(message, repeated, tag = "2")]
    pub files: Vec<PackagedFile>,
}

// =============================================================================
// CLUSTER D: IDENTITY
// =============================================================================

/// Kind of certificate issued by the membership authority.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum CertificateKind {
    /// Long-lived enrollment certificate.
    Enrollment = 0,
    /// One-time transaction certificate.
    Transaction = 1,
}

/// A certificate binding a subject to an Ed25519 public key.
///
/// `issuer_signature` covers the encoding of the certificate with that
/// field left empty.
#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct Certificate {
    #[prost(string, tag = "1")]
    pub subject: String,
    #[prost(enumeration = "CertificateKind", tag = "2")]
    pub kind: i32,
    #[prost(bytes = "vec", tag = "3")]
    pub public_key: Vec<u8>,
    #[prost(uint64, tag = "4")]
    pub serial: u64,
    #[prost(bytes = "vec", tag = "5")]
    pub issuer_signature: Vec<u8>,
}

impl Certificate {
    /// Bytes covered by the issuer signature.
    pub fn tbs_bytes(&self) -> Vec<u8> {
        use prost::Message;
        let mut unsigned = self.clone();
        unsigned.issuer_signature.clear();
        unsigned.encode_to_vec()
    }
}

/// Convert string arguments to the byte arguments of a `ChaincodeInput`.
pub fn to_chaincode_args(args: &[&str]) -> Vec<Vec<u8>> {
    args.iter().map(|arg| arg.as_bytes().to_vec()).collect()
}
