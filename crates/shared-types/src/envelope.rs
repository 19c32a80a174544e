//! # Transaction Envelope
//!
//! The network-submittable wrapper for one program operation, and the
//! response the network returns for it.
//!
//! ## Security Properties
//!
//! - **Uniqueness**: Every envelope carries a fresh `txid` generated per submission.
//! - **Anti-Replay**: Invocations carry the one-time `nonce` that was hashed into the
//!   invoker's binding, and the transaction certificate that signed the envelope.
//! - **Integrity**: `signature` covers the envelope encoded with an empty signature field.

use prost::Message;
use uuid::Uuid;

use crate::entities::ConfidentialityLevel;

/// Kind of ledger transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum TransactionType {
    Undefined = 0,
    ChaincodeDeploy = 1,
    ChaincodeInvoke = 2,
    ChaincodeQuery = 3,
    ChaincodeTerminate = 4,
}

/// The universal transaction envelope.
#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct Transaction {
    // =========================================================================
    // HEADER SECTION
    // =========================================================================
    #[prost(enumeration = "TransactionType", tag = "1")]
    pub r#type: i32,
    /// Encoded `ChaincodeId` of the target program.
    #[prost(bytes = "vec", tag = "2")]
    pub chaincode_id: Vec<u8>,
    /// Encoded deployment or invocation spec, encrypted when confidential.
    #[prost(bytes = "vec", tag = "3")]
    pub payload: Vec<u8>,
    #[prost(bytes = "vec", tag = "4")]
    pub metadata: Vec<u8>,
    /// Process-wide unique submission identifier.
    #[prost(string, tag = "5")]
    pub txid: String,
    /// Unix timestamp (seconds) at construction.
    #[prost(uint64, tag = "6")]
    pub timestamp: u64,

    // =========================================================================
    // CONFIDENTIALITY SECTION
    // =========================================================================
    #[prost(enumeration = "ConfidentialityLevel", tag = "7")]
    pub confidentiality_level: i32,
    #[prost(string, tag = "8")]
    pub confidentiality_protocol_version: String,

    // =========================================================================
    // SECURITY SECTION
    // =========================================================================
    /// One-time nonce hashed into the submitter's binding.
    #[prost(bytes = "vec", tag = "9")]
    pub nonce: Vec<u8>,
    #[prost(bytes = "vec", tag = "10")]
    pub to_validators: Vec<u8>,
    /// Certificate of the key that signed this envelope.
    #[prost(bytes = "vec", tag = "11")]
    pub cert: Vec<u8>,
    #[prost(bytes = "vec", tag = "12")]
    pub signature: Vec<u8>,
}

impl Transaction {
    /// Bytes covered by the envelope signature.
    pub fn signing_bytes(&self) -> Vec<u8> {
        let mut unsigned = self.clone();
        unsigned.signature.clear();
        unsigned.encode_to_vec()
    }

    /// Whether the payload is encrypted for validators.
    pub fn is_confidential(&self) -> bool {
        self.confidentiality_level() == ConfidentialityLevel::Confidential
    }
}

/// Outcome status reported by the network.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum ResponseStatus {
    Undefined = 0,
    Success = 200,
    Failure = 500,
}

/// Network response to a submitted transaction.
#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct Response {
    #[prost(enumeration = "ResponseStatus", tag = "1")]
    pub status: i32,
    #[prost(bytes = "vec", tag = "2")]
    pub msg: Vec<u8>,
}

impl Response {
    /// Successful response carrying `msg`.
    pub fn success(msg: impl Into<Vec<u8>>) -> Self {
        Self {
            status: ResponseStatus::Success as i32,
            msg: msg.into(),
        }
    }

    /// Failed response carrying a reason.
    pub fn failure(msg: impl Into<Vec<u8>>) -> Self {
        Self {
            status: ResponseStatus::Failure as i32,
            msg: msg.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status() == ResponseStatus::Success
    }

    /// Message as lossy UTF-8, for logs.
    pub fn message(&self) -> String {
        String::from_utf8_lossy(&self.msg).into_owned()
    }
}

/// Generate a fresh submission identifier.
pub fn new_transaction_id() -> String {
    Uuid::new_v4().to_string()
}
