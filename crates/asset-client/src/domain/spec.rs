//! # Operation Spec Construction
//!
//! Pure builders for the specs wrapped by deploy, invoke and query
//! transactions, and the signature-input layout of authenticated calls.
//!
//! ## Signature Input
//!
//! ```text
//! signature_input = encode(ChaincodeInput { args }) ‖ binding
//! args            = [operation, asset, base64(new_owner_certificate)]
//! ```
//!
//! No separator, input first. The receiving program parses `args` by
//! position and recomputes the same bytes to verify the proof.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use prost::Message;
use shared_types::{
    ChaincodeInput, ChaincodeInvocationSpec, ChaincodeSpec, ChaincodeType, ConfidentialityLevel,
};

use crate::domain::entities::{
    Binding, DeploymentTarget, OperationKind, OwnershipOperation, ProgramAddress, ProgramId,
    SignatureInput,
};

/// Spec of the `init` call that deploys the program. The administrator
/// certificate travels as metadata.
pub fn deployment_spec(
    target: &DeploymentTarget,
    admin_certificate: Vec<u8>,
    level: ConfidentialityLevel,
) -> ChaincodeSpec {
    let mut spec = ChaincodeSpec {
        chaincode_id: Some(target.chaincode_id()),
        input: Some(ChaincodeInput::from_args(&[OperationKind::Init.as_str()])),
        metadata: admin_certificate,
        ..Default::default()
    };
    spec.set_type(target.chaincode_type);
    spec.set_confidentiality_level(level);
    spec
}

/// Positional input of an assign or transfer.
pub fn ownership_input(
    operation: OwnershipOperation,
    asset: &str,
    new_owner_certificate: &[u8],
) -> ChaincodeInput {
    let encoded_owner = STANDARD.encode(new_owner_certificate);
    ChaincodeInput::from_args(&[OperationKind::from(operation).as_str(), asset, &encoded_owner])
}

/// Canonical byte form of an input.
pub fn encode_input(input: &ChaincodeInput) -> Vec<u8> {
    input.encode_to_vec()
}

/// `serialized ‖ binding`. Consumes the binding.
pub fn compose_signature_input(mut serialized: Vec<u8>, binding: Binding) -> SignatureInput {
    serialized.extend_from_slice(&binding.into_bytes());
    SignatureInput::new(serialized)
}

/// Invocation spec of a signed assign/transfer.
pub fn invocation_spec(
    program: &ProgramId,
    input: ChaincodeInput,
    signature: Vec<u8>,
    level: ConfidentialityLevel,
) -> ChaincodeInvocationSpec {
    wrap(program, input, signature, level)
}

/// Invocation spec of an unsigned owner query.
pub fn query_spec(
    program: &ProgramId,
    asset: &str,
    level: ConfidentialityLevel,
) -> ChaincodeInvocationSpec {
    let input = ChaincodeInput::from_args(&[OperationKind::Query.as_str(), asset]);
    wrap(program, input, Vec::new(), level)
}

fn wrap(
    program: &ProgramId,
    input: ChaincodeInput,
    metadata: Vec<u8>,
    level: ConfidentialityLevel,
) -> ChaincodeInvocationSpec {
    let mut spec = ChaincodeSpec {
        chaincode_id: Some(ProgramAddress::Name(program.clone()).to_chaincode_id()),
        input: Some(input),
        metadata,
        ..Default::default()
    };
    spec.set_type(ChaincodeType::Golang);
    spec.set_confidentiality_level(level);
    ChaincodeInvocationSpec {
        chaincode_spec: Some(spec),
        id_generation_alg: String::new(),
    }
}
