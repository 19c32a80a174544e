//! # Client Errors
//!
//! Error types for transaction construction and submission.
//!
//! Collaborator failures (`IdentityError`, `PackagingError`, `TransportError`)
//! are carried as sources of the `ClientError` taxonomy so callers always see
//! the full cause chain. Nothing here is retried.

use std::time::Duration;

use shared_crypto::CryptoError;
use thiserror::Error;

/// Failures reported by the identity authority, certificate handlers and
/// transaction handlers.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// The backend authority has no such user.
    #[error("Unknown user: {0}")]
    UnknownUser(String),

    /// The enrollment secret did not match.
    #[error("Secret rejected for user {0}")]
    SecretRejected(String),

    /// An identity was derived before registration.
    #[error("User {0} is not registered")]
    NotRegistered(String),

    /// Enrollment has not completed, so no certificate exists yet.
    #[error("Enrollment not completed for {0}")]
    NotEnrolled(String),

    /// A transaction handler was asked for a second binding.
    #[error("Binding already issued by this transaction handler")]
    BindingAlreadyIssued,

    /// Confidential transaction requested without a chain key.
    #[error("Confidential transaction requires a chain key")]
    MissingChainKey,

    /// A required nested message was absent.
    #[error("Missing field: {0}")]
    MissingField(&'static str),

    /// Certificate bytes could not be decoded.
    #[error("Invalid certificate")]
    InvalidCertificate(#[from] prost::DecodeError),

    /// Underlying signing or encryption failure.
    #[error("Crypto error")]
    Crypto(#[from] CryptoError),
}

/// Failures of the packaging/validation collaborator.
#[derive(Debug, Error)]
pub enum PackagingError {
    /// A spec without a program address is treated as absent.
    #[error("Expected chaincode specification, none received")]
    MissingSpec,

    /// No platform is registered for the spec's type.
    #[error("Failed to determine platform type: {0}")]
    UnknownPlatform(i32),

    /// The spec failed platform-specific validation.
    #[error("Invalid chaincode spec: {0}")]
    InvalidSpec(String),

    /// Reading program sources failed.
    #[error("Error getting chaincode package bytes")]
    Io(#[from] std::io::Error),
}

/// Transport-level submission failures, returned verbatim to callers.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The peer could not be reached.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// The peer did not answer in time.
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// The network processed and rejected the transaction.
    #[error("Transaction rejected: {0}")]
    Rejected(String),

    /// Non-success HTTP exchange.
    #[error("HTTP error: {0}")]
    Http(String),

    /// The response body was not a valid `Response`.
    #[error("Malformed response")]
    Decode(#[from] prost::DecodeError),
}

/// Causes of a failed deploy.
#[derive(Debug, Error)]
pub enum DeploymentError {
    #[error("Error building deploy transaction")]
    Transaction(#[source] IdentityError),

    #[error("Error submitting deploy transaction")]
    Submission(#[source] TransportError),

    /// The deployment spec carried no program name after packaging.
    #[error("Deployment spec carries no program name")]
    MissingProgramName,
}

/// Causes of a failed authorization proof (steps 1–5 of an invocation).
#[derive(Debug, Error)]
pub enum AuthorizationError {
    #[error("Error obtaining transaction certificate")]
    CertificateHandler(#[source] IdentityError),

    #[error("Error obtaining transaction handler")]
    TransactionHandler(#[source] IdentityError),

    #[error("Error obtaining binding")]
    Binding(#[source] IdentityError),

    #[error("Error signing invocation")]
    Signing(#[source] IdentityError),
}

/// Errors surfaced by every client operation.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Role unknown to the backend or secret rejected.
    #[error("Registration of role '{role}' failed")]
    Registration {
        role: String,
        #[source]
        source: IdentityError,
    },

    /// The role is already present in the registry.
    #[error("Role '{0}' is already registered")]
    RoleAlreadyRegistered(String),

    /// The role was never registered in this session.
    #[error("Unknown role: {0}")]
    UnknownRole(String),

    /// Enrollment has not completed for the identity.
    #[error("Certificate unavailable for role '{role}'")]
    CertificateUnavailable {
        role: String,
        #[source]
        source: IdentityError,
    },

    /// Platform unknown or spec invalid. Nothing was submitted.
    #[error("Packaging failed")]
    Packaging(#[from] PackagingError),

    #[error("Deployment failed")]
    DeploymentFailed(#[source] DeploymentError),

    /// Certificate handler, binding or signing failure.
    #[error("Authorization build failed")]
    AuthorizationBuildFailed(#[source] AuthorizationError),

    #[error("Invocation build failed")]
    InvocationBuildFailed(#[source] IdentityError),

    #[error("Query build failed")]
    QueryBuildFailed(#[source] IdentityError),

    #[error("Submission failed")]
    SubmissionFailed(#[source] TransportError),

    /// Assign/transfer/query attempted before a successful deploy.
    #[error("Program has not been deployed in this session")]
    ProgramNotDeployed,
}
