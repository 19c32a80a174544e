//! # Outbound Ports (Driven Ports / SPI)
//!
//! Traits for the collaborators the client consumes but does not own:
//! the identity authority, certificate and transaction handlers, the
//! packaging platforms, and the network transport.
//!
//! ## Single-Use Tokens
//!
//! ```text
//! Identity ──next_certificate_handler──→ Box<dyn TransactionCertificate>
//!                                               │ into_transaction_handler (consumes)
//!                                               ↓
//!                                   Box<dyn TransactionHandler>
//!                                     │ binding (once)
//!                                     │ new_chaincode_execute (consumes)
//!                                     ↓
//!                                 Transaction
//! ```

use std::fmt;
use std::sync::Arc;

use shared_types::{
    ChaincodeDeploymentSpec, ChaincodeInvocationSpec, ChaincodeSpec, Response, Transaction,
};

use crate::domain::entities::Binding;
use crate::domain::errors::{IdentityError, PackagingError, TransportError};

// =============================================================================
// IDENTITY
// =============================================================================

/// Backend identity authority (membership service).
pub trait IdentityAuthority: Send + Sync {
    /// Register `username` under `role`, authenticating with `secret`.
    ///
    /// # Errors
    /// * `IdentityError::UnknownUser` - the authority has no such user
    /// * `IdentityError::SecretRejected` - wrong secret
    fn register(
        &self,
        role: &str,
        metadata: Option<&[u8]>,
        username: &str,
        secret: &str,
    ) -> Result<(), IdentityError>;

    /// Derive the enrolled identity of a registered user.
    fn derive_identity(
        &self,
        username: &str,
        metadata: Option<&[u8]>,
    ) -> Result<Arc<dyn Identity>, IdentityError>;
}

/// An enrolled principal.
pub trait Identity: Send + Sync {
    fn username(&self) -> &str;

    /// A fresh one-time transaction certificate. Never reuse across submissions.
    fn next_certificate_handler(&self) -> Result<Box<dyn TransactionCertificate>, IdentityError>;

    /// The long-lived enrollment certificate handler.
    fn enrollment_certificate_handler(&self) -> Result<Arc<dyn CertificateHandler>, IdentityError>;

    /// Wrap a deployment spec into a signed deploy transaction.
    fn new_deploy_transaction(
        &self,
        spec: &ChaincodeDeploymentSpec,
        txid: &str,
    ) -> Result<Transaction, IdentityError>;

    /// Wrap an invocation spec into a query transaction.
    fn new_query_transaction(
        &self,
        spec: &ChaincodeInvocationSpec,
        txid: &str,
    ) -> Result<Transaction, IdentityError>;
}

impl fmt::Debug for dyn Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("username", &self.username())
            .finish_non_exhaustive()
    }
}

/// Signing capability bound to one certificate.
pub trait CertificateHandler: Send + Sync {
    /// Encoded certificate bytes.
    fn certificate(&self) -> Vec<u8>;

    fn sign(&self, message: &[u8]) -> Result<Vec<u8>, IdentityError>;
}

/// One-time certificate obtained for a single submission.
pub trait TransactionCertificate: CertificateHandler {
    /// Consume the certificate into the context that submits with it.
    fn into_transaction_handler(self: Box<Self>)
        -> Result<Box<dyn TransactionHandler>, IdentityError>;
}

/// Submission context derived from a transaction certificate.
pub trait TransactionHandler: Send {
    /// The single binding of this context.
    ///
    /// # Errors
    /// * `IdentityError::BindingAlreadyIssued` - on every call after the first
    fn binding(&mut self) -> Result<Binding, IdentityError>;

    /// Build the invoke transaction. Consumes the context.
    fn new_chaincode_execute(
        self: Box<Self>,
        spec: &ChaincodeInvocationSpec,
        txid: &str,
    ) -> Result<Transaction, IdentityError>;
}

// =============================================================================
// PACKAGING
// =============================================================================

/// Packaged program bytes and the name derived from them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackagedProgram {
    pub code_package: Vec<u8>,
    pub name: String,
}

/// A program runtime platform.
pub trait Platform: Send + Sync {
    fn validate_spec(&self, spec: &ChaincodeSpec) -> Result<(), PackagingError>;

    fn package(&self, spec: &ChaincodeSpec) -> Result<PackagedProgram, PackagingError>;
}

/// Lookup of platforms by `ChaincodeType` value.
pub trait PlatformResolver: Send + Sync {
    fn platform_for(&self, chaincode_type: i32) -> Result<Arc<dyn Platform>, PackagingError>;
}

// =============================================================================
// TRANSPORT
// =============================================================================

/// Network transport to a validating peer.
///
/// One call per transaction, no retries: the txid and binding are single-use.
#[async_trait::async_trait]
pub trait LedgerTransport: Send + Sync {
    async fn process_transaction(&self, transaction: &Transaction)
        -> Result<Response, TransportError>;
}

#[async_trait::async_trait]
impl<T: LedgerTransport + ?Sized> LedgerTransport for Arc<T> {
    async fn process_transaction(
        &self,
        transaction: &Transaction,
    ) -> Result<Response, TransportError> {
        (**self).process_transaction(transaction).await
    }
}

impl<P: PlatformResolver + ?Sized> PlatformResolver for Arc<P> {
    fn platform_for(&self, chaincode_type: i32) -> Result<Arc<dyn Platform>, PackagingError> {
        (**self).platform_for(chaincode_type)
    }
}
