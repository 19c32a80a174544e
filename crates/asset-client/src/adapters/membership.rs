//! # Membership Service
//!
//! In-process identity authority. Users are provisioned up front with an
//! enrollment secret; registration checks the secret and enrollment issues
//! an Ed25519 certificate signed by the membership CA.
//!
//! ## Transaction Certificates
//!
//! ```text
//! tcert_key[i] = enrollment_key.derive_child(TCERT_CONTEXT, i)
//! binding      = SHA-256(tcert ‖ nonce)
//! ```
//!
//! Every transaction is signed by a fresh tcert over its encoding with an
//! empty signature field. The tcert and the nonce travel in the envelope so
//! validators can recompute the binding.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::RwLock;
use prost::Message;
use rand::RngCore;
use shared_crypto::{
    seal, sha256_many, Ed25519KeyPair, Ed25519PublicKey, Ed25519Signature, Hash, SecretKey,
};
use shared_types::{
    Certificate, CertificateKind, ChaincodeDeploymentSpec, ChaincodeInvocationSpec, ChaincodeSpec,
    ConfidentialityLevel, Transaction, TransactionType,
};
use tracing::{debug, info};

use crate::domain::entities::Binding;
use crate::domain::errors::IdentityError;
use crate::ports::outbound::{
    CertificateHandler, Identity, IdentityAuthority, TransactionCertificate, TransactionHandler,
};

const TCERT_CONTEXT: &str = "asset-ledger 2024-01 transaction certificate";

/// Protocol version stamped on confidential transactions.
pub const CONFIDENTIALITY_PROTOCOL_VERSION: &str = "1.2";

const NONCE_LEN: usize = 32;

/// `SHA-256(certificate ‖ nonce)`.
pub fn compute_binding(certificate: &[u8], nonce: &[u8]) -> Hash {
    sha256_many(&[certificate, nonce])
}

/// Verify `signature` over `message` with the key inside `certificate`.
pub fn verify_certificate_signature(
    certificate: &[u8],
    message: &[u8],
    signature: &[u8],
) -> Result<(), IdentityError> {
    let certificate = Certificate::decode(certificate)?;
    let public_key = Ed25519PublicKey::from_slice(&certificate.public_key)?;
    let signature = Ed25519Signature::from_slice(signature)?;
    public_key.verify(message, &signature)?;
    Ok(())
}

// =============================================================================
// CERTIFICATE AUTHORITY
// =============================================================================

/// Membership CA key and serial counter.
pub struct CertificateIssuer {
    keypair: Ed25519KeyPair,
    next_serial: AtomicU64,
}

impl CertificateIssuer {
    pub fn new(keypair: Ed25519KeyPair) -> Self {
        Self {
            keypair,
            next_serial: AtomicU64::new(1),
        }
    }

    pub fn public_key(&self) -> Ed25519PublicKey {
        self.keypair.public_key()
    }

    /// Issue an encoded certificate for `public_key`.
    pub fn issue(
        &self,
        subject: &str,
        kind: CertificateKind,
        public_key: &Ed25519PublicKey,
    ) -> Vec<u8> {
        let mut certificate = Certificate {
            subject: subject.to_string(),
            kind: kind as i32,
            public_key: public_key.as_bytes().to_vec(),
            serial: self.next_serial.fetch_add(1, Ordering::Relaxed),
            issuer_signature: Vec::new(),
        };
        certificate.issuer_signature = self.keypair.sign(&certificate.tbs_bytes()).to_vec();
        certificate.encode_to_vec()
    }

    /// Check that an encoded certificate was issued by this CA.
    pub fn verify(&self, certificate: &[u8]) -> Result<Certificate, IdentityError> {
        let certificate = Certificate::decode(certificate)?;
        let signature = Ed25519Signature::from_slice(&certificate.issuer_signature)?;
        self.public_key().verify(&certificate.tbs_bytes(), &signature)?;
        Ok(certificate)
    }
}

impl std::fmt::Debug for CertificateIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CertificateIssuer")
            .field("public_key", &hex::encode(self.public_key().as_bytes()))
            .finish()
    }
}

// =============================================================================
// AUTHORITY
// =============================================================================

struct UserRecord {
    secret: String,
    registered: bool,
    identity: Option<Arc<LocalIdentity>>,
}

/// Identity authority backed by a provisioned user table.
pub struct MembershipService {
    issuer: Arc<CertificateIssuer>,
    chain_key: Option<Arc<SecretKey>>,
    users: RwLock<HashMap<String, UserRecord>>,
}

impl MembershipService {
    /// New authority with a random CA key. Confidential transactions need
    /// a `chain_key`.
    pub fn new(chain_key: Option<SecretKey>) -> Self {
        Self {
            issuer: Arc::new(CertificateIssuer::new(Ed25519KeyPair::generate())),
            chain_key: chain_key.map(Arc::new),
            users: RwLock::new(HashMap::new()),
        }
    }

    /// Add a user that may later register with `secret`.
    pub fn provision(&self, username: &str, secret: &str) {
        self.users.write().insert(
            username.to_string(),
            UserRecord {
                secret: secret.to_string(),
                registered: false,
                identity: None,
            },
        );
        debug!(username, "User provisioned");
    }

    pub fn issuer(&self) -> &Arc<CertificateIssuer> {
        &self.issuer
    }

    fn enroll(&self, username: &str) -> Arc<LocalIdentity> {
        let keypair = Ed25519KeyPair::generate();
        let certificate = self
            .issuer
            .issue(username, CertificateKind::Enrollment, &keypair.public_key());
        info!(username, "Enrollment certificate issued");
        Arc::new(LocalIdentity {
            username: username.to_string(),
            enrollment: Arc::new(KeyHandler {
                certificate,
                keypair,
            }),
            issuer: Arc::clone(&self.issuer),
            chain_key: self.chain_key.clone(),
            tcert_index: AtomicU64::new(0),
        })
    }
}

impl IdentityAuthority for MembershipService {
    fn register(
        &self,
        role: &str,
        _metadata: Option<&[u8]>,
        username: &str,
        secret: &str,
    ) -> Result<(), IdentityError> {
        let mut users = self.users.write();
        let record = users
            .get_mut(username)
            .ok_or_else(|| IdentityError::UnknownUser(username.to_string()))?;
        if record.secret != secret {
            return Err(IdentityError::SecretRejected(username.to_string()));
        }
        record.registered = true;
        debug!(role, username, "User registered");
        Ok(())
    }

    fn derive_identity(
        &self,
        username: &str,
        _metadata: Option<&[u8]>,
    ) -> Result<Arc<dyn Identity>, IdentityError> {
        let mut users = self.users.write();
        let record = users
            .get_mut(username)
            .ok_or_else(|| IdentityError::UnknownUser(username.to_string()))?;
        if !record.registered {
            return Err(IdentityError::NotRegistered(username.to_string()));
        }
        let identity = record
            .identity
            .get_or_insert_with(|| self.enroll(username));
        Ok(Arc::clone(identity) as Arc<dyn Identity>)
    }
}

// =============================================================================
// CERTIFICATE HANDLERS
// =============================================================================

/// A certificate and the key it certifies.
struct KeyHandler {
    certificate: Vec<u8>,
    keypair: Ed25519KeyPair,
}

impl CertificateHandler for KeyHandler {
    fn certificate(&self) -> Vec<u8> {
        self.certificate.clone()
    }

    fn sign(&self, message: &[u8]) -> Result<Vec<u8>, IdentityError> {
        Ok(self.keypair.sign(message).to_vec())
    }
}

/// Settings every transaction built by one identity shares.
#[derive(Clone)]
struct EnvelopeContext {
    chain_key: Option<Arc<SecretKey>>,
}

impl EnvelopeContext {
    /// Assemble, optionally encrypt, and sign an envelope with `signer`.
    fn seal_transaction(
        &self,
        kind: TransactionType,
        spec: &ChaincodeSpec,
        payload: Vec<u8>,
        txid: &str,
        nonce: Vec<u8>,
        signer: &KeyHandler,
    ) -> Result<Transaction, IdentityError> {
        let mut transaction = Transaction {
            chaincode_id: spec
                .chaincode_id
                .as_ref()
                .map(|id| id.encode_to_vec())
                .unwrap_or_default(),
            txid: txid.to_string(),
            timestamp: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or_default(),
            nonce,
            cert: signer.certificate(),
            ..Default::default()
        };
        transaction.set_type(kind);

        match spec.confidentiality_level() {
            ConfidentialityLevel::Confidential => {
                let key = self.chain_key.as_ref().ok_or(IdentityError::MissingChainKey)?;
                transaction.payload = seal(key, &payload)?;
                transaction.set_confidentiality_level(ConfidentialityLevel::Confidential);
                transaction.confidentiality_protocol_version =
                    CONFIDENTIALITY_PROTOCOL_VERSION.to_string();
            }
            ConfidentialityLevel::Public => {
                transaction.payload = payload;
            }
        }

        transaction.signature = signer.sign(&transaction.signing_bytes())?;
        debug!(txid, kind = ?kind, confidential = transaction.is_confidential(), "Transaction sealed");
        Ok(transaction)
    }
}

/// One-time transaction certificate.
pub struct TransactionCertHandler {
    handler: KeyHandler,
    context: EnvelopeContext,
}

impl CertificateHandler for TransactionCertHandler {
    fn certificate(&self) -> Vec<u8> {
        self.handler.certificate()
    }

    fn sign(&self, message: &[u8]) -> Result<Vec<u8>, IdentityError> {
        self.handler.sign(message)
    }
}

impl TransactionCertificate for TransactionCertHandler {
    fn into_transaction_handler(
        self: Box<Self>,
    ) -> Result<Box<dyn TransactionHandler>, IdentityError> {
        let mut nonce = vec![0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce);
        Ok(Box::new(LocalTransactionHandler {
            handler: self.handler,
            context: self.context,
            nonce,
            binding_issued: false,
        }))
    }
}

/// Submission context of one transaction certificate and nonce.
pub struct LocalTransactionHandler {
    handler: KeyHandler,
    context: EnvelopeContext,
    nonce: Vec<u8>,
    binding_issued: bool,
}

impl TransactionHandler for LocalTransactionHandler {
    fn binding(&mut self) -> Result<Binding, IdentityError> {
        if self.binding_issued {
            return Err(IdentityError::BindingAlreadyIssued);
        }
        self.binding_issued = true;
        let binding = compute_binding(&self.handler.certificate, &self.nonce);
        Ok(Binding::new(binding.to_vec()))
    }

    fn new_chaincode_execute(
        self: Box<Self>,
        spec: &ChaincodeInvocationSpec,
        txid: &str,
    ) -> Result<Transaction, IdentityError> {
        let inner = spec
            .chaincode_spec
            .as_ref()
            .ok_or(IdentityError::MissingField("chaincode_spec"))?;
        self.context.seal_transaction(
            TransactionType::ChaincodeInvoke,
            inner,
            spec.encode_to_vec(),
            txid,
            self.nonce,
            &self.handler,
        )
    }
}

// =============================================================================
// IDENTITY
// =============================================================================

/// An enrolled user of the membership service.
pub struct LocalIdentity {
    username: String,
    enrollment: Arc<KeyHandler>,
    issuer: Arc<CertificateIssuer>,
    chain_key: Option<Arc<SecretKey>>,
    tcert_index: AtomicU64,
}

impl LocalIdentity {
    fn context(&self) -> EnvelopeContext {
        EnvelopeContext {
            chain_key: self.chain_key.clone(),
        }
    }

    fn next_key_handler(&self) -> KeyHandler {
        let index = self.tcert_index.fetch_add(1, Ordering::Relaxed);
        let keypair = self.enrollment.keypair.derive_child(TCERT_CONTEXT, index);
        let certificate =
            self.issuer
                .issue(&self.username, CertificateKind::Transaction, &keypair.public_key());
        debug!(username = %self.username, index, "Transaction certificate derived");
        KeyHandler {
            certificate,
            keypair,
        }
    }

    fn fresh_nonce() -> Vec<u8> {
        let mut nonce = vec![0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce);
        nonce
    }
}

impl Identity for LocalIdentity {
    fn username(&self) -> &str {
        &self.username
    }

    fn next_certificate_handler(&self) -> Result<Box<dyn TransactionCertificate>, IdentityError> {
        Ok(Box::new(TransactionCertHandler {
            handler: self.next_key_handler(),
            context: self.context(),
        }))
    }

    fn enrollment_certificate_handler(&self) -> Result<Arc<dyn CertificateHandler>, IdentityError> {
        Ok(Arc::clone(&self.enrollment) as Arc<dyn CertificateHandler>)
    }

    fn new_deploy_transaction(
        &self,
        spec: &ChaincodeDeploymentSpec,
        txid: &str,
    ) -> Result<Transaction, IdentityError> {
        let inner = spec
            .chaincode_spec
            .as_ref()
            .ok_or(IdentityError::MissingField("chaincode_spec"))?;
        self.context().seal_transaction(
            TransactionType::ChaincodeDeploy,
            inner,
            spec.encode_to_vec(),
            txid,
            Self::fresh_nonce(),
            &self.next_key_handler(),
        )
    }

    fn new_query_transaction(
        &self,
        spec: &ChaincodeInvocationSpec,
        txid: &str,
    ) -> Result<Transaction, IdentityError> {
        let inner = spec
            .chaincode_spec
            .as_ref()
            .ok_or(IdentityError::MissingField("chaincode_spec"))?;
        self.context().seal_transaction(
            TransactionType::ChaincodeQuery,
            inner,
            spec.encode_to_vec(),
            txid,
            Self::fresh_nonce(),
            &self.next_key_handler(),
        )
    }
}

impl std::fmt::Debug for LocalIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalIdentity")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}
