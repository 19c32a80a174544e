//! # Asset Client
//!
//! Builds and submits authenticated transactions for the asset-management
//! program on a permissioned ledger.
//!
//! ## Architecture
//!
//! This crate follows hexagonal architecture:
//! - **Domain Layer** (`domain/`): Session state, registry, spec builders, no I/O
//! - **Ports Layer** (`ports/`): Inbound API and outbound collaborator traits
//! - **Adapters Layer** (`adapters/`): Membership service, platforms, transports
//! - **Service Layer** (`service.rs`): Deploy, invoke and query flows
//!
//! ## Security Notes
//!
//! - **Anti-Replay**: Invokers sign `encode(input) ‖ binding`; the binding comes from a
//!   one-time transaction certificate and can be requested only once
//! - **Single-Use Tokens**: Certificate and transaction handlers are consumed by value
//! - **No Retries**: A failed submission is returned to the caller, never resent

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

// Re-export public API
pub use adapters::membership::{
    compute_binding, verify_certificate_signature, CertificateIssuer, MembershipService,
};
pub use adapters::packaging::PlatformRegistry;
pub use adapters::transport::{HttpLedgerTransport, InMemoryLedger};
pub use domain::assets::{AssetCatalog, CatalogError};
pub use domain::entities::{
    Binding, DeployMode, DeploymentTarget, OperationKind, OwnershipOperation, ProgramAddress,
    ProgramId, SignatureInput,
};
pub use domain::errors::{
    AuthorizationError, ClientError, DeploymentError, IdentityError, PackagingError,
    TransportError,
};
pub use domain::registry::{IdentityRegistry, RegisteredIdentity};
pub use domain::session::{ClientSession, ConfidentialityPolicy, ProgramSlot};
pub use ports::inbound::AssetManagementApi;
pub use ports::outbound::{
    CertificateHandler, Identity, IdentityAuthority, LedgerTransport, PackagedProgram, Platform,
    PlatformResolver, TransactionCertificate, TransactionHandler,
};
pub use service::AssetManagementService;
