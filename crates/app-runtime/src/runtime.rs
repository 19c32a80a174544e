//! # Application Runtime
//!
//! Wires the client from configuration and exposes the operations the
//! command loop drives.
//!
//! ## Startup Sequence
//!
//! 1. Provision the membership service from its own user table
//! 2. Register every configured identity and resolve its enrollment certificate
//! 3. Select the acting user
//! 4. Load the asset seed catalog
//! 5. Apply the initial confidentiality mode
//! 6. Wire the HTTP or in-memory ledger transport

use std::sync::Arc;

use asset_client::{
    AssetCatalog, AssetManagementApi, AssetManagementService, CatalogError, ClientError,
    ClientSession, HttpLedgerTransport, InMemoryLedger, LedgerTransport, MembershipService,
    PlatformRegistry, ProgramId, RegisteredIdentity, TransportError,
};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::{AppConfig, ConfigError};

/// Service type the runtime drives.
pub type AppService = AssetManagementService<Arc<dyn LedgerTransport>, PlatformRegistry>;

/// Runtime errors.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("Cannot create transport")]
    Transport(#[from] TransportError),

    #[error("Unknown asset: {0}")]
    UnknownAsset(String),

    #[error("Confidentiality needs security.chain_key")]
    MissingChainKey,
}

/// Current owner of an asset, as reported by the program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Owner {
    /// The program reports no owner.
    Unassigned,
    /// The certificate belongs to a registered role.
    Role(String),
    /// Certificate of an identity this process does not know.
    Unknown(Vec<u8>),
}

/// The wired client for one acting user.
pub struct AppRuntime {
    service: AppService,
    catalog: AssetCatalog,
    user: Arc<RegisteredIdentity>,
    has_chain_key: bool,
}

impl AppRuntime {
    /// Wire the runtime, using the in-memory ledger when `offline`.
    pub fn bootstrap(config: &AppConfig, offline: bool) -> Result<Self, RuntimeError> {
        let transport: Arc<dyn LedgerTransport> = if offline {
            info!("Using in-memory ledger");
            Arc::new(InMemoryLedger::new(config.chain_key()?))
        } else {
            let transport =
                HttpLedgerTransport::new(&config.peer.address, config.peer.request_timeout())?;
            info!(endpoint = transport.endpoint(), "Using peer transport");
            Arc::new(transport)
        };
        Self::with_transport(config, transport)
    }

    /// Wire the runtime over an existing transport.
    pub fn with_transport(
        config: &AppConfig,
        transport: Arc<dyn LedgerTransport>,
    ) -> Result<Self, RuntimeError> {
        config.validate()?;

        let membership = MembershipService::new(config.chain_key()?);
        for member in &config.membership.users {
            membership.provision(&member.username, &member.secret);
        }

        let session = Arc::new(ClientSession::new(Arc::new(membership)));
        for identity in &config.identities {
            session
                .registry()
                .register(&identity.role, &identity.username, &identity.secret)?
                .certificate_handler()?;
        }
        let user = session.registry().get(&config.user)?;
        info!(role = user.role(), username = user.identity().username(), "Acting user selected");

        let catalog = AssetCatalog::load(&config.assets.seed_file)?;
        info!(assets = catalog.len(), "Asset catalog ready");

        session.set_confidentiality(config.security.confidentiality);

        let service = AssetManagementService::new(
            session,
            PlatformRegistry::new(config.chaincode.source_root.clone()),
            transport,
            config.deployment_target()?,
        );

        Ok(Self {
            service,
            catalog,
            user,
            has_chain_key: config.chain_key()?.is_some(),
        })
    }

    pub fn service(&self) -> &AppService {
        &self.service
    }

    pub fn session(&self) -> &Arc<ClientSession> {
        self.service.session()
    }

    pub fn catalog(&self) -> &AssetCatalog {
        &self.catalog
    }

    pub fn user(&self) -> &Arc<RegisteredIdentity> {
        &self.user
    }

    /// Switch confidentiality for later transactions. Turning it on needs a
    /// chain key.
    pub fn set_confidentiality(&self, enabled: bool) -> Result<(), RuntimeError> {
        if enabled && !self.has_chain_key {
            return Err(RuntimeError::MissingChainKey);
        }
        self.session().set_confidentiality(enabled);
        Ok(())
    }

    /// Deploy with the acting user as deployer and administrator.
    pub async fn deploy(&self) -> Result<ProgramId, RuntimeError> {
        let admin = self.user.certificate_handler()?;
        let (_, program) = self
            .service
            .deploy(self.user.identity().as_ref(), admin.as_ref())
            .await?;
        Ok(program)
    }

    /// Assign `lot` to the identity registered as `role`.
    pub async fn assign(&self, lot: &str, role: &str) -> Result<String, RuntimeError> {
        self.require_asset(lot)?;
        let new_owner = self.session().registry().certificate(role)?;
        let invoker_cert = self.user.certificate_handler()?;
        let response = self
            .service
            .assign_ownership(
                self.user.identity().as_ref(),
                invoker_cert.as_ref(),
                lot,
                &new_owner,
            )
            .await?;
        Ok(response.message())
    }

    /// Transfer `lot` to the identity registered as `role`.
    pub async fn transfer(&self, lot: &str, role: &str) -> Result<String, RuntimeError> {
        self.require_asset(lot)?;
        let new_owner = self.session().registry().certificate(role)?;
        let owner_cert = self.user.certificate_handler()?;
        let response = self
            .service
            .transfer_ownership(
                self.user.identity().as_ref(),
                owner_cert.as_ref(),
                lot,
                &new_owner,
            )
            .await?;
        Ok(response.message())
    }

    /// Ask the program who owns `lot`.
    pub async fn owner(&self, lot: &str) -> Result<Owner, RuntimeError> {
        self.require_asset(lot)?;
        let (_, response) = self
            .service
            .who_is_the_owner(self.user.identity().as_ref(), lot)
            .await?;
        Ok(self.resolve_owner(response.msg))
    }

    fn resolve_owner(&self, certificate: Vec<u8>) -> Owner {
        if certificate.is_empty() {
            return Owner::Unassigned;
        }
        let registry = self.session().registry();
        for role in registry.roles() {
            match registry.certificate(&role) {
                Ok(known) if known == certificate => return Owner::Role(role),
                Ok(_) => {}
                Err(e) => warn!(role = %role, error = %e, "Certificate lookup failed"),
            }
        }
        Owner::Unknown(certificate)
    }

    fn require_asset(&self, lot: &str) -> Result<(), RuntimeError> {
        if self.catalog.contains(lot) {
            Ok(())
        } else {
            Err(RuntimeError::UnknownAsset(lot.to_string()))
        }
    }
}
