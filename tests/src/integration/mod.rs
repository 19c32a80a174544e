//! Cross-crate integration flows over the in-process membership service
//! and in-memory ledger.

pub mod properties;
pub mod runtime;
pub mod scenarios;

#[cfg(test)]
pub(crate) mod fixtures {
    use std::sync::Arc;

    use asset_client::{
        AssetManagementService, ClientSession, DeployMode, DeploymentTarget, InMemoryLedger,
        AssetManagementApi, MembershipService, PlatformRegistry, ProgramId, RegisteredIdentity,
    };
    use shared_crypto::SecretKey;
    use shared_types::ChaincodeType;

    pub const PROGRAM_PATH: &str = "github.com/example/asset_management";

    pub type Service = AssetManagementService<Arc<InMemoryLedger>, PlatformRegistry>;

    /// A session with alice (admin), bob and carol registered.
    pub struct Network {
        pub service: Service,
        pub ledger: Arc<InMemoryLedger>,
        pub alice: Arc<RegisteredIdentity>,
        pub bob: Arc<RegisteredIdentity>,
        pub carol: Arc<RegisteredIdentity>,
    }

    impl Network {
        pub fn new() -> Self {
            Self::build(None, golang_target())
        }

        /// Both the client and the ledger share `chain_key`.
        pub fn with_chain_key(chain_key: [u8; 32]) -> Self {
            Self::build(Some(chain_key), golang_target())
        }

        /// Like [`Network::with_chain_key`], with alice's deploy already done.
        /// Blocks on its own runtime, so call it outside async tests.
        pub fn deployed(chain_key: [u8; 32]) -> (Self, ProgramId) {
            let network = Self::with_chain_key(chain_key);
            let admin = network.alice.certificate_handler().unwrap();
            let (_, program) = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap()
                .block_on(
                    network
                        .service
                        .deploy(network.alice.identity().as_ref(), admin.as_ref()),
                )
                .unwrap();
            (network, program)
        }

        pub fn with_target(target: DeploymentTarget) -> Self {
            Self::build(None, target)
        }

        fn build(chain_key: Option<[u8; 32]>, target: DeploymentTarget) -> Self {
            let key = || chain_key.map(SecretKey::from_bytes);

            let membership = MembershipService::new(key());
            membership.provision("alice", "alice-secret");
            membership.provision("bob", "bob-secret");
            membership.provision("carol", "carol-secret");

            let session = Arc::new(ClientSession::new(Arc::new(membership)));

            let registry = session.registry();
            let alice = registry.register("alice", "alice", "alice-secret").unwrap();
            let bob = registry.register("bob", "bob", "bob-secret").unwrap();
            let carol = registry.register("carol", "carol", "carol-secret").unwrap();

            let ledger = Arc::new(InMemoryLedger::new(key()));
            let service = AssetManagementService::new(
                session,
                PlatformRegistry::default(),
                Arc::clone(&ledger),
                target,
            );

            Self {
                service,
                ledger,
                alice,
                bob,
                carol,
            }
        }
    }

    pub fn golang_target() -> DeploymentTarget {
        DeploymentTarget {
            chaincode_type: ChaincodeType::Golang,
            path: PROGRAM_PATH.to_string(),
            mode: DeployMode::Network,
        }
    }
}
