//! # Construction Properties
//!
//! Properties of built transactions that hold for every invocation:
//!
//! - The proof signs `encode(input) ‖ binding`, in that order
//! - Every built transaction carries a fresh txid
//! - Confidentiality toggles never reach an already-built transaction
//! - Queries carry no proof; assign and transfer always do
//! - A deploy that fails validation never reaches the transport

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use prost::Message;
    use proptest::prelude::*;

    use asset_client::{
        compute_binding, verify_certificate_signature, AssetManagementApi, ClientError,
        DeployMode, DeploymentTarget, OwnershipOperation, PackagingError,
    };
    use shared_crypto::{open, SecretKey};
    use shared_types::{
        ChaincodeInvocationSpec, ChaincodeSpec, ChaincodeType, ConfidentialityLevel, Transaction,
    };

    use crate::integration::fixtures::Network;

    const CHAIN_KEY: [u8; 32] = [5u8; 32];

    fn spec_of(tx: &Transaction) -> ChaincodeSpec {
        let payload = if tx.is_confidential() {
            open(&SecretKey::from_bytes(CHAIN_KEY), &tx.payload).unwrap()
        } else {
            tx.payload.clone()
        };
        ChaincodeInvocationSpec::decode(payload.as_slice())
            .unwrap()
            .chaincode_spec
            .unwrap()
    }

    fn assign(network: &Network, asset: &str, new_owner: &[u8]) -> Transaction {
        let alice_cert = network.alice.certificate_handler().unwrap();
        network
            .service
            .build_invocation(
                network.alice.identity().as_ref(),
                alice_cert.as_ref(),
                OwnershipOperation::Assign,
                asset,
                new_owner,
            )
            .unwrap()
    }

    // =============================================================================
    // SIGNATURE INPUT LAYOUT
    // =============================================================================

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_proof_signs_input_then_binding(
            asset in "[A-Z]{3}-[0-9]{1,4}",
            new_owner in proptest::collection::vec(any::<u8>(), 1..128),
        ) {
            let (network, _) = Network::deployed(CHAIN_KEY);
            let alice = network.alice.certificate().unwrap();
            let tx = assign(&network, &asset, &new_owner);
            let spec = spec_of(&tx);
            let encoded = spec.input.unwrap().encode_to_vec();
            let binding = compute_binding(&tx.cert, &tx.nonce);

            let in_order = [encoded.as_slice(), binding.as_slice()].concat();
            prop_assert!(verify_certificate_signature(&alice, &in_order, &spec.metadata).is_ok());

            let swapped = [binding.as_slice(), encoded.as_slice()].concat();
            prop_assert!(verify_certificate_signature(&alice, &swapped, &spec.metadata).is_err());

            prop_assert!(verify_certificate_signature(&alice, &encoded, &spec.metadata).is_err());
        }
    }

    #[test]
    fn test_distinct_inputs_give_distinct_proofs() {
        let (network, _) = Network::deployed(CHAIN_KEY);
        let owner = network.bob.certificate().unwrap();

        let first = spec_of(&assign(&network, "LOT-1", &owner));
        let same_input = spec_of(&assign(&network, "LOT-1", &owner));
        let other_input = spec_of(&assign(&network, "LOT-2", &owner));

        // Same input, fresh binding.
        assert_ne!(first.metadata, same_input.metadata);
        // Different input.
        assert_ne!(first.metadata, other_input.metadata);
    }

    // =============================================================================
    // SUBMISSION IDENTIFIERS
    // =============================================================================

    #[test]
    fn test_txids_are_unique_across_constructions() {
        let (network, _) = Network::deployed(CHAIN_KEY);
        let owner = network.bob.certificate().unwrap();

        let mut txids = HashSet::new();
        for i in 0..50 {
            let invocation = assign(&network, &format!("LOT-{i}"), &owner);
            let query = network
                .service
                .build_query(network.bob.identity().as_ref(), "LOT-1")
                .unwrap();
            assert!(txids.insert(invocation.txid));
            assert!(txids.insert(query.txid));
        }
        assert_eq!(txids.len(), 100);
    }

    // =============================================================================
    // CONFIDENTIALITY TOGGLE
    // =============================================================================

    #[test]
    fn test_toggle_does_not_touch_built_transaction() {
        let (network, _) = Network::deployed(CHAIN_KEY);
        let owner = network.bob.certificate().unwrap();

        let public = assign(&network, "LOT-7", &owner);
        let snapshot = public.clone();

        network.service.session().set_confidentiality(true);
        let confidential = assign(&network, "LOT-7", &owner);

        assert_eq!(public, snapshot);
        assert!(!public.is_confidential());
        assert_eq!(spec_of(&public).confidentiality_level(), ConfidentialityLevel::Public);
        assert!(confidential.is_confidential());
        assert_eq!(
            spec_of(&confidential).confidentiality_level(),
            ConfidentialityLevel::Confidential
        );

        network.service.session().set_confidentiality(false);
        assert!(confidential.is_confidential());
    }

    // =============================================================================
    // PROOF PRESENCE
    // =============================================================================

    #[test]
    fn test_only_queries_are_unsigned() {
        let (network, _) = Network::deployed(CHAIN_KEY);
        let owner = network.carol.certificate().unwrap();
        let alice_cert = network.alice.certificate_handler().unwrap();

        let assign = assign(&network, "LOT-7", &owner);
        let transfer = network
            .service
            .build_invocation(
                network.alice.identity().as_ref(),
                alice_cert.as_ref(),
                OwnershipOperation::Transfer,
                "LOT-7",
                &owner,
            )
            .unwrap();
        let query = network
            .service
            .build_query(network.alice.identity().as_ref(), "LOT-7")
            .unwrap();

        assert!(!spec_of(&assign).metadata.is_empty());
        assert!(!spec_of(&transfer).metadata.is_empty());
        assert!(spec_of(&query).metadata.is_empty());
    }

    #[test]
    fn test_builders_require_prior_deploy() {
        let network = Network::with_chain_key(CHAIN_KEY);
        let alice_cert = network.alice.certificate_handler().unwrap();
        let owner = network.bob.certificate().unwrap();

        let invocation = network.service.build_invocation(
            network.alice.identity().as_ref(),
            alice_cert.as_ref(),
            OwnershipOperation::Assign,
            "LOT-7",
            &owner,
        );
        let query = network
            .service
            .build_query(network.bob.identity().as_ref(), "LOT-7");

        assert!(matches!(invocation, Err(ClientError::ProgramNotDeployed)));
        assert!(matches!(query, Err(ClientError::ProgramNotDeployed)));
        assert_eq!(network.ledger.submission_count(), 0);
    }

    // =============================================================================
    // DEPLOY VALIDATION
    // =============================================================================

    #[tokio::test]
    async fn test_invalid_deploy_never_reaches_transport() {
        let invalid = [
            DeploymentTarget {
                chaincode_type: ChaincodeType::Golang,
                path: "github.com/example/../escape".into(),
                mode: DeployMode::Network,
            },
            DeploymentTarget {
                chaincode_type: ChaincodeType::Car,
                path: "asset_management.tar".into(),
                mode: DeployMode::Network,
            },
            DeploymentTarget {
                chaincode_type: ChaincodeType::Undefined,
                path: "asset_management".into(),
                mode: DeployMode::Network,
            },
        ];

        for target in invalid {
            let network = Network::with_target(target);
            let admin = network.alice.certificate_handler().unwrap();

            let result = network
                .service
                .deploy(network.alice.identity().as_ref(), admin.as_ref())
                .await;

            assert!(matches!(
                result,
                Err(ClientError::Packaging(
                    PackagingError::InvalidSpec(_) | PackagingError::UnknownPlatform(_)
                ))
            ));
            assert_eq!(network.ledger.submission_count(), 0);
            assert!(network.service.session().program().get().is_none());
        }
    }

    #[tokio::test]
    async fn test_dev_mode_deploy_uses_configured_name() {
        let network = Network::with_target(DeploymentTarget {
            chaincode_type: ChaincodeType::Golang,
            path: "asset_management".into(),
            mode: DeployMode::Development {
                name: "mycc".into(),
            },
        });
        let admin = network.alice.certificate_handler().unwrap();

        let (_, program) = network
            .service
            .deploy(network.alice.identity().as_ref(), admin.as_ref())
            .await
            .unwrap();

        assert_eq!(program.as_str(), "mycc");
        assert_eq!(network.ledger.submission_count(), 1);
    }
}
