//! # End-to-End Scenarios
//!
//! Each scenario drives the client service against the in-memory ledger:
//!
//! 1. **Deploy**: alice deploys, the program id is cached in the session
//! 2. **Assign**: alice assigns `LOT-7`; the proof verifies against her
//!    enrollment certificate and the binding of the submitted envelope
//! 3. **Query before assign**: succeeds with an empty owner, unsigned
//! 4. **Concurrent assigns**: distinct bindings and distinct txids

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;

    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use prost::Message;

    use asset_client::{
        compute_binding, verify_certificate_signature, AssetManagementApi, ClientError,
        OwnershipOperation, ProgramId,
    };
    use shared_crypto::{open, SecretKey};
    use shared_types::{
        to_chaincode_args, ChaincodeId, ChaincodeInvocationSpec, ChaincodeSpec,
        ConfidentialityLevel, Transaction, TransactionType,
    };

    use crate::integration::fixtures::{Network, PROGRAM_PATH};

    // =============================================================================
    // HELPERS
    // =============================================================================

    async fn deployed() -> (Network, ProgramId) {
        let network = Network::new();
        let admin = network.alice.certificate_handler().unwrap();
        let (_, program) = network
            .service
            .deploy(network.alice.identity().as_ref(), admin.as_ref())
            .await
            .unwrap();
        (network, program)
    }

    fn invocation_spec(tx: &Transaction) -> ChaincodeSpec {
        ChaincodeInvocationSpec::decode(tx.payload.as_slice())
            .unwrap()
            .chaincode_spec
            .unwrap()
    }

    fn invocations(network: &Network) -> Vec<Transaction> {
        network
            .ledger
            .submissions()
            .into_iter()
            .filter(|tx| tx.r#type() == TransactionType::ChaincodeInvoke)
            .collect()
    }

    // =============================================================================
    // SCENARIO A: DEPLOY
    // =============================================================================

    #[tokio::test]
    async fn test_deploy_populates_program_id() {
        let network = Network::new();
        assert!(network.service.session().program().get().is_none());

        let admin = network.alice.certificate_handler().unwrap();
        let (response, program) = network
            .service
            .deploy(network.alice.identity().as_ref(), admin.as_ref())
            .await
            .unwrap();

        assert!(response.is_success());
        assert_eq!(response.message(), program.as_str());
        assert_eq!(network.service.session().program().get(), Some(program.clone()));

        // The deploy addressed the program by path; the name came from packaging.
        let deploy = &network.ledger.submissions()[0];
        assert_eq!(deploy.r#type(), TransactionType::ChaincodeDeploy);
        let addressed = ChaincodeId::decode(deploy.chaincode_id.as_slice()).unwrap();
        assert_eq!(addressed.path, PROGRAM_PATH);
        assert_eq!(addressed.name, program.as_str());
    }

    #[tokio::test]
    async fn test_operations_before_deploy_are_refused() {
        let network = Network::new();
        let alice_cert = network.alice.certificate_handler().unwrap();
        let carol = network.carol.certificate().unwrap();

        let assign = network
            .service
            .assign_ownership(
                network.alice.identity().as_ref(),
                alice_cert.as_ref(),
                "LOT-7",
                &carol,
            )
            .await;
        let query = network
            .service
            .who_is_the_owner(network.alice.identity().as_ref(), "LOT-7")
            .await;

        assert!(matches!(assign, Err(ClientError::ProgramNotDeployed)));
        assert!(matches!(query, Err(ClientError::ProgramNotDeployed)));
        assert_eq!(network.ledger.submission_count(), 0);
    }

    // =============================================================================
    // SCENARIO B: SIGNED ASSIGN
    // =============================================================================

    #[tokio::test]
    async fn test_assign_proof_verifies_against_invoker_certificate() {
        let (network, program) = deployed().await;
        let alice_cert = network.alice.certificate_handler().unwrap();
        let new_owner = network.carol.certificate().unwrap();

        network
            .service
            .assign_ownership(
                network.alice.identity().as_ref(),
                alice_cert.as_ref(),
                "LOT-7",
                &new_owner,
            )
            .await
            .unwrap();

        let [tx] = invocations(&network).try_into().unwrap();
        let spec = invocation_spec(&tx);
        let input = spec.input.clone().unwrap();
        let encoded_owner = STANDARD.encode(&new_owner);
        assert_eq!(
            input.args,
            to_chaincode_args(&["assign", "LOT-7", &encoded_owner])
        );
        assert_eq!(spec.chaincode_name(), program.as_str());

        // The binding is recomputed from the envelope's one-time certificate.
        let binding = compute_binding(&tx.cert, &tx.nonce);
        let mut signed = input.encode_to_vec();
        signed.extend_from_slice(&binding);
        verify_certificate_signature(&alice_cert.certificate(), &signed, &spec.metadata).unwrap();

        // Any other binding breaks the proof.
        let foreign = compute_binding(&tx.cert, &[0u8; 32]);
        let mut forged = input.encode_to_vec();
        forged.extend_from_slice(&foreign);
        assert!(
            verify_certificate_signature(&alice_cert.certificate(), &forged, &spec.metadata)
                .is_err()
        );

        // The envelope itself is signed by the one-time certificate.
        verify_certificate_signature(&tx.cert, &tx.signing_bytes(), &tx.signature).unwrap();
        assert_ne!(tx.cert, alice_cert.certificate());

        assert_eq!(
            network.ledger.owner_of(program.as_str(), "LOT-7"),
            Some(new_owner)
        );
    }

    #[tokio::test]
    async fn test_transfer_is_signed_by_current_owner() {
        let (network, program) = deployed().await;
        let alice_cert = network.alice.certificate_handler().unwrap();
        let bob_cert = network.bob.certificate_handler().unwrap();
        let carol = network.carol.certificate().unwrap();

        network
            .service
            .assign_ownership(
                network.alice.identity().as_ref(),
                alice_cert.as_ref(),
                "LOT-7",
                &bob_cert.certificate(),
            )
            .await
            .unwrap();
        network
            .service
            .invoke(
                network.bob.identity().as_ref(),
                bob_cert.as_ref(),
                OwnershipOperation::Transfer,
                "LOT-7",
                &carol,
            )
            .await
            .unwrap();

        let transfer = invocations(&network).pop().unwrap();
        let spec = invocation_spec(&transfer);
        let input = spec.input.clone().unwrap();
        assert_eq!(input.args[0], b"transfer");

        let mut signed = input.encode_to_vec();
        signed.extend_from_slice(&compute_binding(&transfer.cert, &transfer.nonce));
        verify_certificate_signature(&bob_cert.certificate(), &signed, &spec.metadata).unwrap();
        assert!(
            verify_certificate_signature(&alice_cert.certificate(), &signed, &spec.metadata)
                .is_err()
        );

        assert_eq!(network.ledger.owner_of(program.as_str(), "LOT-7"), Some(carol));
    }

    // =============================================================================
    // SCENARIO C: QUERY BEFORE ASSIGN
    // =============================================================================

    #[tokio::test]
    async fn test_query_before_assign_returns_unset_owner() {
        let (network, program) = deployed().await;

        let (tx, response) = network
            .service
            .who_is_the_owner(network.bob.identity().as_ref(), "LOT-7")
            .await
            .unwrap();

        assert!(response.is_success());
        assert!(response.msg.is_empty());
        assert_eq!(tx.r#type(), TransactionType::ChaincodeQuery);

        let spec = invocation_spec(&tx);
        assert!(spec.metadata.is_empty());
        assert_eq!(spec.chaincode_name(), program.as_str());
        assert_eq!(spec.input.unwrap().args, to_chaincode_args(&["query", "LOT-7"]));
    }

    #[tokio::test]
    async fn test_query_after_assign_returns_owner() {
        let (network, _) = deployed().await;
        let alice_cert = network.alice.certificate_handler().unwrap();
        let bob = network.bob.certificate().unwrap();

        network
            .service
            .assign_ownership(
                network.alice.identity().as_ref(),
                alice_cert.as_ref(),
                "LOT-9",
                &bob,
            )
            .await
            .unwrap();
        let (_, response) = network
            .service
            .who_is_the_owner(network.carol.identity().as_ref(), "LOT-9")
            .await
            .unwrap();

        assert_eq!(response.msg, bob);
    }

    // =============================================================================
    // SCENARIO D: CONCURRENT ASSIGNS
    // =============================================================================

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_assigns_get_distinct_bindings() {
        let (network, program) = deployed().await;
        let network = Arc::new(network);
        let new_owner = network.bob.certificate().unwrap();

        let tasks: Vec<_> = ["LOT-1", "LOT-2"]
            .into_iter()
            .map(|asset| {
                let network = Arc::clone(&network);
                let new_owner = new_owner.clone();
                tokio::spawn(async move {
                    let alice_cert = network.alice.certificate_handler().unwrap();
                    network
                        .service
                        .assign_ownership(
                            network.alice.identity().as_ref(),
                            alice_cert.as_ref(),
                            asset,
                            &new_owner,
                        )
                        .await
                        .unwrap()
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        let submitted = invocations(&network);
        assert_eq!(submitted.len(), 2);

        let bindings: HashSet<_> = submitted
            .iter()
            .map(|tx| compute_binding(&tx.cert, &tx.nonce))
            .collect();
        let txids: HashSet<_> = submitted.iter().map(|tx| tx.txid.clone()).collect();
        assert_eq!(bindings.len(), 2);
        assert_eq!(txids.len(), 2);

        assert_eq!(network.ledger.owner_of(program.as_str(), "LOT-1"), Some(new_owner.clone()));
        assert_eq!(network.ledger.owner_of(program.as_str(), "LOT-2"), Some(new_owner));
    }

    // =============================================================================
    // CONFIDENTIAL MODE
    // =============================================================================

    #[tokio::test]
    async fn test_confidential_assign_round_trips_through_ledger() {
        let network = Network::with_chain_key([9u8; 32]);
        network.service.session().set_confidentiality(true);

        let admin = network.alice.certificate_handler().unwrap();
        let (_, program) = network
            .service
            .deploy(network.alice.identity().as_ref(), admin.as_ref())
            .await
            .unwrap();
        let bob = network.bob.certificate().unwrap();
        network
            .service
            .assign_ownership(
                network.alice.identity().as_ref(),
                admin.as_ref(),
                "LOT-7",
                &bob,
            )
            .await
            .unwrap();

        let [tx] = invocations(&network).try_into().unwrap();
        assert!(tx.is_confidential());
        assert_eq!(tx.confidentiality_protocol_version, "1.2");

        let plaintext = open(&SecretKey::from_bytes([9u8; 32]), &tx.payload).unwrap();
        let spec = ChaincodeInvocationSpec::decode(plaintext.as_slice())
            .unwrap()
            .chaincode_spec
            .unwrap();
        assert_eq!(spec.confidentiality_level(), ConfidentialityLevel::Confidential);
        assert_eq!(network.ledger.owner_of(program.as_str(), "LOT-7"), Some(bob));
    }
}
