//! # Asset Management Service
//!
//! Application service implementing [`AssetManagementApi`].
//!
//! ## Architecture
//!
//! - Reads the confidentiality level and program id from the [`ClientSession`]
//!   at construction time
//! - Uses the outbound `PlatformResolver` for deploy validation and packaging
//! - Uses the outbound `LedgerTransport` for the single submission of each call
//!
//! Construction is synchronous and completes before the submission is
//! awaited, so no single-use token outlives its call.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use shared_types::{
    new_transaction_id, ChaincodeDeploymentSpec, ExecutionEnvironment, Response, Transaction,
};
use tracing::{debug, info, warn};

use crate::domain::entities::{DeployMode, DeploymentTarget, OwnershipOperation, ProgramId};
use crate::domain::errors::{AuthorizationError, ClientError, DeploymentError, TransportError};
use crate::domain::session::ClientSession;
use crate::domain::spec::{
    compose_signature_input, deployment_spec, encode_input, invocation_spec, ownership_input,
    query_spec,
};
use crate::ports::inbound::AssetManagementApi;
use crate::ports::outbound::{CertificateHandler, Identity, LedgerTransport, PlatformResolver};

/// Asset management service.
pub struct AssetManagementService<T: LedgerTransport, P: PlatformResolver> {
    session: Arc<ClientSession>,
    platforms: P,
    transport: T,
    target: DeploymentTarget,
}

impl<T: LedgerTransport, P: PlatformResolver> AssetManagementService<T, P> {
    /// Create a service for one deployment target.
    ///
    /// # Arguments
    /// * `session` - Shared session context
    /// * `platforms` - Packaging platforms used by `deploy`
    /// * `transport` - Network transport for every submission
    /// * `target` - Program type, path and deploy mode
    pub fn new(
        session: Arc<ClientSession>,
        platforms: P,
        transport: T,
        target: DeploymentTarget,
    ) -> Self {
        Self {
            session,
            platforms,
            transport,
            target,
        }
    }

    pub fn session(&self) -> &Arc<ClientSession> {
        &self.session
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Submit one transaction. Non-success responses are rejections.
    ///
    /// # Errors
    /// * `ClientError::SubmissionFailed` - transport error, returned verbatim
    pub async fn submit(&self, transaction: &Transaction) -> Result<Response, ClientError> {
        self.send(transaction)
            .await
            .map_err(ClientError::SubmissionFailed)
    }

    async fn send(&self, transaction: &Transaction) -> Result<Response, TransportError> {
        let response = self.transport.process_transaction(transaction).await?;
        if !response.is_success() {
            return Err(TransportError::Rejected(response.message()));
        }
        info!(txid = %transaction.txid, kind = ?transaction.r#type(), "Transaction accepted");
        Ok(response)
    }

    /// Build the deploy transaction and the program id it will create.
    ///
    /// Nothing is submitted. Platform validation and packaging run only in
    /// network mode.
    pub fn prepare_deployment(
        &self,
        deployer: &dyn Identity,
        admin: &dyn CertificateHandler,
    ) -> Result<(Transaction, ProgramId), ClientError> {
        let level = self.session.confidentiality().level();
        let mut spec = deployment_spec(&self.target, admin.certificate(), level);

        let code_package = match &self.target.mode {
            DeployMode::Network => {
                let platform = self.platforms.platform_for(spec.r#type)?;
                platform.validate_spec(&spec)?;
                let packaged = platform.package(&spec)?;
                spec.chaincode_id.get_or_insert_with(Default::default).name = packaged.name;
                packaged.code_package
            }
            DeployMode::Development { .. } => {
                debug!("Program already running, skipping packaging");
                Vec::new()
            }
        };

        let program = ProgramId::new(spec.chaincode_name()).ok_or(
            ClientError::DeploymentFailed(DeploymentError::MissingProgramName),
        )?;

        let deployment = ChaincodeDeploymentSpec {
            chaincode_spec: Some(spec),
            effective_date: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or_default(),
            code_package,
            exec_env: ExecutionEnvironment::Docker as i32,
        };

        let transaction = deployer
            .new_deploy_transaction(&deployment, &new_transaction_id())
            .map_err(|e| ClientError::DeploymentFailed(DeploymentError::Transaction(e)))?;
        debug!(txid = %transaction.txid, program = %program, "Deploy transaction built");
        Ok((transaction, program))
    }

    /// Build a signed assign/transfer transaction without submitting it.
    ///
    /// The invoker signs `encode(input) ‖ binding`, where the binding comes
    /// from a fresh one-time certificate of `invoker`.
    pub fn build_invocation(
        &self,
        invoker: &dyn Identity,
        invoker_cert: &dyn CertificateHandler,
        operation: OwnershipOperation,
        asset: &str,
        new_owner_cert: &[u8],
    ) -> Result<Transaction, ClientError> {
        let program = self.session.program().require()?;
        let authorization = ClientError::AuthorizationBuildFailed;

        let certificate = invoker
            .next_certificate_handler()
            .map_err(|e| authorization(AuthorizationError::CertificateHandler(e)))?;
        let mut handler = certificate
            .into_transaction_handler()
            .map_err(|e| authorization(AuthorizationError::TransactionHandler(e)))?;
        let binding = handler
            .binding()
            .map_err(|e| authorization(AuthorizationError::Binding(e)))?;

        let input = ownership_input(operation, asset, new_owner_cert);
        let signature_input = compose_signature_input(encode_input(&input), binding);
        let signature = invoker_cert
            .sign(signature_input.as_bytes())
            .map_err(|e| authorization(AuthorizationError::Signing(e)))?;

        let level = self.session.confidentiality().level();
        let spec = invocation_spec(&program, input, signature, level);
        let transaction = handler
            .new_chaincode_execute(&spec, &new_transaction_id())
            .map_err(ClientError::InvocationBuildFailed)?;
        debug!(
            txid = %transaction.txid,
            operation = ?operation,
            asset,
            "Invocation built"
        );
        Ok(transaction)
    }

    /// Build an unsigned owner query without submitting it.
    pub fn build_query(
        &self,
        invoker: &dyn Identity,
        asset: &str,
    ) -> Result<Transaction, ClientError> {
        let program = self.session.program().require()?;
        let level = self.session.confidentiality().level();
        let spec = query_spec(&program, asset, level);
        invoker
            .new_query_transaction(&spec, &new_transaction_id())
            .map_err(ClientError::QueryBuildFailed)
    }
}

#[async_trait::async_trait]
impl<T: LedgerTransport, P: PlatformResolver> AssetManagementApi
    for AssetManagementService<T, P>
{
    async fn deploy(
        &self,
        deployer: &dyn Identity,
        admin: &dyn CertificateHandler,
    ) -> Result<(Response, ProgramId), ClientError> {
        let (transaction, program) = self.prepare_deployment(deployer, admin)?;

        let response = self.send(&transaction).await.map_err(|e| {
            warn!(program = %program, error = %e, "Deployment failed");
            ClientError::DeploymentFailed(DeploymentError::Submission(e))
        })?;

        self.session.program().set(program.clone());
        info!(program = %program, deployer = deployer.username(), "Program deployed");
        Ok((response, program))
    }

    async fn invoke(
        &self,
        invoker: &dyn Identity,
        invoker_cert: &dyn CertificateHandler,
        operation: OwnershipOperation,
        asset: &str,
        new_owner_cert: &[u8],
    ) -> Result<Response, ClientError> {
        let transaction =
            self.build_invocation(invoker, invoker_cert, operation, asset, new_owner_cert)?;
        self.submit(&transaction).await
    }

    async fn who_is_the_owner(
        &self,
        invoker: &dyn Identity,
        asset: &str,
    ) -> Result<(Transaction, Response), ClientError> {
        let transaction = self.build_query(invoker, asset)?;
        let response = self.submit(&transaction).await?;
        Ok((transaction, response))
    }
}
