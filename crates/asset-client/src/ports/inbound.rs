//! # Inbound Ports (Driving Ports / API)
//!
//! The public API for driving the asset-management program.

use shared_types::{Response, Transaction};

use crate::domain::entities::{OwnershipOperation, ProgramId};
use crate::domain::errors::ClientError;
use crate::ports::outbound::{CertificateHandler, Identity};

/// Primary asset-management API.
///
/// Every call is sequential up to a single awaited submission. Construction
/// is all-or-nothing: a call that fails before submission sends nothing.
#[async_trait::async_trait]
pub trait AssetManagementApi: Send + Sync {
    /// Deploy the program with `admin` as administrator.
    ///
    /// On success the returned id is cached in the session for later calls.
    ///
    /// # Errors
    /// * `ClientError::Packaging` - unknown platform or invalid spec (nothing submitted)
    /// * `ClientError::DeploymentFailed` - build or submission failure, or no program name
    async fn deploy(
        &self,
        deployer: &dyn Identity,
        admin: &dyn CertificateHandler,
    ) -> Result<(Response, ProgramId), ClientError>;

    /// Submit a signed assign or transfer.
    ///
    /// The invoker signs `encode(input) ‖ binding` with `invoker_cert`.
    ///
    /// # Errors
    /// * `ClientError::ProgramNotDeployed` - no deploy in this session
    /// * `ClientError::AuthorizationBuildFailed` - certificate, binding or signing failure
    /// * `ClientError::InvocationBuildFailed` - transaction construction failure
    /// * `ClientError::SubmissionFailed` - transport failure or rejection
    async fn invoke(
        &self,
        invoker: &dyn Identity,
        invoker_cert: &dyn CertificateHandler,
        operation: OwnershipOperation,
        asset: &str,
        new_owner_cert: &[u8],
    ) -> Result<Response, ClientError>;

    /// Assign an unowned asset.
    async fn assign_ownership(
        &self,
        invoker: &dyn Identity,
        invoker_cert: &dyn CertificateHandler,
        asset: &str,
        new_owner_cert: &[u8],
    ) -> Result<Response, ClientError> {
        self.invoke(invoker, invoker_cert, OwnershipOperation::Assign, asset, new_owner_cert)
            .await
    }

    /// Transfer an owned asset.
    async fn transfer_ownership(
        &self,
        owner: &dyn Identity,
        owner_cert: &dyn CertificateHandler,
        asset: &str,
        new_owner_cert: &[u8],
    ) -> Result<Response, ClientError> {
        self.invoke(owner, owner_cert, OwnershipOperation::Transfer, asset, new_owner_cert)
            .await
    }

    /// Unsigned owner query.
    ///
    /// # Errors
    /// * `ClientError::ProgramNotDeployed` - no deploy in this session
    /// * `ClientError::QueryBuildFailed` - transaction construction failure
    /// * `ClientError::SubmissionFailed` - transport failure or rejection
    async fn who_is_the_owner(
        &self,
        invoker: &dyn Identity,
        asset: &str,
    ) -> Result<(Transaction, Response), ClientError>;
}
