//! # Identity Registry
//!
//! Maps human-readable roles to enrolled identities for the lifetime of the
//! process. There is no unregistration.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::domain::errors::ClientError;
use crate::ports::outbound::{CertificateHandler, Identity, IdentityAuthority};

/// A registered role and its identity.
pub struct RegisteredIdentity {
    role: String,
    identity: Arc<dyn Identity>,
    enrollment: OnceLock<Arc<dyn CertificateHandler>>,
}

impl RegisteredIdentity {
    pub fn role(&self) -> &str {
        &self.role
    }

    pub fn identity(&self) -> &Arc<dyn Identity> {
        &self.identity
    }

    /// The enrollment certificate handler, fetched once and then cached.
    pub fn certificate_handler(&self) -> Result<Arc<dyn CertificateHandler>, ClientError> {
        if let Some(handler) = self.enrollment.get() {
            return Ok(Arc::clone(handler));
        }
        let handler = self
            .identity
            .enrollment_certificate_handler()
            .map_err(|source| ClientError::CertificateUnavailable {
                role: self.role.clone(),
                source,
            })?;
        Ok(Arc::clone(self.enrollment.get_or_init(|| handler)))
    }

    /// Enrollment certificate bytes.
    pub fn certificate(&self) -> Result<Vec<u8>, ClientError> {
        Ok(self.certificate_handler()?.certificate())
    }
}

impl std::fmt::Debug for RegisteredIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredIdentity")
            .field("role", &self.role)
            .field("username", &self.identity.username())
            .finish()
    }
}

/// Role → identity mapping backed by an identity authority.
pub struct IdentityRegistry {
    authority: Arc<dyn IdentityAuthority>,
    entries: RwLock<HashMap<String, Arc<RegisteredIdentity>>>,
}

impl IdentityRegistry {
    pub fn new(authority: Arc<dyn IdentityAuthority>) -> Self {
        Self {
            authority,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Register `role` with the authority as `username` and store the
    /// derived identity.
    pub fn register(
        &self,
        role: &str,
        username: &str,
        secret: &str,
    ) -> Result<Arc<RegisteredIdentity>, ClientError> {
        if self.entries.read().contains_key(role) {
            return Err(ClientError::RoleAlreadyRegistered(role.to_string()));
        }

        let registration_failed = |source| ClientError::Registration {
            role: role.to_string(),
            source,
        };
        self.authority
            .register(role, None, username, secret)
            .map_err(|e| {
                warn!(role, username, error = %e, "Registration rejected");
                registration_failed(e)
            })?;
        let identity = self
            .authority
            .derive_identity(username, None)
            .map_err(registration_failed)?;

        let entry = Arc::new(RegisteredIdentity {
            role: role.to_string(),
            identity,
            enrollment: OnceLock::new(),
        });

        let mut entries = self.entries.write();
        if entries.contains_key(role) {
            return Err(ClientError::RoleAlreadyRegistered(role.to_string()));
        }
        entries.insert(role.to_string(), Arc::clone(&entry));
        info!(role, username, "Identity registered");
        Ok(entry)
    }

    pub fn get(&self, role: &str) -> Result<Arc<RegisteredIdentity>, ClientError> {
        self.entries
            .read()
            .get(role)
            .cloned()
            .ok_or_else(|| ClientError::UnknownRole(role.to_string()))
    }

    /// Enrollment certificate of a registered role.
    pub fn certificate(&self, role: &str) -> Result<Vec<u8>, ClientError> {
        let entry = self.get(role)?;
        let cert = entry.certificate()?;
        debug!(role, len = cert.len(), "Certificate resolved");
        Ok(cert)
    }

    /// Registered roles, sorted.
    pub fn roles(&self) -> Vec<String> {
        let mut roles: Vec<String> = self.entries.read().keys().cloned().collect();
        roles.sort();
        roles
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::membership::MembershipService;
    use crate::domain::errors::IdentityError;
    use crate::ports::outbound::TransactionCertificate;
    use shared_types::{ChaincodeDeploymentSpec, ChaincodeInvocationSpec, Transaction};

    fn registry() -> IdentityRegistry {
        let membership = MembershipService::new(None);
        membership.provision("diego", "DRJ23pEQl16a");
        membership.provision("binhn", "7avZQLwcUe9q");
        IdentityRegistry::new(Arc::new(membership))
    }

    #[test]
    fn test_register_and_lookup() {
        let registry = registry();
        registry.register("charlie", "diego", "DRJ23pEQl16a").unwrap();
        registry.register("dave", "binhn", "7avZQLwcUe9q").unwrap();

        assert_eq!(registry.get("charlie").unwrap().identity().username(), "diego");
        assert_eq!(registry.roles(), vec!["charlie".to_string(), "dave".to_string()]);
        assert_ne!(
            registry.certificate("charlie").unwrap(),
            registry.certificate("dave").unwrap()
        );
    }

    #[test]
    fn test_certificate_is_cached() {
        let registry = registry();
        let entry = registry.register("charlie", "diego", "DRJ23pEQl16a").unwrap();
        assert_eq!(entry.certificate().unwrap(), entry.certificate().unwrap());
    }

    #[test]
    fn test_rejected_secret() {
        let err = registry().register("charlie", "diego", "nope").unwrap_err();
        assert!(matches!(
            err,
            ClientError::Registration {
                source: IdentityError::SecretRejected(_),
                ..
            }
        ));
    }

    #[test]
    fn test_unknown_backend_user() {
        let err = registry().register("mallory", "mallory", "x").unwrap_err();
        assert!(matches!(
            err,
            ClientError::Registration {
                source: IdentityError::UnknownUser(_),
                ..
            }
        ));
    }

    #[test]
    fn test_duplicate_role() {
        let registry = registry();
        registry.register("charlie", "diego", "DRJ23pEQl16a").unwrap();
        let err = registry.register("charlie", "binhn", "7avZQLwcUe9q").unwrap_err();
        assert!(matches!(err, ClientError::RoleAlreadyRegistered(_)));
    }

    #[test]
    fn test_unknown_role() {
        assert!(matches!(registry().get("edwina"), Err(ClientError::UnknownRole(_))));
    }

    struct Unenrolled;

    impl Identity for Unenrolled {
        fn username(&self) -> &str {
            "pending"
        }

        fn next_certificate_handler(
            &self,
        ) -> Result<Box<dyn TransactionCertificate>, IdentityError> {
            Err(IdentityError::NotEnrolled("pending".into()))
        }

        fn enrollment_certificate_handler(
            &self,
        ) -> Result<Arc<dyn CertificateHandler>, IdentityError> {
            Err(IdentityError::NotEnrolled("pending".into()))
        }

        fn new_deploy_transaction(
            &self,
            _spec: &ChaincodeDeploymentSpec,
            _txid: &str,
        ) -> Result<Transaction, IdentityError> {
            Err(IdentityError::NotEnrolled("pending".into()))
        }

        fn new_query_transaction(
            &self,
            _spec: &ChaincodeInvocationSpec,
            _txid: &str,
        ) -> Result<Transaction, IdentityError> {
            Err(IdentityError::NotEnrolled("pending".into()))
        }
    }

    struct PendingAuthority;

    impl IdentityAuthority for PendingAuthority {
        fn register(
            &self,
            _role: &str,
            _metadata: Option<&[u8]>,
            _username: &str,
            _secret: &str,
        ) -> Result<(), IdentityError> {
            Ok(())
        }

        fn derive_identity(
            &self,
            _username: &str,
            _metadata: Option<&[u8]>,
        ) -> Result<Arc<dyn Identity>, IdentityError> {
            Ok(Arc::new(Unenrolled))
        }
    }

    #[test]
    fn test_certificate_unavailable_before_enrollment() {
        let registry = IdentityRegistry::new(Arc::new(PendingAuthority));
        registry.register("bob", "pending", "x").unwrap();

        let err = registry.certificate("bob").unwrap_err();
        assert!(matches!(
            err,
            ClientError::CertificateUnavailable { ref role, .. } if role == "bob"
        ));
    }
}
