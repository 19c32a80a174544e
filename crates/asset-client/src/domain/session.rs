//! # Client Session
//!
//! Explicit per-process context passed to every builder: the identity
//! registry, the confidentiality policy and the deployed program slot.
//!
//! ## Concurrency
//!
//! The policy and the program slot are independent single-field cells.
//! Readers observe either the old or the new value, never a torn one.
//! Builders read them at construction time and never cache them.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use shared_types::ConfidentialityLevel;
use tracing::info;

use crate::domain::entities::ProgramId;
use crate::domain::errors::ClientError;
use crate::domain::registry::IdentityRegistry;
use crate::ports::outbound::IdentityAuthority;

/// Process-wide PUBLIC / CONFIDENTIAL toggle.
#[derive(Debug, Default)]
pub struct ConfidentialityPolicy {
    confidential: AtomicBool,
}

impl ConfidentialityPolicy {
    pub fn new(enabled: bool) -> Self {
        Self {
            confidential: AtomicBool::new(enabled),
        }
    }

    /// Takes effect for every spec constructed afterwards.
    pub fn set_confidentiality(&self, enabled: bool) {
        self.confidential.store(enabled, Ordering::Release);
        info!(enabled, "Confidentiality updated");
    }

    pub fn is_enabled(&self) -> bool {
        self.confidential.load(Ordering::Acquire)
    }

    /// Current level, read fresh on every call.
    pub fn level(&self) -> ConfidentialityLevel {
        if self.is_enabled() {
            ConfidentialityLevel::Confidential
        } else {
            ConfidentialityLevel::Public
        }
    }
}

/// Cached identifier of the deployed program. Written only by a
/// successful deploy.
#[derive(Debug, Default)]
pub struct ProgramSlot {
    inner: RwLock<Option<ProgramId>>,
}

impl ProgramSlot {
    pub fn get(&self) -> Option<ProgramId> {
        self.inner.read().clone()
    }

    pub(crate) fn set(&self, id: ProgramId) {
        *self.inner.write() = Some(id);
    }

    /// The program id, or `ProgramNotDeployed`.
    pub fn require(&self) -> Result<ProgramId, ClientError> {
        self.get().ok_or(ClientError::ProgramNotDeployed)
    }
}

/// Session context shared by the builders of one client process.
pub struct ClientSession {
    registry: IdentityRegistry,
    confidentiality: ConfidentialityPolicy,
    program: ProgramSlot,
}

impl ClientSession {
    pub fn new(authority: Arc<dyn IdentityAuthority>) -> Self {
        Self {
            registry: IdentityRegistry::new(authority),
            confidentiality: ConfidentialityPolicy::default(),
            program: ProgramSlot::default(),
        }
    }

    pub fn registry(&self) -> &IdentityRegistry {
        &self.registry
    }

    pub fn confidentiality(&self) -> &ConfidentialityPolicy {
        &self.confidentiality
    }

    pub fn set_confidentiality(&self, enabled: bool) {
        self.confidentiality.set_confidentiality(enabled);
    }

    pub fn program(&self) -> &ProgramSlot {
        &self.program
    }
}
