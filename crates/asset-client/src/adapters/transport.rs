//! # Ledger Transports
//!
//! - [`HttpLedgerTransport`]: protobuf over HTTP to a validating peer
//! - [`InMemoryLedger`]: local ledger for offline runs and tests
//!
//! Neither retries. A transaction is sent exactly once per call.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use parking_lot::Mutex;
use prost::Message;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use shared_crypto::{open, SecretKey};
use shared_types::{
    ChaincodeDeploymentSpec, ChaincodeInvocationSpec, Response, Transaction, TransactionType,
};
use tracing::{debug, info, warn};

use crate::domain::entities::OperationKind;
use crate::domain::errors::TransportError;
use crate::ports::outbound::LedgerTransport;

const PROTOBUF: &str = "application/x-protobuf";

// =============================================================================
// HTTP
// =============================================================================

/// Sends transactions to `{peer}/transactions`.
pub struct HttpLedgerTransport {
    client: Client,
    endpoint: String,
    timeout: Duration,
}

impl HttpLedgerTransport {
    /// Create a transport for `peer_address` (`host:port` or a full URL).
    pub fn new(peer_address: &str, timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| TransportError::Http(e.to_string()))?;

        let base = if peer_address.contains("://") {
            peer_address.to_string()
        } else {
            format!("http://{peer_address}")
        };

        Ok(Self {
            client,
            endpoint: format!("{}/transactions", base.trim_end_matches('/')),
            timeout,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait::async_trait]
impl LedgerTransport for HttpLedgerTransport {
    async fn process_transaction(
        &self,
        transaction: &Transaction,
    ) -> Result<Response, TransportError> {
        debug!(txid = %transaction.txid, endpoint = %self.endpoint, "Submitting transaction");

        let reply = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, PROTOBUF)
            .body(transaction.encode_to_vec())
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TransportError::Timeout(self.timeout)
                } else if e.is_connect() {
                    TransportError::Connection(format!("Cannot connect to {}", self.endpoint))
                } else {
                    TransportError::Http(e.to_string())
                }
            })?;

        let status = reply.status();
        if !status.is_success() {
            return Err(TransportError::Http(format!("peer answered {status}")));
        }

        let body = reply
            .bytes()
            .await
            .map_err(|e| TransportError::Http(e.to_string()))?;
        let response = Response::decode(body.as_ref())?;
        if !response.is_success() {
            return Err(TransportError::Rejected(response.message()));
        }
        Ok(response)
    }
}

// =============================================================================
// IN-MEMORY
// =============================================================================

#[derive(Default)]
struct LedgerState {
    submissions: Vec<Transaction>,
    programs: HashSet<String>,
    owners: HashMap<(String, String), Vec<u8>>,
}

/// Local ledger that records every submission and tracks asset owners.
///
/// Deploys answer with the program name, invocations with the txid and
/// queries with the owner certificate (empty when unset). Nothing is
/// access-controlled.
#[derive(Default)]
pub struct InMemoryLedger {
    chain_key: Option<SecretKey>,
    state: Mutex<LedgerState>,
}

impl InMemoryLedger {
    pub fn new(chain_key: Option<SecretKey>) -> Self {
        Self {
            chain_key,
            state: Mutex::new(LedgerState::default()),
        }
    }

    pub fn submission_count(&self) -> usize {
        self.state.lock().submissions.len()
    }

    /// Every transaction received, in arrival order.
    pub fn submissions(&self) -> Vec<Transaction> {
        self.state.lock().submissions.clone()
    }

    /// Recorded owner certificate of `asset` under `program`.
    pub fn owner_of(&self, program: &str, asset: &str) -> Option<Vec<u8>> {
        self.state
            .lock()
            .owners
            .get(&(program.to_string(), asset.to_string()))
            .cloned()
    }

    fn plaintext(&self, transaction: &Transaction) -> Result<Vec<u8>, TransportError> {
        if !transaction.is_confidential() {
            return Ok(transaction.payload.clone());
        }
        let key = self.chain_key.as_ref().ok_or_else(|| {
            TransportError::Rejected("no chain key for confidential payload".into())
        })?;
        open(key, &transaction.payload).map_err(|e| TransportError::Rejected(e.to_string()))
    }

    fn apply(
        &self,
        state: &mut LedgerState,
        transaction: &Transaction,
    ) -> Result<Response, TransportError> {
        let payload = self.plaintext(transaction)?;
        match transaction.r#type() {
            TransactionType::ChaincodeDeploy => {
                let spec = ChaincodeDeploymentSpec::decode(payload.as_slice())?;
                let name = spec
                    .chaincode_spec
                    .as_ref()
                    .map(|s| s.chaincode_name().to_string())
                    .unwrap_or_default();
                if name.is_empty() {
                    return Ok(Response::failure("deployment carries no program name"));
                }
                state.programs.insert(name.clone());
                info!(program = %name, "Program deployed");
                Ok(Response::success(name))
            }
            TransactionType::ChaincodeInvoke => {
                let (program, args) = invocation_args(&payload)?;
                if !state.programs.contains(&program) {
                    return Ok(Response::failure(format!("program {program} not deployed")));
                }
                let [operation, asset, owner] = args.as_slice() else {
                    return Ok(Response::failure("expected 3 arguments"));
                };
                let operation = String::from_utf8_lossy(operation);
                if operation != OperationKind::Assign.as_str()
                    && operation != OperationKind::Transfer.as_str()
                {
                    return Ok(Response::failure(format!("unknown operation {operation}")));
                }
                let Ok(owner) = STANDARD.decode(owner) else {
                    return Ok(Response::failure("owner is not base64"));
                };
                let asset = String::from_utf8_lossy(asset).into_owned();
                state.owners.insert((program, asset), owner);
                Ok(Response::success(transaction.txid.clone()))
            }
            TransactionType::ChaincodeQuery => {
                let (program, args) = invocation_args(&payload)?;
                let Some(asset) = args.get(1) else {
                    return Ok(Response::failure("expected asset argument"));
                };
                let asset = String::from_utf8_lossy(asset).into_owned();
                let owner = state.owners.get(&(program, asset)).cloned().unwrap_or_default();
                Ok(Response::success(owner))
            }
            other => Ok(Response::failure(format!("unsupported transaction type {other:?}"))),
        }
    }
}

fn invocation_args(payload: &[u8]) -> Result<(String, Vec<Vec<u8>>), TransportError> {
    let spec = ChaincodeInvocationSpec::decode(payload)?;
    let inner = spec.chaincode_spec.unwrap_or_default();
    let program = inner.chaincode_name().to_string();
    let args = inner.input.map(|input| input.args).unwrap_or_default();
    Ok((program, args))
}

#[async_trait::async_trait]
impl LedgerTransport for InMemoryLedger {
    async fn process_transaction(
        &self,
        transaction: &Transaction,
    ) -> Result<Response, TransportError> {
        let mut state = self.state.lock();
        state.submissions.push(transaction.clone());
        let response = self.apply(&mut state, transaction)?;
        if !response.is_success() {
            warn!(txid = %transaction.txid, reason = %response.message(), "Transaction rejected");
            return Err(TransportError::Rejected(response.message()));
        }
        Ok(response)
    }
}
