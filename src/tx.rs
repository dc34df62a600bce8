//! Transaction submission surface
//!
//! Submission is split the same way the flows consume it: `simulate` for a
//! gas estimate, `send` resolving at broadcast, and `confirm` resolving at
//! on-chain fulfillment. The signing/broadcast machinery behind the trait is
//! an external collaborator; this crate only owns the decisions around it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::FlowError;
use crate::types::Amount;

/// Gas estimate from a transaction simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GasEstimate {
    pub gas_used: u64,
}

impl GasEstimate {
    /// Gas limit with headroom applied (simulations routinely under-report)
    pub fn with_margin(&self, percent: u64) -> u64 {
        self.gas_used + self.gas_used * percent / 100
    }
}

/// Fee attached to a submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fee {
    pub amount: Amount,
    pub gas_limit: u64,
}

/// Hash of a broadcast transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxHash(pub String);

impl std::fmt::Display for TxHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A bridge operation to submit (ERC20 approve or the transfer itself)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeMsg {
    pub recipient: String,
    pub amount: Amount,
    /// ERC20 contract of the bridged representation
    pub token_contract: String,
    pub memo: String,
}

/// External transaction submission collaborator
#[async_trait]
pub trait TxSubmitter: Send + Sync {
    /// Dry-run the message for a gas estimate
    async fn simulate(&self, msg: &BridgeMsg) -> Result<GasEstimate, FlowError>;

    /// Sign and broadcast an ERC20 approve for `msg.amount`. Resolves once
    /// the transaction is accepted into the mempool.
    async fn send_approve(&self, msg: &BridgeMsg, fee: &Fee) -> Result<TxHash, FlowError>;

    /// Sign and broadcast the bridge transfer. Resolves at broadcast.
    async fn send_bridge(&self, msg: &BridgeMsg, fee: &Fee) -> Result<TxHash, FlowError>;

    /// Wait for a broadcast transaction to be fulfilled on-chain. Resolves
    /// on success, errors on revert or timeout.
    async fn confirm(&self, hash: &TxHash) -> Result<(), FlowError>;
}
