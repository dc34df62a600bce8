//! Bridge phase controller
//!
//! Drives the three-phase flow for moving a native asset to its ERC20
//! representation (or back): `Configure → Approve → Bridge`. Whether the
//! `Approve` phase is needed at all is decided by comparing the fetched
//! on-chain allowance against the transfer amount in minimal units.
//!
//! The transition decision is a pure function (`decide_transition`); the
//! controller wraps it with form state, the submission flow, and a shared
//! generation counter (`CancelHandle`) so results of abandoned async
//! operations are dropped instead of mutating a flow the user has already
//! left.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::{debug, info};

use crate::config::FlowConfig;
use crate::error::FlowError;
use crate::notify::{Notification, Notifier};
use crate::queries::{AllowanceQuerier, QueryState};
use crate::tx::{BridgeMsg, Fee, GasEstimate, TxSubmitter};
use crate::types::{Amount, Currency};

/// Phase of the bridge flow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgePhase {
    /// Entering recipient and amount (initial and safe state)
    Configure,
    /// An ERC20 approve is required before the transfer
    Approve,
    /// Allowance is sufficient; the transfer itself can be submitted
    Bridge,
}

impl BridgePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            BridgePhase::Configure => "configure",
            BridgePhase::Approve => "approve",
            BridgePhase::Bridge => "bridge",
        }
    }
}

impl std::fmt::Display for BridgePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Decide where `Configure` transitions to, given the allowance snapshot and
/// the transfer amount in minimal units.
///
/// The allowance must have settled successfully. A fetching, failed, or
/// empty snapshot blocks the transition with `AllowanceUnavailable`: the
/// caller surfaces the error and stays in `Configure` (never a silent
/// backward navigation).
pub fn decide_transition(
    allowance: &QueryState<Amount>,
    amount: &Amount,
) -> Result<BridgePhase, FlowError> {
    if let Some(error) = &allowance.error {
        return Err(FlowError::AllowanceUnavailable {
            reason: format!("allowance query failed: {}", error),
        });
    }
    if allowance.is_fetching {
        return Err(FlowError::AllowanceUnavailable {
            reason: "allowance query still in flight".to_string(),
        });
    }
    let current = match &allowance.value {
        Some(value) => value,
        None => {
            return Err(FlowError::AllowanceUnavailable {
                reason: "allowance query has not completed".to_string(),
            })
        }
    };

    if current.minimal >= amount.minimal {
        Ok(BridgePhase::Bridge)
    } else {
        Ok(BridgePhase::Approve)
    }
}

/// Invalidates a flow's in-flight operations from outside the flow.
///
/// The host keeps one per mounted flow and calls `cancel` on navigation or
/// unmount. The flow methods hold an exclusive borrow across their awaits,
/// so this handle is the only way the generation can move while an
/// operation is suspended: when it does, the resuming operation discards
/// its result instead of transitioning phase or pushing notifications.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    generation: Arc<AtomicU64>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }
}

/// Recipient and amount as entered by the user
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BridgeForm {
    pub recipient: String,
    /// Display-unit amount string, converted at each transition (never from
    /// a stale closure)
    pub amount_input: String,
}

/// The bridge flow controller
///
/// Owns its phase exclusively; one instance per flow. All chain access goes
/// through the querier/submitter collaborators, and every failure crossing
/// that boundary is converted to a `FlowError` and surfaced through the
/// notifier instead of propagating.
pub struct BridgeFlow<Q, S, N> {
    querier: Q,
    submitter: S,
    notifier: N,

    owner: String,
    spender: String,
    token_contract: String,
    currency: Currency,

    phase: BridgePhase,
    form: BridgeForm,
    gas_estimate: Option<GasEstimate>,
    gas_margin_percent: u64,
    /// Bumped on reset, phase change, or external cancellation; async
    /// results carrying an older generation are discarded. Shared with
    /// `CancelHandle`s so the host can bump it while an operation is
    /// suspended.
    generation: Arc<AtomicU64>,
}

impl<Q, S, N> BridgeFlow<Q, S, N>
where
    Q: AllowanceQuerier,
    S: TxSubmitter,
    N: Notifier,
{
    pub fn new(
        querier: Q,
        submitter: S,
        notifier: N,
        owner: impl Into<String>,
        spender: impl Into<String>,
        token_contract: impl Into<String>,
        currency: Currency,
    ) -> Self {
        Self {
            querier,
            submitter,
            notifier,
            owner: owner.into(),
            spender: spender.into(),
            token_contract: token_contract.into(),
            currency,
            phase: BridgePhase::Configure,
            form: BridgeForm::default(),
            gas_estimate: None,
            gas_margin_percent: 30,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Build a flow for the configured asset: the bridge contract is the
    /// allowance spender
    pub fn from_config(
        querier: Q,
        submitter: S,
        notifier: N,
        owner: impl Into<String>,
        config: &FlowConfig,
    ) -> Self {
        let mut flow = Self::new(
            querier,
            submitter,
            notifier,
            owner,
            config.bridge_contract.clone(),
            config.token_contract.clone(),
            config.currency(),
        );
        flow.gas_margin_percent = config.gas_margin_percent;
        flow
    }

    pub fn phase(&self) -> BridgePhase {
        self.phase
    }

    pub fn form(&self) -> &BridgeForm {
        &self.form
    }

    pub fn gas_estimate(&self) -> Option<GasEstimate> {
        self.gas_estimate
    }

    /// Gas limit to offer the user: last simulation plus headroom
    pub fn suggested_gas_limit(&self) -> Option<u64> {
        self.gas_estimate
            .map(|e| e.with_margin(self.gas_margin_percent))
    }

    /// Handle the host holds to invalidate in-flight operations (navigation
    /// away, unmount)
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            generation: self.generation.clone(),
        }
    }

    pub fn set_recipient(&mut self, recipient: impl Into<String>) {
        self.form.recipient = recipient.into();
    }

    pub fn set_amount(&mut self, amount_input: impl Into<String>) {
        self.form.amount_input = amount_input.into();
    }

    /// Back to `Configure`, dropping the cached gas estimate. Pending async
    /// results are invalidated. The form is kept so navigation does not eat
    /// user input.
    pub fn reset(&mut self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.phase = BridgePhase::Configure;
        self.gas_estimate = None;
    }

    /// The transfer amount as of *right now*, parsed from the form
    fn current_amount(&self) -> Result<Amount, FlowError> {
        Amount::from_display(&self.form.amount_input, self.currency.clone())
    }

    fn current_msg(&self) -> Result<BridgeMsg, FlowError> {
        Ok(BridgeMsg {
            recipient: self.form.recipient.clone(),
            amount: self.current_amount()?,
            token_contract: self.token_contract.clone(),
            memo: String::new(),
        })
    }

    fn enter(&mut self, phase: BridgePhase) {
        debug!(from = %self.phase, to = %phase, "bridge phase transition");
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.phase = phase;
    }

    fn current_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    fn surface(&self, error: &FlowError) {
        self.notifier.push(Notification::error(error.to_string()));
    }

    /// Leave `Configure`: fetch the allowance and move to `Approve` or
    /// straight to `Bridge`.
    ///
    /// The amount is converted from the form *after* the allowance fetch
    /// returns, so an edit made while the query was in flight is honored. On
    /// any error the flow stays in `Configure` and the error is surfaced.
    pub async fn proceed(&mut self) -> Result<BridgePhase, FlowError> {
        if self.phase != BridgePhase::Configure {
            return Ok(self.phase);
        }
        let generation = self.current_generation();

        let allowance = self
            .querier
            .allowance(&self.owner, &self.spender, &self.token_contract)
            .await;

        if self.current_generation() != generation {
            debug!("allowance result for an abandoned flow, discarding");
            return Ok(self.phase);
        }

        let amount = match self.current_amount() {
            Ok(amount) => amount,
            Err(e) => {
                self.surface(&e);
                return Err(e);
            }
        };

        match decide_transition(&allowance, &amount) {
            Ok(BridgePhase::Bridge) => {
                info!(amount = %amount, "allowance sufficient, skipping approve");
                self.enter(BridgePhase::Bridge);
                Ok(BridgePhase::Bridge)
            }
            Ok(phase) => {
                self.enter(phase);
                Ok(phase)
            }
            Err(e) => {
                self.surface(&e);
                Err(e)
            }
        }
    }

    /// Submit the ERC20 approve and wait for it to confirm.
    ///
    /// On success the cached gas estimate is cleared and the flow returns to
    /// `Configure` with the form pre-filled, so the next `proceed` re-checks
    /// the allowance. On failure the flow remains in `Approve`.
    pub async fn approve(&mut self, fee: Fee) -> Result<BridgePhase, FlowError> {
        if self.phase != BridgePhase::Approve {
            return Ok(self.phase);
        }
        let generation = self.current_generation();
        let msg = match self.current_msg() {
            Ok(msg) => msg,
            Err(e) => {
                self.surface(&e);
                return Err(e);
            }
        };

        let result = self.run_approve(&msg, &fee).await;

        if self.current_generation() != generation {
            debug!("approve result for an abandoned flow, discarding");
            return Ok(self.phase);
        }

        match result {
            Ok(()) => {
                self.gas_estimate = None;
                self.enter(BridgePhase::Configure);
                self.notifier.push(Notification::success(format!(
                    "Approved {} for bridging",
                    msg.amount
                )));
                Ok(BridgePhase::Configure)
            }
            Err(e) => {
                // Stay in Approve so the user can retry
                self.surface(&e);
                Err(e)
            }
        }
    }

    async fn run_approve(&mut self, msg: &BridgeMsg, fee: &Fee) -> Result<(), FlowError> {
        let estimate = self.submitter.simulate(msg).await?;
        self.gas_estimate = Some(estimate);

        let hash = self.submitter.send_approve(msg, fee).await?;
        info!(tx_hash = %hash, "approve broadcast");

        self.submitter.confirm(&hash).await
    }

    /// Submit the bridge transfer itself.
    ///
    /// Any failure (simulate, send, or confirm) is non-fatal: it is surfaced
    /// through the notifier and the flow returns to `Configure` rather than
    /// getting stuck in `Bridge`.
    pub async fn bridge(&mut self, fee: Fee) -> Result<BridgePhase, FlowError> {
        if self.phase != BridgePhase::Bridge {
            return Ok(self.phase);
        }
        let generation = self.current_generation();
        let msg = match self.current_msg() {
            Ok(msg) => msg,
            Err(e) => {
                self.surface(&e);
                self.enter(BridgePhase::Configure);
                return Err(e);
            }
        };

        let result = self.run_bridge(&msg, &fee).await;

        if self.current_generation() != generation {
            debug!("bridge result for an abandoned flow, discarding");
            return Ok(self.phase);
        }

        match result {
            Ok(()) => {
                self.notifier.push(Notification::success(format!(
                    "Bridged {} to {}",
                    msg.amount, msg.recipient
                )));
                self.form = BridgeForm::default();
                self.gas_estimate = None;
                self.enter(BridgePhase::Configure);
                Ok(BridgePhase::Configure)
            }
            Err(e) => {
                self.surface(&e);
                self.enter(BridgePhase::Configure);
                Err(e)
            }
        }
    }

    async fn run_bridge(&mut self, msg: &BridgeMsg, fee: &Fee) -> Result<(), FlowError> {
        let estimate = self.submitter.simulate(msg).await?;
        self.gas_estimate = Some(estimate);

        let hash = self.submitter.send_bridge(msg, fee).await?;
        info!(tx_hash = %hash, "bridge transfer broadcast");

        self.submitter.confirm(&hash).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw() -> Currency {
        Currency::new("token", 0)
    }

    fn state(minimal: u128) -> QueryState<Amount> {
        QueryState::ready(Amount::new(raw(), minimal))
    }

    #[test]
    fn test_sufficient_allowance_skips_approve() {
        let amount = Amount::new(raw(), 50);
        assert_eq!(
            decide_transition(&state(100), &amount).unwrap(),
            BridgePhase::Bridge
        );
        // Exactly equal is sufficient
        assert_eq!(
            decide_transition(&state(50), &amount).unwrap(),
            BridgePhase::Bridge
        );
    }

    #[test]
    fn test_insufficient_allowance_requires_approve() {
        let amount = Amount::new(raw(), 50);
        assert_eq!(
            decide_transition(&state(10), &amount).unwrap(),
            BridgePhase::Approve
        );
    }

    #[test]
    fn test_failed_allowance_blocks_transition() {
        let amount = Amount::new(raw(), 50);
        let err = decide_transition(&QueryState::failed("rpc down"), &amount).unwrap_err();
        assert!(matches!(err, FlowError::AllowanceUnavailable { .. }));
        assert!(err.to_string().contains("rpc down"));
    }

    #[test]
    fn test_in_flight_allowance_blocks_transition() {
        let amount = Amount::new(raw(), 50);
        let err = decide_transition(&QueryState::fetching(), &amount).unwrap_err();
        assert!(matches!(err, FlowError::AllowanceUnavailable { .. }));
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(BridgePhase::Configure.to_string(), "configure");
        assert_eq!(BridgePhase::Approve.to_string(), "approve");
        assert_eq!(BridgePhase::Bridge.to_string(), "bridge");
    }
}
