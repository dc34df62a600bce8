//! Error taxonomy for the wallet flows
//!
//! Every failure that can cross from an external collaborator into this
//! crate's state transitions is caught at that boundary and converted into a
//! `FlowError`; nothing propagates out of a controller as an opaque panic or
//! unhandled rejection.

use thiserror::Error;

/// Stage of a transaction submission that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxStage {
    Simulate,
    Send,
    Confirm,
}

impl std::fmt::Display for TxStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TxStage::Simulate => "simulate",
            TxStage::Send => "send",
            TxStage::Confirm => "confirm",
        };
        write!(f, "{}", s)
    }
}

/// Errors produced by the vesting, balance, and bridge flows
#[derive(Debug, Error)]
pub enum FlowError {
    /// Vesting schedule where `end_time <= start_time` reached the
    /// elapsed-fraction path (the fraction is undefined there).
    #[error("invalid vesting schedule: end_time {end} must be after start_time {start}")]
    InvalidVestingSchedule { start: i64, end: i64 },

    /// Allowance query errored, is still in flight, or returned no value at
    /// the moment a phase transition needed it.
    #[error("allowance unavailable: {reason}")]
    AllowanceUnavailable { reason: String },

    /// A simulate/send/confirm call failed. Non-fatal to the controller; the
    /// flow returns to a safe phase and the user is notified.
    #[error("transaction {stage} failed: {cause}")]
    TransactionSubmission { stage: TxStage, cause: eyre::Report },

    /// Display→minimal conversion produced a value outside the supported
    /// range (negative, non-numeric, or exceeding u128 minimal units).
    #[error("amount out of range: {input:?}")]
    PrecisionOverflow { input: String },
}

impl FlowError {
    /// Wrap a submission failure with the stage it occurred in
    pub fn submission(stage: TxStage, cause: impl Into<eyre::Report>) -> Self {
        FlowError::TransactionSubmission {
            stage,
            cause: cause.into(),
        }
    }

    /// True if the error blocks a phase transition but leaves the flow in a
    /// recoverable state (everything except schedule errors, which are
    /// handled by the vesting layer itself).
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, FlowError::InvalidVestingSchedule { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tx_stage_display() {
        assert_eq!(TxStage::Simulate.to_string(), "simulate");
        assert_eq!(TxStage::Send.to_string(), "send");
        assert_eq!(TxStage::Confirm.to_string(), "confirm");
    }

    #[test]
    fn test_error_messages() {
        let err = FlowError::InvalidVestingSchedule {
            start: 100,
            end: 50,
        };
        assert!(err.to_string().contains("100"));
        assert!(err.to_string().contains("50"));

        let err = FlowError::AllowanceUnavailable {
            reason: "query failed".to_string(),
        };
        assert!(err.to_string().contains("query failed"));
    }

    #[test]
    fn test_recoverable_classification() {
        assert!(!FlowError::InvalidVestingSchedule { start: 0, end: 0 }.is_recoverable());
        assert!(FlowError::PrecisionOverflow {
            input: "x".to_string()
        }
        .is_recoverable());
    }
}
