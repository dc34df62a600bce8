//! External query surface
//!
//! Balance and allowance queries live in an externally synchronized cache
//! owned by the host (the wallet SDK's query stores). This crate only reads
//! snapshots of that cache; it never mutates it. `QueryState` is the shape
//! every such snapshot exposes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::types::Amount;

/// Snapshot of an asynchronous chain query
///
/// `value` carries the last completed result, which may coexist with
/// `is_fetching` during a refresh. A state with neither value nor error and
/// `is_fetching` set means the query has never completed: unknown, not zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryState<T> {
    pub value: Option<T>,
    pub is_fetching: bool,
    pub error: Option<String>,
}

impl<T> QueryState<T> {
    /// A completed, successful query
    pub fn ready(value: T) -> Self {
        QueryState {
            value: Some(value),
            is_fetching: false,
            error: None,
        }
    }

    /// A query that is in flight with no prior result
    pub fn fetching() -> Self {
        QueryState {
            value: None,
            is_fetching: true,
            error: None,
        }
    }

    /// A failed query
    pub fn failed(error: impl Into<String>) -> Self {
        QueryState {
            value: None,
            is_fetching: false,
            error: Some(error.into()),
        }
    }

    /// True when the query has settled successfully with a value
    pub fn is_ready(&self) -> bool {
        self.value.is_some() && !self.is_fetching && self.error.is_none()
    }
}

/// Source of bank balance snapshots
#[async_trait]
pub trait BalanceQuerier: Send + Sync {
    /// Balance of `denom` held by `address`, in minimal units
    async fn balance(&self, address: &str, denom: &str) -> QueryState<Amount>;
}

/// Source of ERC20 allowance snapshots
#[async_trait]
pub trait AllowanceQuerier: Send + Sync {
    /// Amount `spender` may transfer out of `owner`'s balance of `token`
    async fn allowance(&self, owner: &str, spender: &str, token: &str) -> QueryState<Amount>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Currency;

    #[test]
    fn test_query_state_ready() {
        let state = QueryState::ready(Amount::new(Currency::new("afet", 18), 1));
        assert!(state.is_ready());
        assert!(!state.is_fetching);
    }

    #[test]
    fn test_query_state_fetching_is_not_ready() {
        let state: QueryState<Amount> = QueryState::fetching();
        assert!(!state.is_ready());
        assert!(state.value.is_none());
    }

    #[test]
    fn test_query_state_failed_is_not_ready() {
        let state: QueryState<Amount> = QueryState::failed("boom");
        assert!(!state.is_ready());
        assert_eq!(state.error.as_deref(), Some("boom"));
    }

    #[test]
    fn test_query_state_json_shape() {
        // The host bridges these snapshots over a message channel as JSON
        let state = QueryState::ready(Amount::new(Currency::new("afet", 18), 5));
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["is_fetching"], false);
        assert_eq!(json["value"]["currency"]["denom"], "afet");

        let back: QueryState<Amount> = serde_json::from_value(json).unwrap();
        assert_eq!(back, state);
    }
}
