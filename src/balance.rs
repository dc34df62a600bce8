//! Balance reconciliation
//!
//! Three concerns live here:
//!
//! - Splitting raw balance strings into numeric magnitude and denom label
//! - Choosing between multiple balance sources (fallback to a zero of the
//!   correct currency when no match exists)
//! - Latest-wins reconciliation of query results that may complete out of
//!   order, where an in-flight query is *unknown*, never zero

use bigdecimal::{BigDecimal, Zero};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use crate::queries::QueryState;
use crate::types::{Amount, Currency};

/// Split a raw balance string into its numeric part and denom label.
///
/// Splitting rule: the numeric part is the longest prefix consisting of an
/// optional leading `-` followed by ASCII digits and `.`; everything after
/// it, whitespace-trimmed, is the denom. Digits embedded in a denom stay in
/// the denom once the first non-numeric character is seen
/// (`"100ibc/27394FA..."` splits as `(100, "ibc/27394FA...")`).
///
/// Denoms that *begin* with a digit are not representable: their leading
/// digits would parse as part of the number. No chain denom in use starts
/// with a digit, so the rule stays conservative rather than guessing.
///
/// Empty and unparseable numeric parts yield zero.
pub fn separate_numeric_and_denom(raw: &str) -> (BigDecimal, String) {
    let s = raw.trim();

    let mut split = 0;
    for (i, c) in s.char_indices() {
        let numeric = c.is_ascii_digit() || c == '.' || (c == '-' && i == 0);
        if !numeric {
            break;
        }
        split = i + c.len_utf8();
    }

    let numeric_part = &s[..split];
    let denom_part = s[split..].trim().to_string();
    let value = BigDecimal::from_str(numeric_part).unwrap_or_else(|_| BigDecimal::zero());

    (value, denom_part)
}

/// Currency-specific balance lookup with fallback to a zero of the correct
/// currency when no entry matches.
pub fn balance_or_zero(balances: &HashMap<String, Amount>, currency: &Currency) -> Amount {
    balances
        .get(&currency.denom)
        .cloned()
        .unwrap_or_else(|| Amount::zero(currency.clone()))
}

#[derive(Debug, Clone)]
struct BookEntry {
    amount: Amount,
    seq: u64,
    recorded_at: DateTime<Utc>,
}

/// Latest-wins snapshot store for balance query results.
///
/// Queries are issued with a monotonically increasing sequence number taken
/// at request time; a completion carrying a lower sequence than what is
/// already recorded for its denom is stale and discarded. Balance refresh
/// and user input have no ordering guarantee between them, so this is the
/// only defense against an old response overwriting a newer one.
#[derive(Debug, Default)]
pub struct BalanceBook {
    entries: HashMap<String, BookEntry>,
    next_seq: u64,
}

impl BalanceBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a sequence number for a query about to be sent
    pub fn begin_query(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    /// Record a completed query result. Returns false if the result was
    /// stale (an entry with a newer sequence already exists).
    pub fn record(&mut self, seq: u64, amount: Amount) -> bool {
        let denom = amount.currency.denom.clone();
        match self.entries.get(&denom) {
            Some(existing) if existing.seq > seq => false,
            _ => {
                self.entries.insert(
                    denom,
                    BookEntry {
                        amount,
                        seq,
                        recorded_at: Utc::now(),
                    },
                );
                true
            }
        }
    }

    /// Most recently completed balance for a denom, if any
    pub fn get(&self, denom: &str) -> Option<&Amount> {
        self.entries.get(denom).map(|e| &e.amount)
    }

    /// True if the snapshot for `denom` is missing or older than `max_age`.
    /// Callers use this to kick off a refresh rather than to zero anything.
    pub fn is_stale(&self, denom: &str, max_age: Duration) -> bool {
        match self.entries.get(denom) {
            Some(entry) => {
                let age = Utc::now().signed_duration_since(entry.recorded_at);
                match chrono::Duration::from_std(max_age) {
                    Ok(max) => age > max,
                    // max_age too large to ever be exceeded
                    Err(_) => false,
                }
            }
            None => true,
        }
    }

    /// Resolve a live query state against the book.
    ///
    /// A completed value wins outright. While the query is fetching (or has
    /// errored) the last completed snapshot is used; with no prior snapshot
    /// the balance is unknown (`None`), never zero.
    pub fn resolve(&self, state: &QueryState<Amount>, currency: &Currency) -> Option<Amount> {
        if state.error.is_none() && !state.is_fetching {
            if let Some(value) = &state.value {
                return Some(value.clone());
            }
        }
        self.get(&currency.denom).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fet() -> Currency {
        Currency::new("afet", 18)
    }

    #[test]
    fn test_separate_plain_number() {
        let (value, denom) = separate_numeric_and_denom("0");
        assert_eq!(value, BigDecimal::zero());
        assert_eq!(denom, "");
    }

    #[test]
    fn test_separate_number_and_denom() {
        let (value, denom) = separate_numeric_and_denom("1234.5 FET");
        assert_eq!(value, BigDecimal::from_str("1234.5").unwrap());
        assert_eq!(denom, "FET");
    }

    #[test]
    fn test_separate_empty() {
        let (value, denom) = separate_numeric_and_denom("");
        assert_eq!(value, BigDecimal::zero());
        assert_eq!(denom, "");
    }

    #[test]
    fn test_separate_glued_denom() {
        let (value, denom) = separate_numeric_and_denom("100afet");
        assert_eq!(value, BigDecimal::from(100));
        assert_eq!(denom, "afet");
    }

    #[test]
    fn test_separate_ibc_denom_with_embedded_digits() {
        let (value, denom) = separate_numeric_and_denom("100ibc/27394FA091D2");
        assert_eq!(value, BigDecimal::from(100));
        assert_eq!(denom, "ibc/27394FA091D2");
    }

    #[test]
    fn test_separate_denom_only() {
        let (value, denom) = separate_numeric_and_denom("FET");
        assert_eq!(value, BigDecimal::zero());
        assert_eq!(denom, "FET");
    }

    #[test]
    fn test_separate_negative() {
        let (value, denom) = separate_numeric_and_denom("-2.5 FET");
        assert_eq!(value, BigDecimal::from_str("-2.5").unwrap());
        assert_eq!(denom, "FET");
    }

    #[test]
    fn test_balance_or_zero() {
        let mut balances = HashMap::new();
        balances.insert("afet".to_string(), Amount::new(fet(), 42));

        let found = balance_or_zero(&balances, &fet());
        assert_eq!(found.minimal, 42);

        let missing = balance_or_zero(&balances, &Currency::new("uatom", 6));
        assert!(missing.is_zero());
        assert_eq!(missing.currency.denom, "uatom");
    }

    #[test]
    fn test_book_latest_wins() {
        let mut book = BalanceBook::new();
        let first = book.begin_query();
        let second = book.begin_query();

        // Second query completes first; the first is stale when it lands
        assert!(book.record(second, Amount::new(fet(), 200)));
        assert!(!book.record(first, Amount::new(fet(), 100)));

        assert_eq!(book.get("afet").unwrap().minimal, 200);
    }

    #[test]
    fn test_staleness() {
        let mut book = BalanceBook::new();
        assert!(book.is_stale("afet", Duration::from_secs(60)));

        let seq = book.begin_query();
        book.record(seq, Amount::new(fet(), 1));
        assert!(!book.is_stale("afet", Duration::from_secs(60)));
        assert!(book.is_stale("afet", Duration::from_secs(0)));
    }

    #[test]
    fn test_resolve_prefers_completed_value() {
        let book = BalanceBook::new();
        let state = QueryState::ready(Amount::new(fet(), 7));
        assert_eq!(book.resolve(&state, &fet()).unwrap().minimal, 7);
    }

    #[test]
    fn test_resolve_in_flight_is_unknown_not_zero() {
        let book = BalanceBook::new();
        let state: QueryState<Amount> = QueryState::fetching();
        assert!(book.resolve(&state, &fet()).is_none());
    }

    #[test]
    fn test_resolve_in_flight_uses_prior_snapshot() {
        let mut book = BalanceBook::new();
        let seq = book.begin_query();
        book.record(seq, Amount::new(fet(), 55));

        let state: QueryState<Amount> = QueryState::fetching();
        assert_eq!(book.resolve(&state, &fet()).unwrap().minimal, 55);

        let state: QueryState<Amount> = QueryState::failed("rpc timeout");
        assert_eq!(book.resolve(&state, &fet()).unwrap().minimal, 55);
    }
}
