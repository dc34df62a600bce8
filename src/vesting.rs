//! Vesting calculator
//!
//! Derives, at any instant, how much of a vesting grant is currently locked
//! versus already vested. This is the single home for that math: view code
//! must route through here instead of recomputing fractions inline.
//!
//! Calculations use exact integer math only (BigInt intermediates, floor
//! division). Identical inputs always produce identical outputs.

use num_bigint::BigInt;
use tracing::warn;

use crate::error::FlowError;
use crate::types::{Amount, VestingAccount, VestingKind};

/// Locked/vested decomposition of a vesting grant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VestingBreakdown {
    /// Portion of the grant still locked
    pub locked: Amount,
    /// Portion already vested (`original - locked`, saturating at zero)
    pub vested: Amount,
}

/// Compute the locked portion of a vesting grant, in minimal units.
///
/// * `latest_block_time` - current chain time in Unix seconds, `None` when no
///   block header has been observed yet
/// * `spendable` / `total` - the chain-reported spendable and total balances
///   for the grant's currency
///
/// For continuous vesting the observed difference `total - spendable` is
/// preferred over timestamp math: it reflects what the chain itself reports
/// as locked and needs no clock. The elapsed-fraction path only runs when the
/// two balances agree (the observed method has nothing to say) and the
/// schedule is still active.
pub fn locked_at(
    account: &VestingAccount,
    latest_block_time: Option<i64>,
    spendable: &Amount,
    total: &Amount,
) -> Result<u128, FlowError> {
    let original = account.original_vesting.minimal;

    match account.kind {
        VestingKind::Delayed => {
            // All-or-nothing: locked until end_time passes. Without a clock
            // we report the full grant locked rather than overstate funds.
            match latest_block_time {
                Some(now) if now >= account.end_time => Ok(0),
                _ => Ok(original),
            }
        }
        VestingKind::Continuous => {
            if total.minimal > spendable.minimal {
                return Ok(total.minimal - spendable.minimal);
            }

            let now = match latest_block_time {
                Some(now) => now,
                None => return Ok(0),
            };

            if account.end_time > now && spendable.minimal == total.minimal {
                if account.end_time <= account.start_time {
                    return Err(FlowError::InvalidVestingSchedule {
                        start: account.start_time,
                        end: account.end_time,
                    });
                }

                // locked = floor(original * remaining / duration), with the
                // elapsed fraction clamped to [0, 1]
                let remaining = (account.end_time - now)
                    .min(account.end_time - account.start_time)
                    .max(0);
                let duration = account.end_time - account.start_time;

                let locked = BigInt::from(original) * BigInt::from(remaining)
                    / BigInt::from(duration);
                // original * remaining / duration <= original, so this fits
                let locked = u128::try_from(locked).unwrap_or(original);
                Ok(locked)
            } else {
                Ok(0)
            }
        }
    }
}

/// Full locked/vested breakdown of a grant
pub fn breakdown(
    account: &VestingAccount,
    latest_block_time: Option<i64>,
    spendable: &Amount,
    total: &Amount,
) -> Result<VestingBreakdown, FlowError> {
    let locked = locked_at(account, latest_block_time, spendable, total)?;
    let currency = account.original_vesting.currency.clone();
    Ok(VestingBreakdown {
        vested: Amount::new(
            currency.clone(),
            account.original_vesting.minimal.saturating_sub(locked),
        ),
        locked: Amount::new(currency, locked),
    })
}

/// Lenient breakdown: a malformed schedule degrades to locked = 0 with a
/// warning instead of failing the caller (the view renders a safe default).
pub fn breakdown_or_default(
    account: &VestingAccount,
    latest_block_time: Option<i64>,
    spendable: &Amount,
    total: &Amount,
) -> VestingBreakdown {
    match breakdown(account, latest_block_time, spendable, total) {
        Ok(b) => b,
        Err(e) => {
            warn!(
                error = %e,
                start_time = account.start_time,
                end_time = account.end_time,
                "Malformed vesting schedule, treating grant as fully vested"
            );
            let currency = account.original_vesting.currency.clone();
            VestingBreakdown {
                locked: Amount::zero(currency.clone()),
                vested: Amount::new(currency, account.original_vesting.minimal),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Currency;

    fn fet() -> Currency {
        Currency::new("afet", 18)
    }

    fn amount(minimal: u128) -> Amount {
        Amount::new(fet(), minimal)
    }

    fn continuous(original: u128, start: i64, end: i64) -> VestingAccount {
        VestingAccount {
            kind: VestingKind::Continuous,
            original_vesting: amount(original),
            start_time: start,
            end_time: end,
        }
    }

    const GRANT: u128 = 1_000_000_000_000_000_000_000; // 1000 FET in afet

    #[test]
    fn test_observed_path_preferred() {
        let account = continuous(GRANT, 1000, 2000);
        // total > spendable: locked comes straight from the difference, the
        // schedule is not consulted at all
        let locked = locked_at(&account, Some(1500), &amount(300), &amount(1000)).unwrap();
        assert_eq!(locked, 700);
    }

    #[test]
    fn test_schedule_path_midpoint() {
        let account = continuous(GRANT, 1000, 2000);
        let locked = locked_at(&account, Some(1500), &amount(GRANT), &amount(GRANT)).unwrap();
        assert_eq!(locked, GRANT / 2);
    }

    #[test]
    fn test_locked_full_before_start() {
        let account = continuous(GRANT, 1000, 2000);
        for t in [0, 500, 1000] {
            let locked = locked_at(&account, Some(t), &amount(GRANT), &amount(GRANT)).unwrap();
            assert_eq!(locked, GRANT, "at t={}", t);
        }
    }

    #[test]
    fn test_locked_zero_after_end() {
        let account = continuous(GRANT, 1000, 2000);
        for t in [2000, 2001, 100_000] {
            let locked = locked_at(&account, Some(t), &amount(GRANT), &amount(GRANT)).unwrap();
            assert_eq!(locked, 0, "at t={}", t);
        }
    }

    #[test]
    fn test_locked_monotone_non_increasing() {
        let account = continuous(GRANT, 1000, 2000);
        let mut previous = u128::MAX;
        for t in 1000..=2000 {
            let locked = locked_at(&account, Some(t), &amount(GRANT), &amount(GRANT)).unwrap();
            assert!(
                locked <= previous,
                "locked re-increased at t={}: {} > {}",
                t,
                locked,
                previous
            );
            previous = locked;
        }
    }

    #[test]
    fn test_no_block_time_means_fully_vested_for_continuous() {
        let account = continuous(GRANT, 1000, 2000);
        let locked = locked_at(&account, None, &amount(GRANT), &amount(GRANT)).unwrap();
        assert_eq!(locked, 0);
    }

    #[test]
    fn test_invalid_schedule_rejected() {
        let account = continuous(GRANT, 2000, 2000);
        let err = locked_at(&account, Some(1500), &amount(GRANT), &amount(GRANT)).unwrap_err();
        assert!(matches!(err, FlowError::InvalidVestingSchedule { .. }));

        // The observed path does not touch the schedule, so it still works
        let locked = locked_at(&account, Some(1500), &amount(10), &amount(30)).unwrap();
        assert_eq!(locked, 20);
    }

    #[test]
    fn test_delayed_all_or_nothing() {
        let account = VestingAccount {
            kind: VestingKind::Delayed,
            original_vesting: amount(GRANT),
            start_time: 1000,
            end_time: 2000,
        };
        let locked = locked_at(&account, Some(1999), &amount(GRANT), &amount(GRANT)).unwrap();
        assert_eq!(locked, GRANT);
        let locked = locked_at(&account, Some(2000), &amount(GRANT), &amount(GRANT)).unwrap();
        assert_eq!(locked, 0);
        // No clock: conservatively fully locked
        let locked = locked_at(&account, None, &amount(GRANT), &amount(GRANT)).unwrap();
        assert_eq!(locked, GRANT);
    }

    #[test]
    fn test_breakdown_vested_saturates() {
        // Observed lock (staking etc.) can exceed the grant; vested must not
        // go negative
        let account = continuous(100, 1000, 2000);
        let b = breakdown(&account, Some(1500), &amount(0), &amount(500)).unwrap();
        assert_eq!(b.locked.minimal, 500);
        assert_eq!(b.vested.minimal, 0);
    }

    #[test]
    fn test_breakdown_or_default_degrades() {
        let account = continuous(GRANT, 2000, 1000);
        let b = breakdown_or_default(&account, Some(1500), &amount(GRANT), &amount(GRANT));
        assert_eq!(b.locked.minimal, 0);
        assert_eq!(b.vested.minimal, GRANT);
    }

    #[test]
    fn test_idempotent() {
        let account = continuous(GRANT, 1000, 2000);
        let a = breakdown(&account, Some(1234), &amount(GRANT), &amount(GRANT)).unwrap();
        let b = breakdown(&account, Some(1234), &amount(GRANT), &amount(GRANT)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_precision_beyond_f64() {
        // 18-decimal grants exceed 2^53; exact integer math must not drift
        let original = 999_999_999_999_999_999_999_999_999u128;
        let account = continuous(original, 0, 3);
        let locked = locked_at(&account, Some(1), &amount(original), &amount(original)).unwrap();
        assert_eq!(locked, original * 2 / 3);
    }
}
