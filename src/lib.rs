//! Wallet-Flows: Vesting, Balance, and Bridge Flow Engine for the FET Wallet
//!
//! This crate isolates the wallet's numeric business logic from any rendering
//! or transport concern:
//!
//! - **Types** - Currency descriptors and minimal-denom `u128` amounts with
//!   checked display↔minimal conversion
//! - **Vesting** - Locked/vested decomposition for continuous and delayed
//!   vesting grants
//! - **Balance** - Numeric/denom splitting, balance-source selection, and
//!   latest-wins snapshot reconciliation
//! - **Bridge** - The `Configure → Approve → Bridge` state machine for
//!   native↔ERC20 transfers, gated on on-chain allowance
//! - **Queries / Tx / Notify** - Trait seams for the external query cache,
//!   transaction submission, and user notification channels
//!
//! The crate owns no network or wire format. Balance and allowance queries,
//! signing, and broadcasting all live behind the `queries`, `tx`, and
//! `notify` traits so the same flows drive a browser extension, a CLI, or a
//! test harness unchanged.
//!
//! ## Usage
//!
//! ```toml
//! [dependencies]
//! wallet-flows = { path = "../wallet-flows" }
//! ```

pub mod balance;
pub mod bridge;
pub mod config;
pub mod error;
pub mod notify;
pub mod queries;
pub mod tx;
pub mod types;
pub mod vesting;

// Re-export commonly used items at the crate root
pub use balance::{balance_or_zero, separate_numeric_and_denom, BalanceBook};
pub use bridge::{decide_transition, BridgeFlow, BridgeForm, BridgePhase, CancelHandle};
pub use config::FlowConfig;
pub use error::{FlowError, TxStage};
pub use notify::{Notification, NotificationKind, Notifier, TracingNotifier};
pub use queries::{AllowanceQuerier, BalanceQuerier, QueryState};
pub use tx::{BridgeMsg, Fee, GasEstimate, TxHash, TxSubmitter};
pub use types::{Amount, Currency, VestingAccount, VestingKind};
pub use vesting::{breakdown, breakdown_or_default, locked_at, VestingBreakdown};
