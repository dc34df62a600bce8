//! Flow configuration
//!
//! Loaded from environment variables (with an optional `.env` file), the
//! same way every service in this stack configures itself.

use eyre::{eyre, Result, WrapErr};
use serde::Deserialize;
use std::env;
use std::path::Path;

use crate::types::Currency;

/// Configuration for the bridge flow and its collaborators
#[derive(Debug, Clone, Deserialize)]
pub struct FlowConfig {
    /// ERC20 contract of the bridged token representation
    pub token_contract: String,
    /// Bridge contract granted the allowance (the `spender`)
    pub bridge_contract: String,
    /// Minimal denom of the bridged asset
    pub denom: String,
    #[serde(default = "default_decimals")]
    pub decimals: u32,
    /// How long to wait for an on-chain confirmation before giving up
    #[serde(default = "default_confirm_timeout_secs")]
    pub confirm_timeout_secs: u64,
    /// Poll interval for balance/allowance refresh
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
    /// Headroom applied on top of simulated gas
    #[serde(default = "default_gas_margin_percent")]
    pub gas_margin_percent: u64,
}

fn default_decimals() -> u32 {
    18
}

fn default_confirm_timeout_secs() -> u64 {
    60
}

fn default_poll_interval() -> u64 {
    1000
}

fn default_gas_margin_percent() -> u64 {
    30
}

impl FlowConfig {
    /// Load configuration from environment variables, reading `.env` first
    /// if present
    pub fn load() -> Result<Self> {
        Self::load_from_file(".env").or_else(|_| Self::load_from_env())
    }

    /// Load from a specific .env file path
    pub fn load_from_file(path: &str) -> Result<Self> {
        if Path::new(path).exists() {
            dotenvy::from_filename(path)
                .wrap_err_with(|| format!("Failed to load .env file from {}", path))?;
        }
        Self::load_from_env()
    }

    /// Load configuration from environment variables
    fn load_from_env() -> Result<Self> {
        let config = FlowConfig {
            token_contract: env::var("TOKEN_CONTRACT")
                .map_err(|_| eyre!("TOKEN_CONTRACT environment variable is required"))?,
            bridge_contract: env::var("BRIDGE_CONTRACT")
                .map_err(|_| eyre!("BRIDGE_CONTRACT environment variable is required"))?,
            denom: env::var("DENOM")
                .map_err(|_| eyre!("DENOM environment variable is required"))?,
            decimals: env::var("DECIMALS")
                .ok()
                .map(|v| v.parse().wrap_err("DECIMALS must be a valid u32"))
                .transpose()?
                .unwrap_or(default_decimals()),
            confirm_timeout_secs: env::var("CONFIRM_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default_confirm_timeout_secs()),
            poll_interval_ms: env::var("POLL_INTERVAL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default_poll_interval()),
            gas_margin_percent: env::var("GAS_MARGIN_PERCENT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default_gas_margin_percent()),
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.token_contract.len() != 42 || !self.token_contract.starts_with("0x") {
            return Err(eyre!(
                "token_contract must be a valid hex address (42 chars with 0x prefix)"
            ));
        }

        if self.bridge_contract.is_empty() {
            return Err(eyre!("bridge_contract cannot be empty"));
        }

        if self.denom.is_empty() {
            return Err(eyre!("denom cannot be empty"));
        }

        // 38 decimals already exceeds what u128 minimal units can represent
        // for any amount >= 1 display unit
        if self.decimals > 38 {
            return Err(eyre!("decimals cannot exceed 38"));
        }

        if self.confirm_timeout_secs == 0 {
            return Err(eyre!("confirm_timeout_secs cannot be zero"));
        }

        Ok(())
    }

    /// The configured asset as a currency descriptor
    pub fn currency(&self) -> Currency {
        Currency::new(self.denom.clone(), self.decimals)
    }
}
