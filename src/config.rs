// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Environment variable names, defaults, and the loader used by the sync
//! daemon at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `SYNC_INTERVAL_MS` | Milliseconds between periodic cycles | `30000` |
//! | `RPC_URL` | EVM JSON-RPC endpoint | Fuji public RPC |
//! | `CHAIN_ID` | Expected chain id of `RPC_URL` | `43113` |
//! | `WALLET_ADDRESS` | Account to connect at startup | unset (disconnected) |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info` |

use std::time::Duration;

use crate::blockchain::{NetworkConfig, AVAX_FUJI_CHAIN_ID, AVAX_FUJI_RPC_URL};
use crate::models::WalletAddress;
use crate::sync::DEFAULT_SYNC_INTERVAL;

pub const SYNC_INTERVAL_MS_ENV: &str = "SYNC_INTERVAL_MS";
pub const RPC_URL_ENV: &str = "RPC_URL";
pub const CHAIN_ID_ENV: &str = "CHAIN_ID";
pub const WALLET_ADDRESS_ENV: &str = "WALLET_ADDRESS";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// Default `RUST_LOG` filter when none is set.
pub const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl LogFormat {
    /// Parse `json` / `pretty` (case-insensitive).
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" | "" => Ok(LogFormat::Pretty),
            _ => Err(ConfigError::Invalid {
                var: LOG_FORMAT_ENV,
                value: raw.to_string(),
                reason: "expected `json` or `pretty`".to_string(),
            }),
        }
    }
}

/// Settings of the sync daemon.
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub interval: Duration,
    pub network: NetworkConfig,
    pub wallet: Option<WalletAddress>,
    pub log_format: LogFormat,
}

impl DaemonConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load using `lookup` to resolve variables.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let interval = match lookup(SYNC_INTERVAL_MS_ENV) {
            Some(raw) => {
                let millis: u64 = raw.trim().parse().map_err(|_| ConfigError::Invalid {
                    var: SYNC_INTERVAL_MS_ENV,
                    value: raw.clone(),
                    reason: "expected a whole number of milliseconds".to_string(),
                })?;
                if millis == 0 {
                    return Err(ConfigError::Invalid {
                        var: SYNC_INTERVAL_MS_ENV,
                        value: raw,
                        reason: "must be greater than zero".to_string(),
                    });
                }
                Duration::from_millis(millis)
            }
            None => DEFAULT_SYNC_INTERVAL,
        };

        let chain_id = match lookup(CHAIN_ID_ENV) {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
                var: CHAIN_ID_ENV,
                value: raw.clone(),
                reason: "expected an integer chain id".to_string(),
            })?,
            None => AVAX_FUJI_CHAIN_ID,
        };
        let rpc_url = lookup(RPC_URL_ENV).unwrap_or_else(|| AVAX_FUJI_RPC_URL.to_string());

        let wallet = match lookup(WALLET_ADDRESS_ENV) {
            Some(raw) if !raw.trim().is_empty() => {
                let address = WalletAddress::from(raw.trim());
                if !address.is_valid() {
                    return Err(ConfigError::Invalid {
                        var: WALLET_ADDRESS_ENV,
                        value: raw,
                        reason: "expected 0x followed by 40 hex digits".to_string(),
                    });
                }
                Some(address)
            }
            _ => None,
        };

        let log_format = match lookup(LOG_FORMAT_ENV) {
            Some(raw) => LogFormat::parse(&raw)?,
            None => LogFormat::default(),
        };

        Ok(Self {
            interval,
            network: NetworkConfig::for_chain(chain_id, rpc_url),
            wallet,
            log_format,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid {var}={value:?}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}
