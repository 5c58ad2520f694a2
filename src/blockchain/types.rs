// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Blockchain types and network presets.

use alloy::primitives::U256;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::WalletAddress;

/// EVM network the chain reader talks to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkConfig {
    /// Network name for display
    pub name: String,
    /// Chain ID
    pub chain_id: u64,
    /// RPC endpoint URL
    pub rpc_url: String,
    /// Block explorer URL
    pub explorer_url: String,
}

/// Chain ID of Avalanche C-Chain mainnet.
pub const AVAX_MAINNET_CHAIN_ID: u64 = 43114;
/// Chain ID of the Avalanche Fuji testnet.
pub const AVAX_FUJI_CHAIN_ID: u64 = 43113;
/// Public Fuji RPC endpoint.
pub const AVAX_FUJI_RPC_URL: &str = "https://api.avax-test.network/ext/bc/C/rpc";

impl NetworkConfig {
    /// Avalanche C-Chain Mainnet configuration.
    pub fn avalanche_mainnet() -> Self {
        Self {
            name: "Avalanche C-Chain".to_string(),
            chain_id: AVAX_MAINNET_CHAIN_ID,
            rpc_url: "https://api.avax.network/ext/bc/C/rpc".to_string(),
            explorer_url: "https://snowtrace.io".to_string(),
        }
    }

    /// Avalanche Fuji Testnet configuration.
    pub fn avalanche_fuji() -> Self {
        Self {
            name: "Avalanche Fuji Testnet".to_string(),
            chain_id: AVAX_FUJI_CHAIN_ID,
            rpc_url: AVAX_FUJI_RPC_URL.to_string(),
            explorer_url: "https://testnet.snowtrace.io".to_string(),
        }
    }

    /// Preset matching `chain_id`, pointed at `rpc_url`.
    pub fn for_chain(chain_id: u64, rpc_url: impl Into<String>) -> Self {
        let mut network = match chain_id {
            AVAX_MAINNET_CHAIN_ID => Self::avalanche_mainnet(),
            AVAX_FUJI_CHAIN_ID => Self::avalanche_fuji(),
            other => Self {
                name: format!("EVM chain {other}"),
                chain_id: other,
                rpc_url: String::new(),
                explorer_url: String::new(),
            },
        };
        network.rpc_url = rpc_url.into();
        network
    }

    /// Explorer link for an address, if the network has an explorer.
    pub fn address_url(&self, address: &WalletAddress) -> Option<String> {
        if self.explorer_url.is_empty() {
            None
        } else {
            Some(format!("{}/address/{}", self.explorer_url, address))
        }
    }
}

/// Token balance information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenBalance {
    /// Token symbol (e.g., "AVAX")
    pub symbol: String,
    /// Balance in smallest unit (wei for native)
    pub balance_raw: String,
    /// Balance formatted with decimals
    pub balance_formatted: String,
    /// Number of decimals
    pub decimals: u8,
}

/// On-chain view of a connected wallet at one block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainSnapshot {
    pub chain_id: u64,
    pub block_number: u64,
    pub address: WalletAddress,
    pub native_balance: TokenBalance,
    /// When the snapshot was read from the node.
    pub synced_at: DateTime<Utc>,
}

/// Format a balance with the specified number of decimals.
///
/// Fractional digits are truncated to six places.
pub fn format_balance(balance: U256, decimals: u8) -> String {
    if balance.is_zero() {
        return "0".to_string();
    }

    let divisor = U256::from(10u64).pow(U256::from(decimals));
    let whole = balance / divisor;
    let remainder = balance % divisor;

    if remainder.is_zero() {
        return whole.to_string();
    }

    let decimal_str = format!("{:0>width$}", remainder, width = decimals as usize);
    let trimmed = decimal_str.trim_end_matches('0');
    if trimmed.is_empty() {
        whole.to_string()
    } else {
        format!("{}.{}", whole, &trimmed[..trimmed.len().min(6)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_balance() {
        let one_avax = U256::from(1_000_000_000_000_000_000u64);
        assert_eq!(format_balance(one_avax, 18), "1");

        let half_avax = U256::from(500_000_000_000_000_000u64);
        assert_eq!(format_balance(half_avax, 18), "0.5");

        // Truncated to 6 decimals
        let complex = U256::from(1_234_567_890_000_000_000u64);
        assert_eq!(format_balance(complex, 18), "1.234567");

        assert_eq!(format_balance(U256::ZERO, 18), "0");
    }

    #[test]
    fn for_chain_picks_presets() {
        let fuji = NetworkConfig::for_chain(AVAX_FUJI_CHAIN_ID, "http://localhost:9650");
        assert_eq!(fuji.name, "Avalanche Fuji Testnet");
        assert_eq!(fuji.rpc_url, "http://localhost:9650");

        let custom = NetworkConfig::for_chain(31337, "http://127.0.0.1:8545");
        assert_eq!(custom.chain_id, 31337);
        assert!(custom
            .address_url(&WalletAddress::from("0x1111111111111111111111111111111111111111"))
            .is_none());
    }

    #[test]
    fn address_url_uses_explorer() {
        let url = NetworkConfig::avalanche_fuji()
            .address_url(&WalletAddress::from("0xabc"))
            .unwrap();
        assert_eq!(url, "https://testnet.snowtrace.io/address/0xabc");
    }

    #[test]
    fn snapshot_serializes_sync_time() {
        let synced_at = DateTime::parse_from_rfc3339("2026-03-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let snapshot = ChainSnapshot {
            chain_id: AVAX_FUJI_CHAIN_ID,
            block_number: 42,
            address: WalletAddress::from("0x1111111111111111111111111111111111111111"),
            native_balance: TokenBalance {
                symbol: "AVAX".to_string(),
                balance_raw: "0".to_string(),
                balance_formatted: "0".to_string(),
                decimals: 18,
            },
            synced_at,
        };

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["synced_at"], "2026-03-01T12:00:00Z");
        assert_eq!(json["block_number"], 42);

        let back: ChainSnapshot = serde_json::from_value(json).unwrap();
        assert_eq!(back.synced_at, synced_at);
    }
}
