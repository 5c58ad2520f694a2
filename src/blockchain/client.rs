// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Read-only EVM client feeding the sync engine with on-chain state.

use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;

use alloy::{
    network::Ethereum,
    primitives::Address,
    providers::{
        fillers::{BlobGasFiller, ChainIdFiller, FillProvider, GasFiller, JoinFill, NonceFiller},
        Identity, Provider, ProviderBuilder, RootProvider,
    },
};
use chrono::Utc;
use tokio::sync::OnceCell;

use super::types::*;
use crate::error::SourceError;
use crate::models::WalletAddress;
use crate::session::WalletSession;
use crate::sync::{Connector, SyncSource};

/// HTTP provider type (with the default fillers).
type HttpProvider = FillProvider<
    JoinFill<
        Identity,
        JoinFill<GasFiller, JoinFill<BlobGasFiller, JoinFill<NonceFiller, ChainIdFiller>>>,
    >,
    RootProvider<Ethereum>,
>;

/// Chain reader for one network.
pub struct ChainReader {
    network: NetworkConfig,
    provider: HttpProvider,
}

impl ChainReader {
    /// Create a reader for the specified network. No request is made yet.
    pub fn new(network: NetworkConfig) -> Result<Self, ChainError> {
        let url: url::Url = network
            .rpc_url
            .parse()
            .map_err(|e: url::ParseError| ChainError::InvalidRpcUrl(e.to_string()))?;

        let provider = ProviderBuilder::new().connect_http(url);

        Ok(Self { network, provider })
    }

    pub fn network(&self) -> &NetworkConfig {
        &self.network
    }

    /// Chain id reported by the RPC endpoint.
    pub async fn chain_id(&self) -> Result<u64, ChainError> {
        self.provider
            .get_chain_id()
            .await
            .map_err(|e| ChainError::Rpc(e.to_string()))
    }

    /// Current block number.
    pub async fn block_number(&self) -> Result<u64, ChainError> {
        self.provider
            .get_block_number()
            .await
            .map_err(|e| ChainError::Rpc(e.to_string()))
    }

    /// Native balance and chain head for `address`.
    pub async fn snapshot(&self, address: &WalletAddress) -> Result<ChainSnapshot, ChainError> {
        let addr = Address::from_str(address.as_str())
            .map_err(|e| ChainError::InvalidAddress(e.to_string()))?;

        let block_number = self.block_number().await?;
        let balance = self
            .provider
            .get_balance(addr)
            .await
            .map_err(|e| ChainError::Rpc(e.to_string()))?;

        Ok(ChainSnapshot {
            chain_id: self.network.chain_id,
            block_number,
            address: address.clone(),
            native_balance: TokenBalance {
                symbol: "AVAX".to_string(),
                balance_raw: balance.to_string(),
                balance_formatted: format_balance(balance, 18),
                decimals: 18,
            },
            synced_at: Utc::now(),
        })
    }

    /// Sync source reading the snapshot of whichever account `session` has
    /// connected at fetch time.
    pub fn wallet_source(self: &Arc<Self>, session: WalletSession) -> WalletSnapshotSource {
        WalletSnapshotSource {
            reader: Arc::clone(self),
            session,
        }
    }

    /// Connector verifying the endpoint serves this network's chain.
    pub fn connector(self: &Arc<Self>) -> RpcConnector {
        RpcConnector {
            reader: Arc::clone(self),
            verified: OnceCell::new(),
        }
    }
}

/// [`SyncSource`] over [`ChainReader::snapshot`]. Yields `None` when no
/// account is connected.
pub struct WalletSnapshotSource {
    reader: Arc<ChainReader>,
    session: WalletSession,
}

impl SyncSource<Option<ChainSnapshot>> for WalletSnapshotSource {
    fn fetch(&self) -> impl Future<Output = Result<Option<ChainSnapshot>, SourceError>> + Send {
        let reader = Arc::clone(&self.reader);
        let address = self.session.address();
        async move {
            match address {
                Some(address) => Ok(Some(reader.snapshot(&address).await?)),
                None => Ok(None),
            }
        }
    }
}

/// Checks once that the RPC endpoint reports the configured chain id.
pub struct RpcConnector {
    reader: Arc<ChainReader>,
    verified: OnceCell<()>,
}

impl RpcConnector {
    pub fn is_verified(&self) -> bool {
        self.verified.initialized()
    }
}

impl Connector for RpcConnector {
    async fn ensure_connected(&self) -> Result<(), SourceError> {
        self.verified
            .get_or_try_init(|| async {
                let expected = self.reader.network.chain_id;
                let actual = self.reader.chain_id().await?;
                if actual != expected {
                    return Err(SourceError::from(ChainError::ChainMismatch {
                        expected,
                        actual,
                    }));
                }
                tracing::info!(
                    network = %self.reader.network.name,
                    chain_id = actual,
                    "RPC endpoint verified"
                );
                Ok::<(), SourceError>(())
            })
            .await
            .map(|_| ())
    }
}

/// Errors that can occur during blockchain reads.
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    #[error("Invalid RPC URL: {0}")]
    InvalidRpcUrl(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("RPC endpoint is on chain {actual}, expected {expected}")]
    ChainMismatch { expected: u64, actual: u64 },
}

impl From<ChainError> for SourceError {
    fn from(err: ChainError) -> Self {
        SourceError::from_display(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_rpc_url() {
        let network = NetworkConfig::for_chain(AVAX_FUJI_CHAIN_ID, "not a url");
        let err = ChainReader::new(network).err().unwrap();
        assert!(matches!(err, ChainError::InvalidRpcUrl(_)));
    }

    #[tokio::test]
    async fn snapshot_rejects_invalid_address_before_any_request() {
        // Unroutable endpoint: the address check must fail first.
        let network = NetworkConfig::for_chain(AVAX_FUJI_CHAIN_ID, "http://127.0.0.1:9");
        let reader = ChainReader::new(network).unwrap();

        let err = reader
            .snapshot(&WalletAddress::from("0xnot-an-address"))
            .await
            .unwrap_err();
        assert!(matches!(err, ChainError::InvalidAddress(_)));
    }

    #[tokio::test]
    async fn wallet_source_yields_none_without_account() {
        let network = NetworkConfig::for_chain(AVAX_FUJI_CHAIN_ID, "http://127.0.0.1:9");
        let reader = Arc::new(ChainReader::new(network).unwrap());
        let source = reader.wallet_source(WalletSession::disconnected());

        assert_eq!(source.fetch().await.unwrap(), None);
    }

    #[test]
    fn chain_errors_become_source_messages() {
        let err: SourceError = ChainError::ChainMismatch {
            expected: 43113,
            actual: 1,
        }
        .into();
        assert_eq!(err.message, "RPC endpoint is on chain 1, expected 43113");
    }

    #[tokio::test]
    async fn connector_stays_unverified_when_endpoint_is_down() {
        let network = NetworkConfig::for_chain(AVAX_FUJI_CHAIN_ID, "http://127.0.0.1:9");
        let reader = Arc::new(ChainReader::new(network).unwrap());
        let connector = reader.connector();

        let err = connector.ensure_connected().await.unwrap_err();
        assert!(err.message.starts_with("RPC error"));
        assert!(!connector.is_verified());
    }
}
