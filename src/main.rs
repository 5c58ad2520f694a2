// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Headless sync daemon: keeps one wallet's on-chain snapshot in sync and
//! logs every state change.
//!
//! Reads commands from stdin:
//! - `refresh` - run a manual sync cycle
//! - `connect <address>` - connect (or switch) the wallet session
//! - `disconnect` - disconnect the wallet session

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use trustbond_sync::blockchain::ChainReader;
use trustbond_sync::config::DaemonConfig;
use trustbond_sync::models::WalletAddress;
use trustbond_sync::telemetry::init_tracing;
use trustbond_sync::{PeriodicSync, SyncError, WalletSession};

#[tokio::main]
async fn main() {
    let config = match DaemonConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            std::process::exit(2);
        }
    };
    init_tracing(config.log_format);

    let reader = Arc::new(
        ChainReader::new(config.network.clone()).expect("Failed to build chain reader"),
    );
    let session = match &config.wallet {
        Some(address) => WalletSession::connected(address.clone()),
        None => WalletSession::disconnected(),
    };

    info!(
        network = %config.network.name,
        chain_id = config.network.chain_id,
        interval_ms = config.interval.as_millis() as u64,
        wallet = ?config.wallet,
        "TrustBond sync daemon starting"
    );

    let handle = PeriodicSync::new(reader.wallet_source(session.clone()), None)
        .interval(config.interval)
        .connector(reader.connector())
        .name("wallet-snapshot")
        .spawn(&session);

    let mut states = handle.subscribe();
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    // At most one manual refresh is awaited at a time, beside the other arms.
    let mut refresh: Option<Pin<Box<dyn Future<Output = Result<(), SyncError>> + '_>>> = None;

    loop {
        tokio::select! {
            changed = states.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = states.borrow_and_update().clone();
                match serde_json::to_string(&state) {
                    Ok(json) => info!(state = %json, "Sync state changed"),
                    Err(e) => warn!(error = %e, "Failed to serialize sync state"),
                }
            }
            outcome = async {
                match refresh.as_mut() {
                    Some(pending) => pending.await,
                    None => std::future::pending().await,
                }
            }, if refresh.is_some() => {
                refresh = None;
                match outcome {
                    Ok(()) => info!("Manual refresh completed"),
                    Err(e) => warn!(error = %e, "Manual refresh failed"),
                }
            }
            line = stdin.next_line(), if stdin_open => match line {
                Ok(Some(line)) => {
                    let mut words = line.split_whitespace();
                    match (words.next(), words.next()) {
                        (Some("refresh"), _) => {
                            if refresh.is_some() {
                                info!("Manual refresh already running");
                            } else {
                                refresh = Some(Box::pin(handle.refetch()));
                            }
                        }
                        (Some("connect"), Some(address)) => {
                            let address = WalletAddress::from(address);
                            if address.is_valid() {
                                session.connect(address);
                            } else {
                                warn!(address = %address, "Ignoring invalid wallet address");
                            }
                        }
                        (Some("disconnect"), _) => {
                            session.disconnect();
                        }
                        (None, _) => {}
                        (Some(other), _) => warn!(command = other, "Unknown command"),
                    }
                }
                Ok(None) => stdin_open = false,
                Err(e) => {
                    warn!(error = %e, "Failed to read stdin");
                    stdin_open = false;
                }
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }
        }
    }

    drop(refresh);
    handle.shutdown().await;
}
