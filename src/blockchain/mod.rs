// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! On-chain data source for the sync engine.
//!
//! This module provides:
//! - Network presets and balance formatting
//! - A read-only chain client producing wallet snapshots
//! - An RPC connector verifying the endpoint's chain id

pub mod client;
pub mod types;

pub use client::{ChainError, ChainReader, RpcConnector, WalletSnapshotSource};
pub use types::*;
