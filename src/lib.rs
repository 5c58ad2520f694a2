// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! TrustBond Sync - wallet-gated periodic synchronization
//!
//! Keeps dashboard data (KYC records, loans, trust scores, chain balances)
//! in sync with its sources while a wallet session is connected.
//!
//! ## Modules
//!
//! - `sync` - The periodic sync engine and its capabilities
//! - `session` - Injectable wallet session
//! - `notify` - Notification sinks for manual refreshes
//! - `blockchain` - EVM chain reader used as a data source
//! - `models` - TrustBond contract data shapes

pub mod blockchain;
pub mod config;
pub mod error;
pub mod models;
pub mod notify;
pub mod session;
pub mod sync;
pub mod telemetry;

pub use error::{SourceError, SyncError};
pub use session::WalletSession;
pub use sync::{PeriodicSync, SyncHandle, SyncState};
