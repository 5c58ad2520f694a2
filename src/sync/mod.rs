// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wallet-gated periodic synchronization.
//!
//! - `engine` - the driver task and its [`SyncHandle`]
//! - `source` - data source and connectivity capabilities
//! - `state` - the published [`SyncState`] and dependency list
//! - `clock` - completion timestamps for `last_synced`

pub mod clock;
pub mod engine;
pub mod source;
pub mod state;

pub use clock::{Clock, SystemClock};
pub use engine::{CycleOrigin, PeriodicSync, SyncHandle, DEFAULT_SYNC_INTERVAL, MAX_SYNC_INTERVAL};
pub use source::{AlwaysConnected, ConnectOnce, Connector, FnSource, SyncSource};
pub use state::{Dependencies, SyncState};
