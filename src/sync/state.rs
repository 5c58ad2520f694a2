// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Observable state of a sync engine instance.

use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Snapshot of one engine's synchronized data.
///
/// Published as a whole on every change, so observers never see a
/// half-applied cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncState<T> {
    /// Latest successfully fetched value (initially the caller's seed value).
    pub data: T,
    /// True while a fetch cycle issued by the engine is outstanding.
    pub is_loading: bool,
    /// Completion time of the most recent successful cycle.
    pub last_synced: Option<DateTime<Utc>>,
    /// Message of the most recent failed cycle; cleared when a cycle starts.
    pub error: Option<String>,
}

impl<T> SyncState<T> {
    pub fn new(initial: T) -> Self {
        Self {
            data: initial,
            is_loading: false,
            last_synced: None,
            error: None,
        }
    }

    pub fn has_synced(&self) -> bool {
        self.last_synced.is_some()
    }
}

/// Values whose change forces an out-of-schedule fetch cycle.
///
/// Stored as their display strings so heterogeneous values (an account id,
/// a loan id, a filter) can share one list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Dependencies(Vec<String>);

impl Dependencies {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one value.
    pub fn with(mut self, value: impl Display) -> Self {
        self.0.push(value.to_string());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn values(&self) -> &[String] {
        &self.0
    }
}

impl<V: Display> FromIterator<V> for Dependencies {
    fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
        Dependencies(iter.into_iter().map(|v| v.to_string()).collect())
    }
}
