// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Error types shared by the sync engine and its data sources.

use std::fmt;

/// Fallback message used when a failure carries no text of its own.
pub const GENERIC_FAILURE_MESSAGE: &str = "Failed to synchronize data";

/// Failure reported by a data source or a connectivity ensure-call.
///
/// Only the message survives: it becomes the `error` text of the
/// [`SyncState`](crate::sync::SyncState).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct SourceError {
    pub message: String,
}

impl SourceError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Build a source error from any displayable failure.
    ///
    /// Blank messages are replaced with [`GENERIC_FAILURE_MESSAGE`].
    pub fn from_display(err: impl fmt::Display) -> Self {
        let message = err.to_string();
        if message.trim().is_empty() {
            Self::new(GENERIC_FAILURE_MESSAGE)
        } else {
            Self::new(message)
        }
    }
}

/// Errors returned to callers of the [`SyncHandle`](crate::sync::SyncHandle).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyncError {
    /// The fetch cycle ran and the source failed.
    #[error("{0}")]
    Source(#[from] SourceError),

    /// The wallet session is disconnected; no cycle was attempted.
    #[error("Wallet session is not connected")]
    Disconnected,

    /// The engine was torn down before the request could be served.
    #[error("Sync engine has shut down")]
    Shutdown,
}
