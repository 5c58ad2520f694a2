// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wallet session capability.
//!
//! The session reports whether a wallet account is connected and broadcasts
//! every change to subscribers. The sync engine consumes it through
//! [`WalletSession::subscribe`]; hosts (and tests) drive it with
//! [`WalletSession::connect`] / [`WalletSession::disconnect`].

use std::sync::Arc;

use tokio::sync::watch;

use crate::models::WalletAddress;

/// Shared handle to a wallet session. Cloning yields another handle to the
/// same session.
#[derive(Debug, Clone)]
pub struct WalletSession {
    account: Arc<watch::Sender<Option<WalletAddress>>>,
}

impl WalletSession {
    /// A session with no connected account.
    pub fn disconnected() -> Self {
        Self {
            account: Arc::new(watch::Sender::new(None)),
        }
    }

    /// A session already connected to `address`.
    pub fn connected(address: impl Into<WalletAddress>) -> Self {
        Self {
            account: Arc::new(watch::Sender::new(Some(address.into()))),
        }
    }

    /// Connect (or switch) to `address`. Returns `false` if that account was
    /// already connected.
    pub fn connect(&self, address: impl Into<WalletAddress>) -> bool {
        let address = address.into();
        let changed = self.account.send_if_modified(|current| {
            if current.as_ref() == Some(&address) {
                false
            } else {
                *current = Some(address.clone());
                true
            }
        });
        if changed {
            tracing::info!(address = %address, "Wallet session connected");
        }
        changed
    }

    /// Disconnect the current account. Returns `false` if already
    /// disconnected.
    pub fn disconnect(&self) -> bool {
        let changed = self.account.send_if_modified(|current| current.take().is_some());
        if changed {
            tracing::info!("Wallet session disconnected");
        }
        changed
    }

    pub fn is_connected(&self) -> bool {
        self.account.borrow().is_some()
    }

    /// The connected account, if any.
    pub fn address(&self) -> Option<WalletAddress> {
        self.account.borrow().clone()
    }

    /// Subscribe to account changes.
    pub fn subscribe(&self) -> watch::Receiver<Option<WalletAddress>> {
        self.account.subscribe()
    }
}

impl Default for WalletSession {
    fn default() -> Self {
        Self::disconnected()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALICE: &str = "0x1111111111111111111111111111111111111111";
    const BOB: &str = "0x2222222222222222222222222222222222222222";

    #[test]
    fn starts_disconnected_by_default() {
        let session = WalletSession::default();
        assert!(!session.is_connected());
        assert!(session.address().is_none());
    }

    #[test]
    fn connect_and_disconnect_report_changes() {
        let session = WalletSession::disconnected();
        assert!(session.connect(ALICE));
        assert!(!session.connect(ALICE));
        assert!(session.connect(BOB));
        assert_eq!(session.address(), Some(WalletAddress::from(BOB)));
        assert!(session.disconnect());
        assert!(!session.disconnect());
    }

    #[tokio::test]
    async fn subscribers_observe_transitions() {
        let session = WalletSession::disconnected();
        let mut rx = session.subscribe();

        let other = session.clone();
        other.connect(ALICE);

        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), Some(WalletAddress::from(ALICE)));

        // Re-connecting the same account is not a transition.
        other.connect(ALICE);
        assert!(!rx.has_changed().unwrap());
    }
}
