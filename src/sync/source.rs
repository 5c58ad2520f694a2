// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Data source and connectivity capabilities consumed by the engine.

use std::fmt::Display;
use std::future::Future;

use tokio::sync::OnceCell;

use crate::error::SourceError;

/// A zero-argument asynchronous fetch producing `T`.
///
/// Supplied by the caller; the engine only ever invokes it, at most once at
/// a time per engine instance.
pub trait SyncSource<T>: Send + Sync + 'static {
    fn fetch(&self) -> impl Future<Output = Result<T, SourceError>> + Send;
}

/// Adapter turning an async closure into a [`SyncSource`].
///
/// ```rust,ignore
/// let source = FnSource::new(|| async { Ok::<_, String>(read_loans().await) });
/// ```
#[derive(Debug, Clone)]
pub struct FnSource<F>(F);

impl<F> FnSource<F> {
    pub fn new(f: F) -> Self {
        FnSource(f)
    }
}

impl<F, Fut, T, E> SyncSource<T> for FnSource<F>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send,
    E: Display,
{
    fn fetch(&self) -> impl Future<Output = Result<T, SourceError>> + Send {
        let pending = (self.0)();
        async move { pending.await.map_err(SourceError::from_display) }
    }
}

/// Idempotent "ensure the data source is reachable" step run before each
/// fetch.
pub trait Connector: Send + Sync + 'static {
    fn ensure_connected(&self) -> impl Future<Output = Result<(), SourceError>> + Send;
}

/// Connector for sources that need no explicit connect step.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysConnected;

impl Connector for AlwaysConnected {
    async fn ensure_connected(&self) -> Result<(), SourceError> {
        Ok(())
    }
}

/// Runs an async connect function until it first succeeds, then becomes a
/// no-op. A failed attempt is retried on the next cycle.
pub struct ConnectOnce<F> {
    connect: F,
    connected: OnceCell<()>,
}

impl<F> ConnectOnce<F> {
    pub fn new(connect: F) -> Self {
        Self {
            connect,
            connected: OnceCell::new(),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected.initialized()
    }
}

impl<F, Fut, E> Connector for ConnectOnce<F>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), E>> + Send,
    E: Display,
{
    fn ensure_connected(&self) -> impl Future<Output = Result<(), SourceError>> + Send {
        async move {
            self.connected
                .get_or_try_init(|| async {
                    (self.connect)().await.map_err(SourceError::from_display)
                })
                .await
                .map(|_| ())
        }
    }
}
