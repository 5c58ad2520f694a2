// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Periodic Sync Engine
//!
//! Background task that keeps a [`SyncState`] up to date with a
//! [`SyncSource`] while a [`WalletSession`] is connected.
//!
//! ## Strategy
//!
//! The engine is a single driver task that owns the state and is its only
//! writer. A fetch cycle is started:
//! 1. on activation, when the session connects (or switches account), and
//!    when the dependency list changes;
//! 2. on every interval tick while connected;
//! 3. on demand through [`SyncHandle::refetch`].
//!
//! At most one fetch is outstanding at a time. Interval ticks that fire
//! during a fetch are skipped. Manual refreshes and dependency changes that
//! arrive during a fetch are coalesced into one follow-up cycle that starts
//! as soon as the outstanding fetch resolves.
//!
//! ## Shutdown
//!
//! Uses `tokio_util::sync::CancellationToken`. Dropping or shutting down the
//! [`SyncHandle`] stops the driver; a fetch still running at that point is
//! detached and its result never reaches the state.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::clock::{completion_timestamp, Clock, SystemClock};
use super::source::{AlwaysConnected, Connector, SyncSource};
use super::state::{Dependencies, SyncState};
use crate::error::{SourceError, SyncError};
use crate::models::WalletAddress;
use crate::notify::{LogNotifier, Notification, Notifier, SYNC_SUCCESS_MESSAGE};
use crate::session::WalletSession;

/// Default interval between periodic cycles.
pub const DEFAULT_SYNC_INTERVAL: Duration = Duration::from_millis(30_000);

/// Shortest accepted interval.
const MIN_SYNC_INTERVAL: Duration = Duration::from_millis(1);

/// Longest accepted interval (one year). Keeps timer deadlines representable.
pub const MAX_SYNC_INTERVAL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Warning shown when a manual refresh is requested without a wallet.
const DISCONNECTED_MESSAGE: &str = "Connect a wallet to synchronize data";

/// What started a fetch cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOrigin {
    Activation,
    Session,
    Dependencies,
    Interval,
    Manual,
}

impl fmt::Display for CycleOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CycleOrigin::Activation => "activation",
            CycleOrigin::Session => "session",
            CycleOrigin::Dependencies => "dependencies",
            CycleOrigin::Interval => "interval",
            CycleOrigin::Manual => "manual",
        };
        f.write_str(name)
    }
}

type Reply = oneshot::Sender<Result<(), SyncError>>;

enum Command {
    Refetch(Reply),
    Dependencies(Dependencies),
}

/// The outstanding fetch of an engine.
struct InFlight<T> {
    origin: CycleOrigin,
    task: JoinHandle<Result<T, SourceError>>,
    waiters: Vec<Reply>,
    started: Instant,
    /// Set when the session changed under the fetch; the result is dropped.
    discard: bool,
}

/// Cycle requested while another was outstanding.
struct FollowUp {
    origin: CycleOrigin,
    waiters: Vec<Reply>,
}

// =============================================================================
// Builder
// =============================================================================

/// Configuration of a sync engine; [`spawn`](PeriodicSync::spawn) starts it.
///
/// ```rust,ignore
/// let handle = PeriodicSync::new(FnSource::new(fetch_loans), Vec::<Loan>::new())
///     .interval(Duration::from_secs(15))
///     .dependencies(Dependencies::new().with(&account))
///     .spawn(&session);
/// ```
pub struct PeriodicSync<T, S, C = AlwaysConnected> {
    source: S,
    initial: T,
    interval: Duration,
    dependencies: Dependencies,
    connector: C,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    name: String,
}

impl<T, S> PeriodicSync<T, S, AlwaysConnected>
where
    T: Clone + Send + Sync + 'static,
    S: SyncSource<T>,
{
    pub fn new(source: S, initial: T) -> Self {
        Self {
            source,
            initial,
            interval: DEFAULT_SYNC_INTERVAL,
            dependencies: Dependencies::default(),
            connector: AlwaysConnected,
            notifier: Arc::new(LogNotifier),
            clock: Arc::new(SystemClock),
            name: "sync".to_string(),
        }
    }
}

impl<T, S, C> PeriodicSync<T, S, C>
where
    T: Clone + Send + Sync + 'static,
    S: SyncSource<T>,
    C: Connector,
{
    /// Interval between periodic cycles, clamped to `1ms..=MAX_SYNC_INTERVAL`.
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval.clamp(MIN_SYNC_INTERVAL, MAX_SYNC_INTERVAL);
        self
    }

    /// Initial dependency list.
    pub fn dependencies(mut self, dependencies: Dependencies) -> Self {
        self.dependencies = dependencies;
        self
    }

    /// Connectivity step run before every fetch.
    pub fn connector<C2: Connector>(self, connector: C2) -> PeriodicSync<T, S, C2> {
        PeriodicSync {
            source: self.source,
            initial: self.initial,
            interval: self.interval,
            dependencies: self.dependencies,
            connector,
            notifier: self.notifier,
            clock: self.clock,
            name: self.name,
        }
    }

    pub fn notifier(mut self, notifier: impl Notifier) -> Self {
        self.notifier = Arc::new(notifier);
        self
    }

    pub fn clock(mut self, clock: impl Clock) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Name used in log events.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Start the engine on the current tokio runtime.
    pub fn spawn(self, session: &WalletSession) -> SyncHandle<T> {
        let id = Uuid::new_v4();
        let (state_tx, state_rx) = watch::channel(SyncState::new(self.initial));
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let shutdown = CancellationToken::new();

        let driver = Driver {
            id,
            name: self.name,
            source: Arc::new(self.source),
            connector: Arc::new(self.connector),
            notifier: self.notifier,
            clock: self.clock,
            state: state_tx,
            session: session.subscribe(),
            commands: command_rx,
            dependencies: self.dependencies,
            interval: self.interval,
            in_flight: None,
            follow_up: None,
        };
        let task = tokio::spawn(driver.run(shutdown.clone()));

        SyncHandle {
            id,
            state: state_rx,
            commands: command_tx,
            shutdown: shutdown.clone(),
            driver: task,
            _teardown: shutdown.drop_guard(),
        }
    }
}

// =============================================================================
// Handle
// =============================================================================

/// Owner's handle to a running engine. Dropping it tears the engine down.
pub struct SyncHandle<T> {
    id: Uuid,
    state: watch::Receiver<SyncState<T>>,
    commands: mpsc::UnboundedSender<Command>,
    shutdown: CancellationToken,
    driver: JoinHandle<()>,
    _teardown: DropGuard,
}

impl<T: Clone> SyncHandle<T> {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Current state snapshot.
    pub fn state(&self) -> SyncState<T> {
        self.state.borrow().clone()
    }

    /// Receiver notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<SyncState<T>> {
        self.state.clone()
    }

    /// Run one fetch cycle now and wait for its outcome.
    ///
    /// If a fetch is already outstanding, the refresh runs right after it.
    /// The outcome is also sent to the engine's notifier.
    pub async fn refetch(&self) -> Result<(), SyncError> {
        let (reply, outcome) = oneshot::channel();
        self.commands
            .send(Command::Refetch(reply))
            .map_err(|_| SyncError::Shutdown)?;
        outcome.await.unwrap_or(Err(SyncError::Shutdown))
    }

    /// Replace the dependency list; a changed list triggers a cycle.
    pub fn set_dependencies(&self, dependencies: Dependencies) -> Result<(), SyncError> {
        self.commands
            .send(Command::Dependencies(dependencies))
            .map_err(|_| SyncError::Shutdown)
    }

    pub fn is_running(&self) -> bool {
        !self.shutdown.is_cancelled() && !self.driver.is_finished()
    }

    /// Stop the engine and wait for the driver task to exit.
    pub async fn shutdown(self) {
        let SyncHandle {
            id,
            shutdown,
            driver,
            ..
        } = self;
        shutdown.cancel();
        if let Err(e) = driver.await {
            warn!(sync_id = %id, error = %e, "Sync driver task failed");
        }
    }
}

// =============================================================================
// Driver
// =============================================================================

struct Driver<T, S, C> {
    id: Uuid,
    name: String,
    source: Arc<S>,
    connector: Arc<C>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    state: watch::Sender<SyncState<T>>,
    session: watch::Receiver<Option<WalletAddress>>,
    commands: mpsc::UnboundedReceiver<Command>,
    dependencies: Dependencies,
    interval: Duration,
    in_flight: Option<InFlight<T>>,
    follow_up: Option<FollowUp>,
}

impl<T, S, C> Driver<T, S, C>
where
    T: Clone + Send + Sync + 'static,
    S: SyncSource<T>,
    C: Connector,
{
    async fn run(mut self, shutdown: CancellationToken) {
        info!(
            sync_id = %self.id,
            name = %self.name,
            interval_ms = self.interval.as_millis() as u64,
            "Sync engine starting"
        );

        let mut connected = self.session.borrow_and_update().is_some();
        let mut session_open = true;
        let mut ticker = new_ticker(self.interval);

        if connected {
            self.start_cycle(CycleOrigin::Activation, Vec::new());
        } else {
            debug!(sync_id = %self.id, "Wallet not connected, waiting");
            self.settle_disconnected();
        }

        loop {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => break,

                joined = next_completion(&mut self.in_flight) => {
                    self.finish_cycle(joined, connected);
                }

                changed = self.session.changed(), if session_open => {
                    if changed.is_err() {
                        debug!(sync_id = %self.id, "Wallet session dropped, keeping last status");
                        session_open = false;
                        continue;
                    }
                    let account = self.session.borrow_and_update().clone();
                    match account {
                        Some(address) => {
                            info!(sync_id = %self.id, address = %address, "Wallet connected, syncing");
                            let waiters = if connected {
                                self.supersede_in_flight()
                            } else {
                                Vec::new()
                            };
                            connected = true;
                            ticker.reset();
                            self.start_cycle(CycleOrigin::Session, waiters);
                        }
                        None => {
                            info!(sync_id = %self.id, "Wallet disconnected, pausing sync");
                            connected = false;
                            self.settle_disconnected();
                        }
                    }
                }

                command = self.commands.recv() => match command {
                    Some(Command::Refetch(reply)) => {
                        if connected {
                            self.start_cycle(CycleOrigin::Manual, vec![reply]);
                        } else {
                            self.notifier.notify(Notification::warning(DISCONNECTED_MESSAGE));
                            let _ = reply.send(Err(SyncError::Disconnected));
                        }
                    }
                    Some(Command::Dependencies(dependencies)) => {
                        if dependencies != self.dependencies {
                            debug!(
                                sync_id = %self.id,
                                dependencies = ?dependencies.values(),
                                "Dependencies changed"
                            );
                            self.dependencies = dependencies;
                            if connected {
                                ticker.reset();
                                self.start_cycle(CycleOrigin::Dependencies, Vec::new());
                            }
                        }
                    }
                    // Every handle is gone.
                    None => break,
                },

                _ = ticker.tick(), if connected => {
                    if self.in_flight.is_some() {
                        debug!(sync_id = %self.id, "Fetch still outstanding, skipping tick");
                    } else {
                        self.start_cycle(CycleOrigin::Interval, Vec::new());
                    }
                }
            }
        }

        self.teardown();
    }

    /// Issue a fetch cycle, or queue it behind the outstanding one.
    ///
    /// Only manual refreshes carry waiters, so a cycle with waiters is
    /// always run (and notified) as a manual one.
    fn start_cycle(&mut self, origin: CycleOrigin, waiters: Vec<Reply>) {
        let origin = if waiters.is_empty() {
            origin
        } else {
            CycleOrigin::Manual
        };
        if self.in_flight.is_some() {
            debug!(sync_id = %self.id, origin = %origin, "Fetch outstanding, queueing follow-up cycle");
            match &mut self.follow_up {
                Some(next) => {
                    if origin == CycleOrigin::Manual {
                        next.origin = CycleOrigin::Manual;
                    }
                    next.waiters.extend(waiters);
                }
                None => self.follow_up = Some(FollowUp { origin, waiters }),
            }
            return;
        }

        self.state.send_modify(|state| {
            state.is_loading = true;
            state.error = None;
        });

        let source = Arc::clone(&self.source);
        let connector = Arc::clone(&self.connector);
        let task = tokio::spawn(async move {
            connector.ensure_connected().await?;
            source.fetch().await
        });

        debug!(sync_id = %self.id, origin = %origin, "Fetch cycle started");
        self.in_flight = Some(InFlight {
            origin,
            task,
            waiters,
            started: Instant::now(),
            discard: false,
        });
    }

    /// Apply the outcome of the outstanding fetch, then run any follow-up.
    fn finish_cycle(&mut self, joined: Result<Result<T, SourceError>, JoinError>, connected: bool) {
        let Some(flight) = self.in_flight.take() else {
            return;
        };
        let elapsed_ms = flight.started.elapsed().as_millis() as u64;
        let outcome = joined.unwrap_or_else(|e| Err(join_failure(e)));

        if flight.discard {
            debug!(
                sync_id = %self.id,
                origin = %flight.origin,
                elapsed_ms,
                "Discarding result of superseded fetch"
            );
        } else {
            let result = self.apply(outcome, flight.origin, elapsed_ms);
            if flight.origin == CycleOrigin::Manual {
                self.notifier.notify(match &result {
                    Ok(()) => Notification::success(SYNC_SUCCESS_MESSAGE),
                    Err(e) => Notification::error(e.message.clone()),
                });
            }
            for waiter in flight.waiters {
                let _ = waiter.send(result.clone().map_err(SyncError::from));
            }
        }

        if connected {
            if let Some(next) = self.follow_up.take() {
                self.start_cycle(next.origin, next.waiters);
            }
        }
    }

    /// Publish one cycle's state transition.
    fn apply(
        &mut self,
        outcome: Result<T, SourceError>,
        origin: CycleOrigin,
        elapsed_ms: u64,
    ) -> Result<(), SourceError> {
        match outcome {
            Ok(data) => {
                let previous = self.state.borrow().last_synced;
                let completed_at = completion_timestamp(previous, self.clock.now());
                self.state.send_modify(|state| {
                    state.data = data;
                    state.last_synced = Some(completed_at);
                    state.is_loading = false;
                });
                info!(
                    sync_id = %self.id,
                    name = %self.name,
                    origin = %origin,
                    elapsed_ms,
                    "Sync cycle completed"
                );
                Ok(())
            }
            Err(err) => {
                self.state.send_modify(|state| {
                    state.error = Some(err.message.clone());
                    state.is_loading = false;
                });
                warn!(
                    sync_id = %self.id,
                    name = %self.name,
                    origin = %origin,
                    elapsed_ms,
                    error = %err,
                    "Sync cycle failed, will retry"
                );
                Err(err)
            }
        }
    }

    /// Drop the outstanding fetch's result and hand back its waiters.
    fn supersede_in_flight(&mut self) -> Vec<Reply> {
        match &mut self.in_flight {
            Some(flight) => {
                flight.discard = true;
                std::mem::take(&mut flight.waiters)
            }
            None => Vec::new(),
        }
    }

    fn settle_disconnected(&mut self) {
        let mut waiters = self.supersede_in_flight();
        if let Some(next) = self.follow_up.take() {
            waiters.extend(next.waiters);
        }
        if !waiters.is_empty() {
            self.notifier.notify(Notification::warning(DISCONNECTED_MESSAGE));
        }
        for waiter in waiters {
            let _ = waiter.send(Err(SyncError::Disconnected));
        }
        self.state.send_if_modified(|state| std::mem::replace(&mut state.is_loading, false));
    }

    fn teardown(&mut self) {
        let mut waiters = Vec::new();
        if let Some(flight) = self.in_flight.take() {
            // Dropping the JoinHandle detaches the task; its result goes nowhere.
            debug!(sync_id = %self.id, origin = %flight.origin, "Detaching outstanding fetch");
            waiters.extend(flight.waiters);
        }
        if let Some(next) = self.follow_up.take() {
            waiters.extend(next.waiters);
        }
        for waiter in waiters {
            let _ = waiter.send(Err(SyncError::Shutdown));
        }
        info!(sync_id = %self.id, name = %self.name, "Sync engine shutting down");
    }
}

fn new_ticker(period: Duration) -> Interval {
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker
}

/// Resolves when the outstanding fetch finishes; pending when there is none.
async fn next_completion<T>(
    in_flight: &mut Option<InFlight<T>>,
) -> Result<Result<T, SourceError>, JoinError> {
    match in_flight {
        Some(flight) => (&mut flight.task).await,
        None => std::future::pending().await,
    }
}

fn join_failure(err: JoinError) -> SourceError {
    if err.is_panic() {
        SourceError::new("Data source panicked")
    } else {
        SourceError::new("Data source task was cancelled")
    }
}
