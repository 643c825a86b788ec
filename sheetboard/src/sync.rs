//! Debounced write coalescing between the session and the gateway.
//!
//! Bursty mutation sources (a drag dropping several cards in a row,
//! rapid field edits) must not produce one network write each. The
//! [`SyncMachine`] collapses them: every mutation re-arms a quiet-window
//! timer with the latest snapshot, and only the snapshot alive when the
//! timer fires is ever transmitted. At most one write is in flight and
//! at most one newer snapshot is queued behind it.
//!
//! The machine itself is pure -- inputs are `mutated` / `timer_fired` /
//! `write_resolved`, outputs are [`Effect`]s -- so all four states and
//! their transitions are unit-testable without a runtime. The async
//! driver spawned by [`spawn`] owns the real timer and the write future,
//! and reports progress to the session as [`SyncEvent`]s.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use sheetboard_proto::Task;
use tokio::sync::mpsc;
use tokio::time::{self, Instant};

use crate::gateway::{GatewayError, SheetGateway};

/// An immutable value of the full task collection at one instant.
pub type Snapshot = Arc<Vec<Task>>;

/// The write side of the persistence protocol, as the driver sees it.
///
/// The returned future must own everything it needs so the driver can
/// hold it across mutations that arrive while the write is in flight.
pub trait TaskWriter: Send + 'static {
    /// Persists the snapshot wholesale. No retry, no backoff.
    fn save(
        &self,
        snapshot: Snapshot,
    ) -> impl Future<Output = Result<(), GatewayError>> + Send + 'static;
}

/// [`TaskWriter`] targeting one board sheet through the gateway.
#[derive(Debug, Clone)]
pub struct BoardWriter {
    gateway: Arc<SheetGateway>,
    board: Option<String>,
}

impl BoardWriter {
    /// Binds the writer to a board sheet (`None` for single-board
    /// deployments).
    #[must_use]
    pub const fn new(gateway: Arc<SheetGateway>, board: Option<String>) -> Self {
        Self { gateway, board }
    }
}

impl TaskWriter for BoardWriter {
    fn save(
        &self,
        snapshot: Snapshot,
    ) -> impl Future<Output = Result<(), GatewayError>> + Send + 'static {
        let gateway = Arc::clone(&self.gateway);
        let board = self.board.clone();
        async move { gateway.save_tasks(board.as_deref(), &snapshot).await }
    }
}

/// Observable state of the sync machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// Nothing scheduled, nothing in flight.
    Idle,
    /// The quiet-window timer is armed; no request in flight.
    PendingWrite,
    /// A persistence request is in flight.
    Writing,
    /// A request is in flight and a newer snapshot has superseded it.
    WritingWithPendingRetry,
}

/// Side effect the driver must perform after feeding the machine an
/// input. The machine never performs I/O or timing itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// No driver action required.
    Nothing,
    /// (Re-)arm the quiet-window timer.
    ArmTimer,
    /// Issue a persistence request carrying this snapshot.
    StartWrite(Snapshot),
}

enum State {
    Idle,
    PendingWrite(Snapshot),
    Writing,
    WritingWithPendingRetry(Snapshot),
}

/// Pure debounce/coalescing state machine.
pub struct SyncMachine {
    state: State,
}

impl Default for SyncMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncMachine {
    /// Creates a machine in [`SyncState::Idle`].
    #[must_use]
    pub const fn new() -> Self {
        Self { state: State::Idle }
    }

    /// Current state, for the saving indicator and for tests.
    #[must_use]
    pub const fn state(&self) -> SyncState {
        match self.state {
            State::Idle => SyncState::Idle,
            State::PendingWrite(_) => SyncState::PendingWrite,
            State::Writing => SyncState::Writing,
            State::WritingWithPendingRetry(_) => SyncState::WritingWithPendingRetry,
        }
    }

    /// Whether unsaved work exists anywhere in the pipeline.
    #[must_use]
    pub const fn is_saving(&self) -> bool {
        !matches!(self.state, State::Idle)
    }

    /// A mutation produced `snapshot` as the new authoritative state.
    ///
    /// While idle or pending, the timer is re-armed and any snapshot
    /// captured by the previous arming is superseded. While a write is
    /// in flight, the snapshot is queued as the one to send next; the
    /// in-flight request is left to complete on its own.
    pub fn mutated(&mut self, snapshot: Snapshot) -> Effect {
        match self.state {
            State::Idle | State::PendingWrite(_) => {
                self.state = State::PendingWrite(snapshot);
                Effect::ArmTimer
            }
            State::Writing | State::WritingWithPendingRetry(_) => {
                self.state = State::WritingWithPendingRetry(snapshot);
                Effect::Nothing
            }
        }
    }

    /// The quiet-window timer elapsed.
    ///
    /// Fires the captured snapshot when one is pending; a stale fire in
    /// any other state is ignored.
    pub fn timer_fired(&mut self) -> Effect {
        match std::mem::replace(&mut self.state, State::Idle) {
            State::PendingWrite(snapshot) => {
                self.state = State::Writing;
                Effect::StartWrite(snapshot)
            }
            other => {
                self.state = other;
                Effect::Nothing
            }
        }
    }

    /// The in-flight persistence request resolved, successfully or not.
    ///
    /// Failure handling is identical to success here: the machine never
    /// retries on its own. If a newer snapshot superseded the write, the
    /// timer is re-armed for it.
    pub fn write_resolved(&mut self) -> Effect {
        match std::mem::replace(&mut self.state, State::Idle) {
            State::WritingWithPendingRetry(snapshot) => {
                self.state = State::PendingWrite(snapshot);
                Effect::ArmTimer
            }
            State::Writing => Effect::Nothing,
            other => {
                self.state = other;
                Effect::Nothing
            }
        }
    }
}

/// Progress reports from the driver to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    /// The saving indicator flipped (`true` while state is not idle).
    SavingChanged(bool),
    /// A persistence request failed. The optimistic local snapshot is
    /// left intact; the message is for display only.
    WriteFailed(String),
}

/// Handle for feeding snapshots to a running sync driver.
///
/// Dropping the handle closes the channel: the driver lets any in-flight
/// write complete, schedules nothing further, and exits. That is the
/// board-switch semantics -- an outstanding write for the old board may
/// still land, but no new ones are armed.
#[derive(Debug, Clone)]
pub struct SyncHandle {
    tx: mpsc::UnboundedSender<Snapshot>,
}

impl SyncHandle {
    /// Queues `snapshot` as the latest authoritative state to persist.
    pub fn enqueue(&self, snapshot: Snapshot) {
        if self.tx.send(snapshot).is_err() {
            tracing::warn!("sync driver gone, dropping snapshot");
        }
    }
}

/// Spawns the async debounce driver and returns its feed handle.
///
/// `quiet_window` is the mutation-free interval that must elapse before
/// a snapshot is written (contractually 1500 ms in production).
pub fn spawn<W: TaskWriter>(
    writer: W,
    quiet_window: Duration,
    events: mpsc::Sender<SyncEvent>,
) -> SyncHandle {
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(run(rx, writer, quiet_window, events));
    SyncHandle { tx }
}

type WriteFuture = Pin<Box<dyn Future<Output = Result<(), GatewayError>> + Send>>;

async fn run<W: TaskWriter>(
    mut rx: mpsc::UnboundedReceiver<Snapshot>,
    writer: W,
    quiet_window: Duration,
    events: mpsc::Sender<SyncEvent>,
) {
    let mut machine = SyncMachine::new();
    let mut deadline: Option<Instant> = None;
    let mut in_flight: Option<WriteFuture> = None;
    let mut saving = false;

    loop {
        tokio::select! {
            received = rx.recv() => match received {
                Some(snapshot) => {
                    tracing::debug!(tasks = snapshot.len(), state = ?machine.state(), "snapshot queued");
                    if machine.mutated(snapshot) == Effect::ArmTimer {
                        deadline = Some(Instant::now() + quiet_window);
                    }
                    report_saving(&events, &machine, &mut saving);
                }
                None => break,
            },
            () = sleep_until_opt(deadline) => {
                deadline = None;
                if let Effect::StartWrite(snapshot) = machine.timer_fired() {
                    tracing::debug!(tasks = snapshot.len(), "quiet window elapsed, writing");
                    in_flight = Some(Box::pin(writer.save(snapshot)));
                }
            },
            result = poll_write(&mut in_flight) => {
                in_flight = None;
                if let Err(e) = result {
                    tracing::warn!(error = %e, "persistence write failed");
                    send_event(&events, SyncEvent::WriteFailed(e.to_string()));
                }
                if machine.write_resolved() == Effect::ArmTimer {
                    deadline = Some(Instant::now() + quiet_window);
                }
                report_saving(&events, &machine, &mut saving);
            },
        }
    }

    // Channel closed (board switch or session shutdown). The in-flight
    // write may still complete against the old board identity.
    if let Some(write) = in_flight.take()
        && let Err(e) = write.await
    {
        tracing::warn!(error = %e, "final in-flight write failed");
    }
    tracing::debug!("sync driver stopped");
}

async fn sleep_until_opt(deadline: Option<Instant>) {
    match deadline {
        Some(d) => time::sleep_until(d).await,
        None => std::future::pending().await,
    }
}

async fn poll_write(write: &mut Option<WriteFuture>) -> Result<(), GatewayError> {
    match write.as_mut() {
        Some(f) => f.as_mut().await,
        None => std::future::pending().await,
    }
}

fn report_saving(events: &mpsc::Sender<SyncEvent>, machine: &SyncMachine, saving: &mut bool) {
    let now = machine.is_saving();
    if now != *saving {
        *saving = now;
        send_event(events, SyncEvent::SavingChanged(now));
    }
}

fn send_event(events: &mpsc::Sender<SyncEvent>, event: SyncEvent) {
    if let Err(e) = events.try_send(event) {
        tracing::warn!(error = %e, "sync event dropped");
    }
}
