//! Board session controller: the owner of all client-side board state.
//!
//! Orchestrates initial load, exposes mutation intents to the UI layer,
//! and routes every new snapshot through the debounced sync driver.
//! Mutations apply optimistically -- the collection the UI renders is
//! swapped before the network ever hears about it, and persistence
//! results only ever touch the saving/error indicators, never the task
//! data.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use thiserror::Error;
use tokio::sync::mpsc;

use sheetboard_proto::{Task, TaskId};

use crate::gateway::{GatewayError, SheetGateway};
use crate::store::{self, StatusSet, StoreError, TaskDraft};
use crate::sync::{self, BoardWriter, Snapshot, SyncEvent, SyncHandle};

/// Buffer for driver-to-session progress events.
const SYNC_EVENT_BUFFER: usize = 64;

/// Errors surfaced to the immediate caller of a session intent.
///
/// Gateway failures during load/save are *not* here -- those surface as
/// the session's dismissible `last_error` message instead.
#[derive(Debug, Error)]
pub enum SessionError {
    /// A task mutation was rejected by validation.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// A board-creation call failed remotely.
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    /// Board name is empty after trimming.
    #[error("O nome do projeto não pode estar em branco.")]
    EmptyBoardName,
    /// Board name already exists, compared case-insensitively.
    #[error("O projeto \"{0}\" já existe.")]
    DuplicateBoard(String),
}

/// Drag completion as reported by the rendering layer.
///
/// The gesture-capture library lives behind this event type; nothing
/// else about it leaks into the core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropEvent {
    /// The dragged task.
    pub task_id: TaskId,
    /// Column the drag started in.
    pub from_status: String,
    /// Column the card was dropped on.
    pub to_status: String,
    /// Position within the source column.
    pub from_index: usize,
    /// Position within the destination column.
    pub to_index: usize,
}

impl DropEvent {
    /// Whether the card landed exactly where it started.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.from_status == self.to_status && self.from_index == self.to_index
    }
}

/// Client-side controller for one board-backed session.
pub struct BoardSession {
    gateway: Arc<SheetGateway>,
    statuses: StatusSet,
    quiet_window: Duration,
    tasks: Snapshot,
    boards: Vec<String>,
    current_board: Option<String>,
    loading: bool,
    saving: bool,
    last_error: Option<String>,
    sync: Option<SyncHandle>,
    sync_events: Option<mpsc::Receiver<SyncEvent>>,
}

impl BoardSession {
    /// Creates a session over the given gateway. No network activity
    /// happens until [`Self::start`] or [`Self::load_board`].
    #[must_use]
    pub fn new(gateway: Arc<SheetGateway>, statuses: StatusSet, quiet_window: Duration) -> Self {
        Self {
            gateway,
            statuses,
            quiet_window,
            tasks: Arc::new(Vec::new()),
            boards: Vec::new(),
            current_board: None,
            loading: false,
            saving: false,
            last_error: None,
            sync: None,
            sync_events: None,
        }
    }

    // -- startup / board selection ---------------------------------------

    /// Discovers the available boards and loads the first one.
    ///
    /// An empty board list is a valid "no project yet" state, not an
    /// error. A listing failure leaves the session idle with a
    /// dismissible message.
    pub async fn start(&mut self) {
        self.loading = true;
        match self.gateway.list_boards().await {
            Ok(names) => {
                tracing::info!(count = names.len(), "boards discovered");
                self.boards = names;
                if let Some(first) = self.boards.first().cloned() {
                    self.load_board(Some(first)).await;
                } else {
                    self.loading = false;
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "board discovery failed");
                self.last_error = Some(format!("Falha ao carregar projetos: {e}"));
                self.loading = false;
            }
        }
    }

    /// Selects `board` and fetches its task collection.
    ///
    /// Any write still pending for the previous board is cancelled; an
    /// in-flight one is left to complete against the old board identity.
    /// A fetch failure leaves the board in a loading-failed state with
    /// an empty collection and a dismissible message.
    pub async fn load_board(&mut self, board: Option<String>) {
        // Dropping the handle closes the old driver's channel.
        self.sync = None;
        self.sync_events = None;
        self.saving = false;
        self.current_board = board;
        self.loading = true;

        match self.gateway.fetch_tasks(self.current_board.as_deref()).await {
            Ok(tasks) => {
                tracing::info!(
                    board = self.current_board.as_deref().unwrap_or("<default>"),
                    count = tasks.len(),
                    "board loaded"
                );
                self.tasks = Arc::new(tasks);
            }
            Err(e) => {
                tracing::warn!(error = %e, "board load failed");
                self.tasks = Arc::new(Vec::new());
                self.last_error = Some(format!("Falha ao carregar tarefas: {e}"));
            }
        }

        let (tx, rx) = mpsc::channel(SYNC_EVENT_BUFFER);
        let writer = BoardWriter::new(Arc::clone(&self.gateway), self.current_board.clone());
        self.sync = Some(sync::spawn(writer, self.quiet_window, tx));
        self.sync_events = Some(rx);
        self.loading = false;
    }

    /// Switches to another known board.
    pub async fn switch_board(&mut self, board: &str) {
        self.load_board(Some(board.to_string())).await;
    }

    /// Creates a new board and switches to it.
    ///
    /// Name validation (non-empty, unique case-insensitively) happens
    /// before any network call; a rejected name never leaves the client.
    ///
    /// # Errors
    ///
    /// [`SessionError::EmptyBoardName`], [`SessionError::DuplicateBoard`],
    /// or the gateway failure from the create call.
    pub async fn create_board(&mut self, name: &str) -> Result<(), SessionError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(SessionError::EmptyBoardName);
        }
        if self
            .boards
            .iter()
            .any(|b| b.to_lowercase() == trimmed.to_lowercase())
        {
            return Err(SessionError::DuplicateBoard(trimmed.to_string()));
        }
        self.gateway.create_board(trimmed).await?;
        tracing::info!(board = trimmed, "board created");
        self.boards.push(trimmed.to_string());
        self.load_board(Some(trimmed.to_string())).await;
        Ok(())
    }

    // -- mutation intents -------------------------------------------------

    /// Creates a task from the form draft and returns its new id.
    ///
    /// # Errors
    ///
    /// Validation errors from the store; nothing reaches the network.
    pub fn create_task(&mut self, draft: TaskDraft) -> Result<TaskId, SessionError> {
        let id = store::allocate_id(&self.tasks, now_ms());
        let next = store::create(&self.tasks, draft, &self.statuses, id.clone())?;
        self.apply(next);
        tracing::info!(task = %id, "task created");
        Ok(id)
    }

    /// Replaces the fields of an existing task from the form draft.
    ///
    /// # Errors
    ///
    /// [`StoreError::TaskNotFound`] for a stale id, plus validation
    /// errors; state is untouched on failure.
    pub fn edit_task(&mut self, id: &TaskId, draft: TaskDraft) -> Result<(), SessionError> {
        let next = store::update(&self.tasks, id, draft, &self.statuses)?;
        self.apply(next);
        tracing::info!(task = %id, "task edited");
        Ok(())
    }

    /// Deletes a task after the caller-supplied confirmation approves.
    ///
    /// Returns whether a task was actually removed. An absent id or a
    /// declined confirmation is a quiet no-op.
    pub fn delete_task<F>(&mut self, id: &TaskId, confirm: F) -> bool
    where
        F: FnOnce(&Task) -> bool,
    {
        let Some(task) = self.tasks.iter().find(|t| &t.id == id) else {
            return false;
        };
        if !confirm(task) {
            return false;
        }
        let next = store::remove(&self.tasks, id);
        self.apply(next);
        tracing::info!(task = %id, "task deleted");
        true
    }

    /// Applies a completed drag gesture.
    ///
    /// A drop back onto the starting slot is ignored. A drop within the
    /// same column still triggers a save even though no field changes:
    /// intra-column order is display-derived and not persisted.
    ///
    /// # Errors
    ///
    /// [`StoreError::UnknownStatus`] if the destination column is not
    /// configured on this board.
    pub fn move_task(&mut self, drop: DropEvent) -> Result<(), SessionError> {
        if drop.is_noop() {
            return Ok(());
        }
        let next = store::move_to_status(&self.tasks, &drop.task_id, &drop.to_status, &self.statuses)?;
        self.apply(next);
        tracing::debug!(task = %drop.task_id, to = drop.to_status, "task moved");
        Ok(())
    }

    /// Swaps in the optimistic snapshot and queues it for persistence.
    fn apply(&mut self, next: Vec<Task>) {
        let snapshot: Snapshot = Arc::new(next);
        self.tasks = Arc::clone(&snapshot);
        if let Some(sync) = &self.sync {
            sync.enqueue(snapshot);
        }
    }

    // -- sync feedback ----------------------------------------------------

    /// Folds pending driver events into the saving/error indicators.
    ///
    /// The UI layer calls this once per tick of its event loop.
    pub fn drain_sync_events(&mut self) {
        if let Some(rx) = &mut self.sync_events {
            while let Ok(event) = rx.try_recv() {
                match event {
                    SyncEvent::SavingChanged(saving) => self.saving = saving,
                    SyncEvent::WriteFailed(msg) => {
                        self.last_error = Some(format!("Falha ao salvar: {msg}"));
                    }
                }
            }
        }
    }

    // -- render state -----------------------------------------------------

    /// Current task collection, in insertion order.
    #[must_use]
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Tasks in one column, in collection order.
    #[must_use]
    pub fn tasks_with_status(&self, status: &str) -> Vec<&Task> {
        self.tasks.iter().filter(|t| t.status == status).collect()
    }

    /// Configured status columns.
    #[must_use]
    pub const fn statuses(&self) -> &StatusSet {
        &self.statuses
    }

    /// Known board names.
    #[must_use]
    pub fn boards(&self) -> &[String] {
        &self.boards
    }

    /// Currently selected board, if any.
    #[must_use]
    pub fn current_board(&self) -> Option<&str> {
        self.current_board.as_deref()
    }

    /// Whether a board load is in progress.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.loading
    }

    /// Whether unsaved work is pending or in flight.
    #[must_use]
    pub const fn is_saving(&self) -> bool {
        self.saving
    }

    /// Last user-visible error message, if not yet dismissed.
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Dismisses the current error message.
    pub fn clear_error(&mut self) {
        self.last_error = None;
    }
}

/// Current wall clock in milliseconds since epoch.
fn now_ms() -> u64 {
    u64::try_from(
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis(),
    )
    .unwrap_or(u64::MAX)
}
