//! Request and response envelopes for the Apps Script endpoint.
//!
//! Every call, read or write, comes back as
//! `{ "status": "success" | "error", "data": ..., "message": ... }`.
//! Transport-level success means nothing on its own: a 200 response with
//! `status: "error"` is still a failure, and write success is signaled
//! only by the explicit marker in the body.

use serde::{Deserialize, Serialize};

use crate::task::Task;

/// Fallback error text when a failure envelope carries no message.
pub const GENERIC_API_ERROR: &str = "Erro na API.";

/// Action strings the endpoint dispatches on.
pub mod action {
    /// Read the full task collection of one sheet.
    pub const GET_TASKS: &str = "getTasks";
    /// List the names of all board sheets.
    pub const GET_SHEET_NAMES: &str = "getSheetNames";
    /// Overwrite one sheet's task collection wholesale.
    pub const SAVE_TASKS: &str = "saveTasks";
    /// Create a new, empty board sheet.
    pub const CREATE_SHEET: &str = "createSheet";
}

/// Success/failure marker inside a response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    /// The requested action was applied.
    Success,
    /// The action failed; `message` explains why.
    Error,
}

/// Generic response envelope wrapping any payload type.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    /// Explicit success marker. The only authoritative signal.
    pub status: ResponseStatus,
    /// Payload, present on successful reads.
    #[serde(default)]
    pub data: Option<T>,
    /// Human-readable error description, usually present on failures.
    #[serde(default)]
    pub message: Option<String>,
}

impl<T> Envelope<T> {
    /// Collapses the envelope into the payload or an error message.
    ///
    /// # Errors
    ///
    /// Returns the envelope's `message` (or [`GENERIC_API_ERROR`] when
    /// absent) for failure envelopes, and [`GENERIC_API_ERROR`] for a
    /// success envelope missing its payload.
    pub fn into_data(self) -> Result<T, String> {
        match self.status {
            ResponseStatus::Success => {
                self.data.ok_or_else(|| GENERIC_API_ERROR.to_string())
            }
            ResponseStatus::Error => {
                Err(self.message.unwrap_or_else(|| GENERIC_API_ERROR.to_string()))
            }
        }
    }

    /// Collapses the envelope into `()` or an error message, for writes
    /// whose success carries no payload.
    ///
    /// # Errors
    ///
    /// Returns the envelope's `message` (or [`GENERIC_API_ERROR`]) for
    /// failure envelopes.
    pub fn into_ack(self) -> Result<(), String> {
        match self.status {
            ResponseStatus::Success => Ok(()),
            ResponseStatus::Error => {
                Err(self.message.unwrap_or_else(|| GENERIC_API_ERROR.to_string()))
            }
        }
    }
}

/// Body of a `saveTasks` write: the entire collection, never a diff.
#[derive(Debug, Serialize)]
pub struct SaveTasksRequest<'a> {
    /// Always [`action::SAVE_TASKS`].
    pub action: &'static str,
    /// Target board sheet; omitted for single-board deployments.
    #[serde(rename = "sheetName", skip_serializing_if = "Option::is_none")]
    pub sheet_name: Option<&'a str>,
    /// Full replacement task collection.
    pub payload: &'a [Task],
}

impl<'a> SaveTasksRequest<'a> {
    /// Builds a replace-all write for the given board.
    #[must_use]
    pub const fn new(sheet_name: Option<&'a str>, payload: &'a [Task]) -> Self {
        Self {
            action: action::SAVE_TASKS,
            sheet_name,
            payload,
        }
    }
}

/// Body of a `createSheet` request.
#[derive(Debug, Serialize)]
pub struct CreateSheetRequest<'a> {
    /// Always [`action::CREATE_SHEET`].
    pub action: &'static str,
    /// Name of the board sheet to create.
    #[serde(rename = "sheetName")]
    pub sheet_name: &'a str,
}

impl<'a> CreateSheetRequest<'a> {
    /// Builds a create-board request.
    #[must_use]
    pub const fn new(sheet_name: &'a str) -> Self {
        Self {
            action: action::CREATE_SHEET,
            sheet_name,
        }
    }
}
