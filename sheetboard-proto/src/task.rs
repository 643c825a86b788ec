//! The task record as the sheet endpoint stores it.
//!
//! Column headers in the spreadsheet are Portuguese (`Tarefa`,
//! `Descrição`, `Status`) and the Apps Script matches them by exact
//! string, so the serde renames here are a hard contract: changing one
//! silently desynchronizes the client from the sheet.

use serde::{Deserialize, Serialize};

/// Unique identifier for a task, client-generated and stable for the
/// task's lifetime.
///
/// The sheet stores it as an opaque string; the client mints ids of the
/// form `task-<millis-since-epoch>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    /// Wraps an existing identifier string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Mints an identifier from a creation timestamp in milliseconds.
    #[must_use]
    pub fn from_timestamp_ms(ms: u64) -> Self {
        Self(format!("task-{ms}"))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single row of the board sheet.
///
/// `description` defaults to empty on deserialization because rows
/// created before the column existed come back without the key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Opaque client-generated identifier (`id` column).
    pub id: TaskId,
    /// Task title (`Tarefa` column). Never empty.
    #[serde(rename = "Tarefa")]
    pub title: String,
    /// Free-text details (`Descrição` column). May be empty.
    #[serde(rename = "Descrição", default)]
    pub description: String,
    /// Column label the task currently sits in (`Status` column).
    #[serde(rename = "Status")]
    pub status: String,
}
