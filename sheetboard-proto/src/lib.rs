//! Wire contract types for the `Sheetboard` client.
//!
//! The remote store is a Google Sheet fronted by an Apps Script web app
//! that maps JSON object keys to column headers *verbatim*. Every key
//! name the endpoint understands is spelled exactly once, in this crate;
//! the rest of the workspace works with ordinary Rust field names.

pub mod envelope;
pub mod task;

pub use envelope::{
    CreateSheetRequest, Envelope, GENERIC_API_ERROR, ResponseStatus, SaveTasksRequest, action,
};
pub use task::{Task, TaskId};
