//! `Sheetboard` -- kanban task board client library.
//!
//! Holds the authoritative in-memory task collection, applies optimistic
//! local mutations, and persists them to a Google Sheets endpoint through
//! a debounced replace-all write protocol.

pub mod config;
pub mod gateway;
pub mod session;
pub mod store;
pub mod sync;
