//! Shared types and errors used across every crate in the workspace.
//!
//! This crate has no I/O of its own: it defines the vocabulary
//! (`ItemKey`, `LockBody`, `Data`, `Error`) that storage drivers,
//! transformers, the engine, and the HTTP surface all share, so none of
//! them need to depend on each other just to talk about the same
//! concepts.

pub mod error;
pub mod item_key;
pub mod lock;

pub use error::{Error, Result};
pub use item_key::{FromParams, ItemKey};
pub use lock::{Data, LockBody};
