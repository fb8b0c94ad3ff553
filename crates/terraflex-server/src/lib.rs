//! The HTTP surface: six endpoints implementing the state-backend wire
//! protocol over a [`terraflex_engine::StateLockController`].

pub mod app;
pub mod error;
pub mod routes;

pub use app::build;
