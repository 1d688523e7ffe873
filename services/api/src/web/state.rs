//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use beer_journal_core::ports::{BlobStore, DatabaseService};
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all handlers.
///
/// `db` wraps the single process-wide connection pool.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn DatabaseService>,
    pub blob: Arc<dyn BlobStore>,
    pub config: Arc<Config>,
}
