//! Application state for the HTTP server.

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::ServerConfig;
use crate::db::repository::FullRepository;
use crate::query::DEFAULT_PAGE_SIZE;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Repository instance for database operations
    pub repository: Arc<dyn FullRepository>,
    /// Page size used when a list request does not set `page[size]`
    pub page_size: u64,
    /// Directory served under `/static`
    pub static_root: PathBuf,
}

impl AppState {
    /// Create a new application state with the given repository and default settings.
    pub fn new(repository: Arc<dyn FullRepository>) -> Self {
        Self {
            repository,
            page_size: DEFAULT_PAGE_SIZE,
            static_root: PathBuf::from("staticfiles"),
        }
    }

    /// Create the state for a configured server.
    pub fn from_config(repository: Arc<dyn FullRepository>, config: &ServerConfig) -> Self {
        Self {
            repository,
            page_size: config.page_size,
            static_root: config.static_root.clone(),
        }
    }

    pub fn with_page_size(mut self, page_size: u64) -> Self {
        self.page_size = page_size;
        self
    }
}
