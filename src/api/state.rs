//! Application state for the API server

use crate::{Config, MediaDepot};
use std::sync::Arc;

/// Shared application state accessible to all route handlers
///
/// This struct is cloned for each request (cheap Arc clone) and provides
/// access to the depot instance and configuration.
#[derive(Clone)]
pub struct AppState {
    /// The main MediaDepot instance
    pub depot: Arc<MediaDepot>,

    /// Configuration (for read access; the depot holds its own copy)
    pub config: Arc<Config>,
}

impl AppState {
    /// Create a new AppState
    pub fn new(depot: Arc<MediaDepot>, config: Arc<Config>) -> Self {
        Self { depot, config }
    }
}
