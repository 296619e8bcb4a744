use std::sync::Arc;

use pb_domain::config::Config;
use pb_sessions::{LifecycleManager, SessionStore};

/// Shared application state passed to all API handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub sessions: Arc<LifecycleManager>,
    /// The same store the lifecycle manager writes to; held here for the
    /// background sweeper.
    pub store: Arc<dyn SessionStore>,
}
