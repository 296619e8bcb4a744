//! AppState construction and background-task spawning extracted from `main.rs`.
//!
//! Integration tests boot the router through the same path as `serve`.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;

use pb_domain::config::{Config, ConfigSeverity, StoreBackend};
use pb_domain::trace::TraceEvent;
use pb_sessions::{FileStore, LifecycleManager, MemoryStore, SessionStore};

use crate::state::AppState;

/// Validate config, open the session store and return a fully-wired
/// [`AppState`].
pub fn build_app_state(config: Arc<Config>) -> anyhow::Result<AppState> {
    // ── Config validation ────────────────────────────────────────────
    let issues = config.validate();
    for issue in &issues {
        match issue.severity {
            ConfigSeverity::Warning => tracing::warn!("config: {issue}"),
            ConfigSeverity::Error => tracing::error!("config: {issue}"),
        }
    }
    if issues.iter().any(|i| i.severity == ConfigSeverity::Error) {
        anyhow::bail!(
            "config validation failed with {} error(s)",
            issues
                .iter()
                .filter(|i| i.severity == ConfigSeverity::Error)
                .count()
        );
    }

    // ── Session store ────────────────────────────────────────────────
    let store: Arc<dyn SessionStore> = match config.store.backend {
        StoreBackend::Memory => Arc::new(MemoryStore::new()),
        StoreBackend::File => Arc::new(
            FileStore::open(&config.store.state_path).context("opening file session store")?,
        ),
    };
    tracing::info!(backend = store.backend(), "session store ready");

    // ── Lifecycle manager ────────────────────────────────────────────
    let sessions = Arc::new(LifecycleManager::new(config.share.clone(), store.clone()));
    tracing::info!(
        ttl_secs = config.share.session_ttl_secs,
        poll_ms = config.share.status_poll_ms,
        frontend_url = %config.share.frontend_url,
        "session lifecycle ready"
    );

    Ok(AppState {
        config,
        sessions,
        store,
    })
}

/// Spawn the long-running background tokio tasks.
///
/// Call this **after** [`build_app_state`] when running the HTTP server.
pub fn spawn_background_tasks(state: &AppState) {
    // ── Periodic expired-session sweep ───────────────────────────────
    {
        let store = state.store.clone();
        let every = Duration::from_secs(state.config.store.sweep_interval_secs);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            loop {
                interval.tick().await;
                sweep_once(store.as_ref()).await;
            }
        });
    }
    tracing::info!("background tasks spawned");
}

/// Purge expired entries from `store` once.  Returns how many were removed.
pub async fn sweep_once(store: &dyn SessionStore) -> usize {
    let started = Instant::now();
    match store.purge_expired().await {
        Ok(0) => 0,
        Ok(removed) => {
            TraceEvent::StoreSwept {
                backend: store.backend().to_owned(),
                removed,
                elapsed_ms: started.elapsed().as_millis() as u64,
            }
            .emit();
            removed
        }
        Err(e) => {
            tracing::warn!(backend = store.backend(), error = %e, "session store sweep failed");
            0
        }
    }
}
