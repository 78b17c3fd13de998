//! # Application State
//!
//! Shared state for the Axum application. Analyses live in an in-memory
//! [`Store`]; nothing is persisted across restarts.
//!
//! Every analysis runs through the same [`MappingEngine`], so all sessions
//! share one embedding cache: a requirement embedded for one analysis is a
//! cache hit for the next.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use ctrlmap_engine::{Analysis, MappingEngine};
use ctrlmap_justify::JustificationGenerator;
use parking_lot::RwLock;
use uuid::Uuid;

// -- Generic In-Memory Store --------------------------------------------------

/// Thread-safe, cloneable in-memory key-value store.
///
/// The lock is `parking_lot` and is never held across `.await` points.
#[derive(Debug)]
pub struct Store<T: Clone + Send + Sync> {
    data: Arc<RwLock<HashMap<Uuid, T>>>,
}

impl<T: Clone + Send + Sync> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
        }
    }
}

impl<T: Clone + Send + Sync> Store<T> {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Insert a record, returning the previous value if the key existed.
    pub fn insert(&self, id: Uuid, value: T) -> Option<T> {
        self.data.write().insert(id, value)
    }

    /// Retrieve a record by ID.
    pub fn get(&self, id: &Uuid) -> Option<T> {
        self.data.read().get(id).cloned()
    }

    /// List all records.
    pub fn list(&self) -> Vec<T> {
        self.data.read().values().cloned().collect()
    }

    /// Read a record under the lock without cloning it.
    pub fn with<R>(&self, id: &Uuid, f: impl FnOnce(&T) -> R) -> Option<R> {
        self.data.read().get(id).map(f)
    }

    /// Atomically read-validate-update a record.
    ///
    /// The closure runs under a single write lock. Returns `None` if the
    /// record doesn't exist, or `Some` with the closure's `Result`.
    pub fn try_update<R, E>(
        &self,
        id: &Uuid,
        f: impl FnOnce(&mut T) -> Result<R, E>,
    ) -> Option<Result<R, E>> {
        self.data.write().get_mut(id).map(f)
    }

    /// Remove a record by ID.
    pub fn remove(&self, id: &Uuid) -> Option<T> {
        self.data.write().remove(id)
    }

    /// Return the number of records.
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Clone + Send + Sync> Default for Store<T> {
    fn default() -> Self {
        Self::new()
    }
}

// -- Records ------------------------------------------------------------------

/// One stored analysis session.
#[derive(Debug, Clone)]
pub struct AnalysisRecord {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    /// Caller-supplied label for the source framework.
    pub source_name: Option<String>,
    /// Caller-supplied label for the target framework.
    pub target_name: Option<String>,
    pub analysis: Analysis,
}

// -- Configuration ------------------------------------------------------------

/// Server configuration read from the environment.
#[derive(Clone)]
pub struct AppConfig {
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// Static bearer token. If `None`, authentication is disabled.
    pub auth_token: Option<String>,
    /// Whether to configure a justification generator at startup.
    pub justification_enabled: bool,
}

impl AppConfig {
    /// Read `PORT`, `AUTH_TOKEN` and `CTRLMAP_JUSTIFICATION_ENABLED`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let port = lookup("PORT")
            .and_then(|p| p.trim().parse().ok())
            .unwrap_or(defaults.port);
        let auth_token = lookup("AUTH_TOKEN").filter(|t| !t.trim().is_empty());
        let justification_enabled = lookup("CTRLMAP_JUSTIFICATION_ENABLED")
            .map(|v| !matches!(v.trim().to_ascii_lowercase().as_str(), "0" | "false" | "no" | "off"))
            .unwrap_or(defaults.justification_enabled);
        Self {
            port,
            auth_token,
            justification_enabled,
        }
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("port", &self.port)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "[REDACTED]"))
            .field("justification_enabled", &self.justification_enabled)
            .finish()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            auth_token: None,
            justification_enabled: true,
        }
    }
}

// -- Application State --------------------------------------------------------

/// Shared application state, cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    pub analyses: Store<AnalysisRecord>,
    pub engine: Arc<MappingEngine>,
    /// `None` when justification generation is not configured; the
    /// justification endpoint then answers 503.
    pub generator: Option<Arc<dyn JustificationGenerator>>,
    pub config: AppConfig,
}

impl AppState {
    /// State with default configuration and no generator.
    pub fn new(engine: MappingEngine) -> Self {
        Self::with_config(AppConfig::default(), engine, None)
    }

    /// State with explicit configuration and an optional generator.
    pub fn with_config(
        config: AppConfig,
        engine: MappingEngine,
        generator: Option<Arc<dyn JustificationGenerator>>,
    ) -> Self {
        Self {
            analyses: Store::new(),
            engine: Arc::new(engine),
            generator,
            config,
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("analyses", &self.analyses.len())
            .field("engine", &self.engine)
            .field("generator", &self.generator.is_some())
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ctrlmap_embed::{EmbeddingProvider, HashingEmbedder};

    fn engine() -> MappingEngine {
        MappingEngine::new(EmbeddingProvider::new(Arc::new(HashingEmbedder::new(32).unwrap())))
    }

    #[test]
    fn store_insert_get_remove() {
        let store: Store<String> = Store::new();
        let id = Uuid::new_v4();
        assert!(store.insert(id, "a".into()).is_none());
        assert_eq!(store.get(&id).as_deref(), Some("a"));
        assert_eq!(store.len(), 1);
        assert_eq!(store.remove(&id).as_deref(), Some("a"));
        assert!(store.is_empty());
    }

    #[test]
    fn try_update_missing_is_none() {
        let store: Store<u32> = Store::new();
        let out: Option<Result<(), ()>> = store.try_update(&Uuid::new_v4(), |_| Ok(()));
        assert!(out.is_none());
    }

    #[test]
    fn try_update_runs_closure() {
        let store: Store<u32> = Store::new();
        let id = Uuid::new_v4();
        store.insert(id, 1);
        let out: Option<Result<u32, ()>> = store.try_update(&id, |v| {
            *v += 1;
            Ok(*v)
        });
        assert_eq!(out, Some(Ok(2)));
        assert_eq!(store.with(&id, |v| *v), Some(2));
    }

    #[test]
    fn store_clones_share_data() {
        let a: Store<u8> = Store::new();
        let b = a.clone();
        a.insert(Uuid::new_v4(), 7);
        assert_eq!(b.len(), 1);
    }

    #[test]
    fn config_from_lookup() {
        let config = AppConfig::from_lookup(|key| match key {
            "PORT" => Some("9090".into()),
            "AUTH_TOKEN" => Some("s3cret".into()),
            "CTRLMAP_JUSTIFICATION_ENABLED" => Some("false".into()),
            _ => None,
        });
        assert_eq!(config.port, 9090);
        assert_eq!(config.auth_token.as_deref(), Some("s3cret"));
        assert!(!config.justification_enabled);
    }

    #[test]
    fn config_defaults_on_garbage() {
        let config = AppConfig::from_lookup(|key| match key {
            "PORT" => Some("not-a-port".into()),
            "AUTH_TOKEN" => Some("  ".into()),
            _ => None,
        });
        assert_eq!(config.port, 8080);
        assert!(config.auth_token.is_none());
        assert!(config.justification_enabled);
    }

    #[test]
    fn debug_redacts_token() {
        let config = AppConfig {
            auth_token: Some("hunter2".into()),
            ..AppConfig::default()
        };
        let state = AppState::with_config(config, engine(), None);
        let debug = format!("{state:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("[REDACTED]"));
    }
}
