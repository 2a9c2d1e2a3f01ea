//! Server configuration.

use std::path::PathBuf;

use crate::catalog::{CatalogConfig, CatalogError};

/// Default capacity of the service command channel.
pub const DEFAULT_COMMAND_BUFFER: usize = 256;

/// Configuration for the roles server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Capacity of the command channel feeding the role service.
    pub command_buffer: usize,
    /// Role catalog file; the built-in catalog is used when unset.
    pub catalog_path: Option<PathBuf>,
    /// Number of players the scripted demo joins.
    pub demo_players: usize,
}

impl ServerConfig {
    /// Create a config with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            command_buffer: DEFAULT_COMMAND_BUFFER,
            catalog_path: None,
            demo_players: 4,
        }
    }

    /// Override the command channel capacity. Zero is raised to one.
    #[must_use]
    pub fn with_command_buffer(mut self, capacity: usize) -> Self {
        self.command_buffer = capacity.max(1);
        self
    }

    /// Load roles from a catalog file instead of the built-in catalog.
    #[must_use]
    pub fn with_catalog_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.catalog_path = Some(path.into());
        self
    }

    /// Set how many players the demo joins.
    #[must_use]
    pub fn with_demo_players(mut self, players: usize) -> Self {
        self.demo_players = players;
        self
    }

    /// Resolve the role catalog this config points at.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] if the catalog file cannot be loaded.
    pub fn catalog(&self) -> Result<CatalogConfig, CatalogError> {
        match &self.catalog_path {
            Some(path) => CatalogConfig::load(path),
            None => Ok(CatalogConfig::builtin()),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new()
    }
}
