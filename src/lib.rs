//! Pulsecore - headless service for tracking live heart-rate sessions
//!
//! Clients open a numbered session, push BPM readings for it, poll the
//! latest value and close it again. State lives in a single SQLite table.
//!
//! # Usage
//!
//! As a library:
//! ```ignore
//! use pulsecore::{Config, Core};
//!
//! let core = Core::new(Config::default())?;
//! core.start_api_server().await?;
//! ```
//!
//! As a standalone server (CLI):
//! ```text
//! pulsecore --config ~/.pulsecore/config.toml
//! ```

pub mod api;
pub mod config;
pub mod db;
pub mod error;

// Re-export main types for convenience
pub use config::Config;
pub use db::Database;
pub use error::{CoreError, Result};

use std::sync::Arc;

/// Core service owning the configuration and the session store
pub struct Core {
    /// Configuration
    pub config: Config,

    /// Session database
    pub db: Arc<Database>,
}

impl Core {
    /// Create a new Core instance, opening the configured database
    pub fn new(config: Config) -> Result<Self> {
        let db = Database::new(config.database_path())?;
        Ok(Core {
            config,
            db: Arc::new(db),
        })
    }

    /// Start the HTTP API server; returns after graceful shutdown
    pub async fn start_api_server(&self) -> Result<()> {
        let addr = self.config.server_addr();
        tracing::info!("Starting API server on {}", addr);
        api::serve(addr, self.db.clone()).await
    }
}
