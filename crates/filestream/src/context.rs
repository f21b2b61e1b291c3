//! # Application context
//!
//! Owns the per-user storage root, resolved at most once, and the name of the
//! global store living under it.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use tracing::debug;

use crate::error::StoreError;
use crate::platform::{OperatingSystem, Platform, locate_local_storage};
use crate::store::{ObjectSchema, Store};

/// Environment variable overriding the global store name
pub const GLOBAL_STORE_ENV: &str = "FILESTREAM_GLOBAL_STORE";

pub const DEFAULT_GLOBAL_STORE_NAME: &str = "filestream";

#[derive(Debug)]
pub struct AppContext {
    local_storage: OnceLock<PathBuf>,
    global_store_name: String,
}

impl AppContext {
    /// Context that locates local storage from the running platform on first use
    pub fn new() -> Self {
        Self {
            local_storage: OnceLock::new(),
            global_store_name: std::env::var(GLOBAL_STORE_ENV)
                .ok()
                .filter(|name| !name.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_GLOBAL_STORE_NAME.to_string()),
        }
    }

    /// Context with a fixed local storage root
    pub fn with_local_storage(path: impl Into<PathBuf>) -> Self {
        let context = Self::new();
        let _ = context.local_storage.set(path.into());
        context
    }

    pub fn with_global_store_name(mut self, name: impl Into<String>) -> Self {
        self.global_store_name = name.into();
        self
    }

    pub fn global_store_name(&self) -> &str {
        &self.global_store_name
    }

    /// The per-user storage root, located on first call and cached afterwards.
    pub fn local_storage(&self) -> Result<&Path, StoreError> {
        if let Some(path) = self.local_storage.get() {
            return Ok(path);
        }

        let platform = Platform::current();
        let located = locate_local_storage(
            OperatingSystem::current(),
            |key| std::env::var_os(key),
            dirs::home_dir(),
        )?;
        debug!(platform = %platform, path = ?located, "Located local storage");

        Ok(self.local_storage.get_or_init(|| located))
    }

    /// Direct-schema store named after the global store under local storage
    pub fn global_store(&self) -> Result<Store, StoreError> {
        Store::new(
            self.local_storage()?,
            &self.global_store_name,
            ObjectSchema::Direct,
        )
    }
}

impl Default for AppContext {
    fn default() -> Self {
        Self::new()
    }
}
