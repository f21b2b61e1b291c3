use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use crate::error::StoreError;
use crate::store::ObjectSchema;

/// Directory-rooted namespace mapping logical names to object paths.
///
/// The root directory is created on construction and never removed by this crate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Store {
    root: PathBuf,
    schema: ObjectSchema,
}

impl Store {
    /// Create (or reopen) the store at `parent/dir_name`.
    pub fn new(
        parent: impl AsRef<Path>,
        dir_name: &str,
        schema: ObjectSchema,
    ) -> Result<Self, StoreError> {
        let joined = parent.as_ref().join(dir_name);
        let root = std::path::absolute(&joined).map_err(|source| StoreError::CreateRoot {
            path: joined.clone(),
            source,
        })?;

        std::fs::create_dir_all(&root).map_err(|source| StoreError::CreateRoot {
            path: root.clone(),
            source,
        })?;

        if dir_name.starts_with('.') {
            mark_hidden(&root);
        }

        debug!(root = ?root, schema = ?schema, "Opened store");
        Ok(Self { root, schema })
    }

    /// Create a store using the [`ObjectSchema::Direct`] schema
    pub fn direct(parent: impl AsRef<Path>, dir_name: &str) -> Result<Self, StoreError> {
        Self::new(parent, dir_name, ObjectSchema::Direct)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn schema(&self) -> ObjectSchema {
        self.schema
    }

    /// Path of the object stored under `name`. The file itself may not exist.
    pub fn object(&self, name: &str) -> PathBuf {
        self.schema.object_path(&self.root, name)
    }

    /// Nested store at `root/name` sharing this store's schema
    pub fn sub_store(&self, name: &str) -> Result<Store, StoreError> {
        self.sub_store_with(name, self.schema)
    }

    /// Nested store at `root/name` with its own schema
    pub fn sub_store_with(&self, name: &str, schema: ObjectSchema) -> Result<Store, StoreError> {
        Store::new(&self.root, name, schema)
    }
}

#[cfg(windows)]
fn mark_hidden(path: &Path) {
    use std::os::windows::ffi::OsStrExt;
    use windows_sys::Win32::Storage::FileSystem::{
        FILE_ATTRIBUTE_HIDDEN, GetFileAttributesW, INVALID_FILE_ATTRIBUTES, SetFileAttributesW,
    };

    let wide: Vec<u16> = path
        .as_os_str()
        .encode_wide()
        .chain(std::iter::once(0))
        .collect();

    // SAFETY: `wide` is a NUL-terminated UTF-16 path that outlives both calls.
    let attributes = unsafe { GetFileAttributesW(wide.as_ptr()) };
    if attributes == INVALID_FILE_ATTRIBUTES {
        let e = std::io::Error::last_os_error();
        debug!(path = ?path, error = %e, "Couldn't read store root attributes");
        return;
    }

    // SAFETY: as above.
    if unsafe { SetFileAttributesW(wide.as_ptr(), attributes | FILE_ATTRIBUTE_HIDDEN) } == 0 {
        let e = std::io::Error::last_os_error();
        debug!(path = ?path, error = %e, "Couldn't mark store root hidden");
    } else {
        trace!(path = ?path, "Marked store root hidden");
    }
}

// Dot-prefixed directories are already hidden on Unix-like systems.
#[cfg(not(windows))]
fn mark_hidden(path: &Path) {
    trace!(path = ?path, "Store root is dot-prefixed, nothing else to mark");
}
