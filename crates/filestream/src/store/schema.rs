use std::path::{Path, PathBuf};

use crate::digest::DigestAlgorithm;

/// Naming strategy mapping a logical name to a path inside a store root.
///
/// Resolution is pure: the same `(root, name)` always yields the same path and
/// nothing is created on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ObjectSchema {
    /// The name is used as a relative path fragment, without trailing separators
    #[default]
    Direct,
    /// The name is digested and sharded as `h[0:2]/h[0:4]/h`
    HashSharded(DigestAlgorithm),
}

impl ObjectSchema {
    /// Hash-sharded schema over SHA-256
    pub const SHA256_SHARDED: ObjectSchema = ObjectSchema::HashSharded(DigestAlgorithm::Sha256);

    pub fn object_path(&self, root: &Path, name: &str) -> PathBuf {
        match self {
            // Rebuilding from components drops trailing and repeated separators
            ObjectSchema::Direct => root.join(name).components().collect(),
            ObjectSchema::HashSharded(algorithm) => {
                let hash = algorithm.hash_str(name);
                root.join(&hash[..2]).join(&hash[..4]).join(&hash)
            }
        }
    }
}
