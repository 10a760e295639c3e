use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;
use rand::rngs::OsRng;
use std::fmt;

use crate::services::aspect::OrientationClass;

/// Random bytes per key; collisions are treated as negligible at this width.
pub const KEY_ENTROPY_BYTES: usize = 32;

pub const VIDEO_EXTENSION: &str = "mp4";

/// `{orientation}/{random}.mp4` object key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorageKey {
    pub orientation: OrientationClass,
    pub id: String,
}

impl StorageKey {
    /// Draws a fresh key from the OS CSPRNG. No uniqueness check is made against the store.
    pub fn generate(orientation: OrientationClass) -> Self {
        let mut bytes = [0u8; KEY_ENTROPY_BYTES];
        OsRng.fill_bytes(&mut bytes);

        Self {
            orientation,
            id: URL_SAFE_NO_PAD.encode(bytes),
        }
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}.{}", self.orientation, self.id, VIDEO_EXTENSION)
    }
}
