//! Engine flag sets used when compiling and collecting garbage

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Object flags consulted by the garbage collector
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct ObjectFlags: u32 {
        const PUBLIC = 1 << 0;
        /// Kept alive even when unreferenced (assets open in the editor)
        const STANDALONE = 1 << 1;
        const TRANSIENT = 1 << 3;
        /// Class default object
        const CLASS_DEFAULT_OBJECT = 1 << 4;
        const ARCHETYPE = 1 << 5;
        /// Replaced by reinstancing, waiting to be purged
        const NEWER_VERSION_EXISTS = 1 << 6;
    }
}

impl ObjectFlags {
    /// Objects carrying these flags survive a collection pass
    pub const GARBAGE_COLLECTION_KEEPFLAGS: Self = Self::STANDALONE;
}

impl Default for ObjectFlags {
    fn default() -> Self {
        Self::GARBAGE_COLLECTION_KEEPFLAGS
    }
}

bitflags! {
    /// Options for a single blueprint compile
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct BlueprintCompileOptions: u32 {
        const SKIP_GARBAGE_COLLECTION = 1 << 0;
        const SKIP_SAVE = 1 << 1;
        const BATCH_COMPILE = 1 << 2;
        const SKIP_REINSTANCING = 1 << 3;
    }
}
