//! Compiler bridge settings

use serde::Deserialize;
use std::path::Path;

use crate::error::{CompilerError, Result};
use crate::flags::{BlueprintCompileOptions, ObjectFlags};

/// Tunables for recompilation and garbage collection
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CompilerSettings {
    /// Flags that keep objects alive through the post-drain collection
    pub gc_keep_flags: ObjectFlags,
    /// Purge unreachable objects immediately instead of incrementally
    pub full_purge: bool,
    /// Suppress the engine's own per-blueprint collection pass
    pub skip_per_blueprint_gc: bool,
    /// Queue blueprints from already-loaded managed packages on startup
    pub reconcile_on_startup: bool,
}

impl Default for CompilerSettings {
    fn default() -> Self {
        Self {
            gc_keep_flags: ObjectFlags::GARBAGE_COLLECTION_KEEPFLAGS,
            full_purge: true,
            skip_per_blueprint_gc: true,
            reconcile_on_startup: true,
        }
    }
}

impl CompilerSettings {
    /// Parse settings from TOML; missing keys keep their defaults
    pub fn from_toml_str(source: &str) -> Result<Self> {
        Ok(toml::from_str(source)?)
    }

    /// Load settings from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| CompilerError::SettingsIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    /// Options passed to every queued blueprint compile
    pub fn compile_options(&self) -> BlueprintCompileOptions {
        if self.skip_per_blueprint_gc {
            BlueprintCompileOptions::SKIP_GARBAGE_COLLECTION
        } else {
            BlueprintCompileOptions::empty()
        }
    }
}
