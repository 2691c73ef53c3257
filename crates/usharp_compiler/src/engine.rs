//! Engine entry points the scheduler drives

use usharp_core::BlueprintRef;

use crate::flags::{BlueprintCompileOptions, ObjectFlags};
use crate::results::CompilerResultsLog;

/// The engine's standard "compile this blueprint" entry point
pub trait BlueprintCompilation: Send + Sync {
    /// Compile (and reinstance) `blueprint`. Problems are reported in the returned log.
    fn compile_blueprint(
        &self,
        blueprint: BlueprintRef,
        options: BlueprintCompileOptions,
    ) -> CompilerResultsLog;
}

/// The engine's garbage collector
pub trait GarbageCollector: Send + Sync {
    /// Run one collection pass, keeping objects that carry `keep_flags`
    fn collect_garbage(&self, keep_flags: ObjectFlags, full_purge: bool);
}
