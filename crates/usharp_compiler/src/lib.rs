//! # usharp_compiler - Blueprint Recompilation Bridge
//!
//! Keeps blueprint compilation in step with managed type generation:
//!
//! - [`ReflectionSynchronizer`]: turns new class/struct/enum notifications
//!   into compile queue entries, components and general classes apart
//! - [`RecompilationScheduler`]: drains the queues once per load cycle,
//!   components first, with a single garbage collection pass at the end
//! - [`install_compiler_hook`]: routes managed-backed blueprints to their
//!   own compiler context
//! - [`ManagedCompilerModule`]: startup wiring and reconciliation
//!
//! ## Example
//!
//! ```ignore
//! use usharp_compiler::prelude::*;
//!
//! let module = ManagedCompilerModule::startup(CompilerModuleContext {
//!     manager: manager.clone(),
//!     compiler: Arc::new(RegistryCompilation::new(manager.clone(), registry.clone())),
//!     collector,
//!     registry,
//!     settings: CompilerSettings::load("Config/Compiler.toml")?,
//! })?;
//!
//! manager.load_assembly("Game", |m| generate_types(m))?;
//! // OnManagedAssemblyLoaded drained the queues
//! assert!(module.queues().is_empty());
//! ```

pub mod engine;
pub mod error;
pub mod flags;
pub mod hook;
pub mod module;
pub mod queue;
pub mod results;
pub mod scheduler;
pub mod settings;
pub mod synchronizer;

pub use engine::{BlueprintCompilation, GarbageCollector};
pub use error::{CompilerError, Result};
pub use flags::{BlueprintCompileOptions, ObjectFlags};
pub use hook::{
    install_compiler_hook, BlueprintCompiler, CompileTarget, CompilerContext,
    CompilerContextFactory, DefaultCompilerContext, KismetCompilerRegistry,
    ManagedBlueprintCompiler, ManagedCompilerContext, RegistryCompilation,
};
pub use module::{CompilerModuleContext, ManagedCompilerModule};
pub use queue::{CompileQueue, CompileQueues, QueueKind};
pub use results::{CompilerMessage, CompilerResultsLog, Severity};
pub use scheduler::{DrainOutcome, RecompilationScheduler, SchedulerState, SchedulerStats};
pub use settings::CompilerSettings;
pub use synchronizer::ReflectionSynchronizer;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::engine::{BlueprintCompilation, GarbageCollector};
    pub use crate::error::{CompilerError, Result};
    pub use crate::flags::{BlueprintCompileOptions, ObjectFlags};
    pub use crate::hook::{install_compiler_hook, KismetCompilerRegistry, RegistryCompilation};
    pub use crate::module::{CompilerModuleContext, ManagedCompilerModule};
    pub use crate::queue::{CompileQueues, QueueKind};
    pub use crate::results::CompilerResultsLog;
    pub use crate::scheduler::{DrainOutcome, RecompilationScheduler, SchedulerState};
    pub use crate::settings::CompilerSettings;
    pub use crate::synchronizer::ReflectionSynchronizer;
}
