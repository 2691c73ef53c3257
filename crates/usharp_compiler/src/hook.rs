//! Compiler hook
//!
//! The engine picks a compiler context per blueprint from a registry keyed
//! by blueprint kind. Managed-backed blueprints get their own context, and a
//! compiler object is listed so "can you compile this?" queries see them too.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use usharp_core::prelude::*;

use crate::engine::BlueprintCompilation;
use crate::error::{CompilerError, Result};
use crate::flags::BlueprintCompileOptions;
use crate::results::CompilerResultsLog;

/// What a compiler context is asked to compile
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CompileTarget {
    pub blueprint: BlueprintRef,
    pub kind: BlueprintKind,
    pub generated_class: Option<ClassRef>,
}

/// One blueprint compilation
pub trait CompilerContext {
    /// Name used in logs
    fn name(&self) -> &'static str;

    fn target(&self) -> &CompileTarget;

    fn compile(&mut self, results: &mut CompilerResultsLog);
}

/// Builds the compiler context for a blueprint
pub type CompilerContextFactory =
    Arc<dyn Fn(&CompileTarget, BlueprintCompileOptions) -> Box<dyn CompilerContext> + Send + Sync>;

/// A compiler registered with the engine's compiler module
pub trait BlueprintCompiler: Send + Sync {
    fn name(&self) -> &str;

    fn can_compile(&self, kind: BlueprintKind) -> bool;
}

/// Context the engine falls back to when no factory is registered
pub struct DefaultCompilerContext {
    target: CompileTarget,
}

impl DefaultCompilerContext {
    pub fn new(target: CompileTarget) -> Self {
        Self { target }
    }
}

impl CompilerContext for DefaultCompilerContext {
    fn name(&self) -> &'static str {
        "default"
    }

    fn target(&self) -> &CompileTarget {
        &self.target
    }

    fn compile(&mut self, results: &mut CompilerResultsLog) {
        results.note(format!("Compiled {:?} with the default context", self.target.blueprint));
    }
}

/// Context for blueprints backed by a managed class
pub struct ManagedCompilerContext {
    target: CompileTarget,
    options: BlueprintCompileOptions,
}

impl ManagedCompilerContext {
    pub fn new(target: CompileTarget, options: BlueprintCompileOptions) -> Self {
        Self { target, options }
    }

    pub fn options(&self) -> BlueprintCompileOptions {
        self.options
    }
}

impl CompilerContext for ManagedCompilerContext {
    fn name(&self) -> &'static str {
        "managed"
    }

    fn target(&self) -> &CompileTarget {
        &self.target
    }

    fn compile(&mut self, results: &mut CompilerResultsLog) {
        // The class layout comes from the managed type, so there is nothing to
        // build without it
        if self.target.generated_class.is_none() {
            results.error(format!(
                "Managed blueprint {:?} has no generated class",
                self.target.blueprint
            ));
            return;
        }
        results.note(format!(
            "Compiled {:?} with the managed context",
            self.target.blueprint
        ));
    }
}

/// Compiler entry listed for managed-backed blueprints
#[derive(Debug, Default)]
pub struct ManagedBlueprintCompiler;

impl BlueprintCompiler for ManagedBlueprintCompiler {
    fn name(&self) -> &str {
        "ManagedBlueprintCompiler"
    }

    fn can_compile(&self, kind: BlueprintKind) -> bool {
        kind == BlueprintKind::Managed
    }
}

/// The engine's compiler selection registry
#[derive(Default)]
pub struct KismetCompilerRegistry {
    factories: RwLock<HashMap<BlueprintKind, CompilerContextFactory>>,
    compilers: RwLock<Vec<Arc<dyn BlueprintCompiler>>>,
}

impl KismetCompilerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route blueprints of `kind` through `factory`
    pub fn register_compiler_for_blueprint(
        &self,
        kind: BlueprintKind,
        factory: CompilerContextFactory,
    ) -> Result<()> {
        let mut factories = self.factories.write();
        if factories.contains_key(&kind) {
            return Err(CompilerError::FactoryAlreadyRegistered(kind));
        }
        factories.insert(kind, factory);
        Ok(())
    }

    pub fn has_factory(&self, kind: BlueprintKind) -> bool {
        self.factories.read().contains_key(&kind)
    }

    /// List a compiler implementation
    pub fn add_compiler(&self, compiler: Arc<dyn BlueprintCompiler>) {
        self.compilers.write().push(compiler);
    }

    pub fn compilers(&self) -> Vec<Arc<dyn BlueprintCompiler>> {
        self.compilers.read().clone()
    }

    /// First listed compiler that accepts `kind`
    pub fn find_compiler(&self, kind: BlueprintKind) -> Option<Arc<dyn BlueprintCompiler>> {
        self.compilers
            .read()
            .iter()
            .find(|compiler| compiler.can_compile(kind))
            .cloned()
    }

    /// Build the context the engine would use for `target`
    pub fn create_context(
        &self,
        target: &CompileTarget,
        options: BlueprintCompileOptions,
    ) -> Box<dyn CompilerContext> {
        let factory = self.factories.read().get(&target.kind).cloned();
        match factory {
            Some(factory) => factory(target, options),
            None => Box::new(DefaultCompilerContext::new(*target)),
        }
    }
}

impl fmt::Debug for KismetCompilerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<BlueprintKind> = self.factories.read().keys().copied().collect();
        kinds.sort();
        f.debug_struct("KismetCompilerRegistry")
            .field("factories", &kinds)
            .field("compilers", &self.compilers.read().len())
            .finish()
    }
}

/// Register the managed compiler context factory and compiler.
///
/// Done once at startup; a second call fails because the factory is taken.
pub fn install_compiler_hook(registry: &KismetCompilerRegistry) -> Result<()> {
    registry.register_compiler_for_blueprint(
        BlueprintKind::Managed,
        Arc::new(|target: &CompileTarget, options: BlueprintCompileOptions| {
            Box::new(ManagedCompilerContext::new(*target, options)) as Box<dyn CompilerContext>
        }),
    )?;
    registry.add_compiler(Arc::new(ManagedBlueprintCompiler));

    log::info!("Managed blueprint compiler registered");
    Ok(())
}

/// Blueprint compilation that goes through the registry, the way the
/// editor's compile entry point does
pub struct RegistryCompilation {
    objects: Arc<dyn ObjectModel>,
    registry: Arc<KismetCompilerRegistry>,
}

impl RegistryCompilation {
    pub fn new(objects: Arc<dyn ObjectModel>, registry: Arc<KismetCompilerRegistry>) -> Self {
        Self { objects, registry }
    }

    pub fn registry(&self) -> &Arc<KismetCompilerRegistry> {
        &self.registry
    }
}

impl BlueprintCompilation for RegistryCompilation {
    fn compile_blueprint(
        &self,
        blueprint: BlueprintRef,
        options: BlueprintCompileOptions,
    ) -> CompilerResultsLog {
        let mut results = CompilerResultsLog::new();

        let Some(kind) = self.objects.blueprint_kind(blueprint) else {
            results.error(format!("Blueprint {:?} no longer exists", blueprint));
            return results;
        };

        let target = CompileTarget {
            blueprint,
            kind,
            generated_class: self.objects.generated_class(blueprint),
        };
        let mut context = self.registry.create_context(&target, options);
        log::trace!("Compiling {:?} with the {} context", blueprint, context.name());
        context.compile(&mut results);
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(kind: BlueprintKind, generated_class: Option<ClassRef>) -> CompileTarget {
        CompileTarget {
            blueprint: BlueprintRef::new(1, 0),
            kind,
            generated_class,
        }
    }

    #[test]
    fn test_managed_blueprints_use_managed_context() {
        let registry = KismetCompilerRegistry::new();
        install_compiler_hook(&registry).unwrap();

        let managed = registry.create_context(
            &target(BlueprintKind::Managed, Some(ClassRef::new(4, 0))),
            BlueprintCompileOptions::SKIP_GARBAGE_COLLECTION,
        );
        assert_eq!(managed.name(), "managed");

        let native = registry.create_context(
            &target(BlueprintKind::Native, None),
            BlueprintCompileOptions::empty(),
        );
        assert_eq!(native.name(), "default");
    }

    #[test]
    fn test_compiler_list_recognises_managed_blueprints() {
        let registry = KismetCompilerRegistry::new();
        assert!(registry.find_compiler(BlueprintKind::Managed).is_none());

        install_compiler_hook(&registry).unwrap();
        let compiler = registry.find_compiler(BlueprintKind::Managed).unwrap();
        assert_eq!(compiler.name(), "ManagedBlueprintCompiler");
        assert!(registry.find_compiler(BlueprintKind::Native).is_none());
        assert_eq!(registry.compilers().len(), 1);
    }

    #[test]
    fn test_hook_installs_once() {
        let registry = KismetCompilerRegistry::new();
        install_compiler_hook(&registry).unwrap();
        assert!(matches!(
            install_compiler_hook(&registry),
            Err(CompilerError::FactoryAlreadyRegistered(BlueprintKind::Managed))
        ));
        assert_eq!(registry.compilers().len(), 1);
    }

    #[test]
    fn test_managed_context_requires_generated_class() {
        let mut context = ManagedCompilerContext::new(
            target(BlueprintKind::Managed, None),
            BlueprintCompileOptions::empty(),
        );
        let mut results = CompilerResultsLog::new();
        context.compile(&mut results);
        assert!(results.has_errors());
    }
}
