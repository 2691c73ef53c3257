//! Compiler bridge module
//!
//! Owns the synchronizer and scheduler for one editor session. Startup
//! installs the compiler hook, subscribes to the manager's events, queues
//! blueprints that were generated before the subscriptions existed, and
//! makes one recompilation attempt.

use std::sync::{Arc, Weak};

use usharp_core::ObjectModel;
use usharp_event::Subscription;
use usharp_manager::prelude::*;

use crate::engine::{BlueprintCompilation, GarbageCollector};
use crate::error::Result;
use crate::hook::{install_compiler_hook, KismetCompilerRegistry};
use crate::queue::CompileQueues;
use crate::scheduler::{DrainOutcome, RecompilationScheduler};
use crate::settings::CompilerSettings;
use crate::synchronizer::ReflectionSynchronizer;

/// Everything the module needs from the engine
pub struct CompilerModuleContext {
    pub manager: Arc<ManagedManager>,
    pub compiler: Arc<dyn BlueprintCompilation>,
    pub collector: Arc<dyn GarbageCollector>,
    pub registry: Arc<KismetCompilerRegistry>,
    pub settings: CompilerSettings,
}

/// Tokens for the five manager events
#[derive(Default)]
struct ModuleSubscriptions {
    new_class: Option<Subscription>,
    new_struct: Option<Subscription>,
    new_enum: Option<Subscription>,
    processed_pending_classes: Option<Subscription>,
    managed_assembly_loaded: Option<Subscription>,
}

impl ModuleSubscriptions {
    fn subscribe(manager: &ManagedManager, synchronizer: &Arc<ReflectionSynchronizer>) -> Self {
        let weak = Arc::downgrade(synchronizer);

        Self {
            new_class: Some(manager.on_new_class().subscribe(with_synchronizer(
                &weak,
                |sync, event: &NewClassEvent| {
                    sync.on_new_class(event.class);
                },
            ))),
            new_struct: Some(manager.on_new_struct().subscribe(with_synchronizer(
                &weak,
                |sync, event: &NewStructEvent| sync.on_new_struct(event.strukt),
            ))),
            new_enum: Some(manager.on_new_enum().subscribe(with_synchronizer(
                &weak,
                |sync, event: &NewEnumEvent| sync.on_new_enum(event.enumeration),
            ))),
            processed_pending_classes: Some(manager.on_processed_pending_classes().subscribe(
                with_synchronizer(&weak, |sync, _: &ProcessedPendingClassesEvent| {
                    sync.scheduler().recompile_and_reinstance();
                }),
            )),
            managed_assembly_loaded: Some(manager.on_managed_assembly_loaded().subscribe(
                with_synchronizer(&weak, |sync, event: &ManagedAssemblyLoadedEvent| {
                    sync.on_managed_assembly_loaded(&event.assembly);
                }),
            )),
        }
    }

    fn unsubscribe(&mut self, manager: &ManagedManager) -> usize {
        let mut removed = 0;
        if let Some(token) = self.new_class.take() {
            removed += usize::from(manager.on_new_class().unsubscribe(token));
        }
        if let Some(token) = self.new_struct.take() {
            removed += usize::from(manager.on_new_struct().unsubscribe(token));
        }
        if let Some(token) = self.new_enum.take() {
            removed += usize::from(manager.on_new_enum().unsubscribe(token));
        }
        if let Some(token) = self.processed_pending_classes.take() {
            removed += usize::from(manager.on_processed_pending_classes().unsubscribe(token));
        }
        if let Some(token) = self.managed_assembly_loaded.take() {
            removed += usize::from(manager.on_managed_assembly_loaded().unsubscribe(token));
        }
        removed
    }

    fn is_active(&self) -> bool {
        self.new_class.is_some()
    }
}

/// Wrap `f` so it only runs while the synchronizer is alive
fn with_synchronizer<E: 'static>(
    weak: &Weak<ReflectionSynchronizer>,
    f: impl Fn(&ReflectionSynchronizer, &E) + Send + Sync + 'static,
) -> impl Fn(&E) + Send + Sync + 'static {
    let weak = weak.clone();
    move |event: &E| {
        if let Some(sync) = weak.upgrade() {
            f(&sync, event);
        }
    }
}

/// The running compiler bridge
pub struct ManagedCompilerModule {
    manager: Arc<ManagedManager>,
    registry: Arc<KismetCompilerRegistry>,
    synchronizer: Arc<ReflectionSynchronizer>,
    subscriptions: ModuleSubscriptions,
    startup_outcome: DrainOutcome,
}

impl ManagedCompilerModule {
    /// Bring the bridge up
    pub fn startup(ctx: CompilerModuleContext) -> Result<Self> {
        let CompilerModuleContext {
            manager,
            compiler,
            collector,
            registry,
            settings,
        } = ctx;

        install_compiler_hook(&registry)?;

        let reconcile = settings.reconcile_on_startup;
        let scheduler = Arc::new(RecompilationScheduler::new(
            Arc::new(CompileQueues::new()),
            manager.load_state(),
            compiler,
            collector,
            settings,
        ));
        let objects: Arc<dyn ObjectModel> = manager.clone();
        let synchronizer = Arc::new(ReflectionSynchronizer::new(objects, scheduler));

        let subscriptions = ModuleSubscriptions::subscribe(&manager, &synchronizer);

        if reconcile {
            let visited = synchronizer.reconcile_managed_packages();
            log::debug!(
                "Startup reconciliation visited {} blueprints, {} queued",
                visited,
                synchronizer.queues().total_len()
            );
        }

        let startup_outcome = synchronizer.scheduler().recompile_and_reinstance();
        log::info!("Managed compiler module started");

        Ok(Self {
            manager,
            registry,
            synchronizer,
            subscriptions,
            startup_outcome,
        })
    }

    /// Drop every event subscription. Safe to call more than once.
    pub fn shutdown(&mut self) {
        if !self.subscriptions.is_active() {
            return;
        }
        let removed = self.subscriptions.unsubscribe(&self.manager);
        log::info!("Managed compiler module shut down ({} subscriptions removed)", removed);
    }

    pub fn is_running(&self) -> bool {
        self.subscriptions.is_active()
    }

    /// What the startup recompilation attempt did
    pub fn startup_outcome(&self) -> &DrainOutcome {
        &self.startup_outcome
    }

    pub fn manager(&self) -> &Arc<ManagedManager> {
        &self.manager
    }

    pub fn registry(&self) -> &Arc<KismetCompilerRegistry> {
        &self.registry
    }

    pub fn synchronizer(&self) -> &Arc<ReflectionSynchronizer> {
        &self.synchronizer
    }

    pub fn scheduler(&self) -> &Arc<RecompilationScheduler> {
        self.synchronizer.scheduler()
    }

    pub fn queues(&self) -> &Arc<CompileQueues> {
        self.synchronizer.queues()
    }
}

impl Drop for ManagedCompilerModule {
    fn drop(&mut self) {
        self.shutdown();
    }
}
