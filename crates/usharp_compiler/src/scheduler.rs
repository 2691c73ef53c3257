//! Recompilation scheduler
//!
//! Drains the compile queues once per load cycle: never while an assembly
//! is loading, components before classes, and with a single garbage
//! collection pass at the end instead of one per blueprint.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use usharp_core::{AssemblyLoadGate, BlueprintRef};

use crate::engine::{BlueprintCompilation, GarbageCollector};
use crate::queue::{CompileQueues, QueueKind};
use crate::settings::CompilerSettings;

/// Observable scheduler state
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchedulerState {
    /// Both queues empty
    Idle,
    /// At least one blueprint queued
    Pending,
    /// A drain is running
    Compiling,
}

/// What a trigger did
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DrainOutcome {
    /// An assembly is still loading; queues untouched
    Deferred,
    /// Called from inside a drain; the running drain picks up what it can
    Reentrant,
    /// Nothing queued
    Empty,
    /// Queues drained, one collection pass run
    Compiled {
        components: Vec<BlueprintRef>,
        classes: Vec<BlueprintRef>,
    },
}

impl DrainOutcome {
    /// Blueprints compiled by this trigger, in compile order
    pub fn compiled(&self) -> Vec<BlueprintRef> {
        match self {
            DrainOutcome::Compiled {
                components,
                classes,
            } => components.iter().chain(classes.iter()).copied().collect(),
            _ => Vec::new(),
        }
    }
}

/// Running totals, for diagnostics
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    /// Completed drains
    pub cycles: u64,
    pub blueprints_compiled: u64,
    /// Compiles that reported errors
    pub blueprints_failed: u64,
    pub gc_passes: u64,
    /// Triggers held back by a loading assembly
    pub deferred_triggers: u64,
    pub reentrant_triggers: u64,
}

/// Batches blueprint recompilation
pub struct RecompilationScheduler {
    queues: Arc<CompileQueues>,
    load_gate: Arc<dyn AssemblyLoadGate>,
    compiler: Arc<dyn BlueprintCompilation>,
    collector: Arc<dyn GarbageCollector>,
    settings: CompilerSettings,
    compiling: AtomicBool,
    stats: Mutex<SchedulerStats>,
}

impl RecompilationScheduler {
    pub fn new(
        queues: Arc<CompileQueues>,
        load_gate: Arc<dyn AssemblyLoadGate>,
        compiler: Arc<dyn BlueprintCompilation>,
        collector: Arc<dyn GarbageCollector>,
        settings: CompilerSettings,
    ) -> Self {
        Self {
            queues,
            load_gate,
            compiler,
            collector,
            settings,
            compiling: AtomicBool::new(false),
            stats: Mutex::new(SchedulerStats::default()),
        }
    }

    pub fn queues(&self) -> &Arc<CompileQueues> {
        &self.queues
    }

    pub fn settings(&self) -> &CompilerSettings {
        &self.settings
    }

    pub fn state(&self) -> SchedulerState {
        if self.compiling.load(Ordering::Acquire) {
            SchedulerState::Compiling
        } else if self.queues.is_empty() {
            SchedulerState::Idle
        } else {
            SchedulerState::Pending
        }
    }

    pub fn stats(&self) -> SchedulerStats {
        *self.stats.lock()
    }

    /// Compile every queued blueprint, if allowed right now.
    ///
    /// Safe to call redundantly: triggers during a load, during a drain, or
    /// with nothing queued return without side effects on the queues.
    pub fn recompile_and_reinstance(&self) -> DrainOutcome {
        let Some(_guard) = CompilingGuard::enter(&self.compiling) else {
            log::debug!("Recompile requested during a drain; leaving new entries to the running drain");
            self.stats.lock().reentrant_triggers += 1;
            return DrainOutcome::Reentrant;
        };

        if self.load_gate.is_loading_any_assembly() {
            // Wait until every assembly is in so all blueprints compile in one pass
            log::debug!(
                "Deferring recompile of {} blueprints until assemblies finish loading",
                self.queues.total_len()
            );
            self.stats.lock().deferred_triggers += 1;
            return DrainOutcome::Deferred;
        }

        if self.queues.is_empty() {
            return DrainOutcome::Empty;
        }

        // Components queued while components compile still go before any class
        let mut components = Vec::new();
        loop {
            let batch = self.compile_queue(QueueKind::Components);
            if batch.is_empty() {
                break;
            }
            components.extend(batch);
        }
        let classes = self.compile_queue(QueueKind::Classes);

        // Reclaim old class generations and instances left by reinstancing
        self.collector
            .collect_garbage(self.settings.gc_keep_flags, self.settings.full_purge);

        {
            let mut stats = self.stats.lock();
            stats.cycles += 1;
            stats.gc_passes += 1;
        }

        log::info!(
            "Recompiled {} component and {} class blueprints",
            components.len(),
            classes.len()
        );
        DrainOutcome::Compiled {
            components,
            classes,
        }
    }

    /// Take one queue and compile everything in it, in insertion order.
    /// Failed compiles are consumed like successful ones.
    fn compile_queue(&self, kind: QueueKind) -> Vec<BlueprintRef> {
        let blueprints = self.queues.take(kind);
        let options = self.settings.compile_options();

        for blueprint in &blueprints {
            let results = self.compiler.compile_blueprint(*blueprint, options);

            let mut stats = self.stats.lock();
            stats.blueprints_compiled += 1;
            if results.has_errors() {
                stats.blueprints_failed += 1;
                log::warn!(
                    "Blueprint {:?} ({}) failed to compile with {} errors",
                    blueprint,
                    kind,
                    results.num_errors()
                );
            } else {
                log::debug!("Compiled blueprint {:?} ({})", blueprint, kind);
            }
        }

        blueprints
    }
}

/// Holds the `Compiling` state for the duration of a drain
struct CompilingGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> CompilingGuard<'a> {
    fn enter(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for CompilingGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
