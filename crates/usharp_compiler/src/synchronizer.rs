//! Reflection synchronizer
//!
//! Turns new-type notifications into compile queue entries. Classes queue
//! their owning blueprint; structs and enums queue the blueprints of the
//! managed classes they reference.

use std::sync::Arc;

use usharp_core::prelude::*;

use crate::queue::{CompileQueues, QueueKind};
use crate::scheduler::{DrainOutcome, RecompilationScheduler};

/// Routes new managed types into the compile queues
pub struct ReflectionSynchronizer {
    objects: Arc<dyn ObjectModel>,
    queues: Arc<CompileQueues>,
    scheduler: Arc<RecompilationScheduler>,
}

impl ReflectionSynchronizer {
    pub fn new(objects: Arc<dyn ObjectModel>, scheduler: Arc<RecompilationScheduler>) -> Self {
        Self {
            objects,
            queues: Arc::clone(scheduler.queues()),
            scheduler,
        }
    }

    pub fn queues(&self) -> &Arc<CompileQueues> {
        &self.queues
    }

    pub fn scheduler(&self) -> &Arc<RecompilationScheduler> {
        &self.scheduler
    }

    /// Queue the blueprint that generated `class`.
    ///
    /// Classes without a live blueprint are skipped; not every generated
    /// class is blueprint-visible. Returns the queue used, if any.
    pub fn on_new_class(&self, class: ClassRef) -> Option<QueueKind> {
        let Some(blueprint) = self.objects.blueprint_for_class(class) else {
            log::trace!("Class {:?} has no live blueprint, skipping", class);
            return None;
        };

        let kind = if self.objects.is_component_class(class) {
            QueueKind::Components
        } else {
            QueueKind::Classes
        };

        if self.queues.enqueue(kind, blueprint) {
            log::debug!(
                "Queued blueprint {:?} for class {:?} in the {} queue",
                blueprint,
                class,
                kind
            );
        }
        Some(kind)
    }

    pub fn on_new_struct(&self, strukt: StructRef) {
        if let Some(references) = self.objects.struct_references(strukt) {
            self.add_managed_references(&references);
        }
    }

    pub fn on_new_enum(&self, enumeration: EnumRef) {
        if let Some(references) = self.objects.enum_references(enumeration) {
            self.add_managed_references(&references);
        }
    }

    /// One assembly finished loading; try to drain
    pub fn on_managed_assembly_loaded(&self, assembly: &str) -> DrainOutcome {
        log::debug!("Assembly '{}' loaded, attempting recompile", assembly);
        self.scheduler.recompile_and_reinstance()
    }

    /// Feed every class a struct or enum depends on through [`Self::on_new_class`]
    pub fn add_managed_references(&self, references: &ManagedReferences) {
        references.for_each_managed_reference(|reference| {
            if let ManagedReference::Class(class) = reference {
                self.on_new_class(class);
            }
        });
    }

    /// Queue the generated class of every blueprint in the loaded managed
    /// packages. Returns how many blueprints were visited.
    pub fn reconcile_managed_packages(&self) -> usize {
        let mut visited = 0;
        for package in self.objects.managed_packages() {
            for blueprint in self.objects.blueprints_in_package(package) {
                visited += 1;
                if let Some(class) = self.objects.generated_class(blueprint) {
                    self.on_new_class(class);
                }
            }
        }
        visited
    }
}
