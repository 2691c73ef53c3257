//! Managed assembly subsystem facade
//!
//! Generates reflection objects for managed types, tracks which assemblies
//! are loading, and raises the notifications the compiler bridge listens to.

use parking_lot::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::sync::Arc;

use usharp_core::prelude::*;
use usharp_event::EventDispatcher;

use crate::database::TypeDatabase;
use crate::error::{ManagerError, Result};
use crate::events::*;
use crate::load_state::AssemblyLoadState;

/// Description of a class produced by the managed type generator
#[derive(Clone, Debug)]
pub struct ClassDefinition {
    pub name: TypeName,
    /// Parent class name; `None` derives from the engine root class
    pub super_name: Option<TypeName>,
    /// Blueprint the class is generated for
    pub blueprint: Option<BlueprintRef>,
}

impl ClassDefinition {
    pub fn new(name: TypeName) -> Self {
        Self {
            name,
            super_name: None,
            blueprint: None,
        }
    }

    pub fn with_super(mut self, super_name: TypeName) -> Self {
        self.super_name = Some(super_name);
        self
    }

    pub fn with_blueprint(mut self, blueprint: BlueprintRef) -> Self {
        self.blueprint = Some(blueprint);
        self
    }
}

/// Owner of the managed type graph and its events
pub struct ManagedManager {
    database: RwLock<TypeDatabase>,
    load_state: Arc<AssemblyLoadState>,
    /// Definitions whose parent class has not been generated yet
    pending_classes: Mutex<Vec<ClassDefinition>>,
    events: ManagedEvents,
}

impl ManagedManager {
    pub fn new() -> Self {
        Self {
            database: RwLock::new(TypeDatabase::new()),
            load_state: Arc::new(AssemblyLoadState::new()),
            pending_classes: Mutex::new(Vec::new()),
            events: ManagedEvents::new(),
        }
    }

    // ========== Events ==========

    pub fn events(&self) -> &ManagedEvents {
        &self.events
    }

    pub fn on_new_class(&self) -> &EventDispatcher<NewClassEvent> {
        &self.events.new_class
    }

    pub fn on_new_struct(&self) -> &EventDispatcher<NewStructEvent> {
        &self.events.new_struct
    }

    pub fn on_new_enum(&self) -> &EventDispatcher<NewEnumEvent> {
        &self.events.new_enum
    }

    pub fn on_processed_pending_classes(&self) -> &EventDispatcher<ProcessedPendingClassesEvent> {
        &self.events.processed_pending_classes
    }

    pub fn on_managed_assembly_loaded(&self) -> &EventDispatcher<ManagedAssemblyLoadedEvent> {
        &self.events.managed_assembly_loaded
    }

    // ========== Database access ==========

    /// Read access to the type graph. Don't hold the guard across calls that raise events.
    pub fn database(&self) -> RwLockReadGuard<'_, TypeDatabase> {
        self.database.read()
    }

    /// Write access to the type graph. Don't hold the guard across calls that raise events.
    pub fn database_mut(&self) -> RwLockWriteGuard<'_, TypeDatabase> {
        self.database.write()
    }

    // ========== Assembly loading ==========

    /// Shared load state, used as the recompilation gate
    pub fn load_state(&self) -> Arc<AssemblyLoadState> {
        Arc::clone(&self.load_state)
    }

    pub fn is_loading_any_assembly(&self) -> bool {
        self.load_state.is_loading_any_assembly()
    }

    pub fn begin_assembly_load(&self, assembly: &str) {
        log::debug!("Loading managed assembly '{}'", assembly);
        self.load_state.begin(assembly);
    }

    /// Mark `assembly` as loaded and raise `OnManagedAssemblyLoaded`
    pub fn finish_assembly_load(&self, assembly: &str) -> Result<()> {
        if !self.load_state.finish(assembly) {
            return Err(ManagerError::AssemblyNotLoading(assembly.to_string()));
        }

        log::info!("Managed assembly '{}' loaded", assembly);
        self.events.managed_assembly_loaded.broadcast(&ManagedAssemblyLoadedEvent {
            assembly: assembly.to_string(),
        });
        Ok(())
    }

    /// Run `generate` between `begin_assembly_load` and `finish_assembly_load`.
    ///
    /// The load is finished even when `generate` fails. If `generate`
    /// panics the assembly is dropped from the loading set without raising
    /// `OnManagedAssemblyLoaded`, so the gate doesn't stay shut.
    pub fn load_assembly<R>(
        &self,
        assembly: &str,
        generate: impl FnOnce(&Self) -> Result<R>,
    ) -> Result<R> {
        self.begin_assembly_load(assembly);
        let guard = UnwindLoadGuard {
            load_state: &self.load_state,
            assembly,
        };
        let result = generate(self);
        std::mem::forget(guard);

        self.finish_assembly_load(assembly)?;
        result
    }

    // ========== Packages & blueprints ==========

    /// Create (or find) the package backing a managed assembly
    pub fn create_managed_package(&self, name: &str) -> PackageRef {
        let mut database = self.database.write();
        match database.find_package(name) {
            Some(package) => package,
            None => database.add_package(Package::managed(name)),
        }
    }

    /// Call `f` for every loaded managed package
    pub fn for_each_managed_package(&self, mut f: impl FnMut(PackageRef)) {
        let packages = self.database.read().managed_package_refs();
        for package in packages {
            f(package);
        }
    }

    /// Create a managed blueprint inside `package`
    pub fn create_blueprint(&self, package: PackageRef, name: &str) -> Result<BlueprintRef> {
        let mut database = self.database.write();
        if database.package(package).is_none() {
            return Err(ManagerError::PackageNotFound(format!("{:?}", package)));
        }
        Ok(database.add_blueprint(Blueprint::managed(name).in_package(package)))
    }

    /// Destroy a blueprint; classes it generated are left without an owner
    pub fn destroy_blueprint(&self, blueprint: BlueprintRef) -> bool {
        self.database.write().remove_blueprint(blueprint).is_some()
    }

    // ========== Type generation ==========

    /// Generate or regenerate a class.
    ///
    /// Returns `None` when the parent class doesn't exist yet; the definition
    /// is parked until [`ManagedManager::process_pending_classes`].
    pub fn define_class(&self, definition: ClassDefinition) -> Result<Option<ClassRef>> {
        let generated = self.try_generate_class(&definition)?;
        match generated {
            Some(class) => {
                self.events.new_class.broadcast(&NewClassEvent { class });
                Ok(Some(class))
            }
            None => {
                log::debug!(
                    "Parking class '{}' until its parent is generated",
                    definition.name
                );
                self.pending_classes.lock().push(definition);
                Ok(None)
            }
        }
    }

    /// Retry parked class definitions until no more can be resolved,
    /// then raise `OnProcessedPendingClasses`. Returns the number generated.
    ///
    /// A definition that fails to generate (its blueprint was destroyed while
    /// it was parked) is dropped with a warning.
    pub fn process_pending_classes(&self) -> usize {
        let mut generated = Vec::new();
        loop {
            let parked = std::mem::take(&mut *self.pending_classes.lock());
            let before = parked.len();
            let mut still_parked = Vec::new();

            for definition in parked {
                match self.try_generate_class(&definition) {
                    Ok(Some(class)) => generated.push(class),
                    Ok(None) => still_parked.push(definition),
                    Err(e) => log::warn!("Dropping class '{}': {}", definition.name, e),
                }
            }

            let progressed = still_parked.len() != before && !still_parked.is_empty();
            self.pending_classes.lock().extend(still_parked);
            if !progressed {
                break;
            }
        }

        for class in &generated {
            self.events.new_class.broadcast(&NewClassEvent { class: *class });
        }

        let event = ProcessedPendingClassesEvent {
            processed: generated.len(),
            remaining: self.pending_classes.lock().len(),
        };
        if event.remaining > 0 {
            log::warn!(
                "{} managed class definitions still wait on a missing parent",
                event.remaining
            );
        }
        self.events.processed_pending_classes.broadcast(&event);
        generated.len()
    }

    pub fn pending_class_count(&self) -> usize {
        self.pending_classes.lock().len()
    }

    /// Generate or regenerate a struct and raise `OnNewStruct`
    pub fn define_struct(&self, strukt: ManagedStruct) -> Result<StructRef> {
        let struct_ref = {
            let mut database = self.database.write();
            match database.find_struct(&strukt.name) {
                Some(existing) => {
                    database.set_struct_references(existing, strukt.managed_references)?;
                    existing
                }
                None => database.add_struct(strukt)?,
            }
        };

        self.events.new_struct.broadcast(&NewStructEvent { strukt: struct_ref });
        Ok(struct_ref)
    }

    /// Generate or regenerate an enum and raise `OnNewEnum`
    pub fn define_enum(&self, enumeration: ManagedEnum) -> Result<EnumRef> {
        let enum_ref = {
            let mut database = self.database.write();
            match database.find_enum(&enumeration.name) {
                Some(existing) => {
                    if let Some(entry) = database.enumeration_mut(existing) {
                        entry.managed_references = enumeration.managed_references;
                    }
                    existing
                }
                None => database.add_enum(enumeration)?,
            }
        };

        self.events.new_enum.broadcast(&NewEnumEvent { enumeration: enum_ref });
        Ok(enum_ref)
    }

    /// Create or update the class for `definition` if its parent exists.
    /// Never raises events.
    fn try_generate_class(&self, definition: &ClassDefinition) -> Result<Option<ClassRef>> {
        let mut database = self.database.write();

        let super_class = match &definition.super_name {
            Some(name) => match database.find_class(name) {
                Some(class) => class,
                None => return Ok(None),
            },
            None => database.object_class(),
        };

        let class = match database.find_class(&definition.name) {
            Some(existing) => {
                database.set_super_class(existing, super_class)?;
                existing
            }
            None => database.add_class(ManagedClass::new(definition.name.clone()).with_super(super_class))?,
        };

        if let Some(blueprint) = definition.blueprint {
            database.bind_generated_class(blueprint, class)?;
        }

        log::trace!("Generated class '{}' as {:?}", definition.name, class);
        Ok(Some(class))
    }
}

/// Clears an in-flight load if generation unwinds
struct UnwindLoadGuard<'a> {
    load_state: &'a AssemblyLoadState,
    assembly: &'a str,
}

impl Drop for UnwindLoadGuard<'_> {
    fn drop(&mut self) {
        log::warn!("Loading managed assembly '{}' was aborted", self.assembly);
        self.load_state.finish(self.assembly);
    }
}

impl Default for ManagedManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectModel for ManagedManager {
    fn blueprint_for_class(&self, class: ClassRef) -> Option<BlueprintRef> {
        self.database.read().resolve_blueprint_for_class(class)
    }

    fn is_component_class(&self, class: ClassRef) -> bool {
        let database = self.database.read();
        database.class(class).is_some() && database.is_child_of(class, database.component_class())
    }

    fn generated_class(&self, blueprint: BlueprintRef) -> Option<ClassRef> {
        self.database.read().resolve_generated_class(blueprint)
    }

    fn blueprint_kind(&self, blueprint: BlueprintRef) -> Option<BlueprintKind> {
        self.database.read().blueprint(blueprint).map(|b| b.kind)
    }

    fn struct_references(&self, strukt: StructRef) -> Option<ManagedReferences> {
        self.database
            .read()
            .strukt(strukt)
            .map(|s| s.managed_references.clone())
    }

    fn enum_references(&self, enumeration: EnumRef) -> Option<ManagedReferences> {
        self.database
            .read()
            .enumeration(enumeration)
            .map(|e| e.managed_references.clone())
    }

    fn managed_packages(&self) -> Vec<PackageRef> {
        self.database.read().managed_package_refs()
    }

    fn blueprints_in_package(&self, package: PackageRef) -> Vec<BlueprintRef> {
        self.database.read().blueprints_in(package)
    }
}

impl AssemblyLoadGate for ManagedManager {
    fn is_loading_any_assembly(&self) -> bool {
        self.load_state.is_loading_any_assembly()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(n: &str) -> TypeName {
        TypeName::new("Game", "Game", n)
    }

    #[test]
    fn test_define_class_raises_event() {
        let manager = ManagedManager::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let token = {
            let seen = Arc::clone(&seen);
            manager
                .on_new_class()
                .subscribe(move |e: &NewClassEvent| seen.lock().push(e.class))
        };

        let class = manager
            .define_class(ClassDefinition::new(name("Door")))
            .unwrap()
            .unwrap();
        assert_eq!(*seen.lock(), vec![class]);
        assert!(manager.on_new_class().unsubscribe(token));
    }

    #[test]
    fn test_pending_class_waits_for_parent() {
        let manager = ManagedManager::new();
        let processed = Arc::new(Mutex::new(None));
        let token = {
            let processed = Arc::clone(&processed);
            manager
                .on_processed_pending_classes()
                .subscribe(move |e: &ProcessedPendingClassesEvent| *processed.lock() = Some(*e))
        };

        let child = manager
            .define_class(ClassDefinition::new(name("SlidingDoor")).with_super(name("Door")))
            .unwrap();
        assert!(child.is_none());
        assert_eq!(manager.pending_class_count(), 1);

        manager.define_class(ClassDefinition::new(name("Door"))).unwrap();
        assert_eq!(manager.process_pending_classes(), 1);
        assert_eq!(manager.pending_class_count(), 0);
        assert_eq!(
            *processed.lock(),
            Some(ProcessedPendingClassesEvent { processed: 1, remaining: 0 })
        );
        assert!(manager.database().find_class(&name("SlidingDoor")).is_some());
        assert!(manager.on_processed_pending_classes().unsubscribe(token));
    }

    #[test]
    fn test_redefining_class_under_itself_fails() {
        let manager = ManagedManager::new();
        let door = manager
            .define_class(ClassDefinition::new(name("Door")))
            .unwrap()
            .unwrap();
        manager
            .define_class(ClassDefinition::new(name("SlidingDoor")).with_super(name("Door")))
            .unwrap();

        for parent in ["Door", "SlidingDoor"] {
            assert!(matches!(
                manager.define_class(ClassDefinition::new(name("Door")).with_super(name(parent))),
                Err(ManagerError::Core(CoreError::CyclicInheritance(_)))
            ));
        }

        // The hierarchy walk still terminates
        assert!(!manager.is_component_class(door));
        let database = manager.database();
        assert!(database.is_child_of(door, database.object_class()));
    }

    #[test]
    fn test_finish_without_begin_fails() {
        let manager = ManagedManager::new();
        assert!(matches!(
            manager.finish_assembly_load("Game"),
            Err(ManagerError::AssemblyNotLoading(_))
        ));
    }

    #[test]
    fn test_load_assembly_gates_while_generating() {
        let manager = ManagedManager::new();
        let was_loading = manager
            .load_assembly("Game", |m| Ok(m.is_loading_any_assembly()))
            .unwrap();
        assert!(was_loading);
        assert!(!manager.is_loading_any_assembly());
    }

    #[test]
    fn test_panicking_load_reopens_gate() {
        let manager = ManagedManager::new();
        let loaded = Arc::new(Mutex::new(Vec::new()));
        let token = {
            let loaded = Arc::clone(&loaded);
            manager
                .on_managed_assembly_loaded()
                .subscribe(move |e: &ManagedAssemblyLoadedEvent| loaded.lock().push(e.assembly.clone()))
        };

        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            manager.load_assembly("Game", |_| -> Result<()> { panic!("type generation failed") })
        }));
        assert!(outcome.is_err());
        assert!(!manager.is_loading_any_assembly());
        assert!(loaded.lock().is_empty());

        // The assembly can be loaded again afterwards
        manager.load_assembly("Game", |_| Ok(())).unwrap();
        assert_eq!(*loaded.lock(), vec!["Game".to_string()]);
        assert!(manager.on_managed_assembly_loaded().unsubscribe(token));
    }
}
