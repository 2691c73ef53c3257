//! Integration tests for usharp_manager

use parking_lot::Mutex;
use std::sync::Arc;
use usharp_core::prelude::*;
use usharp_manager::*;

fn game(name: &str) -> TypeName {
    TypeName::new("Game", "Game", name)
}

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn test_assembly_loaded_event_fires_after_gate_opens() {
    init_logging();
    let manager = Arc::new(ManagedManager::new());
    let observed = Arc::new(Mutex::new(Vec::new()));

    let token = {
        let manager_ref = Arc::clone(&manager);
        let observed = Arc::clone(&observed);
        manager
            .on_managed_assembly_loaded()
            .subscribe(move |e: &ManagedAssemblyLoadedEvent| {
                observed
                    .lock()
                    .push((e.assembly.clone(), manager_ref.is_loading_any_assembly()));
            })
    };

    manager.begin_assembly_load("Game");
    manager.begin_assembly_load("Game.Plugins");
    manager.finish_assembly_load("Game").unwrap();
    manager.finish_assembly_load("Game.Plugins").unwrap();

    assert_eq!(
        *observed.lock(),
        vec![("Game".to_string(), true), ("Game.Plugins".to_string(), false)]
    );
    assert!(manager.on_managed_assembly_loaded().unsubscribe(token));
}

#[test]
fn test_blueprint_class_reports_owner_and_component_kind() {
    init_logging();
    let manager = ManagedManager::new();
    let package = manager.create_managed_package("/Script/Game");
    let blueprint = manager.create_blueprint(package, "BP_Health").unwrap();
    let component_name = {
        let database = manager.database();
        database.class(database.component_class()).unwrap().name.clone()
    };

    let class = manager
        .define_class(
            ClassDefinition::new(game("HealthComponent"))
                .with_super(component_name)
                .with_blueprint(blueprint),
        )
        .unwrap()
        .unwrap();

    assert_eq!(manager.blueprint_for_class(class), Some(blueprint));
    assert_eq!(manager.generated_class(blueprint), Some(class));
    assert!(manager.is_component_class(class));
    assert_eq!(manager.blueprint_kind(blueprint), Some(BlueprintKind::Managed));
    assert_eq!(manager.managed_packages(), vec![package]);
    assert_eq!(manager.blueprints_in_package(package), vec![blueprint]);

    assert!(manager.destroy_blueprint(blueprint));
    assert_eq!(manager.blueprint_for_class(class), None);
}

#[test]
fn test_redefining_types_reuses_objects_and_renotifies() {
    init_logging();
    let manager = ManagedManager::new();
    let structs = Arc::new(Mutex::new(Vec::new()));
    let token = {
        let structs = Arc::clone(&structs);
        manager
            .on_new_struct()
            .subscribe(move |e: &NewStructEvent| structs.lock().push(e.strukt))
    };

    let door = manager.define_class(ClassDefinition::new(game("Door"))).unwrap().unwrap();
    let first = manager.define_struct(ManagedStruct::new(game("DoorState"))).unwrap();
    let second = manager
        .define_struct(
            ManagedStruct::new(game("DoorState"))
                .with_references(ManagedReferences::new().with(ManagedReference::Class(door))),
        )
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(*structs.lock(), vec![first, second]);
    assert_eq!(
        manager.struct_references(first).unwrap().classes().collect::<Vec<_>>(),
        vec![door]
    );
    assert!(manager.on_new_struct().unsubscribe(token));
}

#[test]
fn test_enum_references_are_exposed() {
    let manager = ManagedManager::new();
    let door = manager.define_class(ClassDefinition::new(game("Door"))).unwrap().unwrap();
    let enumeration = manager
        .define_enum(
            ManagedEnum::new(game("DoorKind"))
                .with_references(ManagedReferences::new().with(ManagedReference::Class(door))),
        )
        .unwrap();

    let references = manager.enum_references(enumeration).unwrap();
    assert_eq!(references.classes().collect::<Vec<_>>(), vec![door]);
}
