//! Reflection database
//!
//! Owns every generated class, struct, enum, blueprint and package, and
//! answers the [`ObjectModel`] queries the compiler bridge makes.

use std::collections::HashMap;

use usharp_core::prelude::*;

use crate::error::Result;

/// Name of the assembly that owns the engine's built-in classes
pub const ENGINE_ASSEMBLY: &str = "Engine";

/// In-memory store of reflected objects
pub struct TypeDatabase {
    classes: ObjectTable<ManagedClass>,
    structs: ObjectTable<ManagedStruct>,
    enums: ObjectTable<ManagedEnum>,
    blueprints: ObjectTable<Blueprint>,
    packages: ObjectTable<Package>,
    class_names: HashMap<TypeName, ClassRef>,
    struct_names: HashMap<TypeName, StructRef>,
    enum_names: HashMap<TypeName, EnumRef>,
    object_class: ClassRef,
    component_class: ClassRef,
}

impl TypeDatabase {
    /// Create a database seeded with the engine's root and component base classes
    pub fn new() -> Self {
        let mut classes = ObjectTable::new();
        let object_name = TypeName::new(ENGINE_ASSEMBLY, "", "Object");
        let component_name = TypeName::new(ENGINE_ASSEMBLY, "", "ActorComponent");

        let object_class = classes.insert(ManagedClass::new(object_name.clone()));
        let component_class =
            classes.insert(ManagedClass::new(component_name.clone()).with_super(object_class));

        let mut class_names = HashMap::new();
        class_names.insert(object_name, object_class);
        class_names.insert(component_name, component_class);

        Self {
            classes,
            structs: ObjectTable::new(),
            enums: ObjectTable::new(),
            blueprints: ObjectTable::new(),
            packages: ObjectTable::new(),
            class_names,
            struct_names: HashMap::new(),
            enum_names: HashMap::new(),
            object_class,
            component_class,
        }
    }

    /// The root class every class derives from
    pub fn object_class(&self) -> ClassRef {
        self.object_class
    }

    /// The engine's component base class
    pub fn component_class(&self) -> ClassRef {
        self.component_class
    }

    // ========== Packages ==========

    pub fn add_package(&mut self, package: Package) -> PackageRef {
        self.packages.insert(package)
    }

    pub fn package(&self, package: PackageRef) -> Option<&Package> {
        self.packages.get(package)
    }

    /// Find a package by name
    pub fn find_package(&self, name: &str) -> Option<PackageRef> {
        self.packages
            .iter()
            .find(|(_, package)| package.name == name)
            .map(|(package_ref, _)| package_ref)
    }

    // ========== Classes ==========

    /// Register a class. The parent, if any, must be live.
    pub fn add_class(&mut self, class: ManagedClass) -> Result<ClassRef> {
        if self.class_names.contains_key(&class.name) {
            return Err(CoreError::DuplicateType(class.name).into());
        }
        if let Some(super_class) = class.super_class {
            if !self.classes.contains(super_class) {
                return Err(CoreError::InvalidSuperClass(class.name).into());
            }
        }

        let name = class.name.clone();
        let class_ref = self.classes.insert(class);
        self.class_names.insert(name, class_ref);
        Ok(class_ref)
    }

    /// Destroy a class; references to it go stale
    pub fn remove_class(&mut self, class: ClassRef) -> Option<ManagedClass> {
        let removed = self.classes.remove(class)?;
        self.class_names.remove(&removed.name);
        Some(removed)
    }

    pub fn class(&self, class: ClassRef) -> Option<&ManagedClass> {
        self.classes.get(class)
    }

    pub fn class_mut(&mut self, class: ClassRef) -> Option<&mut ManagedClass> {
        self.classes.get_mut(class)
    }

    pub fn find_class(&self, name: &TypeName) -> Option<ClassRef> {
        self.class_names.get(name).copied()
    }

    /// Point `class` at a new parent. Rejects parents that are stale or
    /// that already derive from `class`.
    pub fn set_super_class(&mut self, class: ClassRef, super_class: ClassRef) -> Result<()> {
        let name = match self.classes.get(class) {
            Some(entry) => entry.name.clone(),
            None => return Err(CoreError::stale::<ManagedClass>().into()),
        };
        if !self.classes.contains(super_class) {
            return Err(CoreError::InvalidSuperClass(name).into());
        }
        if self.is_child_of(super_class, class) {
            return Err(CoreError::CyclicInheritance(name).into());
        }

        if let Some(entry) = self.classes.get_mut(class) {
            entry.super_class = Some(super_class);
        }
        Ok(())
    }

    /// Walk the parent chain of `class` looking for `base`
    pub fn is_child_of(&self, class: ClassRef, base: ClassRef) -> bool {
        let mut current = Some(class);
        while let Some(class_ref) = current {
            if class_ref == base {
                return true;
            }
            current = self.classes.get(class_ref).and_then(|c| c.super_class);
        }
        false
    }

    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    // ========== Blueprints ==========

    pub fn add_blueprint(&mut self, blueprint: Blueprint) -> BlueprintRef {
        self.blueprints.insert(blueprint)
    }

    pub fn blueprint(&self, blueprint: BlueprintRef) -> Option<&Blueprint> {
        self.blueprints.get(blueprint)
    }

    /// Destroy a blueprint; classes it generated lose their owner
    pub fn remove_blueprint(&mut self, blueprint: BlueprintRef) -> Option<Blueprint> {
        self.blueprints.remove(blueprint)
    }

    /// Link `blueprint` and `class` in both directions
    pub fn bind_generated_class(&mut self, blueprint: BlueprintRef, class: ClassRef) -> Result<()> {
        if !self.classes.contains(class) {
            return Err(CoreError::stale::<ManagedClass>().into());
        }

        let blueprint_entry = self
            .blueprints
            .get_mut(blueprint)
            .ok_or_else(CoreError::stale::<Blueprint>)?;
        blueprint_entry.generated_class = Some(class);

        let class_entry = self
            .classes
            .get_mut(class)
            .ok_or_else(CoreError::stale::<ManagedClass>)?;
        class_entry.generated_by = Some(blueprint);
        Ok(())
    }

    // ========== Structs & enums ==========

    pub fn add_struct(&mut self, strukt: ManagedStruct) -> Result<StructRef> {
        if self.struct_names.contains_key(&strukt.name) {
            return Err(CoreError::DuplicateType(strukt.name).into());
        }
        let name = strukt.name.clone();
        let struct_ref = self.structs.insert(strukt);
        self.struct_names.insert(name, struct_ref);
        Ok(struct_ref)
    }

    pub fn strukt(&self, strukt: StructRef) -> Option<&ManagedStruct> {
        self.structs.get(strukt)
    }

    pub fn find_struct(&self, name: &TypeName) -> Option<StructRef> {
        self.struct_names.get(name).copied()
    }

    pub fn add_enum(&mut self, enumeration: ManagedEnum) -> Result<EnumRef> {
        if self.enum_names.contains_key(&enumeration.name) {
            return Err(CoreError::DuplicateType(enumeration.name).into());
        }
        let name = enumeration.name.clone();
        let enum_ref = self.enums.insert(enumeration);
        self.enum_names.insert(name, enum_ref);
        Ok(enum_ref)
    }

    pub fn enumeration(&self, enumeration: EnumRef) -> Option<&ManagedEnum> {
        self.enums.get(enumeration)
    }

    pub fn enumeration_mut(&mut self, enumeration: EnumRef) -> Option<&mut ManagedEnum> {
        self.enums.get_mut(enumeration)
    }

    pub fn find_enum(&self, name: &TypeName) -> Option<EnumRef> {
        self.enum_names.get(name).copied()
    }

    /// Replace the managed references recorded for a struct
    pub fn set_struct_references(
        &mut self,
        strukt: StructRef,
        references: ManagedReferences,
    ) -> Result<()> {
        let entry = self
            .structs
            .get_mut(strukt)
            .ok_or_else(CoreError::stale::<ManagedStruct>)?;
        entry.managed_references = references;
        Ok(())
    }
}

impl Default for TypeDatabase {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeDatabase {
    pub(crate) fn resolve_blueprint_for_class(&self, class: ClassRef) -> Option<BlueprintRef> {
        let blueprint = self.classes.get(class)?.generated_by?;
        self.blueprints.contains(blueprint).then_some(blueprint)
    }

    pub(crate) fn resolve_generated_class(&self, blueprint: BlueprintRef) -> Option<ClassRef> {
        let class = self.blueprints.get(blueprint)?.generated_class?;
        self.classes.contains(class).then_some(class)
    }

    pub(crate) fn managed_package_refs(&self) -> Vec<PackageRef> {
        self.packages
            .iter()
            .filter(|(_, package)| package.is_managed)
            .map(|(package_ref, _)| package_ref)
            .collect()
    }

    pub(crate) fn blueprints_in(&self, package: PackageRef) -> Vec<BlueprintRef> {
        self.blueprints
            .iter()
            .filter(|(_, blueprint)| blueprint.package == Some(package))
            .map(|(blueprint_ref, _)| blueprint_ref)
            .collect()
    }
}
