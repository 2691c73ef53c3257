//! Engine-side queries the bridge depends on
//!
//! The bridge never owns the engine's object graph. It asks through these
//! traits, which the manager implements for the live engine and tests
//! implement with small in-memory graphs.

use crate::reflection::{
    BlueprintKind, BlueprintRef, ClassRef, EnumRef, ManagedReferences, PackageRef, StructRef,
};

/// Read access to reflected objects
pub trait ObjectModel: Send + Sync {
    /// Blueprint that generated `class`, if both are still alive
    fn blueprint_for_class(&self, class: ClassRef) -> Option<BlueprintRef>;

    /// Whether `class` derives from the engine's component base class
    fn is_component_class(&self, class: ClassRef) -> bool;

    /// Class currently generated by `blueprint`
    fn generated_class(&self, blueprint: BlueprintRef) -> Option<ClassRef>;

    fn blueprint_kind(&self, blueprint: BlueprintRef) -> Option<BlueprintKind>;

    /// Managed references collected for a generated struct
    fn struct_references(&self, strukt: StructRef) -> Option<ManagedReferences>;

    /// Managed references collected for a generated enum
    fn enum_references(&self, enumeration: EnumRef) -> Option<ManagedReferences>;

    /// Every loaded package created for a managed assembly
    fn managed_packages(&self) -> Vec<PackageRef>;

    /// Blueprints stored in `package`
    fn blueprints_in_package(&self, package: PackageRef) -> Vec<BlueprintRef>;
}

/// Whether any managed assembly is mid-load
pub trait AssemblyLoadGate: Send + Sync {
    fn is_loading_any_assembly(&self) -> bool;
}
