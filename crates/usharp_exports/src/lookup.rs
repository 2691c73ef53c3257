//! Native type lookup by managed name

use usharp_core::{ClassRef, StructRef, TypeName};
use usharp_manager::ManagedManager;

/// Resolves reflection objects from the names the managed side knows
pub trait NativeTypeLookup: Send + Sync {
    fn find_class(&self, name: &TypeName) -> Option<ClassRef>;

    fn find_struct(&self, name: &TypeName) -> Option<StructRef>;
}

impl NativeTypeLookup for ManagedManager {
    fn find_class(&self, name: &TypeName) -> Option<ClassRef> {
        self.database().find_class(name)
    }

    fn find_struct(&self, name: &TypeName) -> Option<StructRef> {
        self.database().find_struct(name)
    }
}

/// Find the class generated for `assembly::namespace.name`
pub fn native_class_from_name(
    lookup: &dyn NativeTypeLookup,
    assembly: &str,
    namespace: &str,
    name: &str,
) -> Option<ClassRef> {
    let type_name = TypeName::new(assembly, namespace, name);
    let class = lookup.find_class(&type_name);
    if class.is_none() {
        log::debug!("No native class for '{}'", type_name);
    }
    class
}

/// Find the struct generated for `assembly::namespace.name`
pub fn native_struct_from_name(
    lookup: &dyn NativeTypeLookup,
    assembly: &str,
    namespace: &str,
    name: &str,
) -> Option<StructRef> {
    let type_name = TypeName::new(assembly, namespace, name);
    let strukt = lookup.find_struct(&type_name);
    if strukt.is_none() {
        log::debug!("No native struct for '{}'", type_name);
    }
    strukt
}
