//! Reflection descriptors for managed-backed types
//!
//! These mirror the native reflection objects generated for each managed
//! type: classes (optionally owned by a blueprint), structs, enums and the
//! packages that contain them.

use core::fmt;

use crate::object::ObjectRef;

pub type ClassRef = ObjectRef<ManagedClass>;
pub type StructRef = ObjectRef<ManagedStruct>;
pub type EnumRef = ObjectRef<ManagedEnum>;
pub type BlueprintRef = ObjectRef<Blueprint>;
pub type PackageRef = ObjectRef<Package>;

/// Fully qualified name of a managed type
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeName {
    pub assembly: String,
    pub namespace: String,
    pub name: String,
}

impl TypeName {
    pub fn new(
        assembly: impl Into<String>,
        namespace: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            assembly: assembly.into(),
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace.is_empty() {
            write!(f, "{}::{}", self.assembly, self.name)
        } else {
            write!(f, "{}::{}.{}", self.assembly, self.namespace, self.name)
        }
    }
}

/// A native class generated for a managed type
#[derive(Clone, Debug)]
pub struct ManagedClass {
    pub name: TypeName,
    /// Parent class, `None` for a root
    pub super_class: Option<ClassRef>,
    /// Blueprint whose compilation produces this class
    pub generated_by: Option<BlueprintRef>,
}

impl ManagedClass {
    pub fn new(name: TypeName) -> Self {
        Self {
            name,
            super_class: None,
            generated_by: None,
        }
    }

    pub fn with_super(mut self, super_class: ClassRef) -> Self {
        self.super_class = Some(super_class);
        self
    }

    pub fn generated_by(mut self, blueprint: BlueprintRef) -> Self {
        self.generated_by = Some(blueprint);
        self
    }
}

/// Which compiler pipeline a blueprint belongs to
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BlueprintKind {
    /// Ordinary engine blueprint
    #[default]
    Native,
    /// Blueprint backed by a managed class
    Managed,
}

/// Blueprint asset wrapping a generated class
#[derive(Clone, Debug)]
pub struct Blueprint {
    pub name: String,
    pub kind: BlueprintKind,
    pub package: Option<PackageRef>,
    pub generated_class: Option<ClassRef>,
}

impl Blueprint {
    pub fn managed(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: BlueprintKind::Managed,
            package: None,
            generated_class: None,
        }
    }

    pub fn native(name: impl Into<String>) -> Self {
        Self {
            kind: BlueprintKind::Native,
            ..Self::managed(name)
        }
    }

    pub fn in_package(mut self, package: PackageRef) -> Self {
        self.package = Some(package);
        self
    }
}

/// A type a struct or enum depends on
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ManagedReference {
    Class(ClassRef),
    Struct(StructRef),
}

/// Managed-backed types a struct or enum refers to, in discovery order
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ManagedReferences {
    references: Vec<ManagedReference>,
}

impl ManagedReferences {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a reference; duplicates are ignored. Returns whether it was added.
    pub fn add(&mut self, reference: ManagedReference) -> bool {
        if self.references.contains(&reference) {
            return false;
        }
        self.references.push(reference);
        true
    }

    pub fn with(mut self, reference: ManagedReference) -> Self {
        self.add(reference);
        self
    }

    pub fn for_each_managed_reference(&self, mut f: impl FnMut(ManagedReference)) {
        for reference in &self.references {
            f(*reference);
        }
    }

    /// Class references only
    pub fn classes(&self) -> impl Iterator<Item = ClassRef> + '_ {
        self.references.iter().filter_map(|r| match r {
            ManagedReference::Class(class) => Some(*class),
            ManagedReference::Struct(_) => None,
        })
    }

    pub fn len(&self) -> usize {
        self.references.len()
    }

    pub fn is_empty(&self) -> bool {
        self.references.is_empty()
    }
}

impl FromIterator<ManagedReference> for ManagedReferences {
    fn from_iter<I: IntoIterator<Item = ManagedReference>>(iter: I) -> Self {
        let mut references = Self::new();
        for reference in iter {
            references.add(reference);
        }
        references
    }
}

/// A native struct generated for a managed type
#[derive(Clone, Debug)]
pub struct ManagedStruct {
    pub name: TypeName,
    pub managed_references: ManagedReferences,
}

impl ManagedStruct {
    pub fn new(name: TypeName) -> Self {
        Self {
            name,
            managed_references: ManagedReferences::new(),
        }
    }

    pub fn with_references(mut self, references: ManagedReferences) -> Self {
        self.managed_references = references;
        self
    }
}

/// A native enum generated for a managed type
#[derive(Clone, Debug)]
pub struct ManagedEnum {
    pub name: TypeName,
    pub managed_references: ManagedReferences,
}

impl ManagedEnum {
    pub fn new(name: TypeName) -> Self {
        Self {
            name,
            managed_references: ManagedReferences::new(),
        }
    }

    pub fn with_references(mut self, references: ManagedReferences) -> Self {
        self.managed_references = references;
        self
    }
}

/// Package holding generated types and their blueprints
#[derive(Clone, Debug)]
pub struct Package {
    pub name: String,
    /// Whether the package was created for a managed assembly
    pub is_managed: bool,
}

impl Package {
    pub fn managed(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_managed: true,
        }
    }

    pub fn native(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_managed: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_references_deduplicate_in_order() {
        let a = ClassRef::new(1, 0);
        let b = ClassRef::new(2, 0);
        let s = StructRef::new(3, 0);

        let refs: ManagedReferences = [
            ManagedReference::Class(a),
            ManagedReference::Struct(s),
            ManagedReference::Class(b),
            ManagedReference::Class(a),
        ]
        .into_iter()
        .collect();

        assert_eq!(refs.len(), 3);
        assert_eq!(refs.classes().collect::<Vec<_>>(), vec![a, b]);
    }

    #[test]
    fn test_type_name_display() {
        assert_eq!(TypeName::new("Game", "Game.Actors", "Door").to_string(), "Game::Game.Actors.Door");
        assert_eq!(TypeName::new("Game", "", "Door").to_string(), "Game::Door");
    }
}
