//! Notifications raised while managed types are generated

use usharp_core::prelude::*;
use usharp_event::EventDispatcher;

/// A class was generated or regenerated
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NewClassEvent {
    pub class: ClassRef,
}

/// A struct was generated or regenerated
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NewStructEvent {
    pub strukt: StructRef,
}

/// An enum was generated or regenerated
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NewEnumEvent {
    pub enumeration: EnumRef,
}

/// Parked class definitions were retried
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProcessedPendingClassesEvent {
    /// Classes generated by this pass
    pub processed: usize,
    /// Definitions still waiting on a parent class
    pub remaining: usize,
}

/// One managed assembly finished loading
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ManagedAssemblyLoadedEvent {
    pub assembly: String,
}

/// Every event the manager raises
#[derive(Debug)]
pub struct ManagedEvents {
    pub new_class: EventDispatcher<NewClassEvent>,
    pub new_struct: EventDispatcher<NewStructEvent>,
    pub new_enum: EventDispatcher<NewEnumEvent>,
    pub processed_pending_classes: EventDispatcher<ProcessedPendingClassesEvent>,
    pub managed_assembly_loaded: EventDispatcher<ManagedAssemblyLoadedEvent>,
}

impl ManagedEvents {
    pub fn new() -> Self {
        Self {
            new_class: EventDispatcher::new("OnNewClass"),
            new_struct: EventDispatcher::new("OnNewStruct"),
            new_enum: EventDispatcher::new("OnNewEnum"),
            processed_pending_classes: EventDispatcher::new("OnProcessedPendingClasses"),
            managed_assembly_loaded: EventDispatcher::new("OnManagedAssemblyLoaded"),
        }
    }
}

impl Default for ManagedEvents {
    fn default() -> Self {
        Self::new()
    }
}
