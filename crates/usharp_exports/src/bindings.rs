//! Process-wide state behind the exported entry points
//!
//! `extern "C"` functions carry no context, so the engine installs one
//! [`ExportBindings`] value at startup and the entry points read it.

use std::sync::{Arc, OnceLock};

use crate::callbacks::{AssetManagerPtr, ManagedCallbacks};
use crate::error::{ExportError, Result};
use crate::lookup::NativeTypeLookup;
use crate::struct_ops::StructLayouts;

static BINDINGS: OnceLock<ExportBindings> = OnceLock::new();

/// What the exported functions forward to
pub struct ExportBindings {
    pub lookup: Arc<dyn NativeTypeLookup>,
    pub layouts: Arc<StructLayouts>,
    pub asset_manager: AssetManagerPtr,
    pub callbacks: ManagedCallbacks,
}

impl ExportBindings {
    pub fn new(lookup: Arc<dyn NativeTypeLookup>, layouts: Arc<StructLayouts>) -> Self {
        Self {
            lookup,
            layouts,
            asset_manager: AssetManagerPtr::NULL,
            callbacks: ManagedCallbacks::default(),
        }
    }

    pub fn with_asset_manager(mut self, asset_manager: AssetManagerPtr) -> Self {
        self.asset_manager = asset_manager;
        self
    }

    pub fn with_callbacks(mut self, callbacks: ManagedCallbacks) -> Self {
        self.callbacks = callbacks;
        self
    }
}

/// Install the bindings. Fails if they were already installed.
pub fn install(bindings: ExportBindings) -> Result<()> {
    BINDINGS
        .set(bindings)
        .map_err(|_| ExportError::AlreadyInstalled)?;
    log::info!("Managed export bindings installed");
    Ok(())
}

pub fn bindings() -> Option<&'static ExportBindings> {
    BINDINGS.get()
}

pub fn is_installed() -> bool {
    BINDINGS.get().is_some()
}

/// The engine's asset manager, or null before installation
pub fn asset_manager() -> AssetManagerPtr {
    BINDINGS
        .get()
        .map(|bindings| bindings.asset_manager)
        .unwrap_or(AssetManagerPtr::NULL)
}

/// The managed runtime's callback table, once installed
pub fn managed_callbacks() -> Option<&'static ManagedCallbacks> {
    BINDINGS.get().map(|bindings| &bindings.callbacks)
}
