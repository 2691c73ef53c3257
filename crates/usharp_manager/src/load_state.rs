//! Assembly load tracking
//!
//! Recompiling while an assembly is half-loaded would compile against an
//! incomplete type graph, so the scheduler checks this before every drain.

use parking_lot::Mutex;
use usharp_core::AssemblyLoadGate;

/// Assemblies currently being loaded
#[derive(Debug, Default)]
pub struct AssemblyLoadState {
    loading: Mutex<Vec<String>>,
}

impl AssemblyLoadState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `assembly` as loading. Nested loads of the same name are counted separately.
    pub fn begin(&self, assembly: &str) {
        self.loading.lock().push(assembly.to_string());
    }

    /// Mark one load of `assembly` as finished. Returns false if it wasn't loading.
    pub fn finish(&self, assembly: &str) -> bool {
        let mut loading = self.loading.lock();
        match loading.iter().position(|name| name == assembly) {
            Some(index) => {
                loading.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn is_loading(&self, assembly: &str) -> bool {
        self.loading.lock().iter().any(|name| name == assembly)
    }

    /// Names of assemblies mid-load, in the order loading began
    pub fn loading_assemblies(&self) -> Vec<String> {
        self.loading.lock().clone()
    }
}

impl AssemblyLoadGate for AssemblyLoadState {
    fn is_loading_any_assembly(&self) -> bool {
        !self.loading.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_loads() {
        let state = AssemblyLoadState::new();
        assert!(!state.is_loading_any_assembly());

        state.begin("Game");
        state.begin("Game.Plugins");
        assert!(state.is_loading_any_assembly());

        assert!(state.finish("Game"));
        assert!(state.is_loading_any_assembly());
        assert_eq!(state.loading_assemblies(), vec!["Game.Plugins".to_string()]);

        assert!(state.finish("Game.Plugins"));
        assert!(!state.finish("Game.Plugins"));
        assert!(!state.is_loading_any_assembly());
    }
}
