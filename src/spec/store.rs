//! Validated store of process specifications.
//!
//! [`SpecStore::load`] takes the full declared set of specs, validates
//! each one and the cross-spec uniqueness rule, and freezes the result.
//! The store is read-only for the rest of the supervisor's life, with one
//! exception: `delete` removes a spec together with its handles.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::SpecError;
use crate::spec::ProcessSpec;

/// Immutable, validated collection of [`ProcessSpec`]s, keyed by name.
///
/// Load order is preserved so that startup and status listings follow the
/// declaration order.
#[derive(Debug, Default)]
pub struct SpecStore {
    by_name: HashMap<String, Arc<ProcessSpec>>,
    order: Vec<String>,
}

impl SpecStore {
    /// Validates and loads a declared set of specs.
    ///
    /// Fails with the first [`SpecError`] encountered: duplicate name,
    /// empty name or command, or `instances < 1`. A failed load leaves
    /// nothing behind; the supervisor refuses to start.
    pub fn load(specs: Vec<ProcessSpec>) -> Result<Self, SpecError> {
        let mut store = SpecStore::default();
        for spec in specs {
            spec.validate()?;
            let name = spec.name().to_string();
            if store.by_name.contains_key(&name) {
                return Err(SpecError::DuplicateName { name });
            }
            store.order.push(name.clone());
            store.by_name.insert(name, Arc::new(spec));
        }
        Ok(store)
    }

    /// Looks up a spec by name.
    pub fn get(&self, name: &str) -> Option<Arc<ProcessSpec>> {
        self.by_name.get(name).cloned()
    }

    /// Names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Specs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = Arc<ProcessSpec>> + '_ {
        self.order.iter().filter_map(|n| self.by_name.get(n).cloned())
    }

    /// Number of loaded specs.
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    /// True when no specs are loaded.
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Removes one spec (used by `delete`).
    pub(crate) fn remove(&mut self, name: &str) -> Option<Arc<ProcessSpec>> {
        self.order.retain(|n| n != name);
        self.by_name.remove(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(name: &str) -> ProcessSpec {
        ProcessSpec::builder(name, "sleep").arg("1").build()
    }

    #[test]
    fn load_preserves_declaration_order() {
        let store = SpecStore::load(vec![spec("web"), spec("api"), spec("worker")])
            .expect("valid specs");
        let names: Vec<&str> = store.names().collect();
        assert_eq!(names, ["web", "api", "worker"]);
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn load_rejects_duplicate_names() {
        let err = SpecStore::load(vec![spec("web"), spec("web")]).unwrap_err();
        assert!(matches!(err, SpecError::DuplicateName { name } if name == "web"));
    }

    #[test]
    fn load_rejects_zero_instances() {
        let bad = ProcessSpec::builder("web", "sleep").instances(0).build();
        let err = SpecStore::load(vec![bad]).unwrap_err();
        assert!(matches!(err, SpecError::NoInstances { .. }));
    }

    #[test]
    fn get_unknown_name_is_none() {
        let store = SpecStore::load(vec![spec("web")]).expect("valid");
        assert!(store.get("api").is_none());
    }

    #[test]
    fn remove_drops_spec_and_order() {
        let mut store = SpecStore::load(vec![spec("web"), spec("api")]).expect("valid");
        assert!(store.remove("web").is_some());
        assert!(store.get("web").is_none());
        let names: Vec<&str> = store.names().collect();
        assert_eq!(names, ["api"]);
    }
}
