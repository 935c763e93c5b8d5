//! # Model Store
//!
//! Typed key/value map with change notification. Every identifier keeps the kind of the
//! first value assigned to it for the lifetime of the store. `set` reports whether the value
//! actually changed; the runtime turns a change into a model-changed event and hands it to
//! every [`Listener`] subscribed to the identifier.

use crate::errors::ModelError;
use crate::scope::ScopeId;
use genui_evaluator::{split_indexed_identifier, ValueResolver};
use genui_proto::{ModelValue, ValueKind};
use std::collections::HashMap;
use tracing::trace;

/// Interest registered on one identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Listener {
    /// Re-apply the view bindings of a scope
    Bindings(ScopeId),
    /// Copy the value into the parent of a nested scope
    Output(ScopeId),
    /// Run the value-changed interactions of a scope
    Interactions(ScopeId),
}

impl Listener {
    pub fn scope(&self) -> ScopeId {
        match self {
            Listener::Bindings(scope) | Listener::Output(scope) | Listener::Interactions(scope) => {
                *scope
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct ModelStore {
    values: HashMap<String, ModelValue>,
    kinds: HashMap<String, ValueKind>,
    listeners: HashMap<String, Vec<Listener>>,
}

impl ModelStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value; `name[i]` yields a one-element value holding element `i`
    pub fn get(&self, identifier: &str) -> Option<ModelValue> {
        if let Some(value) = self.values.get(identifier) {
            return Some(value.clone());
        }
        match split_indexed_identifier(identifier) {
            (name, Some(index)) => self.values.get(name)?.element(index),
            (_, None) => None,
        }
    }

    pub fn get_ref(&self, identifier: &str) -> Option<&ModelValue> {
        self.values.get(identifier)
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.values.contains_key(identifier)
    }

    /// Assign a value. Returns `true` when the stored value changed.
    pub fn set(&mut self, identifier: &str, value: ModelValue) -> Result<bool, ModelError> {
        if identifier.is_empty() {
            return Err(ModelError::EmptyIdentifier);
        }
        if let (_, Some(_)) = split_indexed_identifier(identifier) {
            return Err(ModelError::IndexedAssignment {
                identifier: identifier.to_string(),
            });
        }

        let kind = value.kind();
        if let Some(existing) = self.kinds.get(identifier) {
            if *existing != kind {
                return Err(ModelError::KindMismatch {
                    identifier: identifier.to_string(),
                    existing: *existing,
                    attempted: kind,
                });
            }
        }

        if self.values.get(identifier) == Some(&value) {
            return Ok(false);
        }

        trace!(identifier, %kind, len = value.len(), "Model value changed");
        self.kinds.insert(identifier.to_string(), kind);
        self.values.insert(identifier.to_string(), value);
        Ok(true)
    }

    pub fn kind_of(&self, identifier: &str) -> Option<ValueKind> {
        self.kinds.get(identifier).copied()
    }

    /// Register `listener` for changes of `identifier`; duplicates are ignored
    pub fn subscribe(&mut self, identifier: &str, listener: Listener) {
        let listeners = self.listeners.entry(identifier.to_string()).or_default();
        if !listeners.contains(&listener) {
            listeners.push(listener);
        }
    }

    pub fn listeners(&self, identifier: &str) -> &[Listener] {
        self.listeners
            .get(identifier)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Drop every subscription held by `scope`
    pub fn unsubscribe_scope(&mut self, scope: ScopeId) {
        for listeners in self.listeners.values_mut() {
            listeners.retain(|listener| listener.scope() != scope);
        }
        self.listeners.retain(|_, listeners| !listeners.is_empty());
    }

    /// Set identifiers, sorted
    pub fn identifiers(&self) -> Vec<&str> {
        let mut identifiers: Vec<&str> = self.values.keys().map(String::as_str).collect();
        identifiers.sort_unstable();
        identifiers
    }
}

impl ValueResolver for ModelStore {
    fn resolve(&self, identifier: &str) -> Option<ModelValue> {
        self.get(identifier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_reports_changes_only() {
        let mut model = ModelStore::new();
        assert!(model.set("a", ModelValue::int(1)).unwrap());
        assert!(!model.set("a", ModelValue::int(1)).unwrap());
        assert!(model.set("a", ModelValue::Ints(vec![1, 2])).unwrap());
        assert_eq!(model.get("a"), Some(ModelValue::Ints(vec![1, 2])));
    }

    #[test]
    fn test_unset_differs_from_empty_list() {
        let mut model = ModelStore::new();
        assert_eq!(model.get("list"), None);
        assert!(model.set("list", ModelValue::Strings(vec![])).unwrap());
        assert_eq!(model.get("list"), Some(ModelValue::Strings(vec![])));
    }

    #[test]
    fn test_kind_is_fixed_after_first_assignment() {
        let mut model = ModelStore::new();
        model.set("flag", ModelValue::boolean(true)).unwrap();
        assert_eq!(
            model.set("flag", ModelValue::int(1)),
            Err(ModelError::KindMismatch {
                identifier: "flag".to_string(),
                existing: ValueKind::Booleans,
                attempted: ValueKind::Ints,
            })
        );
        assert_eq!(model.get("flag"), Some(ModelValue::boolean(true)));
    }

    #[test]
    fn test_indexed_access() {
        let mut model = ModelStore::new();
        model.set("list", ModelValue::strings(["a", "b"])).unwrap();
        assert_eq!(model.get("list[1]"), Some(ModelValue::string("b")));
        assert_eq!(model.get("list[2]"), None);
        assert!(matches!(
            model.set("list[0]", ModelValue::string("c")),
            Err(ModelError::IndexedAssignment { .. })
        ));
    }

    #[test]
    fn test_subscriptions() {
        let mut model = ModelStore::new();
        let scope = ScopeId(1);
        let other = ScopeId(2);
        model.subscribe("a", Listener::Interactions(scope));
        model.subscribe("a", Listener::Interactions(scope));
        model.subscribe("a", Listener::Bindings(other));
        assert_eq!(model.listeners("a").len(), 2);

        model.unsubscribe_scope(scope);
        assert_eq!(model.listeners("a"), &[Listener::Bindings(other)]);
        assert!(model.listeners("b").is_empty());
    }
}
