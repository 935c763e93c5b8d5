//! # Interaction Registry
//!
//! Declared interactions of one scope, kept in declaration order. Matching an event
//! returns every interaction with at least one equal trigger; the runtime runs their
//! callback chains one after another.

use genui_proto::{InteractionDefinition, TriggerEvent};
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct InteractionRegistry {
    interactions: Vec<InteractionDefinition>,
    by_trigger: HashMap<TriggerEvent, Vec<usize>>,
}

impl InteractionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_definitions(definitions: &[InteractionDefinition]) -> Self {
        let mut registry = Self::new();
        for definition in definitions {
            registry.register(definition.clone());
        }
        registry
    }

    pub fn register(&mut self, definition: InteractionDefinition) {
        let index = self.interactions.len();
        for trigger in &definition.trigger_events {
            let indices = self.by_trigger.entry(trigger.clone()).or_default();
            // A trigger listed twice still runs the chain once
            if indices.last() != Some(&index) {
                indices.push(index);
            }
        }
        self.interactions.push(definition);
    }

    /// Interactions triggered by `event`, in declaration order
    pub fn matching(&self, event: &TriggerEvent) -> Vec<&InteractionDefinition> {
        self.by_trigger
            .get(event)
            .map(|indices| indices.iter().map(|i| &self.interactions[*i]).collect())
            .unwrap_or_default()
    }

    /// Model identifiers watched by value-changed triggers
    pub fn watched_identifiers(&self) -> Vec<String> {
        let mut identifiers: Vec<String> = self
            .by_trigger
            .keys()
            .filter_map(|trigger| match trigger {
                TriggerEvent::OnValueChanged { model_identifier } => Some(model_identifier.clone()),
                _ => None,
            })
            .collect();
        identifiers.sort();
        identifiers
    }

    pub fn len(&self) -> usize {
        self.interactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interactions.is_empty()
    }

    pub fn clear(&mut self) {
        self.interactions.clear();
        self.by_trigger.clear();
    }
}
