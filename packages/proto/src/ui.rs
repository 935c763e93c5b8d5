//! Complete UI definitions and the result handed back when a UI ends

use crate::interaction::{ActionStatus, InteractionDefinition};
use crate::value::ModelEntry;
use crate::view::ViewDefinition;
use serde::{Deserialize, Serialize};

/// Declarative description of one UI: views, initial model and interactions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiDefinition {
    pub root_view: ViewDefinition,

    /// Initial model; entries without value declare an unset identifier
    #[serde(default)]
    pub model: Vec<ModelEntry>,

    #[serde(default)]
    pub interactions: Vec<InteractionDefinition>,

    #[serde(default)]
    pub element_checks: Vec<ElementCheck>,
}

impl UiDefinition {
    pub fn new(root_view: ViewDefinition) -> Self {
        Self {
            root_view,
            model: Vec::new(),
            interactions: Vec::new(),
            element_checks: Vec::new(),
        }
    }

    pub fn with_model(mut self, entry: ModelEntry) -> Self {
        self.model.push(entry);
        self
    }

    pub fn with_interaction(mut self, interaction: InteractionDefinition) -> Self {
        self.interactions.push(interaction);
        self
    }

    pub fn with_element_check(mut self, check: ElementCheck) -> Self {
        self.element_checks.push(check);
        self
    }
}

/// Selector polled by the host; the result lands in a boolean identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementCheck {
    pub selector: String,
    pub model_identifier: String,
}

impl ElementCheck {
    pub fn new(selector: impl Into<String>, model_identifier: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            model_identifier: model_identifier.into(),
        }
    }
}

/// A definition plus the identifiers reported when the UI ends
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiRequest {
    pub definition: UiDefinition,

    #[serde(default)]
    pub output_model_identifiers: Vec<String>,
}

impl UiRequest {
    pub fn new(definition: UiDefinition) -> Self {
        Self {
            definition,
            output_model_identifiers: Vec::new(),
        }
    }

    pub fn with_output(mut self, identifier: impl Into<String>) -> Self {
        self.output_model_identifiers.push(identifier.into());
        self
    }
}

/// Status and outputs reported through `end_action`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedAction {
    pub status: ActionStatus,

    #[serde(default)]
    pub outputs: Vec<ModelEntry>,
}

impl ProcessedAction {
    pub fn output(&self, identifier: &str) -> Option<&ModelEntry> {
        self.outputs.iter().find(|entry| entry.identifier == identifier)
    }
}
