//! Scopes: one model, one view tree and one interaction registry

use crate::interaction::InteractionRegistry;
use crate::model::ModelStore;
use crate::view::ViewTree;
use genui_proto::ElementCheck;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Handle of a top-level UI returned by [`crate::Runtime::load`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UiHandle(pub u64);

impl fmt::Display for UiHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ui#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScopeId(pub u64);

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scope#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeKind {
    Root {
        output_model_identifiers: Vec<String>,
    },
    /// Created by create-nested-ui and mounted under `container` of the parent tree
    Nested {
        ui_identifier: String,
        container: String,
        output_model_identifiers: Vec<String>,
    },
    /// Generic popup running against the parent model
    Popup { popup_identifier: String },
}

/// Where a scope's model lives
#[derive(Debug)]
pub enum ModelSlot {
    Owned(ModelStore),
    /// Shared with (and owned by) another scope
    Shared(ScopeId),
}

#[derive(Debug)]
pub struct Scope {
    pub id: ScopeId,
    pub handle: UiHandle,
    pub parent: Option<ScopeId>,
    pub kind: ScopeKind,
    pub model: ModelSlot,
    pub view: ViewTree,
    pub interactions: InteractionRegistry,
    pub element_checks: Vec<ElementCheck>,
    /// Nested scopes and popups, in creation order
    pub children: Vec<ScopeId>,
}

impl Scope {
    pub fn new(
        id: ScopeId,
        handle: UiHandle,
        parent: Option<ScopeId>,
        kind: ScopeKind,
        model: ModelSlot,
        view: ViewTree,
    ) -> Self {
        Self {
            id,
            handle,
            parent,
            kind,
            model,
            view,
            interactions: InteractionRegistry::new(),
            element_checks: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn is_popup(&self) -> bool {
        matches!(self.kind, ScopeKind::Popup { .. })
    }

    pub fn popup_identifier(&self) -> Option<&str> {
        match &self.kind {
            ScopeKind::Popup { popup_identifier } => Some(popup_identifier),
            _ => None,
        }
    }

    pub fn output_model_identifiers(&self) -> &[String] {
        match &self.kind {
            ScopeKind::Root {
                output_model_identifiers,
            }
            | ScopeKind::Nested {
                output_model_identifiers,
                ..
            } => output_model_identifiers,
            ScopeKind::Popup { .. } => &[],
        }
    }
}
