//! Error types for the engine

use crate::scope::{ScopeId, UiHandle};
use genui_evaluator::EvalError;
use genui_proto::ValueKind;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Identifier '{identifier}' holds {existing} and cannot be set to {attempted}")]
    KindMismatch {
        identifier: String,
        existing: ValueKind,
        attempted: ValueKind,
    },

    #[error("Indexed identifier '{identifier}' cannot be assigned")]
    IndexedAssignment { identifier: String },

    #[error("Identifier must not be empty")]
    EmptyIdentifier,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ViewError {
    #[error("View '{identifier}' not found")]
    UnknownView { identifier: String },

    #[error("View '{identifier}' is not a container")]
    NotAContainer { identifier: String },

    #[error("View identifier '{identifier}' is already in use")]
    DuplicateView { identifier: String },

    #[error("Index {index} out of bounds for container '{container}' with {len} children")]
    IndexOutOfBounds {
        container: String,
        index: usize,
        len: usize,
    },

    #[error("Binding of '{model_identifier}' expected {expected} but got {found}")]
    BindingMismatch {
        model_identifier: String,
        expected: &'static str,
        found: ValueKind,
    },
}

/// Failure of a single callback; the rest of the chain still runs
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CallbackError {
    #[error("Identifier '{identifier}' is unset")]
    UnknownIdentifier { identifier: String },

    #[error("'{identifier}' expected {expected} but got {found}")]
    KindMismatch {
        identifier: String,
        expected: &'static str,
        found: ValueKind,
    },

    #[error("Loop over '{identifier}' has nothing to iterate")]
    EmptyCollectionAccess { identifier: String },

    #[error("User action '{identifier}' not found in '{model_identifier}'")]
    UnknownUserAction {
        identifier: String,
        model_identifier: String,
    },

    #[error("Nested UI '{identifier}' already exists")]
    DuplicateNestedUi { identifier: String },

    #[error("Popup '{identifier}' is already shown")]
    DuplicatePopup { identifier: String },

    #[error("Invalid popup result: {details}")]
    InvalidPopupResult { details: String },

    #[error("{scope} was closed while its callbacks were running")]
    ClosedScope { scope: ScopeId },

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    View(#[from] ViewError),

    #[error(transparent)]
    Evaluation(#[from] EvalError),

    #[error("Nested definition rejected: {0}")]
    Load(#[from] LoadError),
}

/// Structural problems that reject a definition before anything is created
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoadError {
    #[error("Malformed view tree: {details}")]
    MalformedTree { details: String },

    #[error("Malformed interaction: {details}")]
    MalformedInteraction { details: String },

    #[error("View identifier '{identifier}' is declared more than once")]
    DuplicateViewIdentifier { identifier: String },

    #[error("'{context}' references unknown view '{identifier}'")]
    DanglingViewReference {
        identifier: String,
        context: &'static str,
    },

    #[error("'{context}' requires '{identifier}' to be a container")]
    NotAContainer {
        identifier: String,
        context: &'static str,
    },

    #[error("Loop counter '{counter}' is already used by an enclosing loop")]
    ReusedLoopCounter { counter: String },

    #[error("'{model_identifier}' is bound into radio groups '{first_group}' and '{second_group}'")]
    DuplicateGroupMembership {
        model_identifier: String,
        first_group: String,
        second_group: String,
    },

    #[error("'{identifier}' expected {expected} but the initial value is {found}")]
    KindMismatch {
        identifier: String,
        expected: &'static str,
        found: ValueKind,
    },

    #[error("Initial model is invalid: {0}")]
    Model(#[from] ModelError),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Failed to load UI: {0}")]
    Load(#[from] LoadError),

    #[error("Unknown UI handle {0}")]
    UnknownHandle(UiHandle),
}

/// Category of a diagnostic reported to the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiagnosticKind {
    UnknownIdentifier,
    KindMismatch,
    EmptyCollectionAccess,
    DuplicateGroupMembership,
    UnknownView,
    EvaluationFailed,
    InvalidDefinition,
    InvalidEvent,
    PropagationLimit,
}

impl CallbackError {
    pub fn kind(&self) -> DiagnosticKind {
        match self {
            CallbackError::UnknownIdentifier { .. }
            | CallbackError::UnknownUserAction { .. } => DiagnosticKind::UnknownIdentifier,
            CallbackError::KindMismatch { .. } => DiagnosticKind::KindMismatch,
            CallbackError::EmptyCollectionAccess { .. } => DiagnosticKind::EmptyCollectionAccess,
            CallbackError::DuplicateNestedUi { .. } | CallbackError::DuplicatePopup { .. } => {
                DiagnosticKind::InvalidDefinition
            }
            CallbackError::InvalidPopupResult { .. } | CallbackError::ClosedScope { .. } => {
                DiagnosticKind::InvalidEvent
            }
            CallbackError::Model(ModelError::KindMismatch { .. }) => DiagnosticKind::KindMismatch,
            CallbackError::Model(_) => DiagnosticKind::InvalidDefinition,
            CallbackError::View(ViewError::BindingMismatch { .. }) => DiagnosticKind::KindMismatch,
            CallbackError::View(_) => DiagnosticKind::UnknownView,
            CallbackError::Evaluation(EvalError::UnknownIdentifier { .. }) => {
                DiagnosticKind::UnknownIdentifier
            }
            CallbackError::Evaluation(EvalError::KindMismatch { .. }) => {
                DiagnosticKind::KindMismatch
            }
            CallbackError::Evaluation(_) => DiagnosticKind::EvaluationFailed,
            CallbackError::Load(LoadError::DuplicateGroupMembership { .. }) => {
                DiagnosticKind::DuplicateGroupMembership
            }
            CallbackError::Load(_) => DiagnosticKind::InvalidDefinition,
        }
    }
}

/// Non-fatal problem surfaced through [`crate::HostBridge::report_diagnostic`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,

    /// Callback that failed, when the problem is local to one callback
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback: Option<String>,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            callback: None,
        }
    }

    pub fn from_callback(callback: &str, error: &CallbackError) -> Self {
        Self {
            kind: error.kind(),
            message: error.to_string(),
            callback: Some(callback.to_string()),
        }
    }
}
