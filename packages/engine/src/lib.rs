//! # Generic UI Engine
//!
//! Runtime for declarative UIs: a typed model, a retained view tree and event-driven
//! interactions that connect the two.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ proto: UiDefinition (views, model, rules)   │
//! └─────────────────────────────────────────────┘
//!                     ↓ validate + load
//! ┌─────────────────────────────────────────────┐
//! │ engine: one Scope per UI / nested UI / popup│
//! │  - ModelStore: typed values + listeners     │
//! │  - ViewTree: nodes, bindings, expanders     │
//! │  - InteractionRegistry: trigger → callbacks │
//! │  - FIFO event queue, drained per dispatch   │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ HostBridge: popups, chips, end of action    │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Writes of equal values are dropped**: this is what lets mirrored identifiers converge
//! 2. **Run to completion**: a dispatch returns only once every resulting event is processed
//! 3. **Callback failures are local**: they become diagnostics, the chain continues
//! 4. **Definitions are checked up front**: structural errors reject `load` outright
//!
//! ## Usage
//!
//! ```rust,ignore
//! use genui_engine::{RecordingHost, Runtime, UiEvent};
//! use genui_proto::UiRequest;
//!
//! let mut runtime = Runtime::new(RecordingHost::new());
//! let handle = runtime.load(UiRequest::new(definition).with_output("value"))?;
//! runtime.dispatch(handle, UiEvent::click("done_button"))?;
//! let outputs = runtime.get_output(handle, &["value".to_string()])?;
//! ```

mod callbacks;
pub mod config;
pub mod errors;
pub mod host;
pub mod interaction;
pub mod loops;
pub mod markup;
pub mod model;
mod nested;
#[cfg(feature = "async")]
pub mod poller;
mod runtime;
pub mod scope;
pub mod validate;
pub mod view;

#[cfg(test)]
mod tests_runtime;

pub use config::EngineConfig;
pub use errors::{
    CallbackError, Diagnostic, DiagnosticKind, EngineError, EngineResult, LoadError, ModelError,
    ViewError,
};
pub use host::{CalendarPopupRequest, HostBridge, HostCall, ListPopupRequest, RecordingHost};
pub use interaction::InteractionRegistry;
pub use loops::{LoopContext, Substitute};
pub use markup::{StyledText, TextSpan};
pub use model::{Listener, ModelStore};
#[cfg(feature = "async")]
pub use poller::spawn_element_poller;
pub use runtime::{DispatchOutcome, Runtime, UiEvent};
pub use scope::{ScopeId, UiHandle};
pub use validate::{validate, ValidationReport};
pub use view::{BoundAttribute, RenderedView, ViewTree};
