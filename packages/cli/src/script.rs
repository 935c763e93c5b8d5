//! Event scripts replayed by `genui run`
//!
//! A script lists the outputs to collect and the steps to replay. A step is either a UI
//! event, tagged by `type` exactly as the engine serializes it, or an element step that
//! changes what the simulated page reports for a selector:
//!
//! ```json
//! {
//!   "outputs": ["selected"],
//!   "steps": [
//!     { "type": "view_clicked", "view_identifier": "open" },
//!     { "element": "#checkout", "present": true }
//!   ]
//! }
//! ```

use genui_engine::{DispatchOutcome, EngineError, HostCall, RecordingHost, Runtime, UiEvent, UiHandle};
use genui_proto::UiDefinition;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScriptError {
    #[error("Cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Script {
    /// Identifiers extracted from the root model once the script has run
    #[serde(default)]
    pub outputs: Vec<String>,

    #[serde(default)]
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Step {
    Element { element: String, present: bool },
    Event(UiEvent),
}

impl Step {
    pub fn describe(&self) -> String {
        match self {
            Step::Element { element, present } => {
                format!("element {} {}", element, if *present { "appears" } else { "disappears" })
            }
            Step::Event(event) => match event {
                UiEvent::ViewClicked { view_identifier } => format!("click {}", view_identifier),
                UiEvent::TextChanged {
                    view_identifier,
                    text,
                } => format!("type {:?} into {}", text, view_identifier),
                UiEvent::UserActionInvoked {
                    user_action_identifier,
                } => format!("chip {}", user_action_identifier),
                UiEvent::TextLinkClicked {
                    view_identifier,
                    link,
                } => format!("link {} of {}", link, view_identifier),
                other => other.name().replace('_', " "),
            },
        }
    }
}

/// One replayed step and what the host saw while it ran
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptEntry {
    pub step: String,
    pub outcome: DispatchOutcome,
    pub host_calls: Vec<HostCall>,
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ScriptError> {
    let content = std::fs::read_to_string(path).map_err(|source| ScriptError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| ScriptError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

pub fn load_definition(path: &Path) -> Result<UiDefinition, ScriptError> {
    read_json(path)
}

impl Script {
    pub fn load(path: &Path) -> Result<Self, ScriptError> {
        read_json(path)
    }
}

/// Apply one step. Element steps are answered right away when `poll` is set; otherwise a
/// running poller is expected to pick them up.
pub fn apply_step(
    runtime: &mut Runtime<RecordingHost>,
    handle: UiHandle,
    step: &Step,
    poll: bool,
) -> Result<TranscriptEntry, EngineError> {
    let seen = runtime.host().calls.len();

    let outcome = match step {
        Step::Element { element, present } => {
            runtime.host_mut().set_element(element.clone(), *present);
            if poll {
                runtime.poll_element_checks(handle)?
            } else {
                DispatchOutcome::Processed { events: 0 }
            }
        }
        Step::Event(event) => runtime.dispatch(handle, event.clone())?,
    };

    Ok(TranscriptEntry {
        step: step.describe(),
        outcome,
        host_calls: runtime.host().calls[seen..].to_vec(),
    })
}

/// Replay every step synchronously
pub fn replay(
    runtime: &mut Runtime<RecordingHost>,
    handle: UiHandle,
    script: &Script,
) -> Result<Vec<TranscriptEntry>, EngineError> {
    script
        .steps
        .iter()
        .map(|step| apply_step(runtime, handle, step, true))
        .collect()
}
