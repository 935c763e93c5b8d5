use serde::{Deserialize, Serialize};

/// Runtime limits and reporting switches
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    /// Events processed for one dispatch before propagation is aborted
    #[serde(default = "default_max_events_per_dispatch")]
    pub max_events_per_dispatch: usize,

    /// Forward diagnostics to the host; they are logged either way
    #[serde(default = "default_report_diagnostics")]
    pub report_diagnostics: bool,
}

fn default_max_events_per_dispatch() -> usize {
    10_000
}

fn default_report_diagnostics() -> bool {
    true
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_events_per_dispatch: default_max_events_per_dispatch(),
            report_diagnostics: default_report_diagnostics(),
        }
    }
}
