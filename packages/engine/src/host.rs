//! # Host Bridge
//!
//! Everything the engine cannot do itself: showing popups, rendering chips, reporting
//! the end of an action and checking page elements. Hosts answer asynchronously by
//! dispatching [`crate::UiEvent`]s back into the runtime.
//!
//! [`RecordingHost`] keeps every call in order. It backs the CLI transcript and the
//! integration tests.

use crate::errors::Diagnostic;
use crate::scope::UiHandle;
use crate::view::RenderedView;
use genui_proto::{Date, InfoPopup, ProcessedAction, UserAction};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// List popup shown on behalf of a show-list-popup callback
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListPopupRequest {
    pub request_id: u64,
    pub items: Vec<String>,
    pub selected_indices: Vec<usize>,
    pub allow_multiselect: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarPopupRequest {
    pub request_id: u64,
    pub initial_date: Option<Date>,
    pub min_date: Date,
    pub max_date: Date,
}

pub trait HostBridge {
    fn show_info_popup(&mut self, handle: UiHandle, popup: &InfoPopup);

    fn show_list_popup(&mut self, handle: UiHandle, request: &ListPopupRequest);

    fn show_calendar_popup(&mut self, handle: UiHandle, request: &CalendarPopupRequest);

    fn show_generic_popup(&mut self, handle: UiHandle, popup_identifier: &str, view: &RenderedView);

    fn dismiss_generic_popup(&mut self, handle: UiHandle, popup_identifier: &str);

    /// Replace the chips shown for `handle`
    fn set_user_actions(&mut self, handle: UiHandle, user_actions: &[UserAction]);

    /// Called once per top-level UI; no further events are processed afterwards
    fn end_action(&mut self, handle: UiHandle, result: &ProcessedAction);

    fn report_diagnostic(&mut self, handle: UiHandle, diagnostic: &Diagnostic);

    /// Whether `selector` currently matches an element on the page
    fn check_element(&mut self, selector: &str) -> bool;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "call")]
pub enum HostCall {
    ShowInfoPopup {
        handle: UiHandle,
        popup: InfoPopup,
    },
    ShowListPopup {
        handle: UiHandle,
        request: ListPopupRequest,
    },
    ShowCalendarPopup {
        handle: UiHandle,
        request: CalendarPopupRequest,
    },
    ShowGenericPopup {
        handle: UiHandle,
        popup_identifier: String,
        view: RenderedView,
    },
    DismissGenericPopup {
        handle: UiHandle,
        popup_identifier: String,
    },
    SetUserActions {
        handle: UiHandle,
        user_actions: Vec<UserAction>,
    },
    EndAction {
        handle: UiHandle,
        result: ProcessedAction,
    },
    ReportDiagnostic {
        handle: UiHandle,
        diagnostic: Diagnostic,
    },
}

/// Host that records calls instead of rendering anything
#[derive(Debug, Default)]
pub struct RecordingHost {
    pub calls: Vec<HostCall>,

    /// Answers for [`HostBridge::check_element`]; unknown selectors are absent
    pub elements: HashMap<String, bool>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_element(&mut self, selector: impl Into<String>, present: bool) {
        self.elements.insert(selector.into(), present);
    }

    pub fn info_popups(&self) -> Vec<&InfoPopup> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                HostCall::ShowInfoPopup { popup, .. } => Some(popup),
                _ => None,
            })
            .collect()
    }

    pub fn last_list_popup(&self) -> Option<&ListPopupRequest> {
        self.calls.iter().rev().find_map(|call| match call {
            HostCall::ShowListPopup { request, .. } => Some(request),
            _ => None,
        })
    }

    pub fn last_calendar_popup(&self) -> Option<&CalendarPopupRequest> {
        self.calls.iter().rev().find_map(|call| match call {
            HostCall::ShowCalendarPopup { request, .. } => Some(request),
            _ => None,
        })
    }

    pub fn generic_popup(&self, popup_identifier: &str) -> Option<&RenderedView> {
        self.calls.iter().rev().find_map(|call| match call {
            HostCall::ShowGenericPopup {
                popup_identifier: id,
                view,
                ..
            } if id == popup_identifier => Some(view),
            _ => None,
        })
    }

    /// Most recent chips pushed for `handle`
    pub fn user_actions(&self, handle: UiHandle) -> Option<&[UserAction]> {
        self.calls.iter().rev().find_map(|call| match call {
            HostCall::SetUserActions {
                handle: h,
                user_actions,
            } if *h == handle => Some(user_actions.as_slice()),
            _ => None,
        })
    }

    pub fn ended(&self, handle: UiHandle) -> Option<&ProcessedAction> {
        self.calls.iter().find_map(|call| match call {
            HostCall::EndAction { handle: h, result } if *h == handle => Some(result),
            _ => None,
        })
    }

    pub fn diagnostics(&self) -> Vec<&Diagnostic> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                HostCall::ReportDiagnostic { diagnostic, .. } => Some(diagnostic),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }
}

impl HostBridge for RecordingHost {
    fn show_info_popup(&mut self, handle: UiHandle, popup: &InfoPopup) {
        self.calls.push(HostCall::ShowInfoPopup {
            handle,
            popup: popup.clone(),
        });
    }

    fn show_list_popup(&mut self, handle: UiHandle, request: &ListPopupRequest) {
        self.calls.push(HostCall::ShowListPopup {
            handle,
            request: request.clone(),
        });
    }

    fn show_calendar_popup(&mut self, handle: UiHandle, request: &CalendarPopupRequest) {
        self.calls.push(HostCall::ShowCalendarPopup {
            handle,
            request: request.clone(),
        });
    }

    fn show_generic_popup(&mut self, handle: UiHandle, popup_identifier: &str, view: &RenderedView) {
        self.calls.push(HostCall::ShowGenericPopup {
            handle,
            popup_identifier: popup_identifier.to_string(),
            view: view.clone(),
        });
    }

    fn dismiss_generic_popup(&mut self, handle: UiHandle, popup_identifier: &str) {
        self.calls.push(HostCall::DismissGenericPopup {
            handle,
            popup_identifier: popup_identifier.to_string(),
        });
    }

    fn set_user_actions(&mut self, handle: UiHandle, user_actions: &[UserAction]) {
        self.calls.push(HostCall::SetUserActions {
            handle,
            user_actions: user_actions.to_vec(),
        });
    }

    fn end_action(&mut self, handle: UiHandle, result: &ProcessedAction) {
        self.calls.push(HostCall::EndAction {
            handle,
            result: result.clone(),
        });
    }

    fn report_diagnostic(&mut self, handle: UiHandle, diagnostic: &Diagnostic) {
        self.calls.push(HostCall::ReportDiagnostic {
            handle,
            diagnostic: diagnostic.clone(),
        });
    }

    fn check_element(&mut self, selector: &str) -> bool {
        self.elements.get(selector).copied().unwrap_or(false)
    }
}
