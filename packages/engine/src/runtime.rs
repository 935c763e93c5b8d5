//! # Runtime
//!
//! Owns every live scope and the host bridge. All state changes go through one FIFO queue
//! of internal events that is drained to completion before [`Runtime::dispatch`] returns,
//! so a dispatch is atomic from the host's point of view.
//!
//! ## Propagation
//!
//! A model write only enqueues an event when the stored value actually changed. Listeners
//! of that identifier then re-apply view bindings, copy nested outputs into the parent
//! model, or run value-changed interactions. Because unchanged writes are dropped, mirrored
//! identifiers converge instead of looping. Chains that never converge are cut off after
//! [`EngineConfig::max_events_per_dispatch`] events.

use crate::callbacks::Flow;
use crate::config::EngineConfig;
use crate::errors::{
    CallbackError, Diagnostic, DiagnosticKind, EngineError, EngineResult,
};
use crate::host::HostBridge;
use crate::loops::LoopContext;
use crate::model::{Listener, ModelStore};
use crate::scope::{ModelSlot, Scope, ScopeId, ScopeKind, UiHandle};
use crate::validate::validate;
use crate::view::{ImplicitClick, RenderedView};
use genui_proto::{
    ActionStatus, Date, ElementCheck, ModelEntry, ModelValue, ProcessedAction, TriggerEvent,
    UiRequest, UserAction,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, VecDeque};
use tracing::{debug, info, instrument, warn};

/// Input raised by the host or by the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum UiEvent {
    ViewClicked {
        view_identifier: String,
    },
    TextChanged {
        view_identifier: String,
        text: String,
    },
    UserActionInvoked {
        user_action_identifier: String,
    },
    TextLinkClicked {
        view_identifier: String,
        link: i32,
    },
    /// `None` selection means the popup was dismissed
    ListPopupClosed {
        #[serde(default)]
        request_id: Option<u64>,
        #[serde(default)]
        selected_indices: Option<Vec<usize>>,
    },
    CalendarPopupClosed {
        #[serde(default)]
        request_id: Option<u64>,
        #[serde(default)]
        date: Option<Date>,
    },
    GenericPopupDismissed {
        popup_identifier: String,
    },
    ElementConditionChanged {
        model_identifier: String,
        present: bool,
    },
}

impl UiEvent {
    pub fn name(&self) -> &'static str {
        match self {
            UiEvent::ViewClicked { .. } => "view_clicked",
            UiEvent::TextChanged { .. } => "text_changed",
            UiEvent::UserActionInvoked { .. } => "user_action_invoked",
            UiEvent::TextLinkClicked { .. } => "text_link_clicked",
            UiEvent::ListPopupClosed { .. } => "list_popup_closed",
            UiEvent::CalendarPopupClosed { .. } => "calendar_popup_closed",
            UiEvent::GenericPopupDismissed { .. } => "generic_popup_dismissed",
            UiEvent::ElementConditionChanged { .. } => "element_condition_changed",
        }
    }

    pub fn click(view_identifier: impl Into<String>) -> Self {
        UiEvent::ViewClicked {
            view_identifier: view_identifier.into(),
        }
    }

    pub fn user_action(user_action_identifier: impl Into<String>) -> Self {
        UiEvent::UserActionInvoked {
            user_action_identifier: user_action_identifier.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum DispatchOutcome {
    /// The event was applied; `events` internal events were processed
    Processed { events: usize },
    Ignored { reason: String },
}

impl DispatchOutcome {
    pub fn ignored(reason: impl Into<String>) -> Self {
        DispatchOutcome::Ignored {
            reason: reason.into(),
        }
    }

    pub fn is_processed(&self) -> bool {
        matches!(self, DispatchOutcome::Processed { .. })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Event {
    ModelChanged {
        owner: ScopeId,
        identifier: String,
    },
    /// Output of a nested scope copied into its parent model
    Output {
        target: ScopeId,
        identifier: String,
        value: ModelValue,
    },
}

#[derive(Debug)]
pub(crate) struct UiState {
    pub root: ScopeId,
    pub ended: bool,
    pub user_actions: Vec<UserAction>,
}

#[derive(Debug, Clone)]
pub(crate) enum PendingKind {
    List {
        items: Vec<String>,
        indices_identifier: String,
        names_identifier: Option<String>,
        allow_multiselect: bool,
    },
    Calendar {
        date_identifier: String,
        min_date: Date,
        max_date: Date,
    },
}

#[derive(Debug, Clone)]
pub(crate) struct PendingPopup {
    pub handle: UiHandle,
    pub scope: ScopeId,
    pub kind: PendingKind,
}

pub struct Runtime<H: HostBridge> {
    pub(crate) host: H,
    pub(crate) config: EngineConfig,
    pub(crate) scopes: HashMap<ScopeId, Scope>,
    pub(crate) uis: HashMap<UiHandle, UiState>,
    pub(crate) pending: BTreeMap<u64, PendingPopup>,
    pub(crate) queue: VecDeque<Event>,
    next_handle: u64,
    pub(crate) next_scope: u64,
    pub(crate) next_request: u64,
}

impl<H: HostBridge> Runtime<H> {
    pub fn new(host: H) -> Self {
        Self::with_config(host, EngineConfig::default())
    }

    pub fn with_config(host: H, config: EngineConfig) -> Self {
        Self {
            host,
            config,
            scopes: HashMap::new(),
            uis: HashMap::new(),
            pending: BTreeMap::new(),
            queue: VecDeque::new(),
            next_handle: 1,
            next_scope: 1,
            next_request: 1,
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn into_host(self) -> H {
        self.host
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Validate a definition and start it as a new top-level UI
    #[instrument(skip(self, request), fields(interactions = request.definition.interactions.len()))]
    pub fn load(&mut self, request: UiRequest) -> EngineResult<UiHandle> {
        let definition = &request.definition;
        validate(definition)?;

        let handle = UiHandle(self.next_handle);
        self.next_handle += 1;

        let root = self.create_scope(
            handle,
            None,
            ScopeKind::Root {
                output_model_identifiers: request.output_model_identifiers.clone(),
            },
            ModelSlot::Owned(ModelStore::new()),
            &definition.root_view,
            &definition.interactions,
            &definition.element_checks,
        )?;
        self.uis.insert(
            handle,
            UiState {
                root,
                ended: false,
                user_actions: Vec::new(),
            },
        );

        if let Err(error) = self.initialize(root, &definition.model) {
            self.destroy_scope(root, false);
            self.uis.remove(&handle);
            self.queue.clear();
            return Err(error.into());
        }

        let events = self.drain(handle);
        info!(%handle, events, "UI loaded");
        Ok(handle)
    }

    /// Tear down a UI and every scope and popup that belongs to it
    pub fn destroy(&mut self, handle: UiHandle) -> EngineResult<()> {
        let ui = self
            .uis
            .remove(&handle)
            .ok_or(EngineError::UnknownHandle(handle))?;
        self.destroy_scope(ui.root, false);
        self.pending.retain(|_, popup| popup.handle != handle);
        debug!(%handle, "UI destroyed");
        Ok(())
    }

    pub fn is_ended(&self, handle: UiHandle) -> bool {
        self.uis.get(&handle).is_some_and(|ui| ui.ended)
    }

    pub fn handles(&self) -> Vec<UiHandle> {
        let mut handles: Vec<UiHandle> = self.uis.keys().copied().collect();
        handles.sort();
        handles
    }

    /// Values of `identifiers` in the root model; unset identifiers are omitted
    pub fn get_output(&self, handle: UiHandle, identifiers: &[String]) -> EngineResult<Vec<ModelEntry>> {
        let ui = self.uis.get(&handle).ok_or(EngineError::UnknownHandle(handle))?;
        Ok(self.collect_outputs(ui.root, identifiers))
    }

    pub(crate) fn collect_outputs(&self, scope: ScopeId, identifiers: &[String]) -> Vec<ModelEntry> {
        let Ok(store) = self.store(scope) else {
            return Vec::new();
        };
        identifiers
            .iter()
            .filter_map(|identifier| {
                store
                    .get(identifier)
                    .map(|value| ModelEntry::new(identifier.clone(), value))
            })
            .collect()
    }

    /// Current value of an identifier in the root model
    pub fn value(&self, handle: UiHandle, identifier: &str) -> Option<ModelValue> {
        let root = self.uis.get(&handle)?.root;
        self.store(root).ok()?.get(identifier)
    }

    /// Current value of an identifier in the model of a nested UI
    pub fn nested_value(&self, handle: UiHandle, ui_identifier: &str, identifier: &str) -> Option<ModelValue> {
        let scope = self.scopes_of(handle).into_iter().find(|scope| {
            matches!(
                self.scopes.get(scope).map(|s| &s.kind),
                Some(ScopeKind::Nested { ui_identifier: id, .. }) if id.as_str() == ui_identifier
            )
        })?;
        self.store(scope).ok()?.get(identifier)
    }

    /// Identifiers of live nested UIs, in creation order
    pub fn nested_uis(&self, handle: UiHandle) -> Vec<String> {
        self.scopes_of(handle)
            .into_iter()
            .filter_map(|scope| match self.scopes.get(&scope).map(|s| &s.kind) {
                Some(ScopeKind::Nested { ui_identifier, .. }) => Some(ui_identifier.clone()),
                _ => None,
            })
            .collect()
    }

    /// Chips currently shown for a UI
    pub fn user_actions(&self, handle: UiHandle) -> &[UserAction] {
        self.uis
            .get(&handle)
            .map(|ui| ui.user_actions.as_slice())
            .unwrap_or(&[])
    }

    /// Rendered view of the root tree with nested UIs in place
    pub fn snapshot(&self, handle: UiHandle) -> Option<RenderedView> {
        let root = self.uis.get(&handle)?.root;
        self.render_scope(root)
    }

    pub fn popup_snapshot(&self, handle: UiHandle, popup_identifier: &str) -> Option<RenderedView> {
        let scope = self.find_popup(handle, popup_identifier)?;
        self.render_scope(scope)
    }

    pub(crate) fn render_scope(&self, scope: ScopeId) -> Option<RenderedView> {
        self.scopes
            .get(&scope)?
            .view
            .snapshot(&|child| self.render_scope(child))
    }

    /// Element checks declared by every live scope of a UI
    pub fn element_checks(&self, handle: UiHandle) -> Vec<ElementCheck> {
        self.scopes_of(handle)
            .into_iter()
            .filter_map(|scope| self.scopes.get(&scope))
            .flat_map(|scope| scope.element_checks.iter().cloned())
            .collect()
    }

    /// Ask the host about every element check and store the answers
    pub fn poll_element_checks(&mut self, handle: UiHandle) -> EngineResult<DispatchOutcome> {
        if !self.uis.contains_key(&handle) {
            return Err(EngineError::UnknownHandle(handle));
        }
        if self.is_ended(handle) {
            return Ok(DispatchOutcome::ignored("UI has ended"));
        }

        let mut answers = Vec::new();
        for scope in self.scopes_of(handle) {
            let checks = match self.scopes.get(&scope) {
                Some(entry) => entry.element_checks.clone(),
                None => continue,
            };
            for check in checks {
                let present = self.host.check_element(&check.selector);
                answers.push((scope, check.model_identifier, present));
            }
        }
        for (scope, identifier, present) in answers {
            if let Err(error) = self.write(scope, &identifier, ModelValue::boolean(present)) {
                self.report(handle, Diagnostic::from_callback("element_check", &error));
            }
        }

        let events = self.drain(handle);
        Ok(DispatchOutcome::Processed { events })
    }

    /// Apply one event and run every resulting interaction to completion
    #[instrument(skip(self, event), fields(event = event.name()))]
    pub fn dispatch(&mut self, handle: UiHandle, event: UiEvent) -> EngineResult<DispatchOutcome> {
        let Some(ui) = self.uis.get(&handle) else {
            return Err(EngineError::UnknownHandle(handle));
        };
        if ui.ended {
            debug!(%handle, "Event after end of action ignored");
            return Ok(DispatchOutcome::ignored("UI has ended"));
        }

        let outcome = match event {
            UiEvent::ViewClicked { view_identifier } => self.click(handle, &view_identifier),
            UiEvent::TextChanged {
                view_identifier,
                text,
            } => self.text_changed(handle, &view_identifier, text),
            UiEvent::UserActionInvoked {
                user_action_identifier,
            } => self.user_action(handle, &user_action_identifier),
            UiEvent::TextLinkClicked {
                view_identifier,
                link,
            } => self.text_link(handle, &view_identifier, link),
            UiEvent::ListPopupClosed {
                request_id,
                selected_indices,
            } => self.list_popup_closed(handle, request_id, selected_indices),
            UiEvent::CalendarPopupClosed { request_id, date } => {
                self.calendar_popup_closed(handle, request_id, date)
            }
            UiEvent::GenericPopupDismissed { popup_identifier } => {
                match self.find_popup(handle, &popup_identifier) {
                    Some(scope) => {
                        self.destroy_scope(scope, false);
                        None
                    }
                    None => Some(format!("no popup '{}' is shown", popup_identifier)),
                }
            }
            UiEvent::ElementConditionChanged {
                model_identifier,
                present,
            } => {
                self.element_condition(handle, &model_identifier, present);
                None
            }
        };

        if let Some(reason) = outcome {
            debug!(%handle, %reason, "Event ignored");
            self.queue.clear();
            return Ok(DispatchOutcome::Ignored { reason });
        }

        let events = self.drain(handle);
        Ok(DispatchOutcome::Processed { events })
    }

    fn click(&mut self, handle: UiHandle, view_identifier: &str) -> Option<String> {
        let Some(scope) = self.find_view_scope(handle, view_identifier) else {
            return Some(format!("unknown view '{}'", view_identifier));
        };
        if !self.is_view_interactive(scope, view_identifier) {
            return Some(format!("view '{}' is hidden or disabled", view_identifier));
        }

        let implicit = self
            .scopes
            .get(&scope)
            .map(|entry| entry.view.implicit_clicks(view_identifier))
            .unwrap_or_default();
        for click in implicit {
            if let Err(error) = self.implicit_click(scope, click) {
                self.report(handle, Diagnostic::from_callback("view_clicked", &error));
            }
        }

        self.run_trigger(scope, &TriggerEvent::view_clicked(view_identifier));
        None
    }

    fn implicit_click(&mut self, scope: ScopeId, click: ImplicitClick) -> Result<(), CallbackError> {
        match click {
            ImplicitClick::Radio {
                group,
                model_identifier,
            } => {
                if self.is_true(scope, &model_identifier) {
                    return Ok(());
                }
                debug!(%scope, group = %group, model_identifier = %model_identifier, "Radio button selected");
                self.clear_radio_siblings(self.model_owner(scope), &model_identifier)?;
                self.write(scope, &model_identifier, ModelValue::boolean(true))?;
            }
            ImplicitClick::CheckBox { model_identifier } => {
                let checked = self.is_true(scope, &model_identifier);
                self.write(scope, &model_identifier, ModelValue::boolean(!checked))?;
            }
            ImplicitClick::Expander { node } => {
                if let Some(entry) = self.scopes.get_mut(&scope) {
                    entry.view.toggle_expander(node);
                }
            }
        }
        Ok(())
    }

    fn text_changed(&mut self, handle: UiHandle, view_identifier: &str, text: String) -> Option<String> {
        let Some(scope) = self.find_view_scope(handle, view_identifier) else {
            return Some(format!("unknown view '{}'", view_identifier));
        };
        let target = match self.scopes.get(&scope).map(|s| s.view.text_input_target(view_identifier)) {
            Some(Ok(target)) => target,
            _ => return Some(format!("view '{}' is not a text input", view_identifier)),
        };
        if let Err(error) = self.write(scope, &target, ModelValue::Strings(vec![text])) {
            self.report(handle, Diagnostic::from_callback("text_changed", &error));
        }
        None
    }

    fn user_action(&mut self, handle: UiHandle, identifier: &str) -> Option<String> {
        let available = self.uis.get(&handle).is_some_and(|ui| {
            ui.user_actions
                .iter()
                .any(|action| action.identifier == identifier && action.enabled)
        });
        if !available {
            return Some(format!("user action '{}' is not available", identifier));
        }

        let trigger = TriggerEvent::user_action_called(identifier);
        for scope in self.scopes_of(handle) {
            if self.is_ended(handle) {
                break;
            }
            self.run_trigger(scope, &trigger);
        }
        None
    }

    fn text_link(&mut self, handle: UiHandle, view_identifier: &str, link: i32) -> Option<String> {
        let scope = self.find_view_scope(handle, view_identifier).filter(|scope| {
            self.scopes
                .get(scope)
                .is_some_and(|entry| entry.view.has_text_link(view_identifier, link))
        });
        let Some(scope) = scope else {
            return Some(format!("view '{}' has no link {}", view_identifier, link));
        };
        if !self.is_view_interactive(scope, view_identifier) {
            return Some(format!("view '{}' is hidden or disabled", view_identifier));
        }
        self.run_trigger(scope, &TriggerEvent::text_link_clicked(link));
        None
    }

    fn pending_request<F>(&self, handle: UiHandle, requested: Option<u64>, wanted: F) -> Option<u64>
    where
        F: Fn(&PendingKind) -> bool,
    {
        let is_wanted = |popup: &PendingPopup| popup.handle == handle && wanted(&popup.kind);
        match requested {
            Some(id) => self
                .pending
                .get(&id)
                .filter(|popup| is_wanted(popup))
                .map(|_| id),
            None => self
                .pending
                .iter()
                .rev()
                .find(|(_, popup)| is_wanted(popup))
                .map(|(id, _)| *id),
        }
    }

    fn list_popup_closed(
        &mut self,
        handle: UiHandle,
        request_id: Option<u64>,
        selection: Option<Vec<usize>>,
    ) -> Option<String> {
        let Some(id) = self.pending_request(handle, request_id, |kind| {
            matches!(kind, PendingKind::List { .. })
        }) else {
            return Some("no pending list popup".to_string());
        };
        let Some(pending) = self.pending.remove(&id) else {
            return Some("no pending list popup".to_string());
        };
        let PendingKind::List {
            items,
            indices_identifier,
            names_identifier,
            allow_multiselect,
        } = pending.kind
        else {
            return Some("no pending list popup".to_string());
        };

        let Some(indices) = selection else {
            debug!(request_id = id, "List popup dismissed");
            return None;
        };

        let invalid = if indices.iter().any(|index| *index >= items.len()) {
            Some(format!("selection {:?} out of range for {} items", indices, items.len()))
        } else if !allow_multiselect && indices.len() > 1 {
            Some(format!("{} items selected in a single-select popup", indices.len()))
        } else {
            None
        };
        if let Some(details) = invalid {
            let error = CallbackError::InvalidPopupResult { details };
            self.report(handle, Diagnostic::from_callback("show_list_popup", &error));
            return Some(error.to_string());
        }

        let values: Vec<i64> = indices.iter().map(|index| *index as i64).collect();
        let mut result = self.write(pending.scope, &indices_identifier, ModelValue::Ints(values));
        if let (Ok(_), Some(names_identifier)) = (&result, names_identifier) {
            let names = indices.iter().map(|index| items[*index].clone()).collect();
            result = self.write(pending.scope, &names_identifier, ModelValue::Strings(names));
        }
        if let Err(error) = result {
            self.report(handle, Diagnostic::from_callback("show_list_popup", &error));
        }
        None
    }

    fn calendar_popup_closed(
        &mut self,
        handle: UiHandle,
        request_id: Option<u64>,
        date: Option<Date>,
    ) -> Option<String> {
        let Some(id) = self.pending_request(handle, request_id, |kind| {
            matches!(kind, PendingKind::Calendar { .. })
        }) else {
            return Some("no pending calendar popup".to_string());
        };
        let Some(pending) = self.pending.remove(&id) else {
            return Some("no pending calendar popup".to_string());
        };
        let PendingKind::Calendar {
            date_identifier,
            min_date,
            max_date,
        } = pending.kind
        else {
            return Some("no pending calendar popup".to_string());
        };

        let Some(date) = date else {
            return None;
        };
        if date < min_date || date > max_date {
            let error = CallbackError::InvalidPopupResult {
                details: format!("{} is outside {}..={}", date, min_date, max_date),
            };
            self.report(handle, Diagnostic::from_callback("show_calendar_popup", &error));
            return Some(error.to_string());
        }

        if let Err(error) = self.write(pending.scope, &date_identifier, ModelValue::Dates(vec![date])) {
            self.report(handle, Diagnostic::from_callback("show_calendar_popup", &error));
        }
        None
    }

    fn element_condition(&mut self, handle: UiHandle, identifier: &str, present: bool) {
        let mut targets: Vec<ScopeId> = self
            .scopes_of(handle)
            .into_iter()
            .filter(|scope| {
                self.scopes.get(scope).is_some_and(|entry| {
                    entry
                        .element_checks
                        .iter()
                        .any(|check| check.model_identifier == identifier)
                })
            })
            .collect();
        if targets.is_empty() {
            targets.extend(self.uis.get(&handle).map(|ui| ui.root));
        }
        for scope in targets {
            if let Err(error) = self.write(scope, identifier, ModelValue::boolean(present)) {
                self.report(handle, Diagnostic::from_callback("element_check", &error));
            }
        }
    }

    /// Process queued events until the queue is empty, the UI ends or the cap is hit
    pub(crate) fn drain(&mut self, handle: UiHandle) -> usize {
        let mut processed = 0;
        while let Some(event) = self.queue.pop_front() {
            if processed == self.config.max_events_per_dispatch {
                let dropped = self.queue.len() + 1;
                self.queue.clear();
                warn!(%handle, processed, dropped, "Propagation limit reached");
                self.report(
                    handle,
                    Diagnostic::new(
                        DiagnosticKind::PropagationLimit,
                        format!(
                            "Stopped after {} events, {} events dropped",
                            processed, dropped
                        ),
                    ),
                );
                break;
            }
            processed += 1;
            self.process(event);
        }
        processed
    }

    fn process(&mut self, event: Event) {
        match event {
            Event::ModelChanged { owner, identifier } => {
                let Ok(store) = self.store(owner) else {
                    return;
                };
                let value = store.get(&identifier);
                let listeners = store.listeners(&identifier).to_vec();

                if value.as_ref().is_some_and(ModelValue::is_true) {
                    if let Err(error) = self.clear_radio_siblings(owner, &identifier) {
                        if let Some(handle) = self.handle_of(owner) {
                            self.report(handle, Diagnostic::from_callback("radio_group", &error));
                        }
                    }
                }

                for listener in listeners {
                    match listener {
                        Listener::Bindings(scope) => {
                            self.refresh_binding(scope, &identifier, value.as_ref());
                        }
                        Listener::Output(scope) => {
                            let target = self.scopes.get(&scope).and_then(|s| s.parent);
                            if let (Some(target), Some(value)) = (target, &value) {
                                self.queue.push_back(Event::Output {
                                    target,
                                    identifier: identifier.clone(),
                                    value: value.clone(),
                                });
                            }
                        }
                        Listener::Interactions(scope) => {
                            self.run_trigger(scope, &TriggerEvent::value_changed(identifier.clone()));
                        }
                    }
                }
            }
            Event::Output {
                target,
                identifier,
                value,
            } => {
                if let Err(error) = self.write(target, &identifier, value) {
                    if let Some(handle) = self.handle_of(target) {
                        self.report(handle, Diagnostic::from_callback("nested_output", &error));
                    }
                }
            }
        }
    }

    /// Set every other member of the radio groups `identifier` belongs to to `false`, in
    /// all scopes reading the model of `owner`
    fn clear_radio_siblings(&mut self, owner: ScopeId, identifier: &str) -> Result<(), CallbackError> {
        let scopes = self
            .handle_of(owner)
            .map(|handle| self.scopes_of(handle))
            .unwrap_or_default();
        let mut siblings: Vec<String> = Vec::new();
        for scope in scopes {
            if self.model_owner(scope) != owner {
                continue;
            }
            let Some(entry) = self.scopes.get(&scope) else {
                continue;
            };
            for group in entry.view.radio_groups_of(identifier) {
                for member in entry.view.radio_group_members(&group) {
                    if member != identifier && !siblings.contains(&member) {
                        siblings.push(member);
                    }
                }
            }
        }
        for sibling in siblings {
            self.write(owner, &sibling, ModelValue::boolean(false))?;
        }
        Ok(())
    }

    fn refresh_binding(&mut self, scope: ScopeId, identifier: &str, value: Option<&ModelValue>) {
        let Some(entry) = self.scopes.get_mut(&scope) else {
            return;
        };
        let handle = entry.handle;
        for error in entry.view.refresh(identifier, value) {
            self.report(handle, Diagnostic::from_callback("binding", &error.into()));
        }
    }

    /// Run the chains of every interaction of `scope` matching `trigger`
    pub(crate) fn run_trigger(&mut self, scope: ScopeId, trigger: &TriggerEvent) {
        let Some(entry) = self.scopes.get(&scope) else {
            return;
        };
        let handle = entry.handle;
        let interactions: Vec<_> = entry
            .interactions
            .matching(trigger)
            .into_iter()
            .cloned()
            .collect();
        if interactions.is_empty() {
            return;
        }
        debug!(%scope, ?trigger, count = interactions.len(), "Running interactions");

        for interaction in interactions {
            if self.is_ended(handle) {
                break;
            }
            if let Some(guard) = &interaction.guard_model_identifier {
                if !self.is_true(scope, guard) {
                    debug!(%scope, guard, "Interaction skipped by guard");
                    continue;
                }
            }
            if self.run_chain(scope, &interaction.callbacks, &LoopContext::new()) == Flow::Stop {
                break;
            }
        }
    }

    pub(crate) fn end(&mut self, handle: UiHandle, status: ActionStatus) {
        let Some(root) = self.uis.get(&handle).map(|ui| ui.root) else {
            return;
        };
        let identifiers = self
            .scopes
            .get(&root)
            .map(|scope| scope.output_model_identifiers().to_vec())
            .unwrap_or_default();
        let result = ProcessedAction {
            status,
            outputs: self.collect_outputs(root, &identifiers),
        };

        if let Some(ui) = self.uis.get_mut(&handle) {
            ui.ended = true;
        }
        self.queue.clear();
        self.pending.retain(|_, popup| popup.handle != handle);
        info!(%handle, ?status, outputs = result.outputs.len(), "Action ended");
        self.host.end_action(handle, &result);
    }

    pub(crate) fn report(&mut self, handle: UiHandle, diagnostic: Diagnostic) {
        warn!(
            %handle,
            kind = ?diagnostic.kind,
            callback = diagnostic.callback.as_deref().unwrap_or(""),
            "{}",
            diagnostic.message
        );
        if self.config.report_diagnostics {
            self.host.report_diagnostic(handle, &diagnostic);
        }
    }

    pub(crate) fn model_owner(&self, scope: ScopeId) -> ScopeId {
        match self.scopes.get(&scope).map(|entry| &entry.model) {
            Some(ModelSlot::Shared(owner)) => *owner,
            _ => scope,
        }
    }

    pub(crate) fn store(&self, scope: ScopeId) -> Result<&ModelStore, CallbackError> {
        let owner = self.model_owner(scope);
        match self.scopes.get(&owner).map(|entry| &entry.model) {
            Some(ModelSlot::Owned(store)) => Ok(store),
            _ => Err(CallbackError::ClosedScope { scope }),
        }
    }

    pub(crate) fn store_mut(&mut self, scope: ScopeId) -> Result<&mut ModelStore, CallbackError> {
        let owner = self.model_owner(scope);
        match self.scopes.get_mut(&owner).map(|entry| &mut entry.model) {
            Some(ModelSlot::Owned(store)) => Ok(store),
            _ => Err(CallbackError::ClosedScope { scope }),
        }
    }

    /// Store a value in the model `scope` sees; a change is queued for propagation
    pub(crate) fn write(
        &mut self,
        scope: ScopeId,
        identifier: &str,
        value: ModelValue,
    ) -> Result<bool, CallbackError> {
        let owner = self.model_owner(scope);
        let changed = self.store_mut(owner)?.set(identifier, value)?;
        if changed {
            self.queue.push_back(Event::ModelChanged {
                owner,
                identifier: identifier.to_string(),
            });
        }
        Ok(changed)
    }

    pub(crate) fn is_true(&self, scope: ScopeId, identifier: &str) -> bool {
        self.store(scope)
            .ok()
            .and_then(|store| store.get(identifier))
            .is_some_and(|value| value.is_true())
    }

    pub(crate) fn handle_of(&self, scope: ScopeId) -> Option<UiHandle> {
        self.scopes.get(&scope).map(|entry| entry.handle)
    }

    /// Live scopes of a UI in pre-order: parents first, children in creation order
    pub(crate) fn scopes_of(&self, handle: UiHandle) -> Vec<ScopeId> {
        let mut ordered = Vec::new();
        let mut pending: Vec<ScopeId> = self.uis.get(&handle).map(|ui| ui.root).into_iter().collect();
        while let Some(scope) = pending.pop() {
            if let Some(entry) = self.scopes.get(&scope) {
                ordered.push(scope);
                pending.extend(entry.children.iter().rev());
            }
        }
        ordered
    }

    pub(crate) fn find_view_scope(&self, handle: UiHandle, view_identifier: &str) -> Option<ScopeId> {
        self.scopes_of(handle).into_iter().find(|scope| {
            self.scopes
                .get(scope)
                .is_some_and(|entry| entry.view.contains(view_identifier))
        })
    }

    pub(crate) fn find_popup(&self, handle: UiHandle, popup_identifier: &str) -> Option<ScopeId> {
        self.scopes_of(handle).into_iter().find(|scope| {
            self.scopes
                .get(scope)
                .and_then(|entry| entry.popup_identifier())
                == Some(popup_identifier)
        })
    }

    /// Hidden or disabled ancestors, including the container a nested UI is mounted in,
    /// make a view unclickable
    fn is_view_interactive(&self, scope: ScopeId, view_identifier: &str) -> bool {
        let Some(entry) = self.scopes.get(&scope) else {
            return false;
        };
        if !entry.view.is_interactive(view_identifier) {
            return false;
        }
        match (&entry.kind, entry.parent) {
            (ScopeKind::Nested { container, .. }, Some(parent)) => {
                self.is_view_interactive(parent, container)
            }
            _ => true,
        }
    }
}
