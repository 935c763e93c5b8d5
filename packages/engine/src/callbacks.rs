//! # Callback Execution
//!
//! Callback chains run in declaration order. A failing callback is reported to the host
//! as a diagnostic and leaves the model untouched; the remaining callbacks still run.
//! Only `end_action` (or the scope disappearing underneath the chain) stops it.

use crate::errors::{CallbackError, Diagnostic};
use crate::host::{CalendarPopupRequest, HostBridge, ListPopupRequest};
use crate::loops::{self, LoopContext};
use crate::runtime::{PendingKind, PendingPopup, Runtime};
use crate::scope::ScopeId;
use genui_evaluator::{EvalError, Evaluator};
use genui_proto::{
    CalendarPopup, Callback, CallbackDefinition, Date, ForEach, ListPopup, ModelValue,
    ValueReference,
};
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Flow {
    Continue,
    Stop,
}

fn reference_name(reference: &ValueReference) -> String {
    match reference {
        ValueReference::ModelIdentifier(identifier) => identifier.clone(),
        ValueReference::Value(value) => format!("<{} literal>", value.kind()),
    }
}

impl<H: HostBridge> Runtime<H> {
    pub(crate) fn run_chain(
        &mut self,
        scope: ScopeId,
        callbacks: &[CallbackDefinition],
        context: &LoopContext,
    ) -> Flow {
        for definition in callbacks {
            let Some(handle) = self.handle_of(scope) else {
                return Flow::Stop;
            };
            if self.is_ended(handle) {
                return Flow::Stop;
            }

            if let Some(condition) = &definition.condition_model_identifier {
                if !self.is_true(scope, condition) {
                    trace!(%scope, condition, callback = definition.callback.name(), "Condition not met");
                    continue;
                }
            }

            match self.execute(scope, &definition.callback, context) {
                Ok(Flow::Continue) => {}
                Ok(Flow::Stop) => return Flow::Stop,
                Err(error) => {
                    self.report(handle, Diagnostic::from_callback(definition.callback.name(), &error));
                }
            }
        }
        Flow::Continue
    }

    fn execute(
        &mut self,
        scope: ScopeId,
        callback: &Callback,
        context: &LoopContext,
    ) -> Result<Flow, CallbackError> {
        trace!(%scope, callback = callback.name(), "Executing callback");
        match callback {
            Callback::SetValue {
                model_identifier,
                value,
            } => {
                let value = self.resolve(scope, value)?;
                self.write(scope, model_identifier, value)?;
            }
            Callback::ComputeValue {
                result_model_identifier,
                expression,
            } => {
                let value = Evaluator::new(self.store(scope)?).evaluate(expression)?;
                self.write(scope, result_model_identifier, value)?;
            }
            Callback::SetUserActions { user_actions } => {
                let actions = match self.resolve(scope, user_actions)? {
                    ModelValue::UserActions(actions) => actions,
                    other => {
                        return Err(CallbackError::KindMismatch {
                            identifier: reference_name(user_actions),
                            expected: "user_actions",
                            found: other.kind(),
                        })
                    }
                };
                let handle = self.handle_of(scope).ok_or(CallbackError::ClosedScope { scope })?;
                self.host.set_user_actions(handle, &actions);
                if let Some(ui) = self.uis.get_mut(&handle) {
                    ui.user_actions = actions;
                }
            }
            Callback::ToggleUserAction {
                user_actions_model_identifier,
                user_action_identifier,
                enabled,
            } => {
                let enabled = self.single_bool(scope, enabled)?;
                let mut actions = match self.store(scope)?.get(user_actions_model_identifier) {
                    Some(ModelValue::UserActions(actions)) => actions,
                    Some(other) => {
                        return Err(CallbackError::KindMismatch {
                            identifier: user_actions_model_identifier.clone(),
                            expected: "user_actions",
                            found: other.kind(),
                        })
                    }
                    None => {
                        return Err(CallbackError::UnknownIdentifier {
                            identifier: user_actions_model_identifier.clone(),
                        })
                    }
                };
                let action = actions
                    .iter_mut()
                    .find(|action| action.identifier == *user_action_identifier)
                    .ok_or_else(|| CallbackError::UnknownUserAction {
                        identifier: user_action_identifier.clone(),
                        model_identifier: user_actions_model_identifier.clone(),
                    })?;
                action.enabled = enabled;
                self.write(scope, user_actions_model_identifier, ModelValue::UserActions(actions))?;
            }
            Callback::SetViewVisibility {
                view_identifier,
                visible,
            } => {
                let visible = self.single_bool(scope, visible)?;
                let target = self.view_scope(scope, view_identifier);
                if let Some(entry) = self.scopes.get_mut(&target) {
                    entry.view.set_visible(view_identifier, visible)?;
                }
            }
            Callback::SetViewEnabled {
                view_identifier,
                enabled,
            } => {
                let enabled = self.single_bool(scope, enabled)?;
                let target = self.view_scope(scope, view_identifier);
                if let Some(entry) = self.scopes.get_mut(&target) {
                    entry.view.set_enabled(view_identifier, enabled)?;
                }
            }
            Callback::ShowInfoPopup(popup) => {
                let handle = self.handle_of(scope).ok_or(CallbackError::ClosedScope { scope })?;
                self.host.show_info_popup(handle, popup);
            }
            Callback::ShowListPopup(popup) => self.show_list_popup(scope, popup)?,
            Callback::ShowCalendarPopup(popup) => self.show_calendar_popup(scope, popup)?,
            Callback::ShowGenericPopup(popup) => self.show_generic_popup(scope, popup)?,
            Callback::CreateNestedUi(nested) => self.create_nested_ui(scope, nested)?,
            Callback::ClearViewContainer { view_identifier } => {
                let target = self.view_scope(scope, view_identifier);
                self.clear_container(target, view_identifier)?;
            }
            Callback::EndAction { status } => {
                let handle = self.handle_of(scope).ok_or(CallbackError::ClosedScope { scope })?;
                self.end(handle, *status);
                return Ok(Flow::Stop);
            }
            Callback::ForEach(for_each) => return self.for_each(scope, for_each, context),
        }
        Ok(Flow::Continue)
    }

    fn for_each(
        &mut self,
        scope: ScopeId,
        for_each: &ForEach,
        context: &LoopContext,
    ) -> Result<Flow, CallbackError> {
        let collection = &for_each.loop_value_model_identifier;
        let length = loops::collection_len(self.store(scope)?, collection)?;
        debug!(%scope, counter = %for_each.loop_counter, collection = %collection, length, "Expanding loop");

        for iteration in loops::expand(for_each, length, context)? {
            if self.run_chain(scope, &iteration.callbacks, &iteration.context) == Flow::Stop {
                return Ok(Flow::Stop);
            }
        }
        Ok(Flow::Continue)
    }

    fn show_list_popup(&mut self, scope: ScopeId, popup: &ListPopup) -> Result<(), CallbackError> {
        let items = match self.resolve(scope, &popup.item_names)? {
            ModelValue::Strings(items) => items,
            other => {
                return Err(CallbackError::KindMismatch {
                    identifier: reference_name(&popup.item_names),
                    expected: "strings",
                    found: other.kind(),
                })
            }
        };

        let indices_identifier = &popup.selected_item_indices_model_identifier;
        let selected_indices = match self.store(scope)?.get(indices_identifier) {
            None => Vec::new(),
            Some(ModelValue::Ints(indices)) => indices
                .into_iter()
                .filter_map(|index| usize::try_from(index).ok())
                .filter(|index| *index < items.len())
                .collect(),
            Some(other) => {
                return Err(CallbackError::KindMismatch {
                    identifier: indices_identifier.clone(),
                    expected: "ints",
                    found: other.kind(),
                })
            }
        };

        let handle = self.handle_of(scope).ok_or(CallbackError::ClosedScope { scope })?;
        let request = ListPopupRequest {
            request_id: self.next_request,
            items: items.clone(),
            selected_indices,
            allow_multiselect: popup.allow_multiselect,
        };
        self.next_request += 1;
        self.pending.insert(
            request.request_id,
            PendingPopup {
                handle,
                scope,
                kind: PendingKind::List {
                    items,
                    indices_identifier: indices_identifier.clone(),
                    names_identifier: popup.selected_item_names_model_identifier.clone(),
                    allow_multiselect: popup.allow_multiselect,
                },
            },
        );
        self.host.show_list_popup(handle, &request);
        Ok(())
    }

    fn show_calendar_popup(&mut self, scope: ScopeId, popup: &CalendarPopup) -> Result<(), CallbackError> {
        let min_date = self.single_date(scope, &popup.min_date)?;
        let max_date = self.single_date(scope, &popup.max_date)?;
        let initial_date = self
            .store(scope)?
            .get(&popup.date_model_identifier)
            .and_then(|value| value.as_single_date());

        let handle = self.handle_of(scope).ok_or(CallbackError::ClosedScope { scope })?;
        let request = CalendarPopupRequest {
            request_id: self.next_request,
            initial_date,
            min_date,
            max_date,
        };
        self.next_request += 1;
        self.pending.insert(
            request.request_id,
            PendingPopup {
                handle,
                scope,
                kind: PendingKind::Calendar {
                    date_identifier: popup.date_model_identifier.clone(),
                    min_date,
                    max_date,
                },
            },
        );
        self.host.show_calendar_popup(handle, &request);
        Ok(())
    }

    /// Value of a reference; unset identifiers are reported as unknown
    fn resolve(&self, scope: ScopeId, reference: &ValueReference) -> Result<ModelValue, CallbackError> {
        Evaluator::new(self.store(scope)?)
            .resolve(reference)
            .map_err(|error| match error {
                EvalError::UnknownIdentifier { identifier } => {
                    CallbackError::UnknownIdentifier { identifier }
                }
                other => other.into(),
            })
    }

    fn single_bool(&self, scope: ScopeId, reference: &ValueReference) -> Result<bool, CallbackError> {
        let value = self.resolve(scope, reference)?;
        value.as_single_bool().ok_or_else(|| CallbackError::KindMismatch {
            identifier: reference_name(reference),
            expected: "a single boolean",
            found: value.kind(),
        })
    }

    fn single_date(&self, scope: ScopeId, reference: &ValueReference) -> Result<Date, CallbackError> {
        let value = self.resolve(scope, reference)?;
        value.as_single_date().ok_or_else(|| CallbackError::KindMismatch {
            identifier: reference_name(reference),
            expected: "a single date",
            found: value.kind(),
        })
    }

    /// Scope whose tree holds `view_identifier`; popups fall back to the tree they were
    /// opened from
    fn view_scope(&self, scope: ScopeId, view_identifier: &str) -> ScopeId {
        let Some(entry) = self.scopes.get(&scope) else {
            return scope;
        };
        if entry.view.contains(view_identifier) || !entry.is_popup() {
            return scope;
        }
        match entry.parent {
            Some(parent) => self.view_scope(parent, view_identifier),
            None => scope,
        }
    }
}
