//! # Nested-UI Manager
//!
//! Creation and teardown of scopes. A nested UI owns a fresh model and reports its output
//! identifiers to the parent through explicit output messages. A generic popup has its own
//! view tree and interactions but reads and writes the model of the scope that opened it.
//!
//! Destroying a scope destroys its children first and drops every subscription and
//! pending popup request it held, so no callback can reach a dead scope afterwards.

use crate::errors::{CallbackError, Diagnostic, LoadError};
use crate::host::HostBridge;
use crate::interaction::InteractionRegistry;
use crate::model::{Listener, ModelStore};
use crate::runtime::Runtime;
use crate::scope::{ModelSlot, Scope, ScopeId, ScopeKind, UiHandle};
use crate::validate::validate;
use crate::view::ViewTree;
use genui_proto::{
    ElementCheck, GenericPopup, InteractionDefinition, ModelEntry, NestedUi, ViewDefinition,
};
use tracing::debug;

impl<H: HostBridge> Runtime<H> {
    /// Build a scope and subscribe its bindings, outputs and value triggers
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn create_scope(
        &mut self,
        handle: UiHandle,
        parent: Option<ScopeId>,
        kind: ScopeKind,
        model: ModelSlot,
        root_view: &ViewDefinition,
        interactions: &[InteractionDefinition],
        element_checks: &[ElementCheck],
    ) -> Result<ScopeId, LoadError> {
        let view = ViewTree::build(root_view).map_err(|error| LoadError::MalformedTree {
            details: error.to_string(),
        })?;

        let id = ScopeId(self.next_scope);
        self.next_scope += 1;
        let owner = match &model {
            ModelSlot::Owned(_) => id,
            ModelSlot::Shared(owner) => *owner,
        };

        let mut subscriptions: Vec<(String, Listener)> = view
            .bound_identifiers()
            .into_iter()
            .map(|identifier| (identifier, Listener::Bindings(id)))
            .collect();

        let mut scope = Scope::new(id, handle, parent, kind, model, view);
        scope.interactions = InteractionRegistry::from_definitions(interactions);
        scope.element_checks = element_checks.to_vec();

        subscriptions.extend(
            scope
                .interactions
                .watched_identifiers()
                .into_iter()
                .map(|identifier| (identifier, Listener::Interactions(id))),
        );
        if matches!(scope.kind, ScopeKind::Nested { .. }) {
            subscriptions.extend(
                scope
                    .output_model_identifiers()
                    .iter()
                    .map(|identifier| (identifier.clone(), Listener::Output(id))),
            );
        }

        self.scopes.insert(id, scope);
        if let Some(parent) = parent.and_then(|parent| self.scopes.get_mut(&parent)) {
            parent.children.push(id);
        }

        match self.store_mut(owner) {
            Ok(store) => {
                for (identifier, listener) in subscriptions {
                    store.subscribe(&identifier, listener);
                }
            }
            Err(error) => {
                self.destroy_scope(id, false);
                return Err(LoadError::MalformedTree {
                    details: error.to_string(),
                });
            }
        }

        debug!(%handle, scope = %id, owner = %owner, "Scope created");
        Ok(id)
    }

    /// Apply initial values and bring every binding in line with the model.
    ///
    /// Changes are queued, so value-changed interactions see the initial values as
    /// regular changes once the queue is drained.
    pub(crate) fn initialize(&mut self, scope: ScopeId, model: &[ModelEntry]) -> Result<(), LoadError> {
        for entry in model {
            if let Some(value) = &entry.value {
                self.write(scope, &entry.identifier, value.clone())
                    .map_err(|error| match error {
                        CallbackError::Model(model) => LoadError::Model(model),
                        other => LoadError::MalformedTree {
                            details: other.to_string(),
                        },
                    })?;
            }
        }
        self.refresh_all(scope);
        Ok(())
    }

    pub(crate) fn refresh_all(&mut self, scope: ScopeId) {
        let Some(identifiers) = self.scopes.get(&scope).map(|s| s.view.bound_identifiers()) else {
            return;
        };
        let values: Vec<_> = match self.store(scope) {
            Ok(store) => identifiers
                .into_iter()
                .map(|identifier| {
                    let value = store.get(&identifier);
                    (identifier, value)
                })
                .collect(),
            Err(_) => return,
        };

        let mut errors = Vec::new();
        let mut handle = None;
        if let Some(entry) = self.scopes.get_mut(&scope) {
            handle = Some(entry.handle);
            for (identifier, value) in values {
                errors.extend(entry.view.refresh(&identifier, value.as_ref()));
            }
        }
        if let Some(handle) = handle {
            for error in errors {
                self.report(handle, Diagnostic::from_callback("binding", &error.into()));
            }
        }
    }

    /// Create a nested UI under a container of `parent`
    pub(crate) fn create_nested_ui(&mut self, parent: ScopeId, nested: &NestedUi) -> Result<(), CallbackError> {
        validate(&nested.definition)?;

        let Some(parent_scope) = self.scopes.get(&parent) else {
            return Err(CallbackError::ClosedScope { scope: parent });
        };
        let handle = parent_scope.handle;
        let duplicate = parent_scope.children.iter().any(|child| {
            matches!(
                self.scopes.get(child).map(|s| &s.kind),
                Some(ScopeKind::Nested { ui_identifier, .. }) if *ui_identifier == nested.ui_identifier
            )
        });
        if duplicate {
            return Err(CallbackError::DuplicateNestedUi {
                identifier: nested.ui_identifier.clone(),
            });
        }
        parent_scope
            .view
            .require_container(&nested.parent_view_identifier)?;

        let definition = &nested.definition;
        let id = self.create_scope(
            handle,
            Some(parent),
            ScopeKind::Nested {
                ui_identifier: nested.ui_identifier.clone(),
                container: nested.parent_view_identifier.clone(),
                output_model_identifiers: nested.output_model_identifiers.clone(),
            },
            ModelSlot::Owned(ModelStore::new()),
            &definition.root_view,
            &definition.interactions,
            &definition.element_checks,
        )?;

        if let Some(entry) = self.scopes.get_mut(&parent) {
            entry.view.mount(&nested.parent_view_identifier, id)?;
        }
        if let Err(error) = self.initialize(id, &definition.model) {
            self.destroy_scope(id, false);
            return Err(error.into());
        }

        debug!(%handle, scope = %id, ui = %nested.ui_identifier, "Nested UI created");
        Ok(())
    }

    /// Show a generic popup running against the model `opener` sees
    pub(crate) fn show_generic_popup(&mut self, opener: ScopeId, popup: &GenericPopup) -> Result<(), CallbackError> {
        let Some(handle) = self.handle_of(opener) else {
            return Err(CallbackError::ClosedScope { scope: opener });
        };
        if self.find_popup(handle, &popup.popup_identifier).is_some() {
            return Err(CallbackError::DuplicatePopup {
                identifier: popup.popup_identifier.clone(),
            });
        }

        let owner = self.model_owner(opener);
        let id = self.create_scope(
            handle,
            Some(opener),
            ScopeKind::Popup {
                popup_identifier: popup.popup_identifier.clone(),
            },
            ModelSlot::Shared(owner),
            &popup.root_view,
            &popup.interactions,
            &[],
        )?;
        self.refresh_all(id);

        if let Some(view) = self.render_scope(id) {
            self.host
                .show_generic_popup(handle, &popup.popup_identifier, &view);
        }
        debug!(%handle, scope = %id, popup = %popup.popup_identifier, "Generic popup shown");
        Ok(())
    }

    /// Empty a container and destroy every nested UI mounted in it
    pub(crate) fn clear_container(&mut self, scope: ScopeId, container: &str) -> Result<(), CallbackError> {
        let Some(entry) = self.scopes.get_mut(&scope) else {
            return Err(CallbackError::ClosedScope { scope });
        };
        let unmounted = entry.view.clear(container)?;
        for nested in unmounted {
            self.destroy_scope(nested, true);
        }
        Ok(())
    }

    /// Remove a scope and all of its descendants
    pub(crate) fn destroy_scope(&mut self, scope: ScopeId, notify_host: bool) {
        let Some(entry) = self.scopes.remove(&scope) else {
            return;
        };

        for child in entry.children.iter().copied() {
            self.destroy_scope(child, notify_host);
        }

        if let ModelSlot::Shared(owner) = entry.model {
            if let Ok(store) = self.store_mut(owner) {
                store.unsubscribe_scope(scope);
            }
        }
        if let Some(parent) = entry.parent.and_then(|parent| self.scopes.get_mut(&parent)) {
            parent.children.retain(|child| *child != scope);
            parent.view.unmount(scope);
        }
        self.pending.retain(|_, popup| popup.scope != scope);

        if let ScopeKind::Popup { popup_identifier } = &entry.kind {
            if notify_host {
                self.host.dismiss_generic_popup(entry.handle, popup_identifier);
            }
        }
        debug!(handle = %entry.handle, scope = %scope, "Scope destroyed");
    }
}
