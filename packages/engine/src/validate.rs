//! # Definition Validation
//!
//! Structural checks run before a UI is loaded. Any error rejects the whole definition,
//! so no scope is ever left half-built. Nested UI definitions and generic popups are
//! checked recursively; popups may reference views of the tree they were opened from.
//!
//! Identifiers containing a `${...}` placeholder are only known once a loop expands
//! them, so view references of that form are not resolved here.

use crate::errors::LoadError;
use genui_evaluator::split_indexed_identifier;
use genui_proto::{
    Callback, CallbackDefinition, InteractionDefinition, ModelValue, ToggleMode, TriggerEvent,
    UiDefinition, ViewDefinition, ViewKind,
};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Summary of a definition that passed validation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub views: usize,
    pub interactions: usize,
    pub callbacks: usize,
    pub nested_definitions: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ViewShape {
    Container,
    Other,
}

#[derive(Default)]
struct ViewIndex {
    shapes: HashMap<String, ViewShape>,
    /// Radio group of every toggle model identifier
    groups: HashMap<String, String>,
    /// Model identifiers bound to toggles, they must hold booleans
    toggles: Vec<String>,
    count: usize,
}

impl ViewIndex {
    fn build(root: &ViewDefinition) -> Result<Self, LoadError> {
        let mut index = ViewIndex::default();
        index.add(root)?;
        Ok(index)
    }

    fn add(&mut self, view: &ViewDefinition) -> Result<(), LoadError> {
        self.count += 1;
        if let Some(identifier) = &view.identifier {
            if identifier.is_empty() {
                return Err(LoadError::MalformedTree {
                    details: "view identifier must not be empty".to_string(),
                });
            }
            let shape = match view.view {
                ViewKind::Container(_) => ViewShape::Container,
                _ => ViewShape::Other,
            };
            if self.shapes.insert(identifier.clone(), shape).is_some() {
                return Err(LoadError::DuplicateViewIdentifier {
                    identifier: identifier.clone(),
                });
            }
        }

        let bound = match &view.view {
            ViewKind::TextView(text) => text.model_identifier.as_deref(),
            ViewKind::ToggleButton(toggle) => Some(toggle.model_identifier.as_str()),
            ViewKind::TextInput(input) => Some(input.model_identifier.as_str()),
            _ => None,
        };
        let attributes = &view.attributes;
        for identifier in bound
            .into_iter()
            .chain(attributes.visibility_model_identifier.as_deref())
            .chain(attributes.enabled_model_identifier.as_deref())
        {
            if identifier.is_empty() {
                return Err(LoadError::MalformedTree {
                    details: format!("{} binds an empty model identifier", view.view.type_name()),
                });
            }
        }

        if let ViewKind::ToggleButton(toggle) = &view.view {
            self.toggles.push(toggle.model_identifier.clone());
            if let ToggleMode::RadioButton {
                radio_group_identifier,
            } = &toggle.mode
            {
                self.add_group_member(&toggle.model_identifier, radio_group_identifier)?;
            }
        }

        for child in view.children() {
            self.add(child)?;
        }
        Ok(())
    }

    fn add_group_member(&mut self, model_identifier: &str, group: &str) -> Result<(), LoadError> {
        match self.groups.get(model_identifier) {
            Some(existing) if existing != group => Err(LoadError::DuplicateGroupMembership {
                model_identifier: model_identifier.to_string(),
                first_group: existing.clone(),
                second_group: group.to_string(),
            }),
            Some(_) => Ok(()),
            None => {
                self.groups
                    .insert(model_identifier.to_string(), group.to_string());
                Ok(())
            }
        }
    }

    fn require_view(&self, identifier: &str, context: &'static str) -> Result<(), LoadError> {
        if identifier.contains("${") || self.shapes.contains_key(identifier) {
            return Ok(());
        }
        Err(LoadError::DanglingViewReference {
            identifier: identifier.to_string(),
            context,
        })
    }

    fn require_container(&self, identifier: &str, context: &'static str) -> Result<(), LoadError> {
        self.require_view(identifier, context)?;
        match self.shapes.get(identifier) {
            Some(ViewShape::Other) => Err(LoadError::NotAContainer {
                identifier: identifier.to_string(),
                context,
            }),
            _ => Ok(()),
        }
    }
}

struct Validator<'a> {
    views: &'a ViewIndex,
    report: &'a mut ValidationReport,
}

impl Validator<'_> {
    fn interaction(&mut self, interaction: &InteractionDefinition) -> Result<(), LoadError> {
        self.report.interactions += 1;
        if interaction.trigger_events.is_empty() {
            return Err(LoadError::MalformedInteraction {
                details: "interaction has no trigger events".to_string(),
            });
        }
        for trigger in &interaction.trigger_events {
            match trigger {
                TriggerEvent::OnViewClicked { view_identifier } => {
                    self.views.require_view(view_identifier, "on_view_clicked")?;
                }
                TriggerEvent::OnValueChanged { model_identifier } if model_identifier.is_empty() => {
                    return Err(LoadError::MalformedInteraction {
                        details: "on_value_changed without model identifier".to_string(),
                    });
                }
                _ => {}
            }
        }
        self.callbacks(&interaction.callbacks, &mut Vec::new())
    }

    fn callbacks(
        &mut self,
        callbacks: &[CallbackDefinition],
        counters: &mut Vec<String>,
    ) -> Result<(), LoadError> {
        for definition in callbacks {
            self.callback(&definition.callback, counters)?;
        }
        Ok(())
    }

    fn callback(&mut self, callback: &Callback, counters: &mut Vec<String>) -> Result<(), LoadError> {
        self.report.callbacks += 1;
        match callback {
            Callback::SetViewVisibility {
                view_identifier, ..
            } => self.views.require_view(view_identifier, "set_view_visibility"),
            Callback::SetViewEnabled {
                view_identifier, ..
            } => self.views.require_view(view_identifier, "set_view_enabled"),
            Callback::ClearViewContainer { view_identifier } => {
                self.views.require_container(view_identifier, "clear_view_container")
            }
            Callback::CreateNestedUi(nested) => {
                self.views
                    .require_container(&nested.parent_view_identifier, "create_nested_ui")?;
                if nested.ui_identifier.is_empty() {
                    return Err(LoadError::MalformedTree {
                        details: "nested UI without identifier".to_string(),
                    });
                }
                self.report.nested_definitions += 1;
                let nested_report = validate(&nested.definition)?;
                self.report.nested_definitions += nested_report.nested_definitions;
                Ok(())
            }
            Callback::ShowGenericPopup(popup) => {
                let mut index = ViewIndex::build(&popup.root_view)?;
                // Popup views share the radio groups of the tree they are shown from
                for (model_identifier, group) in &self.views.groups {
                    index.add_group_member(model_identifier, group)?;
                }
                for (identifier, shape) in &self.views.shapes {
                    index.shapes.entry(identifier.clone()).or_insert(*shape);
                }
                let mut nested = Validator {
                    views: &index,
                    report: &mut *self.report,
                };
                for interaction in &popup.interactions {
                    nested.interaction(interaction)?;
                }
                Ok(())
            }
            Callback::ForEach(for_each) => {
                if for_each.loop_counter.is_empty() {
                    return Err(LoadError::MalformedInteraction {
                        details: "for_each without loop counter".to_string(),
                    });
                }
                if counters.contains(&for_each.loop_counter) {
                    return Err(LoadError::ReusedLoopCounter {
                        counter: for_each.loop_counter.clone(),
                    });
                }
                counters.push(for_each.loop_counter.clone());
                let result = self.callbacks(&for_each.callbacks, counters);
                counters.pop();
                result
            }
            _ => Ok(()),
        }
    }
}

/// Check a definition before anything is created from it
pub fn validate(definition: &UiDefinition) -> Result<ValidationReport, LoadError> {
    let views = ViewIndex::build(&definition.root_view)?;

    let mut declared = HashSet::new();
    for entry in &definition.model {
        if entry.identifier.is_empty() {
            return Err(LoadError::MalformedTree {
                details: "model entry without identifier".to_string(),
            });
        }
        if let (_, Some(_)) = split_indexed_identifier(&entry.identifier) {
            return Err(LoadError::MalformedTree {
                details: format!("model entry '{}' uses an indexed identifier", entry.identifier),
            });
        }
        if !declared.insert(entry.identifier.as_str()) {
            return Err(LoadError::MalformedTree {
                details: format!("model entry '{}' is declared twice", entry.identifier),
            });
        }
        if let Some(value) = &entry.value {
            if views.toggles.contains(&entry.identifier) && !matches!(value, ModelValue::Booleans(_)) {
                return Err(LoadError::KindMismatch {
                    identifier: entry.identifier.clone(),
                    expected: "booleans",
                    found: value.kind(),
                });
            }
        }
    }

    for check in &definition.element_checks {
        if check.model_identifier.is_empty() || check.selector.is_empty() {
            return Err(LoadError::MalformedTree {
                details: "element check needs a selector and a model identifier".to_string(),
            });
        }
    }

    let mut report = ValidationReport {
        views: views.count,
        ..ValidationReport::default()
    };
    let mut validator = Validator {
        views: &views,
        report: &mut report,
    };
    for interaction in &definition.interactions {
        validator.interaction(interaction)?;
    }

    debug!(
        views = report.views,
        interactions = report.interactions,
        callbacks = report.callbacks,
        "Definition validated"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use genui_proto::{
        ForEach, GenericPopup, ModelEntry, NestedUi, ValueReference,
    };

    fn root() -> ViewDefinition {
        ViewDefinition::container(vec![
            ViewDefinition::text("Hello").with_identifier("greeting"),
            ViewDefinition::container(vec![]).with_identifier("slot"),
        ])
        .with_identifier("root")
    }

    fn on_click(view: &str, callback: Callback) -> InteractionDefinition {
        InteractionDefinition::new(TriggerEvent::view_clicked(view)).with_callback(callback)
    }

    #[test]
    fn test_valid_definition() {
        let definition = UiDefinition::new(root()).with_interaction(on_click(
            "greeting",
            Callback::ClearViewContainer {
                view_identifier: "slot".to_string(),
            },
        ));
        let report = validate(&definition).unwrap();
        assert_eq!(report.views, 3);
        assert_eq!(report.interactions, 1);
        assert_eq!(report.callbacks, 1);
    }

    #[test]
    fn test_duplicate_view_identifier() {
        let definition = UiDefinition::new(ViewDefinition::container(vec![
            ViewDefinition::text("a").with_identifier("x"),
            ViewDefinition::text("b").with_identifier("x"),
        ]));
        assert_eq!(
            validate(&definition),
            Err(LoadError::DuplicateViewIdentifier {
                identifier: "x".to_string()
            })
        );
    }

    #[test]
    fn test_dangling_click_reference() {
        let definition = UiDefinition::new(root()).with_interaction(on_click(
            "missing",
            Callback::end_action(Default::default()),
        ));
        assert!(matches!(
            validate(&definition),
            Err(LoadError::DanglingViewReference { context: "on_view_clicked", .. })
        ));
    }

    #[test]
    fn test_clear_requires_container() {
        let definition = UiDefinition::new(root()).with_interaction(on_click(
            "greeting",
            Callback::ClearViewContainer {
                view_identifier: "greeting".to_string(),
            },
        ));
        assert!(matches!(
            validate(&definition),
            Err(LoadError::NotAContainer { .. })
        ));
    }

    #[test]
    fn test_interaction_without_trigger() {
        let mut interaction = on_click("greeting", Callback::end_action(Default::default()));
        interaction.trigger_events.clear();
        let definition = UiDefinition::new(root()).with_interaction(interaction);
        assert!(matches!(
            validate(&definition),
            Err(LoadError::MalformedInteraction { .. })
        ));
    }

    #[test]
    fn test_radio_identifier_in_two_groups() {
        let definition = UiDefinition::new(ViewDefinition::container(vec![
            ViewDefinition::radio_button("A", "first", "choice"),
            ViewDefinition::radio_button("B", "second", "choice"),
        ]));
        assert!(matches!(
            validate(&definition),
            Err(LoadError::DuplicateGroupMembership { .. })
        ));
    }

    #[test]
    fn test_nested_loop_reusing_counter() {
        let inner = Callback::ForEach(ForEach {
            loop_counter: "i".to_string(),
            loop_value_model_identifier: "list".to_string(),
            callbacks: vec![],
        });
        let outer = Callback::ForEach(ForEach {
            loop_counter: "i".to_string(),
            loop_value_model_identifier: "list".to_string(),
            callbacks: vec![CallbackDefinition::new(inner)],
        });
        let definition = UiDefinition::new(root()).with_interaction(on_click("greeting", outer));
        assert_eq!(
            validate(&definition),
            Err(LoadError::ReusedLoopCounter {
                counter: "i".to_string()
            })
        );
    }

    #[test]
    fn test_templated_view_reference_is_deferred() {
        let definition = UiDefinition::new(root()).with_interaction(on_click(
            "greeting",
            Callback::SetViewVisibility {
                view_identifier: "row_${i}".to_string(),
                visible: ValueReference::value(ModelValue::boolean(false)),
            },
        ));
        assert!(validate(&definition).is_ok());
    }

    #[test]
    fn test_nested_definitions_are_checked() {
        let broken = UiDefinition::new(ViewDefinition::container(vec![
            ViewDefinition::text("a").with_identifier("dup"),
            ViewDefinition::text("b").with_identifier("dup"),
        ]));
        let definition = UiDefinition::new(root()).with_interaction(on_click(
            "greeting",
            Callback::CreateNestedUi(NestedUi {
                ui_identifier: "child".to_string(),
                parent_view_identifier: "slot".to_string(),
                definition: Box::new(broken),
                output_model_identifiers: vec![],
            }),
        ));
        assert!(validate(&definition).is_err());
    }

    #[test]
    fn test_popup_may_reference_parent_views() {
        let popup = Callback::ShowGenericPopup(GenericPopup {
            popup_identifier: "popup".to_string(),
            root_view: ViewDefinition::text("Close").with_identifier("close"),
            interactions: vec![
                on_click("close", Callback::end_action(Default::default())),
                on_click(
                    "greeting",
                    Callback::SetViewEnabled {
                        view_identifier: "close".to_string(),
                        enabled: ValueReference::value(ModelValue::boolean(false)),
                    },
                ),
            ],
        });
        let definition = UiDefinition::new(root()).with_interaction(on_click("greeting", popup));
        let report = validate(&definition).unwrap();
        assert_eq!(report.interactions, 3);
    }

    #[test]
    fn test_toggle_requires_boolean_initial_value() {
        let definition = UiDefinition::new(ViewDefinition::check_box("Agree", "agree"))
            .with_model(ModelEntry::new("agree", ModelValue::string("yes")));
        assert!(matches!(
            validate(&definition),
            Err(LoadError::KindMismatch { .. })
        ));
    }

    #[test]
    fn test_indexed_model_entry_rejected() {
        let definition = UiDefinition::new(root())
            .with_model(ModelEntry::new("list[0]", ModelValue::int(1)));
        assert!(matches!(
            validate(&definition),
            Err(LoadError::MalformedTree { .. })
        ));
    }
}
