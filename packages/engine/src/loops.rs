//! # Loop Expander
//!
//! `for_each` callbacks are expanded when they run, never at registration. Each iteration
//! gets a [`LoopContext`] that maps counter names to indices; the body is copied with every
//! `${counter}` placeholder replaced through [`Substitute`].
//!
//! Placeholders of counters that are not bound yet are left untouched, so an inner loop
//! body survives substitution by the outer loop and is expanded once the inner loop runs.
//! Iterations of nested loops are therefore depth-first: the outer index stays fixed
//! while the inner loop runs to completion.

use crate::errors::{CallbackError, LoadError};
use genui_evaluator::{template, ValueResolver};
use genui_proto::{
    CalendarPopup, Callback, CallbackDefinition, ElementCheck, Expression, ForEach,
    GenericPopup, InfoPopup, InteractionDefinition, ListPopup, ModelEntry, ModelValue, NestedUi,
    TextView, ToStringFormat, ToggleMode, TriggerEvent, UiDefinition, ValueReference,
    ViewDefinition, ViewKind,
};
use std::borrow::Cow;

/// Immutable counter bindings of the loops enclosing a callback
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoopContext {
    bindings: Vec<(String, usize)>,
}

impl LoopContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Context of one iteration of a loop nested inside `self`
    pub fn with(&self, counter: &str, index: usize) -> Result<Self, LoadError> {
        if self.index(counter).is_some() {
            return Err(LoadError::ReusedLoopCounter {
                counter: counter.to_string(),
            });
        }
        let mut bindings = self.bindings.clone();
        bindings.push((counter.to_string(), index));
        Ok(Self { bindings })
    }

    pub fn index(&self, counter: &str) -> Option<usize> {
        self.bindings
            .iter()
            .find(|(name, _)| name == counter)
            .map(|(_, index)| *index)
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Replace every bound counter placeholder in `source`
    pub fn apply<'a>(&self, source: &'a str) -> Cow<'a, str> {
        if self.bindings.is_empty() || !source.contains("${") {
            return Cow::Borrowed(source);
        }
        let mut current = source.to_string();
        for (counter, index) in &self.bindings {
            current = template::substitute(&current, counter, &index.to_string()).into_owned();
        }
        Cow::Owned(current)
    }

    fn string(&self, source: &str) -> String {
        self.apply(source).into_owned()
    }
}

/// Copy of a definition with loop counters replaced in every string attribute
pub trait Substitute {
    fn substitute(&self, context: &LoopContext) -> Self;
}

impl Substitute for String {
    fn substitute(&self, context: &LoopContext) -> Self {
        context.string(self)
    }
}

impl<T: Substitute> Substitute for Option<T> {
    fn substitute(&self, context: &LoopContext) -> Self {
        self.as_ref().map(|inner| inner.substitute(context))
    }
}

impl<T: Substitute> Substitute for Vec<T> {
    fn substitute(&self, context: &LoopContext) -> Self {
        self.iter().map(|item| item.substitute(context)).collect()
    }
}

impl<T: Substitute> Substitute for Box<T> {
    fn substitute(&self, context: &LoopContext) -> Self {
        Box::new(self.as_ref().substitute(context))
    }
}

impl Substitute for ModelValue {
    fn substitute(&self, context: &LoopContext) -> Self {
        match self {
            ModelValue::Strings(values) => ModelValue::Strings(values.substitute(context)),
            other => other.clone(),
        }
    }
}

impl Substitute for ValueReference {
    fn substitute(&self, context: &LoopContext) -> Self {
        match self {
            ValueReference::Value(value) => ValueReference::Value(value.substitute(context)),
            ValueReference::ModelIdentifier(identifier) => {
                ValueReference::ModelIdentifier(identifier.substitute(context))
            }
        }
    }
}

impl Substitute for ToStringFormat {
    fn substitute(&self, context: &LoopContext) -> Self {
        match self {
            ToStringFormat::DateFormat(pattern) => ToStringFormat::DateFormat(pattern.clone()),
            // Autofill patterns carry their own field placeholders; only counters are replaced
            ToStringFormat::AutofillFormat(pattern) => {
                ToStringFormat::AutofillFormat(pattern.substitute(context))
            }
        }
    }
}

impl Substitute for Expression {
    fn substitute(&self, context: &LoopContext) -> Self {
        match self {
            Expression::BooleanAnd { values } => Expression::BooleanAnd {
                values: values.substitute(context),
            },
            Expression::BooleanOr { values } => Expression::BooleanOr {
                values: values.substitute(context),
            },
            Expression::BooleanNot { value } => Expression::BooleanNot {
                value: value.substitute(context),
            },
            Expression::Comparison {
                value_a,
                value_b,
                mode,
            } => Expression::Comparison {
                value_a: value_a.substitute(context),
                value_b: value_b.substitute(context),
                mode: *mode,
            },
            Expression::IntegerSum { values } => Expression::IntegerSum {
                values: values.substitute(context),
            },
            Expression::ToString { value, format } => Expression::ToString {
                value: value.substitute(context),
                format: format.substitute(context),
            },
            Expression::AutofillField { value, field } => Expression::AutofillField {
                value: value.substitute(context),
                field: field.substitute(context),
            },
            Expression::CreateCreditCardResponse { value } => {
                Expression::CreateCreditCardResponse {
                    value: value.substitute(context),
                }
            }
        }
    }
}

impl Substitute for ViewDefinition {
    fn substitute(&self, context: &LoopContext) -> Self {
        let mut view = self.clone();
        view.identifier = self.identifier.substitute(context);
        view.attributes.content_description =
            self.attributes.content_description.substitute(context);
        view.attributes.visibility_model_identifier =
            self.attributes.visibility_model_identifier.substitute(context);
        view.attributes.enabled_model_identifier =
            self.attributes.enabled_model_identifier.substitute(context);

        match &mut view.view {
            ViewKind::TextView(TextView {
                text,
                model_identifier,
                ..
            }) => {
                *text = text.substitute(context);
                *model_identifier = model_identifier.substitute(context);
            }
            ViewKind::ImageView(image) => {
                image.resource_identifier = image.resource_identifier.substitute(context);
            }
            ViewKind::Container(container) => {
                container.views = container.views.substitute(context);
            }
            ViewKind::ToggleButton(toggle) => {
                if let ToggleMode::RadioButton {
                    radio_group_identifier,
                } = &mut toggle.mode
                {
                    *radio_group_identifier = radio_group_identifier.substitute(context);
                }
                toggle.model_identifier = toggle.model_identifier.substitute(context);
                toggle.left_content_view = toggle.left_content_view.substitute(context);
                toggle.right_content_view = toggle.right_content_view.substitute(context);
            }
            ViewKind::TextInput(input) => {
                input.hint = input.hint.substitute(context);
                input.model_identifier = input.model_identifier.substitute(context);
            }
            ViewKind::Divider => {}
            ViewKind::VerticalExpander(expander) => {
                expander.title_view = expander.title_view.substitute(context);
                expander.collapsed_view = expander.collapsed_view.substitute(context);
                expander.expanded_view = expander.expanded_view.substitute(context);
            }
        }
        view
    }
}

impl Substitute for TriggerEvent {
    fn substitute(&self, context: &LoopContext) -> Self {
        match self {
            TriggerEvent::OnViewClicked { view_identifier } => TriggerEvent::OnViewClicked {
                view_identifier: view_identifier.substitute(context),
            },
            TriggerEvent::OnValueChanged { model_identifier } => TriggerEvent::OnValueChanged {
                model_identifier: model_identifier.substitute(context),
            },
            TriggerEvent::OnUserActionCalled {
                user_action_identifier,
            } => TriggerEvent::OnUserActionCalled {
                user_action_identifier: user_action_identifier.substitute(context),
            },
            TriggerEvent::OnTextLinkClicked { text_link } => TriggerEvent::OnTextLinkClicked {
                text_link: *text_link,
            },
        }
    }
}

impl Substitute for InteractionDefinition {
    fn substitute(&self, context: &LoopContext) -> Self {
        InteractionDefinition {
            trigger_events: self.trigger_events.substitute(context),
            callbacks: self.callbacks.substitute(context),
            guard_model_identifier: self.guard_model_identifier.substitute(context),
        }
    }
}

impl Substitute for ModelEntry {
    fn substitute(&self, context: &LoopContext) -> Self {
        ModelEntry {
            identifier: self.identifier.substitute(context),
            value: self.value.substitute(context),
        }
    }
}

impl Substitute for ElementCheck {
    fn substitute(&self, context: &LoopContext) -> Self {
        ElementCheck {
            selector: self.selector.substitute(context),
            model_identifier: self.model_identifier.substitute(context),
        }
    }
}

impl Substitute for UiDefinition {
    fn substitute(&self, context: &LoopContext) -> Self {
        UiDefinition {
            root_view: self.root_view.substitute(context),
            model: self.model.substitute(context),
            interactions: self.interactions.substitute(context),
            element_checks: self.element_checks.substitute(context),
        }
    }
}

impl Substitute for ForEach {
    /// The counter name itself is kept; only the collection and the body change
    fn substitute(&self, context: &LoopContext) -> Self {
        ForEach {
            loop_counter: self.loop_counter.clone(),
            loop_value_model_identifier: self.loop_value_model_identifier.substitute(context),
            callbacks: self.callbacks.substitute(context),
        }
    }
}

impl Substitute for Callback {
    fn substitute(&self, context: &LoopContext) -> Self {
        match self {
            Callback::SetValue {
                model_identifier,
                value,
            } => Callback::SetValue {
                model_identifier: model_identifier.substitute(context),
                value: value.substitute(context),
            },
            Callback::ComputeValue {
                result_model_identifier,
                expression,
            } => Callback::ComputeValue {
                result_model_identifier: result_model_identifier.substitute(context),
                expression: expression.substitute(context),
            },
            Callback::SetUserActions { user_actions } => Callback::SetUserActions {
                user_actions: user_actions.substitute(context),
            },
            Callback::ToggleUserAction {
                user_actions_model_identifier,
                user_action_identifier,
                enabled,
            } => Callback::ToggleUserAction {
                user_actions_model_identifier: user_actions_model_identifier.substitute(context),
                user_action_identifier: user_action_identifier.substitute(context),
                enabled: enabled.substitute(context),
            },
            Callback::SetViewVisibility {
                view_identifier,
                visible,
            } => Callback::SetViewVisibility {
                view_identifier: view_identifier.substitute(context),
                visible: visible.substitute(context),
            },
            Callback::SetViewEnabled {
                view_identifier,
                enabled,
            } => Callback::SetViewEnabled {
                view_identifier: view_identifier.substitute(context),
                enabled: enabled.substitute(context),
            },
            Callback::ShowInfoPopup(popup) => Callback::ShowInfoPopup(InfoPopup {
                title: popup.title.substitute(context),
                text: popup.text.substitute(context),
            }),
            Callback::ShowListPopup(popup) => Callback::ShowListPopup(ListPopup {
                item_names: popup.item_names.substitute(context),
                selected_item_indices_model_identifier: popup
                    .selected_item_indices_model_identifier
                    .substitute(context),
                selected_item_names_model_identifier: popup
                    .selected_item_names_model_identifier
                    .substitute(context),
                allow_multiselect: popup.allow_multiselect,
            }),
            Callback::ShowCalendarPopup(popup) => Callback::ShowCalendarPopup(CalendarPopup {
                date_model_identifier: popup.date_model_identifier.substitute(context),
                min_date: popup.min_date.substitute(context),
                max_date: popup.max_date.substitute(context),
            }),
            Callback::ShowGenericPopup(popup) => Callback::ShowGenericPopup(GenericPopup {
                popup_identifier: popup.popup_identifier.substitute(context),
                root_view: popup.root_view.substitute(context),
                interactions: popup.interactions.substitute(context),
            }),
            Callback::CreateNestedUi(nested) => Callback::CreateNestedUi(NestedUi {
                ui_identifier: nested.ui_identifier.substitute(context),
                parent_view_identifier: nested.parent_view_identifier.substitute(context),
                definition: nested.definition.substitute(context),
                output_model_identifiers: nested.output_model_identifiers.substitute(context),
            }),
            Callback::ClearViewContainer { view_identifier } => Callback::ClearViewContainer {
                view_identifier: view_identifier.substitute(context),
            },
            Callback::EndAction { status } => Callback::EndAction { status: *status },
            Callback::ForEach(for_each) => Callback::ForEach(for_each.substitute(context)),
        }
    }
}

impl Substitute for CallbackDefinition {
    fn substitute(&self, context: &LoopContext) -> Self {
        CallbackDefinition {
            condition_model_identifier: self.condition_model_identifier.substitute(context),
            callback: self.callback.substitute(context),
        }
    }
}

/// One expanded iteration: its context and the concrete body
#[derive(Debug, Clone, PartialEq)]
pub struct Iteration {
    pub index: usize,
    pub context: LoopContext,
    pub callbacks: Vec<CallbackDefinition>,
}

/// Number of iterations of a loop over `identifier`
pub fn collection_len<R: ValueResolver + ?Sized>(
    resolver: &R,
    identifier: &str,
) -> Result<usize, CallbackError> {
    match resolver.resolve(identifier) {
        Some(value) if !value.is_empty() => Ok(value.len()),
        _ => Err(CallbackError::EmptyCollectionAccess {
            identifier: identifier.to_string(),
        }),
    }
}

/// Expand one loop level into `length` concrete iterations, in index order
pub fn expand(
    for_each: &ForEach,
    length: usize,
    context: &LoopContext,
) -> Result<Vec<Iteration>, LoadError> {
    (0..length)
        .map(|index| {
            let context = context.with(&for_each.loop_counter, index)?;
            Ok(Iteration {
                index,
                callbacks: for_each.callbacks.substitute(&context),
                context,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn copy(target: &str, source: &str) -> CallbackDefinition {
        CallbackDefinition::new(Callback::set_value(target, ValueReference::model(source)))
    }

    fn model() -> HashMap<String, ModelValue> {
        let mut model = HashMap::new();
        model.insert("outer".to_string(), ModelValue::strings(["a", "b"]));
        model.insert("inner".to_string(), ModelValue::Ints(vec![1, 2, 3]));
        model
    }

    #[test]
    fn test_apply_only_replaces_bound_counters() {
        let context = LoopContext::new().with("i", 2).unwrap();
        assert_eq!(context.apply("result_${i}"), "result_2");
        assert_eq!(context.apply("list[${i}]_${j}"), "list[2]_${j}");
        assert!(matches!(context.apply("plain"), Cow::Borrowed("plain")));
    }

    #[test]
    fn test_reused_counter_rejected() {
        let context = LoopContext::new().with("i", 0).unwrap();
        assert_eq!(
            context.with("i", 1),
            Err(LoadError::ReusedLoopCounter {
                counter: "i".to_string()
            })
        );
    }

    #[test]
    fn test_expand_substitutes_body() {
        let for_each = ForEach {
            loop_counter: "i".to_string(),
            loop_value_model_identifier: "outer".to_string(),
            callbacks: vec![copy("result_${i}", "outer[${i}]")],
        };
        let iterations = expand(&for_each, 2, &LoopContext::new()).unwrap();
        assert_eq!(iterations.len(), 2);
        assert_eq!(iterations[1].callbacks[0], copy("result_1", "outer[1]"));
        assert_eq!(iterations[1].context.index("i"), Some(1));
    }

    #[test]
    fn test_nested_loops_compose_depth_first() {
        let for_each = ForEach {
            loop_counter: "i".to_string(),
            loop_value_model_identifier: "outer".to_string(),
            callbacks: vec![CallbackDefinition::new(Callback::ForEach(ForEach {
                loop_counter: "j".to_string(),
                loop_value_model_identifier: "inner".to_string(),
                callbacks: vec![copy("cell_${i}_${j}", "inner[${j}]")],
            }))],
        };

        let model = model();
        let mut flattened = Vec::new();
        let outer_len = collection_len(&model, "outer").unwrap();
        for iteration in expand(&for_each, outer_len, &LoopContext::new()).unwrap() {
            let Callback::ForEach(inner) = &iteration.callbacks[0].callback else {
                panic!("expected an inner loop");
            };
            let inner_len = collection_len(&model, &inner.loop_value_model_identifier).unwrap();
            for inner_iteration in expand(inner, inner_len, &iteration.context).unwrap() {
                flattened.extend(inner_iteration.callbacks);
            }
        }
        assert_eq!(flattened.len(), 6);
        assert_eq!(flattened[0], copy("cell_0_0", "inner[0]"));
        assert_eq!(flattened[2], copy("cell_0_2", "inner[2]"));
        assert_eq!(flattened[3], copy("cell_1_0", "inner[0]"));
    }

    #[test]
    fn test_empty_or_unset_collection() {
        let mut model = model();
        model.insert("empty".to_string(), ModelValue::Strings(vec![]));
        assert_eq!(
            collection_len(&model, "empty"),
            Err(CallbackError::EmptyCollectionAccess {
                identifier: "empty".to_string()
            })
        );
        assert!(collection_len(&model, "missing").is_err());
        assert_eq!(collection_len(&model, "inner"), Ok(3));
    }

    #[test]
    fn test_substitute_nested_ui_definition() {
        let definition = UiDefinition::new(
            ViewDefinition::bound_text("name_${i}").with_identifier("row_${i}"),
        );
        let callback = Callback::CreateNestedUi(NestedUi {
            ui_identifier: "row_${i}".to_string(),
            parent_view_identifier: "rows".to_string(),
            definition: Box::new(definition),
            output_model_identifiers: vec![],
        });
        let context = LoopContext::new().with("i", 4).unwrap();
        match callback.substitute(&context) {
            Callback::CreateNestedUi(nested) => {
                assert_eq!(nested.ui_identifier, "row_4");
                assert_eq!(nested.definition.root_view.identifier.as_deref(), Some("row_4"));
            }
            other => panic!("unexpected callback {:?}", other),
        }
    }
}
