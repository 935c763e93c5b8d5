//! Interactions: trigger events, callbacks and value expressions

use crate::ui::UiDefinition;
use crate::value::ValueReference;
use crate::view::ViewDefinition;
use serde::{Deserialize, Serialize};

/// Event an interaction listens for
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerEvent {
    OnViewClicked { view_identifier: String },
    OnValueChanged { model_identifier: String },
    OnUserActionCalled { user_action_identifier: String },
    OnTextLinkClicked { text_link: i32 },
}

impl TriggerEvent {
    pub fn view_clicked(view_identifier: impl Into<String>) -> Self {
        TriggerEvent::OnViewClicked {
            view_identifier: view_identifier.into(),
        }
    }

    pub fn value_changed(model_identifier: impl Into<String>) -> Self {
        TriggerEvent::OnValueChanged {
            model_identifier: model_identifier.into(),
        }
    }

    pub fn user_action_called(user_action_identifier: impl Into<String>) -> Self {
        TriggerEvent::OnUserActionCalled {
            user_action_identifier: user_action_identifier.into(),
        }
    }

    pub fn text_link_clicked(text_link: i32) -> Self {
        TriggerEvent::OnTextLinkClicked { text_link }
    }
}

/// Trigger events plus the callback chain they run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionDefinition {
    pub trigger_events: Vec<TriggerEvent>,

    #[serde(default)]
    pub callbacks: Vec<CallbackDefinition>,

    /// Boolean identifier that must hold `true` for the chain to run
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guard_model_identifier: Option<String>,
}

impl InteractionDefinition {
    pub fn new(trigger: TriggerEvent) -> Self {
        Self {
            trigger_events: vec![trigger],
            callbacks: Vec::new(),
            guard_model_identifier: None,
        }
    }

    pub fn with_trigger(mut self, trigger: TriggerEvent) -> Self {
        self.trigger_events.push(trigger);
        self
    }

    pub fn with_callback(mut self, callback: Callback) -> Self {
        self.callbacks.push(CallbackDefinition::new(callback));
        self
    }

    pub fn with_conditional_callback(
        mut self,
        condition_model_identifier: impl Into<String>,
        callback: Callback,
    ) -> Self {
        self.callbacks
            .push(CallbackDefinition::new(callback).with_condition(condition_model_identifier));
        self
    }

    pub fn with_guard(mut self, guard_model_identifier: impl Into<String>) -> Self {
        self.guard_model_identifier = Some(guard_model_identifier.into());
        self
    }
}

/// One entry of a callback chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallbackDefinition {
    /// Skip only this callback unless the identifier holds `true`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition_model_identifier: Option<String>,

    pub callback: Callback,
}

impl CallbackDefinition {
    pub fn new(callback: Callback) -> Self {
        Self {
            condition_model_identifier: None,
            callback,
        }
    }

    pub fn with_condition(mut self, condition_model_identifier: impl Into<String>) -> Self {
        self.condition_model_identifier = Some(condition_model_identifier.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Callback {
    SetValue {
        model_identifier: String,
        value: ValueReference,
    },
    ComputeValue {
        result_model_identifier: String,
        expression: Expression,
    },
    SetUserActions {
        user_actions: ValueReference,
    },
    ToggleUserAction {
        user_actions_model_identifier: String,
        user_action_identifier: String,
        enabled: ValueReference,
    },
    SetViewVisibility {
        view_identifier: String,
        visible: ValueReference,
    },
    SetViewEnabled {
        view_identifier: String,
        enabled: ValueReference,
    },
    ShowInfoPopup(InfoPopup),
    ShowListPopup(ListPopup),
    ShowCalendarPopup(CalendarPopup),
    ShowGenericPopup(GenericPopup),
    CreateNestedUi(NestedUi),
    ClearViewContainer {
        view_identifier: String,
    },
    EndAction {
        #[serde(default)]
        status: ActionStatus,
    },
    ForEach(ForEach),
}

impl Callback {
    pub fn name(&self) -> &'static str {
        match self {
            Callback::SetValue { .. } => "set_value",
            Callback::ComputeValue { .. } => "compute_value",
            Callback::SetUserActions { .. } => "set_user_actions",
            Callback::ToggleUserAction { .. } => "toggle_user_action",
            Callback::SetViewVisibility { .. } => "set_view_visibility",
            Callback::SetViewEnabled { .. } => "set_view_enabled",
            Callback::ShowInfoPopup(_) => "show_info_popup",
            Callback::ShowListPopup(_) => "show_list_popup",
            Callback::ShowCalendarPopup(_) => "show_calendar_popup",
            Callback::ShowGenericPopup(_) => "show_generic_popup",
            Callback::CreateNestedUi(_) => "create_nested_ui",
            Callback::ClearViewContainer { .. } => "clear_view_container",
            Callback::EndAction { .. } => "end_action",
            Callback::ForEach(_) => "for_each",
        }
    }

    pub fn set_value(model_identifier: impl Into<String>, value: ValueReference) -> Self {
        Callback::SetValue {
            model_identifier: model_identifier.into(),
            value,
        }
    }

    pub fn compute(result_model_identifier: impl Into<String>, expression: Expression) -> Self {
        Callback::ComputeValue {
            result_model_identifier: result_model_identifier.into(),
            expression,
        }
    }

    pub fn set_user_actions(user_actions: ValueReference) -> Self {
        Callback::SetUserActions { user_actions }
    }

    pub fn end_action(status: ActionStatus) -> Self {
        Callback::EndAction { status }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfoPopup {
    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListPopup {
    /// String list shown as the popup items
    pub item_names: ValueReference,

    /// Receives the selected indices as an int list
    pub selected_item_indices_model_identifier: String,

    /// Receives the selected item names as a string list
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_item_names_model_identifier: Option<String>,

    #[serde(default)]
    pub allow_multiselect: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarPopup {
    /// Receives the chosen date; the current value preselects it
    pub date_model_identifier: String,

    pub min_date: ValueReference,

    pub max_date: ValueReference,
}

/// Popup whose views and interactions run against the parent model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenericPopup {
    pub popup_identifier: String,

    pub root_view: ViewDefinition,

    #[serde(default)]
    pub interactions: Vec<InteractionDefinition>,
}

/// Independent child UI rendered under a container of the current UI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NestedUi {
    pub ui_identifier: String,

    pub parent_view_identifier: String,

    pub definition: Box<UiDefinition>,

    /// Identifiers copied into the parent model whenever they change
    #[serde(default)]
    pub output_model_identifiers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForEach {
    /// Token substituted as `${loop_counter}` in the body
    pub loop_counter: String,

    /// List-valued identifier iterated over
    pub loop_value_model_identifier: String,

    #[serde(default)]
    pub callbacks: Vec<CallbackDefinition>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionStatus {
    #[default]
    ActionApplied,
    OtherActionStatus,
    ManuallyCancelled,
    InvalidAction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComparisonMode {
    Equal,
    NotEqual,
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
}

impl ComparisonMode {
    pub fn is_ordering(&self) -> bool {
        !matches!(self, ComparisonMode::Equal | ComparisonMode::NotEqual)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToStringFormat {
    /// Pattern such as `EEE, MMM d y`
    DateFormat(String),
    /// Pattern with `${field}` placeholders
    AutofillFormat(String),
}

/// Pure computation over value references
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expression {
    BooleanAnd {
        values: Vec<ValueReference>,
    },
    BooleanOr {
        values: Vec<ValueReference>,
    },
    BooleanNot {
        value: ValueReference,
    },
    Comparison {
        value_a: ValueReference,
        value_b: ValueReference,
        mode: ComparisonMode,
    },
    IntegerSum {
        values: Vec<ValueReference>,
    },
    ToString {
        value: ValueReference,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        format: Option<ToStringFormat>,
    },
    AutofillField {
        value: ValueReference,
        field: String,
    },
    CreateCreditCardResponse {
        value: ValueReference,
    },
}

impl Expression {
    pub fn name(&self) -> &'static str {
        match self {
            Expression::BooleanAnd { .. } => "boolean_and",
            Expression::BooleanOr { .. } => "boolean_or",
            Expression::BooleanNot { .. } => "boolean_not",
            Expression::Comparison { .. } => "comparison",
            Expression::IntegerSum { .. } => "integer_sum",
            Expression::ToString { .. } => "to_string",
            Expression::AutofillField { .. } => "autofill_field",
            Expression::CreateCreditCardResponse { .. } => "create_credit_card_response",
        }
    }

    /// Every value reference the expression reads, in evaluation order
    pub fn references(&self) -> Vec<&ValueReference> {
        match self {
            Expression::BooleanAnd { values }
            | Expression::BooleanOr { values }
            | Expression::IntegerSum { values } => values.iter().collect(),
            Expression::Comparison {
                value_a, value_b, ..
            } => vec![value_a, value_b],
            Expression::BooleanNot { value }
            | Expression::ToString { value, .. }
            | Expression::AutofillField { value, .. }
            | Expression::CreateCreditCardResponse { value } => vec![value],
        }
    }
}
