//! # Generic UI definitions
//!
//! Serde data types describing a declarative UI: the model values it starts with, the view
//! tree it renders, and the interactions that connect the two. These types are consumed by
//! `genui-evaluator` and `genui-engine` and are the on-disk JSON format read by the CLI.

pub mod interaction;
pub mod ui;
pub mod value;
pub mod view;

pub use interaction::{
    ActionStatus, CalendarPopup, Callback, CallbackDefinition, ComparisonMode, Expression,
    ForEach, GenericPopup, InfoPopup, InteractionDefinition, ListPopup, NestedUi,
    ToStringFormat, TriggerEvent,
};
pub use ui::{ElementCheck, ProcessedAction, UiDefinition, UiRequest};
pub use value::{
    AutofillEntry, Chip, ChipType, CreditCardResponse, Date, ModelEntry, ModelValue,
    UserAction, ValueKind, ValueReference,
};
pub use view::{
    ChevronStyle, ContainerLayout, ContainerView, ImageView, InputTypeHint, Orientation,
    TextAlignment, TextInputView, TextView, ToggleButtonView, ToggleMode, VerticalExpanderView,
    ViewAttributes, ViewDefinition, ViewKind,
};
