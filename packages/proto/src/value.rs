//! Model values and references to them
//!
//! Every model identifier holds exactly one [`ModelValue`]. All variants are lists, so a
//! "single boolean" is a one-element `Booleans` list. An identifier without a value is
//! unset, which is represented as `Option::None` by the model store.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Calendar date without time zone
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Date {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl Date {
    pub fn new(year: i32, month: u32, day: u32) -> Self {
        Self { year, month, day }
    }
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChipType {
    #[default]
    NormalAction,
    HighlightedAction,
    CancelAction,
    DoneAction,
}

/// Visual description of a user action button
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Chip {
    #[serde(default)]
    pub text: String,

    #[serde(default)]
    pub chip_type: ChipType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

/// A chip plus the opaque identifier raised when it is invoked
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserAction {
    pub identifier: String,

    #[serde(default)]
    pub chip: Chip,

    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl UserAction {
    pub fn new(identifier: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            chip: Chip {
                text: text.into(),
                ..Chip::default()
            },
            enabled: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Profile or credit card handed over by the autofill data store.
///
/// Field names are free-form (`name`, `card_number`, `exp_month`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct AutofillEntry {
    pub guid: String,

    #[serde(default)]
    pub fields: BTreeMap<String, String>,
}

impl AutofillEntry {
    pub fn new(guid: impl Into<String>) -> Self {
        Self {
            guid: guid.into(),
            fields: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CreditCardResponse {
    pub network: String,
}

/// Tagged value stored under a model identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelValue {
    Booleans(Vec<bool>),
    Ints(Vec<i64>),
    Strings(Vec<String>),
    Dates(Vec<Date>),
    UserActions(Vec<UserAction>),
    AutofillEntries(Vec<AutofillEntry>),
    CreditCardResponses(Vec<CreditCardResponse>),
}

/// Kind tag of a [`ModelValue`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Booleans,
    Ints,
    Strings,
    Dates,
    UserActions,
    AutofillEntries,
    CreditCardResponses,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Booleans => "booleans",
            ValueKind::Ints => "ints",
            ValueKind::Strings => "strings",
            ValueKind::Dates => "dates",
            ValueKind::UserActions => "user_actions",
            ValueKind::AutofillEntries => "autofill_entries",
            ValueKind::CreditCardResponses => "credit_card_responses",
        };
        f.write_str(name)
    }
}

impl ModelValue {
    pub fn boolean(value: bool) -> Self {
        ModelValue::Booleans(vec![value])
    }

    pub fn int(value: i64) -> Self {
        ModelValue::Ints(vec![value])
    }

    pub fn string(value: impl Into<String>) -> Self {
        ModelValue::Strings(vec![value.into()])
    }

    pub fn strings<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ModelValue::Strings(values.into_iter().map(Into::into).collect())
    }

    pub fn date(year: i32, month: u32, day: u32) -> Self {
        ModelValue::Dates(vec![Date::new(year, month, day)])
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            ModelValue::Booleans(_) => ValueKind::Booleans,
            ModelValue::Ints(_) => ValueKind::Ints,
            ModelValue::Strings(_) => ValueKind::Strings,
            ModelValue::Dates(_) => ValueKind::Dates,
            ModelValue::UserActions(_) => ValueKind::UserActions,
            ModelValue::AutofillEntries(_) => ValueKind::AutofillEntries,
            ModelValue::CreditCardResponses(_) => ValueKind::CreditCardResponses,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ModelValue::Booleans(v) => v.len(),
            ModelValue::Ints(v) => v.len(),
            ModelValue::Strings(v) => v.len(),
            ModelValue::Dates(v) => v.len(),
            ModelValue::UserActions(v) => v.len(),
            ModelValue::AutofillEntries(v) => v.len(),
            ModelValue::CreditCardResponses(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// One-element value holding element `index`, or `None` when out of range
    pub fn element(&self, index: usize) -> Option<ModelValue> {
        fn pick<T: Clone>(values: &[T], index: usize) -> Option<Vec<T>> {
            values.get(index).cloned().map(|v| vec![v])
        }

        match self {
            ModelValue::Booleans(v) => pick(v, index).map(ModelValue::Booleans),
            ModelValue::Ints(v) => pick(v, index).map(ModelValue::Ints),
            ModelValue::Strings(v) => pick(v, index).map(ModelValue::Strings),
            ModelValue::Dates(v) => pick(v, index).map(ModelValue::Dates),
            ModelValue::UserActions(v) => pick(v, index).map(ModelValue::UserActions),
            ModelValue::AutofillEntries(v) => pick(v, index).map(ModelValue::AutofillEntries),
            ModelValue::CreditCardResponses(v) => {
                pick(v, index).map(ModelValue::CreditCardResponses)
            }
        }
    }

    /// True only for a one-element boolean list holding `true`
    pub fn is_true(&self) -> bool {
        matches!(self, ModelValue::Booleans(v) if v.as_slice() == [true])
    }

    pub fn as_single_bool(&self) -> Option<bool> {
        match self {
            ModelValue::Booleans(v) if v.len() == 1 => Some(v[0]),
            _ => None,
        }
    }

    pub fn as_single_string(&self) -> Option<&str> {
        match self {
            ModelValue::Strings(v) if v.len() == 1 => Some(v[0].as_str()),
            _ => None,
        }
    }

    pub fn as_single_date(&self) -> Option<Date> {
        match self {
            ModelValue::Dates(v) if v.len() == 1 => Some(v[0]),
            _ => None,
        }
    }
}

/// Either a literal value or the current value of another identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueReference {
    Value(ModelValue),
    ModelIdentifier(String),
}

impl ValueReference {
    pub fn value(value: ModelValue) -> Self {
        ValueReference::Value(value)
    }

    pub fn model(identifier: impl Into<String>) -> Self {
        ValueReference::ModelIdentifier(identifier.into())
    }
}

/// Identifier/value pair, used for initial model snapshots and extracted outputs
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelEntry {
    pub identifier: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<ModelValue>,
}

impl ModelEntry {
    pub fn new(identifier: impl Into<String>, value: ModelValue) -> Self {
        Self {
            identifier: identifier.into(),
            value: Some(value),
        }
    }

    pub fn unset(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            value: None,
        }
    }
}
