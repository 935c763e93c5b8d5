//! # Value Expression Evaluator
//!
//! Pure functions from [`Expression`]s to [`ModelValue`]s. Model values are read through
//! a [`ValueResolver`], so the evaluator never mutates state and has no knowledge of the
//! engine that owns the model.
//!
//! ## Kinds
//!
//! Values are never coerced. Every operand must have the kind the operation expects,
//! otherwise evaluation fails with [`EvalError::KindMismatch`]. Comparisons require both
//! sides to share one kind; ordering modes additionally require single-element ints,
//! strings or dates.
//!
//! ## Unset identifiers
//!
//! A reference to an unset identifier fails with [`EvalError::UnknownIdentifier`], with
//! one exception: `EQUAL`/`NOT_EQUAL` treat unset as unequal to every assigned value.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use genui_evaluator::evaluate;
//! use genui_proto::{Expression, ModelValue, ValueReference};
//! use std::collections::HashMap;
//!
//! let mut model = HashMap::new();
//! model.insert("a".to_string(), ModelValue::int(2));
//! let sum = Expression::IntegerSum {
//!     values: vec![ValueReference::model("a"), ValueReference::value(ModelValue::int(1))],
//! };
//! assert_eq!(evaluate(&sum, &model)?, ModelValue::int(3));
//! ```

use crate::{autofill, date_format};
use genui_proto::{
    ComparisonMode, CreditCardResponse, Date, Expression, ModelValue, ToStringFormat, ValueKind,
    ValueReference,
};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;
use tracing::{debug, instrument};

pub type EvalResult<T> = Result<T, EvalError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("Identifier '{identifier}' is unset")]
    UnknownIdentifier { identifier: String },

    #[error("{operation} expected {expected} but got {found}")]
    KindMismatch {
        operation: &'static str,
        expected: String,
        found: ValueKind,
    },

    #[error("Invalid operands for {operation}: {details}")]
    InvalidOperands {
        operation: &'static str,
        details: String,
    },

    #[error("Integer overflow in {operation}")]
    Overflow { operation: &'static str },

    #[error("Invalid date {date}")]
    InvalidDate { date: Date },

    #[error("Invalid date format '{pattern}': {details}")]
    InvalidDateFormat { pattern: String, details: String },

    #[error("Field '{field}' is not available")]
    MissingField { field: String },

    #[error("Cannot determine card network of '{guid}'")]
    UnknownCardNetwork { guid: String },
}

/// Read access to current model values.
///
/// Implementations must support indexed identifiers (`list[2]`), see
/// [`split_indexed_identifier`].
pub trait ValueResolver {
    fn resolve(&self, identifier: &str) -> Option<ModelValue>;
}

/// Split `name[index]` into its parts. Plain identifiers return `None` as index.
pub fn split_indexed_identifier(identifier: &str) -> (&str, Option<usize>) {
    if let Some(open) = identifier.rfind('[') {
        if let Some(inner) = identifier[open + 1..].strip_suffix(']') {
            if let Ok(index) = inner.parse::<usize>() {
                return (&identifier[..open], Some(index));
            }
        }
    }
    (identifier, None)
}

fn resolve_in<F>(identifier: &str, get: F) -> Option<ModelValue>
where
    F: Fn(&str) -> Option<ModelValue>,
{
    if let Some(value) = get(identifier) {
        return Some(value);
    }
    match split_indexed_identifier(identifier) {
        (name, Some(index)) => get(name)?.element(index),
        (_, None) => None,
    }
}

impl ValueResolver for HashMap<String, ModelValue> {
    fn resolve(&self, identifier: &str) -> Option<ModelValue> {
        resolve_in(identifier, |id| self.get(id).cloned())
    }
}

impl ValueResolver for BTreeMap<String, ModelValue> {
    fn resolve(&self, identifier: &str) -> Option<ModelValue> {
        resolve_in(identifier, |id| self.get(id).cloned())
    }
}

impl<R: ValueResolver + ?Sized> ValueResolver for &R {
    fn resolve(&self, identifier: &str) -> Option<ModelValue> {
        (**self).resolve(identifier)
    }
}

/// Evaluate one expression against `resolver`
pub fn evaluate<R: ValueResolver + ?Sized>(
    expression: &Expression,
    resolver: &R,
) -> EvalResult<ModelValue> {
    Evaluator::new(resolver).evaluate(expression)
}

pub struct Evaluator<'r, R: ValueResolver + ?Sized> {
    resolver: &'r R,
}

impl<'r, R: ValueResolver + ?Sized> Evaluator<'r, R> {
    pub fn new(resolver: &'r R) -> Self {
        Self { resolver }
    }

    /// Current value of a reference, failing when it points at an unset identifier
    pub fn resolve(&self, reference: &ValueReference) -> EvalResult<ModelValue> {
        self.try_resolve(reference)
            .ok_or_else(|| EvalError::UnknownIdentifier {
                identifier: reference_name(reference),
            })
    }

    fn try_resolve(&self, reference: &ValueReference) -> Option<ModelValue> {
        match reference {
            ValueReference::Value(value) => Some(value.clone()),
            ValueReference::ModelIdentifier(identifier) => self.resolver.resolve(identifier),
        }
    }

    #[instrument(skip(self, expression), fields(expression = expression.name()))]
    pub fn evaluate(&self, expression: &Expression) -> EvalResult<ModelValue> {
        let result = match expression {
            Expression::BooleanAnd { values } => {
                let flags = self.booleans("boolean_and", values)?;
                ModelValue::boolean(flags.into_iter().all(|b| b))
            }
            Expression::BooleanOr { values } => {
                let flags = self.booleans("boolean_or", values)?;
                ModelValue::boolean(flags.into_iter().any(|b| b))
            }
            Expression::BooleanNot { value } => match self.resolve(value)? {
                ModelValue::Booleans(flags) => {
                    ModelValue::Booleans(flags.into_iter().map(|b| !b).collect())
                }
                other => return Err(mismatch("boolean_not", "booleans", &other)),
            },
            Expression::Comparison {
                value_a,
                value_b,
                mode,
            } => self.compare(value_a, value_b, *mode)?,
            Expression::IntegerSum { values } => self.integer_sum(values)?,
            Expression::ToString { value, format } => {
                let value = self.resolve(value)?;
                ModelValue::Strings(to_strings(&value, format.as_ref())?)
            }
            Expression::AutofillField { value, field } => match self.resolve(value)? {
                ModelValue::AutofillEntries(entries) => ModelValue::Strings(
                    entries
                        .iter()
                        .map(|entry| autofill::field_value(entry, field))
                        .collect::<EvalResult<Vec<_>>>()?,
                ),
                other => return Err(mismatch("autofill_field", "autofill_entries", &other)),
            },
            Expression::CreateCreditCardResponse { value } => match self.resolve(value)? {
                ModelValue::AutofillEntries(entries) if entries.len() == 1 => {
                    let network = autofill::card_network(&entries[0])?;
                    ModelValue::CreditCardResponses(vec![CreditCardResponse { network }])
                }
                ModelValue::AutofillEntries(entries) => {
                    return Err(EvalError::InvalidOperands {
                        operation: "create_credit_card_response",
                        details: format!("expected a single card, got {}", entries.len()),
                    })
                }
                other => {
                    return Err(mismatch(
                        "create_credit_card_response",
                        "autofill_entries",
                        &other,
                    ))
                }
            },
        };

        debug!(kind = %result.kind(), len = result.len(), "Expression evaluated");
        Ok(result)
    }

    fn booleans(&self, operation: &'static str, values: &[ValueReference]) -> EvalResult<Vec<bool>> {
        if values.is_empty() {
            return Err(EvalError::InvalidOperands {
                operation,
                details: "at least one value is required".to_string(),
            });
        }

        let mut flags = Vec::new();
        for reference in values {
            match self.resolve(reference)? {
                ModelValue::Booleans(list) => flags.extend(list),
                other => return Err(mismatch(operation, "booleans", &other)),
            }
        }
        Ok(flags)
    }

    fn integer_sum(&self, values: &[ValueReference]) -> EvalResult<ModelValue> {
        let mut sum: i64 = 0;
        for reference in values {
            match self.resolve(reference)? {
                ModelValue::Ints(list) => {
                    for value in list {
                        sum = sum
                            .checked_add(value)
                            .ok_or(EvalError::Overflow {
                                operation: "integer_sum",
                            })?;
                    }
                }
                other => return Err(mismatch("integer_sum", "ints", &other)),
            }
        }
        Ok(ModelValue::int(sum))
    }

    fn compare(
        &self,
        value_a: &ValueReference,
        value_b: &ValueReference,
        mode: ComparisonMode,
    ) -> EvalResult<ModelValue> {
        if !mode.is_ordering() {
            let a = self.try_resolve(value_a);
            let b = self.try_resolve(value_b);
            if let (Some(a), Some(b)) = (&a, &b) {
                if a.kind() != b.kind() {
                    return Err(mismatch("comparison", &a.kind().to_string(), b));
                }
            }
            let equal = a == b;
            return Ok(ModelValue::boolean(match mode {
                ComparisonMode::Equal => equal,
                _ => !equal,
            }));
        }

        let a = self.resolve(value_a)?;
        let b = self.resolve(value_b)?;
        if a.kind() != b.kind() {
            return Err(mismatch("comparison", &a.kind().to_string(), &b));
        }

        let ordering = match (&a, &b) {
            (ModelValue::Ints(x), ModelValue::Ints(y)) if x.len() == 1 && y.len() == 1 => {
                x[0].cmp(&y[0])
            }
            (ModelValue::Strings(x), ModelValue::Strings(y)) if x.len() == 1 && y.len() == 1 => {
                x[0].cmp(&y[0])
            }
            (ModelValue::Dates(x), ModelValue::Dates(y)) if x.len() == 1 && y.len() == 1 => {
                x[0].cmp(&y[0])
            }
            _ => {
                return Err(EvalError::InvalidOperands {
                    operation: "comparison",
                    details: format!(
                        "ordering requires single-element ints, strings or dates, got {} ({}) and {} ({})",
                        a.kind(),
                        a.len(),
                        b.kind(),
                        b.len()
                    ),
                })
            }
        };

        let result = match mode {
            ComparisonMode::Less => ordering == Ordering::Less,
            ComparisonMode::LessOrEqual => ordering != Ordering::Greater,
            ComparisonMode::Greater => ordering == Ordering::Greater,
            ComparisonMode::GreaterOrEqual => ordering != Ordering::Less,
            ComparisonMode::Equal => ordering == Ordering::Equal,
            ComparisonMode::NotEqual => ordering != Ordering::Equal,
        };
        Ok(ModelValue::boolean(result))
    }
}

/// Render every element of `value` as a string
pub fn to_strings(value: &ModelValue, format: Option<&ToStringFormat>) -> EvalResult<Vec<String>> {
    match (value, format) {
        (ModelValue::Dates(dates), Some(ToStringFormat::DateFormat(pattern))) => dates
            .iter()
            .map(|date| date_format::format_date(date, pattern))
            .collect(),
        (ModelValue::Dates(dates), Some(ToStringFormat::AutofillFormat(pattern))) => dates
            .iter()
            .map(|date| autofill::format_date(date, pattern))
            .collect(),
        (ModelValue::AutofillEntries(entries), Some(ToStringFormat::AutofillFormat(pattern))) => {
            entries
                .iter()
                .map(|entry| autofill::format_entry(entry, pattern))
                .collect()
        }
        (_, Some(ToStringFormat::DateFormat(_))) => Err(mismatch("to_string", "dates", value)),
        (_, Some(ToStringFormat::AutofillFormat(_))) => Err(mismatch(
            "to_string",
            "dates or autofill_entries",
            value,
        )),
        (ModelValue::Booleans(list), None) => Ok(list.iter().map(|b| b.to_string()).collect()),
        (ModelValue::Ints(list), None) => Ok(list.iter().map(|i| i.to_string()).collect()),
        (ModelValue::Strings(list), None) => Ok(list.clone()),
        (ModelValue::Dates(list), None) => Ok(list.iter().map(|d| d.to_string()).collect()),
        (ModelValue::UserActions(list), None) => {
            Ok(list.iter().map(|action| action.chip.text.clone()).collect())
        }
        (ModelValue::CreditCardResponses(list), None) => {
            Ok(list.iter().map(|response| response.network.clone()).collect())
        }
        (ModelValue::AutofillEntries(_), None) => Err(EvalError::InvalidOperands {
            operation: "to_string",
            details: "autofill entries need an autofill format".to_string(),
        }),
    }
}

fn mismatch(operation: &'static str, expected: &str, found: &ModelValue) -> EvalError {
    EvalError::KindMismatch {
        operation,
        expected: expected.to_string(),
        found: found.kind(),
    }
}

fn reference_name(reference: &ValueReference) -> String {
    match reference {
        ValueReference::ModelIdentifier(identifier) => identifier.clone(),
        ValueReference::Value(value) => format!("<literal {}>", value.kind()),
    }
}
