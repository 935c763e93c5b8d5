/// Tests for every expression type against a map-backed model
use crate::*;
use genui_proto::{
    AutofillEntry, ComparisonMode, CreditCardResponse, Date, Expression, ModelValue,
    ToStringFormat, UserAction, ValueKind, ValueReference,
};
use std::collections::HashMap;

fn model(entries: &[(&str, ModelValue)]) -> HashMap<String, ModelValue> {
    entries
        .iter()
        .map(|(id, value)| (id.to_string(), value.clone()))
        .collect()
}

fn id(identifier: &str) -> ValueReference {
    ValueReference::model(identifier)
}

fn lit(value: ModelValue) -> ValueReference {
    ValueReference::value(value)
}

fn compare(a: ValueReference, b: ValueReference, mode: ComparisonMode) -> Expression {
    Expression::Comparison {
        value_a: a,
        value_b: b,
        mode,
    }
}

#[test]
fn test_boolean_and_over_all_elements() {
    let m = model(&[
        ("a", ModelValue::Booleans(vec![true, true])),
        ("b", ModelValue::boolean(false)),
    ]);
    let all_a = Expression::BooleanAnd {
        values: vec![id("a")],
    };
    assert_eq!(evaluate(&all_a, &m).unwrap(), ModelValue::boolean(true));

    let a_and_b = Expression::BooleanAnd {
        values: vec![id("a"), id("b")],
    };
    assert_eq!(evaluate(&a_and_b, &m).unwrap(), ModelValue::boolean(false));
}

#[test]
fn test_boolean_or() {
    let m = model(&[("a", ModelValue::boolean(false)), ("b", ModelValue::boolean(true))]);
    let expression = Expression::BooleanOr {
        values: vec![id("a"), id("b")],
    };
    assert_eq!(evaluate(&expression, &m).unwrap(), ModelValue::boolean(true));
}

#[test]
fn test_boolean_and_requires_operands() {
    let m = model(&[]);
    let expression = Expression::BooleanAnd { values: vec![] };
    assert!(matches!(
        evaluate(&expression, &m),
        Err(EvalError::InvalidOperands { .. })
    ));
}

#[test]
fn test_boolean_not_is_element_wise() {
    let m = model(&[("flags", ModelValue::Booleans(vec![true, false, true]))]);
    let expression = Expression::BooleanNot { value: id("flags") };
    assert_eq!(
        evaluate(&expression, &m).unwrap(),
        ModelValue::Booleans(vec![false, true, false])
    );
}

#[test]
fn test_boolean_op_rejects_ints() {
    let m = model(&[("n", ModelValue::int(1))]);
    let expression = Expression::BooleanNot { value: id("n") };
    assert_eq!(
        evaluate(&expression, &m),
        Err(EvalError::KindMismatch {
            operation: "boolean_not",
            expected: "booleans".to_string(),
            found: ValueKind::Ints,
        })
    );
}

#[test]
fn test_integer_sum() {
    let m = model(&[("counter", ModelValue::int(2)), ("more", ModelValue::Ints(vec![3, 4]))]);
    let expression = Expression::IntegerSum {
        values: vec![id("counter"), id("more"), lit(ModelValue::int(1))],
    };
    assert_eq!(evaluate(&expression, &m).unwrap(), ModelValue::int(10));
}

#[test]
fn test_integer_sum_overflow() {
    let m = model(&[]);
    let expression = Expression::IntegerSum {
        values: vec![lit(ModelValue::int(i64::MAX)), lit(ModelValue::int(1))],
    };
    assert!(matches!(evaluate(&expression, &m), Err(EvalError::Overflow { .. })));
}

#[test]
fn test_unset_reference_fails() {
    let m = model(&[]);
    let expression = Expression::IntegerSum {
        values: vec![id("missing")],
    };
    assert_eq!(
        evaluate(&expression, &m),
        Err(EvalError::UnknownIdentifier {
            identifier: "missing".to_string()
        })
    );
}

#[test]
fn test_comparison_ordering_modes() {
    let m = model(&[("counter", ModelValue::int(3))]);
    let target = || lit(ModelValue::int(3));

    let cases = [
        (ComparisonMode::Less, false),
        (ComparisonMode::LessOrEqual, true),
        (ComparisonMode::Greater, false),
        (ComparisonMode::GreaterOrEqual, true),
        (ComparisonMode::Equal, true),
        (ComparisonMode::NotEqual, false),
    ];
    for (mode, expected) in cases {
        let result = evaluate(&compare(id("counter"), target(), mode), &m).unwrap();
        assert_eq!(result, ModelValue::boolean(expected), "mode {:?}", mode);
    }
}

#[test]
fn test_comparison_of_strings_and_dates() {
    let m = model(&[
        ("a", ModelValue::string("apple")),
        ("b", ModelValue::string("banana")),
        ("d1", ModelValue::date(2020, 1, 31)),
        ("d2", ModelValue::date(2020, 2, 1)),
    ]);
    assert_eq!(
        evaluate(&compare(id("a"), id("b"), ComparisonMode::Less), &m).unwrap(),
        ModelValue::boolean(true)
    );
    assert_eq!(
        evaluate(&compare(id("d2"), id("d1"), ComparisonMode::Greater), &m).unwrap(),
        ModelValue::boolean(true)
    );
}

#[test]
fn test_equality_on_lists_of_any_kind() {
    let chips = ModelValue::UserActions(vec![UserAction::new("done", "Done")]);
    let m = model(&[("chips", chips.clone())]);
    assert_eq!(
        evaluate(&compare(id("chips"), lit(chips), ComparisonMode::Equal), &m).unwrap(),
        ModelValue::boolean(true)
    );
}

#[test]
fn test_equality_with_unset_is_false() {
    let m = model(&[("empty", ModelValue::Strings(vec![]))]);
    assert_eq!(
        evaluate(&compare(id("empty"), id("unset"), ComparisonMode::Equal), &m).unwrap(),
        ModelValue::boolean(false)
    );
    assert_eq!(
        evaluate(&compare(id("empty"), id("unset"), ComparisonMode::NotEqual), &m).unwrap(),
        ModelValue::boolean(true)
    );
}

#[test]
fn test_comparison_kind_mismatch() {
    let m = model(&[("n", ModelValue::int(1)), ("s", ModelValue::string("1"))]);
    assert!(matches!(
        evaluate(&compare(id("n"), id("s"), ComparisonMode::Equal), &m),
        Err(EvalError::KindMismatch { .. })
    ));
}

#[test]
fn test_ordering_needs_single_elements() {
    let m = model(&[("n", ModelValue::Ints(vec![1, 2]))]);
    assert!(matches!(
        evaluate(&compare(id("n"), lit(ModelValue::int(1)), ComparisonMode::Less), &m),
        Err(EvalError::InvalidOperands { .. })
    ));
    let booleans = model(&[("b", ModelValue::boolean(true))]);
    assert!(matches!(
        evaluate(
            &compare(id("b"), lit(ModelValue::boolean(false)), ComparisonMode::Greater),
            &booleans
        ),
        Err(EvalError::InvalidOperands { .. })
    ));
}

#[test]
fn test_to_string_without_format() {
    let m = model(&[
        ("n", ModelValue::Ints(vec![1, -2])),
        ("b", ModelValue::Booleans(vec![true, false])),
    ]);
    let ints = Expression::ToString {
        value: id("n"),
        format: None,
    };
    assert_eq!(evaluate(&ints, &m).unwrap(), ModelValue::strings(["1", "-2"]));

    let booleans = Expression::ToString {
        value: id("b"),
        format: None,
    };
    assert_eq!(
        evaluate(&booleans, &m).unwrap(),
        ModelValue::strings(["true", "false"])
    );
}

#[test]
fn test_to_string_date_format() {
    let m = model(&[(
        "date",
        ModelValue::Dates(vec![Date::new(2020, 3, 13), Date::new(2020, 12, 31)]),
    )]);
    let expression = Expression::ToString {
        value: id("date"),
        format: Some(ToStringFormat::DateFormat("EEE, MMM d y".to_string())),
    };
    assert_eq!(
        evaluate(&expression, &m).unwrap(),
        ModelValue::strings(["Fri, Mar 13 2020", "Thu, Dec 31 2020"])
    );
}

#[test]
fn test_to_string_autofill_format() {
    let profile = AutofillEntry::new("p1")
        .with_field("name", "Jane")
        .with_field("email", "jane@example.com");
    let m = model(&[
        ("profiles", ModelValue::AutofillEntries(vec![profile])),
        ("expiry", ModelValue::date(2025, 9, 1)),
    ]);

    let profiles = Expression::ToString {
        value: id("profiles"),
        format: Some(ToStringFormat::AutofillFormat("${name} <${email}>".to_string())),
    };
    assert_eq!(
        evaluate(&profiles, &m).unwrap(),
        ModelValue::string("Jane <jane@example.com>")
    );

    let expiry = Expression::ToString {
        value: id("expiry"),
        format: Some(ToStringFormat::AutofillFormat("${month2}/${year2}".to_string())),
    };
    assert_eq!(evaluate(&expiry, &m).unwrap(), ModelValue::string("09/25"));
}

#[test]
fn test_date_format_rejects_non_dates() {
    let m = model(&[("s", ModelValue::string("2020"))]);
    let expression = Expression::ToString {
        value: id("s"),
        format: Some(ToStringFormat::DateFormat("y".to_string())),
    };
    assert!(matches!(
        evaluate(&expression, &m),
        Err(EvalError::KindMismatch { .. })
    ));
}

#[test]
fn test_autofill_field_lookup() {
    let entries = vec![
        AutofillEntry::new("a").with_field("name", "Ann"),
        AutofillEntry::new("b").with_field("name", "Bob"),
    ];
    let m = model(&[("profiles", ModelValue::AutofillEntries(entries))]);
    let expression = Expression::AutofillField {
        value: id("profiles"),
        field: "name".to_string(),
    };
    assert_eq!(evaluate(&expression, &m).unwrap(), ModelValue::strings(["Ann", "Bob"]));

    let missing = Expression::AutofillField {
        value: id("profiles"),
        field: "phone".to_string(),
    };
    assert!(matches!(evaluate(&missing, &m), Err(EvalError::MissingField { .. })));
}

#[test]
fn test_credit_card_response() {
    let card = AutofillEntry::new("card").with_field("card_number", "5105105105105100");
    let m = model(&[("card", ModelValue::AutofillEntries(vec![card]))]);
    let expression = Expression::CreateCreditCardResponse { value: id("card") };
    assert_eq!(
        evaluate(&expression, &m).unwrap(),
        ModelValue::CreditCardResponses(vec![CreditCardResponse {
            network: "mastercard".to_string()
        }])
    );
}

#[test]
fn test_indexed_reference() {
    let m = model(&[("list", ModelValue::strings(["x", "y", "z"]))]);
    let expression = Expression::ToString {
        value: id("list[2]"),
        format: None,
    };
    assert_eq!(evaluate(&expression, &m).unwrap(), ModelValue::string("z"));

    let out_of_range = Expression::ToString {
        value: id("list[3]"),
        format: None,
    };
    assert!(matches!(
        evaluate(&out_of_range, &m),
        Err(EvalError::UnknownIdentifier { .. })
    ));
}

#[test]
fn test_split_indexed_identifier() {
    assert_eq!(split_indexed_identifier("list[12]"), ("list", Some(12)));
    assert_eq!(split_indexed_identifier("list"), ("list", None));
    assert_eq!(split_indexed_identifier("list[x]"), ("list[x]", None));
    assert_eq!(split_indexed_identifier("grid[1][2]"), ("grid[1]", Some(2)));
}
