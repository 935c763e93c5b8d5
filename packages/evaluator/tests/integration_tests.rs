//! Integration tests for the evaluator crate
//!
//! Expressions are chained the way a UI would chain compute callbacks: each result is
//! stored back into the model before the next expression reads it.

use genui_evaluator::{evaluate, template, EvalError, Evaluator};
use genui_proto::{
    AutofillEntry, ComparisonMode, Date, Expression, ModelValue, ToStringFormat, ValueReference,
};
use std::collections::BTreeMap;

fn id(identifier: &str) -> ValueReference {
    ValueReference::model(identifier)
}

fn lit(value: ModelValue) -> ValueReference {
    ValueReference::value(value)
}

#[test]
fn test_checkout_summary_pipeline() {
    let mut model = BTreeMap::new();
    model.insert(
        "cards".to_string(),
        ModelValue::AutofillEntries(vec![AutofillEntry::new("card-1")
            .with_field("name", "Jane Doe")
            .with_field("card_number", "4111111111111111")]),
    );
    model.insert("delivery".to_string(), ModelValue::Dates(vec![Date::new(2020, 3, 13)]));
    model.insert("quantity".to_string(), ModelValue::int(2));

    let steps = [
        (
            "holder",
            Expression::AutofillField {
                value: id("cards"),
                field: "name".to_string(),
            },
        ),
        (
            "delivery_text",
            Expression::ToString {
                value: id("delivery"),
                format: Some(ToStringFormat::DateFormat("EEE, MMM d y".to_string())),
            },
        ),
        (
            "total",
            Expression::IntegerSum {
                values: vec![id("quantity"), lit(ModelValue::int(1))],
            },
        ),
        (
            "bulk",
            Expression::Comparison {
                value_a: id("total"),
                value_b: lit(ModelValue::int(3)),
                mode: ComparisonMode::GreaterOrEqual,
            },
        ),
        ("response", Expression::CreateCreditCardResponse { value: id("cards") }),
    ];
    for (target, expression) in &steps {
        let value = evaluate(expression, &model).unwrap();
        model.insert(target.to_string(), value);
    }

    assert_eq!(model["holder"], ModelValue::string("Jane Doe"));
    assert_eq!(model["delivery_text"], ModelValue::string("Fri, Mar 13 2020"));
    assert_eq!(model["total"], ModelValue::int(3));
    assert_eq!(model["bulk"], ModelValue::boolean(true));
    assert!(matches!(&model["response"], ModelValue::CreditCardResponses(r) if r[0].network == "visa"));
}

#[test]
fn test_indexed_references_resolve_single_elements() {
    let mut model = BTreeMap::new();
    model.insert("names".to_string(), ModelValue::strings(["Ann", "Bob", "Cid"]));
    let evaluator = Evaluator::new(&model);

    assert_eq!(evaluator.resolve(&id("names[1]")).unwrap(), ModelValue::string("Bob"));
    assert!(matches!(
        evaluator.resolve(&id("names[3]")),
        Err(EvalError::UnknownIdentifier { .. })
    ));
}

#[test]
fn test_template_rendering() {
    let rendered = template::render("${greeting}, ${name}!", |name| match name {
        "greeting" => Some("Hello".to_string()),
        "name" => Some("Ada".to_string()),
        _ => None,
    });
    assert_eq!(rendered, Ok("Hello, Ada!".to_string()));

    let missing = template::render("${unknown}", |_| None);
    assert_eq!(missing, Err("unknown".to_string()));

    assert_eq!(template::substitute("item_${i}_${j}", "i", "4"), "item_4_${j}");
}
