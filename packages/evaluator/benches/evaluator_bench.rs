use criterion::{black_box, criterion_group, criterion_main, Criterion};
use genui_evaluator::evaluate;
use genui_proto::{
    AutofillEntry, ComparisonMode, Date, Expression, ModelValue, ToStringFormat, ValueReference,
};
use std::collections::HashMap;

fn evaluate_counter_comparison(c: &mut Criterion) {
    let mut model = HashMap::new();
    model.insert("counter".to_string(), ModelValue::int(2));

    let sum = Expression::IntegerSum {
        values: vec![
            ValueReference::model("counter"),
            ValueReference::value(ModelValue::int(1)),
        ],
    };
    let comparison = Expression::Comparison {
        value_a: ValueReference::model("counter"),
        value_b: ValueReference::value(ModelValue::int(3)),
        mode: ComparisonMode::GreaterOrEqual,
    };

    c.bench_function("evaluate_counter_comparison", |b| {
        b.iter(|| {
            let _ = evaluate(black_box(&sum), &model);
            evaluate(black_box(&comparison), &model)
        })
    });
}

fn evaluate_formatting(c: &mut Criterion) {
    let mut model = HashMap::new();
    let dates: Vec<Date> = (1..=28).map(|day| Date::new(2020, 2, day)).collect();
    model.insert("dates".to_string(), ModelValue::Dates(dates));
    let profiles: Vec<AutofillEntry> = (0..50)
        .map(|i| {
            AutofillEntry::new(format!("guid-{}", i))
                .with_field("name", format!("Person {}", i))
                .with_field("email", format!("person{}@example.com", i))
        })
        .collect();
    model.insert("profiles".to_string(), ModelValue::AutofillEntries(profiles));

    let date_strings = Expression::ToString {
        value: ValueReference::model("dates"),
        format: Some(ToStringFormat::DateFormat("EEE, MMM d y".to_string())),
    };
    let profile_strings = Expression::ToString {
        value: ValueReference::model("profiles"),
        format: Some(ToStringFormat::AutofillFormat("${name} <${email}>".to_string())),
    };

    c.bench_function("evaluate_date_format", |b| {
        b.iter(|| evaluate(black_box(&date_strings), &model))
    });
    c.bench_function("evaluate_autofill_format", |b| {
        b.iter(|| evaluate(black_box(&profile_strings), &model))
    });
}

criterion_group!(benches, evaluate_counter_comparison, evaluate_formatting);
criterion_main!(benches);
