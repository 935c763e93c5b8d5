/// Runtime tests: propagation, error isolation, loops and teardown
use crate::*;
use genui_proto::{
    Callback, CallbackDefinition, ComparisonMode, Expression, ForEach, InteractionDefinition,
    ModelEntry, ModelValue, NestedUi, TriggerEvent, UiDefinition, UiRequest, ValueReference,
    ViewDefinition,
};

fn button_ui(callbacks: Vec<Callback>) -> UiDefinition {
    let mut interaction = InteractionDefinition::new(TriggerEvent::view_clicked("button"));
    for callback in callbacks {
        interaction = interaction.with_callback(callback);
    }
    UiDefinition::new(
        ViewDefinition::container(vec![
            ViewDefinition::text("Go").with_identifier("button"),
            ViewDefinition::container(vec![]).with_identifier("slot"),
        ])
        .with_identifier("root"),
    )
    .with_interaction(interaction)
}

fn literal(value: ModelValue) -> ValueReference {
    ValueReference::value(value)
}

fn start(definition: UiDefinition) -> (Runtime<RecordingHost>, UiHandle) {
    let mut runtime = Runtime::new(RecordingHost::new());
    let handle = runtime.load(UiRequest::new(definition)).unwrap();
    (runtime, handle)
}

fn diagnostic_kinds(runtime: &Runtime<RecordingHost>) -> Vec<DiagnosticKind> {
    runtime
        .host()
        .diagnostics()
        .into_iter()
        .map(|diagnostic| diagnostic.kind)
        .collect()
}

#[test]
fn test_mirrored_identifiers_converge() {
    let definition = button_ui(vec![Callback::set_value(
        "a",
        literal(ModelValue::string("Hello World")),
    )])
    .with_interaction(
        InteractionDefinition::new(TriggerEvent::value_changed("a"))
            .with_callback(Callback::set_value("b", ValueReference::model("a"))),
    )
    .with_interaction(
        InteractionDefinition::new(TriggerEvent::value_changed("b"))
            .with_callback(Callback::set_value("a", ValueReference::model("b"))),
    );
    let (mut runtime, handle) = start(definition);

    let outcome = runtime.dispatch(handle, UiEvent::click("button")).unwrap();
    assert_eq!(outcome, DispatchOutcome::Processed { events: 2 });
    assert_eq!(runtime.value(handle, "a"), Some(ModelValue::string("Hello World")));
    assert_eq!(runtime.value(handle, "b"), Some(ModelValue::string("Hello World")));
    assert!(runtime.host().diagnostics().is_empty());
}

#[test]
fn test_runaway_propagation_is_cut_off() {
    let definition = button_ui(vec![])
        .with_model(ModelEntry::new("counter", ModelValue::int(0)))
        .with_interaction(
            InteractionDefinition::new(TriggerEvent::value_changed("counter")).with_callback(
                Callback::compute(
                    "counter",
                    Expression::IntegerSum {
                        values: vec![
                            ValueReference::model("counter"),
                            literal(ModelValue::int(1)),
                        ],
                    },
                ),
            ),
        );
    let config = EngineConfig {
        max_events_per_dispatch: 20,
        ..EngineConfig::default()
    };
    let mut runtime = Runtime::with_config(RecordingHost::new(), config);
    let handle = runtime.load(UiRequest::new(definition)).unwrap();

    assert_eq!(runtime.value(handle, "counter"), Some(ModelValue::int(20)));
    assert_eq!(diagnostic_kinds(&runtime), vec![DiagnosticKind::PropagationLimit]);
}

#[test]
fn test_failing_callback_does_not_abort_chain() {
    let definition = button_ui(vec![
        Callback::set_value("copy", ValueReference::model("missing")),
        Callback::set_value("after", literal(ModelValue::boolean(true))),
    ]);
    let (mut runtime, handle) = start(definition);
    runtime.dispatch(handle, UiEvent::click("button")).unwrap();

    assert_eq!(runtime.value(handle, "copy"), None);
    assert_eq!(runtime.value(handle, "after"), Some(ModelValue::boolean(true)));

    let diagnostics = runtime.host().diagnostics();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].kind, DiagnosticKind::UnknownIdentifier);
    assert_eq!(diagnostics[0].callback.as_deref(), Some("set_value"));
}

#[test]
fn test_kind_of_identifier_cannot_change() {
    let definition = button_ui(vec![Callback::set_value("flag", literal(ModelValue::int(1)))])
        .with_model(ModelEntry::new("flag", ModelValue::boolean(true)));
    let (mut runtime, handle) = start(definition);
    runtime.dispatch(handle, UiEvent::click("button")).unwrap();

    assert_eq!(runtime.value(handle, "flag"), Some(ModelValue::boolean(true)));
    assert_eq!(diagnostic_kinds(&runtime), vec![DiagnosticKind::KindMismatch]);
}

#[test]
fn test_failed_computation_leaves_result_unset() {
    let definition = button_ui(vec![Callback::compute(
        "result",
        Expression::BooleanAnd {
            values: vec![ValueReference::model("number")],
        },
    )])
    .with_model(ModelEntry::new("number", ModelValue::int(3)));
    let (mut runtime, handle) = start(definition);
    runtime.dispatch(handle, UiEvent::click("button")).unwrap();

    assert_eq!(runtime.value(handle, "result"), None);
    assert_eq!(diagnostic_kinds(&runtime), vec![DiagnosticKind::KindMismatch]);
}

#[test]
fn test_unset_operands_compare_unequal() {
    let definition = button_ui(vec![Callback::compute(
        "same",
        Expression::Comparison {
            value_a: ValueReference::model("missing"),
            value_b: literal(ModelValue::string("x")),
            mode: ComparisonMode::Equal,
        },
    )]);
    let (mut runtime, handle) = start(definition);
    runtime.dispatch(handle, UiEvent::click("button")).unwrap();
    assert_eq!(runtime.value(handle, "same"), Some(ModelValue::boolean(false)));
}

#[test]
fn test_for_each_writes_one_identifier_per_element() {
    let definition = button_ui(vec![Callback::ForEach(ForEach {
        loop_counter: "i".to_string(),
        loop_value_model_identifier: "list".to_string(),
        callbacks: vec![CallbackDefinition::new(Callback::set_value(
            "result_${i}",
            ValueReference::model("list[${i}]"),
        ))],
    })])
    .with_model(ModelEntry::new("list", ModelValue::strings(["a", "b", "c"])));
    let (mut runtime, handle) = start(definition);
    runtime.dispatch(handle, UiEvent::click("button")).unwrap();

    let requested: Vec<String> = ["result_0", "result_1", "result_2", "result_3"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let outputs = runtime.get_output(handle, &requested).unwrap();
    assert_eq!(
        outputs,
        vec![
            ModelEntry::new("result_0", ModelValue::string("a")),
            ModelEntry::new("result_1", ModelValue::string("b")),
            ModelEntry::new("result_2", ModelValue::string("c")),
        ]
    );
}

#[test]
fn test_nested_loops_multiply() {
    let inner = Callback::ForEach(ForEach {
        loop_counter: "j".to_string(),
        loop_value_model_identifier: "columns".to_string(),
        callbacks: vec![CallbackDefinition::new(Callback::set_value(
            "cell_${i}_${j}",
            literal(ModelValue::boolean(true)),
        ))],
    });
    let definition = button_ui(vec![Callback::ForEach(ForEach {
        loop_counter: "i".to_string(),
        loop_value_model_identifier: "rows".to_string(),
        callbacks: vec![CallbackDefinition::new(inner)],
    })])
    .with_model(ModelEntry::new("rows", ModelValue::Ints(vec![0, 0])))
    .with_model(ModelEntry::new("columns", ModelValue::Ints(vec![0, 0, 0])));
    let (mut runtime, handle) = start(definition);
    runtime.dispatch(handle, UiEvent::click("button")).unwrap();

    for i in 0..2 {
        for j in 0..3 {
            assert_eq!(
                runtime.value(handle, &format!("cell_{}_{}", i, j)),
                Some(ModelValue::boolean(true))
            );
        }
    }
    assert_eq!(runtime.value(handle, "cell_2_0"), None);
}

#[test]
fn test_for_each_over_empty_collection() {
    let definition = button_ui(vec![Callback::ForEach(ForEach {
        loop_counter: "i".to_string(),
        loop_value_model_identifier: "list".to_string(),
        callbacks: vec![],
    })])
    .with_model(ModelEntry::new("list", ModelValue::Strings(vec![])));
    let (mut runtime, handle) = start(definition);
    runtime.dispatch(handle, UiEvent::click("button")).unwrap();
    assert_eq!(
        diagnostic_kinds(&runtime),
        vec![DiagnosticKind::EmptyCollectionAccess]
    );
}

#[test]
fn test_end_action_stops_chain() {
    let definition = button_ui(vec![
        Callback::set_value("before", literal(ModelValue::int(1))),
        Callback::end_action(genui_proto::ActionStatus::ActionApplied),
        Callback::set_value("after", literal(ModelValue::int(1))),
    ]);
    let mut runtime = Runtime::new(RecordingHost::new());
    let handle = runtime
        .load(UiRequest::new(definition).with_output("before").with_output("after"))
        .unwrap();

    runtime.dispatch(handle, UiEvent::click("button")).unwrap();
    assert!(runtime.is_ended(handle));
    assert_eq!(runtime.value(handle, "after"), None);

    let result = runtime.host().ended(handle).unwrap();
    assert_eq!(result.outputs, vec![ModelEntry::new("before", ModelValue::int(1))]);

    let outcome = runtime.dispatch(handle, UiEvent::click("button")).unwrap();
    assert!(!outcome.is_processed());
}

#[test]
fn test_guard_skips_interaction() {
    let definition = UiDefinition::new(ViewDefinition::text("Go").with_identifier("button"))
        .with_model(ModelEntry::new("enabled", ModelValue::boolean(false)))
        .with_interaction(
            InteractionDefinition::new(TriggerEvent::view_clicked("button"))
                .with_guard("enabled")
                .with_callback(Callback::set_value("clicked", literal(ModelValue::boolean(true)))),
        );
    let (mut runtime, handle) = start(definition);
    runtime.dispatch(handle, UiEvent::click("button")).unwrap();
    assert_eq!(runtime.value(handle, "clicked"), None);
}

#[test]
fn test_unknown_handle() {
    let mut runtime = Runtime::new(RecordingHost::new());
    assert_eq!(
        runtime.dispatch(UiHandle(42), UiEvent::click("x")),
        Err(EngineError::UnknownHandle(UiHandle(42)))
    );
}

#[test]
fn test_rejected_load_leaves_nothing_behind() {
    let definition = UiDefinition::new(ViewDefinition::container(vec![
        ViewDefinition::text("a").with_identifier("same"),
        ViewDefinition::text("b").with_identifier("same"),
    ]));
    let mut runtime = Runtime::new(RecordingHost::new());
    assert!(matches!(
        runtime.load(UiRequest::new(definition)),
        Err(EngineError::Load(LoadError::DuplicateViewIdentifier { .. }))
    ));
    assert!(runtime.handles().is_empty());
    assert!(runtime.scopes.is_empty());
}

#[test]
fn test_destroy_tears_down_nested_scopes() {
    let nested = UiDefinition::new(ViewDefinition::text("Child").with_identifier("child_text"));
    let definition = button_ui(vec![Callback::CreateNestedUi(NestedUi {
        ui_identifier: "child".to_string(),
        parent_view_identifier: "slot".to_string(),
        definition: Box::new(nested),
        output_model_identifiers: vec![],
    })]);
    let (mut runtime, handle) = start(definition);
    runtime.dispatch(handle, UiEvent::click("button")).unwrap();
    assert_eq!(runtime.scopes.len(), 2);

    runtime.destroy(handle).unwrap();
    assert!(runtime.scopes.is_empty());
    assert!(runtime.handles().is_empty());
    assert!(runtime.destroy(handle).is_err());
}

#[test]
fn test_diagnostics_can_stay_local() {
    let definition = button_ui(vec![Callback::set_value("x", ValueReference::model("missing"))]);
    let config = EngineConfig {
        report_diagnostics: false,
        ..EngineConfig::default()
    };
    let mut runtime = Runtime::with_config(RecordingHost::new(), config);
    let handle = runtime.load(UiRequest::new(definition)).unwrap();
    runtime.dispatch(handle, UiEvent::click("button")).unwrap();
    assert!(runtime.host().diagnostics().is_empty());
}

#[test]
fn test_only_nested_scopes_forward_outputs() {
    let nested = UiDefinition::new(ViewDefinition::text("Child").with_identifier("child_text"))
        .with_model(ModelEntry::new("picked", ModelValue::int(1)));
    let definition = button_ui(vec![Callback::CreateNestedUi(NestedUi {
        ui_identifier: "child".to_string(),
        parent_view_identifier: "slot".to_string(),
        definition: Box::new(nested),
        output_model_identifiers: vec!["picked".to_string()],
    })]);
    let mut runtime = Runtime::new(RecordingHost::new());
    let handle = runtime
        .load(UiRequest::new(definition).with_output("picked"))
        .unwrap();
    runtime.dispatch(handle, UiEvent::click("button")).unwrap();

    let is_output = |listener: &Listener| matches!(listener, Listener::Output(_));
    let root = runtime.uis[&handle].root;
    assert!(!runtime.store(root).unwrap().listeners("picked").iter().any(is_output));

    let child = runtime
        .scopes
        .values()
        .find(|scope| matches!(scope.kind, crate::scope::ScopeKind::Nested { .. }))
        .map(|scope| scope.id)
        .unwrap();
    assert!(runtime.store(child).unwrap().listeners("picked").iter().any(is_output));
    assert_eq!(runtime.value(handle, "picked"), Some(ModelValue::int(1)));
}

#[test]
fn test_nested_radio_group_stays_exclusive() {
    let nested = UiDefinition::new(ViewDefinition::container(vec![
        ViewDefinition::radio_button("Small", "size", "small"),
        ViewDefinition::radio_button("Large", "size", "large"),
    ]))
    .with_model(ModelEntry::new("small", ModelValue::boolean(true)))
    .with_model(ModelEntry::new("large", ModelValue::boolean(true)));
    let definition = button_ui(vec![Callback::CreateNestedUi(NestedUi {
        ui_identifier: "child".to_string(),
        parent_view_identifier: "slot".to_string(),
        definition: Box::new(nested),
        output_model_identifiers: vec![],
    })]);
    let (mut runtime, handle) = start(definition);
    runtime.dispatch(handle, UiEvent::click("button")).unwrap();

    assert_eq!(
        runtime.nested_value(handle, "child", "small"),
        Some(ModelValue::boolean(true))
    );
    assert_eq!(
        runtime.nested_value(handle, "child", "large"),
        Some(ModelValue::boolean(false))
    );
    assert_eq!(runtime.value(handle, "large"), None);
}
