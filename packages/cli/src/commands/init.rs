use crate::config::{Config, DEFAULT_CONFIG_NAME};
use crate::script::{Script, Step};
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use genui_engine::UiEvent;
use genui_proto::{
    ActionStatus, Callback, InteractionDefinition, ListPopup, ModelEntry, ModelValue,
    TriggerEvent, UiDefinition, UserAction, ValueReference, ViewDefinition,
};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Directory for definitions and scripts
    #[arg(short, long, default_value = "ui")]
    pub ui_dir: String,

    /// Force overwrite existing config
    #[arg(short, long)]
    pub force: bool,
}

/// Fruit picker: a list popup plus a "Done" chip that ends the action
pub fn example_definition() -> UiDefinition {
    UiDefinition::new(
        ViewDefinition::container(vec![
            ViewDefinition::text("<b>Pick a fruit</b>"),
            ViewDefinition::bound_text("choice").with_identifier("choice_view"),
            ViewDefinition::text("Choose...").with_identifier("open"),
        ])
        .with_identifier("root"),
    )
    .with_model(ModelEntry::new(
        "fruits",
        ModelValue::strings(["Apple", "Banana", "Cherry"]),
    ))
    .with_model(ModelEntry::new(
        "chips",
        ModelValue::UserActions(vec![UserAction::new("done", "Done")]),
    ))
    .with_interaction(
        InteractionDefinition::new(TriggerEvent::view_clicked("open")).with_callback(
            Callback::ShowListPopup(ListPopup {
                item_names: ValueReference::model("fruits"),
                selected_item_indices_model_identifier: "selected".to_string(),
                selected_item_names_model_identifier: Some("choice".to_string()),
                allow_multiselect: false,
            }),
        ),
    )
    .with_interaction(
        InteractionDefinition::new(TriggerEvent::value_changed("chips"))
            .with_callback(Callback::set_user_actions(ValueReference::model("chips"))),
    )
    .with_interaction(
        InteractionDefinition::new(TriggerEvent::user_action_called("done"))
            .with_callback(Callback::end_action(ActionStatus::ActionApplied)),
    )
}

pub fn example_script() -> Script {
    Script {
        outputs: vec!["selected".to_string(), "choice".to_string()],
        steps: vec![
            Step::Event(UiEvent::click("open")),
            Step::Event(UiEvent::ListPopupClosed {
                request_id: None,
                selected_indices: Some(vec![1]),
            }),
            Step::Event(UiEvent::user_action("done")),
        ],
    }
}

pub fn init(args: InitArgs, cwd: &str) -> Result<()> {
    let config_path = PathBuf::from(cwd).join(DEFAULT_CONFIG_NAME);

    if config_path.exists() && !args.force {
        println!(
            "{} {} already exists",
            "⚠️".yellow(),
            DEFAULT_CONFIG_NAME.bright_white()
        );
        println!("Use --force to overwrite");
        return Ok(());
    }

    println!("{}", "📝 Initializing genui project...".bright_blue().bold());

    let ui_dir = PathBuf::from(cwd).join(&args.ui_dir);
    if !ui_dir.exists() {
        fs::create_dir_all(&ui_dir)?;
        println!("  {} Created {}/", "✓".green(), args.ui_dir);
    }

    let example_file = ui_dir.join("example.json");
    if !example_file.exists() {
        fs::write(&example_file, serde_json::to_string_pretty(&example_definition())?)?;
        println!("  {} Created example.json", "✓".green());
    }
    let script_file = ui_dir.join("example.script.json");
    if !script_file.exists() {
        fs::write(&script_file, serde_json::to_string_pretty(&example_script())?)?;
        println!("  {} Created example.script.json", "✓".green());
    }

    let config = Config {
        output_dir: Some("out".to_string()),
        ..Config::default()
    };
    fs::write(&config_path, serde_json::to_string_pretty(&config)?)?;
    println!("  {} Created {}", "✓".green(), DEFAULT_CONFIG_NAME);

    println!();
    println!("{}", "✅ Project initialized!".green().bold());
    println!();
    println!("Next steps:");
    println!("  1. Edit {}/example.json", args.ui_dir);
    println!(
        "  2. Run: genui run {0}/example.json --script {0}/example.script.json",
        args.ui_dir
    );
    println!("  3. Check outputs in out/");

    Ok(())
}
