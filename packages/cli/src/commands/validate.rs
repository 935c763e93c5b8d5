use crate::script::load_definition;
use anyhow::{anyhow, Result};
use clap::Args;
use colored::Colorize;
use genui_engine::validate;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct ValidateArgs {
    /// UI definitions to check (JSON)
    #[arg(required = true)]
    pub definitions: Vec<PathBuf>,
}

pub fn validate_definitions(args: ValidateArgs, _cwd: &str) -> Result<()> {
    println!("{}", "🔍 Validating definitions...".bright_blue().bold());

    let mut error_count = 0;
    for path in &args.definitions {
        let checked = load_definition(path)
            .map_err(anyhow::Error::from)
            .and_then(|definition| validate(&definition).map_err(anyhow::Error::from));
        match checked {
            Ok(report) => println!(
                "  {} {} {}",
                "✓".green(),
                path.display(),
                format!(
                    "({} views, {} interactions, {} callbacks, {} nested definitions)",
                    report.views, report.interactions, report.callbacks, report.nested_definitions
                )
                .dimmed()
            ),
            Err(e) => {
                error_count += 1;
                eprintln!("  {} {} - {}", "✗".red(), path.display(), e.to_string().red());
            }
        }
    }

    println!();
    if error_count == 0 {
        println!(
            "{} {} definitions are valid",
            "✅".green(),
            args.definitions.len()
        );
        Ok(())
    } else {
        Err(anyhow!(
            "{} of {} definitions are invalid",
            error_count,
            args.definitions.len()
        ))
    }
}
