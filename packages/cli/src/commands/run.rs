use crate::config::Config;
use crate::script::{apply_step, load_definition, replay, Script, TranscriptEntry};
use anyhow::{anyhow, Result};
use clap::Args;
use colored::Colorize;
use genui_engine::{
    spawn_element_poller, DispatchOutcome, HostCall, RecordingHost, Runtime, UiHandle,
};
use genui_proto::{ModelEntry, UiRequest};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Args)]
pub struct RunArgs {
    /// UI definition (JSON)
    pub definition: PathBuf,

    /// Event script to replay (JSON)
    #[arg(short, long)]
    pub script: Option<PathBuf>,

    /// Extra output identifiers to collect
    #[arg(short, long = "output")]
    pub outputs: Vec<String>,

    /// Poll element checks in the background instead of after each element step
    #[arg(long)]
    pub live: bool,

    /// Print the final rendered view as JSON
    #[arg(long)]
    pub render: bool,

    /// Output directory (overrides config)
    #[arg(long)]
    pub out_dir: Option<String>,
}

pub fn run(args: RunArgs, cwd: &str) -> Result<()> {
    let config = Config::load(cwd)?;
    let definition = load_definition(&args.definition)?;
    let script = match &args.script {
        Some(path) => Script::load(path)?,
        None => Script::default(),
    };

    let mut outputs = script.outputs.clone();
    outputs.extend(args.outputs.iter().cloned());
    let request = outputs
        .iter()
        .fold(UiRequest::new(definition), |request, id| request.with_output(id.clone()));

    println!(
        "{} {}",
        "▶ Running".bright_blue().bold(),
        args.definition.display()
    );

    let mut runtime = Runtime::with_config(RecordingHost::new(), config.engine.clone());
    let handle = runtime.load(request)?;
    print_calls(&runtime.host().calls);

    let (runtime, transcript) = if args.live {
        replay_live(runtime, handle, &script, config.poll_interval_ms)?
    } else {
        let transcript = replay(&mut runtime, handle, &script)?;
        (runtime, transcript)
    };
    for entry in &transcript {
        print_entry(entry);
    }

    let result = match runtime.host().ended(handle) {
        Some(result) => {
            println!("{} {:?}", "■ Ended".green().bold(), result.status);
            result.outputs.clone()
        }
        None => {
            println!("{}", "■ Still running".yellow().bold());
            runtime.get_output(handle, &outputs)?
        }
    };

    if args.render {
        if let Some(view) = runtime.snapshot(handle) {
            println!("{}", serde_json::to_string_pretty(&view)?);
        }
    }

    let out_dir = args
        .out_dir
        .map(|dir| PathBuf::from(cwd).join(dir))
        .or_else(|| config.get_output_dir(cwd));
    match out_dir {
        Some(dir) => {
            let path = write_outputs(&dir, &args.definition, &result)?;
            println!("  {} Outputs written to {}", "✓".green(), path.display());
        }
        None => println!("{}", serde_json::to_string_pretty(&result)?),
    }

    Ok(())
}

/// Replay against a background poller; element steps only change the simulated page
fn replay_live(
    runtime: Runtime<RecordingHost>,
    handle: UiHandle,
    script: &Script,
    poll_interval_ms: u64,
) -> Result<(Runtime<RecordingHost>, Vec<TranscriptEntry>)> {
    let period = Duration::from_millis(poll_interval_ms.max(1));
    let tokio_runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    tokio_runtime.block_on(async move {
        let runtime = Arc::new(tokio::sync::Mutex::new(runtime));
        let poller = spawn_element_poller(runtime.clone(), handle, period);
        info!(%handle, ?period, "Element poller started");

        let mut transcript = Vec::new();
        for step in &script.steps {
            let entry = {
                let mut runtime = runtime.lock().await;
                apply_step(&mut runtime, handle, step, false)?
            };
            transcript.push(entry);
            // Give the poller a chance to see element changes before the next step
            tokio::time::sleep(period * 2).await;
        }

        poller.abort();
        let _ = poller.await;
        debug!(%handle, "Element poller stopped");

        let runtime = Arc::try_unwrap(runtime)
            .map_err(|_| anyhow!("runtime still shared after the poller stopped"))?
            .into_inner();
        Ok::<_, anyhow::Error>((runtime, transcript))
    })
}

fn print_entry(entry: &TranscriptEntry) {
    match &entry.outcome {
        DispatchOutcome::Processed { events } => {
            println!("  {} {} {}", "✓".green(), entry.step, format!("({} events)", events).dimmed())
        }
        DispatchOutcome::Ignored { reason } => {
            println!("  {} {} {}", "✗".yellow(), entry.step, format!("ignored: {}", reason).dimmed())
        }
    }
    print_calls(&entry.host_calls);
}

fn print_calls(calls: &[HostCall]) {
    for call in calls {
        let line = match call {
            HostCall::ShowInfoPopup { popup, .. } => format!("info popup {:?}", popup.title),
            HostCall::ShowListPopup { request, .. } => {
                format!("list popup #{} {:?}", request.request_id, request.items)
            }
            HostCall::ShowCalendarPopup { request, .. } => format!(
                "calendar popup #{} {}..={}",
                request.request_id, request.min_date, request.max_date
            ),
            HostCall::ShowGenericPopup {
                popup_identifier, ..
            } => format!("generic popup {}", popup_identifier),
            HostCall::DismissGenericPopup {
                popup_identifier, ..
            } => format!("dismiss popup {}", popup_identifier),
            HostCall::SetUserActions { user_actions, .. } => {
                let chips: Vec<String> = user_actions
                    .iter()
                    .map(|action| {
                        if action.enabled {
                            action.chip.text.clone()
                        } else {
                            format!("({})", action.chip.text)
                        }
                    })
                    .collect();
                format!("chips [{}]", chips.join(", "))
            }
            HostCall::EndAction { result, .. } => format!("end action {:?}", result.status),
            HostCall::ReportDiagnostic { diagnostic, .. } => {
                println!(
                    "    {} {:?}: {}",
                    "⚠".yellow(),
                    diagnostic.kind,
                    diagnostic.message.yellow()
                );
                continue;
            }
        };
        println!("    {} {}", "→".bright_blue(), line);
    }
}

fn write_outputs(dir: &Path, definition: &Path, outputs: &[ModelEntry]) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let stem = definition
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "ui".to_string());
    let path = dir.join(format!("{}.outputs.json", stem));
    fs::write(&path, serde_json::to_string_pretty(outputs)?)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use genui_proto::ModelValue;

    #[test]
    fn test_write_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let outputs = vec![ModelEntry::new("name", ModelValue::string("Ada"))];

        let path = write_outputs(&dir.path().join("out"), Path::new("ui/form.json"), &outputs).unwrap();
        assert_eq!(path, dir.path().join("out").join("form.outputs.json"));

        let written: Vec<ModelEntry> =
            serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(written, outputs);
    }
}
