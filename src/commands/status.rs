use anyhow::Result;
use colored::Colorize;

use super::{PLAN_EVIDENCE, evidence_sink, load_state, state_store};
use crate::Context;
use crate::config::Settings;
use crate::ui;

pub fn run(ctx: &Context, settings: &Settings) -> Result<()> {
    ui::header("Caixa Status");

    let store = state_store(settings);
    let state = load_state(&store)?;

    ui::section("Locations");
    ui::kv("State", &store.path().display().to_string());
    ui::kv("Desired", &settings.desired_file.display().to_string());
    ui::kv("Data root", &settings.data_root.display().to_string());
    ui::kv("Evidence", &settings.evidence_dir.display().to_string());

    let plan_path = evidence_sink(settings).path_for(PLAN_EVIDENCE);
    if plan_path.exists() {
        ui::kv("Saved plan", &plan_path.display().to_string());
    } else if !ctx.quiet {
        ui::dim("No saved plan. Run `caixa plan` to create one.");
    }

    ui::section("Recorded State");
    if !store.path().exists() {
        ui::info("Nothing applied yet");
        return Ok(());
    }
    ui::kv("Version", &state.version.to_string());
    ui::kv("Buckets", &state.resources.len().to_string());

    for record in &state.resources {
        let visibility = if record.public {
            "public".yellow()
        } else {
            "private".green()
        };
        println!(
            "  {} {:<30} {} {}",
            "•".cyan(),
            record.name.bold(),
            visibility,
            record.classification.as_str().dimmed()
        );
        if !record.allowed_prefix.is_empty() && !ctx.quiet {
            ui::dim(&format!("    prefix: {}", record.allowed_prefix));
        }
    }

    println!();
    Ok(())
}
