use anyhow::{Context as AnyhowContext, Result};

use super::{PLAN_EVIDENCE, evidence_sink, load_state, state_store};
use crate::Context;
use crate::config::Settings;
use crate::engine::display_plan;
use crate::{desired, ui};
use declarative::EvidenceSinkExt;

/// Compute the plan, show it, and save it as evidence for `apply`.
pub fn run(ctx: &Context, settings: &Settings, target: Option<&str>) -> Result<()> {
    if !ctx.quiet {
        ui::header("Plan");
    }

    let desired = desired::load(&settings.desired_file)?;
    let state = load_state(&state_store(settings))?;

    // Structural errors stop here, before any evidence is written
    let plan = declarative::plan(&desired, &state)
        .context("Cannot plan from these inputs")?
        .filter_by_target(target);

    if !ctx.quiet {
        display_plan(&plan);
    }

    let path = evidence_sink(settings)
        .record_json(PLAN_EVIDENCE, &plan)
        .context("Could not save plan evidence")?;

    println!();
    println!("Plan saved to: {}", path.display());
    Ok(())
}
