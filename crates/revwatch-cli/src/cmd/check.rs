use super::{load_config, orchestrator};
use crate::output::{or_dash, print_json};
use anyhow::Context;
use revwatch_core::orchestrator::{Outcome, PipelineRun};
use revwatch_core::probe::short;
use std::path::Path;
use tracing::warn;

pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let config = load_config(root)?;
    let remote = config.remote().context("repo_url is not usable")?;

    let rt = tokio::runtime::Runtime::new()?;
    let run = rt.block_on(async {
        let (orchestrator, hooks) = orchestrator(root, &config);
        let run = orchestrator.run_cycle(&remote, &config).await;
        orchestrator.flush_notifications().await;
        drop(orchestrator);
        if let Err(e) = hooks.await {
            warn!("publish hook task failed: {e}");
        }
        run
    });

    if json {
        print_json(&run)?;
    } else {
        print_run(&run);
    }

    match run.outcome {
        Outcome::NoChange | Outcome::Updated => Ok(()),
        Outcome::FailedProbe | Outcome::FailedPipeline => {
            anyhow::bail!("{}", run.error.as_deref().unwrap_or("cycle failed"))
        }
    }
}

fn print_run(run: &PipelineRun) {
    let outcome = match run.outcome {
        Outcome::NoChange => "no change",
        Outcome::Updated => "updated",
        Outcome::FailedProbe => "probe failed",
        Outcome::FailedPipeline => "pipeline failed",
    };
    println!("Remote:   {}", run.remote);
    println!("Previous: {}", or_dash(run.previous.as_deref().map(short)));
    println!("Observed: {}", or_dash(run.observed.as_deref().map(short)));
    println!("Outcome:  {outcome}");
    if let Some(step) = run.failed_step {
        println!("Step:     {step}");
    }
    if run.outcome == Outcome::Updated && !run.cursor_written {
        println!("\nwarning: the new revision could not be recorded; the next cycle will repeat the update");
    }
}
