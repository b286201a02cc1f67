//! Lifecycle step commands
//!
//! Implements `fatbuild build`, `package`, `test` and `create`.

use anyhow::{Context, Result};

use crate::cli::commands::{GlobalArgs, RecipeArgs};
use crate::cli::output::{create_spinner, status, OutputConfig};
use crate::core::hooks::Orchestrator;
use crate::core::runner::StepReport;

/// Which lifecycle step(s) to run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepCommand {
    /// `fatbuild build`
    Build,
    /// `fatbuild package`
    Package,
    /// `fatbuild test`
    Test,
    /// `fatbuild create`
    Create,
}

/// Execute a step command
pub async fn execute(command: StepCommand, args: &RecipeArgs, globals: &GlobalArgs) -> Result<()> {
    let config = globals.load_config()?;
    let mut ctx = args
        .load_context()
        .with_context(|| format!("Failed to load recipe {}", args.recipe_path().display()))?;
    let orchestrator = Orchestrator::new(config);

    tracing::info!("Running {command:?} for {}", ctx.display_name());

    let visible = !globals.json && OutputConfig::new(globals.quiet, 0).show_progress();
    let spinner = create_spinner(&format!("{command:?} {}...", ctx.display_name()), visible);
    let result = match command {
        StepCommand::Build => orchestrator.build(&mut ctx).map(|r| vec![r]),
        StepCommand::Package => orchestrator
            .package(&mut ctx, args.recipe_path())
            .map(|r| vec![r]),
        StepCommand::Test => orchestrator.test(&mut ctx).map(|r| vec![r]),
        StepCommand::Create => orchestrator.create(&mut ctx, args.recipe_path()),
    };
    spinner.finish_and_clear();
    let reports = result?;

    if globals.json {
        let json: Vec<_> = reports.iter().map(report_json).collect();
        println!("{}", serde_json::to_string_pretty(&json)?);
    } else if !globals.quiet {
        for report in &reports {
            print_report(ctx.display_name(), report);
        }
    }
    Ok(())
}

fn print_report(name: &str, report: &StepReport) {
    if report.archs.is_empty() {
        println!("{} {name}: {} done", status::SUCCESS, report.step);
    } else {
        let archs: Vec<&str> = report.archs.iter().map(|a| a.as_str()).collect();
        println!(
            "{} {name}: {} done for {}",
            status::SUCCESS,
            report.step,
            archs.join(", ")
        );
    }

    if let Some(merge) = &report.merge {
        for path in &merge.combined {
            println!("  • combined {}", path.display());
        }
        for path in &merge.conflicts {
            println!("  {} kept first copy of {}", status::WARNING, path.display());
        }
    }
}

fn report_json(report: &StepReport) -> serde_json::Value {
    let archs: Vec<&str> = report.archs.iter().map(|a| a.as_str()).collect();
    let merge = report.merge.as_ref().map(|m| {
        serde_json::json!({
            "merged": m.stats.copied + m.stats.delegated,
            "combined": m.combined,
            "conflicts": m.conflicts,
        })
    });
    serde_json::json!({
        "step": report.step.to_string(),
        "archs": archs,
        "merge": merge,
    })
}
