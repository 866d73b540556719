use std::path::PathBuf;
use std::process;

use anyhow::Context;
use clap::Parser;
use swallow::common::config::Config;
use swallow::common::log;
use swallow::layout_engine::{Direction, LayoutCommand, LayoutEngine};
use swallow::sys::host::{Host, MemoryHost};
use tracing::debug;

/// Grow the focused window of a layout picture into its neighbors.
#[derive(Parser)]
struct Cli {
    /// Path to configuration file to use (overrides default).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Only load and validate the configuration.
    #[arg(long)]
    validate_config: bool,

    /// Remove whole neighboring branches instead of single windows.
    #[arg(long)]
    aggressive: bool,

    /// Print the resulting window rectangles as JSON.
    #[arg(long)]
    json: bool,

    /// Layout picture to start from.
    #[arg(long, value_name = "FILE", required_unless_present = "validate_config")]
    layout: Option<PathBuf>,

    /// Directions to swallow in, applied in order.
    #[arg(value_name = "DIRECTION")]
    directions: Vec<Direction>,
}

fn main() {
    let opt = Cli::parse();
    log::init_logging();
    install_panic_hook();

    if let Err(e) = run(opt) {
        eprintln!("{e:#}");
        process::exit(1);
    }
}

fn run(opt: Cli) -> anyhow::Result<()> {
    let config = Config::load(opt.config.as_deref())?;
    let issues = config.validate();
    if opt.validate_config {
        if issues.is_empty() {
            println!("Config validation passed");
            return Ok(());
        }
        for issue in &issues {
            eprintln!("{issue}");
        }
        anyhow::bail!("{} config issue(s) found", issues.len());
    }
    if let Some(issue) = issues.first() {
        anyhow::bail!("invalid config: {issue}");
    }

    let Some(layout_path) = opt.layout else {
        anyhow::bail!("--layout is required");
    };
    let text = std::fs::read_to_string(&layout_path)
        .with_context(|| format!("reading {}", layout_path.display()))?;
    let grid = config.fixture.grid();
    let (tree, names) = grid.load(&text).with_context(|| format!("loading {}", layout_path.display()))?;

    let mut host = MemoryHost::from_tree(&tree);
    let mut engine = LayoutEngine::new(tree, &config.settings);
    let aggressive = opt.aggressive.then_some(true);
    for direction in opt.directions {
        let command = LayoutCommand::Swallow { direction, aggressive };
        let response = engine
            .handle_command(&mut host, command)
            .with_context(|| format!("swallowing {direction}"))?;
        debug!(%direction, removed = ?response.removed_windows, "Swallowed");
    }

    if opt.json {
        println!("{}", serde_json::to_string_pretty(&host.windows())?);
    } else {
        println!("{}", grid.render(engine.tree(), &names));
    }
    Ok(())
}

#[cfg(panic = "unwind")]
fn install_panic_hook() {
    // Abort on panic instead of unwinding through the command loop.
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        original_hook(info);
        std::process::abort();
    }));
}

#[cfg(not(panic = "unwind"))]
fn install_panic_hook() {}
