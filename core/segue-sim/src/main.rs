//! segue-sim: replays navigation scripts against the headless segue host.
//!
//! ## Subcommands
//!
//! - `scenario`: Runs one of the reference scenarios on the portfolio site
//! - `run`: Replays timed clicks from a starting page
//! - `config check`: Validates a config file (default `~/.segue/segue.toml`)
//!
//! Set `SEGUE_DEBUG_LOG=1` for debug logs; `RUST_LOG` filters otherwise.

mod error;
mod logging;
mod script;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use segue_core::SiteMap;

use crate::error::Result;
use crate::script::{config_from, Click, Report, ScenarioName, Script};

#[derive(Parser)]
#[command(name = "segue-sim")]
#[command(about = "Page transition and scroll restoration simulator")]
#[command(version)]
struct Cli {
    /// Write logs to this file instead of stderr
    #[arg(long, global = true, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Print the report as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a reference scenario
    Scenario {
        #[arg(value_enum)]
        name: ScenarioName,
    },

    /// Replay clicks from a starting page
    Run {
        /// Page the script starts on
        #[arg(long, default_value = "/")]
        from: String,

        /// Link destination, optionally with a millisecond offset (e.g. /about#skills@120)
        #[arg(long = "click", value_name = "DEST[@MS]", required = true)]
        clicks: Vec<Click>,

        /// Site map JSON (defaults to the built-in portfolio)
        #[arg(long, value_name = "PATH")]
        site: Option<PathBuf>,

        /// Config TOML (defaults to ~/.segue/segue.toml)
        #[arg(long, value_name = "PATH")]
        config: Option<PathBuf>,

        /// Page load latency in milliseconds
        #[arg(long, default_value_t = 50)]
        latency: u64,

        /// Scroll through a smooth-scroll engine
        #[arg(long)]
        smooth_scroll: bool,

        /// Store the pending scroll target in the configured handoff file
        #[arg(long)]
        handoff_file: bool,
    },

    /// Config file utilities
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Load and validate a config file
    Check {
        #[arg(value_name = "PATH")]
        path: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();
    let _logging_guard = logging::init(cli.log_file.as_deref());

    if let Err(e) = run(cli.command, cli.json) {
        tracing::error!(error = %e, "segue-sim failed");
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run(command: Commands, json: bool) -> Result<()> {
    match command {
        Commands::Scenario { name } => print_report(&Script::scenario(name).run()?, json),
        Commands::Run {
            from,
            clicks,
            site,
            config,
            latency,
            smooth_scroll,
            handoff_file,
        } => {
            let mut script = Script::new(&from, clicks);
            script.config = config_from(config.as_ref())?;
            if let Some(site) = site {
                script.site = SiteMap::load(&site)?;
            }
            script.load_latency = Duration::from_millis(latency);
            script.smooth_scroll = smooth_scroll;
            script.handoff_file = handoff_file;
            print_report(&script.run()?, json)
        }
        Commands::Config {
            command: ConfigCommands::Check { path },
        } => {
            let config = config_from(path.as_ref())?;
            if json {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                println!(
                    "ok: cover delay {}ms, minimum hold {}ms, scroll hold {}ms, overlap {}",
                    config.navigation.cover_delay_ms,
                    config.overlay.minimum_hold_ms,
                    config.overlay.scroll_hold_ms,
                    config.navigation.overlap.as_str()
                );
            }
            Ok(())
        }
    }
}

fn print_report(report: &Report, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        println!("{}", report.render_text());
    }
    Ok(())
}
