use anyhow::{Context, Result};
use clap::Parser;
use mlua::Lua;
use moonwatch::cli::{Cli, OutputFormat};
use moonwatch::config::ProfilerConfig;
use moonwatch::{csv_output, json_output, script, text_output, MonotonicClock, Path, Profiler};
use std::rc::Rc;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

fn load_config(args: &Cli) -> Result<ProfilerConfig> {
    let mut config = match &args.config {
        Some(path) => ProfilerConfig::from_file(path)?,
        None => ProfilerConfig::default(),
    };

    // --root overrides the file
    if let Some(root) = &args.root {
        config.root = Path::parse_dotted(root).into_segments();
    }

    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;
    Ok(config)
}

fn main() -> Result<()> {
    let args = Cli::parse();

    // Initialize tracing if --debug flag is set
    init_tracing(args.debug);

    let config = load_config(&args)?;

    let lua = Lua::new();
    script::load_script(&lua, &args.script)?;

    let mut profiler = Profiler::with_config(&config)?;
    profiler.set_clock(Rc::new(MonotonicClock::new()));
    profiler
        .install(&lua)
        .context("Failed to install instrumentation")?;

    // Uninstall before propagating so the script's bindings are restored
    let outcome = script::call_global(&lua, &args.function, &args.args);
    profiler.uninstall();
    outcome?;

    let report = profiler.generate_report();
    match args.format {
        OutputFormat::Text => print!("{}", text_output::format_report(&report)),
        OutputFormat::Json => {
            println!("{}", json_output::JsonReport::from(&report).to_json()?)
        }
        OutputFormat::Csv => print!("{}", csv_output::format_report(&report)),
    }

    Ok(())
}
