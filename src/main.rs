use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use sensor_bench::{cli::Cli, orchestrator, report};
use std::{
    io::{self, Write},
    process::ExitCode,
};
use tracing_subscriber::EnvFilter;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: jemallocator::Jemalloc = jemallocator::Jemalloc;

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn banner(out: &mut impl Write) -> io::Result<()> {
    let rule = "═".repeat(58);
    writeln!(out)?;
    writeln!(out, "{}", format!("╔{rule}╗").bold())?;
    writeln!(out, "{}", format!("║{:^58}║", "Columnar engine  vs  rust-cli  -  Sensor CSV Benchmark").bold())?;
    writeln!(out, "{}", format!("╚{rule}╝").bold())?;
    writeln!(out)
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    // Terminal output is best-effort: a closed stdout must not change the
    // exit code.
    let mut stdout = io::stdout().lock();
    let _ = banner(&mut stdout);

    let config = cli.to_config();
    let report = match orchestrator::run(config, &cli.workspace, &mut stdout) {
        Ok(report) => report,
        Err(err) => {
            eprintln!("{} {err}", "Error:".red().bold());
            return Ok(ExitCode::FAILURE);
        }
    };

    let _ = write!(stdout, "{}", report::render(&report));

    if let Some(path) = &cli.json {
        report::write_json(&report, path)
            .with_context(|| format!("failed to write JSON report to '{}'", path.display()))?;
        let _ = writeln!(stdout, "  JSON report written to {}", path.display());
    }

    Ok(ExitCode::SUCCESS)
}
