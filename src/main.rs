use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::Parser;

use funscript::{Interpreter, ScriptError};

#[derive(Parser, Debug)]
#[command(name = "funscript", about = "A tiny integer scripting language interpreter")]
struct Cli {
    /// Program file to run
    file: PathBuf,

    /// Run without producing `print` output
    #[arg(long)]
    silent: bool,

    /// Render failures as annotated diagnostics on stderr
    #[arg(long)]
    pretty: bool,

    /// Print global variables and functions after the program finishes
    #[arg(long)]
    dump_state: bool,

    /// State dump output format
    #[arg(long, default_value = "text", value_parser = ["text", "json"])]
    state_format: String,
}

fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    // Only initialize if RUST_LOG is set
    if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
            .with(EnvFilter::from_default_env())
            .init();
    }
}

fn report_failure(err: ScriptError, cli: &Cli, source: &str) -> anyhow::Error {
    if cli.pretty {
        let name = cli.file.display().to_string();
        let report = miette::Report::new(err.with_source_code(name, source));
        eprintln!("{report:?}");
    } else {
        println!("{}", err.display_with_remaining(source));
    }
    anyhow!("program aborted")
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let source = std::fs::read_to_string(&cli.file)
        .with_context(|| format!("read source file '{}'", cli.file.display()))?;

    let mut interpreter = Interpreter::new(&source);
    let result = if cli.silent {
        interpreter.run_silent()
    } else {
        interpreter.run()
    };
    result.map_err(|e| report_failure(e, &cli, &source))?;

    if cli.dump_state {
        let snapshot = interpreter.snapshot();
        match cli.state_format.as_str() {
            "json" => println!("{}", snapshot.to_json()),
            _ => print!("{snapshot}"),
        }
    }
    Ok(())
}
