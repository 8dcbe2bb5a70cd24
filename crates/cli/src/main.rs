//! Cache hierarchy simulator CLI.
//!
//! This binary replays a request trace against a configured hierarchy. It performs:
//! 1. **Configuration:** From a JSON file, or from the classic L1 (+ victim buffer) / L2
//!    flags.
//! 2. **Trace run:** Loads the trace (strict by default, `--lenient` skips bad lines) and
//!    issues every request in order.
//! 3. **Reporting:** Prints the configuration, optionally the final cache contents, and the
//!    selected statistics sections.

use std::path::{Path, PathBuf};
use std::{fs, process};

use clap::{Args, Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use cachesim_core::common::{ConfigError, SimError};
use cachesim_core::config::Config;
use cachesim_core::sim::{Simulator, TraceMode, load_trace};
use cachesim_core::stats::STATS_SECTIONS;

#[derive(Parser, Debug)]
#[command(
    name = "cachesim",
    author,
    version,
    about = "Functional multi-level cache hierarchy simulator",
    long_about = "Replay a trace of loads and stores against set-associative caches with an optional victim buffer.\n\nTrace lines are `r <hex address>` or `w <hex address>`; blank lines and `#` comments are ignored.\n\nExamples:\n  cachesim run --trace gcc.trace --block-size 16 --l1-size 1024 --l1-assoc 2 --victim-lines 4 --l2-size 8192 --l2-assoc 4\n  cachesim run --trace gcc.trace --config hierarchy.json --sections levels,memory"
)]
struct Cli {
    /// Increase log verbosity (-v: info, -vv: debug, -vvv: trace). `RUST_LOG` overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Replay a trace and print statistics.
    Run(RunArgs),
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Trace file to replay.
    #[arg(short, long)]
    trace: PathBuf,

    /// JSON hierarchy configuration; overrides the geometry flags.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Block size in bytes, shared by L1 and L2.
    #[arg(long, default_value_t = 16)]
    block_size: usize,

    /// L1 size in bytes.
    #[arg(long, default_value_t = 1024)]
    l1_size: usize,

    /// L1 associativity.
    #[arg(long, default_value_t = 2)]
    l1_assoc: usize,

    /// L1 victim buffer capacity in blocks (0 disables it).
    #[arg(long, default_value_t = 0)]
    victim_lines: usize,

    /// L2 size in bytes (0 omits the L2).
    #[arg(long, default_value_t = 0)]
    l2_size: usize,

    /// L2 associativity.
    #[arg(long, default_value_t = 4)]
    l2_assoc: usize,

    /// Log and skip malformed trace lines instead of stopping.
    #[arg(long)]
    lenient: bool,

    /// Statistics sections to print (comma separated). Defaults to all.
    #[arg(long, value_delimiter = ',', value_parser = clap::builder::PossibleValuesParser::new(STATS_SECTIONS.iter().copied()))]
    sections: Vec<String>,

    /// Print the contents of every level after the run.
    #[arg(long)]
    dump_contents: bool,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Run(args) => cmd_run(&args),
    };
    if let Err(e) = result {
        eprintln!("\n[!] FATAL: {e}");
        process::exit(1);
    }
}

/// Installs the `fmt` subscriber on stderr. `RUST_LOG` wins over `-v`.
fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(args: &RunArgs) -> Result<Config, SimError> {
    match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path).map_err(|source| {
                ConfigError::Parse(format!("{}: {source}", path.display()))
            })?;
            Ok(Config::from_json(&text)?)
        }
        None => Ok(Config::two_level(
            args.block_size,
            args.l1_size,
            args.l1_assoc,
            args.victim_lines,
            args.l2_size,
            args.l2_assoc,
        )),
    }
}

fn print_config(config: &Config, trace: &Path) {
    println!("===== Simulator configuration =====");
    for level in &config.levels {
        println!("{}_SIZE:        {}", level.name, level.size_bytes);
        println!("{}_ASSOC:       {}", level.name, level.ways);
        println!("{}_BLOCKSIZE:   {}", level.name, level.line_bytes);
        if level.victim_lines > 0 {
            println!("{}_VC_NUM_BLOCKS: {}", level.name, level.victim_lines);
        }
    }
    println!("trace_file:     {}", trace.display());
    println!();
}

/// Builds the hierarchy, replays the trace and prints the report.
fn cmd_run(args: &RunArgs) -> Result<(), SimError> {
    debug!(?args, "parsed arguments");
    let config = load_config(args)?;
    print_config(&config, &args.trace);

    let mode = if args.lenient {
        TraceMode::Lenient
    } else {
        TraceMode::Strict
    };
    let requests = load_trace(&args.trace, mode)?;

    let mut sim = Simulator::new(config)?;
    let stats = sim.run(&requests)?;
    info!(
        requests = stats.requests,
        seconds = stats.host_time.as_secs_f64(),
        "simulation finished"
    );

    if args.dump_contents {
        print!("{}", sim.hierarchy());
        println!();
    }
    stats.print_sections(&args.sections);
    Ok(())
}
