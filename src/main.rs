use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use os_kernel_sim::io::{load_programs_into_disk, Disk, ProgramDescriptor};
use os_kernel_sim::{Driver, SimulatorConfig};

#[derive(Parser)]
#[command(name = "os-kernel-sim")]
#[command(version)]
#[command(about = "Single-processor operating system kernel simulator")]
struct Cli {
    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Program file holding the job images
    #[arg(short, long)]
    programs: Option<PathBuf>,

    /// Extra daemon program, admitted after the user programs
    #[arg(short, long = "daemon")]
    daemons: Vec<String>,

    /// Instructions between clock interrupts
    #[arg(long)]
    clock_interval: Option<u64>,

    /// Stop after this many instructions
    #[arg(long)]
    max_instructions: Option<u64>,

    /// Print the effective configuration as JSON and exit
    #[arg(long)]
    dump_config: bool,

    /// Verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// User programs to admit, as `name[,arrival]`
    user_programs: Vec<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)))
        .init();

    let mut config = match &cli.config {
        Some(path) => SimulatorConfig::load(path)
            .with_context(|| format!("failed to load configuration {}", path.display()))?,
        None => SimulatorConfig::default(),
    };
    if let Some(programs) = cli.programs {
        config.program_file = programs;
    }
    if let Some(clock_interval) = cli.clock_interval {
        config.clock_interval = clock_interval;
    }
    if cli.max_instructions.is_some() {
        config.max_instructions = cli.max_instructions;
    }
    config.validate()?;

    if cli.dump_config {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    let mut disk = Disk::new();
    let number_of_programs = load_programs_into_disk(&config.program_file, &mut disk)
        .with_context(|| format!("failed to load programs from {}", config.program_file.display()))?;
    tracing::info!(number_of_programs, "Loaded programs into disk.");

    let user_programs = cli
        .user_programs
        .iter()
        .map(|argument| ProgramDescriptor::parse_user(argument))
        .collect::<Result<Vec<_>, _>>()
        .map_err(anyhow::Error::msg)?;

    let mut driver = Driver::new(config, disk);
    let summary = driver.start(user_programs, &cli.daemons)?;

    println!(
        "Executed {} instructions in {} clock ticks ({}).",
        summary.instructions,
        summary.clock_ticks,
        if summary.halted { "halted" } else { "stopped at instruction limit" }
    );
    println!("... PID | Program              | Queue   | Priority | State");
    println!("...-----|----------------------|---------|----------|----------");
    for process in summary.processes {
        println!(
            "... {:03} | {:<20} | {:<7} | {:<8} | {}",
            process.pid,
            process.name,
            process.queue_class.name(),
            process.priority,
            process.state
        );
    }

    Ok(())
}
