//! Main CLI application for the timetable solver

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::LevelFilter;
use std::path::PathBuf;
use std::time::Instant;
use timetable_csp::{
    config::{CliOverrides, NeighborStrategy, OutputFormat, Settings},
    schedule::{SolveStatus, Timetable, TimetableProblem, TimetableValidator, View},
    timetable::{create_sample_snapshots, load_snapshot_from_file},
    utils::{ColorOutput, TimetableFormatter},
};

#[derive(Parser)]
#[command(name = "timetable_csp")]
#[command(about = "Weekly timetable solver using constraint satisfaction")]
#[command(version = "0.1.0")]
struct Cli {
    /// Log at debug level (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search for a timetable
    Solve {
        /// Configuration file path
        #[arg(short, long, default_value = "config/default.yaml")]
        config: PathBuf,

        /// Snapshot file, JSON or YAML (overrides config)
        #[arg(short, long)]
        snapshot: Option<PathBuf>,

        /// Output directory (overrides config)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format: text, json or grid (overrides config)
        #[arg(short, long, value_parser = parse_format)]
        format: Option<OutputFormat>,

        /// Abort after this many search nodes (overrides config)
        #[arg(long)]
        max_steps: Option<u64>,

        /// Abort after this many seconds (overrides config)
        #[arg(long)]
        timeout: Option<u64>,

        /// Neighbor relation: complete or shared_timeslot (overrides config)
        #[arg(long, value_parser = parse_strategy)]
        neighbor_strategy: Option<NeighborStrategy>,

        /// Print a grid for one view, e.g. class:1, teacher:3 or room:2
        #[arg(long, value_parser = parse_view)]
        view: Option<View>,
    },

    /// Create example configuration and snapshot files
    Setup {
        /// Directory to create files in
        #[arg(short, long, default_value = ".")]
        directory: PathBuf,

        /// Force overwrite existing files
        #[arg(short, long)]
        force: bool,
    },

    /// Check a saved timetable against a snapshot
    Validate {
        /// Configuration file path
        #[arg(short, long, default_value = "config/default.yaml")]
        config: PathBuf,

        /// Timetable JSON file
        #[arg(short, long)]
        timetable: PathBuf,

        /// Snapshot file (overrides config)
        #[arg(short, long)]
        snapshot: Option<PathBuf>,
    },

    /// Report domain sizes and resource loads without searching
    Analyze {
        /// Configuration file path
        #[arg(short, long, default_value = "config/default.yaml")]
        config: PathBuf,

        /// Snapshot file (overrides config)
        #[arg(short, long)]
        snapshot: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Solve {
            config,
            snapshot,
            output,
            format,
            max_steps,
            timeout,
            neighbor_strategy,
            view,
        } => {
            let overrides = CliOverrides {
                snapshot_file: snapshot,
                output_dir: output,
                format,
                max_steps,
                timeout_seconds: timeout,
                neighbor_strategy,
            };
            solve_command(config, overrides, view, cli.verbose)
        }
        Commands::Setup { directory, force } => setup_command(directory, force),
        Commands::Validate {
            config,
            timetable,
            snapshot,
        } => validate_command(config, timetable, snapshot),
        Commands::Analyze { config, snapshot } => analyze_command(config, snapshot),
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { LevelFilter::Debug } else { LevelFilter::Info };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level.as_str())).init();
}

fn load_settings(config_path: &PathBuf) -> Result<Settings> {
    if config_path.exists() {
        Settings::from_file(config_path)
            .with_context(|| format!("Failed to load config from {}", config_path.display()))
    } else {
        println!(
            "{}",
            ColorOutput::warning(&format!("Config file {} not found, using defaults", config_path.display()))
        );
        Ok(Settings::default())
    }
}

fn solve_command(config_path: PathBuf, overrides: CliOverrides, view: Option<View>, verbose: bool) -> Result<()> {
    println!("{}", ColorOutput::info("Starting timetable solver"));

    let mut settings = load_settings(&config_path)?;
    settings.merge_with_cli(&overrides);

    if verbose {
        println!("Configuration:");
        println!("  Snapshot: {}", settings.input.snapshot_file.display());
        println!("  Neighbor strategy: {:?}", settings.builder.neighbor_strategy);
        println!("  Strict domains: {}", settings.builder.strict_domains);
        println!("  Max steps: {:?}", settings.solver.max_steps);
        println!("  Timeout: {:?}s", settings.solver.timeout_seconds);
        println!("  Output dir: {}", settings.output.output_directory.display());
        println!();
    }

    settings.validate().context("Configuration validation failed")?;

    let start_time = Instant::now();
    let problem = TimetableProblem::new(settings.clone()).context("Failed to create timetable problem")?;

    if verbose {
        println!("{}", problem.analyze()?);
    }

    let report = problem.solve().context("Failed to solve timetable")?;
    println!("{}", TimetableFormatter::format_summary(&report));

    let timetable = match (report.status, &report.timetable) {
        (SolveStatus::Feasible, Some(timetable)) => timetable,
        (SolveStatus::Aborted, _) => {
            println!(
                "{}",
                ColorOutput::warning("Search stopped before finishing; raise --max-steps or --timeout")
            );
            return Ok(());
        }
        _ => {
            println!("{}", ColorOutput::error("No timetable satisfies this snapshot"));
            println!("Run `analyze` to look for over-subscribed classes, teachers or rooms");
            return Ok(());
        }
    };

    println!(
        "{}",
        ColorOutput::success(&format!(
            "Scheduled {} sessions in {:.3}s",
            timetable.entries.len(),
            start_time.elapsed().as_secs_f64()
        ))
    );

    match view {
        Some(view) => println!("\n{}", TimetableFormatter::format_grid(timetable, problem.snapshot(), view)),
        None => println!("\n{}", TimetableFormatter::format_timetable(timetable, problem.snapshot())),
    }

    let written = TimetableFormatter::save_timetable(
        timetable,
        problem.snapshot(),
        &settings.output.output_directory,
        settings.output.format,
    )
    .context("Failed to save timetable")?;

    println!(
        "{}",
        ColorOutput::success(&format!(
            "Wrote {} file(s) to {}",
            written.len(),
            settings.output.output_directory.display()
        ))
    );

    Ok(())
}

fn setup_command(directory: PathBuf, force: bool) -> Result<()> {
    println!("{}", ColorOutput::info("Setting up project structure..."));

    let config_dir = directory.join("config");
    let input_dir = directory.join("input");
    let output_dir = directory.join("output/timetables");

    for dir in [&config_dir, &input_dir, &output_dir] {
        std::fs::create_dir_all(dir).with_context(|| format!("Failed to create directory {}", dir.display()))?;
    }

    let config_path = config_dir.join("default.yaml");
    if !config_path.exists() || force {
        Settings::default()
            .to_file(&config_path)
            .context("Failed to create default configuration")?;
        println!("Created: {}", config_path.display());
    } else {
        println!("Skipped: {} (already exists)", config_path.display());
    }

    create_sample_snapshots(&input_dir).context("Failed to create sample snapshots")?;
    println!("Created sample snapshots in: {}", input_dir.display());

    let examples_dir = config_dir.join("examples");
    std::fs::create_dir_all(&examples_dir)?;

    let mut sparse = Settings::default();
    sparse.builder.neighbor_strategy = NeighborStrategy::SharedTimeslot;
    sparse.output.format = OutputFormat::Grid;
    sparse.to_file(&examples_dir.join("shared_timeslot.yaml"))?;

    let mut bounded = Settings::default();
    bounded.solver.max_steps = Some(100_000);
    bounded.solver.timeout_seconds = Some(30);
    bounded.builder.strict_domains = false;
    bounded.input.snapshot_file = PathBuf::from("input/snapshot.yaml");
    bounded.output.format = OutputFormat::Json;
    bounded.to_file(&examples_dir.join("bounded.yaml"))?;

    println!("Created example configurations in: {}", examples_dir.display());

    println!("\n{}", ColorOutput::success("Setup complete!"));
    println!("\nNext steps:");
    println!("1. Edit configuration files in {}", config_dir.display());
    println!("2. Replace the sample snapshot in {}", input_dir.display());
    println!("3. Run: cargo run -- solve --config config/default.yaml");

    Ok(())
}

fn validate_command(config_path: PathBuf, timetable_path: PathBuf, snapshot: Option<PathBuf>) -> Result<()> {
    println!("{}", ColorOutput::info("Validating timetable..."));

    let settings = load_settings(&config_path)?;
    let snapshot_path = snapshot.unwrap_or(settings.input.snapshot_file);
    let snapshot = load_snapshot_from_file(&snapshot_path)?;

    let timetable = Timetable::load_from_file(&timetable_path)
        .with_context(|| format!("Failed to load timetable from {}", timetable_path.display()))?;

    let result = TimetableValidator::new(&snapshot)
        .validate(&timetable)
        .context("Validation failed")?;

    println!("{}", result);

    if result.is_valid {
        println!("{}", ColorOutput::success("Timetable is valid!"));
    } else {
        println!("{}", ColorOutput::error("Timetable is invalid"));
        if let Some(error) = result.error_message {
            println!("Error: {}", error);
        }
    }

    Ok(())
}

fn analyze_command(config_path: PathBuf, snapshot: Option<PathBuf>) -> Result<()> {
    println!("{}", ColorOutput::info("Analyzing snapshot..."));

    let mut settings = load_settings(&config_path)?;
    if let Some(snapshot) = snapshot {
        settings.input.snapshot_file = snapshot;
    }

    let problem = TimetableProblem::new(settings).context("Failed to create problem for analysis")?;
    let snapshot = problem.snapshot();

    println!("Snapshot:");
    println!("  Classes: {}", snapshot.classes.len());
    println!("  Subjects: {}", snapshot.subjects.len());
    println!("  Teachers: {}", snapshot.teachers.len());
    println!("  Rooms: {}", snapshot.rooms.len());
    println!(
        "  Timeslots: {} ({} teaching)",
        snapshot.timeslots.len(),
        snapshot.teaching_timeslots().len()
    );
    println!("  Mappings: {}", snapshot.mappings.len());

    let report = problem.analyze()?;
    println!("\n{}", report);

    Ok(())
}

fn parse_format(value: &str) -> Result<OutputFormat, String> {
    match value {
        "text" => Ok(OutputFormat::Text),
        "json" => Ok(OutputFormat::Json),
        "grid" => Ok(OutputFormat::Grid),
        other => Err(format!("unknown format '{}', expected text, json or grid", other)),
    }
}

fn parse_strategy(value: &str) -> Result<NeighborStrategy, String> {
    match value {
        "complete" => Ok(NeighborStrategy::Complete),
        "shared_timeslot" => Ok(NeighborStrategy::SharedTimeslot),
        other => Err(format!(
            "unknown neighbor strategy '{}', expected complete or shared_timeslot",
            other
        )),
    }
}

fn parse_view(value: &str) -> Result<View, String> {
    let (kind, id) = value
        .split_once(':')
        .ok_or_else(|| format!("view '{}' must look like class:1", value))?;
    let id: u32 = id.parse().map_err(|_| format!("invalid id in view '{}'", value))?;

    match kind {
        "class" => Ok(View::Class(id)),
        "teacher" => Ok(View::Teacher(id)),
        "room" => Ok(View::Room(id)),
        other => Err(format!("unknown view '{}', expected class, teacher or room", other)),
    }
}
