use chrono::Utc;
use clap::{Parser, Subcommand};
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use workout_core::*;

#[derive(Parser)]
#[command(name = "lift")]
#[command(about = "Structured workout session runner", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Use this config file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a workout session
    Run {
        /// Workout JSON file
        workout: PathBuf,

        /// Complete every set at its target and skip every rest (for testing)
        #[arg(long)]
        auto: bool,

        /// Dry run - show the plan without starting a session
        #[arg(long)]
        dry_run: bool,
    },

    /// Show the flattened block sequence of a workout
    Plan {
        /// Workout JSON file
        workout: PathBuf,
    },

    /// Check a workout file for structural problems
    Validate {
        /// Workout JSON file
        workout: PathBuf,
    },

    /// List recently finished sessions
    History {
        /// How many days back to look
        #[arg(
            long,
            value_parser = clap::value_parser!(i64).range(1..=workout_core::config::MAX_HISTORY_DAYS)
        )]
        days: Option<i64>,
    },

    /// Roll up journal sessions to CSV
    Rollup {
        /// Clean up processed journal files after rollup
        #[arg(long)]
        cleanup: bool,
    },

    /// Write a default config file
    InitConfig {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },
}

struct DataPaths {
    journal_dir: PathBuf,
    journal: PathBuf,
    csv: PathBuf,
}

impl DataPaths {
    fn new(data_dir: &Path) -> Self {
        let journal_dir = data_dir.join("journal");
        Self {
            journal: journal_dir.join("sessions.jsonl"),
            journal_dir,
            csv: data_dir.join("sessions.csv"),
        }
    }
}

fn main() -> Result<()> {
    workout_core::logging::init();

    let cli = Cli::parse();

    // Runs before loading so a broken config can be replaced
    if let Commands::InitConfig { force } = cli.command {
        return cmd_init_config(cli.config.as_deref(), force);
    }

    let config = match &cli.config {
        Some(path) => Config::load_or_default(path)?,
        None => Config::load()?,
    };
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());
    let paths = DataPaths::new(&data_dir);

    let catalog = default_catalog().with_custom(&config.exercises.custom);
    for problem in catalog.validate() {
        tracing::warn!("Exercise catalog: {}", problem);
    }

    match cli.command {
        Commands::Run {
            workout,
            auto,
            dry_run,
        } => cmd_run(&workout, auto, dry_run, &paths, &catalog, &config),
        Commands::Plan { workout } => cmd_plan(&workout, &catalog),
        Commands::Validate { workout } => cmd_validate(&workout),
        Commands::History { days } => {
            cmd_history(&paths, days.unwrap_or(config.session.history_days))
        }
        Commands::Rollup { cleanup } => cmd_rollup(&paths, cleanup),
        Commands::InitConfig { .. } => Ok(()),
    }
}

fn cmd_run(
    path: &Path,
    auto: bool,
    dry_run: bool,
    paths: &DataPaths,
    catalog: &ExerciseCatalog,
    config: &Config,
) -> Result<()> {
    let workout = Workout::load_validated(path)?;
    tracing::debug!("Loaded workout '{}' from {:?}", workout.id, path);

    println!("\n╭─────────────────────────────────────────╮");
    println!("│  {}", workout.name);
    println!("╰─────────────────────────────────────────╯");
    if !workout.description.is_empty() {
        println!("  {}", workout.description);
    }
    print_plan(&workout, catalog);

    if dry_run {
        println!("\n[Dry run - session not started]");
        return Ok(());
    }

    let started_at = Utc::now();

    let record = if auto {
        let mut engine = SessionEngine::new(&workout, ManualTicker::new());
        attach_renderer(&mut engine, catalog.clone());
        run_auto(&mut engine);
        SessionRecord::from_engine(&engine, &workout.name, started_at, Utc::now())
    } else {
        let (tx, rx) = mpsc::channel();
        let ticker = ThreadTicker::new(tx.clone());
        let mut engine =
            SessionEngine::with_interval(&workout, ticker, config.session.tick_interval());
        attach_renderer(&mut engine, catalog.clone());
        spawn_input_reader(tx);

        println!("─────────────────────────────────────────");
        println!("Enter '<reps> [weight]' to log a set (empty line = target)");
        println!("  's' + Enter to skip rest");
        println!("  'q' + Enter to end the session");

        engine.start();
        while !engine.is_finished() {
            match rx.recv() {
                Ok(Event::Tick(generation)) => {
                    // Ticks from a cancelled countdown can still be queued
                    if generation == engine.scheduler().generation() {
                        engine.tick();
                    }
                }
                Ok(Event::Input(line)) => handle_input(&mut engine, &line),
                Ok(Event::InputClosed) | Err(_) => engine.end(),
            }
        }
        SessionRecord::from_engine(&engine, &workout.name, started_at, Utc::now())
    };

    let Some(record) = record else {
        return Err(Error::Other("Session did not finish".into()));
    };

    let mut sink = JsonlSink::new(&paths.journal);
    sink.append(&record)?;
    tracing::info!(
        "Logged session {} for '{}' ({:?})",
        record.id,
        record.workout_id,
        record.outcome
    );

    print_summary(&record, catalog);
    println!("\n✓ Session logged!");
    Ok(())
}

fn run_auto(engine: &mut SessionEngine<ManualTicker>) {
    engine.start();
    while !engine.is_finished() {
        match engine.status() {
            SessionStatus::Exercising => {
                let (reps, weight) = engine
                    .current_set()
                    .map(target_values)
                    .unwrap_or((None, None));
                engine.complete_set(reps, weight);
            }
            SessionStatus::Resting => engine.skip_rest(),
            SessionStatus::Idle | SessionStatus::Finished => engine.end(),
        }
    }
}

/// Reps and weight logged when the user accepts a set's targets
///
/// Time and distance sets log their achieved value in the reps slot.
fn target_values(set: &WorkoutSet) -> (Option<u32>, Option<f64>) {
    (Some(set.value.round().max(0.0) as u32), set.weight)
}

fn handle_input<S: TickScheduler>(engine: &mut SessionEngine<S>, line: &str) {
    let input = line.trim().to_lowercase();

    match input.as_str() {
        "q" => engine.end(),
        "s" => {
            if engine.status() == SessionStatus::Resting {
                engine.skip_rest();
            } else {
                println!("  (not resting)");
            }
        }
        _ if engine.status() == SessionStatus::Exercising => {
            if input.is_empty() {
                let (reps, weight) = engine
                    .current_set()
                    .map(target_values)
                    .unwrap_or((None, None));
                engine.complete_set(reps, weight);
                return;
            }

            match parse_set_input(&input) {
                Some((reps, weight)) => engine.complete_set(Some(reps), weight),
                None => eprintln!("Could not parse '{}'. Expected '<reps> [weight]'.", input),
            }
        }
        _ => println!("  (resting - 's' to skip, 'q' to end)"),
    }
}

fn parse_set_input(input: &str) -> Option<(u32, Option<f64>)> {
    let mut parts = input.split_whitespace();
    let reps = parts.next()?.parse::<u32>().ok()?;
    let weight = match parts.next() {
        Some(w) => Some(w.parse::<f64>().ok()?),
        None => None,
    };
    if parts.next().is_some() {
        return None;
    }
    Some((reps, weight))
}

// ============================================================================
// Host timing and input
// ============================================================================

enum Event {
    Input(String),
    InputClosed,
    Tick(u64),
}

/// Tick source backed by a sleeper thread per registration
///
/// Every register/cancel bumps the generation; a sleeper exits as soon as it
/// sees a newer generation, and its ticks are tagged so the main loop can
/// drop ones that were already queued.
struct ThreadTicker {
    tx: Sender<Event>,
    generation: Arc<AtomicU64>,
}

impl ThreadTicker {
    fn new(tx: Sender<Event>) -> Self {
        Self {
            tx,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }
}

impl TickScheduler for ThreadTicker {
    fn register_tick(&mut self, interval: Duration) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let current = Arc::clone(&self.generation);
        let tx = self.tx.clone();

        thread::spawn(move || loop {
            thread::sleep(interval);
            if current.load(Ordering::SeqCst) != generation {
                break;
            }
            if tx.send(Event::Tick(generation)).is_err() {
                break;
            }
        });
    }

    fn cancel_tick(&mut self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }
}

fn spawn_input_reader(tx: Sender<Event>) {
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(Event::Input(line)).is_err() {
                return;
            }
        }
        let _ = tx.send(Event::InputClosed);
    });
}

// ============================================================================
// Rendering
// ============================================================================

fn attach_renderer<S: TickScheduler>(engine: &mut SessionEngine<S>, catalog: ExerciseCatalog) {
    let mut last = None;
    engine.subscribe(move |snapshot| {
        let key = (snapshot.status, snapshot.block_index, snapshot.set_index);
        if last != Some(key) {
            last = Some(key);
            render_snapshot(snapshot, &catalog);
        } else if let Some(timer) = snapshot.timer {
            if timer <= 3 || timer % 10 == 0 {
                println!("  … {}s", timer);
            }
        }
    });
}

fn render_snapshot(snapshot: &SessionSnapshot, catalog: &ExerciseCatalog) {
    let progress = format!("[{:>3.0}%]", snapshot.progress);

    match (&snapshot.status, &snapshot.current_block) {
        (SessionStatus::Exercising, Some(FlatBlock::Exercise(block))) => {
            let name = catalog.display_name(&block.exercise_id);
            let target = block
                .sets
                .get(snapshot.set_index)
                .map(describe_set)
                .unwrap_or_default();
            println!(
                "\n{} ▶ {} - set {}/{}: {}",
                progress,
                name,
                snapshot.set_index + 1,
                block.sets.len(),
                target
            );
            // Demo link only on the first set of a block
            if snapshot.set_index == 0 {
                if let Some(url) = catalog
                    .lookup(&block.exercise_id)
                    .and_then(|info| info.media_url.as_deref())
                {
                    println!("  Demo: {}", url);
                }
            }
        }
        (SessionStatus::Resting, Some(current)) => {
            println!(
                "\n{} ⏸ Rest {}s",
                progress,
                snapshot.timer.unwrap_or_default()
            );
            let next = match current {
                // Between sets: the same exercise comes back
                FlatBlock::Exercise(block) => Some(format!(
                    "{} set {}",
                    catalog.display_name(&block.exercise_id),
                    snapshot.set_index + 2
                )),
                FlatBlock::Rest(_) => snapshot
                    .next_block
                    .as_ref()
                    .map(|b| describe_block(b, catalog)),
            };
            if let Some(next) = next {
                println!("  Up next: {}", next);
            }
        }
        (SessionStatus::Finished, _) => println!("\n[100%] ■ Workout finished"),
        _ => {}
    }
}

fn describe_set(set: &WorkoutSet) -> String {
    let value = match set.metric {
        SetMetric::Reps => format!("{} reps", set.value),
        SetMetric::Time => format!("{}s", set.value),
        SetMetric::Distance => format!("{}m", set.value),
    };
    match set.weight {
        Some(weight) => format!("{} @ {}", value, weight),
        None => value,
    }
}

fn describe_block(block: &FlatBlock, catalog: &ExerciseCatalog) -> String {
    match block {
        FlatBlock::Exercise(b) => {
            let mut line = format!(
                "{} - {} set(s)",
                catalog.display_name(&b.exercise_id),
                b.sets.len()
            );
            if let Some(rest) = b.rest_between_sets.filter(|r| *r > 0) {
                line.push_str(&format!(", {}s rest between sets", rest));
            }
            line
        }
        FlatBlock::Rest(r) => format!("Rest {}s", r.duration),
    }
}

fn print_plan(workout: &Workout, catalog: &ExerciseCatalog) {
    println!();
    for (i, block) in flatten(&workout.blocks).iter().enumerate() {
        println!("  {:>2}. {}", i + 1, describe_block(block, catalog));
    }

    for block in &workout.blocks {
        if let WorkoutBlock::Group(group) = block {
            if group.rounds > 1 {
                println!(
                    "  (group '{}' declares {} rounds; its blocks run once)",
                    group.name, group.rounds
                );
            }
        }
    }
}

fn print_summary(record: &SessionRecord, catalog: &ExerciseCatalog) {
    println!("\n─────────────────────────────────────────");
    let outcome = match record.outcome {
        SessionOutcome::Completed => "completed",
        SessionOutcome::EndedEarly => "ended early",
    };
    println!(
        "{}: {} of {} sets logged ({})",
        record.workout_name,
        record.completed_sets(),
        record.total_sets(),
        outcome
    );

    for block in &record.blocks {
        let sets: Vec<String> = block
            .reps
            .iter()
            .zip(&block.weight)
            .map(|(reps, weight)| match (reps, weight) {
                (Some(r), Some(w)) => format!("{}x{}", r, w),
                (Some(r), None) => r.to_string(),
                (None, _) => "-".to_string(),
            })
            .collect();
        println!(
            "  {}: {}",
            catalog.display_name(&block.exercise_id),
            sets.join(", ")
        );
    }
}

// ============================================================================
// Other commands
// ============================================================================

fn cmd_plan(path: &Path, catalog: &ExerciseCatalog) -> Result<()> {
    let workout = Workout::load(path)?;
    println!("{}", workout.name);
    print_plan(&workout, catalog);
    Ok(())
}

fn cmd_validate(path: &Path) -> Result<()> {
    let workout = Workout::load_validated(path)?;
    println!(
        "✓ {} is valid ({} blocks after flattening)",
        workout.name,
        flatten(&workout.blocks).len()
    );
    Ok(())
}

fn cmd_history(paths: &DataPaths, days: i64) -> Result<()> {
    let records = load_recent_records(&paths.journal, &paths.csv, days)?;

    if records.is_empty() {
        println!("No sessions in the last {} days.", days);
        return Ok(());
    }

    for record in &records {
        let marker = match record.outcome {
            SessionOutcome::Completed => "✓",
            SessionOutcome::EndedEarly => "…",
        };
        println!(
            "{} {}  {}  {}/{} sets",
            marker,
            record.finished_at.format("%Y-%m-%d %H:%M"),
            record.workout_name,
            record.completed_sets(),
            record.total_sets()
        );
    }
    Ok(())
}

fn cmd_rollup(paths: &DataPaths, cleanup: bool) -> Result<()> {
    if !paths.journal.exists() {
        println!("No journal found - nothing to roll up.");
        return Ok(());
    }

    let count = workout_core::csv_rollup::journal_to_csv_and_archive(&paths.journal, &paths.csv)?;

    println!("✓ Rolled up {} sessions to CSV", count);
    println!("  CSV: {}", paths.csv.display());

    if cleanup {
        let cleaned = workout_core::csv_rollup::cleanup_processed(&paths.journal_dir)?;
        if cleaned > 0 {
            println!("✓ Cleaned up {} processed journal files", cleaned);
        }
    }

    Ok(())
}

fn cmd_init_config(path: Option<&Path>, force: bool) -> Result<()> {
    let target = path
        .map(Path::to_path_buf)
        .unwrap_or_else(Config::default_config_path);

    if target.exists() && !force {
        println!(
            "Config already exists at {} (use --force to overwrite)",
            target.display()
        );
        return Ok(());
    }

    let config = Config::default();
    match path {
        Some(path) => config.save_to(path)?,
        None => config.save()?,
    }

    println!("✓ Wrote default config to {}", target.display());
    Ok(())
}
