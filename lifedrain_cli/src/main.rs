use clap::{Parser, Subcommand};
use lifedrain_core::*;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "lifedrain")]
#[command(about = "Study vitality meter that drains while you idle", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Use this config file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Log engine transitions to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a JSONL event journal and report the meters
    Replay {
        /// Journal to replay
        journal: PathBuf,

        /// Write a per-step CSV trace
        #[arg(long)]
        trace: Option<PathBuf>,

        /// Restore meter values from and save them to this snapshot
        #[arg(long)]
        state: Option<PathBuf>,
    },

    /// Simulate a study session for one category
    Simulate {
        /// Category (deck) id
        #[arg(long, default_value_t = 1)]
        category: i64,

        /// Number of work items to study
        #[arg(long, default_value_t = 20)]
        items: u32,

        /// Seconds spent on each item before completing it
        #[arg(long, default_value_t = 10)]
        seconds_per_item: u64,

        /// Undo every Nth completed item
        #[arg(long)]
        undo_every: Option<u32>,

        /// Record the generated events to this journal
        #[arg(long)]
        record: Option<PathBuf>,
    },

    /// Inspect or create the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Write the default configuration
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    lifedrain_core::logging::init_with_level(if cli.verbose { "debug" } else { "warn" });

    let config = match &cli.config {
        Some(path) if path.exists() => Config::load_from(path)?,
        Some(path) => {
            tracing::info!("No config file found at {:?}, using defaults", path);
            Config::default()
        }
        None => Config::load()?,
    };
    let data_dir = cli
        .data_dir
        .clone()
        .unwrap_or_else(|| config.data.data_dir.clone());

    match cli.command {
        Commands::Replay {
            journal,
            trace,
            state,
        } => {
            let state = state.or_else(|| default_state_path(&config, &data_dir));
            cmd_replay(&config, &journal, trace.as_deref(), state.as_deref())
        }
        Commands::Simulate {
            category,
            items,
            seconds_per_item,
            undo_every,
            record,
        } => cmd_simulate(
            &config,
            CategoryKey(category),
            items,
            seconds_per_item,
            undo_every,
            record.as_deref(),
        ),
        Commands::Config { action } => {
            let path = cli.config.unwrap_or_else(Config::default_config_path);
            cmd_config(&config, action, &path)
        }
    }
}

fn default_state_path(config: &Config, data_dir: &Path) -> Option<PathBuf> {
    if config.persistence.keep_values {
        Some(data_dir.join("meters.json"))
    } else {
        None
    }
}

fn cmd_replay(
    config: &Config,
    journal: &Path,
    trace: Option<&Path>,
    state: Option<&Path>,
) -> Result<()> {
    let steps = read_journal(journal)?;
    tracing::info!("Replaying {} steps from {:?}", steps.len(), journal);
    let snapshot = match state {
        Some(path) => Some(MeterSnapshot::load(path)?),
        None => None,
    };

    let mut replayer = Replayer::new(config.drain());
    for step in &steps {
        replayer.apply(step)?;
        // Saved values replace the full meters a fresh profile starts with
        if let (ScriptStep::Event(Event::ProfileLoaded { .. }), Some(snapshot)) = (step, &snapshot)
        {
            replayer.engine_mut().restore(snapshot);
        }
    }

    println!(
        "Replayed {} steps over {:.1}s",
        steps.len(),
        replayer.elapsed_ms() as f64 / 1000.0
    );
    print_report(replayer.engine());

    if let Some(path) = trace {
        lifedrain_core::trace::write_csv(path, replayer.trace())?;
        println!("✓ Trace written to {}", path.display());
    }

    if let Some(path) = state {
        replayer.engine().snapshot().save(path)?;
        println!("✓ Meter values saved to {}", path.display());
    }

    Ok(())
}

fn cmd_simulate(
    config: &Config,
    category: CategoryKey,
    items: u32,
    seconds_per_item: u64,
    undo_every: Option<u32>,
    record: Option<&Path>,
) -> Result<()> {
    let steps = study_session(category, items, seconds_per_item, undo_every);

    let mut replayer = Replayer::new(config.drain());
    replayer.run(&steps)?;

    if let Some(path) = record {
        let mut journal = JsonlJournal::new(path);
        for step in &steps {
            journal.append(step)?;
        }
        println!("✓ Recorded {} steps to {}", steps.len(), path.display());
    }

    println!(
        "Studied {} items in {:.1}s",
        items,
        replayer.elapsed_ms() as f64 / 1000.0
    );
    print_report(replayer.engine());
    Ok(())
}

/// Overview, then review `items` work items, then back to the overview.
fn study_session(
    category: CategoryKey,
    items: u32,
    seconds_per_item: u64,
    undo_every: Option<u32>,
) -> Vec<ScriptStep> {
    let mut steps: Vec<ScriptStep> = vec![
        Event::ProfileLoaded {
            categories: vec![category],
        }
        .into(),
        Event::ScreenChanged {
            screen: Screen::Overview,
            category: Some(category),
        }
        .into(),
        Event::ScreenChanged {
            screen: Screen::Review,
            category: Some(category),
        }
        .into(),
    ];

    for n in 1..=items {
        steps.push(Event::WorkItemPresented.into());
        steps.push(ScriptStep::Advance {
            advance_ms: seconds_per_item.saturating_mul(1000),
        });
        steps.push(Event::WorkItemCompleted.into());
        if matches!(undo_every, Some(every) if every > 0 && n % every == 0) {
            steps.push(Event::SessionReset.into());
        }
    }

    steps.push(
        Event::ScreenChanged {
            screen: Screen::Overview,
            category: Some(category),
        }
        .into(),
    );
    steps
}

fn print_report<D: TimerDriver>(engine: &DrainEngine<D>) {
    let max = engine.store().max();
    for (key, value) in engine.store().values() {
        println!("  Category {}: {}/{}", key, value, max);
    }
    match engine.current_visible_value() {
        Some(value) => println!("Visible value: {}", value),
        None => println!("Visible value: hidden"),
    }
    println!(
        "Drain timer: {}",
        if engine.timer_running() { "running" } else { "stopped" }
    );
}

fn cmd_config(config: &Config, action: ConfigAction, path: &Path) -> Result<()> {
    match action {
        ConfigAction::Show => {
            print!("{}", config.normalized().to_toml()?);
        }
        ConfigAction::Init { force } => {
            if path.exists() && !force {
                return Err(Error::Config(format!(
                    "{} already exists (use --force to overwrite)",
                    path.display()
                )));
            }
            Config::default().save_to(path)?;
            println!("✓ Wrote default config to {}", path.display());
        }
    }
    Ok(())
}
