//! FrameSched - Frame-Synchronized Task Scheduler
//!
//! CLI entry point for pacing and soak-testing the worker pool.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use clap::{CommandFactory, Parser};
use eyre::{Context, Result};
use rand::Rng;
use tracing::info;

use framesched::cli::{Cli, Command, OutputFormat};
use framesched::config::Config;
use framesched::events::EventQueue;
use framesched::scheduler::{Scheduler, SchedulerStats};
use framesched::subsystem::Subsystem;
use framesched::task::{Chain, Flow, block};

fn setup_logging(verbose: bool) -> Result<()> {
    // Logs go to stderr so reports on stdout stay machine-readable
    let level = if verbose { tracing::Level::DEBUG } else { tracing::Level::INFO };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (verbose: {})", verbose);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    setup_logging(cli.verbose).context("Failed to setup logging")?;

    // Load configuration
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    info!(
        "FrameSched loaded config: workers={}, frame-hz={}",
        config.scheduler.workers, config.scheduler.frame_hz
    );

    // Dispatch command
    match cli.command {
        Some(Command::Pace { secs, workers }) => cmd_pace(config, secs, workers),
        Some(Command::Soak {
            secs,
            tasks,
            chains,
            format,
        }) => cmd_soak(config, secs, tasks, chains, format),
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    }
}

/// Counts frame ticks and drains a shared event queue each frame
struct PulseSubsystem {
    name: String,
    ticks: Arc<AtomicU64>,
    events: Arc<EventQueue<u64>>,
    drained: Arc<AtomicU64>,
}

impl Subsystem for PulseSubsystem {
    fn handle_events(&mut self, _frame_deadline: Instant) {
        let batch = self.events.drain();
        self.drained.fetch_add(batch.len() as u64, Ordering::Relaxed);
    }

    fn run_batch(&mut self) {
        self.ticks.fetch_add(1, Ordering::Relaxed);
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Run the pool with no task load and compare observed ticks to nominal
fn cmd_pace(mut config: Config, secs: Option<u64>, workers: Option<usize>) -> Result<()> {
    if let Some(secs) = secs {
        config.workload.run_secs = secs;
    }
    if let Some(workers) = workers {
        config.scheduler.workers = workers;
    }

    let ticks = Arc::new(AtomicU64::new(0));
    let events = Arc::new(EventQueue::new());
    let drained = Arc::new(AtomicU64::new(0));
    let subsystem = PulseSubsystem {
        name: "pulse".to_string(),
        ticks: Arc::clone(&ticks),
        events: Arc::clone(&events),
        drained: Arc::clone(&drained),
    };

    println!(
        "Pacing {} worker(s) for {}s at {} Hz...",
        config.scheduler.workers, config.workload.run_secs, config.scheduler.frame_hz
    );

    let scheduler = Scheduler::start(config.scheduler.clone(), vec![Box::new(subsystem)])?;
    let handle = scheduler.handle();
    std::thread::sleep(config.workload.run_duration());
    scheduler.shutdown();

    let stats = handle.stats();
    let nominal = config.scheduler.frame_hz as u64 * config.workload.run_secs;
    println!("Subsystem ticks: {} (nominal: {})", ticks.load(Ordering::Relaxed), nominal);
    println!("Pool frame ticks: {}", stats.frame_ticks);

    Ok(())
}

/// Drive a synthetic task and chain workload through the pool
fn cmd_soak(
    mut config: Config,
    secs: Option<u64>,
    tasks: Option<u32>,
    chains: Option<u32>,
    format: OutputFormat,
) -> Result<()> {
    if let Some(secs) = secs {
        config.workload.run_secs = secs;
    }
    if let Some(tasks) = tasks {
        config.workload.tasks = tasks;
    }
    if let Some(chains) = chains {
        config.workload.chains = chains;
    }

    let ticks = Arc::new(AtomicU64::new(0));
    let events = Arc::new(EventQueue::new());
    let drained = Arc::new(AtomicU64::new(0));
    let subsystem = PulseSubsystem {
        name: "pulse".to_string(),
        ticks: Arc::clone(&ticks),
        events: Arc::clone(&events),
        drained: Arc::clone(&drained),
    };

    let scheduler = Scheduler::start(config.scheduler.clone(), vec![Box::new(subsystem)])?;
    let handle = scheduler.handle();

    let completed = Arc::new(AtomicU64::new(0));
    let mut rng = rand::rng();

    for id in 0..config.workload.tasks {
        let delay = Duration::from_millis(rng.random_range(0..=config.workload.max_delay_ms));
        let events = Arc::clone(&events);
        let completed = Arc::clone(&completed);
        handle.submit_after(delay, move || {
            events.push(id as u64);
            completed.fetch_add(1, Ordering::Relaxed);
        });
    }

    for _ in 0..config.workload.chains {
        let delay = Duration::from_millis(rng.random_range(0..=config.workload.max_delay_ms));
        let attempts = Arc::new(AtomicU64::new(0));
        let completed = Arc::clone(&completed);
        let chain = Chain::new(vec![
            block(|| Flow::Continue),
            block(move || {
                // First pass hands the chain back so it retries once
                if attempts.fetch_add(1, Ordering::Relaxed) == 0 {
                    Flow::Requeue
                } else {
                    Flow::Continue
                }
            }),
            block(move || {
                completed.fetch_add(1, Ordering::Relaxed);
                Flow::Continue
            }),
        ]);
        handle.submit_chain_after(delay, chain);
    }

    println!(
        "Soaking {} tasks and {} chains for {}s...",
        config.workload.tasks, config.workload.chains, config.workload.run_secs
    );
    std::thread::sleep(config.workload.run_duration());
    scheduler.shutdown();

    let stats = handle.stats();
    report(
        &stats,
        ticks.load(Ordering::Relaxed),
        drained.load(Ordering::Relaxed),
        completed.load(Ordering::Relaxed),
        &format,
    )
}

/// Print the soak report in the requested format
fn report(stats: &SchedulerStats, ticks: u64, drained: u64, completed: u64, format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let json = serde_json::json!({
                "completed": completed,
                "frame-ticks": stats.frame_ticks,
                "subsystem-ticks": ticks,
                "events-drained": drained,
                "tasks-executed": stats.tasks_executed,
                "chains-resumed": stats.chains_resumed,
                "peak-in-flight": stats.peak_in_flight,
                "peak-queue-depth": stats.peak_queue_depth,
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Text => {
            println!("Soak Report");
            println!("-----------");
            println!("Completed callables: {}", completed);
            println!("Tasks executed:      {}", stats.tasks_executed);
            println!("Chains resumed:      {}", stats.chains_resumed);
            println!("Frame ticks:         {}", stats.frame_ticks);
            println!("Subsystem ticks:     {}", ticks);
            println!("Events drained:      {}", drained);
            println!("Peak in flight:      {}", stats.peak_in_flight);
            println!("Peak queue depth:    {}", stats.peak_queue_depth);
        }
    }

    Ok(())
}
