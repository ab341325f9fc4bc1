//! `nostr-sim` entrypoint: loads scenario configuration, builds the engine,
//! wires the demo strategy and agents, runs to completion, and exports the
//! comprehensive report (§6, §9, §10). The engine, strategy, and metrics
//! crates are the deliverable; this binary is an outer driver only.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use demos::{BURST_SPAM_TICK, BurstSpamAgent, HONEST_USER_TICK, HonestUserAgent, content_based_labeler, FixedWindowRateLimit};
use sim_config::{OutputFormat, ScenarioConfig};
use sim_engine::{Engine, EngineConfig};
use sim_events::Payload;
use sim_report::PersistedReport;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;

#[derive(Parser, Debug)]
#[command(name = "nostr-sim", version, about = "Nostr anti-spam countermeasure simulator")]
struct Args {
    /// Scenario YAML config (overrides discovery of `scenario.yaml`).
    #[arg(long = "config")]
    config: Option<PathBuf>,

    /// Override the configured report output path.
    #[arg(long = "out")]
    out: Option<PathBuf>,
}

fn configure_logging() -> WorkerGuard {
    let log_dir = Path::new(".");
    let file_appender = tracing_appender::rolling::never(log_dir, "nostr-sim.log");
    let (writer, guard) = tracing_appender::non_blocking(file_appender);
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(writer)
        .try_init();
    guard
}

fn engine_config_from(scenario: &ScenarioConfig) -> EngineConfig {
    EngineConfig {
        duration: scenario.simulation.duration,
        time_step: scenario.simulation.time_step,
        max_events: scenario.simulation.max_events,
        metrics_interval: scenario.metrics.collection_interval,
        ..EngineConfig::default()
    }
}

fn run(args: Args) -> Result<()> {
    let scenario = sim_config::load_from(args.config.clone()).context("loading scenario config")?;
    info!(target: "runtime", duration = scenario.simulation.duration, "scenario config loaded");

    let mut engine = Engine::new(engine_config_from(&scenario)).context("constructing engine from scenario config")?;

    engine.register_anti_spam_strategy("fixed-window-rate-limit", Box::new(FixedWindowRateLimit::new(5, 60.0)));
    engine.set_event_labeler(Box::new(content_based_labeler));

    let seed = scenario.simulation.random_seed.unwrap_or(42);
    engine.register_handler(HONEST_USER_TICK, Box::new(HonestUserAgent::new("alice", 10.0)));
    engine.register_handler(BURST_SPAM_TICK, Box::new(BurstSpamAgent::new("spammer", 5.0, 8, seed)));

    engine.schedule_at(0.0, 0, HONEST_USER_TICK, Payload::new())?;
    engine.schedule_at(0.0, 0, BURST_SPAM_TICK, Payload::new())?;

    let stop_reason = engine.start().context("running simulation")?;
    info!(target: "runtime", reason = %stop_reason, events = engine.events_processed(), t = engine.current_time(), "run finished");

    let report = engine.comprehensive_report();
    let persisted = PersistedReport::new(
        report,
        engine.queue_size_series().to_vec(),
        engine.events_processed_series().to_vec(),
        engine.rate_series().to_vec(),
        scenario.metrics.collection_interval,
    );

    if scenario.metrics.enabled {
        // `load_from` already validated this parses; default covers only the
        // theoretical case of an un-validated `ScenarioConfig` built by hand.
        let format = scenario.metrics.output_format().unwrap_or(OutputFormat::Json);
        match args.out.as_ref().or(scenario.metrics.output_file.as_ref()) {
            Some(path) => sim_report::try_export(&persisted, path, format),
            None => println!("{}", render_for_stdout(&persisted, format)?),
        }
    }

    Ok(())
}

fn render_for_stdout(report: &PersistedReport, format: OutputFormat) -> Result<String> {
    Ok(report.render(format)?)
}

fn main() -> Result<()> {
    let args = Args::parse();
    let _log_guard = configure_logging();
    run(args)
}
