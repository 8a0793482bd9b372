// Copyright 2025 Servus Altissimi (Pseudonym)

// Permission is hereby granted, free of charge, to any person obtaining a copy of this software and associated documentation files (the "Software"), to deal in the Software without restriction, including without limitation the rights to use, copy, modify, merge, publish, distribute, sublicense, and/or sell copies of the Software, and to permit persons to whom the Software is furnished to do so, subject to the following conditions:
// The above copyright notice and this permission notice shall be included in all copies or substantial portions of the Software.
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

use packetlab::metrics::logger::RecordLogger;
use packetlab::prelude::*;
use packetlab::simulation::drive;
use packetlab::terminal;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{Level, info, warn};

const DEMO_SCRIPT: &[&str] = &[
    "help",
    "show devices",
    "ping 192.168.0.1 192.168.0.3",
    "sendpacket 192.168.0.1 192.168.0.3 TCP",
    "sendpacket 192.168.0.3 192.168.0.1 UDP",
];

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long, global = true)]
    verbose: bool,

    /// JSON file with simulation settings
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Prebuilt topology: empty, example, line, star or ring
    #[arg(short, long, global = true)]
    scenario: Option<String>,

    #[arg(short = 'n', long, global = true)]
    devices: Option<u32>,

    /// Write one CSV row per finished transmission here on exit
    #[arg(short, long, global = true)]
    records: Option<PathBuf>,

    #[arg(long, global = true)]
    tick_ms: Option<u64>,

    #[arg(long, global = true)]
    seed: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Read terminal commands from stdin
    Repl,

    /// Run terminal commands from a file, then wait for every transmission to finish
    Script { path: PathBuf },

    /// Build the three-device example and walk through ping and sendpacket
    Demo,
}

#[tokio::main]
async fn main() -> Result<()> {
    let program_start = Instant::now();

    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();

    let config = build_config(&cli)?;
    info!("packetlab: {}", config.name);
    info!("Scenario: {:?}, tick: {}ms", config.scenario, config.tick_ms);

    let mut sim = Simulator::new(config.clone());
    let ids = config.scenario.build(&mut sim, config.devices)?;
    info!("Topology ready with {} device(s)", ids.len());
    sim.drain_events();

    let (tx, rx) = mpsc::channel::<String>(64);
    let cancel = CancellationToken::new();

    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, stopping");
            interrupt.cancel();
        }
    });

    let echo = match &cli.command {
        Commands::Repl => {
            tokio::spawn(async move {
                let mut lines = BufReader::new(tokio::io::stdin()).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    if tx.send(line).await.is_err() {
                        break;
                    }
                }
            });
            false
        }
        Commands::Script { path } => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading script {}", path.display()))?;
            feed(tx, text.lines().map(str::to_string).collect());
            true
        }
        Commands::Demo => {
            feed(tx, DEMO_SCRIPT.iter().map(|l| l.to_string()).collect());
            true
        }
    };

    let mut logger = match &cli.records {
        Some(path) => Some(RecordLogger::new(path)?),
        None => None,
    };

    println!("{}", terminal::PROMPT_READY);

    let sim = drive(
        sim,
        rx,
        cancel,
        |sim, line| {
            if echo {
                println!("> {}", line);
            }
            for out in terminal::execute(sim, line) {
                println!("{}", out);
            }
        },
        |sim, events| {
            for out in terminal::render(sim, events) {
                println!("{}", out);
            }
            let finished = events.iter().any(|e| {
                matches!(
                    e,
                    SimEvent::TransmissionCompleted { .. } | SimEvent::TransmissionAborted { .. }
                )
            });
            if let (true, Some(logger)) = (finished, logger.as_mut()) {
                for record in sim.metrics().take_records() {
                    if let Err(e) = logger.log(&record) {
                        warn!("Failed to write record #{}: {}", record.request_id, e);
                    }
                }
            }
        },
    )
    .await;

    report(&sim);

    if let (Some(path), Some(mut logger)) = (&cli.records, logger) {
        logger.log_batch(&sim.metrics().take_records())?;
        info!("Transmission records saved to: {}", path.display());
    }

    let total_time = program_start.elapsed();
    info!("Total runtime: {:.2}s", total_time.as_secs_f64());

    Ok(())
}

fn build_config(cli: &Cli) -> Result<SimConfig> {
    let mut config = match &cli.config {
        Some(path) => SimConfig::load(path)?,
        None => SimConfig::default(),
    };

    if matches!(cli.command, Commands::Demo) {
        config = config.with_scenario(Scenario::Example, 3);
    }
    if let Some(name) = &cli.scenario {
        let scenario: Scenario = name.parse()?;
        let devices = cli.devices.unwrap_or(config.devices);
        config = config.with_scenario(scenario, devices);
    } else if let Some(devices) = cli.devices {
        config.devices = devices;
    }
    if let Some(ms) = cli.tick_ms {
        config = config.with_tick(Duration::from_millis(ms));
    }
    if let Some(seed) = cli.seed {
        config = config.with_seed(seed);
    }

    config.validate()?;
    Ok(config)
}

/// Script lines are queued up front; comments and blank lines are skipped.
fn feed(tx: mpsc::Sender<String>, lines: Vec<String>) {
    tokio::spawn(async move {
        for line in lines {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if tx.send(line.to_string()).await.is_err() {
                break;
            }
        }
    });
}

fn report(sim: &Simulator) {
    let snapshot = sim.metrics().snapshot();
    info!("");
    info!("Session summary");
    info!("  Ticks run:              {}", sim.ticks());
    info!("  Transmissions queued:   {}", snapshot.transmissions_submitted);
    info!("  Rejected:               {}", snapshot.transmissions_rejected);
    info!("  Completed:              {}", snapshot.transmissions_completed);
    info!("  Aborted:                {}", snapshot.transmissions_aborted);
    info!("  Hops advanced:          {}", snapshot.hops_advanced);
    info!("  Avg hops/transmission:  {:.2}", snapshot.avg_hops_per_transmission);
    info!("  Pings:                  {}", snapshot.pings);
    if snapshot.consistency_faults > 0 {
        warn!("  Consistency faults:     {}", snapshot.consistency_faults);
    }
}
