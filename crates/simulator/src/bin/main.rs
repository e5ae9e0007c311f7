//! Obelisk consensus simulator CLI.
//!
//! Drives a synthetic peer network through discrete steps. Reproducible:
//! the same seed produces the same trace.
//!
//! ```bash
//! # Run with a fixed seed
//! obelisk-sim 42
//!
//! # Seed from the wall clock
//! obelisk-sim
//! ```

use clap::Parser;
use obelisk_kernel::{Dashboard, Engine};
use obelisk_simulator::{build_topology, SimulatorConfig, TermDashboard};
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Obelisk consensus simulator.
#[derive(Parser, Debug)]
#[command(name = "obelisk-sim")]
#[command(version, about, long_about = None)]
struct Args {
    /// PRNG seed for a reproducible run. Seeded from the wall clock when
    /// omitted.
    seed: Option<u64>,

    /// Wall-clock milliseconds per tick. Presentation pacing only.
    #[arg(long, default_value = "100")]
    tick_ms: u64,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let seed = args.seed.unwrap_or_else(|| {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or_default()
    });

    let config = SimulatorConfig::default();
    info!(
        seed,
        nodes = config.nodes,
        peer_degree = config.peer_degree,
        blocksteps = config.blocksteps,
        quorum = config.quorum(),
        "starting simulation"
    );

    let engine = Arc::new(Engine::new(seed));
    let dashboard: Arc<dyn Dashboard> = Arc::new(TermDashboard::new());

    let nodes = match build_topology(&engine, &dashboard, &config) {
        Ok(nodes) => nodes,
        Err(err) => {
            error!(%err, "initialization failed");
            return ExitCode::FAILURE;
        }
    };

    let run = Arc::new(AtomicBool::new(true));
    let worker = {
        let engine = Arc::clone(&engine);
        let dashboard = Arc::clone(&dashboard);
        let run = Arc::clone(&run);
        let tick = Duration::from_millis(args.tick_ms.max(1));
        std::thread::spawn(move || {
            let mut next = Instant::now() + tick;
            while run.load(Ordering::Relaxed) {
                dashboard.set_step(engine.current_step());
                engine.step();

                let now = Instant::now();
                if now < next {
                    std::thread::sleep(next - now);
                }
                while next <= Instant::now() {
                    next += tick;
                }
            }
        })
    };

    // The dashboard owns the main thread until the operator exits; the
    // worker stops at the next tick boundary.
    dashboard.run();
    run.store(false, Ordering::Relaxed);
    let _ = worker.join();

    let committed: u64 = nodes.iter().map(|n| n.stats().blocks_committed()).sum();
    let admitted: u64 = nodes.iter().map(|n| n.stats().txs_admitted).sum();
    info!(
        steps = engine.current_step(),
        nodes = nodes.len(),
        committed_blocks = committed,
        admitted_txs = admitted,
        "simulation stopped"
    );
    ExitCode::SUCCESS
}
