//! Chatter load generator
//!
//! Registers several pools of actors that keep forwarding a token to random
//! peers, mixing fire-and-forget sends with short bounded requires, then
//! shuts the system down and prints the runtime counters.
//!
//! Usage:
//!   chatter --names 5 --actors-per-name 5 --duration-ms 1000
//!   chatter --config config/actors.toml --json-logs

use actor_runtime::{ActorBehavior, ActorSystem, MessageKind, Payload, Reply, SystemConfig};
use anyhow::Result;
use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "chatter")]
#[command(about = "Random peer-to-peer traffic across actor pools")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of distinct actor names
    #[arg(long, default_value_t = 5)]
    names: usize,

    /// Instances registered under each name
    #[arg(long, default_value_t = 5)]
    actors_per_name: usize,

    /// How long to let traffic run before shutdown
    #[arg(long, default_value_t = 1000)]
    duration_ms: u64,

    /// Bound on each require issued by an actor
    #[arg(long, default_value_t = 10)]
    require_timeout_ms: i64,

    /// Enable JSON logging format
    #[arg(long)]
    json_logs: bool,
}

/// Forwards every token to a random peer; one in four forwards is a require
struct ChatterActor {
    peers: Arc<Vec<String>>,
    rng: StdRng,
    hops: Arc<AtomicU64>,
    require_timeout_ms: i64,
}

impl ActorBehavior for ChatterActor {
    fn receive(&mut self, system: &ActorSystem, _kind: MessageKind, payload: Payload) -> Reply {
        let token = payload.downcast::<u64>().map(|t| *t).unwrap_or_default();
        let next = &self.peers[self.rng.gen_range(0..self.peers.len())];

        let kind = if self.rng.gen_range(0..4) == 0 {
            if let Err(e) = system.require_millis(next, Box::new(token + 1), self.require_timeout_ms) {
                debug!(next = %next, error = %e, "Chatter require failed");
            }
            MessageKind::Require
        } else {
            system.request(next, Box::new(token + 1));
            MessageKind::Request
        };

        self.hops.fetch_add(1, Ordering::Relaxed);
        debug!(next = %next, kind = %kind, token, "Calling next actor");
        Some(Box::new(token))
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = SystemConfig::load(args.config.as_deref())?;

    init_logging(&args, &config);

    let system = ActorSystem::from_config(config)?;
    let peers: Arc<Vec<String>> = Arc::new((0..args.names).map(|i| format!("chatter{}", i)).collect());
    let hops = Arc::new(AtomicU64::new(0));

    for name in peers.iter() {
        for _ in 0..args.actors_per_name {
            system.add_actor(
                name.as_str(),
                ChatterActor {
                    peers: Arc::clone(&peers),
                    rng: StdRng::from_entropy(),
                    hops: Arc::clone(&hops),
                    require_timeout_ms: args.require_timeout_ms,
                },
            )?;
        }
    }

    info!(
        names = args.names,
        actors_per_name = args.actors_per_name,
        duration_ms = args.duration_ms,
        "Starting chatter"
    );

    if let Some(first) = peers.first() {
        system.request(first, Box::new(0u64));
    }
    std::thread::sleep(Duration::from_millis(args.duration_ms));
    system.shutdown()?;

    let stats = system.metrics().snapshot();
    println!("Actor system total call count: {}", hops.load(Ordering::Relaxed));
    println!("{:#?}", stats);
    Ok(())
}

fn init_logging(args: &Args, config: &SystemConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    if args.json_logs {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
