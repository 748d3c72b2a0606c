//! Waypace CLI - Command-line interface
//!
//! This binary provides a command-line interface to the waypace library:
//! compute the travel segment between two waypoints, served from the cache
//! when possible, from the routing provider when credentials are configured,
//! and from the haversine estimator otherwise.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::process;
use tokio_util::sync::CancellationToken;
use tracing::info;
use waypace::defaults::EffectiveTravel;
use waypace::estimate::{estimate_duration, haversine_distance};
use waypace::logging::{default_log_dir, default_log_file, init_logging};
use waypace::model::{TravelMode, Waypoint};
use waypace::orchestrator::SegmentOutcome;
use waypace::service::{CacheBackend, ServiceConfig, TravelService};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    /// On foot
    Walk,
    /// By car
    Drive,
    /// Public transport
    Transit,
}

impl From<Mode> for TravelMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Walk => TravelMode::Walk,
            Mode::Drive => TravelMode::Drive,
            Mode::Transit => TravelMode::Transit,
        }
    }
}

#[derive(Parser)]
#[command(name = "waypace")]
#[command(about = "Compute travel segments between waypoints", long_about = None)]
struct Args {
    /// Origin latitude in decimal degrees
    #[arg(long)]
    from_lat: f64,

    /// Origin longitude in decimal degrees
    #[arg(long)]
    from_lon: f64,

    /// Destination latitude in decimal degrees
    #[arg(long)]
    to_lat: f64,

    /// Destination longitude in decimal degrees
    #[arg(long)]
    to_lon: f64,

    /// Travel mode
    #[arg(long, value_enum, default_value = "walk")]
    mode: Mode,

    /// Request traffic-aware routing (only meaningful with --mode drive)
    #[arg(long)]
    traffic: bool,

    /// Routing provider API key (estimates only when absent)
    #[arg(long, env = "WAYPACE_API_KEY")]
    api_key: Option<String>,

    /// Segment cache directory (defaults to the platform cache dir)
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Recompute even when a cached segment exists
    #[arg(long)]
    force: bool,

    /// Wipe the segment cache and exit
    #[arg(long)]
    clear_cache: bool,
}

fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("waypace")
        .join("segments")
}

fn print_segment(distance_meters: f64, duration_seconds: u64, source: &str) {
    println!("Distance: {:.0} m", distance_meters);
    println!(
        "Duration: {} min {} s",
        duration_seconds / 60,
        duration_seconds % 60
    );
    println!("Source:   {}", source);
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let _guard = match init_logging(default_log_dir(), default_log_file()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error initializing logging: {}", e);
            process::exit(1);
        }
    };

    for (name, value) in [
        ("from-lat", args.from_lat),
        ("to-lat", args.to_lat),
    ] {
        if !(-90.0..=90.0).contains(&value) {
            eprintln!("Error: --{} must be between -90 and 90", name);
            process::exit(1);
        }
    }
    for (name, value) in [
        ("from-lon", args.from_lon),
        ("to-lon", args.to_lon),
    ] {
        if !(-180.0..=180.0).contains(&value) {
            eprintln!("Error: --{} must be between -180 and 180", name);
            process::exit(1);
        }
    }

    let cache_dir = args.cache_dir.clone().unwrap_or_else(default_cache_dir);
    let config = ServiceConfig {
        api_key: args.api_key.clone(),
        cache: CacheBackend::Disk(cache_dir),
        ..ServiceConfig::default()
    };

    let service = match TravelService::new(config) {
        Ok(service) => service,
        Err(e) => {
            eprintln!("Error creating travel service: {}", e);
            process::exit(1);
        }
    };

    if args.clear_cache {
        match service.clear_cache().await {
            Ok(()) => {
                println!("Segment cache cleared");
                return;
            }
            Err(e) => {
                eprintln!("Error clearing cache: {}", e);
                process::exit(1);
            }
        }
    }

    let from = Waypoint::new("from", args.from_lat, args.from_lon);
    let to = Waypoint::new("to", args.to_lat, args.to_lon);
    let mode = TravelMode::from(args.mode);
    let effective = EffectiveTravel {
        mode,
        traffic_aware: args.traffic && mode == TravelMode::Drive,
    };

    info!(
        mode = ?effective.mode,
        traffic = effective.traffic_aware,
        force = args.force,
        "Computing segment route"
    );

    let outcome = service
        .compute_segment_route(&from, &to, effective, args.force, &CancellationToken::new())
        .await;

    match outcome {
        Ok(SegmentOutcome::Cached(segment)) => {
            print_segment(segment.distance_meters, segment.duration_seconds, "cache");
        }
        Ok(SegmentOutcome::Computed(segment)) => {
            print_segment(segment.distance_meters, segment.duration_seconds, "provider");
        }
        Ok(SegmentOutcome::NoApiKey) => {
            // No credentials: straight-line estimate.
            let distance =
                haversine_distance(args.from_lat, args.from_lon, args.to_lat, args.to_lon);
            let duration = estimate_duration(distance, mode);
            print_segment(distance, duration, "estimate (straight line)");
        }
        Err(e) => {
            eprintln!("Error: {}", e.human_message());
            process::exit(1);
        }
    }
}
