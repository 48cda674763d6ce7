use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use aeroswarm::config::{AppConfig, LoggingConfig};
use aeroswarm::error::Result;
use aeroswarm::{
    build_fleet, Coordinator, FrameBroadcaster, FrameTree, LinearTrajectoryGenerator, MissionGoal,
    Pose, SimFollowPath, SimFollowReference, TrajectorySampler, Waypoint, YawAngle,
};

#[derive(Parser)]
#[command(name = "aeroswarm", about = "Drone formation motion-coordination engine")]
struct Cli {
    /// Path to the configuration file
    #[arg(long, global = true, default_value = "aeroswarm.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fly a demo mission over simulated action servers
    Run {
        /// Override the configured agent count (roster becomes drone0..droneN-1)
        #[arg(long)]
        agents: Option<usize>,
    },
    /// Validate the configuration file and print the effective values
    CheckConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load_from(&cli.config)?;
    init_logging(&config.logging);

    match cli.command {
        Commands::Run { agents } => run_demo_mission(config, agents).await,
        Commands::CheckConfig => {
            println!("{}", toml::to_string_pretty(&config).unwrap_or_default());
            Ok(())
        }
    }
}

fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.clone()));
    if config.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn run_demo_mission(config: AppConfig, agents_override: Option<usize>) -> Result<()> {
    let names: Vec<String> = match agents_override {
        Some(n) => (0..n).map(|i| format!("drone{i}")).collect(),
        None => config.formation.agents.clone(),
    };

    let tree = Arc::new(FrameTree::new());
    let broadcaster = FrameBroadcaster::new(
        tree.clone(),
        &config.formation.world_frame,
        &config.formation.formation_frame,
    );

    let init_timeout = Duration::from_secs(config.coordinator.init_timeout_secs);
    let fleet = build_fleet(
        &names,
        config.formation.spacing,
        &broadcaster,
        |_| Arc::new(SimFollowReference::tracking()),
        config.formation.agent_max_speed,
        init_timeout,
    );

    let sampler = TrajectorySampler::new(
        Box::new(LinearTrajectoryGenerator::new()),
        config.trajectory.sample_dt,
        config.trajectory.lookahead_len,
    );
    let seed = config.formation.initial_centroid;
    let centroid = Pose::from_xyz(seed.x, seed.y, seed.z);

    let (coordinator, handle) = Coordinator::new(
        config.coordinator.clone(),
        fleet,
        tree,
        broadcaster,
        sampler,
        Arc::new(SimFollowPath::succeeding()),
        centroid,
    );
    let coordinator_task = tokio::spawn(coordinator.run());

    let goal = MissionGoal {
        frame_id: config.formation.world_frame.clone(),
        path: vec![
            Waypoint::new("wp1", Pose::from_xyz(1.0, 0.0, 1.0)),
            Waypoint::new("wp2", Pose::from_xyz(2.0, 0.0, 1.0)),
        ],
        yaw_swarm: YawAngle { angle: 0.0 },
        max_speed: 1.0,
    };
    info!(waypoints = goal.path.len(), "submitting demo mission");
    let (mut feedback_rx, mut result_rx) = handle.submit_mission(goal).await?;

    loop {
        tokio::select! {
            Some(feedback) = feedback_rx.recv() => {
                info!(
                    distance_to_next_waypoint = feedback.actual_distance_to_next_waypoint,
                    "mission feedback"
                );
            }
            result = &mut result_rx => {
                match result {
                    Ok(result) => info!(
                        swarm_success = result.swarm_success,
                        reason = result.reason.as_deref().unwrap_or("-"),
                        "mission finished"
                    ),
                    Err(_) => warn!("coordinator dropped the mission result"),
                }
                break;
            }
            _ = signal::ctrl_c() => {
                warn!("interrupt received, cancelling mission");
                handle.cancel().await?;
            }
        }
    }

    handle.shutdown().await?;
    let _ = coordinator_task.await;
    Ok(())
}
