//! Headless driver: runs the locomotion controller without a renderer and
//! prints player telemetry as JSON lines.

use clap::Parser;
use log::{error, info};
use rapier3d::prelude::*;
use std::path::PathBuf;
use std::process;

use village_sim::player_state::JumpTrigger;
use village_sim::{MovementIntent, PhysicsManager, SimConfig};

#[derive(Parser)]
#[command(name = "village-sim")]
#[command(about = "Headless character locomotion simulation", long_about = None)]
struct Cli {
    /// Path to a sim.toml configuration file
    #[arg(short, long, env = "VILLAGE_SIM_CONFIG")]
    config: Option<PathBuf>,
    /// Number of frames to simulate
    #[arg(short, long, default_value = "600")]
    frames: u32,
    /// Frame time in seconds
    #[arg(long, default_value = "0.016666668")]
    dt: f32,
    /// Disable gravity and move freely (overrides the config file)
    #[arg(long)]
    fly: bool,
    /// Hold the run key
    #[arg(long)]
    run: bool,
    /// Press jump every N frames (0 = never)
    #[arg(long, default_value = "0")]
    jump_every: u32,
    /// Movement direction as x,y,z
    #[arg(long, value_parser = parse_direction, default_value = "0,0,1", allow_hyphen_values = true)]
    direction: [f32; 3],
    /// Print telemetry every N frames
    #[arg(long, default_value = "10")]
    print_every: u32,
}

fn parse_direction(s: &str) -> Result<[f32; 3], String> {
    let parts: Vec<f32> = s
        .split(',')
        .map(|p| p.trim().parse::<f32>().map_err(|e| format!("invalid component '{}': {}", p, e)))
        .collect::<Result<_, _>>()?;
    match parts.as_slice() {
        [x, y, z] => Ok([*x, *y, *z]),
        _ => Err(format!("expected 3 comma-separated components, got {}", parts.len())),
    }
}

/// A step and a walkable ramp in front of the default start position.
fn add_demo_statics(manager: &mut PhysicsManager, start: Vector<Real>) {
    let ahead = |dz: f32, y: f32| vector![start.x, y, start.z + dz];
    manager.add_static_box(ahead(3.0, 0.1), vector![4.0, 0.2, 1.0]);
    manager.add_static_box_rotated(
        ahead(8.0, 0.0),
        vector![4.0, 0.5, 6.0],
        Rotation::from_axis_angle(&Vector::x_axis(), -20.0f32.to_radians()),
    );
    manager.add_static_sphere(ahead(-4.0, 0.0), 1.0);
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => match SimConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                error!("{}", e);
                process::exit(1);
            }
        },
        None => SimConfig::default(),
    };
    config.fly_mode |= cli.fly;

    let mut manager = match PhysicsManager::from_config(&config) {
        Ok(manager) => manager,
        Err(e) => {
            error!("Failed to initialize physics: {}", e);
            process::exit(1);
        }
    };
    if let Err(e) = manager.add_capsule_player() {
        error!("Failed to create player: {}", e);
        process::exit(1);
    }
    add_demo_statics(&mut manager, config.player.start_position());

    let [x, y, z] = cli.direction;
    let direction = vector![x, y, z].try_normalize(1.0e-6).unwrap_or_else(Vector::zeros);
    let mut jump_key = JumpTrigger::default();
    let mut jumps = 0u32;

    info!(
        "Simulating {} frames at dt={} (fly={}, run={})",
        cli.frames, cli.dt, config.fly_mode, cli.run
    );

    for frame in 0..cli.frames {
        let pressed = cli.jump_every > 0 && frame % cli.jump_every == 0;
        let intent = MovementIntent {
            direction,
            running: cli.run,
            jump: jump_key.update(pressed),
        };
        if manager.frame(cli.dt, &intent) {
            jumps += 1;
        }

        if cli.print_every > 0 && frame % cli.print_every == 0 {
            match serde_json::to_string(&manager.telemetry()) {
                Ok(line) => println!("{}", line),
                Err(e) => error!("Failed to serialize telemetry: {}", e),
            }
        }
    }

    let position = manager.player_position();
    info!(
        "Done: player at ({:.2}, {:.2}, {:.2}), grounded={}, {} jumps",
        position.x,
        position.y,
        position.z,
        manager.is_player_grounded(),
        jumps
    );
    manager.cleanup();
}
