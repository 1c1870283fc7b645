//! Run one simulated gyro turn and print the result.
//!
//! Usage:
//!   cargo run -p gyro_turn_sitl --bin turn_sim -- [OPTIONS]
//!
//! Set `RUST_LOG=debug` to see phase transitions.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use gyro_turn_core::TurnDirection;
use gyro_turn_sitl::{build_pilot, SimConfig, SimulatorError};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Direction {
    Left,
    Right,
}

impl From<Direction> for TurnDirection {
    fn from(d: Direction) -> Self {
        match d {
            Direction::Left => TurnDirection::Left,
            Direction::Right => TurnDirection::Right,
        }
    }
}

/// Simulated in-place turn on a two-wheeled robot
#[derive(Parser, Debug)]
#[command(name = "turn_sim")]
#[command(version)]
struct Args {
    /// Rotation direction
    #[arg(short, long, value_enum, default_value = "right")]
    direction: Direction,

    /// Target angle in degrees
    #[arg(short, long, default_value = "90")]
    angle: f32,

    /// Motor power; sign is ignored and the magnitude is clamped
    #[arg(short, long, default_value = "50", allow_hyphen_values = true)]
    speed: i32,

    /// JSON scenario file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// RNG seed, overrides the scenario's
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<(), SimulatorError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => SimConfig::from_json_file(path)?,
        None => SimConfig::default(),
    };
    if args.seed.is_some() {
        config.robot.seed = args.seed;
    }

    let (robot, mut pilot) = build_pilot(&config);

    let calibration = pilot.calibrate().map_err(SimulatorError::Calibration)?;
    println!(
        "calibration: bias {:.3} dps, spread {:.3} dps, {} samples",
        calibration.bias_dps, calibration.spread_dps, calibration.samples
    );

    let start_heading = robot.heading_deg();
    let start_us = robot.now_us();
    let report = pilot.turn(args.direction.into(), args.angle, args.speed);
    let turned = (robot.heading_deg() - start_heading).abs();

    println!("outcome:          {}", report.outcome.as_str());
    println!("effective speed:  {}", report.effective_speed);
    println!("early-stop buffer {:.1} deg", report.stop_early_buffer_deg);
    println!("rough exit:       {:.2} deg", report.rough_exit_angle_deg.abs());
    println!("estimated angle:  {:.2} deg", report.final_angle_deg.abs());
    println!("true rotation:    {:.2} deg", turned);
    println!("correction time:  {} ms", report.correction_elapsed_ms);
    println!("turn duration:    {} ms", (robot.now_us() - start_us) / 1000);
    println!("motor commands:   {}", robot.command_log().len());

    Ok(())
}
