/// Headless cloud engine runner
///
/// Builds the scene, steps the fluid for a number of frames and walks a
/// camera across the terrain. Usage:
///
///     cloud-engine [config.toml] [--cpu] [--frames N]

use anyhow::{Context, Result};
use cloud_engine::collision::locomotion::set_player_controls;
use cloud_engine::collision::START_POSITION;
use cloud_engine::{
    CloudScene, ComputeBackend, CpuBackend, EngineConfig, MotorState, MoveInput, WgpuBackend,
};

const FRAME_TIME: f32 = 1.0 / 60.0;
const DEFAULT_FRAMES: u32 = 120;

struct Args {
    config: Option<String>,
    force_cpu: bool,
    frames: u32,
}

fn parse_args() -> Result<Args> {
    let mut args = Args {
        config: None,
        force_cpu: false,
        frames: DEFAULT_FRAMES,
    };
    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--cpu" => args.force_cpu = true,
            "--frames" => {
                let value = iter.next().context("--frames needs a value")?;
                args.frames = value
                    .parse()
                    .with_context(|| format!("invalid frame count '{}'", value))?;
            }
            _ => args.config = Some(arg),
        }
    }
    Ok(args)
}

fn create_backend(force_cpu: bool) -> Box<dyn ComputeBackend> {
    if !force_cpu {
        match WgpuBackend::new() {
            Ok(backend) => return Box::new(backend),
            Err(e) => log::warn!("[main] GPU unavailable ({}), using the CPU backend", e),
        }
    }
    Box::new(CpuBackend::new())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = parse_args()?;
    let config = match &args.config {
        Some(path) => EngineConfig::load(path).with_context(|| format!("loading {}", path))?,
        None => EngineConfig::default(),
    };

    let mut backend = create_backend(args.force_cpu);
    let mut scene =
        CloudScene::new(backend.as_mut(), &config).context("failed to build the scene")?;

    let mut camera = set_player_controls(&MotorState::default(), true);
    let walk = MoveInput {
        forward: true,
        ..Default::default()
    };

    for _ in 0..args.frames {
        scene.step(backend.as_mut(), FRAME_TIME)?;
        camera = scene.update_camera(&camera, &walk, (0.0, 0.0), FRAME_TIME);
    }

    let density = backend.read_field(scene.density_field())?;
    let total: f32 = density.iter().sum();
    let peak = density.iter().cloned().fold(0.0f32, f32::max);
    log::info!(
        "[main] {} frames: total density {:.3}, peak {:.3}",
        scene.frame(),
        total,
        peak
    );
    log::info!(
        "[main] Camera walked from {:?} to {:?}",
        START_POSITION,
        camera.position
    );
    Ok(())
}
