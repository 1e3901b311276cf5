//! Groundmark Runtime
//!
//! Headless skirmish that drives the ground decal handler through a
//! scripted stream of simulation events.

mod assets;
mod renderer;
mod scenario;
mod world;

use anyhow::{bail, Context, Result};
use groundmark_asset::{AssetTextureLoader, MemoryBitmaps, ResourceManifest};
use groundmark_core::events::{DecalEventQueue, EventContext};
use groundmark_core::glam::Vec3;
use groundmark_core::interfaces::FrameContext;
use groundmark_core::map::MapDims;
use groundmark_core::render::SharedBindings;
use groundmark_core::time::FrameClock;
use groundmark_core::{DecalConfig, FrameSummary, GroundDecalHandler};
use groundmark_metrics::{ChurnEvent, FramePass};
use renderer::{DemoRenderer, Gpu, Recorder};
use scenario::Scenario;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};
use world::{Terrain, World};

const FRAME_TIME: Duration = Duration::from_millis(33);
/// Camera window over the map, in world units.
const VIEW_MIN: f32 = 64.0;
const VIEW_MAX: f32 = 896.0;

struct Options {
    config: Option<PathBuf>,
    gpu: bool,
    frames: u64,
    seed: u64,
}

fn parse_args() -> Result<Options> {
    let mut options = Options {
        config: None,
        gpu: false,
        frames: 600,
        seed: 0x5eed,
    };

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--gpu" => options.gpu = true,
            "--frames" => {
                let value = args.next().context("--frames needs a value")?;
                options.frames = value.parse().context("--frames expects a number")?;
            }
            "--seed" => {
                let value = args.next().context("--seed needs a value")?;
                options.seed = value.parse().context("--seed expects a number")?;
            }
            flag if flag.starts_with("--") => bail!("unknown flag {flag}"),
            path => options.config = Some(PathBuf::from(path)),
        }
    }

    Ok(options)
}

fn load_config(path: Option<&PathBuf>) -> Result<DecalConfig> {
    let Some(path) = path else {
        return Ok(DecalConfig::default());
    };
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let config = DecalConfig::from_json_str(&json)?;
    info!(path = %path.display(), "decal config loaded");
    Ok(config)
}

fn accumulate(totals: &mut FrameSummary, frame: &FrameSummary) {
    totals.scars_registered += frame.scars_registered;
    totals.scars_evicted += frame.scars_evicted;
    totals.scars_expired += frame.scars_expired;
    totals.decals_destroyed += frame.decals_destroyed;
    totals.decals_drawn += frame.decals_drawn;
    totals.scars_drawn += frame.scars_drawn;
}

fn run<R: DemoRenderer>(
    config: DecalConfig,
    map: MapDims,
    mut loader: AssetTextureLoader<MemoryBitmaps, R>,
    options: &Options,
) -> Result<()> {
    let terrain = Terrain { map };
    let mut handler = GroundDecalHandler::new(config, map, &mut loader)?.with_rng_seed(options.seed);
    let mut world = World::default();
    let mut scenario = Scenario::new(terrain, options.seed);
    let mut queue = DecalEventQueue::new();
    let mut clock = FrameClock::new();
    let bindings = SharedBindings::default();
    let camera = |pos: Vec3, radius: f32| {
        pos.x + radius >= VIEW_MIN
            && pos.x - radius <= VIEW_MAX
            && pos.z + radius >= VIEW_MIN
            && pos.z - radius <= VIEW_MAX
    };

    info!(renderer = loader.uploader().name(), frames = options.frames, "skirmish started");

    let mut totals = FrameSummary::default();
    for frame in 0..options.frames {
        clock.set_sim_frame(frame);
        clock.begin_draw_frame(FRAME_TIME);

        if let Some(sun) = scenario.step(frame, clock.draw_frame(), &mut world, &mut queue) {
            handler.sun_changed(&sun, loader.uploader_mut().backend());
        }
        world.draw_ghosts(clock.draw_frame());

        let mut events = EventContext {
            clock: &clock,
            heights: &terrain,
            objects: &world,
            textures: &mut loader,
        };
        queue.drain_into(&mut handler, &mut events);

        let ctx = FrameContext {
            clock: &clock,
            heights: &terrain,
            culler: &camera,
            los: &world,
            objects: &world,
            bindings: &bindings,
        };
        let summary = handler.draw(&ctx, loader.uploader_mut().backend());
        loader.uploader_mut().end_frame()?;
        accumulate(&mut totals, &summary);

        if frame % 60 == 0 {
            debug!(
                frame,
                scars = handler.scars().len(),
                decals = handler.objects().len(),
                units = world.unit_count(),
                scars_drawn = summary.scars_drawn,
                decals_drawn = summary.decals_drawn,
                "frame"
            );
        }
    }

    info!(
        draw_calls = loader.uploader().draw_calls(),
        scars_registered = totals.scars_registered,
        scars_evicted = totals.scars_evicted,
        scars_expired = totals.scars_expired,
        decals_destroyed = totals.decals_destroyed,
        "skirmish finished"
    );
    for event in ChurnEvent::ALL {
        info!(counter = event.name(), value = handler.churn().get(event));
    }
    for pass in FramePass::ALL {
        info!(pass = pass.name(), avg_ms = handler.pass_timer().average_ms(pass));
    }

    handler.shutdown();
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    info!("Groundmark v{}", groundmark_core::VERSION);

    let options = parse_args()?;
    let config = load_config(options.config.as_ref())?;
    let manifest = ResourceManifest::default();
    let map = MapDims::new(128, 128);
    let bitmaps = assets::demo_bitmaps(&manifest, options.seed);

    if options.gpu {
        match groundmark_render::headless_device() {
            Ok((device, queue)) => {
                let renderer = Gpu::new(device, queue, map);
                return run(config, map, AssetTextureLoader::new(manifest, bitmaps, renderer), &options);
            }
            Err(err) => warn!(error = %err, "no GPU available, recording draw calls instead"),
        }
    }

    run(
        config,
        map,
        AssetTextureLoader::new(manifest, bitmaps, Recorder::default()),
        &options,
    )
}
