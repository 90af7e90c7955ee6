use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use strata_blocks::{BlockRegistry, ids};
use strata_geom::{Vec3, VoxelPos};
use strata_io::SaveSystem;
use strata_runtime::WorldRuntime;
use strata_world::WorldConfig;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// World configuration (TOML); built-in defaults when the file is missing
    #[arg(long, default_value = "assets/world.toml")]
    config: PathBuf,

    /// Block catalog (TOML); the built-in catalog when omitted
    #[arg(long)]
    blocks: Option<PathBuf>,

    /// Directory holding saved worlds
    #[arg(long, default_value = "saves")]
    save_dir: PathBuf,

    /// Number of foreground ticks to run
    #[arg(long, default_value = "600")]
    ticks: usize,

    /// Voxels the observer walks along +x per tick
    #[arg(long, default_value = "0.25")]
    speed: f32,

    /// Run meshing and modifications on the foreground tick
    #[arg(long)]
    single_threaded: bool,

    /// Override the configured seed for a new world
    #[arg(long)]
    seed: Option<i32>,

    /// Delete the saved world and generate fresh
    #[arg(long)]
    regenerate: bool,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut cfg = if args.config.exists() {
        match WorldConfig::load_from_path(&args.config) {
            Ok(c) => c,
            Err(e) => {
                log::error!("failed to load {}: {}", args.config.display(), e);
                return ExitCode::from(2);
            }
        }
    } else {
        log::warn!(
            "{} not found; using built-in world settings",
            args.config.display()
        );
        WorldConfig::default()
    };
    if let Some(seed) = args.seed {
        cfg.world.seed = seed;
    }
    if args.single_threaded {
        cfg.world.multithreading = false;
    }

    let reg = match &args.blocks {
        Some(path) => match BlockRegistry::load_from_path(path) {
            Ok(r) => r,
            Err(e) => {
                log::error!("failed to load block catalog {}: {}", path.display(), e);
                return ExitCode::from(2);
            }
        },
        None => BlockRegistry::builtin(),
    };
    log::info!("block catalog: {} block type(s)", reg.len());

    let saves = Arc::new(SaveSystem::new(&args.save_dir));
    if args.regenerate {
        let dir = saves.world_dir(&cfg.world.name);
        if dir.exists() {
            match std::fs::remove_dir_all(&dir) {
                Ok(()) => log::info!("removed saved world at {}", dir.display()),
                Err(e) => log::warn!("could not remove {}: {}", dir.display(), e),
            }
        }
    }
    let meta = match saves.load_world(&cfg.world.name, cfg.world.seed) {
        Ok(m) => m,
        Err(e) => {
            log::error!("failed to open world '{}': {}", cfg.world.name, e);
            return ExitCode::from(2);
        }
    };

    let mut rt = match WorldRuntime::open(&cfg, meta, saves.clone(), Arc::new(reg)) {
        Ok(rt) => rt,
        Err(e) => {
            log::error!("world generation cannot start: {}", e);
            return ExitCode::from(1);
        }
    };

    let spawn = rt.spawn_position();
    if let Err(e) = rt.start(spawn) {
        log::error!("failed to start the mesh worker: {}", e);
        return ExitCode::from(1);
    }

    let mut observer = spawn;
    let mut drawn = 0usize;
    for tick in 0..args.ticks {
        rt.update(observer);
        drawn += rt.drain_draw_queue().len();
        if tick % 100 == 0 {
            log::info!("tick {}: {:?}", tick, rt.debug_readout());
        }
        observer += Vec3::new(args.speed, 0.0, 0.0);
        if rt.worker_running() {
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    // Dig out the surface under the observer and put a window in its place.
    let feet = observer.floor();
    let h = rt.world().terrain().column_height(feet.x, feet.z);
    let surface = VoxelPos::new(feet.x, h, feet.z);
    match rt.edit_voxel(surface, ids::AIR) {
        Ok(out) => log::info!("mined {:?} at {:?}", out.mined, surface),
        Err(e) => log::warn!("edit refused: {}", e),
    }
    if let Err(e) = rt.edit_voxel(surface, ids::GLASS) {
        log::warn!("edit refused: {}", e);
    }
    for _ in 0..50 {
        rt.update(observer);
        drawn += rt.drain_draw_queue().len();
        if rt.is_idle() {
            break;
        }
        if rt.worker_running() {
            std::thread::sleep(Duration::from_millis(2));
        }
    }
    rt.shutdown();
    log::info!("{} draw item(s) delivered; {:?}", drawn, rt.debug_readout());

    match saves.save_world(rt.world()) {
        Ok(handle) => match handle.join() {
            Ok(Ok(n)) => {
                log::info!("saved {} chunk(s) to {}", n, args.save_dir.display());
                ExitCode::SUCCESS
            }
            Ok(Err(e)) => {
                log::error!("save failed: {}", e);
                ExitCode::from(3)
            }
            Err(_) => {
                log::error!("save thread panicked");
                ExitCode::from(3)
            }
        },
        Err(e) => {
            log::error!("save failed: {}", e);
            ExitCode::from(3)
        }
    }
}
