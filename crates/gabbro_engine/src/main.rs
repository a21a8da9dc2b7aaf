use std::env;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use glam::Vec3;
use tracing::{info, warn};

use gabbro_engine::chunk_manager::ChunkManager;
use gabbro_engine::config::EngineConfig;
use gabbro_engine::store::WorldStore;
use gabbro_shared::block::register_default_blocks;
use gabbro_shared::worldgen::get_height_at;

const CONFIG_PATH: &str = "gabbro.toml";
const TICK_INTERVAL: Duration = Duration::from_millis(50);

fn main() {
    let _ = tracing_subscriber::fmt().with_target(false).try_init();

    let mut config = EngineConfig::load_or_default(Path::new(CONFIG_PATH));

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--seed" => {
                let Some(value) = args.next() else {
                    eprintln!("--seed expects an integer argument");
                    std::process::exit(2);
                };
                match value.parse::<i32>() {
                    Ok(parsed) => config.seed = parsed,
                    Err(err) => {
                        eprintln!("invalid seed '{value}': {err}");
                        std::process::exit(2);
                    }
                }
            }
            "--render-distance" => {
                let Some(value) = args.next() else {
                    eprintln!("--render-distance expects an integer argument");
                    std::process::exit(2);
                };
                match value.parse::<i32>() {
                    Ok(parsed) => config.render_distance = parsed,
                    Err(err) => {
                        eprintln!("invalid render distance '{value}': {err}");
                        std::process::exit(2);
                    }
                }
            }
            "--save-dir" => {
                let Some(value) = args.next() else {
                    eprintln!("--save-dir expects a path argument");
                    std::process::exit(2);
                };
                config.save_dir = PathBuf::from(value);
            }
            "--room" => {
                let Some(value) = args.next() else {
                    eprintln!("--room expects a name argument");
                    std::process::exit(2);
                };
                config.room_id = value;
            }
            "--help" | "-h" => {
                println!(
                    "Usage: gabbro_engine [--seed <i32>] [--render-distance <n>] \
                     [--save-dir <path>] [--room <name>]"
                );
                return;
            }
            other => {
                eprintln!("unknown argument: {other}");
                std::process::exit(2);
            }
        }
    }
    let config = config.sanitized();

    let running = Arc::new(AtomicBool::new(true));
    let flag = running.clone();
    ctrlc::set_handler(move || {
        eprintln!("\nShutdown signal received, saving world...");
        flag.store(false, Ordering::SeqCst);
    })
    .expect("failed to set Ctrl+C handler");

    info!(
        "Starting world engine (seed {}, room '{}', render distance {})",
        config.seed, config.room_id, config.render_distance
    );

    let mut store = WorldStore::new(config.seed);
    match store.load_save(&config.save_dir, &config.room_id) {
        Ok(true) => info!("Resumed world from existing save"),
        Ok(false) => info!("No usable save found; starting from seed"),
        Err(err) => warn!("Failed to load save: {err}; starting from seed"),
    }

    let spawn_height = get_height_at(store.seed(), 0, 0);
    let spawn = Vec3::new(0.5, spawn_height as f32 + 2.0, 0.5);
    info!("Spawn surface height is {spawn_height}");

    let registry = Arc::new(register_default_blocks());
    let mut manager = match config.worker_threads {
        Some(count) => ChunkManager::with_worker_count(registry, config.render_distance, count),
        None => ChunkManager::new(registry, config.render_distance),
    };

    let mut last_autosave = Instant::now();
    let mut warmup_reported = false;
    while running.load(Ordering::SeqCst) {
        manager.update_player_position(&store, spawn);
        manager.poll_mesh_results();

        if !warmup_reported && manager.pending_mesh_count() == 0 {
            info!(
                "Initial meshing complete: {} chunks resident",
                manager.chunk_count()
            );
            warmup_reported = true;
        }

        if last_autosave.elapsed() >= Duration::from_secs(config.autosave_interval_secs) {
            if let Err(err) = store.save(&config.save_dir, &config.room_id) {
                warn!("Autosave failed: {err}");
            }
            last_autosave = Instant::now();
        }

        std::thread::sleep(TICK_INTERVAL);
    }

    if let Err(err) = store.save(&config.save_dir, &config.room_id) {
        warn!("Final save failed: {err}");
        std::process::exit(1);
    }
    info!("World saved; shutting down");
}
