//! Main application logic and lifecycle management.
//!
//! [`Application`] turns the merged configuration into a populated world,
//! runs the simulation with its notification consumers, and tears both down
//! in order when a termination signal arrives.

use crate::{
    cli::CliArgs,
    config::AppConfig,
    logging::display_banner,
    signals::{shutdown_on_signal, wait_for_signal},
    sink::LoggingSink,
};
use meridian_event_system::{dispatch_channels, spawn_consumers, ShutdownState};
use std::path::Path;
use std::sync::Arc;
use tokio::time::Duration;
use tracing::{error, info, warn};
use world_server::pathfinding::NavCell;
use world_server::{LevelDescription, NavGrid, Simulation, World};

/// Largest side of the all-walkable grid used when no nav grid is configured.
const MAX_OPEN_GRID_SIDE: usize = 1024;
/// How long the tick loop and the consumers get to wind down.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(8);
const HEALTH_REPORT_INTERVAL: Duration = Duration::from_secs(60);

pub struct Application {
    config: AppConfig,
    world: World,
}

impl Application {
    /// Creates a new application instance.
    ///
    /// # Process
    ///
    /// 1. Load configuration from file (creating default if missing)
    /// 2. Apply command-line argument overrides
    /// 3. Validate merged configuration
    /// 4. Display startup banner
    /// 5. Build the world from the level description and nav grid
    pub async fn new(args: CliArgs) -> Result<Self, Box<dyn std::error::Error>> {
        info!("🔧 Loading configuration from: {}", args.config_path.display());
        let mut config = AppConfig::load_from_file(&args.config_path).await?;

        if let Some(level_path) = args.level_path {
            config.server.level_path = Some(level_path.to_string_lossy().to_string());
        }

        if let Some(navgrid_path) = args.navgrid_path {
            config.server.navgrid_path = Some(navgrid_path.to_string_lossy().to_string());
        }

        if let Some(tick_interval_ms) = args.tick_interval_ms {
            config.server.tick_interval_ms = tick_interval_ms;
        }

        if let Some(log_level) = args.log_level {
            config.logging.level = log_level;
        }

        if args.json_logs {
            config.logging.json_format = true;
        }

        if let Err(e) = config.validate() {
            return Err(format!("Configuration validation failed: {e}").into());
        } else {
            info!("✅ Configuration loaded and validated successfully");
        }

        display_banner();

        let world = build_world(&config).await?;

        info!(
            "🚀 Meridian World Server v{}",
            option_env!("CARGO_PKG_VERSION").unwrap_or("UNK")
        );
        info!("📂 Config: {}", args.config_path.display());

        Ok(Self { config, world })
    }

    /// Runs the simulation until a termination signal arrives, then shuts
    /// down in order: tick loop, publishers, consumers.
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        info!("🌟 Starting Meridian World Server");
        self.log_configuration_summary();

        let Self { config, world } = self;

        let (dispatcher, receivers) = dispatch_channels(config.world.queue_capacity);
        let sink = Arc::new(LoggingSink::new());
        let consumers = spawn_consumers(receivers, sink.clone());
        info!("📬 {} notification consumers running", consumers.len());

        let shutdown_state = ShutdownState::new();
        let simulation = Arc::new(Simulation::new(world, dispatcher));
        let tick_handle = simulation.clone().start(shutdown_state.clone());

        let monitoring_handle = {
            let simulation = simulation.clone();
            let sink = sink.clone();

            tokio::spawn(async move {
                let mut interval = tokio::time::interval(HEALTH_REPORT_INTERVAL);
                interval.tick().await;
                let mut last_published = 0u64;

                loop {
                    interval.tick().await;

                    let stats = simulation.world().read().await.stats();
                    let published = simulation.dispatcher().stats().total;
                    info!(
                        "📊 World Health - tick {} | {} objects ({} players, {} NPCs) | {} notifications/min | {} deliveries",
                        stats.ticks,
                        stats.objects,
                        stats.players,
                        stats.npcs,
                        published - last_published,
                        sink.delivered()
                    );
                    last_published = published;
                }
            })
        };

        info!("✅ Meridian Server is now running!");
        info!("🔍 Health monitoring active - stats every 60 seconds");
        info!("🛑 Press Ctrl+C to gracefully shutdown");

        shutdown_on_signal(&shutdown_state).await?;

        // A second signal skips the graceful path
        tokio::spawn(async move {
            if let Err(e) = wait_for_signal().await {
                error!("Failed to set up merciless shutdown signal handler: {e}");
                return;
            }

            warn!("Shutdown handler received again! I'll make this quick.");
            std::process::exit(1);
        });

        info!("🛑 Shutdown signal received, beginning graceful shutdown...");

        monitoring_handle.abort();
        let _ = monitoring_handle.await;

        info!("🕒 Phase 1: Waiting for the tick loop to stop...");
        match tokio::time::timeout(SHUTDOWN_TIMEOUT, tick_handle).await {
            Ok(Ok(ticks)) => info!("✅ Tick loop stopped after {} ticks", ticks),
            Ok(Err(e)) => error!("❌ Tick loop failed: {}", e),
            Err(_) => warn!("⏰ Tick loop did not stop within timeout, continuing shutdown"),
        }

        let final_stats = simulation.world().read().await.stats();
        let published = simulation.dispatcher().stats();

        // Consumers finish once the last dispatcher is gone
        info!("📬 Phase 2: Draining notification queues...");
        drop(simulation);
        match tokio::time::timeout(SHUTDOWN_TIMEOUT, consumers.join_all()).await {
            Ok(_) => info!("✅ All queued notifications delivered"),
            Err(_) => warn!("⏰ Timeout reached, some notifications were not delivered"),
        }
        shutdown_state.complete_shutdown();

        info!("📊 Final Statistics:");
        info!("  - Ticks run: {}", final_stats.ticks);
        info!("  - Objects: {} ({} players, {} NPCs)", final_stats.objects, final_stats.players, final_stats.npcs);
        info!("  - Notifications published: {}", published.total);
        for (kind, count) in published.per_kind.iter().filter(|(_, n)| *n > 0) {
            info!("    - {}: {}", kind, count);
        }
        info!("  - Deliveries: {} ({} bytes)", sink.delivered(), sink.bytes());

        info!("✅ Meridian World Server shutdown complete");
        Ok(())
    }

    fn log_configuration_summary(&self) {
        let stats = self.world.stats();
        let world = &self.config.world;
        info!("📋 Configuration Summary:");
        info!(
            "  🕒 Tick interval: {} ms",
            self.config.server.tick_interval_ms
        );
        info!(
            "  🗺️ Level: {}",
            self.config.server.level_path.as_deref().unwrap_or("<empty world>")
        );
        info!(
            "  🧭 Nav grid: {}",
            self.config.server.navgrid_path.as_deref().unwrap_or("<open grid>")
        );
        info!(
            "  👁️ Interest radius: {} | Aggro radius: {} | Leash: {}",
            world.interest_radius, world.aggro_radius, world.leash_distance
        );
        info!(
            "  🌍 {} objects ({} NPCs), octree depth {}",
            stats.objects, stats.npcs, stats.octree.max_depth
        );
    }
}

/// Builds the world from the configured level and nav grid.
pub async fn build_world(config: &AppConfig) -> Result<World, Box<dyn std::error::Error>> {
    let world_config = config.to_world_config();

    let level = match &config.server.level_path {
        Some(path) => {
            let json = read_input(path, "level").await?;
            LevelDescription::from_json(&json)?
        }
        None => {
            warn!("⚠️ No level configured - starting with an empty world");
            LevelDescription::default()
        }
    };

    let navgrid = match &config.server.navgrid_path {
        Some(path) => {
            let json = read_input(path, "nav grid").await?;
            let grid = NavGrid::from_json(
                &json,
                config.server.navgrid_offset_x,
                config.server.navgrid_offset_z,
                world_config.max_path_iterations,
            )?;
            info!("🧭 Nav grid loaded: {}x{} cells", grid.width(), grid.depth());
            grid
        }
        None => {
            let half_size = level.size.unwrap_or(world_config.world_half_size);
            open_grid(half_size, world_config.max_path_iterations)
        }
    };

    Ok(World::from_level(world_config, &level, Arc::new(navgrid))?)
}

async fn read_input(path: &str, what: &str) -> Result<String, Box<dyn std::error::Error>> {
    tokio::fs::read_to_string(Path::new(path))
        .await
        .map_err(|e| format!("Failed to read {what} '{path}': {e}").into())
}

/// All-walkable grid centered on the origin, at most [`MAX_OPEN_GRID_SIDE`] cells wide.
fn open_grid(half_size: f64, max_iterations: usize) -> NavGrid {
    let wanted = (half_size * 2.0).ceil().max(1.0) as usize;
    let side = wanted.min(MAX_OPEN_GRID_SIDE);
    if side < wanted {
        warn!(
            "⚠️ Open nav grid clamped to {}x{} cells; NPCs cannot path beyond it",
            side, side
        );
    }
    let offset = -(side as i64 / 2);
    let cells = vec![vec![NavCell { tag: 1, height: 0.0 }; side]; side];
    NavGrid::new(cells, offset, offset, max_iterations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use world_server::PathFinder;

    #[tokio::test]
    async fn test_build_world_from_files() {
        let dir = tempdir().unwrap();
        let level_path = dir.path().join("level.json");
        let grid_path = dir.path().join("grid.json");

        tokio::fs::write(
            &level_path,
            r#"{
                "size": 64.0,
                "objects": [
                    {"uid": 1, "kind": "tree", "entity": "tree", "position": {"x": 3.0, "y": 0.0, "z": 3.0}},
                    {"uid": 2, "kind": "npc", "entity": "adam", "position": {"x": 1.0, "y": 0.0, "z": 1.0},
                     "waypoints": [{"x": 2.0, "z": 2.0}]}
                ],
                "teleports": [{"name": "main", "position": {"x": 0.0, "y": 0.0, "z": 0.0}}]
            }"#,
        )
        .await
        .unwrap();
        // 4x4 fully walkable export
        let row = vec![[1.0f32, 0.0]; 4];
        let grid = vec![row; 4];
        tokio::fs::write(&grid_path, serde_json::to_string(&grid).unwrap())
            .await
            .unwrap();

        let mut config = AppConfig::default();
        config.server.level_path = Some(level_path.to_string_lossy().to_string());
        config.server.navgrid_path = Some(grid_path.to_string_lossy().to_string());
        config.server.navgrid_offset_x = 0;
        config.server.navgrid_offset_z = 0;

        let world = build_world(&config).await.unwrap();
        let stats = world.stats();
        assert_eq!(stats.objects, 2);
        assert_eq!(stats.npcs, 1);
        assert!(world.find_teleport("main").is_ok());
        assert_eq!(world.config().tick_interval_ms, 40);
    }

    #[tokio::test]
    async fn test_build_world_without_level_is_empty() {
        let world = build_world(&AppConfig::default()).await.unwrap();
        assert!(world.is_empty());
    }

    #[tokio::test]
    async fn test_missing_level_file_is_reported() {
        let mut config = AppConfig::default();
        config.server.level_path = Some("/nonexistent/level.json".to_string());
        let err = build_world(&config).await.unwrap_err();
        assert!(err.to_string().contains("level"));
    }

    #[test]
    fn test_open_grid_is_centered_and_clamped() {
        let grid = open_grid(10.0, 1000);
        assert_eq!(grid.width(), 20);
        let path = grid.find_path(-9.0, -9.0, 9.0, 9.0).unwrap();
        assert_eq!(path.len(), 37);
        assert_eq!(path.first().map(|p| (p.x, p.z)), Some((-9.0, -9.0)));

        let grid = open_grid(5000.0, 1000);
        assert_eq!(grid.width(), MAX_OPEN_GRID_SIDE);
    }
}
