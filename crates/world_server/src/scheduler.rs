//! Fixed-rate simulation driver.
//!
//! [`Simulation`] owns the shared world and the dispatcher. Both the tick
//! loop and ingress go through it, and both follow the same sequence: take
//! the write lock, mutate, drain the outbox, release the lock, publish.

use crate::error::WorldError;
use crate::world::{Action, World};
use crate::SimTime;
use meridian_event_system::{DispatchError, Dispatcher, Notification, ObjectId, ShutdownState};
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, Instant, MissedTickBehavior};
use tracing::{debug, error, info, trace};

/// Ticks between periodic stats lines.
const STATS_EVERY_TICKS: u64 = 250;

pub struct Simulation {
    world: Arc<RwLock<World>>,
    dispatcher: Dispatcher,
    started: Instant,
    tick_interval: Duration,
}

impl Simulation {
    pub fn new(world: World, dispatcher: Dispatcher) -> Self {
        let tick_interval = Duration::from_millis(world.config().tick_interval_ms);
        Self {
            world: Arc::new(RwLock::new(world)),
            dispatcher,
            started: Instant::now(),
            tick_interval,
        }
    }

    /// Shared handle to the world, for read-only inspection.
    pub fn world(&self) -> Arc<RwLock<World>> {
        self.world.clone()
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Wall-clock milliseconds since the simulation was created.
    pub fn elapsed_ms(&self) -> SimTime {
        self.started.elapsed().as_millis() as SimTime
    }

    async fn publish(&self, notifications: Vec<Notification>) -> Result<usize, DispatchError> {
        if notifications.is_empty() {
            return Ok(0);
        }
        self.dispatcher.publish_all(notifications).await
    }

    /// Runs one tick at simulation time `now` and publishes what it produced.
    pub async fn tick_at(&self, now: SimTime) -> Result<usize, DispatchError> {
        let notifications = {
            let mut world = self.world.write().await;
            world.tick(now);
            world.drain_outbox()
        };
        self.publish(notifications).await
    }

    /// Applies a player action at the current wall-clock time.
    pub async fn handle_action(&self, source: &ObjectId, action: Action) -> Result<(), WorldError> {
        let now = self.elapsed_ms();
        let (result, notifications) = {
            let mut world = self.world.write().await;
            world.advance_to(now);
            let result = world.handle_action(source, action);
            (result, world.drain_outbox())
        };
        self.publish(notifications).await?;
        result
    }

    pub async fn connect_player(&self, id: Option<ObjectId>) -> Result<ObjectId, WorldError> {
        let now = self.elapsed_ms();
        let (result, notifications) = {
            let mut world = self.world.write().await;
            world.advance_to(now);
            let result = world.connect_player(id);
            (result, world.drain_outbox())
        };
        self.publish(notifications).await?;
        result
    }

    pub async fn disconnect_player(&self, id: &ObjectId) -> Result<(), WorldError> {
        let notifications = {
            let mut world = self.world.write().await;
            world.disconnect_player(id)?;
            world.drain_outbox()
        };
        self.publish(notifications).await?;
        Ok(())
    }

    /// Spawns the tick loop; it runs until `shutdown` is initiated.
    ///
    /// The handle resolves to the number of ticks run.
    pub fn start(self: Arc<Self>, shutdown: ShutdownState) -> JoinHandle<u64> {
        tokio::spawn(async move {
            let mut ticker = interval(self.tick_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut tick_count: u64 = 0;

            info!(
                "🕒 Simulation tick loop started ({} ms interval)",
                self.tick_interval.as_millis()
            );
            loop {
                if shutdown.is_shutdown_initiated() {
                    info!("🕒 Simulation tick stopping - shutdown initiated");
                    break;
                }

                ticker.tick().await;

                // Shutdown may have started while waiting for the tick
                if shutdown.is_shutdown_initiated() {
                    info!("🕒 Simulation tick stopping - shutdown initiated during tick wait");
                    break;
                }

                tick_count += 1;
                match self.tick_at(self.elapsed_ms()).await {
                    Ok(published) => trace!("Tick {} published {} notifications", tick_count, published),
                    Err(e @ DispatchError::QueueClosed(_)) => {
                        error!("❌ Stopping simulation: {}", e);
                        break;
                    }
                    Err(e) => error!("Failed to publish tick notifications: {}", e),
                }

                if tick_count % STATS_EVERY_TICKS == 0 {
                    let stats = self.world.read().await.stats();
                    debug!(
                        "📊 Tick {}: {} objects ({} players, {} NPCs), {} octree nodes, {} pending effects",
                        tick_count,
                        stats.objects,
                        stats.players,
                        stats.npcs,
                        stats.octree.nodes,
                        stats.pending_effects
                    );
                }
            }

            info!("✅ Simulation tick loop completed gracefully");
            tick_count
        })
    }
}
