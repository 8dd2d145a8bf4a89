//! End-to-end scenarios driven with virtual time.

use crate::entity::catalog;
use crate::object::{GameObject, NpcState, Waypoint};
use crate::pathfinding::NavGrid;
use crate::scheduler::Simulation;
use crate::spatial::Bounds;
use crate::world::{Action, World};
use crate::{SimTime, WorldConfig};
use meridian_event_system::{
    dispatch_channels, spawn_consumers, NotificationSink, ObjectId, Payload, Vector3,
};
use std::sync::{Arc, Mutex};

fn test_world() -> World {
    let config = WorldConfig {
        rng_seed: Some(7),
        ..WorldConfig::default()
    };
    let mut world = World::new(
        config,
        Bounds::symmetric(100.0),
        Arc::new(NavGrid::open(50, 50, 1000)),
    );
    world.add_teleport("main", Vector3::new(40.0, 0.0, 40.0), Vector3::new(0.0, 180.0, 0.0));
    world
}

fn player_at(world: &mut World, id: &str, x: f64, z: f64) -> ObjectId {
    world
        .insert(GameObject::player(
            ObjectId::from(id),
            catalog::player(),
            Vector3::new(x, 0.0, z),
            Vector3::zero(),
        ))
        .unwrap()
}

/// Bandit whose axe reaches 2 units and swings once per second for 5 damage.
fn duelist_at(world: &mut World, x: f64, z: f64, waypoints: &[Waypoint]) -> ObjectId {
    let mut template = catalog::bandit();
    if let Some(axe) = template.equipped.right_hand.as_mut() {
        axe.attack_range = 2.0;
        axe.attack_speed = 1.0;
        axe.attack_damage = 5;
    }
    let mut npc = GameObject::npc(template, Vector3::new(x, 0.0, z), Vector3::zero(), waypoints);
    // Keep it from wandering off on patrol during the scenario
    npc.next_destination_at = Some(SimTime::MAX);
    world.insert(npc).unwrap()
}

/// Ticks every 40 ms from `from` (exclusive) to `to` (inclusive), collecting
/// each tick's notifications with the tick time.
fn run(world: &mut World, from: SimTime, to: SimTime) -> Vec<(SimTime, Payload, Vec<ObjectId>)> {
    let mut log = Vec::new();
    let mut now = from;
    while now < to {
        now += 40;
        world.tick(now);
        for n in world.drain_outbox() {
            log.push((now, n.payload, n.recipients));
        }
    }
    log
}

#[test]
fn test_npc_aggroes_and_hits_at_attack_speed_cadence() {
    let mut world = test_world();
    let npc = duelist_at(&mut world, 0.0, 0.0, &[Waypoint::new(10.0, 0.0, 0.0)]);
    let player = player_at(&mut world, "p1", 10.0, 0.0);
    world.drain_outbox();

    run(&mut world, 0, 40);
    assert_eq!(world.object(&npc).unwrap().attack_target, Some(player.clone()));
    assert_eq!(world.object(&npc).unwrap().npc_state(), NpcState::Pursuing);

    let log = run(&mut world, 40, 15_000);
    let npc_obj = world.object(&npc).unwrap();
    assert_eq!(npc_obj.npc_state(), NpcState::Attacking);
    assert!(npc_obj.position.distance(Vector3::new(10.0, 0.0, 0.0)) <= 2.0);

    let swings: Vec<SimTime> = log
        .iter()
        .filter(|(_, p, _)| matches!(p, Payload::Animation(a) if a.name == "AttackAxe" && !a.is_stop))
        .map(|(t, _, _)| *t)
        .collect();
    let hits: Vec<(SimTime, i32, Vec<ObjectId>)> = log
        .iter()
        .filter_map(|(t, p, r)| match p {
            Payload::Damage(d) if d.object_id == player => Some((*t, d.health_current, r.clone())),
            _ => None,
        })
        .collect();

    assert!(hits.len() >= 5, "expected repeated hits, got {}", hits.len());
    // Damage lands a fifth of the swing interval after each swing
    assert_eq!(hits[0].0, swings[0] + 200);
    for pair in hits.windows(2) {
        assert_eq!(pair[1].0 - pair[0].0, 1_000);
        assert_eq!(pair[0].1 - pair[1].1, 5);
    }
    assert!(hits.iter().all(|(_, _, recipients)| recipients.contains(&player)));
    assert_eq!(
        world.object(&player).unwrap().entity.health,
        200 - 5 * hits.len() as i32
    );
}

#[test]
fn test_player_killed_by_npc_is_revived_at_main() {
    let mut world = test_world();
    let npc = duelist_at(&mut world, 10.0, 10.0, &[]);
    let player = player_at(&mut world, "p1", 11.0, 10.0);
    world.object_mut(&player).unwrap().entity.health = 5;

    let log = run(&mut world, 0, 1_000);
    assert!(world.object(&player).unwrap().is_dead());
    assert_eq!(world.object(&npc).unwrap().attack_target, None);
    assert!(log.iter().any(|(_, p, _)| matches!(p, Payload::Animation(a) if a.is_stop)));

    let log = run(&mut world, 1_000, 6_000);
    let revived = world.object(&player).unwrap();
    assert_eq!(revived.entity.health, 200);
    assert_eq!(revived.position, Vector3::new(40.0, 0.0, 40.0));
    assert_eq!(revived.rotation.y, 180.0);

    let teleports: Vec<&Vec<ObjectId>> = log
        .iter()
        .filter_map(|(_, p, r)| matches!(p, Payload::Teleport(_)).then_some(r))
        .collect();
    assert_eq!(teleports.len(), 1);
    assert!(teleports[0].contains(&player));
}

#[test]
fn test_npc_returns_to_spawn_when_pulled_too_far() {
    let mut world = test_world();
    let npc = duelist_at(&mut world, 5.0, 5.0, &[]);
    let player = player_at(&mut world, "p1", 13.0, 5.0);

    run(&mut world, 0, 80);
    assert_eq!(world.object(&npc).unwrap().attack_target, Some(player.clone()));

    // Kite the NPC far away from its spawn point
    let mut now = 80;
    for step in 0..35 {
        let x = 14.0 + step as f64;
        world.advance_to(now);
        world
            .apply_transform(&player, Vector3::new(x, 0.0, 5.0), Vector3::zero(), 2.0)
            .unwrap();
        run(&mut world, now, now + 400);
        now += 400;
        if world.object(&npc).unwrap().returning {
            break;
        }
    }

    let npc_obj = world.object(&npc).unwrap();
    assert_eq!(npc_obj.npc_state(), NpcState::Returning);
    assert_eq!(npc_obj.attack_target, None);

    // Lose the NPC so it does not re-aggro on the way back
    world.advance_to(now);
    world
        .apply_transform(&player, Vector3::new(90.0, 0.0, 90.0), Vector3::zero(), 2.0)
        .unwrap();
    run(&mut world, now, now + 20_000);

    let npc_obj = world.object(&npc).unwrap();
    assert_eq!(npc_obj.position, Vector3::new(5.0, 0.0, 5.0));
    assert_eq!(npc_obj.npc_state(), NpcState::Patrol);
}

/// Bandit with a two-round pistol, firing once per second for 5 damage.
fn gunner_at(world: &mut World, x: f64, z: f64) -> ObjectId {
    let mut template = catalog::bandit();
    let mut pistol = catalog::pistol();
    pistol.clip_size = 2;
    pistol.clip = 2;
    pistol.attack_speed = 1.0;
    pistol.attack_damage = 5;
    template.equipped.right_hand = Some(pistol);
    let mut npc = GameObject::npc(template, Vector3::new(x, 0.0, z), Vector3::zero(), &[]);
    npc.next_destination_at = Some(SimTime::MAX);
    world.insert(npc).unwrap()
}

#[test]
fn test_npc_with_empty_clip_holds_fire_while_reloading() {
    let mut world = test_world();
    let npc = gunner_at(&mut world, 0.0, 0.0);
    let player = player_at(&mut world, "p1", 3.0, 0.0);
    world.drain_outbox();

    let log = run(&mut world, 0, 8_000);
    let shots: Vec<SimTime> = log
        .iter()
        .filter(|(_, p, _)| matches!(p, Payload::Animation(a) if a.name == "PistolShoot"))
        .map(|(t, _, _)| *t)
        .collect();
    let reloads: Vec<SimTime> = log
        .iter()
        .filter(|(_, p, _)| matches!(p, Payload::Animation(a) if a.name == "Reloading"))
        .map(|(t, _, _)| *t)
        .collect();
    let hits: Vec<SimTime> = log
        .iter()
        .filter(|(_, p, _)| matches!(p, Payload::Damage(d) if d.object_id == player))
        .map(|(t, _, _)| *t)
        .collect();

    assert!(!reloads.is_empty());
    let reload_started = reloads[0];
    // Both rounds went out before the reload
    assert_eq!(shots.iter().filter(|t| **t < reload_started).count(), 2);
    assert_eq!(shots[1] - shots[0], 1_000);
    assert_eq!(reload_started - shots[1], 1_000);

    let reload_done = reload_started + 2_500;
    assert!(
        hits.iter().all(|t| *t <= reload_started || *t > reload_done),
        "damage landed mid-reload: {hits:?}"
    );
    assert!(!shots.iter().any(|t| *t > reload_started && *t < reload_done));
    assert!(hits.iter().any(|t| *t > reload_done));
    assert_eq!(world.object(&npc).unwrap().attack_target, Some(player));
}

#[test]
fn test_npc_resumes_patrol_when_target_disconnects() {
    let mut world = test_world();
    let npc = duelist_at(&mut world, 0.0, 0.0, &[Waypoint::new(10.0, 0.0, 0.0)]);
    let target = player_at(&mut world, "target", 1.5, 0.0);
    // In view of the NPC but beyond its aggro radius
    let watcher = player_at(&mut world, "watcher", 0.0, 25.0);

    run(&mut world, 0, 400);
    let npc_obj = world.object(&npc).unwrap();
    assert_eq!(npc_obj.attack_target, Some(target.clone()));
    assert_eq!(npc_obj.current_animation.as_deref(), Some("AttackAxe"));
    world.drain_outbox();

    world.disconnect_player(&target).unwrap();
    world.drain_outbox();
    let log = run(&mut world, 400, 440);

    let npc_obj = world.object(&npc).unwrap();
    assert_eq!(npc_obj.npc_state(), NpcState::Patrol);
    assert_eq!(npc_obj.attack_target, None);
    assert!(npc_obj.current_animation.is_none());
    assert!(!npc_obj.path.is_empty());
    assert_eq!(npc_obj.path.back().map(|p| (p.x, p.z)), Some((10.0, 0.0)));
    assert!(log.iter().any(|(_, p, r)| matches!(
        p,
        Payload::Animation(a) if a.object_id == npc && a.is_stop && a.name == "AttackAxe"
    ) && r.contains(&watcher)));
}

#[derive(Debug, Default)]
struct RecordingSink {
    deliveries: Mutex<Vec<(ObjectId, Payload)>>,
}

#[meridian_event_system::async_trait]
impl NotificationSink for RecordingSink {
    async fn deliver(&self, recipient: &ObjectId, payload: &Payload) -> Result<(), String> {
        self.deliveries
            .lock()
            .unwrap()
            .push((recipient.clone(), payload.clone()));
        Ok(())
    }
}

#[tokio::test]
async fn test_each_observer_receives_one_destroy_for_killed_npc() {
    let mut world = test_world();
    let mut npc = GameObject::npc(catalog::bandit(), Vector3::new(5.0, 0.0, 5.0), Vector3::zero(), &[]);
    npc.entity.can_aggro = false;
    let npc = world.insert(npc).unwrap();
    let p1 = player_at(&mut world, "p1", 5.0, 6.0);
    let p2 = player_at(&mut world, "p2", 8.0, 8.0);
    world.drain_outbox();

    let (dispatcher, receivers) = dispatch_channels(16);
    let sink = Arc::new(RecordingSink::default());
    let consumers = spawn_consumers(receivers, sink.clone());
    let sim = Simulation::new(world, dispatcher);

    let hit = Action::InteractWith {
        target_id: npc.clone(),
    };
    sim.handle_action(&p1, hit.clone()).await.unwrap();
    sim.handle_action(&p1, hit.clone()).await.unwrap();
    // The corpse is gone; further attacks miss
    assert!(sim.handle_action(&p1, hit).await.is_err());

    {
        let world = sim.world();
        let world = world.read().await;
        let dead = world.object(&npc).unwrap();
        assert_eq!(dead.npc_state(), NpcState::Dead);
        assert!(dead.next_respawn_at.is_some());
        assert!(!world.object(&p1).unwrap().neighbors().contains(&npc));
    }

    drop(sim);
    consumers.join_all().await;

    let deliveries = sink.deliveries.lock().unwrap();
    for observer in [&p1, &p2] {
        let destroys = deliveries
            .iter()
            .filter(|(to, p)| to == observer && matches!(p, Payload::Destroy(d) if d.object_id == npc))
            .count();
        assert_eq!(destroys, 1, "observer {observer}");
    }
    // Both also saw the loot drop
    for observer in [&p1, &p2] {
        assert!(deliveries
            .iter()
            .any(|(to, p)| to == observer && matches!(p, Payload::Spawn(_))));
    }
}

#[test]
fn test_dead_npc_respawns_at_spawn_point() {
    let mut world = test_world();
    let npc = duelist_at(&mut world, 20.0, 20.0, &[]);
    let player = player_at(&mut world, "p1", 21.0, 20.0);
    world.object_mut(&npc).unwrap().entity.can_aggro = false;

    world.interact_with(&player, &npc).unwrap();
    world.interact_with(&player, &npc).unwrap();
    assert!(!world.object(&npc).unwrap().is_visible());
    world.drain_outbox();

    let log = run(&mut world, 0, 60_000);
    let respawned = world.object(&npc).unwrap();
    assert!(respawned.is_visible());
    assert_eq!(respawned.entity.health, 100);
    assert_eq!(respawned.position, Vector3::new(20.0, 0.0, 20.0));
    assert!(log.iter().any(|(t, p, r)| *t == 60_000
        && matches!(p, Payload::Spawn(_))
        && r.contains(&player)));
    assert!(world.object(&player).unwrap().neighbors().contains(&npc));
}
