//! Authoritative simulation loop
//!
//! One tokio task owns every locally simulated entity and advances it
//! once per tick; observers receive pose snapshots over a broadcast
//! channel at a lower cadence. Commands arrive over an mpsc channel as
//! plain data records, so the loop never touches a socket itself.

use dashmap::DashMap;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::time::interval;
use tracing::{info, warn};
use uuid::Uuid;

use crate::util::math::wrap_angle;
use crate::util::time::{unix_millis, Timer};

use super::deck::{DeckBounds, DeckInput, DeckPhysics, DeckState};
use super::physics::{HelmInput, ShipModifiers, ShipPhysics, ShipState};

/// Which hull profile an entity simulates with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HullKind {
    /// Full-size combat ship (multiplayer)
    Ship,
    /// Small boat (single-player endless survival)
    SmallBoat,
}

impl HullKind {
    fn physics(self) -> ShipPhysics {
        match self {
            HullKind::Ship => ShipPhysics::ship(),
            HullKind::SmallBoat => ShipPhysics::small_boat(),
        }
    }

    /// Walkable deck area for this hull
    fn deck(self) -> DeckPhysics {
        match self {
            HullKind::Ship => DeckPhysics::new(DeckBounds::new(40.0, 90.0), 60.0),
            HullKind::SmallBoat => DeckPhysics::new(DeckBounds::new(22.0, 48.0), 60.0),
        }
    }
}

/// Commands accepted by a running simulation
#[derive(Debug, Clone)]
pub enum SimCommand {
    /// Add an entity at a seeded spawn position
    Spawn {
        entity_id: Uuid,
        kind: HullKind,
        modifiers: Option<ShipModifiers>,
    },
    /// Latest helm input for an entity
    Helm {
        entity_id: Uuid,
        input: HelmInput,
    },
    /// Latest deck movement input for an entity's on-board player
    Deck {
        entity_id: Uuid,
        input: DeckInput,
    },
    /// Raise or drop the anchor
    SetAnchor {
        entity_id: Uuid,
        anchored: bool,
    },
    /// Remove an entity
    Despawn {
        entity_id: Uuid,
    },
    /// Stop the loop
    Shutdown,
}

/// One entity's pose and derived motion in a snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntitySnapshot {
    pub entity_id: Uuid,
    pub kind: HullKind,
    pub x: f32,
    pub y: f32,
    pub rotation: f32,
    pub velocity_x: f32,
    pub velocity_y: f32,
    pub current_speed: f32,
    pub steering_direction: f32,
    pub is_anchored: bool,
    /// On-board player pose, ship-local
    pub deck_local_x: f32,
    pub deck_local_y: f32,
    pub deck_rotation: f32,
}

/// Events broadcast to observers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SimEvent {
    EntitySpawned {
        entity_id: Uuid,
        kind: HullKind,
        x: f32,
        y: f32,
        rotation: f32,
    },
    EntityDespawned {
        entity_id: Uuid,
    },
    Snapshot {
        tick: u64,
        timestamp_ms: u64,
        entities: Vec<EntitySnapshot>,
    },
}

/// Simulation parameters
#[derive(Debug, Clone)]
pub struct SimConfig {
    pub seed: u64,
    pub simulation_tps: u32,
    pub snapshot_tps: u32,
    /// Entities spawn uniformly inside this radius around the origin
    pub spawn_radius: f32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            simulation_tps: crate::util::time::DEFAULT_SIMULATION_TPS,
            snapshot_tps: crate::util::time::DEFAULT_SNAPSHOT_TPS,
            spawn_radius: 600.0,
        }
    }
}

/// One simulated entity: hull physics plus the player on its deck
struct Entity {
    kind: HullKind,
    physics: ShipPhysics,
    deck_physics: DeckPhysics,
    modifiers: Option<ShipModifiers>,
    ship: ShipState,
    helm: HelmInput,
    deck: DeckState,
    deck_input: DeckInput,
}

/// Simulation state advanced by the tick loop.
/// Separated from the async loop so ticks are testable synchronously.
struct SimState {
    id: Uuid,
    tick: u64,
    entities: HashMap<Uuid, Entity>,
    rng: ChaCha8Rng,
    spawn_radius: f32,
}

impl SimState {
    fn new(id: Uuid, config: &SimConfig) -> Self {
        Self {
            id,
            tick: 0,
            entities: HashMap::new(),
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            spawn_radius: config.spawn_radius,
        }
    }

    fn spawn(&mut self, entity_id: Uuid, kind: HullKind, modifiers: Option<ShipModifiers>) -> Option<(f32, f32, f32)> {
        if self.entities.contains_key(&entity_id) {
            warn!(sim_id = %self.id, entity_id = %entity_id, "entity already spawned");
            return None;
        }

        let angle = self.rng.gen_range(0.0..std::f32::consts::TAU);
        let distance = self.rng.gen_range(0.0..self.spawn_radius);
        let x = angle.cos() * distance;
        let y = angle.sin() * distance;
        let rotation = wrap_angle(self.rng.gen_range(0.0..std::f32::consts::TAU));

        // Upgrade bonuses only apply to full-size ships; the survival
        // boat always sails its base profile.
        let modifiers = match kind {
            HullKind::Ship => modifiers,
            HullKind::SmallBoat => None,
        };

        self.entities.insert(
            entity_id,
            Entity {
                kind,
                physics: kind.physics(),
                deck_physics: kind.deck(),
                modifiers,
                ship: ShipState::at(x, y, rotation),
                helm: HelmInput::default(),
                deck: DeckState::centered(),
                deck_input: DeckInput::default(),
            },
        );

        info!(
            sim_id = %self.id,
            entity_id = %entity_id,
            ?kind,
            entity_count = self.entities.len(),
            "entity spawned"
        );
        Some((x, y, rotation))
    }

    fn despawn(&mut self, entity_id: &Uuid) -> bool {
        if self.entities.remove(entity_id).is_some() {
            info!(sim_id = %self.id, entity_id = %entity_id, "entity despawned");
            true
        } else {
            false
        }
    }

    /// Advance every entity by `dt` seconds.
    fn run_tick(&mut self, dt: f32) {
        self.tick += 1;

        for entity in self.entities.values_mut() {
            let next_ship = entity
                .physics
                .advance(&entity.ship, entity.helm, dt, entity.modifiers.as_ref());

            let (next_deck, is_moving) =
                entity
                    .deck_physics
                    .advance(&entity.deck, entity.deck_input, next_ship.rotation, dt);

            // Stationary deck players turn with the hull.
            let turn_delta = wrap_angle(next_ship.rotation - entity.ship.rotation);
            entity.deck = entity
                .deck_physics
                .carry_ship_turn(&next_deck, turn_delta, is_moving);
            entity.ship = next_ship;
        }
    }

    fn build_snapshot(&self) -> SimEvent {
        let entities = self
            .entities
            .iter()
            .map(|(id, e)| EntitySnapshot {
                entity_id: *id,
                kind: e.kind,
                x: e.ship.x,
                y: e.ship.y,
                rotation: e.ship.rotation,
                velocity_x: e.ship.velocity_x,
                velocity_y: e.ship.velocity_y,
                current_speed: e.ship.current_speed,
                steering_direction: e.ship.steering_direction,
                is_anchored: e.ship.is_anchored,
                deck_local_x: e.deck.local_x,
                deck_local_y: e.deck.local_y,
                deck_rotation: e.deck.last_rotation,
            })
            .collect();

        SimEvent::Snapshot {
            tick: self.tick,
            timestamp_ms: unix_millis(),
            entities,
        }
    }
}

/// Handle to a running simulation
#[derive(Clone)]
pub struct SimHandle {
    pub id: Uuid,
    pub command_tx: mpsc::Sender<SimCommand>,
    event_tx: broadcast::Sender<SimEvent>,
    entity_count: Arc<AtomicUsize>,
}

impl SimHandle {
    pub fn subscribe(&self) -> broadcast::Receiver<SimEvent> {
        self.event_tx.subscribe()
    }

    pub fn entity_count(&self) -> usize {
        self.entity_count.load(Ordering::Relaxed)
    }
}

/// Registry of running simulations
pub struct SimRegistry {
    sims: DashMap<Uuid, SimHandle>,
}

impl SimRegistry {
    pub fn new() -> Self {
        Self {
            sims: DashMap::new(),
        }
    }

    pub fn get(&self, id: &Uuid) -> Option<SimHandle> {
        self.sims.get(id).map(|s| s.value().clone())
    }

    pub fn insert(&self, handle: SimHandle) {
        self.sims.insert(handle.id, handle);
    }

    pub fn remove(&self, id: &Uuid) -> Option<SimHandle> {
        self.sims.remove(id).map(|(_, h)| h)
    }

    pub fn active_sims(&self) -> usize {
        self.sims.len()
    }

    pub fn total_entities(&self) -> usize {
        self.sims.iter().map(|s| s.value().entity_count()).sum()
    }
}

impl Default for SimRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// The authoritative simulation task
pub struct Simulation {
    state: SimState,
    config: SimConfig,
    command_rx: mpsc::Receiver<SimCommand>,
    event_tx: broadcast::Sender<SimEvent>,
    entity_count: Arc<AtomicUsize>,
}

impl Simulation {
    pub fn new(config: SimConfig) -> (Self, SimHandle) {
        let id = Uuid::new_v4();
        let (command_tx, command_rx) = mpsc::channel(256);
        let (event_tx, _) = broadcast::channel(64);
        let entity_count = Arc::new(AtomicUsize::new(0));

        let handle = SimHandle {
            id,
            command_tx,
            event_tx: event_tx.clone(),
            entity_count: entity_count.clone(),
        };

        let sim = Self {
            state: SimState::new(id, &config),
            config,
            command_rx,
            event_tx,
            entity_count,
        };

        (sim, handle)
    }

    /// Run the tick loop until shutdown or all command senders drop.
    pub async fn run(mut self) {
        info!(sim_id = %self.state.id, tps = self.config.simulation_tps, "simulation started");

        let tick_duration = Duration::from_micros(1_000_000 / self.config.simulation_tps as u64);
        let mut tick_interval = interval(tick_duration);
        tick_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        let snapshot_interval = (self.config.simulation_tps / self.config.snapshot_tps).max(1);
        let mut ticks_since_snapshot = 0u32;
        let mut clock = Timer::new();

        loop {
            tick_interval.tick().await;

            if !self.process_commands() {
                break;
            }

            // dt from monotonic wall-clock deltas, applied once per tick
            let dt = clock.lap_secs();
            self.state.run_tick(dt);

            ticks_since_snapshot += 1;
            if ticks_since_snapshot >= snapshot_interval {
                ticks_since_snapshot = 0;
                let _ = self.event_tx.send(self.state.build_snapshot());
            }
        }

        info!(sim_id = %self.state.id, tick = self.state.tick, "simulation stopped");
    }

    /// Drain pending commands. Returns false once the loop should stop.
    fn process_commands(&mut self) -> bool {
        loop {
            match self.command_rx.try_recv() {
                Ok(SimCommand::Spawn {
                    entity_id,
                    kind,
                    modifiers,
                }) => {
                    if let Some((x, y, rotation)) = self.state.spawn(entity_id, kind, modifiers) {
                        self.entity_count
                            .store(self.state.entities.len(), Ordering::Relaxed);
                        let _ = self.event_tx.send(SimEvent::EntitySpawned {
                            entity_id,
                            kind,
                            x,
                            y,
                            rotation,
                        });
                    }
                }
                Ok(SimCommand::Helm { entity_id, input }) => {
                    if let Some(entity) = self.state.entities.get_mut(&entity_id) {
                        entity.helm = input;
                    }
                }
                Ok(SimCommand::Deck { entity_id, input }) => {
                    if let Some(entity) = self.state.entities.get_mut(&entity_id) {
                        entity.deck_input = input;
                    }
                }
                Ok(SimCommand::SetAnchor {
                    entity_id,
                    anchored,
                }) => {
                    if let Some(entity) = self.state.entities.get_mut(&entity_id) {
                        entity.ship.is_anchored = anchored;
                    }
                }
                Ok(SimCommand::Despawn { entity_id }) => {
                    if self.state.despawn(&entity_id) {
                        self.entity_count
                            .store(self.state.entities.len(), Ordering::Relaxed);
                        let _ = self.event_tx.send(SimEvent::EntityDespawned { entity_id });
                    }
                }
                Ok(SimCommand::Shutdown) => return false,
                Err(mpsc::error::TryRecvError::Empty) => return true,
                Err(mpsc::error::TryRecvError::Disconnected) => return false,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    const DT: f32 = 1.0 / 60.0;

    fn sim_state() -> SimState {
        SimState::new(Uuid::new_v4(), &SimConfig::default())
    }

    #[test]
    fn spawn_places_entity_inside_radius() {
        let mut state = sim_state();
        let id = Uuid::new_v4();
        let (x, y, rotation) = state.spawn(id, HullKind::Ship, None).unwrap();

        assert!((x * x + y * y).sqrt() <= state.spawn_radius);
        assert!(rotation > -PI && rotation <= PI);
        assert!(state.spawn(id, HullKind::Ship, None).is_none(), "double spawn rejected");
    }

    #[test]
    fn seeded_spawns_are_deterministic() {
        let config = SimConfig {
            seed: 42,
            ..Default::default()
        };
        let mut a = SimState::new(Uuid::new_v4(), &config);
        let mut b = SimState::new(Uuid::new_v4(), &config);
        let id = Uuid::new_v4();

        assert_eq!(
            a.spawn(id, HullKind::Ship, None),
            b.spawn(id, HullKind::Ship, None)
        );
    }

    #[test]
    fn ticking_moves_an_unanchored_ship() {
        let mut state = sim_state();
        let id = Uuid::new_v4();
        state.spawn(id, HullKind::Ship, None);
        let start = state.entities[&id].ship;

        for _ in 0..120 {
            state.run_tick(DT);
        }

        let entity = &state.entities[&id];
        assert!(entity.ship.current_speed > 0.0);
        let moved = ((entity.ship.x - start.x).powi(2) + (entity.ship.y - start.y).powi(2)).sqrt();
        assert!(moved > 1.0, "ship should have traveled, moved {moved}");
    }

    #[test]
    fn stationary_deck_player_turns_with_the_hull() {
        let mut state = sim_state();
        let id = Uuid::new_v4();
        state.spawn(id, HullKind::SmallBoat, None);

        let facing_before = state.entities[&id].deck.last_rotation;
        state.entities.get_mut(&id).unwrap().helm = HelmInput {
            turn_left: true,
            turn_right: false,
        };

        for _ in 0..300 {
            state.run_tick(DT);
        }

        let entity = &state.entities[&id];
        assert!(
            (entity.deck.last_rotation - facing_before).abs() > 1e-3,
            "facing should have carried the hull's turn"
        );
    }

    #[test]
    fn snapshot_lists_every_entity() {
        let mut state = sim_state();
        state.spawn(Uuid::new_v4(), HullKind::Ship, None);
        state.spawn(Uuid::new_v4(), HullKind::SmallBoat, None);
        state.run_tick(DT);

        match state.build_snapshot() {
            SimEvent::Snapshot { tick, entities, .. } => {
                assert_eq!(tick, 1);
                assert_eq!(entities.len(), 2);
            }
            other => panic!("expected snapshot, got {other:?}"),
        }
    }

    #[test]
    fn commands_drive_the_loop() {
        tokio_test::block_on(async {
            let config = SimConfig {
                seed: 7,
                simulation_tps: 120,
                snapshot_tps: 60,
                ..Default::default()
            };
            let (sim, handle) = Simulation::new(config);
            let mut events = handle.subscribe();
            let task = tokio::spawn(sim.run());

            let id = Uuid::new_v4();
            handle
                .command_tx
                .send(SimCommand::Spawn {
                    entity_id: id,
                    kind: HullKind::Ship,
                    modifiers: None,
                })
                .await
                .unwrap();

            let spawned = tokio::time::timeout(Duration::from_secs(2), async {
                loop {
                    if let SimEvent::EntitySpawned { entity_id, .. } = events.recv().await.unwrap()
                    {
                        break entity_id;
                    }
                }
            })
            .await
            .unwrap();
            assert_eq!(spawned, id);

            handle.command_tx.send(SimCommand::Shutdown).await.unwrap();
            task.await.unwrap();
        });
    }
}
