//! End-to-end loop test: a simulation task feeds an observer's
//! interpolation bank the way a connected client would consume it.

use std::time::Duration;

use uuid::Uuid;

use ship_game_core::game::interp::{InterpBank, Pose};
use ship_game_core::game::physics::HelmInput;
use ship_game_core::game::sim::{HullKind, SimCommand, SimConfig, SimEvent, Simulation};
use ship_game_core::util::time::unix_millis;

fn test_config() -> SimConfig {
    SimConfig {
        seed: 1234,
        simulation_tps: 120,
        snapshot_tps: 60,
        ..Default::default()
    }
}

#[tokio::test]
async fn snapshots_flow_into_an_interpolation_bank() {
    let (sim, handle) = Simulation::new(test_config());
    let mut events = handle.subscribe();
    let task = tokio::spawn(sim.run());

    let ship_id = Uuid::new_v4();
    handle
        .command_tx
        .send(SimCommand::Spawn {
            entity_id: ship_id,
            kind: HullKind::Ship,
            modifiers: None,
        })
        .await
        .expect("command channel open");
    handle
        .command_tx
        .send(SimCommand::Helm {
            entity_id: ship_id,
            input: HelmInput {
                turn_left: false,
                turn_right: true,
            },
        })
        .await
        .expect("command channel open");

    // Consume the broadcast the way a render client would: record every
    // snapshot for the remote ship into a short render-delay bank.
    let mut bank = InterpBank::new(3, 20);
    let mut recorded = 0;
    let collect = tokio::time::timeout(Duration::from_secs(5), async {
        while recorded < 6 {
            if let SimEvent::Snapshot {
                timestamp_ms,
                entities,
                ..
            } = events.recv().await.expect("event stream open")
            {
                for entity in entities {
                    bank.record(
                        entity.entity_id,
                        Pose {
                            x: entity.x,
                            y: entity.y,
                            rotation: entity.rotation,
                        },
                        timestamp_ms,
                    );
                    recorded += 1;
                }
            }
        }
    });
    collect.await.expect("snapshots should arrive in time");

    assert!(bank.has_enough_data(&ship_id));
    let pose = bank
        .pose(&ship_id, unix_millis())
        .expect("tracked entity yields a pose");
    assert!(pose.x.is_finite() && pose.y.is_finite());
    assert!(pose.rotation > -std::f32::consts::PI && pose.rotation <= std::f32::consts::PI);

    handle
        .command_tx
        .send(SimCommand::Shutdown)
        .await
        .expect("command channel open");
    task.await.expect("sim task joins cleanly");

    // Entity left scope: the client drops its buffer.
    bank.forget(&ship_id);
    assert!(bank.pose(&ship_id, unix_millis()).is_none());
}

#[tokio::test]
async fn survival_boat_keeps_sailing_alone() {
    let (sim, handle) = Simulation::new(test_config());
    let mut events = handle.subscribe();
    let task = tokio::spawn(sim.run());

    let boat_id = Uuid::new_v4();
    handle
        .command_tx
        .send(SimCommand::Spawn {
            entity_id: boat_id,
            kind: HullKind::SmallBoat,
            modifiers: None,
        })
        .await
        .expect("command channel open");

    let mut first: Option<(f32, f32)> = None;
    let observed = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if let SimEvent::Snapshot { entities, .. } =
                events.recv().await.expect("event stream open")
            {
                if let Some(e) = entities.iter().find(|e| e.entity_id == boat_id) {
                    match first {
                        None => first = Some((e.x, e.y)),
                        Some((x0, y0)) => {
                            let moved = ((e.x - x0).powi(2) + (e.y - y0).powi(2)).sqrt();
                            if moved > 0.5 && e.current_speed > 0.0 {
                                break (e.kind, moved);
                            }
                        }
                    }
                }
            }
        }
    })
    .await
    .expect("boat should move within the timeout");

    assert_eq!(observed.0, HullKind::SmallBoat);

    handle
        .command_tx
        .send(SimCommand::Shutdown)
        .await
        .expect("command channel open");
    task.await.expect("sim task joins cleanly");
}
