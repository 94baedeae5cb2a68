//! Headless simulation runner
//!
//! Starts one authoritative simulation with a couple of scripted hulls
//! and prints broadcast snapshots as JSON lines until ctrl-c. Useful for
//! eyeballing physics tuning without a client attached.

use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use ship_game_core::config::Config;
use ship_game_core::game::interp::{InterpBank, Pose};
use ship_game_core::game::physics::{HelmInput, ShipModifiers};
use ship_game_core::game::sim::{HullKind, SimCommand, SimConfig, SimEvent, SimRegistry, Simulation};
use ship_game_core::util::time::unix_millis;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    init_tracing(&config.log_level);

    info!("Starting ship simulation core");
    info!(
        simulation_tps = config.simulation_tps,
        snapshot_tps = config.snapshot_tps,
        "tick configuration"
    );

    let sim_config = SimConfig {
        seed: rand::random(),
        simulation_tps: config.simulation_tps,
        snapshot_tps: config.snapshot_tps,
        ..Default::default()
    };

    let registry = SimRegistry::new();
    let (sim, handle) = Simulation::new(sim_config);
    registry.insert(handle.clone());
    let sim_task = tokio::spawn(sim.run());

    // Scripted traffic: one upgraded ship holding a port turn, one
    // survival-mode small boat sailing straight.
    let ship_id = Uuid::new_v4();
    let boat_id = Uuid::new_v4();
    handle
        .command_tx
        .send(SimCommand::Spawn {
            entity_id: ship_id,
            kind: HullKind::Ship,
            modifiers: Some(ShipModifiers {
                speed_bonus: 0.2,
                turning_bonus: 0.1,
            }),
        })
        .await?;
    handle
        .command_tx
        .send(SimCommand::Spawn {
            entity_id: boat_id,
            kind: HullKind::SmallBoat,
            modifiers: None,
        })
        .await?;
    handle
        .command_tx
        .send(SimCommand::Helm {
            entity_id: ship_id,
            input: HelmInput {
                turn_left: true,
                turn_right: false,
            },
        })
        .await?;

    // Observe the stream the way a render client would: buffer remote
    // poses and sample them behind a fixed render delay.
    let mut bank = InterpBank::new(config.interp_capacity, config.render_delay_ms);

    let mut events = handle.subscribe();
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => {
                    println!("{}", serde_json::to_string(&event)?);
                    match &event {
                        SimEvent::Snapshot { timestamp_ms, entities, .. } => {
                            for entity in entities {
                                bank.record(
                                    entity.entity_id,
                                    Pose {
                                        x: entity.x,
                                        y: entity.y,
                                        rotation: entity.rotation,
                                    },
                                    *timestamp_ms,
                                );
                            }
                            if let Some(pose) = bank.pose(&ship_id, unix_millis()) {
                                debug!(x = pose.x, y = pose.y, rotation = pose.rotation, "interpolated ship pose");
                            }
                        }
                        SimEvent::EntityDespawned { entity_id } => bank.forget(entity_id),
                        SimEvent::EntitySpawned { .. } => {}
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    info!(skipped, "observer lagged behind snapshot stream");
                }
                Err(RecvError::Closed) => break,
            },
            _ = &mut shutdown => {
                info!("shutting down simulation");
                handle.command_tx.send(SimCommand::Shutdown).await?;
                break;
            }
        }
    }

    sim_task.await?;
    registry.remove(&handle.id);
    info!("Simulation shutdown complete");
    Ok(())
}

/// Initialize tracing/logging
fn init_tracing(log_level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(true).with_writer(std::io::stderr))
        .init();
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        }
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        }
    }
}
