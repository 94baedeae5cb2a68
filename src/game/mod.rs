//! Game simulation modules

pub mod deck;
pub mod interp;
pub mod physics;
pub mod sim;

pub use deck::{DeckBounds, DeckInput, DeckPhysics, DeckState};
pub use interp::{InterpBank, Pose, Snapshot, SnapshotBuffer};
pub use physics::{HelmInput, HullProfile, ShipModifiers, ShipPhysics, ShipState};
pub use sim::{HullKind, SimCommand, SimConfig, SimEvent, SimHandle, SimRegistry, Simulation};
