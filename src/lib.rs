//! Deterministic physics and snapshot-interpolation core for a
//! multiplayer ship-combat game.
//!
//! The numerical core (`game::physics`, `game::deck`, `game::interp`,
//! `util::math`) is pure and engine-agnostic: it consumes plain input
//! records and state snapshots and produces new state, so the same code
//! runs on an authoritative server and inside a client. `game::sim`
//! wraps the core in the single-owner tick loop the state model assumes.

pub mod config;
pub mod game;
pub mod util;
