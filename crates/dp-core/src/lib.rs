//! `dp-core` — foundational types for the `rust_dp` distributed simulation
//! framework.
//!
//! This crate is a dependency of every other `dp-*` crate.  It intentionally
//! has no `dp-*` dependencies and minimal external ones (`rand`, `thiserror`,
//! `serde`).
//!
//! # What lives here
//!
//! | Module    | Contents                                                |
//! |-----------|---------------------------------------------------------|
//! | [`ids`]   | `Pid`, `AgentId`, `AgentKind`, `PromiseId`              |
//! | [`geo`]   | `Int2D`, `IntRect`, `WorldBounds` (toroidal wrap)       |
//! | [`time`]  | `Tick`, `SimClock`, `SimConfig`                         |
//! | [`rng`]   | `AgentRng` (per-agent), `SimRng` (global)               |
//! | [`error`] | `DpError`, `DpResult`                                   |
//!
//! All public types derive `serde::{Serialize, Deserialize}` unconditionally:
//! the cross-partition wire format is core functionality here, not an
//! optional checkpointing concern.

pub mod error;
pub mod geo;
pub mod ids;
pub mod rng;
pub mod time;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::{DpError, DpResult};
pub use geo::{Int2D, IntRect, WorldBounds};
pub use ids::{AgentId, AgentKind, Pid, PromiseId};
pub use rng::{AgentRng, SimRng};
pub use time::{SimClock, SimConfig, Tick};
