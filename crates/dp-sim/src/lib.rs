//! `dp-sim` — step loop orchestrator for the rust_dp framework.
//!
//! # Three-phase tick
//!
//! ```text
//! for tick in 0..config.total_ticks:
//!   ① Step     — per partition: apply queued halo overwrites and reply
//!                settlements, drain the wake queue, call
//!                AgentBehavior::step per woken agent (ascending AgentId),
//!                apply intents, ship outbound migrants and requests.
//!                (parallel across partitions with the `parallel` feature)
//!   ② Resolve  — per partition: consume this tick's migrants and serve its
//!                requests, so migrations complete before any next-tick
//!                stepping.
//!   ③ Publish  — per partition: push boundary snapshots to neighbors;
//!                applied at the neighbor's next step drain.
//! ```
//!
//! # Cargo features
//!
//! | Feature    | Effect                                                  |
//! |------------|---------------------------------------------------------|
//! | `parallel` | Runs the step phase across partitions on Rayon's pool.  |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use dp_core::{Int2D, IntRect, SimConfig, WorldBounds};
//! use dp_sim::{ClusterBuilder, NoopObserver};
//!
//! let mut cluster = ClusterBuilder::new(config, MyBehavior).build()?;
//! cluster.spawn(Int2D::new(10, 10), MY_KIND, payload, Some(Tick(0)))?;
//! cluster.run(&mut NoopObserver)?;
//! ```

pub mod behavior;
pub mod builder;
pub mod cluster;
pub mod error;
pub mod observer;
pub mod partition_sim;
pub mod wake_queue;


pub use behavior::{AgentBehavior, Intent, StepContext};
pub use builder::ClusterBuilder;
pub use cluster::ClusterSim;
pub use error::{SimError, SimResult};
pub use observer::{NoopObserver, SimObserver};
pub use partition_sim::{PartitionSim, StepReport};
pub use wake_queue::WakeQueue;
