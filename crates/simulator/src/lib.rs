//! Host runner for the obelisk consensus simulator.
//!
//! Builds the node population and random peer graph from a
//! [`SimulatorConfig`], all derived from a single PRNG seed. The binary
//! drives [`Engine::step`](obelisk_kernel::Engine::step) on a worker thread
//! paced for the terminal dashboard; tests drive it directly.

mod config;
mod dash;
mod topology;

pub use config::{SimulatorConfig, SimulatorError};
pub use dash::TermDashboard;
pub use topology::build_topology;
