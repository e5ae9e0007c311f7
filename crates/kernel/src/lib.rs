//! Discrete-step simulation kernel.
//!
//! The [`Engine`] owns the virtual clock and the component registry: each
//! call to [`Engine::step`] advances the clock by one tick and invokes every
//! registered [`Component`] exactly once with the new value. It also owns the
//! seeded PRNG that is the sole source of runtime randomness, which makes a
//! whole simulation reproducible from a single `u64` seed.

mod dash;
mod engine;

pub use dash::{Dashboard, NullDashboard};
pub use engine::{Component, ComponentId, Engine, Step};
