//! Discrete-step simulation engine.

use parking_lot::Mutex;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tracing::trace;

/// One unit of the engine's virtual clock.
pub type Step = i64;

/// A simulation participant, invoked once per tick.
///
/// The tick value is passed as an argument; every component invoked within a
/// single [`Engine::step`] sees the same value.
pub trait Component: Send + Sync {
    /// Run one tick of this component's work.
    fn step(&self, now: Step);
}

/// Token returned by [`Engine::register`], accepted by [`Engine::unregister`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComponentId(u64);

/// Discrete-step engine: the authoritative virtual clock, the component
/// registry, and the simulation's sole randomness source.
///
/// [`step`](Self::step) advances the clock by one and invokes every
/// registered component exactly once, in registration order. Dispatch is
/// sequential, which keeps a given seed bit-identical across runs.
pub struct Engine {
    current: AtomicI64,
    registry: Mutex<Registry>,
    rng: Mutex<ChaCha8Rng>,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    components: Vec<(ComponentId, Arc<dyn Component>)>,
}

impl Engine {
    /// Create an engine whose PRNG is seeded with `seed`.
    pub fn new(seed: u64) -> Self {
        Self {
            current: AtomicI64::new(0),
            registry: Mutex::new(Registry::default()),
            rng: Mutex::new(ChaCha8Rng::seed_from_u64(seed)),
        }
    }

    /// Current value of the virtual clock.
    pub fn current_step(&self) -> Step {
        self.current.load(Ordering::SeqCst)
    }

    /// Insert a component into the registry.
    pub fn register(&self, component: Arc<dyn Component>) -> ComponentId {
        let mut registry = self.registry.lock();
        let id = ComponentId(registry.next_id);
        registry.next_id += 1;
        registry.components.push((id, component));
        id
    }

    /// Remove a previously registered component. Unknown ids are a no-op.
    pub fn unregister(&self, id: ComponentId) {
        self.registry.lock().components.retain(|(cid, _)| *cid != id);
    }

    /// Number of registered components.
    pub fn component_count(&self) -> usize {
        self.registry.lock().components.len()
    }

    /// Advance the clock by one tick and invoke every registered component
    /// once with the new value.
    ///
    /// The registry is snapshotted first so components may register or
    /// unregister others mid-tick without deadlocking; such changes take
    /// effect on the next tick.
    pub fn step(&self) {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        trace!(step = now, "engine tick");

        let components: Vec<Arc<dyn Component>> = {
            let registry = self.registry.lock();
            registry
                .components
                .iter()
                .map(|(_, c)| Arc::clone(c))
                .collect()
        };

        for component in components {
            component.step(now);
        }
    }

    /// Uniform integer draw from the seeded PRNG. Bounds are inclusive.
    pub fn rand_int(&self, lo: i64, hi: i64) -> i64 {
        self.rng.lock().gen_range(lo..=hi)
    }

    /// Uniform real draw from the seeded PRNG, `lo` inclusive, `hi` exclusive.
    pub fn rand_real(&self, lo: f64, hi: f64) -> f64 {
        self.rng.lock().gen_range(lo..hi)
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("current_step", &self.current_step())
            .field("components", &self.component_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Records every invocation as (label, step).
    struct Recorder {
        label: &'static str,
        calls: Arc<Mutex<Vec<(&'static str, Step)>>>,
    }

    impl Component for Recorder {
        fn step(&self, now: Step) {
            self.calls.lock().push((self.label, now));
        }
    }

    #[test]
    fn test_step_invokes_each_component_once() {
        let engine = Engine::new(1);
        let calls = Arc::new(Mutex::new(Vec::new()));

        engine.register(Arc::new(Recorder {
            label: "a",
            calls: Arc::clone(&calls),
        }));
        engine.register(Arc::new(Recorder {
            label: "b",
            calls: Arc::clone(&calls),
        }));

        engine.step();
        engine.step();

        let calls = calls.lock();
        assert_eq!(*calls, vec![("a", 1), ("b", 1), ("a", 2), ("b", 2)]);
    }

    #[test]
    fn test_all_components_see_same_step() {
        let engine = Engine::new(1);
        let calls = Arc::new(Mutex::new(Vec::new()));
        for label in ["a", "b", "c"] {
            engine.register(Arc::new(Recorder {
                label,
                calls: Arc::clone(&calls),
            }));
        }

        engine.step();

        let calls = calls.lock();
        assert!(calls.iter().all(|&(_, step)| step == 1));
    }

    #[test]
    fn test_unregister_stops_invocation() {
        let engine = Engine::new(1);
        let calls = Arc::new(Mutex::new(Vec::new()));
        let id = engine.register(Arc::new(Recorder {
            label: "a",
            calls: Arc::clone(&calls),
        }));

        engine.step();
        engine.unregister(id);
        engine.step();

        assert_eq!(*calls.lock(), vec![("a", 1)]);
        assert_eq!(engine.component_count(), 0);

        // Unknown ids are ignored.
        engine.unregister(id);
    }

    #[test]
    fn test_clock_advances_by_one() {
        let engine = Engine::new(1);
        assert_eq!(engine.current_step(), 0);
        engine.step();
        assert_eq!(engine.current_step(), 1);
        engine.step();
        assert_eq!(engine.current_step(), 2);
    }

    #[test]
    fn test_rng_deterministic_across_engines() {
        let a = Engine::new(42);
        let b = Engine::new(42);
        for _ in 0..100 {
            assert_eq!(a.rand_int(0, 1000), b.rand_int(0, 1000));
        }
        let x = a.rand_real(0.0, 1.0);
        let y = b.rand_real(0.0, 1.0);
        assert_eq!(x, y);
        assert!((0.0..1.0).contains(&x));
    }

    #[test]
    fn test_rand_int_bounds_inclusive() {
        let engine = Engine::new(7);
        for _ in 0..200 {
            let v = engine.rand_int(3, 5);
            assert!((3..=5).contains(&v));
        }
        assert_eq!(engine.rand_int(9, 9), 9);
    }
}
