//! Pairwise link with per-step latency and in-flight packet queues.

use obelisk_kernel::{Component, Step};
use obelisk_types::Packet;
use parking_lot::Mutex;
use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;
use tracing::trace;

/// Endpoint id on a link, handed out sequentially by [`Link::next_peerid`].
pub type PeerId = u32;

/// Delivery callback installed per endpoint. Invoked with the payload and
/// the tick at which delivery happens.
pub type PacketCallback = Arc<dyn Fn(Packet, Step) + Send + Sync>;

/// A bidirectional delayed packet queue between two endpoints.
///
/// A packet sent at tick `T` is delivered on the first tick `U` with
/// `U − T ≥ latency`, in FIFO order per source-to-destination direction.
///
/// All structural state (callback map, per-endpoint queues) is serialized by
/// a single mutex. Delivery callbacks are invoked with the mutex released,
/// so a callback may send on this or any other link.
pub struct Link {
    latency: Step,
    inner: Mutex<LinkInner>,
}

#[derive(Default)]
struct LinkInner {
    next_peerid: PeerId,
    callbacks: BTreeMap<PeerId, PacketCallback>,
    queues: BTreeMap<PeerId, VecDeque<Queued>>,
}

struct Queued {
    enqueue_step: Step,
    payload: Packet,
}

impl Link {
    /// Create a link with the given latency in ticks (minimum 1).
    ///
    /// A latency below 1 would let a packet enqueued during delivery drain
    /// within the same tick, so it is clamped.
    pub fn new(latency: Step) -> Self {
        Self {
            latency: latency.max(1),
            inner: Mutex::new(LinkInner::default()),
        }
    }

    /// Latency in ticks.
    pub fn latency(&self) -> Step {
        self.latency
    }

    /// Hand out the next endpoint id.
    pub fn next_peerid(&self) -> PeerId {
        let mut inner = self.inner.lock();
        inner.next_peerid += 1;
        inner.next_peerid
    }

    /// Install the delivery callback for an endpoint.
    pub fn set_packet_callback<F>(&self, peerid: PeerId, callback: F)
    where
        F: Fn(Packet, Step) + Send + Sync + 'static,
    {
        self.inner.lock().callbacks.insert(peerid, Arc::new(callback));
    }

    /// Enqueue a copy of `payload`, tagged with `now`, for every registered
    /// endpoint other than `src`. Sending on a link with no peers is a no-op.
    pub fn send_packet(&self, src: PeerId, payload: &Packet, now: Step) {
        let mut inner = self.inner.lock();
        let destinations: Vec<PeerId> = inner
            .callbacks
            .keys()
            .copied()
            .filter(|&peer| peer != src)
            .collect();

        for peer in destinations {
            inner.queues.entry(peer).or_default().push_back(Queued {
                enqueue_step: now,
                payload: payload.clone(),
            });
        }
    }

    /// Number of queued packets across all endpoints.
    pub fn in_flight(&self) -> usize {
        self.inner.lock().queues.values().map(VecDeque::len).sum()
    }
}

impl Component for Link {
    /// Drain every endpoint queue head that has aged at least `latency`
    /// ticks, then invoke the callbacks outside the mutex.
    fn step(&self, now: Step) {
        let mut due: Vec<(PacketCallback, Packet)> = Vec::new();
        {
            let mut inner = self.inner.lock();
            let LinkInner {
                callbacks, queues, ..
            } = &mut *inner;

            for (peer, queue) in queues.iter_mut() {
                while queue
                    .front()
                    .is_some_and(|q| now - q.enqueue_step >= self.latency)
                {
                    let queued = queue.pop_front().expect("front checked above");
                    match callbacks.get(peer) {
                        Some(callback) => due.push((Arc::clone(callback), queued.payload)),
                        // Endpoint never registered a callback; drop.
                        None => trace!(peer = *peer, "dropping packet for missing callback"),
                    }
                }
            }
        }

        for (callback, payload) in due {
            callback(payload, now);
        }
    }
}
