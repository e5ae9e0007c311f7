//! Simulated network fabric: delayed pairwise links and the peer mesh.
//!
//! A [`Link`] is a kernel component modelling a point-to-point connection
//! with a fixed latency in ticks. A [`Mesh`] gives a node membership in the
//! peer graph: it owns the node's side of every link and broadcasts packets
//! to all neighbors. [`connect`]/[`disconnect`] wire and unwire node pairs.

mod link;
mod mesh;

pub use link::{Link, PacketCallback, PeerId};
pub use mesh::{connect, disconnect, Mesh, MeshNode};
